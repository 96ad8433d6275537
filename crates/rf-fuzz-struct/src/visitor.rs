//! Visitor traits and traversal entry points
//!
//! A visitor exposes one operation per [`Kind`]. Every operation has a no-op
//! default so adapters only override the kinds they care about; an adapter
//! that cannot handle a kind returns an error from that operation.
//!
//! Recursion is owned by the engine ([`Reflect`] implementations), not by the
//! visitor:
//!
//! - record: `visit_struct`, then every exported field in declaration order
//! - `Option<T>`: `visit_pointer`, then the referent (value walks: only when
//!   present; type walks: always)
//! - [`Dynamic`](crate::Dynamic): `visit_interface`, then the payload when
//!   present (value walks only)
//! - everything else is a leaf

use crate::path::FieldPath;
use crate::reflect::{Kind, Reflect, TypeInfo};
use crate::scalar::Scalar;
use crate::Result;

/// Visits live values
///
/// Numeric leaves arrive as the exact fixed-width [`Scalar`] variant of the
/// field (`visit_int` receives `I8`..`Isize`, `visit_uint` `U8`..`Usize`,
/// `visit_float` `F32`/`F64`, `visit_complex` `C64`/`C128`).
#[allow(unused_variables)]
pub trait ValueVisitor {
    fn visit_bool(&mut self, value: bool, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_int(&mut self, value: Scalar, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_uint(&mut self, value: Scalar, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_float(&mut self, value: Scalar, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_complex(&mut self, value: Scalar, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_array(&mut self, info: &TypeInfo, len: usize, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_chan(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_func(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_interface(&mut self, info: &TypeInfo, present: bool, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_map(&mut self, info: &TypeInfo, len: usize, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_pointer(&mut self, info: &TypeInfo, present: bool, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    /// `bytes` is set only for `Vec<u8>`
    fn visit_slice(
        &mut self,
        info: &TypeInfo,
        len: usize,
        bytes: Option<&[u8]>,
        path: &FieldPath,
    ) -> Result<()> {
        Ok(())
    }

    fn visit_string(&mut self, value: &str, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_struct(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_unsafe_pointer(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }
}

/// Visits types, no value required
#[allow(unused_variables)]
pub trait TypeVisitor {
    fn visit_bool(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_int(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_uint(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_float(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_complex(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_array(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_chan(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_func(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_interface(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_map(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_pointer(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_slice(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_string(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_struct(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_unsafe_pointer(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Ok(())
    }
}

/// Fire the single type-visitor operation matching `info`'s kind
pub fn dispatch_type(visitor: &mut dyn TypeVisitor, info: &TypeInfo, path: &FieldPath) -> Result<()> {
    match info.kind() {
        Kind::Bool => visitor.visit_bool(info, path),
        Kind::Int => visitor.visit_int(info, path),
        Kind::Uint => visitor.visit_uint(info, path),
        Kind::Float => visitor.visit_float(info, path),
        Kind::Complex => visitor.visit_complex(info, path),
        Kind::Array => visitor.visit_array(info, path),
        Kind::Chan => visitor.visit_chan(info, path),
        Kind::Func => visitor.visit_func(info, path),
        Kind::Interface => visitor.visit_interface(info, path),
        Kind::Map => visitor.visit_map(info, path),
        Kind::Pointer => visitor.visit_pointer(info, path),
        Kind::Slice => visitor.visit_slice(info, path),
        Kind::String => visitor.visit_string(info, path),
        Kind::Struct => visitor.visit_struct(info, path),
        Kind::UnsafePointer => visitor.visit_unsafe_pointer(info, path),
    }
}

/// Walk `value` from the root
pub fn traverse_value<T: Reflect + ?Sized>(value: &T, visitor: &mut dyn ValueVisitor) -> Result<()> {
    value.traverse(visitor, &FieldPath::root())
}

/// Walk the type `T` from the root
pub fn traverse_type<T: Reflect>(visitor: &mut dyn TypeVisitor) -> Result<()> {
    T::traverse_type(visitor, &FieldPath::root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fuzz_record, Dynamic};
    use std::collections::HashMap;

    fuzz_record! {
        struct Inner {
            pub x: u8,
        }
    }

    fuzz_record! {
        struct Outer {
            pub flag: bool,
            pub inner: Option<Inner>,
            pub table: HashMap<String, u32>,
            pub any: Dynamic,
            hidden: i32,
        }
    }

    /// Records (kind, path) per visited node
    #[derive(Default)]
    struct Recorder {
        seen: Vec<(&'static str, String)>,
    }

    impl ValueVisitor for Recorder {
        fn visit_bool(&mut self, _value: bool, path: &FieldPath) -> Result<()> {
            self.seen.push(("bool", path.to_string()));
            Ok(())
        }

        fn visit_uint(&mut self, _value: Scalar, path: &FieldPath) -> Result<()> {
            self.seen.push(("uint", path.to_string()));
            Ok(())
        }

        fn visit_int(&mut self, _value: Scalar, path: &FieldPath) -> Result<()> {
            self.seen.push(("int", path.to_string()));
            Ok(())
        }

        fn visit_interface(&mut self, _info: &TypeInfo, _present: bool, path: &FieldPath) -> Result<()> {
            self.seen.push(("interface", path.to_string()));
            Ok(())
        }

        fn visit_map(&mut self, _info: &TypeInfo, _len: usize, path: &FieldPath) -> Result<()> {
            self.seen.push(("map", path.to_string()));
            Ok(())
        }

        fn visit_pointer(&mut self, _info: &TypeInfo, _present: bool, path: &FieldPath) -> Result<()> {
            self.seen.push(("pointer", path.to_string()));
            Ok(())
        }

        fn visit_struct(&mut self, _info: &TypeInfo, path: &FieldPath) -> Result<()> {
            self.seen.push(("struct", path.to_string()));
            Ok(())
        }
    }

    impl TypeVisitor for Recorder {
        fn visit_bool(&mut self, _info: &TypeInfo, path: &FieldPath) -> Result<()> {
            self.seen.push(("bool", path.to_string()));
            Ok(())
        }

        fn visit_uint(&mut self, _info: &TypeInfo, path: &FieldPath) -> Result<()> {
            self.seen.push(("uint", path.to_string()));
            Ok(())
        }

        fn visit_interface(&mut self, _info: &TypeInfo, path: &FieldPath) -> Result<()> {
            self.seen.push(("interface", path.to_string()));
            Ok(())
        }

        fn visit_map(&mut self, _info: &TypeInfo, path: &FieldPath) -> Result<()> {
            self.seen.push(("map", path.to_string()));
            Ok(())
        }

        fn visit_pointer(&mut self, _info: &TypeInfo, path: &FieldPath) -> Result<()> {
            self.seen.push(("pointer", path.to_string()));
            Ok(())
        }

        fn visit_struct(&mut self, _info: &TypeInfo, path: &FieldPath) -> Result<()> {
            self.seen.push(("struct", path.to_string()));
            Ok(())
        }
    }

    fn outer(inner: Option<Inner>, any: Dynamic) -> Outer {
        Outer {
            flag: true,
            inner,
            table: HashMap::new(),
            any,
            hidden: 7,
        }
    }

    #[test]
    fn test_value_walk_skips_absent_pointee_and_hidden_fields() {
        let mut recorder = Recorder::default();
        traverse_value(&outer(None, Dynamic::empty()), &mut recorder).unwrap();

        let kinds: Vec<_> = recorder.seen.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec!["struct", "bool", "pointer", "map", "interface"]);
        assert!(recorder.seen.iter().all(|(_, p)| p != "hidden"));
    }

    #[test]
    fn test_value_walk_enters_present_children() {
        let mut recorder = Recorder::default();
        let value = outer(Some(Inner { x: 3 }), Dynamic::new(5i64));
        traverse_value(&value, &mut recorder).unwrap();

        assert_eq!(
            recorder.seen,
            vec![
                ("struct", "<root>".to_string()),
                ("bool", "flag".to_string()),
                ("pointer", "inner".to_string()),
                ("struct", "inner.*".to_string()),
                ("uint", "inner.*.x".to_string()),
                ("map", "table".to_string()),
                ("interface", "any".to_string()),
                ("int", "any.dyn".to_string()),
            ]
        );
    }

    #[test]
    fn test_type_walk_always_enters_pointee() {
        let mut recorder = Recorder::default();
        traverse_type::<Outer>(&mut recorder).unwrap();

        let paths: Vec<_> = recorder.seen.iter().map(|(_, p)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec!["<root>", "flag", "inner", "inner.*", "inner.*.x", "table", "any"]
        );
    }

    #[test]
    fn test_field_indexes_count_hidden_fields() {
        fuzz_record! {
            struct Gappy {
                first: u8,
                pub second: u8,
            }
        }

        struct Indexes(Vec<Vec<usize>>);
        impl TypeVisitor for Indexes {
            fn visit_uint(&mut self, _info: &TypeInfo, path: &FieldPath) -> Result<()> {
                self.0.push(path.indexes());
                Ok(())
            }
        }

        let mut indexes = Indexes(Vec::new());
        traverse_type::<Gappy>(&mut indexes).unwrap();
        assert_eq!(indexes.0, vec![vec![1]]);
    }
}
