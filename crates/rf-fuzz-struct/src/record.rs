//! Record descriptors
//!
//! A record is a struct whose exported fields the codec can see. The
//! [`fuzz_record!`](crate::fuzz_record) macro declares the struct and
//! generates its [`Record`] and [`Reflect`] implementations in one go.
//!
//! ```rust,ignore
//! use rf_fuzz_struct::fuzz_record;
//!
//! fuzz_record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Packet {
//!         pub id: u32,
//!         pub payload: Option<Vec<u8>>,
//!         checksum: u16, // invisible to the codec
//!     }
//! }
//! ```

use crate::reflect::Reflect;

/// Declared field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    /// Declared type, as written
    pub type_name: &'static str,
    /// Declared visibility, as written (`""` when private)
    pub visibility: &'static str,
}

impl FieldInfo {
    pub fn is_exported(&self) -> bool {
        is_exported(self.visibility)
    }
}

/// Only plain `pub` counts as exported; restricted forms like `pub(crate)`
/// stay invisible to the codec.
pub fn is_exported(visibility: &str) -> bool {
    visibility == "pub"
}

/// Struct-shaped [`Reflect`] type with a declared field list
pub trait Record: Reflect + Sized {
    /// All declared fields in declaration order, exported or not
    fn fields() -> &'static [FieldInfo];

    fn exported_fields() -> Vec<&'static FieldInfo> {
        Self::fields().iter().filter(|f| f.is_exported()).collect()
    }
}

/// Declare a record and derive its codec support.
///
/// Accepts a plain struct with named fields. Outer attributes (derives,
/// docs) and field attributes pass through unchanged. Field indexes in
/// paths count every declared field, exported or not.
#[macro_export]
macro_rules! fuzz_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn fields() -> &'static [$crate::FieldInfo] {
                const FIELDS: &[$crate::FieldInfo] = &[
                    $(
                        $crate::FieldInfo {
                            name: stringify!($field),
                            type_name: stringify!($ty),
                            visibility: stringify!($field_vis),
                        },
                    )*
                ];
                FIELDS
            }
        }

        impl $crate::Reflect for $name {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::of::<Self>($crate::Kind::Struct)
                    .named(stringify!($name))
                    .with_fields(<Self as $crate::Record>::fields())
            }

            fn zero() -> Self {
                Self {
                    $( $field: <$ty as $crate::Reflect>::zero(), )*
                }
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn traverse(
                &self,
                visitor: &mut dyn $crate::ValueVisitor,
                path: &$crate::FieldPath,
            ) -> $crate::Result<()> {
                visitor.visit_struct(&<Self as $crate::Reflect>::type_info(), path)?;
                let mut index = 0usize;
                $(
                    if $crate::is_exported(stringify!($field_vis)) {
                        $crate::Reflect::traverse(
                            &self.$field,
                            visitor,
                            &path.child(index, stringify!($field)),
                        )?;
                    }
                    index += 1;
                )*
                Ok(())
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn traverse_type(
                visitor: &mut dyn $crate::TypeVisitor,
                path: &$crate::FieldPath,
            ) -> $crate::Result<()> {
                visitor.visit_struct(&<Self as $crate::Reflect>::type_info(), path)?;
                let mut index = 0usize;
                $(
                    if $crate::is_exported(stringify!($field_vis)) {
                        <$ty as $crate::Reflect>::traverse_type(
                            visitor,
                            &path.child(index, stringify!($field)),
                        )?;
                    }
                    index += 1;
                )*
                Ok(())
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn build(
                reader: &mut $crate::ScalarReader,
                path: &$crate::FieldPath,
            ) -> $crate::Result<Self> {
                let mut index = 0usize;
                $(
                    let $field = if $crate::is_exported(stringify!($field_vis)) {
                        <$ty as $crate::Reflect>::build(
                            reader,
                            &path.child(index, stringify!($field)),
                        )?
                    } else {
                        <$ty as $crate::Reflect>::zero()
                    };
                    index += 1;
                )*
                Ok(Self { $( $field, )* })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Kind;

    fuzz_record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Mixed {
            /// Documented field
            pub visible: u32,
            hidden: String,
            pub(crate) restricted: bool,
            pub nested: Option<f64>,
        }
    }

    fuzz_record! {
        struct Empty {}
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("pub"));
        assert!(!is_exported(""));
        assert!(!is_exported("pub(crate)"));
        assert!(!is_exported("pub(super)"));
    }

    #[test]
    fn test_declared_fields() {
        let fields = Mixed::fields();
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["visible", "hidden", "restricted", "nested"]);

        let exported: Vec<_> = Mixed::exported_fields().iter().map(|f| f.name).collect();
        assert_eq!(exported, vec!["visible", "nested"]);
        assert_eq!(fields[0].type_name, "u32");
    }

    #[test]
    fn test_record_type_info() {
        let info = Mixed::type_info();
        assert_eq!(info.kind(), Kind::Struct);
        assert_eq!(info.name(), "Mixed");
        assert_eq!(info.fields().len(), 4);
        assert_eq!(Empty::type_info().fields().len(), 0);
    }

    #[test]
    fn test_zero_record() {
        let zero = Mixed::zero();
        assert_eq!(
            zero,
            Mixed {
                visible: 0,
                hidden: String::new(),
                restricted: false,
                nested: None,
            }
        );
    }
}
