//! Encoder: record value → flat scalar sequence
//!
//! Produces exactly the shape [`linearize`](crate::linearize()) describes.
//! An absent `Option<T>` still occupies its payload slots: the encoder walks a
//! zero `T` in its place.

use crate::linearize::ensure_record;
use crate::path::FieldPath;
use crate::reflect::{Kind, Reflect, TypeInfo};
use crate::scalar::Scalar;
use crate::visitor::ValueVisitor;
use crate::{FuzzError, Result};

/// Value visitor appending one scalar per leaf
#[derive(Default)]
struct Encoder {
    scalars: Vec<Scalar>,
}

impl ValueVisitor for Encoder {
    fn visit_bool(&mut self, value: bool, _path: &FieldPath) -> Result<()> {
        self.scalars.push(Scalar::Bool(value));
        Ok(())
    }

    fn visit_int(&mut self, value: Scalar, _path: &FieldPath) -> Result<()> {
        self.scalars.push(value);
        Ok(())
    }

    fn visit_uint(&mut self, value: Scalar, _path: &FieldPath) -> Result<()> {
        self.scalars.push(value);
        Ok(())
    }

    fn visit_float(&mut self, value: Scalar, _path: &FieldPath) -> Result<()> {
        self.scalars.push(value);
        Ok(())
    }

    fn visit_complex(&mut self, value: Scalar, _path: &FieldPath) -> Result<()> {
        self.scalars.push(value);
        Ok(())
    }

    fn visit_string(&mut self, value: &str, _path: &FieldPath) -> Result<()> {
        self.scalars.push(Scalar::String(value.to_string()));
        Ok(())
    }

    fn visit_slice(
        &mut self,
        info: &TypeInfo,
        _len: usize,
        bytes: Option<&[u8]>,
        path: &FieldPath,
    ) -> Result<()> {
        match bytes {
            Some(bytes) => {
                self.scalars.push(Scalar::Bytes(bytes.to_vec()));
                Ok(())
            }
            None => Err(FuzzError::unsupported(info, path)),
        }
    }

    fn visit_pointer(&mut self, info: &TypeInfo, present: bool, path: &FieldPath) -> Result<()> {
        let elem = match info.elem() {
            Some(elem) if elem.kind() != Kind::Pointer => elem,
            _ => return Err(FuzzError::unsupported(info, path)),
        };
        self.scalars.push(Scalar::Bool(present));
        if !present {
            // The engine will not recurse; fill the payload slots ourselves
            elem.walk_zero(self, &path.child(0, FieldPath::POINTEE))?;
        }
        Ok(())
    }

    fn visit_struct(&mut self, _info: &TypeInfo, _path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_array(&mut self, info: &TypeInfo, _len: usize, path: &FieldPath) -> Result<()> {
        Err(FuzzError::unsupported(info, path))
    }

    fn visit_chan(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Err(FuzzError::unsupported(info, path))
    }

    fn visit_func(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Err(FuzzError::unsupported(info, path))
    }

    fn visit_interface(&mut self, info: &TypeInfo, _present: bool, path: &FieldPath) -> Result<()> {
        Err(FuzzError::unsupported(info, path))
    }

    fn visit_map(&mut self, info: &TypeInfo, _len: usize, path: &FieldPath) -> Result<()> {
        Err(FuzzError::unsupported(info, path))
    }

    fn visit_unsafe_pointer(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Err(FuzzError::unsupported(info, path))
    }
}

/// Flatten `value` into the scalar sequence a driver can store
pub fn encode<T: Reflect>(value: &T) -> Result<Vec<Scalar>> {
    ensure_record(&T::type_info())?;

    let mut encoder = Encoder::default();
    value.traverse(&mut encoder, &FieldPath::root())?;
    Ok(encoder.scalars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fuzz_record, linearize};
    use num_complex::Complex32;

    fuzz_record! {
        struct Optional {
            pub s: Option<String>,
            pub b: Option<bool>,
            pub i: Option<isize>,
            pub f: Option<f64>,
        }
    }

    fuzz_record! {
        struct Plain {
            pub s: String,
            pub b: bool,
            pub i: isize,
            pub f: f64,
        }
    }

    fuzz_record! {
        struct Blob {
            pub data: Vec<u8>,
            pub words: Option<Vec<u8>>,
        }
    }

    fuzz_record! {
        struct Grid {
            pub cells: [u8; 4],
        }
    }

    fuzz_record! {
        struct Twice {
            pub inner: Option<Option<i8>>,
        }
    }

    #[test]
    fn test_all_absent() {
        let value = Optional {
            s: None,
            b: None,
            i: None,
            f: None,
        };
        let scalars = encode(&value).unwrap();
        assert_eq!(
            scalars,
            vec![
                Scalar::Bool(false),
                Scalar::String(String::new()),
                Scalar::Bool(false),
                Scalar::Bool(false),
                Scalar::Bool(false),
                Scalar::Isize(0),
                Scalar::Bool(false),
                Scalar::F64(0.0),
            ]
        );
    }

    #[test]
    fn test_plain_matches_schema() {
        let value = Plain {
            s: "foo".into(),
            b: true,
            i: 42,
            f: 3.14,
        };
        let scalars = encode(&value).unwrap();
        assert_eq!(
            scalars,
            vec![
                Scalar::from("foo"),
                Scalar::Bool(true),
                Scalar::Isize(42),
                Scalar::F64(3.14),
            ]
        );
        assert!(linearize::<Plain>().unwrap().matches(&scalars));
    }

    #[test]
    fn test_bytes() {
        let value = Blob {
            data: vec![1, 2, 3],
            words: None,
        };
        assert_eq!(
            encode(&value).unwrap(),
            vec![
                Scalar::Bytes(vec![1, 2, 3]),
                Scalar::Bool(false),
                Scalar::Bytes(vec![]),
            ]
        );
    }

    #[test]
    fn test_unsupported() {
        let grid = Grid { cells: [0; 4] };
        assert!(matches!(
            encode(&grid),
            Err(FuzzError::UnsupportedKind { kind: Kind::Array, .. })
        ));

        let twice = Twice { inner: Some(None) };
        assert!(matches!(
            encode(&twice),
            Err(FuzzError::UnsupportedKind { kind: Kind::Pointer, .. })
        ));
    }

    #[test]
    fn test_root_must_be_record() {
        assert!(matches!(
            encode(&Complex32::new(1.0, 2.0)),
            Err(FuzzError::PreconditionViolation { kind: Kind::Complex, .. })
        ));
    }
}
