//! Primitive scalars exchanged with the fuzz driver
//!
//! Everything that crosses the codec boundary is a [`Scalar`]. Records are
//! flattened into `Vec<Scalar>` and rebuilt from one.

use crate::reflect::Kind;
use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag for the primitive type of a scalar slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    C64,
    C128,
    String,
    Bytes,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 17] = [
        ScalarKind::Bool,
        ScalarKind::I8,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::Isize,
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::U64,
        ScalarKind::Usize,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::C64,
        ScalarKind::C128,
        ScalarKind::String,
        ScalarKind::Bytes,
    ];

    /// Traversal kind a field of this scalar type is classified as
    pub fn kind(self) -> Kind {
        match self {
            ScalarKind::Bool => Kind::Bool,
            ScalarKind::I8
            | ScalarKind::I16
            | ScalarKind::I32
            | ScalarKind::I64
            | ScalarKind::Isize => Kind::Int,
            ScalarKind::U8
            | ScalarKind::U16
            | ScalarKind::U32
            | ScalarKind::U64
            | ScalarKind::Usize => Kind::Uint,
            ScalarKind::F32 | ScalarKind::F64 => Kind::Float,
            ScalarKind::C64 | ScalarKind::C128 => Kind::Complex,
            ScalarKind::String => Kind::String,
            ScalarKind::Bytes => Kind::Slice,
        }
    }

    /// Rust spelling of the type
    pub fn type_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::Isize => "isize",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::Usize => "usize",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::C64 => "Complex32",
            ScalarKind::C128 => "Complex64",
            ScalarKind::String => "String",
            ScalarKind::Bytes => "Vec<u8>",
        }
    }

    /// Zero value of this kind
    pub fn zero(self) -> Scalar {
        match self {
            ScalarKind::Bool => Scalar::Bool(false),
            ScalarKind::I8 => Scalar::I8(0),
            ScalarKind::I16 => Scalar::I16(0),
            ScalarKind::I32 => Scalar::I32(0),
            ScalarKind::I64 => Scalar::I64(0),
            ScalarKind::Isize => Scalar::Isize(0),
            ScalarKind::U8 => Scalar::U8(0),
            ScalarKind::U16 => Scalar::U16(0),
            ScalarKind::U32 => Scalar::U32(0),
            ScalarKind::U64 => Scalar::U64(0),
            ScalarKind::Usize => Scalar::Usize(0),
            ScalarKind::F32 => Scalar::F32(0.0),
            ScalarKind::F64 => Scalar::F64(0.0),
            ScalarKind::C64 => Scalar::C64(Complex32::new(0.0, 0.0)),
            ScalarKind::C128 => Scalar::C128(Complex64::new(0.0, 0.0)),
            ScalarKind::String => Scalar::String(String::new()),
            ScalarKind::Bytes => Scalar::Bytes(Vec::new()),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One primitive value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(#[serde(with = "float")] f32),
    F64(#[serde(with = "float")] f64),
    C64(#[serde(with = "complex")] Complex32),
    C128(#[serde(with = "complex")] Complex64),
    String(String),
    Bytes(Vec<u8>),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::I8(_) => ScalarKind::I8,
            Scalar::I16(_) => ScalarKind::I16,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::Isize(_) => ScalarKind::Isize,
            Scalar::U8(_) => ScalarKind::U8,
            Scalar::U16(_) => ScalarKind::U16,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::U64(_) => ScalarKind::U64,
            Scalar::Usize(_) => ScalarKind::Usize,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
            Scalar::C64(_) => ScalarKind::C64,
            Scalar::C128(_) => ScalarKind::C128,
            Scalar::String(_) => ScalarKind::String,
            Scalar::Bytes(_) => ScalarKind::Bytes,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::Isize(v) => write!(f, "{v}"),
            Scalar::U8(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::Usize(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::C64(v) => write!(f, "{v}"),
            Scalar::C128(v) => write!(f, "{v}"),
            Scalar::String(v) => write!(f, "{v:?}"),
            Scalar::Bytes(v) => write!(f, "{v:?}"),
        }
    }
}

/// Rust types that map one-to-one onto a [`Scalar`] variant
pub trait ScalarValue: Sized {
    const KIND: ScalarKind;

    fn into_scalar(self) -> Scalar;

    /// Unwrap the matching variant, handing the scalar back on a kind mismatch
    fn from_scalar(scalar: Scalar) -> std::result::Result<Self, Scalar>;
}

macro_rules! scalar_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ScalarValue for $ty {
                const KIND: ScalarKind = ScalarKind::$variant;

                #[inline]
                fn into_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }

                #[inline]
                fn from_scalar(scalar: Scalar) -> std::result::Result<Self, Scalar> {
                    match scalar {
                        Scalar::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }

            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }
        )*
    };
}

scalar_value! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    Complex32 => C64,
    Complex64 => C128,
    String => String,
    Vec<u8> => Bytes,
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

/// JSON has no NaN or infinities, so those travel as strings
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FloatRepr {
    Number(f64),
    Special(String),
}

impl FloatRepr {
    fn new(value: f64) -> Self {
        if value.is_nan() {
            FloatRepr::Special("NaN".into())
        } else if value.is_infinite() {
            FloatRepr::Special(if value > 0.0 { "inf" } else { "-inf" }.into())
        } else {
            FloatRepr::Number(value)
        }
    }

    fn value(self) -> std::result::Result<f64, String> {
        match self {
            FloatRepr::Number(v) => Ok(v),
            FloatRepr::Special(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(format!("invalid float `{other}`")),
            },
        }
    }
}

trait Float: Copy {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl Float for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Float for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

mod float {
    use super::{Float, FloatRepr};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<T: Float, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        FloatRepr::new(value.to_f64()).serialize(serializer)
    }

    pub(super) fn deserialize<'de, T: Float, D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
        FloatRepr::deserialize(deserializer)?
            .value()
            .map(T::from_f64)
            .map_err(D::Error::custom)
    }
}

mod complex {
    use super::{Float, FloatRepr};
    use num_complex::Complex;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<T: Float, S: Serializer>(
        value: &Complex<T>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        (FloatRepr::new(value.re.to_f64()), FloatRepr::new(value.im.to_f64())).serialize(serializer)
    }

    pub(super) fn deserialize<'de, T: Float, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Complex<T>, D::Error> {
        let (re, im) = <(FloatRepr, FloatRepr)>::deserialize(deserializer)?;
        let re = re.value().map_err(D::Error::custom)?;
        let im = im.value().map_err(D::Error::custom)?;
        Ok(Complex::new(T::from_f64(re), T::from_f64(im)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_matches_kind() {
        for kind in ScalarKind::ALL {
            assert_eq!(kind.zero().kind(), kind);
        }
    }

    #[test]
    fn test_from_scalar_hands_back_mismatch() {
        assert_eq!(i32::from_scalar(Scalar::I32(7)), Ok(7));
        assert_eq!(
            i32::from_scalar(Scalar::I64(7)),
            Err(Scalar::I64(7)),
            "i64 must not silently narrow into i32"
        );
        assert_eq!(
            String::from_scalar(Scalar::from("abc")),
            Ok("abc".to_string())
        );
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(ScalarKind::Isize.kind(), Kind::Int);
        assert_eq!(ScalarKind::Usize.kind(), Kind::Uint);
        assert_eq!(ScalarKind::C64.kind(), Kind::Complex);
        assert_eq!(ScalarKind::Bytes.kind(), Kind::Slice);
    }

    #[test]
    fn test_json_roundtrip_keeps_variant() {
        let seq = vec![
            Scalar::Bool(true),
            Scalar::U16(9),
            Scalar::C64(Complex32::new(12.0, 0.0)),
            Scalar::Bytes(vec![0, 255]),
        ];
        let json = serde_json::to_string(&seq).unwrap();
        let back: Vec<Scalar> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_json_keeps_non_finite_floats() {
        let seq = vec![
            Scalar::F64(f64::INFINITY),
            Scalar::F32(f32::NEG_INFINITY),
            Scalar::F64(f64::NAN),
            Scalar::C128(Complex64::new(f64::NAN, 1.5)),
        ];
        let json = serde_json::to_string(&seq).unwrap();
        let back: Vec<Scalar> = serde_json::from_str(&json).unwrap();

        assert_eq!(back[0], Scalar::F64(f64::INFINITY));
        assert_eq!(back[1], Scalar::F32(f32::NEG_INFINITY));
        assert!(matches!(back[2], Scalar::F64(v) if v.is_nan()));
        assert!(matches!(back[3], Scalar::C128(c) if c.re.is_nan() && c.im == 1.5));
    }

    #[test]
    fn test_json_rejects_unknown_special() {
        let err = serde_json::from_str::<Scalar>(r#"{"F64":"nope"}"#);
        assert!(err.is_err());
    }
}
