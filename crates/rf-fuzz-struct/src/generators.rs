//! Scalar generators for fuzzing

use crate::linearize::Schema;
use crate::scalar::{Scalar, ScalarKind};
use num_complex::{Complex32, Complex64};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Integer generation: edge cases, then boundaries, then uniform.
///
/// Pointer-width integers have no uniform distribution of their own, so
/// they sample a fixed-width `$sample` and cast.
macro_rules! gen_int {
    ($self:ident, $ty:ty, $sample:ty) => {{
        if $self.include_edge_cases && $self.rng.random_bool(0.2) {
            let edge: [$ty; 5] = [0, 1, <$ty>::MIN, <$ty>::MAX, <$ty>::MAX / 2];
            edge[$self.rng.random_range(0..edge.len())]
        } else if $self.include_boundaries && $self.rng.random_bool(0.1) {
            let boundaries: [$ty; 4] = [
                <$ty>::MIN.wrapping_add(1),
                <$ty>::MAX.wrapping_sub(1),
                <$ty>::MAX / 2 + 1,
                (<$ty>::MAX >> (<$ty>::BITS / 2)),
            ];
            boundaries[$self.rng.random_range(0..boundaries.len())]
        } else {
            $self.rng.random::<$sample>() as $ty
        }
    }};
    ($self:ident, $ty:ty) => {
        gen_int!($self, $ty, $ty)
    };
}

/// Kind-preserving integer mutation
macro_rules! mutate_int {
    ($self:ident, $value:expr, $ty:ty, $sample:ty) => {{
        let value: $ty = $value;
        match $self.rng.random_range(0..4) {
            0 => value ^ (1 as $ty).wrapping_shl($self.rng.random_range(0..<$ty>::BITS)),
            1 => value.wrapping_add(1),
            2 => value.wrapping_sub(1),
            _ => gen_int!($self, $ty, $sample),
        }
    }};
    ($self:ident, $value:expr, $ty:ty) => {
        mutate_int!($self, $value, $ty, $ty)
    };
}

/// Float generation mirroring `gen_int!`
macro_rules! gen_float {
    ($self:ident, $ty:ident) => {{
        if $self.include_edge_cases && $self.rng.random_bool(0.2) {
            let edge: [$ty; 10] = [
                0.0,
                -0.0,
                $ty::NAN,
                $ty::INFINITY,
                $ty::NEG_INFINITY,
                $ty::MIN,
                $ty::MAX,
                $ty::MIN_POSITIVE,
                $ty::EPSILON,
                -$ty::EPSILON,
            ];
            edge[$self.rng.random_range(0..edge.len())]
        } else if $self.include_boundaries && $self.rng.random_bool(0.1) {
            let boundaries: [$ty; 10] = [
                -1.0,
                1.0,
                0.5,
                -0.5,
                1e-10,
                -1e-10,
                1e10,
                -1e10,
                std::$ty::consts::PI,
                std::$ty::consts::E,
            ];
            boundaries[$self.rng.random_range(0..boundaries.len())]
        } else {
            // -1000.0 to 1000.0
            ($self.rng.random::<$ty>() * 2.0 - 1.0) * 1000.0
        }
    }};
}

/// Strings that tend to break parsers and length arithmetic
const EDGE_STRINGS: [&str; 8] = [
    "",
    " ",
    "\0",
    "\u{feff}",
    "é",
    "日本語",
    "🎵🎶",
    "a\r\nb",
];

/// Random scalar generator for fuzzing
pub struct ScalarGenerator {
    rng: ChaCha8Rng,
    include_edge_cases: bool,
    include_boundaries: bool,
    max_len: usize,
}

impl ScalarGenerator {
    /// Create a new generator with optional seed
    pub fn new(seed: Option<u64>, max_len: usize) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };

        Self {
            rng,
            include_edge_cases: true,
            include_boundaries: true,
            max_len,
        }
    }

    /// Set whether to include edge cases
    pub fn with_edge_cases(mut self, include: bool) -> Self {
        self.include_edge_cases = include;
        self
    }

    /// Set whether to include boundary values
    pub fn with_boundaries(mut self, include: bool) -> Self {
        self.include_boundaries = include;
        self
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform index below `len` (`len` must be non-zero)
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    /// Generate one scalar of `kind`
    pub fn scalar(&mut self, kind: ScalarKind) -> Scalar {
        match kind {
            ScalarKind::Bool => Scalar::Bool(self.rng.random::<bool>()),
            ScalarKind::I8 => Scalar::I8(gen_int!(self, i8)),
            ScalarKind::I16 => Scalar::I16(gen_int!(self, i16)),
            ScalarKind::I32 => Scalar::I32(gen_int!(self, i32)),
            ScalarKind::I64 => Scalar::I64(gen_int!(self, i64)),
            ScalarKind::Isize => Scalar::Isize(gen_int!(self, isize, i64)),
            ScalarKind::U8 => Scalar::U8(gen_int!(self, u8)),
            ScalarKind::U16 => Scalar::U16(gen_int!(self, u16)),
            ScalarKind::U32 => Scalar::U32(gen_int!(self, u32)),
            ScalarKind::U64 => Scalar::U64(gen_int!(self, u64)),
            ScalarKind::Usize => Scalar::Usize(gen_int!(self, usize, u64)),
            ScalarKind::F32 => Scalar::F32(gen_float!(self, f32)),
            ScalarKind::F64 => Scalar::F64(gen_float!(self, f64)),
            ScalarKind::C64 => {
                let re = gen_float!(self, f32);
                let im = gen_float!(self, f32);
                Scalar::C64(Complex32::new(re, im))
            }
            ScalarKind::C128 => {
                let re = gen_float!(self, f64);
                let im = gen_float!(self, f64);
                Scalar::C128(Complex64::new(re, im))
            }
            ScalarKind::String => Scalar::String(self.string()),
            ScalarKind::Bytes => Scalar::Bytes(self.bytes()),
        }
    }

    /// Generate a full argument list for `schema`
    pub fn sequence(&mut self, schema: &Schema) -> Vec<Scalar> {
        schema.fields().iter().map(|f| self.scalar(f.kind)).collect()
    }

    /// Generate a string of at most `max_len` chars
    pub fn string(&mut self) -> String {
        if self.include_edge_cases && self.rng.random_bool(0.2) {
            let edge = EDGE_STRINGS[self.rng.random_range(0..EDGE_STRINGS.len())];
            return edge.chars().take(self.max_len).collect();
        }

        let len = self.rng.random_range(0..=self.max_len);
        (0..len).map(|_| self.char()).collect()
    }

    /// Generate random bytes
    pub fn bytes(&mut self) -> Vec<u8> {
        let len = self.rng.random_range(0..=self.max_len);
        let mut buf = vec![0u8; len];
        self.rng.fill_bytes(&mut buf);
        buf
    }

    /// Mostly printable ASCII, occasionally any Unicode scalar value
    fn char(&mut self) -> char {
        if self.rng.random_bool(0.1) {
            self.rng.random::<char>()
        } else {
            char::from(self.rng.random_range(0x20u8..0x7f))
        }
    }

    /// Rewrite one position of `scalars` in place, keeping its kind
    pub fn mutate(&mut self, scalars: &mut Vec<Scalar>) {
        if scalars.is_empty() {
            return;
        }
        let at = self.rng.random_range(0..scalars.len());

        match &mut scalars[at] {
            Scalar::Bool(v) => *v = !*v,
            Scalar::I8(v) => *v = mutate_int!(self, *v, i8),
            Scalar::I16(v) => *v = mutate_int!(self, *v, i16),
            Scalar::I32(v) => *v = mutate_int!(self, *v, i32),
            Scalar::I64(v) => *v = mutate_int!(self, *v, i64),
            Scalar::Isize(v) => *v = mutate_int!(self, *v, isize, i64),
            Scalar::U8(v) => *v = mutate_int!(self, *v, u8),
            Scalar::U16(v) => *v = mutate_int!(self, *v, u16),
            Scalar::U32(v) => *v = mutate_int!(self, *v, u32),
            Scalar::U64(v) => *v = mutate_int!(self, *v, u64),
            Scalar::Usize(v) => *v = mutate_int!(self, *v, usize, u64),
            Scalar::F32(v) => *v = self.mutate_f32(*v),
            Scalar::F64(v) => *v = self.mutate_f64(*v),
            Scalar::C64(v) => {
                if self.rng.random_bool(0.5) {
                    v.re = self.mutate_f32(v.re);
                } else {
                    v.im = self.mutate_f32(v.im);
                }
            }
            Scalar::C128(v) => {
                if self.rng.random_bool(0.5) {
                    v.re = self.mutate_f64(v.re);
                } else {
                    v.im = self.mutate_f64(v.im);
                }
            }
            Scalar::String(s) => {
                let mut chars: Vec<char> = s.chars().collect();
                let fresh = self.char();
                self.edit(&mut chars, fresh);
                *s = chars.into_iter().collect();
            }
            Scalar::Bytes(b) => {
                let fresh = self.rng.random::<u8>();
                self.edit(b, fresh);
            }
        }
    }

    fn mutate_f32(&mut self, value: f32) -> f32 {
        match self.rng.random_range(0..3) {
            0 => -value,
            1 => value * 2.0,
            _ => gen_float!(self, f32),
        }
    }

    fn mutate_f64(&mut self, value: f64) -> f64 {
        match self.rng.random_range(0..3) {
            0 => -value,
            1 => value * 2.0,
            _ => gen_float!(self, f64),
        }
    }

    /// Insert, delete or replace one element, staying within `max_len`
    fn edit<T>(&mut self, items: &mut Vec<T>, fresh: T) {
        let op = if items.is_empty() {
            0
        } else {
            self.rng.random_range(0..3)
        };

        match op {
            0 if items.len() < self.max_len => {
                let at = self.rng.random_range(0..=items.len());
                items.insert(at, fresh);
            }
            0 | 1 => {
                if !items.is_empty() {
                    let at = self.rng.random_range(0..items.len());
                    items.remove(at);
                }
            }
            _ => {
                let at = self.rng.random_range(0..items.len());
                items[at] = fresh;
            }
        }
    }
}
