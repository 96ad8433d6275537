//! Reconstructor: flat scalar sequence → record value
//!
//! Reads strictly left to right with no look-ahead. Every leaf pops one
//! scalar of exactly its kind; an `Option<T>` pops its presence flag, builds
//! the referent unconditionally (so the cursor stays aligned with the
//! encoder's zero-payload) and keeps it only when the flag was set.

use crate::linearize::{self, ensure_record};
use crate::path::FieldPath;
use crate::reflect::Reflect;
use crate::scalar::{Scalar, ScalarValue};
use crate::{FuzzError, Mismatch, Result};
use std::vec;

/// Cursor over the scalars being consumed
#[derive(Debug)]
pub struct ScalarReader {
    scalars: vec::IntoIter<Scalar>,
    position: usize,
    total: usize,
}

impl ScalarReader {
    pub fn new(scalars: Vec<Scalar>) -> Self {
        let total = scalars.len();
        Self {
            scalars: scalars.into_iter(),
            position: 0,
            total,
        }
    }

    /// Number of scalars consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.scalars.len()
    }

    /// Consume the next scalar, which must be a `T`
    pub fn pop<T: ScalarValue>(&mut self, path: &FieldPath) -> Result<T> {
        let scalar = self.scalars.next().ok_or(FuzzError::ShapeMismatch(Mismatch::TooFew {
            expected: self.position + 1,
            found: self.total,
        }))?;
        let position = self.position;
        self.position += 1;

        T::from_scalar(scalar).map_err(|found| {
            FuzzError::ShapeMismatch(Mismatch::WrongKind {
                position,
                expected: T::KIND,
                found: found.kind(),
                path: path.clone(),
            })
        })
    }

    /// Fail if anything is left unconsumed
    pub fn finish(self) -> Result<()> {
        if self.remaining() > 0 {
            return Err(FuzzError::ShapeMismatch(Mismatch::TooMany {
                expected: self.position,
                found: self.total,
            }));
        }
        Ok(())
    }
}

/// Rebuild a `T` from `scalars`.
///
/// The sequence is checked against `T`'s schema up front, so a short,
/// long or mistyped sequence fails before any field is built.
pub fn build<T: Reflect>(scalars: Vec<Scalar>) -> Result<T> {
    ensure_record(&T::type_info())?;
    linearize::linearize::<T>()?.check(&scalars)?;

    let mut reader = ScalarReader::new(scalars);
    let value = T::build(&mut reader, &FieldPath::root())?;
    reader.finish()?;
    Ok(value)
}
