//! Field paths
//!
//! A [`FieldPath`] names where a node sits inside a (possibly nested) record.
//! It is diagnostic only: errors and debug output use it, the codec never
//! branches on it.

use std::fmt;

/// One step of a path: the field's index within its immediate parent and
/// its declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    pub index: usize,
    pub name: &'static str,
}

/// Immutable, append-only trail of [`Step`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    steps: Vec<Step>,
}

impl FieldPath {
    /// Step name used when descending into the referent of an `Option<T>`
    pub const POINTEE: &'static str = "*";

    /// Step name used when descending into the payload of a `Dynamic`
    pub const DYNAMIC: &'static str = "dyn";

    /// The empty path (the root record itself)
    pub fn root() -> Self {
        Self::default()
    }

    /// New path with exactly one more step than `self`
    pub fn child(&self, index: usize, name: &'static str) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(Step { index, name });
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps from the root
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Field indexes only, root first
    pub fn indexes(&self) -> Vec<usize> {
        self.steps.iter().map(|s| s.index).collect()
    }

    /// Last step's name, if any
    pub fn name(&self) -> Option<&'static str> {
        self.steps.last().map(|s| s.name)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("<root>");
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(step.name)?;
        }
        Ok(())
    }
}
