//! # rf-fuzz-struct
//!
//! Structured-record fuzzing for corpus-based drivers that only speak flat
//! lists of primitive scalars.
//!
//! ## Features
//!
//! - **Record Codec**: Flatten a record into `Vec<Scalar>` and rebuild it
//! - **Stable Field Order**: Exported fields, declaration order, fully flat
//! - **Optional Fields**: `Option<T>` becomes a presence flag plus payload
//! - **Generic Traversal**: Visitor traits with one operation per kind
//! - **Driver Adapter**: Seed examples and register typed targets
//! - **Reference Runner**: Seeded generation, mutation, panic capture, reports
//!
//! ## Example
//!
//! ```rust,ignore
//! use rf_fuzz_struct::{fuzz_record, FuzzConfig, FuzzContext, FuzzRunner};
//!
//! fuzz_record! {
//!     #[derive(Debug)]
//!     pub struct Header {
//!         pub version: u8,
//!         pub name: Option<String>,
//!     }
//! }
//!
//! let mut runner = FuzzRunner::new(FuzzConfig::ci().with_seed(42));
//! runner.add(&Header { version: 1, name: None })?;
//!
//! let result = runner.fuzz(|_ctx: &mut FuzzContext, header: Header| {
//!     parse_header(header);
//! })?;
//! println!("{}", result.summary());
//! ```

pub mod build;
pub mod config;
pub mod driver;
pub mod encode;
pub mod generators;
pub mod harness;
pub mod linearize;
pub mod path;
pub mod printer;
pub mod record;
pub mod reflect;
pub mod report;
pub mod scalar;
pub mod visitor;

pub use build::{build, ScalarReader};
pub use config::FuzzConfig;
pub use driver::{add_example, register_target, EntryPoint, FuzzDriver};
pub use encode::encode;
pub use generators::ScalarGenerator;
pub use harness::{FailureType, FuzzContext, FuzzFailure, FuzzResult, FuzzRunner, InputSource};
pub use linearize::{linearize, FieldDescriptor, Schema};
pub use path::{FieldPath, Step};
pub use printer::debug_tree;
pub use record::{is_exported, FieldInfo, Record};
pub use reflect::{Dynamic, Kind, Reflect, TypeInfo};
pub use report::{FuzzReport, ReportFormat};
pub use scalar::{Scalar, ScalarKind, ScalarValue};
pub use visitor::{traverse_type, traverse_value, TypeVisitor, ValueVisitor};

use thiserror::Error;

/// How a scalar sequence fails to fit a record's schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Mismatch {
    #[error("expected {expected} scalars, found only {found}")]
    TooFew { expected: usize, found: usize },

    #[error("expected {expected} scalars, found {found}")]
    TooMany { expected: usize, found: usize },

    #[error("scalar {position} ({path}): expected {expected}, found {found}")]
    WrongKind {
        position: usize,
        expected: ScalarKind,
        found: ScalarKind,
        path: FieldPath,
    },
}

/// Errors that can occur while encoding, rebuilding or fuzzing records
#[derive(Error, Debug)]
pub enum FuzzError {
    #[error("unsupported {kind} field `{path}` of type {type_name}")]
    UnsupportedKind {
        kind: Kind,
        type_name: &'static str,
        path: FieldPath,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(Mismatch),

    #[error("{type_name} is a {kind}, not a record")]
    PreconditionViolation { kind: Kind, type_name: &'static str },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FuzzError {
    /// `UnsupportedKind` for a node of type `info` at `path`
    pub fn unsupported(info: &TypeInfo, path: &FieldPath) -> Self {
        FuzzError::UnsupportedKind {
            kind: info.kind(),
            type_name: info.name(),
            path: path.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FuzzError>;
