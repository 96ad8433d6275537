//! Field linearizer: record type → flat schema
//!
//! The schema is the ordered list of scalar slots a record type occupies.
//! It is a pure function of the type, so it is computed once per type and
//! cached for the life of the process.

use crate::path::FieldPath;
use crate::reflect::{Kind, Reflect, TypeInfo};
use crate::scalar::{Scalar, ScalarKind};
use crate::visitor::TypeVisitor;
use crate::{FuzzError, Mismatch, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// One scalar slot of a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub kind: ScalarKind,
    pub path: FieldPath,
}

/// Ordered scalar slots for one record type
#[derive(Debug, Clone)]
pub struct Schema {
    record: &'static str,
    fields: Arc<[FieldDescriptor]>,
}

impl Schema {
    /// Name of the record type this schema describes
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn kinds(&self) -> Vec<ScalarKind> {
        self.fields.iter().map(|f| f.kind).collect()
    }

    /// Whether `scalars` has exactly this schema's length and kinds
    pub fn matches(&self, scalars: &[Scalar]) -> bool {
        self.check(scalars).is_ok()
    }

    /// Check `scalars` slot by slot against this schema
    pub fn check(&self, scalars: &[Scalar]) -> Result<()> {
        if scalars.len() < self.len() {
            return Err(FuzzError::ShapeMismatch(Mismatch::TooFew {
                expected: self.len(),
                found: scalars.len(),
            }));
        }
        if scalars.len() > self.len() {
            return Err(FuzzError::ShapeMismatch(Mismatch::TooMany {
                expected: self.len(),
                found: scalars.len(),
            }));
        }
        for (position, (field, scalar)) in self.fields.iter().zip(scalars).enumerate() {
            if scalar.kind() != field.kind {
                return Err(FuzzError::ShapeMismatch(Mismatch::WrongKind {
                    position,
                    expected: field.kind,
                    found: scalar.kind(),
                    path: field.path.clone(),
                }));
            }
        }
        Ok(())
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record && self.fields == other.fields
    }
}

/// Fail unless `info` describes a record
pub(crate) fn ensure_record(info: &TypeInfo) -> Result<()> {
    if info.kind() != Kind::Struct {
        return Err(FuzzError::PreconditionViolation {
            kind: info.kind(),
            type_name: info.name(),
        });
    }
    Ok(())
}

/// Type visitor collecting one descriptor per scalar slot
#[derive(Default)]
struct Linearizer {
    fields: Vec<FieldDescriptor>,
}

impl Linearizer {
    fn leaf(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        match info.scalar() {
            Some(kind) => {
                self.fields.push(FieldDescriptor {
                    kind,
                    path: path.clone(),
                });
                Ok(())
            }
            None => Err(FuzzError::unsupported(info, path)),
        }
    }

    fn reject(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        Err(FuzzError::unsupported(info, path))
    }
}

impl TypeVisitor for Linearizer {
    fn visit_bool(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.leaf(info, path)
    }

    fn visit_int(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.leaf(info, path)
    }

    fn visit_uint(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.leaf(info, path)
    }

    fn visit_float(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.leaf(info, path)
    }

    fn visit_complex(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.leaf(info, path)
    }

    fn visit_string(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.leaf(info, path)
    }

    /// Only `Vec<u8>` carries a scalar kind
    fn visit_slice(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.leaf(info, path)
    }

    fn visit_pointer(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        if info.elem().is_some_and(|elem| elem.kind() == Kind::Pointer) {
            return Err(FuzzError::unsupported(info, path));
        }
        self.fields.push(FieldDescriptor {
            kind: ScalarKind::Bool,
            path: path.clone(),
        });
        Ok(())
    }

    fn visit_struct(&mut self, _info: &TypeInfo, _path: &FieldPath) -> Result<()> {
        Ok(())
    }

    fn visit_array(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.reject(info, path)
    }

    fn visit_chan(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.reject(info, path)
    }

    fn visit_func(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.reject(info, path)
    }

    fn visit_interface(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.reject(info, path)
    }

    fn visit_map(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.reject(info, path)
    }

    fn visit_unsafe_pointer(&mut self, info: &TypeInfo, path: &FieldPath) -> Result<()> {
        self.reject(info, path)
    }
}

static SCHEMAS: Lazy<RwLock<HashMap<TypeId, Schema>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Schema of record type `T`, computed on first use
pub fn linearize<T: Reflect>() -> Result<Schema> {
    let info = T::type_info();
    ensure_record(&info)?;

    if let Some(schema) = SCHEMAS.read().get(&info.id()) {
        return Ok(schema.clone());
    }

    let mut linearizer = Linearizer::default();
    T::traverse_type(&mut linearizer, &FieldPath::root())?;
    let schema = Schema {
        record: info.name(),
        fields: linearizer.fields.into(),
    };
    log::debug!("Linearized {} into {} scalars", schema.record, schema.len());

    Ok(SCHEMAS.write().entry(info.id()).or_insert(schema).clone())
}
