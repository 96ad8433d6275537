//! Type descriptors and per-type dispatch
//!
//! [`Reflect`] is implemented for every shape the traversal engine knows how
//! to classify. Each implementation fires exactly one visitor operation per
//! node and recurses only where the node has a single well-defined child
//! (`Option<T>`, a present [`Dynamic`], record fields). Records get their
//! implementation from [`fuzz_record!`](crate::fuzz_record).
//!
//! Types with no classification cannot implement the trait, so an unknown
//! kind is a compile error rather than a runtime one. `Box<T>`, `Rc<T>` and
//! `Arc<T>` are deliberately absent: without them a record cannot reach
//! itself except through an opaque `Vec`/map, so type walks always end.

use crate::build::ScalarReader;
use crate::path::FieldPath;
use crate::record::FieldInfo;
use crate::scalar::{ScalarKind, ScalarValue};
use crate::visitor::{self, TypeVisitor, ValueVisitor};
use crate::{FuzzError, Result};
use crossbeam_channel::{Receiver, Sender};
use num_complex::{Complex32, Complex64};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

/// Shape category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    Array,
    Chan,
    Func,
    Interface,
    Map,
    Pointer,
    Slice,
    String,
    Struct,
    UnsafePointer,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Complex => "complex",
            Kind::Array => "array",
            Kind::Chan => "chan",
            Kind::Func => "func",
            Kind::Interface => "interface",
            Kind::Map => "map",
            Kind::Pointer => "pointer",
            Kind::Slice => "slice",
            Kind::String => "string",
            Kind::Struct => "struct",
            Kind::UnsafePointer => "unsafe pointer",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type ZeroWalk = fn(&mut dyn ValueVisitor, &FieldPath) -> Result<()>;

/// Static description of one type: what it is, what it maps onto, and how
/// to reach its element type and its zero value.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: Kind,
    scalar: Option<ScalarKind>,
    elem: Option<fn() -> TypeInfo>,
    fields: &'static [FieldInfo],
    walk_zero: ZeroWalk,
}

impl TypeInfo {
    /// Descriptor for `T` with the given kind; refine with the `with_*` builders
    pub fn of<T: Reflect>(kind: Kind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind,
            scalar: None,
            elem: None,
            fields: &[],
            walk_zero: walk_zero::<T>,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_scalar(mut self, scalar: ScalarKind) -> Self {
        self.scalar = Some(scalar);
        self
    }

    pub fn with_elem<E: Reflect>(mut self) -> Self {
        self.elem = Some(E::type_info);
        self
    }

    pub fn with_fields(mut self, fields: &'static [FieldInfo]) -> Self {
        self.fields = fields;
        self
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Primitive scalar this type occupies, if it is a leaf the codec supports
    pub fn scalar(&self) -> Option<ScalarKind> {
        self.scalar
    }

    /// Pointee / element type, for pointers, slices and arrays
    pub fn elem(&self) -> Option<TypeInfo> {
        self.elem.map(|f| f())
    }

    /// Declared fields (records only)
    pub fn fields(&self) -> &'static [FieldInfo] {
        self.fields
    }

    /// Walk a freshly built zero value of this type with `visitor`
    pub fn walk_zero(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        (self.walk_zero)(visitor, path)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("scalar", &self.scalar)
            .finish()
    }
}

fn walk_zero<T: Reflect>(visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
    T::zero().traverse(visitor, path)
}

/// A type the traversal engine can classify, walk and (for supported
/// shapes) rebuild from scalars.
pub trait Reflect: Any {
    fn type_info() -> TypeInfo
    where
        Self: Sized;

    /// Zero-initialised instance
    fn zero() -> Self
    where
        Self: Sized;

    /// Visit this value: one operation for this node, then its children
    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()>;

    /// Visit the type without a value
    fn traverse_type(visitor: &mut dyn TypeVisitor, path: &FieldPath) -> Result<()>
    where
        Self: Sized,
    {
        visitor::dispatch_type(visitor, &Self::type_info(), path)
    }

    /// Rebuild a value by consuming scalars from `reader`
    fn build(_reader: &mut ScalarReader, path: &FieldPath) -> Result<Self>
    where
        Self: Sized,
    {
        Err(FuzzError::unsupported(&Self::type_info(), path))
    }
}

// ============================================================================
// Scalars
// ============================================================================

macro_rules! reflect_scalar {
    ($($ty:ty => $kind:ident, $visit:ident);* $(;)?) => {
        $(
            impl Reflect for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::of::<Self>(Kind::$kind)
                        .named(<$ty as ScalarValue>::KIND.type_name())
                        .with_scalar(<$ty as ScalarValue>::KIND)
                }

                fn zero() -> Self {
                    Default::default()
                }

                fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
                    visitor.$visit((*self).into_scalar(), path)
                }

                fn build(reader: &mut ScalarReader, path: &FieldPath) -> Result<Self> {
                    reader.pop::<$ty>(path)
                }
            }
        )*
    };
}

reflect_scalar! {
    i8 => Int, visit_int;
    i16 => Int, visit_int;
    i32 => Int, visit_int;
    i64 => Int, visit_int;
    isize => Int, visit_int;
    u8 => Uint, visit_uint;
    u16 => Uint, visit_uint;
    u32 => Uint, visit_uint;
    u64 => Uint, visit_uint;
    usize => Uint, visit_uint;
    f32 => Float, visit_float;
    f64 => Float, visit_float;
    Complex32 => Complex, visit_complex;
    Complex64 => Complex, visit_complex;
}

impl Reflect for bool {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::Bool)
            .named("bool")
            .with_scalar(ScalarKind::Bool)
    }

    fn zero() -> Self {
        false
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_bool(*self, path)
    }

    fn build(reader: &mut ScalarReader, path: &FieldPath) -> Result<Self> {
        reader.pop::<bool>(path)
    }
}

impl Reflect for String {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::String)
            .named("String")
            .with_scalar(ScalarKind::String)
    }

    fn zero() -> Self {
        String::new()
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_string(self, path)
    }

    fn build(reader: &mut ScalarReader, path: &FieldPath) -> Result<Self> {
        reader.pop::<String>(path)
    }
}

// ============================================================================
// Optional reference
// ============================================================================

impl<T: Reflect> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::Pointer).with_elem::<T>()
    }

    fn zero() -> Self {
        None
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_pointer(&Self::type_info(), self.is_some(), path)?;
        match self {
            Some(inner) => inner.traverse(visitor, &path.child(0, FieldPath::POINTEE)),
            None => Ok(()),
        }
    }

    fn traverse_type(visitor: &mut dyn TypeVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_pointer(&Self::type_info(), path)?;
        T::traverse_type(visitor, &path.child(0, FieldPath::POINTEE))
    }

    fn build(reader: &mut ScalarReader, path: &FieldPath) -> Result<Self> {
        let elem = T::type_info();
        if elem.kind() == Kind::Pointer {
            return Err(FuzzError::unsupported(&Self::type_info(), path));
        }
        let present = reader.pop::<bool>(path)?;
        // The payload is always consumed so the cursor stays aligned
        let value = T::build(reader, &path.child(0, FieldPath::POINTEE))?;
        Ok(present.then_some(value))
    }
}

// ============================================================================
// Sequences (only Vec<u8> maps onto a scalar)
// ============================================================================

fn is_byte<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<u8>()
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_info() -> TypeInfo {
        let info = TypeInfo::of::<Self>(Kind::Slice).with_elem::<T>();
        if is_byte::<T>() {
            info.named("Vec<u8>").with_scalar(ScalarKind::Bytes)
        } else {
            info
        }
    }

    fn zero() -> Self {
        Vec::new()
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        let bytes = (self as &dyn Any)
            .downcast_ref::<Vec<u8>>()
            .map(Vec::as_slice);
        visitor.visit_slice(&Self::type_info(), self.len(), bytes, path)
    }

    fn build(reader: &mut ScalarReader, path: &FieldPath) -> Result<Self> {
        if !is_byte::<T>() {
            return Err(FuzzError::unsupported(&Self::type_info(), path));
        }
        let bytes: Box<dyn Any> = Box::new(reader.pop::<Vec<u8>>(path)?);
        bytes
            .downcast::<Vec<T>>()
            .map(|v| *v)
            .map_err(|_| FuzzError::unsupported(&Self::type_info(), path))
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::Array).with_elem::<T>()
    }

    fn zero() -> Self {
        std::array::from_fn(|_| T::zero())
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_array(&Self::type_info(), N, path)
    }
}

// ============================================================================
// Opaque kinds: visited, never recursed into, never encoded
// ============================================================================

impl<K: 'static, V: 'static, S: BuildHasher + Default + 'static> Reflect for HashMap<K, V, S> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::Map)
    }

    fn zero() -> Self {
        HashMap::default()
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_map(&Self::type_info(), self.len(), path)
    }
}

impl<K: 'static, V: 'static> Reflect for BTreeMap<K, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::Map)
    }

    fn zero() -> Self {
        BTreeMap::new()
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_map(&Self::type_info(), self.len(), path)
    }
}

impl<T: 'static> Reflect for Sender<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::Chan)
    }

    /// A sender whose receiver is already gone
    fn zero() -> Self {
        crossbeam_channel::bounded(0).0
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_chan(&Self::type_info(), path)
    }
}

impl<T: 'static> Reflect for Receiver<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::Chan)
    }

    fn zero() -> Self {
        crossbeam_channel::never()
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_chan(&Self::type_info(), path)
    }
}

fn zero_fn0<R: Default>() -> R {
    R::default()
}

fn zero_fn1<A, R: Default>(_: A) -> R {
    R::default()
}

fn zero_fn2<A, B, R: Default>(_: A, _: B) -> R {
    R::default()
}

macro_rules! reflect_fn {
    ($zero:ident; $($arg:ident),*) => {
        impl<$($arg: 'static,)* R: Default + 'static> Reflect for fn($($arg),*) -> R {
            fn type_info() -> TypeInfo {
                TypeInfo::of::<Self>(Kind::Func)
            }

            /// Function returning `R::default()`
            fn zero() -> Self {
                $zero::<$($arg,)* R>
            }

            fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
                visitor.visit_func(&Self::type_info(), path)
            }
        }
    };
}

reflect_fn!(zero_fn0;);
reflect_fn!(zero_fn1; A);
reflect_fn!(zero_fn2; A, B);

impl<T: 'static> Reflect for *const T {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::UnsafePointer)
    }

    fn zero() -> Self {
        std::ptr::null()
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_unsafe_pointer(&Self::type_info(), path)
    }
}

impl<T: 'static> Reflect for *mut T {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::UnsafePointer)
    }

    fn zero() -> Self {
        std::ptr::null_mut()
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_unsafe_pointer(&Self::type_info(), path)
    }
}

// ============================================================================
// Dynamic
// ============================================================================

/// Dynamically-typed field: holds any `Reflect` value, or nothing.
///
/// Value walks descend into the payload when one is present. The static
/// type is unknown, so type walks and the codec treat it as unsupported.
#[derive(Default)]
pub struct Dynamic(Option<Box<dyn Reflect + Send + Sync>>);

impl Dynamic {
    pub fn new<T: Reflect + Send + Sync>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Dynamic(..)"),
            None => f.write_str("Dynamic(None)"),
        }
    }
}

impl Reflect for Dynamic {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(Kind::Interface).named("Dynamic")
    }

    fn zero() -> Self {
        Self(None)
    }

    fn traverse(&self, visitor: &mut dyn ValueVisitor, path: &FieldPath) -> Result<()> {
        visitor.visit_interface(&Self::type_info(), self.is_present(), path)?;
        match &self.0 {
            Some(inner) => inner.traverse(visitor, &path.child(0, FieldPath::DYNAMIC)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_info() {
        let info = i16::type_info();
        assert_eq!(info.kind(), Kind::Int);
        assert_eq!(info.scalar(), Some(ScalarKind::I16));
        assert_eq!(info.name(), "i16");
        assert!(info.elem().is_none());

        assert_eq!(Complex32::type_info().kind(), Kind::Complex);
        assert_eq!(String::type_info().scalar(), Some(ScalarKind::String));
    }

    #[test]
    fn test_option_elem() {
        let info = <Option<f32>>::type_info();
        assert_eq!(info.kind(), Kind::Pointer);
        assert_eq!(info.scalar(), None);
        let elem = info.elem().unwrap();
        assert_eq!(elem, f32::type_info());

        let nested = <Option<Option<u8>>>::type_info();
        assert_eq!(nested.elem().unwrap().kind(), Kind::Pointer);
    }

    #[test]
    fn test_only_byte_vectors_are_scalars() {
        assert_eq!(<Vec<u8>>::type_info().scalar(), Some(ScalarKind::Bytes));
        assert_eq!(<Vec<u16>>::type_info().scalar(), None);
        assert_eq!(<Vec<u16>>::type_info().kind(), Kind::Slice);
    }

    #[test]
    fn test_opaque_kinds() {
        assert_eq!(<[u8; 4]>::type_info().kind(), Kind::Array);
        assert_eq!(<HashMap<String, u32>>::type_info().kind(), Kind::Map);
        assert_eq!(<BTreeMap<u8, u8>>::type_info().kind(), Kind::Map);
        assert_eq!(<Sender<u8>>::type_info().kind(), Kind::Chan);
        assert_eq!(<Receiver<u8>>::type_info().kind(), Kind::Chan);
        assert_eq!(<fn(u8) -> bool>::type_info().kind(), Kind::Func);
        assert_eq!(<*const u8>::type_info().kind(), Kind::UnsafePointer);
        assert_eq!(Dynamic::type_info().kind(), Kind::Interface);
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(<[u16; 3]>::zero(), [0, 0, 0]);
        assert!(<*mut u32>::zero().is_null());
        let f = <fn(u8, u8) -> i32>::zero();
        assert_eq!(f(3, 4), 0);
        assert!(!Dynamic::zero().is_present());
        assert_eq!(<Option<String>>::zero(), None);
    }
}
