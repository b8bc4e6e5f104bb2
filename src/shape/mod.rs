//! Shapes: how the engine builds and takes apart values of a described type
//!
//! Rust has no runtime reflection, so every type that takes part in
//! verification implements `Described`. The descriptor it returns identifies
//! the type and carries a function producing its `Shape`, which tells the
//! engine whether the type is a scalar, a generic container, a record with a
//! field table, or a sealed family of variants.

mod record;
mod sealed;
mod std_types;

use std::fmt;
use std::rc::Rc;

use crate::error::{VerifierError, VerifierResult};
use crate::types::TypeDescriptor;
use crate::value::Value;

pub use self::record::{FieldDescriptor, FieldLabel, FieldValues, RecordBuilder, RecordInfo};
pub use self::sealed::{SealedBuilder, SealedInfo, StandIn, StandInType, Variant};

/// A type the engine can resolve example values for
pub trait Described: std::any::Any + Clone + PartialEq + fmt::Debug {
    fn descriptor() -> TypeDescriptor;
}

/// How the zero value of a container is obtained
#[derive(Clone, Copy)]
pub enum Zero {
    /// A fixed empty value such as `None` or an empty collection
    Empty(fn() -> Value),
    /// Assembled from the zero values of the type arguments
    FromArguments,
}

/// Generic container assembled from one value per type argument
#[derive(Clone, Copy)]
pub struct ContainerInfo {
    pub arity: usize,
    pub zero: Zero,
    pub assemble: fn(Vec<Value>) -> VerifierResult<Value>,
}

/// Structural description of a type
#[derive(Clone)]
pub enum Shape {
    /// The unconstrained top type
    Top,
    /// A leaf type; the zero value is its default
    Scalar { zero: fn() -> Value },
    Container(ContainerInfo),
    Record(Rc<RecordInfo>),
    /// Abstract or closed family of concrete variants
    Sealed(Rc<SealedInfo>),
}

impl Shape {
    pub fn record(info: RecordInfo) -> Self {
        Shape::Record(Rc::new(info))
    }

    pub fn sealed(info: SealedInfo) -> Self {
        Shape::Sealed(Rc::new(info))
    }

    pub fn container(arity: usize, zero: Zero, assemble: fn(Vec<Value>) -> VerifierResult<Value>) -> Self {
        Shape::Container(ContainerInfo { arity, zero, assemble })
    }

    pub fn as_record(&self) -> Option<&Rc<RecordInfo>> {
        match self {
            Shape::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Builds a value from the values of its parts: one per type argument for
    /// containers, one per field (in declaration order) for records
    pub fn assemble(&self, parts: Vec<Value>) -> VerifierResult<Value> {
        match self {
            Shape::Container(info) => (info.assemble)(parts),
            Shape::Record(record) => {
                if parts.len() != record.fields().len() {
                    return Err(VerifierError::access(format!(
                        "{} has {} fields but {} values were given",
                        record.type_name(),
                        record.fields().len(),
                        parts.len()
                    )));
                }
                let mut values = FieldValues::new();
                for (field, part) in record.fields().iter().zip(parts) {
                    values.insert(field.name(), part);
                }
                record.construct(values)
            }
            Shape::Top | Shape::Scalar { .. } | Shape::Sealed(_) => {
                Err(VerifierError::access("type is not built from parts"))
            }
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Top => write!(f, "Top"),
            Shape::Scalar { .. } => write!(f, "Scalar"),
            Shape::Container(info) => write!(f, "Container({})", info.arity),
            Shape::Record(record) => write!(f, "Record({})", record.type_name()),
            Shape::Sealed(info) => write!(f, "Sealed({})", info.type_name()),
        }
    }
}

/// Takes the next part and converts it to `T`
pub fn next_part<T: std::any::Any>(parts: &mut std::vec::IntoIter<Value>) -> VerifierResult<T> {
    parts
        .next()
        .ok_or_else(|| VerifierError::access("missing value for a type argument"))?
        .into_inner::<T>()
}
