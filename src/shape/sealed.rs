//! Sealed families: enums and other abstract types with known variants
//!
//! A sealed type is never built directly. Values come from one of its
//! variants, tried in declaration order, so the choice of concrete variant is
//! deterministic. A family that declares no usable variant may instead accept
//! a synthesized `StandIn`.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use super::Described;
use crate::error::VerifierResult;
use crate::types::{RawType, TypeDescriptor};
use crate::value::Value;

type UpcastFn = Rc<dyn Fn(Value) -> VerifierResult<Value>>;
type StandInFn = Rc<dyn Fn(StandIn) -> Value>;

/// One concrete member of a sealed family
#[derive(Clone)]
pub enum Variant {
    /// A fieldless member, such as a unit enum variant
    Constant(Value),
    /// A member wrapping a value of another described type
    Wrapped {
        descriptor: TypeDescriptor,
        upcast: UpcastFn,
    },
}

impl Variant {
    /// Converts a value of the wrapped type into the sealed type
    pub fn upcast(&self, inner: Value) -> VerifierResult<Value> {
        match self {
            Variant::Constant(value) => Ok(value.clone()),
            Variant::Wrapped { upcast, .. } => upcast(inner),
        }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Constant(value) => write!(f, "Constant({:?})", value),
            Variant::Wrapped { descriptor, .. } => write!(f, "Wrapped({})", descriptor),
        }
    }
}

/// Variants of a sealed type and its optional stand-in constructor
#[derive(Clone)]
pub struct SealedInfo {
    type_name: &'static str,
    variants: Vec<Variant>,
    stand_in: Option<StandInFn>,
}

impl SealedInfo {
    pub fn builder<T: Described>() -> SealedBuilder<T> {
        SealedBuilder {
            info: SealedInfo {
                type_name: std::any::type_name::<T>(),
                variants: Vec::new(),
                stand_in: None,
            },
            _marker: PhantomData,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn accepts_stand_in(&self) -> bool {
        self.stand_in.is_some()
    }

    /// Wraps a stand-in as a value of the sealed type, if the type allows it
    pub fn wrap_stand_in(&self, stand_in: StandIn) -> Option<Value> {
        self.stand_in.as_ref().map(|wrap| wrap(stand_in))
    }
}

impl fmt::Debug for SealedInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedInfo")
            .field("type_name", &self.type_name)
            .field("variants", &self.variants)
            .field("stand_in", &self.accepts_stand_in())
            .finish()
    }
}

pub struct SealedBuilder<T> {
    info: SealedInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Described> SealedBuilder<T> {
    /// Adds a variant holding a value of type `V`
    pub fn variant<V: Described>(mut self, wrap: fn(V) -> T) -> Self {
        let upcast: UpcastFn = Rc::new(move |inner: Value| Ok(Value::new(wrap(inner.into_inner::<V>()?))));
        self.info.variants.push(Variant::Wrapped {
            descriptor: V::descriptor(),
            upcast,
        });
        self
    }

    /// Adds a fieldless variant
    pub fn constant(mut self, value: T) -> Self {
        self.info.variants.push(Variant::Constant(Value::new(value)));
        self
    }

    /// Accepts synthesized stand-ins when no variant can produce values
    pub fn stand_in(mut self, wrap: fn(StandIn) -> T) -> Self {
        self.info.stand_in = Some(Rc::new(move |stand_in| Value::new(wrap(stand_in))));
        self
    }

    pub fn build(self) -> SealedInfo {
        self.info
    }
}

/// A synthesized concrete type standing in for a sealed type
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StandInType {
    name: String,
    parent: RawType,
}

impl StandInType {
    pub(crate) fn new(name: String, parent: RawType) -> Self {
        Self { name, parent }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> RawType {
        self.parent
    }
}

/// An instance of a synthesized stand-in type
///
/// Stand-ins compare by type and discriminant, so instances built with the
/// same discriminant are equal without being the same allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StandIn {
    kind: Arc<StandInType>,
    discriminant: u64,
}

impl StandIn {
    pub fn new(kind: Arc<StandInType>, discriminant: u64) -> Self {
        Self { kind, discriminant }
    }

    pub fn kind(&self) -> &StandInType {
        &self.kind
    }

    pub fn discriminant(&self) -> u64 {
        self.discriminant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    #[derive(Debug, Clone, PartialEq)]
    enum Light {
        On,
        Dimmed(u8),
    }

    impl Described for Light {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::new(RawType::of::<Light>(), Vec::new(), || {
                Shape::sealed(
                    SealedInfo::builder::<Light>()
                        .constant(Light::On)
                        .variant::<u8>(Light::Dimmed)
                        .build(),
                )
            })
        }
    }

    #[test]
    fn test_variants_keep_declaration_order() {
        let info = match Light::descriptor().shape() {
            Shape::Sealed(info) => info,
            other => panic!("expected a sealed type, got {:?}", other),
        };
        assert_eq!(info.variants().len(), 2);
        assert!(matches!(info.variants()[0], Variant::Constant(_)));
        assert!(!info.accepts_stand_in());

        let dimmed = info.variants()[1].upcast(Value::new(7u8)).unwrap();
        assert_eq!(dimmed.extract::<Light>().unwrap(), Light::Dimmed(7));
    }

    #[test]
    fn test_upcast_rejects_wrong_inner_type() {
        let info = SealedInfo::builder::<Light>().variant::<u8>(Light::Dimmed).build();
        assert!(info.variants()[0].upcast(Value::new("x".to_string())).is_err());
    }

    #[test]
    fn test_stand_ins_compare_by_discriminant() {
        let kind = Arc::new(StandInType::new("Light$$StandIn$0".to_string(), RawType::of::<Light>()));
        let a = StandIn::new(kind.clone(), 1);
        let b = StandIn::new(kind.clone(), 1);
        let c = StandIn::new(kind, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.kind().parent(), RawType::of::<Light>());
    }
}
