//! Bare instances and shape-driven example pairs
//!
//! A bare instance holds the zero value in every position: `None` and empty
//! collections for containers, `Default` for scalars, the first variant for
//! sealed types. Sealed types without a usable variant get a synthesized
//! stand-in, whose type is generated once per sealed type and shared by the
//! whole process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{VerifierError, VerifierResult};
use crate::providers::ChainedValueProvider;
use crate::shape::{FieldValues, SealedInfo, Shape, StandIn, StandInType, Variant, Zero};
use crate::types::{RawType, TypeDescriptor, TypeStack};
use crate::value::{ExamplePair, Opaque, Value};

lazy_static::lazy_static! {
    static ref STAND_IN_TYPES: Mutex<HashMap<RawType, Arc<StandInType>>> = Mutex::new(HashMap::new());
}

/// Builds the bare instance of `descriptor`
pub fn instantiate(descriptor: &TypeDescriptor, stack: &TypeStack) -> VerifierResult<Value> {
    let stack = stack.clone_with(descriptor)?;
    match descriptor.shape() {
        Shape::Top => Ok(Value::new(Opaque::default())),
        Shape::Scalar { zero } => Ok(zero()),
        Shape::Container(info) => match info.zero {
            Zero::Empty(empty) => Ok(empty()),
            Zero::FromArguments => {
                let parts = (0..info.arity)
                    .map(|n| instantiate(&descriptor.type_argument(n), &stack))
                    .collect::<VerifierResult<Vec<_>>>()?;
                descriptor.assemble(parts)
            }
        },
        Shape::Record(record) => {
            let mut values = FieldValues::new();
            for field in record.fields() {
                values.insert(field.name(), instantiate(field.declared(), &stack)?);
            }
            record.construct(values)
        }
        Shape::Sealed(info) => match info.variants().first() {
            Some(variant) => match variant {
                Variant::Constant(value) => Ok(value.clone()),
                Variant::Wrapped { descriptor: inner, .. } => variant.upcast(instantiate(inner, &stack)?),
            },
            None => stand_in(descriptor, &info, 0),
        },
    }
}

/// Builds an instance of a record from the given field values; fields without
/// a value get their zero value
pub fn instantiate_with(descriptor: &TypeDescriptor, mut values: FieldValues, stack: &TypeStack) -> VerifierResult<Value> {
    let record = descriptor
        .shape()
        .as_record()
        .cloned()
        .ok_or_else(|| VerifierError::access(format!("{} is not a record", descriptor)))?;
    let stack = stack.clone_with(descriptor)?;
    for field in record.fields() {
        if !values.contains(field.name()) {
            values.insert(field.name(), instantiate(field.declared(), &stack)?);
        }
    }
    record.construct(values)
}

/// The variant used to build values of a sealed type
pub fn concrete_variant(descriptor: &TypeDescriptor) -> Option<Variant> {
    match descriptor.shape() {
        Shape::Sealed(info) => info.variants().first().cloned(),
        _ => None,
    }
}

/// Returns the stand-in type of a sealed type, generating it on first use
pub fn stand_in_type(parent: &TypeDescriptor) -> Arc<StandInType> {
    let mut types = STAND_IN_TYPES.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let count = types.len();
    types
        .entry(parent.raw())
        .or_insert_with(|| {
            let name = format!("{}$$StandIn${}", parent.raw().short_name(), count);
            log::info!("Synthesized stand-in type {} for {}", name, parent);
            Arc::new(StandInType::new(name, parent.raw()))
        })
        .clone()
}

fn stand_in(descriptor: &TypeDescriptor, info: &SealedInfo, discriminant: u64) -> VerifierResult<Value> {
    if !info.accepts_stand_in() {
        return Err(VerifierError::access(format!(
            "Cannot instantiate {}: it declares no variants and accepts no stand-in",
            descriptor
        )));
    }
    let kind = stand_in_type(descriptor);
    info.wrap_stand_in(StandIn::new(kind, discriminant))
        .ok_or_else(|| VerifierError::access(format!("{} refused its stand-in", descriptor)))
}

/// Builds an example pair from the shape of a record or sealed type
///
/// `stack` must already contain `descriptor`.
pub fn example_pair(descriptor: &TypeDescriptor, chain: &ChainedValueProvider, stack: &TypeStack) -> VerifierResult<ExamplePair> {
    match descriptor.shape() {
        Shape::Record(record) => {
            let mut lows = FieldValues::new();
            let mut highs = FieldValues::new();
            let mut copies = FieldValues::new();
            for field in record.fields() {
                let pair = chain.realize(field.declared(), Some(field.label()), stack)?;
                lows.insert(field.name(), pair.low);
                highs.insert(field.name(), pair.high);
                copies.insert(field.name(), pair.low_copy);
            }
            Ok(ExamplePair::with_copy(
                record.construct(lows)?,
                record.construct(highs)?,
                record.construct(copies)?,
            ))
        }
        Shape::Sealed(info) => sealed_pair(descriptor, &info, chain, stack),
        other => Err(VerifierError::access(format!(
            "Cannot build values of {} from its shape {:?}",
            descriptor, other
        ))),
    }
}

fn sealed_pair(
    descriptor: &TypeDescriptor,
    info: &SealedInfo,
    chain: &ChainedValueProvider,
    stack: &TypeStack,
) -> VerifierResult<ExamplePair> {
    let mut variants = info.variants().iter();
    match variants.next() {
        Some(first) => match first {
            Variant::Wrapped { descriptor: inner, .. } => {
                let pair = chain.realize(inner, None, stack)?;
                pair.map(|value| first.upcast(value))
            }
            Variant::Constant(low) => {
                let high = match variants.next() {
                    Some(next) => match next {
                        Variant::Wrapped { descriptor: inner, .. } => next.upcast(variant_value(inner, chain, stack)?)?,
                        Variant::Constant(high) => high.clone(),
                    },
                    None => low.clone(),
                };
                Ok(ExamplePair::new(low.clone(), high))
            }
        },
        None => Ok(ExamplePair::with_copy(
            stand_in(descriptor, info, 1)?,
            stand_in(descriptor, info, 2)?,
            stand_in(descriptor, info, 1)?,
        )),
    }
}

/// A value of the type wrapped by a non-first variant
///
/// A variant that leads back into its own family, as the `Cons` of a list,
/// falls back to a bare instance: the constant before it already ends the
/// recursion there.
fn variant_value(inner: &TypeDescriptor, chain: &ChainedValueProvider, stack: &TypeStack) -> VerifierResult<Value> {
    match chain.realize(inner, None, stack) {
        Ok(pair) => Ok(pair.low),
        Err(VerifierError::Recursion { .. }) => {
            log::debug!("{} is recursive, using a bare instance", inner);
            instantiate(inner, &TypeStack::new())
        }
        Err(e) => Err(e),
    }
}
