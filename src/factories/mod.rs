//! Prefab value factories
//!
//! A factory turns a type descriptor into an example pair. Scalar factories
//! hand out fixed values; generic factories resolve each type argument through
//! the provider chain and assemble the container around the results.

mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::VerifierResult;
use crate::providers::ChainedValueProvider;
use crate::shape::Described;
use crate::types::{RawType, TypeDescriptor, TypeStack};
use crate::value::{ExamplePair, Opaque, Value};

pub use self::builtin::builtin_factories;

/// Creates example pairs for the types registered against it
pub trait PrefabValueFactory {
    /// Produces a pair for `descriptor`. `stack` already contains
    /// `descriptor`; nested resolutions go back through `chain`.
    fn create_values(
        &self,
        descriptor: &TypeDescriptor,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<ExamplePair>;
}

impl<F> PrefabValueFactory for F
where
    F: Fn(&TypeDescriptor, &ChainedValueProvider, &TypeStack) -> VerifierResult<ExamplePair>,
{
    fn create_values(
        &self,
        descriptor: &TypeDescriptor,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<ExamplePair> {
        self(descriptor, chain, stack)
    }
}

pub type SharedFactory = Arc<dyn PrefabValueFactory + Send + Sync>;

/// Factories keyed by the raw type they serve
pub type FactoryCache = HashMap<RawType, SharedFactory>;

/// Fixed pair for a scalar type
#[derive(Clone, Copy)]
pub struct ScalarFactory {
    make: fn() -> ExamplePair,
}

impl ScalarFactory {
    pub fn new(make: fn() -> ExamplePair) -> Self {
        Self { make }
    }
}

impl PrefabValueFactory for ScalarFactory {
    fn create_values(&self, _: &TypeDescriptor, _: &ChainedValueProvider, _: &TypeStack) -> VerifierResult<ExamplePair> {
        Ok((self.make)())
    }
}

impl fmt::Debug for ScalarFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScalarFactory")
    }
}

/// Distinct opaque tokens, for the top type and for `Opaque` itself
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenFactory;

impl PrefabValueFactory for TokenFactory {
    fn create_values(&self, _: &TypeDescriptor, chain: &ChainedValueProvider, _: &TypeStack) -> VerifierResult<ExamplePair> {
        let low = chain.mint_token();
        let mut high = chain.mint_token();
        while high == low {
            high = chain.mint_token();
        }
        Ok(ExamplePair::with_copy(Value::new(low), Value::new(high), Value::new(Opaque(low.0))))
    }
}

/// Builds a container from independently resolved type arguments
///
/// Argument `n` resolves to the descriptor's nth type argument. When that is
/// missing or the top type and a fallback is configured for position `n`, the
/// fallback is resolved instead; this keeps hashed and ordered keys usable
/// when no generics information is available.
#[derive(Debug, Clone)]
pub struct SimpleGenericFactory {
    arity: usize,
    fallbacks: Vec<Option<TypeDescriptor>>,
}

impl SimpleGenericFactory {
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            fallbacks: vec![None; arity],
        }
    }

    pub fn with_fallback(mut self, position: usize, fallback: TypeDescriptor) -> Self {
        if position < self.arity {
            self.fallbacks[position] = Some(fallback);
        }
        self
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    fn argument(&self, descriptor: &TypeDescriptor, n: usize) -> TypeDescriptor {
        match self.fallbacks.get(n).and_then(Option::as_ref) {
            Some(fallback) => descriptor.type_argument_or(n, fallback),
            None => descriptor.type_argument(n),
        }
    }
}

impl PrefabValueFactory for SimpleGenericFactory {
    fn create_values(
        &self,
        descriptor: &TypeDescriptor,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<ExamplePair> {
        let mut lows = Vec::with_capacity(self.arity);
        let mut highs = Vec::with_capacity(self.arity);
        let mut copies = Vec::with_capacity(self.arity);
        for n in 0..self.arity {
            let argument = self.argument(descriptor, n);
            let pair = chain.realize(&argument, None, stack)?;
            lows.push(pair.low);
            highs.push(pair.high);
            copies.push(pair.low_copy);
        }
        log::debug!("Assembling {} from {} resolved type arguments", descriptor, self.arity);
        Ok(ExamplePair::with_copy(
            descriptor.assemble(lows)?,
            descriptor.assemble(highs)?,
            descriptor.assemble(copies)?,
        ))
    }
}

/// A fixed user-supplied pair, re-wrapped on every request
pub struct FixedValuesFactory<T> {
    low: T,
    high: T,
}

impl<T: Described + Send + Sync> PrefabValueFactory for FixedValuesFactory<T> {
    fn create_values(&self, descriptor: &TypeDescriptor, _: &ChainedValueProvider, _: &TypeStack) -> VerifierResult<ExamplePair> {
        let pair = ExamplePair::checked(self.low.clone(), self.high.clone(), self.low.clone(), &descriptor.to_string())?;
        pair.map(|value| Ok(Value::new(value)))
    }
}

/// Constructors for the factories users register with
/// `with_generic_factory`
pub struct Factories;

impl Factories {
    /// A container factory resolving `arity` type arguments
    pub fn simple(arity: usize) -> SimpleGenericFactory {
        SimpleGenericFactory::new(arity)
    }

    /// A factory that always answers with the given pair
    pub fn values<T: Described + Send + Sync>(low: T, high: T) -> FixedValuesFactory<T> {
        FixedValuesFactory { low, high }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChainedValueProvider;

    fn chain() -> ChainedValueProvider {
        ChainedValueProvider::standard(FactoryCache::new(), 7)
    }

    #[test]
    fn test_simple_factory_wraps_argument_pair() {
        let chain = chain();
        let descriptor = TypeDescriptor::of::<Vec<String>>();
        let stack = TypeStack::new().clone_with(&descriptor).unwrap();
        let pair = Factories::simple(1).create_values(&descriptor, &chain, &stack).unwrap();
        let pair = pair.extract::<Vec<String>>().unwrap();

        assert_eq!(pair.low, vec!["one".to_string()]);
        assert_eq!(pair.high, vec!["two".to_string()]);
        assert_eq!(pair.low_copy, pair.low);
    }

    #[test]
    fn test_fallback_replaces_top_argument() {
        let chain = chain();
        let descriptor = TypeDescriptor::of::<Vec<Value>>();
        let stack = TypeStack::new().clone_with(&descriptor).unwrap();
        let factory = Factories::simple(1).with_fallback(0, TypeDescriptor::of::<Opaque>());
        let pair = factory.create_values(&descriptor, &chain, &stack).unwrap();
        let pair = pair.extract::<Vec<Value>>().unwrap();

        assert!(pair.low[0].is::<Opaque>());
        assert_ne!(pair.low, pair.high);
    }

    #[test]
    fn test_token_factory_mints_distinct_tokens() {
        let chain = chain();
        let descriptor = TypeDescriptor::top();
        let pair = TokenFactory.create_values(&descriptor, &chain, &TypeStack::new()).unwrap();
        assert_ne!(pair.low, pair.high);
        assert_eq!(pair.low, pair.low_copy);
    }

    #[test]
    fn test_fixed_values_factory_checks_pair() {
        let chain = chain();
        let descriptor = TypeDescriptor::of::<u8>();
        let equal = Factories::values(1u8, 1u8);
        assert!(equal.create_values(&descriptor, &chain, &TypeStack::new()).is_err());

        let pair = Factories::values(1u8, 9u8)
            .create_values(&descriptor, &chain, &TypeStack::new())
            .unwrap();
        assert_eq!(pair.high, Value::new(9u8));
    }
}
