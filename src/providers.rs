//! Value provider chain
//!
//! Values for a type are resolved by asking an ordered list of providers. The
//! prefab provider comes first: it holds the values the user supplied and
//! caches every pair the chain has produced, so a cache hit both answers the
//! request and terminates any recursion through that type. The remaining
//! providers are consulted in registration order; the first answer wins and is
//! written back into the cache.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{VerifierError, VerifierResult};
use crate::factories::{builtin_factories, FactoryCache, PrefabValueFactory, SimpleGenericFactory};
use crate::instantiator;
use crate::shape::{FieldLabel, Shape};
use crate::types::{TypeDescriptor, TypeStack};
use crate::value::{ExamplePair, Opaque, Value};

/// A source of example pairs
pub trait ValueProvider {
    /// Returns a pair for `descriptor`, or `None` if this provider does not
    /// know the type. `stack` already contains `descriptor`.
    fn provide(
        &self,
        descriptor: &TypeDescriptor,
        label: Option<FieldLabel>,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<Option<ExamplePair>>;

    fn name(&self) -> &'static str;
}

type PrefabKey = (TypeDescriptor, Option<FieldLabel>);

/// User-supplied pairs plus the per-run cache
///
/// Entries are keyed by descriptor and an optional label naming a field of
/// a particular record type. A labelled lookup falls back to the unlabelled
/// entry.
#[derive(Debug, Default)]
pub struct PrefabValueProvider {
    entries: RefCell<HashMap<PrefabKey, ExamplePair>>,
}

impl PrefabValueProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user pair, replacing any earlier one for the same key
    pub fn insert(&mut self, descriptor: TypeDescriptor, label: Option<FieldLabel>, pair: ExamplePair) {
        self.entries
            .get_mut()
            .insert((descriptor, label), pair);
    }

    pub fn lookup(&self, descriptor: &TypeDescriptor, label: Option<FieldLabel>) -> Option<ExamplePair> {
        let entries = self.entries.borrow();
        if let Some(label) = label {
            if let Some(pair) = entries.get(&(descriptor.clone(), Some(label))) {
                return Some(pair.clone());
            }
        }
        entries.get(&(descriptor.clone(), None)).cloned()
    }

    pub fn contains(&self, descriptor: &TypeDescriptor) -> bool {
        self.entries.borrow().keys().any(|(d, _)| d == descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn remember(&self, descriptor: &TypeDescriptor, pair: &ExamplePair) {
        self.entries
            .borrow_mut()
            .entry((descriptor.clone(), None))
            .or_insert_with(|| pair.clone());
    }
}

impl ValueProvider for PrefabValueProvider {
    fn provide(
        &self,
        descriptor: &TypeDescriptor,
        label: Option<FieldLabel>,
        _: &ChainedValueProvider,
        _: &TypeStack,
    ) -> VerifierResult<Option<ExamplePair>> {
        Ok(self.lookup(descriptor, label))
    }

    fn name(&self) -> &'static str {
        "prefab"
    }
}

/// Factories the user registered for raw types
pub struct GenericFactoryProvider {
    factories: FactoryCache,
}

impl GenericFactoryProvider {
    pub fn new(factories: FactoryCache) -> Self {
        Self { factories }
    }
}

impl ValueProvider for GenericFactoryProvider {
    fn provide(
        &self,
        descriptor: &TypeDescriptor,
        _: Option<FieldLabel>,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<Option<ExamplePair>> {
        match self.factories.get(&descriptor.raw()) {
            Some(factory) => factory.create_values(descriptor, chain, stack).map(Some),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "generic factories"
    }
}

/// The shared built-in registry
pub struct BuiltinFactoryProvider {
    factories: &'static FactoryCache,
}

impl BuiltinFactoryProvider {
    pub fn new(factories: &'static FactoryCache) -> Self {
        Self { factories }
    }
}

impl Default for BuiltinFactoryProvider {
    fn default() -> Self {
        Self::new(builtin_factories())
    }
}

impl ValueProvider for BuiltinFactoryProvider {
    fn provide(
        &self,
        descriptor: &TypeDescriptor,
        _: Option<FieldLabel>,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<Option<ExamplePair>> {
        match self.factories.get(&descriptor.raw()) {
            Some(factory) => factory.create_values(descriptor, chain, stack).map(Some),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "built-in factories"
    }
}

/// Last resort: builds pairs from the type's shape
///
/// Records get one pair per field, sealed types go through their variants,
/// and containers nobody registered a factory for are treated as simple
/// generic containers of their declared arity.
#[derive(Debug, Default)]
pub struct InstantiatorProvider;

impl ValueProvider for InstantiatorProvider {
    fn provide(
        &self,
        descriptor: &TypeDescriptor,
        _: Option<FieldLabel>,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<Option<ExamplePair>> {
        match descriptor.shape() {
            Shape::Record(_) | Shape::Sealed(_) => instantiator::example_pair(descriptor, chain, stack).map(Some),
            Shape::Container(info) => SimpleGenericFactory::new(info.arity)
                .create_values(descriptor, chain, stack)
                .map(Some),
            Shape::Top | Shape::Scalar { .. } => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "instantiator"
    }
}

/// Ordered provider chain with a terminating prefab cache in front
pub struct ChainedValueProvider {
    prefab: PrefabValueProvider,
    providers: Vec<Box<dyn ValueProvider>>,
    sealed: Cell<bool>,
    tokens: RefCell<ChaCha8Rng>,
}

impl ChainedValueProvider {
    /// A chain holding only `prefab`; further providers are registered in order
    pub fn new(prefab: PrefabValueProvider, seed: u64) -> Self {
        Self {
            prefab,
            providers: Vec::new(),
            sealed: Cell::new(false),
            tokens: RefCell::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// The standard chain: prefab, user generic factories, built-ins,
    /// instantiator
    pub fn with_prefab(prefab: PrefabValueProvider, generic: FactoryCache, seed: u64) -> Self {
        let mut chain = Self::new(prefab, seed);
        chain.providers.push(Box::new(GenericFactoryProvider::new(generic)));
        chain.providers.push(Box::new(BuiltinFactoryProvider::default()));
        chain.providers.push(Box::new(InstantiatorProvider));
        chain
    }

    pub fn standard(generic: FactoryCache, seed: u64) -> Self {
        Self::with_prefab(PrefabValueProvider::new(), generic, seed)
    }

    /// Appends a provider; refused once the chain has answered a query
    pub fn register(&mut self, provider: Box<dyn ValueProvider>) -> VerifierResult<()> {
        if self.sealed.get() {
            return Err(VerifierError::precondition(format!(
                "cannot register provider {} after the chain has been queried",
                provider.name()
            )));
        }
        self.providers.push(provider);
        Ok(())
    }

    pub fn prefab(&self) -> &PrefabValueProvider {
        &self.prefab
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    /// Resolves a pair for `descriptor`
    ///
    /// A cached or user-supplied pair is returned before the recursion guard
    /// runs. Otherwise `descriptor` is pushed onto a copy of `stack`, which
    /// fails with a recursion error if it is already being resolved, and the
    /// providers are asked in order.
    pub fn provide(
        &self,
        descriptor: &TypeDescriptor,
        label: Option<FieldLabel>,
        stack: &TypeStack,
    ) -> VerifierResult<Option<ExamplePair>> {
        self.sealed.set(true);
        if let Some(pair) = self.prefab.lookup(descriptor, label) {
            log::debug!("Prefab hit for {}", descriptor);
            return Ok(Some(pair));
        }

        let stack = stack.clone_with(descriptor)?;
        for provider in &self.providers {
            if let Some(pair) = provider.provide(descriptor, label, self, &stack)? {
                log::debug!("Resolved {} through {}", descriptor, provider.name());
                self.prefab.remember(descriptor, &pair);
                return Ok(Some(pair));
            }
        }
        Ok(None)
    }

    /// Like `provide`, but a type nobody can answer for is an error
    pub fn realize(&self, descriptor: &TypeDescriptor, label: Option<FieldLabel>, stack: &TypeStack) -> VerifierResult<ExamplePair> {
        self.provide(descriptor, label, stack)?.ok_or_else(|| {
            VerifierError::precondition(format!(
                "Cannot create prefab values for type {}. Use with_prefab_values to supply them.",
                descriptor
            ))
        })
    }

    pub fn give_low(&self, descriptor: &TypeDescriptor, label: Option<FieldLabel>, stack: &TypeStack) -> VerifierResult<Value> {
        Ok(self.realize(descriptor, label, stack)?.low)
    }

    pub fn give_high(&self, descriptor: &TypeDescriptor, label: Option<FieldLabel>, stack: &TypeStack) -> VerifierResult<Value> {
        Ok(self.realize(descriptor, label, stack)?.high)
    }

    pub fn give_low_copy(&self, descriptor: &TypeDescriptor, label: Option<FieldLabel>, stack: &TypeStack) -> VerifierResult<Value> {
        Ok(self.realize(descriptor, label, stack)?.low_copy)
    }

    /// The pair value that differs from `current`
    pub fn give_other(
        &self,
        descriptor: &TypeDescriptor,
        label: Option<FieldLabel>,
        current: &Value,
        stack: &TypeStack,
    ) -> VerifierResult<Value> {
        let pair = self.realize(descriptor, label, stack)?;
        Ok(pair.other(current).clone())
    }

    /// A fresh token for the top type, drawn from the seeded generator
    pub fn mint_token(&self) -> Opaque {
        Opaque(self.tokens.borrow_mut().next_u64())
    }
}
