//! Verification settings and their validation
//!
//! `Settings` holds what single-type and batch verification share.
//! `TypeSettings` holds what only makes sense for one concrete type. Both are
//! folded into a `Configuration` before any value is synthesized, and every
//! inconsistency between them is reported as a precondition error at that
//! point.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::error::{VerifierError, VerifierResult};
use crate::factories::{FactoryCache, SharedFactory};
use crate::providers::{ChainedValueProvider, PrefabValueProvider};
use crate::shape::{Described, FieldDescriptor, FieldLabel, RecordInfo};
use crate::types::{RawType, TypeDescriptor};
use crate::value::{ExamplePair, Value};

/// One property of the equality contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Axiom {
    Reflexivity,
    Symmetry,
    Transitivity,
    Consistency,
    NonNullity,
    HashAgreement,
    SignificantFields,
    CachedHash,
}

impl Axiom {
    /// Every axiom, in the order the checks run
    pub const ALL: [Axiom; 8] = [
        Axiom::Reflexivity,
        Axiom::Symmetry,
        Axiom::Transitivity,
        Axiom::Consistency,
        Axiom::NonNullity,
        Axiom::HashAgreement,
        Axiom::SignificantFields,
        Axiom::CachedHash,
    ];
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axiom::Reflexivity => "Reflexivity",
            Axiom::Symmetry => "Symmetry",
            Axiom::Transitivity => "Transitivity",
            Axiom::Consistency => "Consistency",
            Axiom::NonNullity => "Non-nullity",
            Axiom::HashAgreement => "Hash agreement",
            Axiom::SignificantFields => "Significant fields",
            Axiom::CachedHash => "Cached hash",
        };
        f.write_str(name)
    }
}

/// Whether checking stops at the first failed axiom
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[default]
    FailFast,
    Exhaustive,
}

/// A field caching the type's hash, and how to refresh it
///
/// The cached field takes no part in the field checks. Every synthesized
/// instance has `recompute` applied before it is compared, and `example` must
/// already carry a correct cached value.
#[derive(Clone)]
pub struct CachedHash<T> {
    pub field: &'static str,
    pub recompute: fn(&mut T),
    pub example: T,
}

impl<T> CachedHash<T> {
    pub fn new(field: &'static str, recompute: fn(&mut T), example: T) -> Self {
        Self {
            field,
            recompute,
            example,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CachedHash<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedHash")
            .field("field", &self.field)
            .field("example", &self.example)
            .finish()
    }
}

/// A user-supplied pair, optionally restricted to one field of one type
#[derive(Debug, Clone)]
pub struct PrefabEntry {
    pub descriptor: TypeDescriptor,
    pub label: Option<FieldLabel>,
    pub pair: ExamplePair,
}

/// Settings shared by every type of a verification run
#[derive(Clone)]
pub struct Settings {
    /// Axioms that are not checked
    pub suppressed: BTreeSet<Axiom>,

    pub mode: Mode,

    /// Seed of the generator minting top-type tokens
    pub seed: u64,

    /// User-supplied pairs, registered in front of the chain
    pub prefab: Vec<PrefabEntry>,

    /// User factories for raw types
    pub generic_factories: FactoryCache,

    /// First problem found while the settings were assembled
    pub pending_error: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            suppressed: BTreeSet::new(),
            mode: Mode::default(),
            seed: 0,
            prefab: Vec::new(),
            generic_factories: FactoryCache::new(),
            pending_error: None,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("suppressed", &self.suppressed)
            .field("mode", &self.mode)
            .field("seed", &self.seed)
            .field("prefab", &self.prefab)
            .field("generic_factories", &self.generic_factories.keys().collect::<Vec<_>>())
            .field("pending_error", &self.pending_error)
            .finish()
    }
}

impl Settings {
    pub fn suppress(&mut self, axioms: &[Axiom]) {
        self.suppressed.extend(axioms.iter().copied());
    }

    /// Validates and stores a user pair
    pub fn add_prefab<S: Described>(&mut self, label: Option<FieldLabel>, low: S, high: S) {
        let descriptor = S::descriptor();
        let copy = low.clone();
        match ExamplePair::checked(low, high, copy, &descriptor.to_string()) {
            Ok(pair) => match pair.map(|value| Ok(Value::new(value))) {
                Ok(pair) => self.prefab.push(PrefabEntry { descriptor, label, pair }),
                Err(e) => self.defer(e),
            },
            Err(e) => self.defer(e),
        }
    }

    pub fn add_generic_factory(&mut self, raw: RawType, factory: SharedFactory) {
        self.generic_factories.insert(raw, factory);
    }

    fn defer(&mut self, error: VerifierError) {
        if self.pending_error.is_none() {
            let message = match error {
                VerifierError::Precondition { message } => message,
                other => other.to_string(),
            };
            self.pending_error = Some(message);
        }
    }

    /// A fresh chain for one type: user pairs in front, then user factories,
    /// built-ins and the instantiator
    pub fn chain(&self) -> ChainedValueProvider {
        let mut prefab = PrefabValueProvider::new();
        for entry in &self.prefab {
            prefab.insert(entry.descriptor.clone(), entry.label, entry.pair.clone());
        }
        ChainedValueProvider::with_prefab(prefab, self.generic_factories.clone(), self.seed)
    }
}

/// Settings that belong to a single type
#[derive(Debug, Clone)]
pub struct TypeSettings<T> {
    pub ignored: Vec<String>,
    pub included: Vec<String>,
    pub nonnull: Vec<String>,
    pub cached_hash: Option<CachedHash<T>>,
    pub equal_examples: Vec<T>,
    pub unequal_examples: Vec<T>,
}

impl<T> Default for TypeSettings<T> {
    fn default() -> Self {
        Self {
            ignored: Vec::new(),
            included: Vec::new(),
            nonnull: Vec::new(),
            cached_hash: None,
            equal_examples: Vec::new(),
            unequal_examples: Vec::new(),
        }
    }
}

/// Validated configuration for verifying one type
#[derive(Debug)]
pub struct Configuration<T> {
    pub descriptor: TypeDescriptor,
    pub record: Option<Rc<RecordInfo>>,
    pub suppressed: BTreeSet<Axiom>,
    pub mode: Mode,
    pub ignored: BTreeSet<&'static str>,
    pub nonnull: BTreeSet<&'static str>,
    pub cached_hash: Option<CachedHash<T>>,
    pub equal_examples: Vec<T>,
    pub unequal_examples: Vec<T>,
}

impl<T: Described> Configuration<T> {
    pub fn build(settings: &Settings, type_settings: TypeSettings<T>) -> VerifierResult<Self> {
        if let Some(message) = &settings.pending_error {
            return Err(VerifierError::precondition(message.clone()));
        }

        let descriptor = T::descriptor();
        let record = descriptor.shape().as_record().cloned();
        let TypeSettings {
            ignored,
            included,
            nonnull,
            cached_hash,
            equal_examples,
            unequal_examples,
        } = type_settings;

        if !ignored.is_empty() && !included.is_empty() {
            return Err(VerifierError::precondition(
                "you can call either with_only_these_fields or with_ignored_fields, but not both.",
            ));
        }

        let fields = |names: &[String]| -> VerifierResult<BTreeSet<&'static str>> {
            names.iter().map(|name| resolve_field(&descriptor, record.as_deref(), name)).collect()
        };

        let mut ignored = fields(&ignored)?;
        if !included.is_empty() {
            let included = fields(&included)?;
            ignored = record
                .iter()
                .flat_map(|r| r.field_names())
                .filter(|name| !included.contains(name))
                .collect();
        }
        let nonnull = fields(&nonnull)?;

        for label in settings.prefab.iter().filter_map(|entry| entry.label) {
            if label.owner == descriptor.raw() {
                resolve_field(&descriptor, record.as_deref(), label.field)?;
            }
        }

        if let Some(cached) = &cached_hash {
            let name = resolve_field(&descriptor, record.as_deref(), cached.field)?;
            ignored.insert(name);
        }

        check_examples(&descriptor, &equal_examples, &unequal_examples)?;

        log::debug!(
            "Configured {} with {} ignored and {} non-null fields",
            descriptor,
            ignored.len(),
            nonnull.len()
        );

        Ok(Configuration {
            descriptor,
            record,
            suppressed: settings.suppressed.clone(),
            mode: settings.mode,
            ignored,
            nonnull,
            cached_hash,
            equal_examples,
            unequal_examples,
        })
    }
}

impl<T> Configuration<T> {
    pub fn type_name(&self) -> String {
        self.descriptor.to_string()
    }

    pub fn is_suppressed(&self, axiom: Axiom) -> bool {
        self.suppressed.contains(&axiom)
    }

    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignored.contains(field)
    }

    pub fn is_nonnull(&self, field: &str) -> bool {
        self.nonnull.contains(field)
    }

    /// Fields taking part in the field checks: all but the cached hash
    pub fn checked_fields(&self) -> Vec<&FieldDescriptor> {
        let cached = self.cached_hash.as_ref().map(|c| c.field);
        self.record
            .iter()
            .flat_map(|r| r.fields())
            .filter(|f| Some(f.name()) != cached)
            .collect()
    }
}

fn resolve_field(descriptor: &TypeDescriptor, record: Option<&RecordInfo>, name: &str) -> VerifierResult<&'static str> {
    record
        .and_then(|r| r.field(name))
        .map(|f| f.name())
        .ok_or_else(|| VerifierError::precondition(format!("type {} does not contain field {}.", descriptor, name)))
}

fn check_examples<T: Described>(descriptor: &TypeDescriptor, equal: &[T], unequal: &[T]) -> VerifierResult<()> {
    for (i, a) in equal.iter().enumerate() {
        for b in &equal[i + 1..] {
            if a != b {
                return Err(VerifierError::precondition(format!(
                    "not all equal examples of {} are equal: {:?} and {:?}",
                    descriptor, a, b
                )));
            }
        }
    }
    for (i, a) in unequal.iter().enumerate() {
        for b in &unequal[i + 1..] {
            if a == b {
                return Err(VerifierError::precondition(format!(
                    "the same object appears twice among the unequal examples of {}: {:?}",
                    descriptor, a
                )));
            }
        }
    }
    for a in equal {
        if let Some(b) = unequal.iter().find(|b| *b == a) {
            return Err(VerifierError::precondition(format!(
                "an equal example of {} is also equal to an unequal example: {:?} and {:?}",
                descriptor, a, b
            )));
        }
    }
    Ok(())
}
