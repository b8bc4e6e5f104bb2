//! The checker pipeline
//!
//! Each checker verifies one axiom of the equality contract against a shared
//! `Context` holding the synthesized instances. Checkers run in a fixed order;
//! a panic inside a user's `eq` or `hash` is caught and reported as a
//! violation of the axiom being checked.

mod consistency;
mod hash;
mod nullity;
mod reflexivity;
mod significance;
mod symmetry;
mod transitivity;

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};

use crate::accessor::ObjectAccessor;
use crate::config::{Axiom, Configuration, Mode};
use crate::error::{VerifierError, VerifierResult};
use crate::instantiator;
use crate::providers::ChainedValueProvider;
use crate::report::{CheckResult, TypeReport, Violation};
use crate::shape::{Described, FieldDescriptor};
use crate::types::TypeStack;
use crate::value::Value;

pub use self::consistency::ConsistencyChecker;
pub use self::hash::{CachedHashChecker, HashAgreementChecker};
pub use self::nullity::NonNullityChecker;
pub use self::reflexivity::ReflexivityChecker;
pub use self::significance::SignificantFieldsChecker;
pub use self::symmetry::SymmetryChecker;
pub use self::transitivity::TransitivityChecker;

/// One axiom check
pub trait Checker<T> {
    fn axiom(&self) -> Axiom;

    /// Whether the check has anything to verify for this configuration
    fn applies(&self, _context: &Context<'_, T>) -> bool {
        true
    }

    /// Returns the first violation found, if any. Errors abort the whole
    /// verification of the type.
    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>>;
}

/// The checkers, in the order they run
pub fn checkers<T: Described + Hash>() -> Vec<Box<dyn Checker<T>>> {
    vec![
        Box::new(ReflexivityChecker),
        Box::new(SymmetryChecker),
        Box::new(TransitivityChecker),
        Box::new(ConsistencyChecker),
        Box::new(NonNullityChecker),
        Box::new(HashAgreementChecker),
        Box::new(SignificantFieldsChecker),
        Box::new(CachedHashChecker),
    ]
}

/// Digest of a value under the standard hasher
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Instances and services shared by the checkers of one type
pub struct Context<'a, T> {
    pub config: &'a Configuration<T>,
    pub chain: &'a ChainedValueProvider,
    /// The low value of the type's pair
    pub reference: T,
    /// A separately built instance equal to `reference`
    pub copy: T,
    /// The high value of the type's pair
    pub other: T,
}

impl<'a, T: Described + Hash> Context<'a, T> {
    pub fn new(config: &'a Configuration<T>, chain: &'a ChainedValueProvider) -> VerifierResult<Self> {
        let pair = chain.realize(&config.descriptor, None, &TypeStack::new())?;
        Ok(Self {
            reference: finish(config, pair.low)?,
            copy: finish(config, pair.low_copy)?,
            other: finish(config, pair.high)?,
            config,
            chain,
        })
    }

    /// Converts a synthesized value into `T`, refreshing its cached hash
    pub fn materialize(&self, value: Value) -> VerifierResult<T> {
        finish(self.config, value)
    }

    /// Fields taking part in the field checks
    pub fn fields(&self) -> Vec<&'a FieldDescriptor> {
        self.config.checked_fields()
    }

    fn accessor(&self, value: &T) -> VerifierResult<ObjectAccessor<'a>> {
        let record = self
            .config
            .record
            .as_deref()
            .ok_or_else(|| VerifierError::access(format!("{} has no fields", self.config.descriptor)))?;
        Ok(ObjectAccessor::new(record, Value::new(value.clone())))
    }

    /// `base` with one field set to the other value of its pair
    pub fn field_variant(&self, base: &T, field: &str) -> VerifierResult<T> {
        let changed = self.accessor(base)?.with_changed_field(field, self.chain, &TypeStack::new())?;
        self.materialize(changed.into_inner())
    }

    /// `base` with every field but one set to the other value of its pair
    pub fn all_but(&self, base: &T, field: &str) -> VerifierResult<T> {
        let changed = self
            .accessor(base)?
            .with_all_fields_changed_except(field, self.chain, &TypeStack::new())?;
        self.materialize(changed.into_inner())
    }

    /// `base` with one field holding its zero value
    pub fn zeroed(&self, base: &T, field: &FieldDescriptor) -> VerifierResult<T> {
        let zero = instantiator::instantiate(field.declared(), &TypeStack::new())?;
        let changed = self.accessor(base)?.with_field_value(field.name(), zero)?;
        self.materialize(changed.into_inner())
    }

    /// Whether the pair of a field's type cannot tell values apart
    pub fn is_degenerate(&self, field: &FieldDescriptor) -> VerifierResult<bool> {
        let pair = self.chain.realize(field.declared(), Some(field.label()), &TypeStack::new())?;
        Ok(pair.is_degenerate())
    }

    /// Every instance worth comparing against every other: the pair, each
    /// single-field variant of the reference, and the user's examples
    pub fn pool(&self) -> VerifierResult<Vec<T>> {
        let mut pool = vec![self.reference.clone(), self.copy.clone(), self.other.clone()];
        for field in self.fields() {
            pool.push(self.field_variant(&self.reference, field.name())?);
        }
        pool.extend(self.config.equal_examples.iter().cloned());
        pool.extend(self.config.unequal_examples.iter().cloned());
        Ok(pool)
    }
}

fn finish<T: Described>(config: &Configuration<T>, value: Value) -> VerifierResult<T> {
    let mut value = value.into_inner::<T>()?;
    if let Some(cached) = &config.cached_hash {
        (cached.recompute)(&mut value);
    }
    Ok(value)
}

/// Runs every checker against `config`
///
/// In fail-fast mode checking stops after the first failed axiom. Recursion,
/// access and precondition errors abort the type and produce no report.
pub fn run<T: Described + Hash>(config: &Configuration<T>, chain: &ChainedValueProvider) -> VerifierResult<TypeReport> {
    let context = Context::new(config, chain)?;
    let mut report = TypeReport::new(config.type_name());

    for checker in checkers::<T>() {
        let axiom = checker.axiom();
        if config.is_suppressed(axiom) || !checker.applies(&context) {
            report.results.push(CheckResult::Skipped { axiom });
            continue;
        }

        let result = match panic::catch_unwind(AssertUnwindSafe(|| checker.check(&context))) {
            Ok(Ok(None)) => CheckResult::Passed { axiom },
            Ok(Ok(Some(violation))) => CheckResult::Failed { violation },
            Ok(Err(e)) => return Err(e),
            Err(payload) => CheckResult::Failed {
                violation: Violation::new(axiom, format!("eq or hash panicked: {}", panic_message(payload.as_ref()))),
            },
        };

        let failed = result.is_failure();
        log::debug!("{} on {}: {}", axiom, report.type_name, if failed { "failed" } else { "passed" });
        report.results.push(result);
        if failed && config.mode == Mode::FailFast {
            break;
        }
    }

    Ok(report)
}
