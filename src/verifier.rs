//! Fluent entry points
//!
//! ```ignore
//! EqualsVerifier::for_type::<Point>()
//!     .with_ignored_fields(&["cache"])
//!     .suppress(&[Axiom::NonNullity])
//!     .verify()?;
//! ```

use std::hash::Hash;
use std::sync::Arc;

use crate::checkers;
use crate::config::{Axiom, CachedHash, Configuration, Mode, Settings, TypeSettings};
use crate::error::VerifierResult;
use crate::factories::PrefabValueFactory;
use crate::report::{BatchReport, BatchSection, TypeReport};
use crate::shape::{Described, FieldLabel};
use crate::types::{RawType, TypeDescriptor};

/// Starting point for every verification
pub struct EqualsVerifier;

impl EqualsVerifier {
    /// Verifies `T` with synthesized instances
    pub fn for_type<T: Described + Hash>() -> SingleTypeVerifier<T> {
        SingleTypeVerifier {
            settings: Settings::default(),
            type_settings: TypeSettings::default(),
        }
    }

    /// Verifies `T`, additionally using the given mutually unequal examples
    pub fn for_examples<T: Described + Hash>(first: T, second: T, more: impl IntoIterator<Item = T>) -> SingleTypeVerifier<T> {
        let mut examples = vec![first, second];
        examples.extend(more);
        Self::for_type::<T>().with_unequal_examples(examples)
    }

    /// Verifies `T` for a relaxed equality, under which the given
    /// structurally different examples are all equal
    pub fn for_relaxed_equal_examples<T: Described + Hash>(
        first: T,
        second: T,
        more: impl IntoIterator<Item = T>,
    ) -> RelaxedEqualsVerifier<T> {
        let mut equal = vec![first, second];
        equal.extend(more);
        RelaxedEqualsVerifier { equal }
    }

    /// Verifies several types with shared settings
    pub fn for_types() -> MultipleTypeVerifier {
        MultipleTypeVerifier {
            settings: Settings::default(),
            runs: Vec::new(),
        }
    }

    /// A reusable template: settings given here apply to every verifier
    /// started from it
    ///
    /// ```ignore
    /// let ours = EqualsVerifier::configure().suppress(&[Axiom::NonNullity]);
    /// ours.for_type::<Point>().verify()?;
    /// ours.for_type::<Line>().verify()?;
    /// ```
    pub fn configure() -> ConfiguredEqualsVerifier {
        ConfiguredEqualsVerifier {
            settings: Settings::default(),
        }
    }
}

/// Settings kept for any number of later verifications
#[derive(Debug, Clone, Default)]
pub struct ConfiguredEqualsVerifier {
    settings: Settings,
}

impl ConfiguredEqualsVerifier {
    pub fn suppress(mut self, axioms: &[Axiom]) -> Self {
        self.settings.suppress(axioms);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.settings.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    pub fn with_prefab_values<S: Described>(mut self, low: S, high: S) -> Self {
        self.settings.add_prefab(None, low, high);
        self
    }

    pub fn with_generic_factory<F>(mut self, raw: RawType, factory: F) -> Self
    where
        F: PrefabValueFactory + Send + Sync + 'static,
    {
        self.settings.add_generic_factory(raw, Arc::new(factory));
        self
    }

    /// Starts a verification of `T` from a copy of the template
    pub fn for_type<T: Described + Hash>(&self) -> SingleTypeVerifier<T> {
        SingleTypeVerifier {
            settings: self.settings.clone(),
            type_settings: TypeSettings::default(),
        }
    }

    pub fn for_examples<T: Described + Hash>(&self, first: T, second: T, more: impl IntoIterator<Item = T>) -> SingleTypeVerifier<T> {
        let mut examples = vec![first, second];
        examples.extend(more);
        self.for_type::<T>().with_unequal_examples(examples)
    }

    /// Starts a batch from a copy of the template
    pub fn for_types(&self) -> MultipleTypeVerifier {
        MultipleTypeVerifier {
            settings: self.settings.clone(),
            runs: Vec::new(),
        }
    }
}

/// Fluent configuration for a single type
pub struct SingleTypeVerifier<T> {
    settings: Settings,
    type_settings: TypeSettings<T>,
}

fn owned<'a>(names: &'a [&str]) -> impl Iterator<Item = String> + 'a {
    names.iter().map(|name| name.to_string())
}

impl<T: Described + Hash> SingleTypeVerifier<T> {
    pub fn suppress(mut self, axioms: &[Axiom]) -> Self {
        self.settings.suppress(axioms);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.settings.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    /// Fields that eq must not use
    pub fn with_ignored_fields(mut self, fields: &[&str]) -> Self {
        self.type_settings.ignored.extend(owned(fields));
        self
    }

    /// The only fields eq may use; all others are ignored
    pub fn with_only_these_fields(mut self, fields: &[&str]) -> Self {
        self.type_settings.included.extend(owned(fields));
        self
    }

    /// Fields that never hold their absent value
    pub fn with_nonnull_fields(mut self, fields: &[&str]) -> Self {
        self.type_settings.nonnull.extend(owned(fields));
        self
    }

    /// Values to use for every occurrence of type `S`
    pub fn with_prefab_values<S: Described>(mut self, low: S, high: S) -> Self {
        self.settings.add_prefab(None, low, high);
        self
    }

    /// Values to use for type `S` in the field `field` of `T` only
    pub fn with_prefab_values_for_field<S: Described>(mut self, field: &'static str, low: S, high: S) -> Self {
        let label = FieldLabel::new(T::descriptor().raw(), field);
        self.settings.add_prefab(Some(label), low, high);
        self
    }

    /// A factory for every instantiation of the raw type `raw`
    pub fn with_generic_factory<F>(mut self, raw: RawType, factory: F) -> Self
    where
        F: PrefabValueFactory + Send + Sync + 'static,
    {
        self.settings.add_generic_factory(raw, Arc::new(factory));
        self
    }

    pub fn with_cached_hash(mut self, cached_hash: CachedHash<T>) -> Self {
        self.type_settings.cached_hash = Some(cached_hash);
        self
    }

    /// Examples that must all be equal to each other
    pub fn with_equal_examples(mut self, examples: Vec<T>) -> Self {
        self.type_settings.equal_examples.extend(examples);
        self
    }

    /// Examples that must all differ from each other
    pub fn with_unequal_examples(mut self, examples: Vec<T>) -> Self {
        self.type_settings.unequal_examples.extend(examples);
        self
    }

    /// Validates the settings without running any check
    pub fn configuration(self) -> VerifierResult<Configuration<T>> {
        Configuration::build(&self.settings, self.type_settings)
    }

    /// Runs every check and returns the outcome of each
    ///
    /// Contract violations are part of the report. Recursion, access and
    /// precondition problems are returned as errors.
    pub fn report(self) -> VerifierResult<TypeReport> {
        let config = Configuration::build(&self.settings, self.type_settings)?;
        let chain = self.settings.chain();
        log::info!("Verifying {} (seed {})", config.descriptor, self.settings.seed);
        checkers::run(&config, &chain)
    }

    /// Runs every check, failing with one message listing all violations
    pub fn verify(self) -> VerifierResult<()> {
        self.report()?.into_result()
    }
}

/// Verification of a relaxed equality, awaiting its unequal examples
pub struct RelaxedEqualsVerifier<T> {
    equal: Vec<T>,
}

impl<T: Described + Hash> RelaxedEqualsVerifier<T> {
    /// Completes the examples with one instance unequal to all of them
    ///
    /// Relaxed equality disregards some state by construction, so the
    /// significant fields check is suppressed.
    pub fn and_unequal_example(self, other: T) -> SingleTypeVerifier<T> {
        self.and_unequal_examples(other, Vec::new())
    }

    pub fn and_unequal_examples(self, first: T, more: impl IntoIterator<Item = T>) -> SingleTypeVerifier<T> {
        let mut unequal = vec![first];
        unequal.extend(more);
        EqualsVerifier::for_type::<T>()
            .with_equal_examples(self.equal)
            .with_unequal_examples(unequal)
            .suppress(&[Axiom::SignificantFields])
    }
}

type Run = Box<dyn Fn(&Settings) -> BatchSection>;

/// Fluent configuration for a batch of types sharing their settings
pub struct MultipleTypeVerifier {
    settings: Settings,
    runs: Vec<Run>,
}

impl MultipleTypeVerifier {
    pub fn add<T: Described + Hash>(mut self) -> Self {
        self.runs.push(Box::new(run_one::<T>));
        self
    }

    pub fn suppress(mut self, axioms: &[Axiom]) -> Self {
        self.settings.suppress(axioms);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.settings.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    pub fn with_prefab_values<S: Described>(mut self, low: S, high: S) -> Self {
        self.settings.add_prefab(None, low, high);
        self
    }

    pub fn with_generic_factory<F>(mut self, raw: RawType, factory: F) -> Self
    where
        F: PrefabValueFactory + Send + Sync + 'static,
    {
        self.settings.add_generic_factory(raw, Arc::new(factory));
        self
    }

    /// Verifies every type in turn; a type that cannot be verified does not
    /// stop the others
    pub fn report(self) -> BatchReport {
        let sections = self.runs.iter().map(|run| run(&self.settings)).collect();
        BatchReport { sections }
    }

    /// Verifies every type, failing once at the end with one section per
    /// failing type
    pub fn verify(self) -> VerifierResult<()> {
        self.report().into_result()
    }
}

fn run_one<T: Described + Hash>(settings: &Settings) -> BatchSection {
    let verifier = SingleTypeVerifier::<T> {
        settings: settings.clone(),
        type_settings: TypeSettings::default(),
    };
    match verifier.report() {
        Ok(report) => BatchSection::Checked { report },
        Err(error) => {
            let type_name = TypeDescriptor::of::<T>().to_string();
            log::warn!("Verification of {} aborted: {}", type_name, error);
            BatchSection::Aborted {
                type_name,
                error: error.to_string(),
            }
        }
    }
}
