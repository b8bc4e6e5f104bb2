//! # equals-verifier
//!
//! Checks that a type's `PartialEq` and `Hash` implementations honour the
//! equality contract: reflexivity, symmetry, transitivity, consistency,
//! coping with absent values, and agreement between equality and hashing.
//!
//! No example data is needed. Types describe their structure through the
//! `Described` trait (for plain structs, `describe_record!` writes the
//! implementation), and the engine synthesizes distinguishable instances for
//! any described type, including generic, recursive and sealed ones.

pub mod accessor;
pub mod checkers;
pub mod config;
pub mod error;
pub mod factories;
pub mod instantiator;
pub mod providers;
pub mod report;
pub mod shape;
pub mod types;
pub mod value;
pub mod verifier;

// Re-export core types for easy access
pub use accessor::ObjectAccessor;
pub use config::{Axiom, CachedHash, Configuration, Mode, Settings};
pub use error::{VerifierError, VerifierResult};
pub use factories::{builtin_factories, Factories, FactoryCache, PrefabValueFactory, SimpleGenericFactory};
pub use providers::{ChainedValueProvider, PrefabValueProvider, ValueProvider};
pub use report::{BatchReport, BatchSection, CheckResult, TypeReport, Violation};
pub use shape::{
    next_part, ContainerInfo, Described, FieldDescriptor, FieldLabel, FieldValues, RecordBuilder, RecordInfo,
    SealedBuilder, SealedInfo, Shape, StandIn, StandInType, Variant, Zero,
};
pub use types::{RawType, TypeDescriptor, TypeStack, MAX_RESOLUTION_DEPTH};
pub use value::{ExamplePair, Opaque, Value};
pub use verifier::{ConfiguredEqualsVerifier, EqualsVerifier, MultipleTypeVerifier, RelaxedEqualsVerifier, SingleTypeVerifier};
