//! eq and hash cope with fields holding their absent value
//!
//! Every checked field is set in turn to its zero value (`None`, an empty
//! collection, a default scalar). Comparing or hashing the result must not
//! panic, in either direction.

use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};

use super::{hash_of, panic_message, Checker, Context};
use crate::config::Axiom;
use crate::error::VerifierResult;
use crate::report::Violation;
use crate::shape::Described;

pub struct NonNullityChecker;

impl<T: Described + Hash> Checker<T> for NonNullityChecker {
    fn axiom(&self) -> Axiom {
        Axiom::NonNullity
    }

    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>> {
        let reference = &context.reference;
        for field in context.fields() {
            if context.config.is_nonnull(field.name()) {
                continue;
            }
            let zeroed = context.zeroed(reference, field)?;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let _ = zeroed == *reference;
                let _ = *reference == zeroed;
                let _ = zeroed == zeroed.clone();
                hash_of(&zeroed)
            }));
            if let Err(payload) = outcome {
                return Ok(Some(
                    Violation::new(
                        Axiom::NonNullity,
                        format!(
                            "eq or hash panics when field {} holds its absent value: {}",
                            field.name(),
                            panic_message(payload.as_ref())
                        ),
                    )
                    .field(field.name())
                    .evidence(&zeroed)
                    .hint(format!(
                        "handle the absent value, or declare the field with with_nonnull_fields(&[\"{}\"])",
                        field.name()
                    )),
                ));
            }
        }
        Ok(None)
    }
}
