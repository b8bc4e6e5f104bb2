//! An instance equals itself and any separately built copy of itself

use std::hash::Hash;

use super::{Checker, Context};
use crate::config::Axiom;
use crate::error::VerifierResult;
use crate::report::Violation;
use crate::shape::Described;

pub struct ReflexivityChecker;

impl<T: Described + Hash> Checker<T> for ReflexivityChecker {
    fn axiom(&self) -> Axiom {
        Axiom::Reflexivity
    }

    #[allow(clippy::eq_op)]
    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>> {
        let reference = &context.reference;
        if !(reference == reference) {
            return Ok(Some(
                Violation::new(Axiom::Reflexivity, "object does not equal itself").evidence(reference),
            ));
        }

        if reference != &context.copy {
            return Ok(Some(
                Violation::new(Axiom::Reflexivity, "object does not equal an identical copy of itself")
                    .evidence(reference)
                    .evidence(&context.copy)
                    .hint("eq may compare a field by identity, for example with Rc::ptr_eq, instead of by value"),
            ));
        }

        let examples = context.config.equal_examples.iter().chain(&context.config.unequal_examples);
        for example in examples {
            let copy = example.clone();
            if *example != copy {
                return Ok(Some(
                    Violation::new(Axiom::Reflexivity, "example does not equal a clone of itself").evidence(example),
                ));
            }
        }

        Ok(None)
    }
}
