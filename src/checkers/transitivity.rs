//! If `a == b` and `b == c` then `a == c`
//!
//! For every field the reference is compared with a variant where only that
//! field differs and with a variant where every other field differs. Of the
//! three comparisons between these instances, exactly one being false breaks
//! transitivity. The same rule is applied to every triple of known
//! instances.

use std::hash::Hash;

use super::{Checker, Context};
use crate::config::Axiom;
use crate::error::VerifierResult;
use crate::report::Violation;
use crate::shape::Described;

const MESSAGE: &str = "two of these three instances are equal to each other, so the third one should be, too";

pub struct TransitivityChecker;

fn breaks_transitivity<T: PartialEq>(a: &T, b: &T, c: &T) -> bool {
    let verdicts = [a == b, b == c, a == c];
    verdicts.iter().filter(|equal| !**equal).count() == 1
}

impl<T: Described + Hash> Checker<T> for TransitivityChecker {
    fn axiom(&self) -> Axiom {
        Axiom::Transitivity
    }

    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>> {
        let a1 = &context.reference;
        for field in context.fields() {
            let b1 = context.field_variant(a1, field.name())?;
            let b2 = context.all_but(a1, field.name())?;
            if breaks_transitivity(a1, &b1, &b2) {
                return Ok(Some(
                    Violation::new(Axiom::Transitivity, MESSAGE)
                        .field(field.name())
                        .evidence(a1)
                        .evidence(&b1)
                        .evidence(&b2)
                        .hint("eq probably combines fields with `||` instead of `&&`"),
                ));
            }
        }

        let mut known = context.config.equal_examples.clone();
        known.extend(context.config.unequal_examples.iter().cloned());
        for (i, a) in known.iter().enumerate() {
            for (j, b) in known.iter().enumerate().skip(i + 1) {
                for c in known.iter().skip(j + 1) {
                    if breaks_transitivity(a, b, c) {
                        return Ok(Some(
                            Violation::new(Axiom::Transitivity, MESSAGE)
                                .evidence(a)
                                .evidence(b)
                                .evidence(c),
                        ));
                    }
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Either(i32, i32);

    impl PartialEq for Either {
        fn eq(&self, other: &Self) -> bool {
            self.0 == other.0 || self.1 == other.1
        }
    }

    #[test]
    fn test_exactly_one_false_breaks_transitivity() {
        let a = Either(1, 1);
        let b = Either(2, 1);
        let c = Either(1, 2);
        assert!(breaks_transitivity(&a, &b, &c));
    }

    #[test]
    fn test_consistent_verdicts_pass() {
        assert!(!breaks_transitivity(&1, &1, &1));
        assert!(!breaks_transitivity(&1, &1, &2));
        assert!(!breaks_transitivity(&1, &2, &3));
    }
}
