//! Repeated comparisons and digests of unchanged instances agree

use std::hash::Hash;

use super::{hash_of, Checker, Context};
use crate::config::Axiom;
use crate::error::VerifierResult;
use crate::report::Violation;
use crate::shape::Described;

const REPETITIONS: usize = 3;

pub struct ConsistencyChecker;

impl<T: Described + Hash> Checker<T> for ConsistencyChecker {
    fn axiom(&self) -> Axiom {
        Axiom::Consistency
    }

    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>> {
        let instances = [&context.reference, &context.copy, &context.other];

        for a in instances {
            let digest = hash_of(a);
            if (1..REPETITIONS).any(|_| hash_of(a) != digest) {
                return Ok(Some(
                    Violation::new(Axiom::Consistency, "hash changes between calls on an unchanged instance").evidence(a),
                ));
            }
            for b in instances {
                let verdict = a == b;
                if (1..REPETITIONS).any(|_| (a == b) != verdict) {
                    return Ok(Some(
                        Violation::new(Axiom::Consistency, "eq changes its verdict between calls on unchanged instances")
                            .evidence(a)
                            .evidence(b),
                    ));
                }
            }
        }

        Ok(None)
    }
}
