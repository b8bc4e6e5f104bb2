//! `a == b` and `b == a` always agree

use std::hash::Hash;

use super::{Checker, Context};
use crate::config::Axiom;
use crate::error::VerifierResult;
use crate::report::Violation;
use crate::shape::Described;

pub struct SymmetryChecker;

impl<T: Described + Hash> Checker<T> for SymmetryChecker {
    fn axiom(&self) -> Axiom {
        Axiom::Symmetry
    }

    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>> {
        let pool = context.pool()?;
        for (i, a) in pool.iter().enumerate() {
            for b in &pool[i + 1..] {
                let forward = a == b;
                let backward = b == a;
                if forward != backward {
                    return Ok(Some(
                        Violation::new(
                            Axiom::Symmetry,
                            format!("a == b is {} but b == a is {}", forward, backward),
                        )
                        .evidence(a)
                        .evidence(b),
                    ));
                }
            }
        }
        Ok(None)
    }
}
