//! Equal instances have equal digests, and cached digests are kept current

use std::hash::Hash;

use super::{hash_of, Checker, Context};
use crate::config::Axiom;
use crate::error::VerifierResult;
use crate::report::Violation;
use crate::shape::Described;
use crate::value::Value;

pub struct HashAgreementChecker;

impl<T: Described + Hash> Checker<T> for HashAgreementChecker {
    fn axiom(&self) -> Axiom {
        Axiom::HashAgreement
    }

    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>> {
        let pool = context.pool()?;
        for (i, a) in pool.iter().enumerate() {
            for b in &pool[i + 1..] {
                if a != b {
                    continue;
                }
                let (hash_a, hash_b) = (hash_of(a), hash_of(b));
                if hash_a != hash_b {
                    return Ok(Some(
                        Violation::new(
                            Axiom::HashAgreement,
                            format!("hash codes should be equal for equal instances: {} and {}", hash_a, hash_b),
                        )
                        .evidence(a)
                        .evidence(b)
                        .hint("hash probably uses a field that eq does not"),
                    ));
                }
            }
        }
        Ok(None)
    }
}

pub struct CachedHashChecker;

impl<T: Described + Hash> Checker<T> for CachedHashChecker {
    fn axiom(&self) -> Axiom {
        Axiom::CachedHash
    }

    fn applies(&self, context: &Context<'_, T>) -> bool {
        context.config.cached_hash.is_some()
    }

    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>> {
        let cached = match &context.config.cached_hash {
            Some(cached) => cached,
            None => return Ok(None),
        };
        let record = match context.config.record.as_deref() {
            Some(record) => record,
            None => return Ok(None),
        };
        let field = match record.field(cached.field) {
            Some(field) => field,
            None => return Ok(None),
        };

        let example = Value::new(cached.example.clone());
        let mut recomputed = cached.example.clone();
        (cached.recompute)(&mut recomputed);
        let recomputed = Value::new(recomputed);
        if field.read(&example)? != field.read(&recomputed)? {
            return Ok(Some(
                Violation::new(
                    Axiom::CachedHash,
                    format!("the example's cached hash field {} does not hold its recomputed value", cached.field),
                )
                .field(cached.field)
                .evidence(&cached.example)
                .evidence(&recomputed)
                .hint("build the example through the constructor that computes the cached hash"),
            ));
        }

        let mut again = context.reference.clone();
        (cached.recompute)(&mut again);
        if hash_of(&again) != hash_of(&context.reference) {
            return Ok(Some(
                Violation::new(
                    Axiom::CachedHash,
                    format!("recomputing cached hash field {} twice gives different digests", cached.field),
                )
                .field(cached.field)
                .evidence(&context.reference),
            ));
        }

        Ok(None)
    }
}
