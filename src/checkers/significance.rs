//! Fields used by eq change its verdict; ignored fields do not

use std::hash::Hash;

use super::{Checker, Context};
use crate::config::Axiom;
use crate::error::VerifierResult;
use crate::report::Violation;
use crate::shape::Described;

pub struct SignificantFieldsChecker;

impl<T: Described + Hash> Checker<T> for SignificantFieldsChecker {
    fn axiom(&self) -> Axiom {
        Axiom::SignificantFields
    }

    fn check(&self, context: &Context<'_, T>) -> VerifierResult<Option<Violation>> {
        let reference = &context.reference;
        let before = *reference == context.copy;

        for field in context.fields() {
            if context.is_degenerate(field)? {
                log::debug!("Skipping stateless field {}", field.name());
                continue;
            }
            let changed = context.field_variant(reference, field.name())?;
            let after = *reference == changed;
            let significant = before != after;

            if context.config.is_ignored(field.name()) && significant {
                return Ok(Some(
                    Violation::new(
                        Axiom::SignificantFields,
                        format!("eq should not use {}, but it does", field.name()),
                    )
                    .field(field.name())
                    .evidence(reference)
                    .evidence(&changed)
                    .hint("remove the field from with_ignored_fields, or stop comparing it in eq"),
                ));
            }
            if !context.config.is_ignored(field.name()) && !significant {
                return Ok(Some(
                    Violation::new(
                        Axiom::SignificantFields,
                        format!("eq does not use {}, or it is stateless", field.name()),
                    )
                    .field(field.name())
                    .evidence(reference)
                    .evidence(&changed)
                    .hint(format!(
                        "compare the field in eq, or list it with with_ignored_fields(&[\"{}\"])",
                        field.name()
                    )),
                ));
            }
        }
        Ok(None)
    }
}
