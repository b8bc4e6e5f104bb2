//! Structured verification results
//!
//! Checks produce `CheckResult`s, which are collected per type into a
//! `TypeReport` and per run into a `BatchReport`. All of them serialize with
//! serde, so they can be stored or diffed as JSON.

use std::fmt;

use serde::Serialize;

use crate::config::Axiom;
use crate::error::{VerifierError, VerifierResult};

/// One broken axiom, with the instances that show it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub axiom: Axiom,
    /// Fields involved, if the violation is about particular fields
    pub fields: Vec<String>,
    /// Debug renderings of the instances involved
    pub evidence: Vec<String>,
    pub message: String,
    pub hint: Option<String>,
}

impl Violation {
    pub fn new(axiom: Axiom, message: impl Into<String>) -> Self {
        Self {
            axiom,
            fields: Vec::new(),
            evidence: Vec::new(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(name.to_string());
        self
    }

    pub fn evidence<D: fmt::Debug + ?Sized>(mut self, value: &D) -> Self {
        self.evidence.push(format!("{:?}", value));
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.axiom, self.message)?;
        if !self.fields.is_empty() {
            write!(f, " (field {})", self.fields.join(", "))?;
        }
        for item in &self.evidence {
            write!(f, "\n  {}", item)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  Hint: {}", hint)?;
        }
        Ok(())
    }
}

/// Outcome of checking one axiom
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome")]
pub enum CheckResult {
    Passed { axiom: Axiom },
    Failed { violation: Violation },
    Skipped { axiom: Axiom },
}

impl CheckResult {
    pub fn axiom(&self) -> Axiom {
        match self {
            CheckResult::Passed { axiom } | CheckResult::Skipped { axiom } => *axiom,
            CheckResult::Failed { violation } => violation.axiom,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CheckResult::Failed { .. })
    }
}

/// Results of verifying one type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeReport {
    pub type_name: String,
    pub results: Vec<CheckResult>,
}

impl TypeReport {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            results: Vec::new(),
        }
    }

    pub fn is_successful(&self) -> bool {
        !self.results.iter().any(CheckResult::is_failure)
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.results.iter().filter_map(|r| match r {
            CheckResult::Failed { violation } => Some(violation),
            _ => None,
        })
    }

    /// Whether any violation concerns `axiom`
    pub fn violates(&self, axiom: Axiom) -> bool {
        self.violations().any(|v| v.axiom == axiom)
    }

    /// Human-readable summary of the violations
    pub fn message(&self) -> String {
        let mut message = format!("EqualsVerifier found a problem in type {}.", self.type_name);
        for violation in self.violations() {
            message.push_str("\n-> ");
            message.push_str(&violation.to_string());
        }
        message
    }

    /// Turns violations into a contract violation error
    pub fn into_result(self) -> VerifierResult<()> {
        if self.is_successful() {
            Ok(())
        } else {
            Err(VerifierError::ContractViolation { message: self.message() })
        }
    }

    pub fn to_json(&self) -> VerifierResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome for one type of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum BatchSection {
    Checked { report: TypeReport },
    /// Verification of the type could not run to completion
    Aborted { type_name: String, error: String },
}

impl BatchSection {
    pub fn type_name(&self) -> &str {
        match self {
            BatchSection::Checked { report } => &report.type_name,
            BatchSection::Aborted { type_name, .. } => type_name,
        }
    }

    pub fn is_successful(&self) -> bool {
        match self {
            BatchSection::Checked { report } => report.is_successful(),
            BatchSection::Aborted { .. } => false,
        }
    }

    fn message(&self) -> String {
        match self {
            BatchSection::Checked { report } => report.message(),
            BatchSection::Aborted { type_name, error } => {
                format!("EqualsVerifier could not verify type {}.\n-> {}", type_name, error)
            }
        }
    }
}

/// Results of verifying several types
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub sections: Vec<BatchSection>,
}

impl BatchReport {
    pub fn is_successful(&self) -> bool {
        self.sections.iter().all(BatchSection::is_successful)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchSection> {
        self.sections.iter().filter(|s| !s.is_successful())
    }

    pub fn section(&self, type_name: &str) -> Option<&BatchSection> {
        self.sections.iter().find(|s| s.type_name() == type_name)
    }

    /// Summary listing each failing type, followed by one `---` delimited
    /// section per failing type
    pub fn message(&self) -> String {
        let failures: Vec<_> = self.failures().collect();
        let mut message = format!("EqualsVerifier found a problem in {} types:", failures.len());
        for section in &failures {
            message.push_str("\n* ");
            message.push_str(section.type_name());
        }
        for section in &failures {
            message.push_str("\n---\n");
            message.push_str(&section.message());
        }
        message
    }

    pub fn into_result(self) -> VerifierResult<()> {
        if self.is_successful() {
            Ok(())
        } else {
            Err(VerifierError::Batch { message: self.message() })
        }
    }

    pub fn to_json(&self) -> VerifierResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(type_name: &str) -> TypeReport {
        TypeReport {
            type_name: type_name.to_string(),
            results: vec![
                CheckResult::Passed { axiom: Axiom::Reflexivity },
                CheckResult::Failed {
                    violation: Violation::new(Axiom::HashAgreement, "hash codes should be equal")
                        .field("y")
                        .evidence("P { x: 1, y: 2 }")
                        .hint("hash uses a field that eq does not"),
                },
            ],
        }
    }

    #[test]
    fn test_type_report_message() {
        let report = failing("P");
        assert!(!report.is_successful());
        assert!(report.violates(Axiom::HashAgreement));
        let message = report.message();
        assert!(message.contains("Hash agreement: hash codes should be equal (field y)"));
        assert!(message.contains("Hint: hash uses a field that eq does not"));
    }

    #[test]
    fn test_batch_message_has_sections() {
        let batch = BatchReport {
            sections: vec![
                BatchSection::Checked { report: failing("A") },
                BatchSection::Checked { report: TypeReport::new("Fine") },
                BatchSection::Aborted {
                    type_name: "B".to_string(),
                    error: "Recursive datastructure.".to_string(),
                },
            ],
        };
        let message = batch.message();
        assert!(message.starts_with("EqualsVerifier found a problem in 2 types:\n* A\n* B"));
        assert_eq!(message.matches("\n---\n").count(), 2);
        assert!(!message.contains("Fine"));
        assert!(matches!(batch.into_result(), Err(VerifierError::Batch { .. })));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let json = failing("P").to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type_name"], "P");
        assert_eq!(parsed["results"][1]["outcome"], "Failed");
        assert_eq!(parsed["results"][1]["violation"]["axiom"], "HashAgreement");
    }
}
