//! Checks: stateful invariants evaluated per row and once at end of data.
//!
//! Like field formats, concrete checks are resolved through a registry by
//! a lowercase type tag. Each check instance owns its accumulation state
//! exclusively; `reset` is called at the start of every validation run and
//! one instance serves one run at a time.

mod marker;
mod totals;
mod unique;

use std::collections::BTreeMap;

use icd_model::FieldValue;

use crate::error::{CheckError, SchemaError};

pub use marker::FinalRowMarkerCheck;
pub use totals::{DistinctCountCheck, TotalCheck};
pub use unique::IsUniqueCheck;

/// A declared check before instantiation: its unique description, its rule
/// text, and the full ordered field name list so the rule can address any
/// field by name.
#[derive(Debug, Clone)]
pub struct CheckDeclaration {
    pub description: String,
    pub rule: String,
    pub field_names: Vec<String>,
}

impl CheckDeclaration {
    /// Resolve a field named by the rule, failing with a schema error that
    /// names the check when the field does not exist.
    fn resolve_field(&self, name: &str) -> Result<String, SchemaError> {
        let trimmed = name.trim();
        if self.field_names.iter().any(|field| field == trimmed) {
            Ok(trimmed.to_string())
        } else {
            Err(SchemaError::BadCheckRule {
                description: self.description.clone(),
                reason: format!("rule references unknown field {trimmed:?}"),
            })
        }
    }

    fn bad_rule(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::BadCheckRule {
            description: self.description.clone(),
            reason: reason.into(),
        }
    }
}

/// One stateful invariant over the rows of a run.
pub trait Check {
    /// The unique description from the ICD, used in failure reasons.
    fn description(&self) -> &str;

    /// Clear accumulated state; called once before a run begins.
    fn reset(&mut self);

    /// Inspect one accepted-so-far row. `values` maps every validated
    /// field name to its typed value.
    fn check_row(
        &mut self,
        row_number: u64,
        values: &BTreeMap<String, FieldValue>,
    ) -> Result<(), CheckError> {
        let _ = (row_number, values);
        Ok(())
    }

    /// Report accumulated invariants once all rows are consumed.
    fn check_at_end(&mut self) -> Result<(), CheckError> {
        Ok(())
    }
}

pub type CheckFactory = fn(CheckDeclaration) -> Result<Box<dyn Check>, SchemaError>;

/// Registry mapping a lowercase type tag to a check constructor.
pub struct CheckRegistry {
    factories: BTreeMap<String, CheckFactory>,
}

impl CheckRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("is_unique", unique::new_is_unique);
        registry.register("total", totals::new_total);
        registry.register("distinct_count", totals::new_distinct_count);
        registry.register("final_row_marker", marker::new_final_row_marker);
        registry
    }

    pub fn register(&mut self, tag: &str, factory: CheckFactory) {
        self.factories.insert(tag.trim().to_lowercase(), factory);
    }

    pub fn create(
        &self,
        tag: &str,
        declaration: CheckDeclaration,
    ) -> Result<Box<dyn Check>, SchemaError> {
        let factory = self
            .factories
            .get(&tag.trim().to_lowercase())
            .ok_or_else(|| SchemaError::UnknownCheckType(tag.to_string()))?;
        factory(declaration)
    }

    /// Registered type tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Split a `lhs <op> rhs` rule on its operator.
fn split_rule<'a>(
    declaration: &CheckDeclaration,
    rule: &'a str,
    operator: &str,
) -> Result<(&'a str, &'a str), SchemaError> {
    rule.split_once(operator)
        .map(|(lhs, rhs)| (lhs.trim(), rhs.trim()))
        .ok_or_else(|| {
            declaration.bad_rule(format!(
                "rule must have the form \"field {operator} value\" but is {rule:?}"
            ))
        })
}
