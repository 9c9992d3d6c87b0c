//! Accumulating end of data checks.

use std::collections::{BTreeMap, BTreeSet};

use icd_model::FieldValue;

use crate::checks::{Check, CheckDeclaration, split_rule};
use crate::error::{CheckError, SchemaError};

/// The running numeric total of a field must equal a declared value once
/// all rows are consumed.
///
/// Rule: `field == value`, e.g. `amount == 100`.
pub struct TotalCheck {
    description: String,
    field: String,
    expected: f64,
    total: f64,
}

impl Check for TotalCheck {
    fn description(&self) -> &str {
        &self.description
    }

    fn reset(&mut self) {
        self.total = 0.0;
    }

    fn check_row(
        &mut self,
        _row_number: u64,
        values: &BTreeMap<String, FieldValue>,
    ) -> Result<(), CheckError> {
        if let Some(number) = values.get(&self.field).and_then(FieldValue::as_number) {
            self.total += number;
        }
        Ok(())
    }

    fn check_at_end(&mut self) -> Result<(), CheckError> {
        if (self.total - self.expected).abs() < 1e-9 {
            Ok(())
        } else {
            Err(CheckError::new(format!(
                "total of field {:?} is {} but must be {}",
                self.field, self.total, self.expected
            )))
        }
    }
}

pub(crate) fn new_total(declaration: CheckDeclaration) -> Result<Box<dyn Check>, SchemaError> {
    let (field, value) = split_rule(&declaration, &declaration.rule, "==")?;
    let field = declaration.resolve_field(field)?;
    let expected = value
        .parse::<f64>()
        .map_err(|_| declaration.bad_rule(format!("expected total {value:?} must be a number")))?;
    Ok(Box::new(TotalCheck {
        description: declaration.description,
        field,
        expected,
        total: 0.0,
    }))
}

/// The number of distinct non absent values of a field must not exceed a
/// declared limit at end of data.
///
/// Rule: `field <= limit`, e.g. `branch_id <= 10`.
pub struct DistinctCountCheck {
    description: String,
    field: String,
    limit: u64,
    seen: BTreeSet<String>,
}

impl Check for DistinctCountCheck {
    fn description(&self) -> &str {
        &self.description
    }

    fn reset(&mut self) {
        self.seen.clear();
    }

    fn check_row(
        &mut self,
        _row_number: u64,
        values: &BTreeMap<String, FieldValue>,
    ) -> Result<(), CheckError> {
        if let Some(value) = values.get(&self.field)
            && !value.is_absent()
        {
            self.seen.insert(value.to_string());
        }
        Ok(())
    }

    fn check_at_end(&mut self) -> Result<(), CheckError> {
        let count = self.seen.len() as u64;
        if count <= self.limit {
            Ok(())
        } else {
            Err(CheckError::new(format!(
                "field {:?} has {} distinct values but must have at most {}",
                self.field, count, self.limit
            )))
        }
    }
}

pub(crate) fn new_distinct_count(
    declaration: CheckDeclaration,
) -> Result<Box<dyn Check>, SchemaError> {
    let (field, value) = split_rule(&declaration, &declaration.rule, "<=")?;
    let field = declaration.resolve_field(field)?;
    let limit = value
        .parse::<u64>()
        .map_err(|_| declaration.bad_rule(format!("limit {value:?} must be a count")))?;
    Ok(Box::new(DistinctCountCheck {
        description: declaration.description,
        field,
        limit,
        seen: BTreeSet::new(),
    }))
}
