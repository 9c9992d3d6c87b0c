//! Final row marker check.

use std::collections::BTreeMap;

use icd_model::FieldValue;

use crate::checks::{Check, CheckDeclaration, split_rule};
use crate::error::{CheckError, SchemaError};

/// The named field of the last row must carry a literal marker value,
/// proving the data set was not truncated.
///
/// Rule: `field == marker`, e.g. `record_type == EOF`.
pub struct FinalRowMarkerCheck {
    description: String,
    field: String,
    marker: String,
    last_value: Option<String>,
}

impl Check for FinalRowMarkerCheck {
    fn description(&self) -> &str {
        &self.description
    }

    fn reset(&mut self) {
        self.last_value = None;
    }

    fn check_row(
        &mut self,
        _row_number: u64,
        values: &BTreeMap<String, FieldValue>,
    ) -> Result<(), CheckError> {
        self.last_value = values.get(&self.field).map(ToString::to_string);
        Ok(())
    }

    fn check_at_end(&mut self) -> Result<(), CheckError> {
        match &self.last_value {
            Some(value) if *value == self.marker => Ok(()),
            Some(value) => Err(CheckError::new(format!(
                "last row must carry {:?} in field {:?} but has {:?}",
                self.marker, self.field, value
            ))),
            None => Err(CheckError::new(format!(
                "data must end with a row carrying {:?} in field {:?}",
                self.marker, self.field
            ))),
        }
    }
}

pub(crate) fn new_final_row_marker(
    declaration: CheckDeclaration,
) -> Result<Box<dyn Check>, SchemaError> {
    let (field, marker) = split_rule(&declaration, &declaration.rule, "==")?;
    let field = declaration.resolve_field(field)?;
    if marker.is_empty() {
        return Err(SchemaError::BadCheckRule {
            description: declaration.description,
            reason: "marker value must not be empty".to_string(),
        });
    }
    let marker = marker.to_string();
    Ok(Box::new(FinalRowMarkerCheck {
        description: declaration.description,
        field,
        marker,
        last_value: None,
    }))
}
