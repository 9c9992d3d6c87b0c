//! Uniqueness check across rows.

use std::collections::{BTreeMap, HashMap};

use icd_model::FieldValue;

use crate::checks::{Check, CheckDeclaration};
use crate::error::{CheckError, SchemaError};

/// The combination of the named fields must be unique across all rows.
///
/// Rule: a comma separated list of field names forming the key.
pub struct IsUniqueCheck {
    description: String,
    key_fields: Vec<String>,
    seen: HashMap<String, u64>,
}

impl Check for IsUniqueCheck {
    fn description(&self) -> &str {
        &self.description
    }

    fn reset(&mut self) {
        self.seen.clear();
    }

    fn check_row(
        &mut self,
        row_number: u64,
        values: &BTreeMap<String, FieldValue>,
    ) -> Result<(), CheckError> {
        let key = self
            .key_fields
            .iter()
            .map(|field| {
                values
                    .get(field)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join("\u{1f}");
        match self.seen.get(&key) {
            Some(first_row) => Err(CheckError::new(format!(
                "values of {} must be unique but {:?} was already used in row {}",
                self.key_fields.join(", "),
                key.replace('\u{1f}', ", "),
                first_row
            ))),
            None => {
                self.seen.insert(key, row_number);
                Ok(())
            }
        }
    }
}

pub(crate) fn new_is_unique(
    declaration: CheckDeclaration,
) -> Result<Box<dyn Check>, SchemaError> {
    let mut key_fields = Vec::new();
    for name in declaration.rule.split(',') {
        if name.trim().is_empty() {
            continue;
        }
        key_fields.push(declaration.resolve_field(name)?);
    }
    if key_fields.is_empty() {
        return Err(SchemaError::BadCheckRule {
            description: declaration.description,
            reason: "rule must name at least one field".to_string(),
        });
    }
    Ok(Box::new(IsUniqueCheck {
        description: declaration.description,
        key_fields,
        seen: HashMap::new(),
    }))
}
