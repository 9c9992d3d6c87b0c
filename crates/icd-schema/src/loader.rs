//! ICD loading: classify each row of the ICD's own row source by its
//! leading marker and assemble the schema.
//!
//! Markers (case insensitive, surrounding blanks ignored): `d` declares
//! the data format, `f` appends a field, `c` appends a check, a blank
//! marker makes the row a comment. Anything else on a non blank row is a
//! fatal syntax error naming the row.

use std::path::Path;

use tracing::{debug, info};

use icd_model::{DataFormat, FormatKind, Range, Row, data_format};

use icd_ingest::{ParseError, SheetProvider, open_auto_rows};

use crate::checks::{Check, CheckDeclaration, CheckRegistry};
use crate::error::SchemaError;
use crate::fields::{FieldCommon, FieldFormat, FieldFormatRegistry};
use crate::icd::Icd;

/// A check row waiting for the full field list before instantiation.
struct PendingCheck {
    row: u64,
    description: String,
    type_tag: String,
    rule: String,
}

/// Loads ICDs using configurable field and check registries.
pub struct IcdLoader {
    field_registry: FieldFormatRegistry,
    check_registry: CheckRegistry,
}

impl Default for IcdLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl IcdLoader {
    /// Loader with the built in field and check types.
    pub fn new() -> Self {
        Self {
            field_registry: FieldFormatRegistry::with_builtins(),
            check_registry: CheckRegistry::with_builtins(),
        }
    }

    /// Loader with caller supplied registries, for extension types.
    pub fn with_registries(
        field_registry: FieldFormatRegistry,
        check_registry: CheckRegistry,
    ) -> Self {
        Self {
            field_registry,
            check_registry,
        }
    }

    pub fn field_registry(&self) -> &FieldFormatRegistry {
        &self.field_registry
    }

    pub fn check_registry(&self) -> &CheckRegistry {
        &self.check_registry
    }

    /// Load an ICD from a file, auto detecting its container format.
    pub fn load(&self, path: &Path) -> Result<Icd, SchemaError> {
        self.load_with_provider(path, None)
    }

    pub fn load_with_provider(
        &self,
        path: &Path,
        provider: Option<&dyn SheetProvider>,
    ) -> Result<Icd, SchemaError> {
        info!(path = %path.display(), "loading ICD");
        let rows = open_auto_rows(path, provider)?;
        self.load_rows(rows)
    }

    /// Load an ICD from an already opened row stream.
    pub fn load_rows(
        &self,
        rows: impl Iterator<Item = Result<Row, ParseError>>,
    ) -> Result<Icd, SchemaError> {
        let mut builder = IcdBuilder::new(self);
        let mut row_number = 0u64;
        for row in rows {
            let row = row?;
            row_number += 1;
            builder.add_row(row_number, &row)?;
        }
        builder.finish()
    }
}

struct IcdBuilder<'a> {
    loader: &'a IcdLoader,
    data_format: Option<DataFormat>,
    field_names: Vec<String>,
    fields: Vec<Box<dyn FieldFormat>>,
    pending_checks: Vec<PendingCheck>,
}

impl<'a> IcdBuilder<'a> {
    fn new(loader: &'a IcdLoader) -> Self {
        Self {
            loader,
            data_format: None,
            field_names: Vec::new(),
            fields: Vec::new(),
            pending_checks: Vec::new(),
        }
    }

    fn add_row(&mut self, row_number: u64, row: &[String]) -> Result<(), SchemaError> {
        let Some(marker) = row.first() else {
            return Ok(());
        };
        let marker = marker.trim().to_lowercase();
        debug!(row = row_number, marker = %marker, "ICD row");
        match marker.as_str() {
            "d" => self.add_data_format(row_number, &row[1..]),
            "f" => self.add_field(row_number, &row[1..]),
            "c" => self.add_check(row_number, &row[1..]),
            "" => Ok(()),
            _ => Err(SchemaError::UnknownMarker {
                row: row_number,
                marker: row[0].clone(),
            }),
        }
    }

    fn add_data_format(&mut self, row_number: u64, items: &[String]) -> Result<(), SchemaError> {
        let Some(key) = items.first() else {
            return Err(SchemaError::MalformedDataFormatRow { row: row_number });
        };
        let value = items.get(1).map(String::as_str).unwrap_or("");
        if data_format::is_format_key(key) {
            if let Some(format) = &self.data_format {
                return Err(SchemaError::DuplicateFormat {
                    row: row_number,
                    kind: format.kind(),
                });
            }
            let format = DataFormat::for_kind_name(value).map_err(|source| {
                SchemaError::DataFormat {
                    row: row_number,
                    source,
                }
            })?;
            info!(kind = %format.kind(), "ICD data format");
            self.data_format = Some(format);
            Ok(())
        } else if let Some(format) = &mut self.data_format {
            format
                .set(key, value)
                .map_err(|source| SchemaError::DataFormat {
                    row: row_number,
                    source,
                })
        } else {
            Err(SchemaError::FormatNotFirst {
                row: row_number,
                key: key.clone(),
            })
        }
    }

    fn add_field(&mut self, row_number: u64, items: &[String]) -> Result<(), SchemaError> {
        let Some(format) = &self.data_format else {
            return Err(SchemaError::FieldBeforeFormat { row: row_number });
        };
        // marker, name, example, type; the marker is already consumed.
        if items.len() < 3 {
            return Err(SchemaError::MalformedFieldRow { row: row_number });
        }
        let name = items[0].trim();
        if !is_valid_identifier(name) {
            return Err(SchemaError::BadFieldName {
                row: row_number,
                name: items[0].clone(),
            });
        }
        if self.field_names.iter().any(|existing| existing == name) {
            return Err(SchemaError::DuplicateField {
                row: row_number,
                name: name.to_string(),
            });
        }
        let example = items[1].as_str();
        let type_tag = items[2].trim();
        let is_allowed_to_be_empty = match items.get(3).map(|text| text.trim().to_lowercase()) {
            None => false,
            Some(text) if text.is_empty() => false,
            Some(text) if text == "x" => true,
            Some(_) => {
                return Err(SchemaError::BadEmptyMark {
                    row: row_number,
                    text: items[3].clone(),
                });
            }
        };
        let length_text = items.get(4).map(|text| text.trim()).unwrap_or("");
        let length = if length_text.is_empty() {
            None
        } else {
            Some(
                Range::new(length_text).map_err(|source| SchemaError::BadLength {
                    row: row_number,
                    name: name.to_string(),
                    source,
                })?,
            )
        };
        if format.kind() == FormatKind::FixedWidth
            && length.as_ref().and_then(|range| range.exact_width()).is_none()
        {
            return Err(SchemaError::MissingFixedWidth {
                row: row_number,
                name: name.to_string(),
            });
        }
        let rule = items.get(5).map(|text| text.trim()).unwrap_or("");

        let common = FieldCommon {
            name: name.to_string(),
            is_allowed_to_be_empty,
            length,
        };
        let field = self
            .loader
            .field_registry
            .create(type_tag, common, rule, format)?;

        // A supplied example must itself conform to the field.
        if !example.is_empty()
            && let Err(error) = field.validate(example)
        {
            return Err(SchemaError::BadExample {
                row: row_number,
                name: name.to_string(),
                reason: error.to_string(),
            });
        }

        debug!(field = name, r#type = type_tag, "defined field");
        self.field_names.push(name.to_string());
        self.fields.push(field);
        Ok(())
    }

    fn add_check(&mut self, row_number: u64, items: &[String]) -> Result<(), SchemaError> {
        // marker, description, type; the marker is already consumed.
        if items.len() < 2 {
            return Err(SchemaError::MalformedCheckRow { row: row_number });
        }
        let description = items[0].trim().to_string();
        if self
            .pending_checks
            .iter()
            .any(|pending| pending.description == description)
        {
            return Err(SchemaError::DuplicateCheck {
                row: row_number,
                description,
            });
        }
        self.pending_checks.push(PendingCheck {
            row: row_number,
            description,
            type_tag: items[1].trim().to_string(),
            rule: items.get(2).map(|text| text.trim()).unwrap_or("").to_string(),
        });
        Ok(())
    }

    fn finish(self) -> Result<Icd, SchemaError> {
        let Some(data_format) = self.data_format else {
            return Err(SchemaError::MissingDataFormat);
        };
        if self.fields.is_empty() {
            return Err(SchemaError::MissingFields);
        }
        // Checks are instantiated last so their rules can address every
        // declared field, regardless of declaration order.
        let mut checks: Vec<Box<dyn Check>> = Vec::with_capacity(self.pending_checks.len());
        for pending in self.pending_checks {
            debug!(row = pending.row, check = %pending.description, "defined check");
            let declaration = CheckDeclaration {
                description: pending.description,
                rule: pending.rule,
                field_names: self.field_names.clone(),
            };
            checks.push(
                self.loader
                    .check_registry
                    .create(&pending.type_tag, declaration)?,
            );
        }
        info!(
            fields = self.fields.len(),
            checks = checks.len(),
            "loaded ICD"
        );
        Ok(Icd::new(data_format, self.field_names, self.fields, checks))
    }
}

/// Field names follow identifier rules: a letter or underscore followed by
/// letters, digits, or underscores.
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(rows: &[&[&str]]) -> Vec<Result<Row, ParseError>> {
        rows.iter()
            .map(|row| Ok(row.iter().map(ToString::to_string).collect()))
            .collect()
    }

    fn load(icd_rows: &[&[&str]]) -> Result<Icd, SchemaError> {
        IcdLoader::new().load_rows(rows(icd_rows).into_iter())
    }

    #[test]
    fn loads_a_minimal_icd() {
        let icd = load(&[
            &["d", "format", "delimited"],
            &["d", "header", "1"],
            &["f", "branch_id", "38000", "integer", "", "", "1:99999"],
            &["f", "comment", "", "text", "x"],
            &["c", "branch is unique", "is_unique", "branch_id"],
        ])
        .expect("load");
        assert_eq!(icd.data_format().kind(), FormatKind::Delimited);
        assert_eq!(icd.data_format().header_rows(), 1);
        assert_eq!(icd.field_names(), ["branch_id", "comment"]);
        assert_eq!(icd.checks().len(), 1);
        assert_eq!(icd.checks()[0].description(), "branch is unique");
    }

    #[test]
    fn blank_and_comment_rows_are_ignored() {
        let icd = load(&[
            &[],
            &["", "anything goes here"],
            &["d", "format", "delimited"],
            &["f", "branch_id", "", "text"],
        ])
        .expect("load");
        assert_eq!(icd.field_names(), ["branch_id"]);
    }

    #[test]
    fn marker_is_case_insensitive() {
        let icd = load(&[
            &["D", "Format", "delimited"],
            &["F", "branch_id", "", "text"],
        ])
        .expect("load");
        assert_eq!(icd.field_names(), ["branch_id"]);
    }

    #[test]
    fn unknown_marker_names_the_row() {
        let error = load(&[
            &["d", "format", "delimited"],
            &["x", "branch_id", "", "text"],
        ])
        .expect_err("unknown marker");
        assert!(matches!(error, SchemaError::UnknownMarker { row: 2, .. }));
    }

    #[test]
    fn format_must_precede_fields() {
        assert!(matches!(
            load(&[&["f", "branch_id", "", "text"]]),
            Err(SchemaError::FieldBeforeFormat { row: 1 })
        ));
        assert!(matches!(
            load(&[&["d", "header", "1"]]),
            Err(SchemaError::FormatNotFirst { row: 1, .. })
        ));
    }

    #[test]
    fn format_is_set_exactly_once() {
        assert!(matches!(
            load(&[
                &["d", "format", "delimited"],
                &["d", "format", "fixed"],
                &["f", "branch_id", "", "text"],
            ]),
            Err(SchemaError::DuplicateFormat { row: 2, .. })
        ));
    }

    #[test]
    fn missing_sections_are_fatal() {
        assert!(matches!(load(&[]), Err(SchemaError::MissingDataFormat)));
        assert!(matches!(
            load(&[&["d", "format", "delimited"]]),
            Err(SchemaError::MissingFields)
        ));
    }

    #[test]
    fn duplicate_names_are_fatal() {
        assert!(matches!(
            load(&[
                &["d", "format", "delimited"],
                &["f", "branch_id", "", "text"],
                &["f", "branch_id", "", "integer"],
            ]),
            Err(SchemaError::DuplicateField { row: 3, .. })
        ));
        assert!(matches!(
            load(&[
                &["d", "format", "delimited"],
                &["f", "branch_id", "", "text"],
                &["c", "twice", "is_unique", "branch_id"],
                &["c", "twice", "is_unique", "branch_id"],
            ]),
            Err(SchemaError::DuplicateCheck { row: 4, .. })
        ));
    }

    #[test]
    fn bad_field_declarations_are_fatal() {
        assert!(matches!(
            load(&[&["d", "format", "delimited"], &["f", "not valid!", "", "text"]]),
            Err(SchemaError::BadFieldName { row: 2, .. })
        ));
        assert!(matches!(
            load(&[&["d", "format", "delimited"], &["f", "branch_id", ""]]),
            Err(SchemaError::MalformedFieldRow { row: 2 })
        ));
        assert!(matches!(
            load(&[
                &["d", "format", "delimited"],
                &["f", "branch_id", "", "text", "yes"],
            ]),
            Err(SchemaError::BadEmptyMark { row: 2, .. })
        ));
        assert!(matches!(
            load(&[
                &["d", "format", "delimited"],
                &["f", "branch_id", "", "teleport"],
            ]),
            Err(SchemaError::UnknownFieldType(_))
        ));
    }

    #[test]
    fn example_must_validate() {
        let error = load(&[
            &["d", "format", "delimited"],
            &["f", "branch_id", "abc", "integer"],
        ])
        .expect_err("bad example");
        assert!(matches!(error, SchemaError::BadExample { row: 2, .. }));
    }

    #[test]
    fn fixed_width_fields_need_exact_lengths() {
        assert!(matches!(
            load(&[
                &["d", "format", "fixed"],
                &["f", "branch_id", "", "text", "", "1:5"],
            ]),
            Err(SchemaError::MissingFixedWidth { row: 2, .. })
        ));
        let icd = load(&[
            &["d", "format", "fixed"],
            &["f", "branch_id", "", "text", "", "5"],
            &["f", "name", "", "text", "x", "10"],
        ])
        .expect("load");
        assert_eq!(icd.fixed_widths(), vec![5, 10]);
    }

    #[test]
    fn checks_can_reference_fields_declared_later() {
        let icd = load(&[
            &["d", "format", "delimited"],
            &["f", "branch_id", "", "text"],
            &["c", "all amounts", "total", "amount == 10"],
            &["f", "amount", "", "integer"],
        ])
        .expect("load");
        assert_eq!(icd.checks().len(), 1);
    }

    #[test]
    fn unknown_check_type_is_fatal() {
        assert!(matches!(
            load(&[
                &["d", "format", "delimited"],
                &["f", "branch_id", "", "text"],
                &["c", "magic", "crystal_ball", "branch_id"],
            ]),
            Err(SchemaError::UnknownCheckType(_))
        ));
    }
}
