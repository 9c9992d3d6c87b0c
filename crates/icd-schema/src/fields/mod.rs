//! Field formats: typed per field validators behind one capability trait.
//!
//! Concrete formats are resolved through [`FieldFormatRegistry`] by a
//! lowercase type tag; callers never name a concrete type, so new field
//! types can be registered without touching the loader or the engine.

mod choice;
mod datetime;
mod numeric;
mod text;

use std::collections::BTreeMap;

use icd_model::{DataFormat, FieldValue, Range};

use crate::error::{FieldValueError, SchemaError};

pub use choice::{ChoiceFieldFormat, PatternFieldFormat, RegexFieldFormat};
pub use datetime::DateTimeFieldFormat;
pub use numeric::{DecimalFieldFormat, IntegerFieldFormat};
pub use text::{TextFieldFormat, UntouchedFieldFormat};

/// Declaration shared by every field format: name, empty flag, and the
/// optional length constraint.
#[derive(Debug, Clone)]
pub struct FieldCommon {
    pub name: String,
    pub is_allowed_to_be_empty: bool,
    pub length: Option<Range>,
}

/// One typed column validator.
///
/// `validate` never sees the empty/length concerns: the engine calls
/// `validate_empty` and `validate_length` first, and an empty item that
/// survived them yields [`FieldValue::Absent`] without type parsing.
pub trait FieldFormat {
    fn name(&self) -> &str;
    fn is_allowed_to_be_empty(&self) -> bool;
    fn length(&self) -> Option<&Range>;

    fn validate_empty(&self, item: &str) -> Result<(), FieldValueError> {
        if item.is_empty() && !self.is_allowed_to_be_empty() {
            Err(FieldValueError::MustNotBeEmpty)
        } else {
            Ok(())
        }
    }

    /// Length check against the declared range; structurally guaranteed
    /// fixed width items skip this at the engine level.
    fn validate_length(&self, item: &str) -> Result<(), FieldValueError> {
        if item.is_empty() {
            return Ok(());
        }
        if let Some(range) = self.length() {
            range
                .validate("length of value", item.chars().count() as i64)
                .map_err(FieldValueError::Length)?;
        }
        Ok(())
    }

    fn validate(&self, item: &str) -> Result<FieldValue, FieldValueError> {
        if item.is_empty() {
            Ok(FieldValue::Absent)
        } else {
            self.validate_value(item)
        }
    }

    /// Type specific validation of a non empty item.
    fn validate_value(&self, item: &str) -> Result<FieldValue, FieldValueError>;
}

/// Constructor for one field format type. The data format is available so
/// number formats can pick up the declared separators.
pub type FieldFormatFactory =
    fn(FieldCommon, &str, &DataFormat) -> Result<Box<dyn FieldFormat>, SchemaError>;

/// Registry mapping a lowercase type tag to a field format constructor.
pub struct FieldFormatRegistry {
    factories: BTreeMap<String, FieldFormatFactory>,
}

impl FieldFormatRegistry {
    /// An empty registry without any known types.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the built in field types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("text", text::new_text);
        registry.register("untouched", text::new_untouched);
        registry.register("integer", numeric::new_integer);
        registry.register("decimal", numeric::new_decimal);
        registry.register("datetime", datetime::new_datetime);
        registry.register("choice", choice::new_choice);
        registry.register("pattern", choice::new_pattern);
        registry.register("regex", choice::new_regex);
        registry
    }

    pub fn register(&mut self, tag: &str, factory: FieldFormatFactory) {
        self.factories.insert(tag.trim().to_lowercase(), factory);
    }

    /// Create a field format, failing with a typed error for unknown tags.
    pub fn create(
        &self,
        tag: &str,
        common: FieldCommon,
        rule: &str,
        format: &DataFormat,
    ) -> Result<Box<dyn FieldFormat>, SchemaError> {
        let factory = self
            .factories
            .get(&tag.trim().to_lowercase())
            .ok_or_else(|| SchemaError::UnknownFieldType(tag.to_string()))?;
        factory(common, rule, format)
    }

    /// Registered type tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for FieldFormatRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
