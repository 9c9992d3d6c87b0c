//! Membership and pattern based field formats.

use regex::Regex;

use icd_model::{DataFormat, FieldValue, Range};

use crate::error::{FieldValueError, SchemaError};
use crate::fields::{FieldCommon, FieldFormat};

/// Value must be one of a comma separated choice set.
pub struct ChoiceFieldFormat {
    common: FieldCommon,
    choices: Vec<String>,
}

impl FieldFormat for ChoiceFieldFormat {
    fn name(&self) -> &str {
        &self.common.name
    }

    fn is_allowed_to_be_empty(&self) -> bool {
        self.common.is_allowed_to_be_empty
    }

    fn length(&self) -> Option<&Range> {
        self.common.length.as_ref()
    }

    fn validate_value(&self, item: &str) -> Result<FieldValue, FieldValueError> {
        if self.choices.iter().any(|choice| choice == item) {
            Ok(FieldValue::Text(item.to_string()))
        } else {
            Err(FieldValueError::NotInChoices {
                value: item.to_string(),
                choices: self.choices.join(", "),
            })
        }
    }
}

pub(crate) fn new_choice(
    common: FieldCommon,
    rule: &str,
    _format: &DataFormat,
) -> Result<Box<dyn FieldFormat>, SchemaError> {
    let choices: Vec<String> = rule
        .split(',')
        .map(str::trim)
        .filter(|choice| !choice.is_empty())
        .map(ToString::to_string)
        .collect();
    if choices.is_empty() {
        return Err(SchemaError::BadFieldRule {
            name: common.name,
            reason: "choice field must declare at least one value".to_string(),
        });
    }
    Ok(Box::new(ChoiceFieldFormat { common, choices }))
}

/// Value must match a DOS style pattern (`*` any run, `?` any character).
pub struct PatternFieldFormat {
    common: FieldCommon,
    pattern: String,
    regex: Regex,
}

impl FieldFormat for PatternFieldFormat {
    fn name(&self) -> &str {
        &self.common.name
    }

    fn is_allowed_to_be_empty(&self) -> bool {
        self.common.is_allowed_to_be_empty
    }

    fn length(&self) -> Option<&Range> {
        self.common.length.as_ref()
    }

    fn validate_value(&self, item: &str) -> Result<FieldValue, FieldValueError> {
        if self.regex.is_match(item) {
            Ok(FieldValue::Text(item.to_string()))
        } else {
            Err(FieldValueError::NoPatternMatch {
                value: item.to_string(),
                pattern: self.pattern.clone(),
            })
        }
    }
}

pub(crate) fn new_pattern(
    common: FieldCommon,
    rule: &str,
    _format: &DataFormat,
) -> Result<Box<dyn FieldFormat>, SchemaError> {
    let pattern = rule.trim();
    if pattern.is_empty() {
        return Err(SchemaError::BadFieldRule {
            name: common.name,
            reason: "pattern field must declare a pattern".to_string(),
        });
    }
    let mut translated = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');
    let regex = Regex::new(&translated).map_err(|error| SchemaError::BadFieldRule {
        name: common.name.clone(),
        reason: error.to_string(),
    })?;
    Ok(Box::new(PatternFieldFormat {
        common,
        pattern: pattern.to_string(),
        regex,
    }))
}

/// Value must match a regular expression.
pub struct RegexFieldFormat {
    common: FieldCommon,
    pattern: String,
    regex: Regex,
}

impl FieldFormat for RegexFieldFormat {
    fn name(&self) -> &str {
        &self.common.name
    }

    fn is_allowed_to_be_empty(&self) -> bool {
        self.common.is_allowed_to_be_empty
    }

    fn length(&self) -> Option<&Range> {
        self.common.length.as_ref()
    }

    fn validate_value(&self, item: &str) -> Result<FieldValue, FieldValueError> {
        if self.regex.is_match(item) {
            Ok(FieldValue::Text(item.to_string()))
        } else {
            Err(FieldValueError::NoPatternMatch {
                value: item.to_string(),
                pattern: self.pattern.clone(),
            })
        }
    }
}

pub(crate) fn new_regex(
    common: FieldCommon,
    rule: &str,
    _format: &DataFormat,
) -> Result<Box<dyn FieldFormat>, SchemaError> {
    let pattern = rule.trim();
    let regex = Regex::new(pattern).map_err(|error| SchemaError::BadFieldRule {
        name: common.name.clone(),
        reason: error.to_string(),
    })?;
    Ok(Box::new(RegexFieldFormat {
        common,
        pattern: pattern.to_string(),
        regex,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use icd_model::FormatKind;

    fn common() -> FieldCommon {
        FieldCommon {
            name: "gender".to_string(),
            is_allowed_to_be_empty: false,
            length: None,
        }
    }

    fn delimited() -> DataFormat {
        DataFormat::new(FormatKind::Delimited)
    }

    #[test]
    fn choice_membership() {
        let field = new_choice(common(), "female, male, other", &delimited()).expect("field");
        assert!(field.validate("male").is_ok());
        assert!(matches!(
            field.validate("unknown"),
            Err(FieldValueError::NotInChoices { .. })
        ));
        // Case sensitive, as declared.
        assert!(field.validate("Male").is_err());
    }

    #[test]
    fn choice_requires_values() {
        assert!(matches!(
            new_choice(common(), "  ", &delimited()),
            Err(SchemaError::BadFieldRule { .. })
        ));
    }

    #[test]
    fn dos_pattern_matches() {
        let field = new_pattern(common(), "AB*12?", &delimited()).expect("field");
        assert!(field.validate("ABxyz123").is_ok());
        assert!(field.validate("AB12x").is_ok());
        assert!(field.validate("XY123").is_err());
        // Anchored: no partial match.
        assert!(field.validate("AB123 and more").is_err());
    }

    #[test]
    fn regex_matches_and_bad_regex_fails_fast() {
        let field = new_regex(common(), r"[0-9]{5}", &delimited()).expect("field");
        assert!(field.validate("38000").is_ok());
        assert!(field.validate("380").is_err());
        assert!(matches!(
            new_regex(common(), "[unclosed", &delimited()),
            Err(SchemaError::BadFieldRule { .. })
        ));
    }
}
