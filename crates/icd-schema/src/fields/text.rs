//! Plain text field formats.

use icd_model::{DataFormat, FieldValue, Range};

use crate::error::{FieldValueError, SchemaError};
use crate::fields::{FieldCommon, FieldFormat};

/// Accepts any content within the declared length range.
pub struct TextFieldFormat {
    common: FieldCommon,
}

impl FieldFormat for TextFieldFormat {
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
        Ok(FieldValue::Text(item.to_string()))
    }
}

pub(crate) fn new_text(
    common: FieldCommon,
    _rule: &str,
    _format: &DataFormat,
) -> Result<Box<dyn FieldFormat>, SchemaError> {
    Ok(Box::new(TextFieldFormat { common }))
}

/// Passthrough format: any content, no length constraint applied.
pub struct UntouchedFieldFormat {
    common: FieldCommon,
}

impl FieldFormat for UntouchedFieldFormat {
    fn name(&self) -> &str {
        &self.common.name
    }

    fn is_allowed_to_be_empty(&self) -> bool {
        self.common.is_allowed_to_be_empty
    }

    fn length(&self) -> Option<&Range> {
        None
    }

    fn validate_value(&self, item: &str) -> Result<FieldValue, FieldValueError> {
        Ok(FieldValue::Text(item.to_string()))
    }
}

pub(crate) fn new_untouched(
    common: FieldCommon,
    _rule: &str,
    _format: &DataFormat,
) -> Result<Box<dyn FieldFormat>, SchemaError> {
    Ok(Box::new(UntouchedFieldFormat { common }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_field(length: Option<&str>, allow_empty: bool) -> Box<dyn FieldFormat> {
        let common = FieldCommon {
            name: "comment".to_string(),
            is_allowed_to_be_empty: allow_empty,
            length: length.map(|text| Range::new(text).expect("length range")),
        };
        Box::new(TextFieldFormat { common })
    }

    #[test]
    fn accepts_any_content() {
        let field = text_field(None, false);
        assert_eq!(
            field.validate("hello").expect("validate"),
            FieldValue::Text("hello".to_string())
        );
    }

    #[test]
    fn empty_rules() {
        let strict = text_field(None, false);
        assert!(matches!(
            strict.validate_empty(""),
            Err(FieldValueError::MustNotBeEmpty)
        ));
        let relaxed = text_field(None, true);
        assert!(relaxed.validate_empty("").is_ok());
        assert_eq!(relaxed.validate("").expect("validate"), FieldValue::Absent);
    }

    #[test]
    fn length_range_is_enforced() {
        let field = text_field(Some("2:4"), false);
        assert!(field.validate_length("abc").is_ok());
        assert!(matches!(
            field.validate_length("a"),
            Err(FieldValueError::Length(_))
        ));
        assert!(matches!(
            field.validate_length("abcde"),
            Err(FieldValueError::Length(_))
        ));
        // An empty item is the empty check's concern, not the length's.
        assert!(field.validate_length("").is_ok());
    }

    #[test]
    fn untouched_ignores_length() {
        let common = FieldCommon {
            name: "blob".to_string(),
            is_allowed_to_be_empty: true,
            length: Some(Range::new("1:2").expect("range")),
        };
        let field = UntouchedFieldFormat { common };
        assert!(field.validate_length("way too long for the range").is_ok());
    }
}
