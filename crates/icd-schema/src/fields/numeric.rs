//! Integer and decimal field formats.

use icd_model::{DataFormat, FieldValue, Range};

use crate::error::{FieldValueError, SchemaError};
use crate::fields::{FieldCommon, FieldFormat};

/// Whole number, optionally constrained to a value range by the rule.
pub struct IntegerFieldFormat {
    common: FieldCommon,
    value_range: Option<Range>,
    thousands_separator: Option<char>,
}

impl FieldFormat for IntegerFieldFormat {
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
        let cleaned = strip_separator(item, self.thousands_separator);
        let value = cleaned
            .parse::<i64>()
            .map_err(|_| FieldValueError::NotAnInteger {
                value: item.to_string(),
            })?;
        if let Some(range) = &self.value_range {
            range
                .validate(&self.common.name, value)
                .map_err(FieldValueError::IntegerOutOfRange)?;
        }
        Ok(FieldValue::Integer(value))
    }
}

pub(crate) fn new_integer(
    common: FieldCommon,
    rule: &str,
    format: &DataFormat,
) -> Result<Box<dyn FieldFormat>, SchemaError> {
    let value_range = if rule.trim().is_empty() {
        None
    } else {
        Some(Range::new(rule).map_err(|error| SchemaError::BadFieldRule {
            name: common.name.clone(),
            reason: error.to_string(),
        })?)
    };
    Ok(Box::new(IntegerFieldFormat {
        common,
        value_range,
        thousands_separator: format.thousands_separator(),
    }))
}

/// Decimal number using the data format's declared separators.
pub struct DecimalFieldFormat {
    common: FieldCommon,
    decimal_separator: char,
    thousands_separator: Option<char>,
}

impl FieldFormat for DecimalFieldFormat {
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
        let not_a_decimal = || FieldValueError::NotADecimal {
            value: item.to_string(),
        };
        let mut cleaned = strip_separator(item, self.thousands_separator);
        if self.decimal_separator != '.' {
            // A plain point would now be ambiguous; reject it.
            if cleaned.contains('.') {
                return Err(not_a_decimal());
            }
            cleaned = cleaned.replace(self.decimal_separator, ".");
        }
        // Keep scientific notation and non finite spellings out; data
        // files declare plain decimal notation.
        if cleaned
            .chars()
            .any(|ch| !ch.is_ascii_digit() && ch != '.' && ch != '-' && ch != '+')
        {
            return Err(not_a_decimal());
        }
        let value = cleaned.parse::<f64>().map_err(|_| not_a_decimal())?;
        if !value.is_finite() {
            return Err(not_a_decimal());
        }
        Ok(FieldValue::Decimal(value))
    }
}

pub(crate) fn new_decimal(
    common: FieldCommon,
    _rule: &str,
    format: &DataFormat,
) -> Result<Box<dyn FieldFormat>, SchemaError> {
    Ok(Box::new(DecimalFieldFormat {
        common,
        decimal_separator: format.decimal_separator(),
        thousands_separator: format.thousands_separator(),
    }))
}

fn strip_separator(item: &str, separator: Option<char>) -> String {
    match separator {
        Some(separator) => item.chars().filter(|ch| *ch != separator).collect(),
        None => item.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icd_model::FormatKind;

    fn common(name: &str) -> FieldCommon {
        FieldCommon {
            name: name.to_string(),
            is_allowed_to_be_empty: false,
            length: None,
        }
    }

    fn delimited() -> DataFormat {
        DataFormat::new(FormatKind::Delimited)
    }

    #[test]
    fn integer_parses_and_ranges() {
        let field = new_integer(common("branch_id"), "1:99999", &delimited()).expect("field");
        assert_eq!(
            field.validate("38000").expect("validate"),
            FieldValue::Integer(38000)
        );
        assert!(matches!(
            field.validate("0"),
            Err(FieldValueError::IntegerOutOfRange(_))
        ));
        assert!(matches!(
            field.validate("abc"),
            Err(FieldValueError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn integer_honours_thousands_separator() {
        let mut format = delimited();
        format.set("thousands separator", ",").expect("set");
        let field = new_integer(common("amount"), "", &format).expect("field");
        assert_eq!(
            field.validate("38,000").expect("validate"),
            FieldValue::Integer(38000)
        );
    }

    #[test]
    fn integer_rule_must_be_a_range() {
        assert!(matches!(
            new_integer(common("n"), "low:high", &delimited()),
            Err(SchemaError::BadFieldRule { .. })
        ));
    }

    #[test]
    fn decimal_parses_with_declared_separators() {
        let mut format = delimited();
        format.set("decimal separator", ",").expect("set");
        format.set("thousands separator", ".").expect("set");
        let field = new_decimal(common("amount"), "", &format).expect("field");
        assert_eq!(
            field.validate("1.234,5").expect("validate"),
            FieldValue::Decimal(1234.5)
        );
    }

    #[test]
    fn decimal_rejects_garbage() {
        let field = new_decimal(common("amount"), "", &delimited()).expect("field");
        assert_eq!(
            field.validate("17.5").expect("validate"),
            FieldValue::Decimal(17.5)
        );
        for bad in ["abc", "1e5", "inf", "nan", "1.2.3"] {
            assert!(
                matches!(field.validate(bad), Err(FieldValueError::NotADecimal { .. })),
                "{bad} must not validate"
            );
        }
    }
}
