//! Date and time field format.
//!
//! The rule is a human readable pattern using `DD`, `MM`, `YYYY`, `YY`,
//! `hh`, `mm` and `ss` tokens, e.g. `DD.MM.YYYY` or `YYYY-MM-DD hh:mm:ss`.
//! Uppercase `MM` is the month, lowercase `mm` the minute.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use icd_model::{DataFormat, FieldValue, Range};

use crate::error::{FieldValueError, SchemaError};
use crate::fields::{FieldCommon, FieldFormat};

const DEFAULT_PATTERN: &str = "YYYY-MM-DD";

pub struct DateTimeFieldFormat {
    common: FieldCommon,
    pattern: String,
    chrono_format: String,
    has_date: bool,
    has_time: bool,
}

impl DateTimeFieldFormat {
    fn parse(&self, item: &str) -> Option<NaiveDateTime> {
        if self.has_date && self.has_time {
            NaiveDateTime::parse_from_str(item, &self.chrono_format).ok()
        } else if self.has_date {
            NaiveDate::parse_from_str(item, &self.chrono_format)
                .ok()?
                .and_hms_opt(0, 0, 0)
        } else {
            let time = NaiveTime::parse_from_str(item, &self.chrono_format).ok()?;
            Some(NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(time))
        }
    }
}

impl FieldFormat for DateTimeFieldFormat {
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
        self.parse(item)
            .map(FieldValue::DateTime)
            .ok_or_else(|| FieldValueError::NotADateTime {
                value: item.to_string(),
                pattern: self.pattern.clone(),
            })
    }
}

/// Translate a date pattern to a chrono format string, reporting which
/// component families it mentions.
fn translate_pattern(pattern: &str) -> (String, bool, bool) {
    const TOKENS: [(&str, &str, bool); 7] = [
        ("YYYY", "%Y", true),
        ("YY", "%y", true),
        ("DD", "%d", true),
        ("MM", "%m", true),
        ("hh", "%H", false),
        ("mm", "%M", false),
        ("ss", "%S", false),
    ];
    let mut format = String::new();
    let mut has_date = false;
    let mut has_time = false;
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        for (token, replacement, is_date) in TOKENS {
            if rest.starts_with(token) {
                format.push_str(replacement);
                if is_date {
                    has_date = true;
                } else {
                    has_time = true;
                }
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }
        let ch = rest.chars().next().expect("non empty rest");
        if ch == '%' {
            format.push_str("%%");
        } else {
            format.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }
    (format, has_date, has_time)
}

pub(crate) fn new_datetime(
    common: FieldCommon,
    rule: &str,
    _format: &DataFormat,
) -> Result<Box<dyn FieldFormat>, SchemaError> {
    let pattern = if rule.trim().is_empty() {
        DEFAULT_PATTERN.to_string()
    } else {
        rule.trim().to_string()
    };
    let (chrono_format, has_date, has_time) = translate_pattern(&pattern);
    if !has_date && !has_time {
        return Err(SchemaError::BadFieldRule {
            name: common.name,
            reason: format!("date pattern {pattern:?} must contain at least one of DD, MM, YYYY, YY, hh, mm, ss"),
        });
    }
    Ok(Box::new(DateTimeFieldFormat {
        common,
        pattern,
        chrono_format,
        has_date,
        has_time,
    }))
}
