//! The loaded ICD: data format, ordered field formats, and checks.

use icd_model::DataFormat;

use crate::checks::Check;
use crate::fields::FieldFormat;

/// A loaded Interface Control Document.
///
/// The data format and field formats are read only for the ICD's lifetime
/// and shared by every run against it. The checks carry per run state;
/// the validation engine resets them at the start of each run, and one
/// `Icd` serves one run at a time.
pub struct Icd {
    data_format: DataFormat,
    field_names: Vec<String>,
    fields: Vec<Box<dyn FieldFormat>>,
    checks: Vec<Box<dyn Check>>,
}

impl std::fmt::Debug for Icd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Icd")
            .field("data_format", &self.data_format)
            .field("field_names", &self.field_names)
            .field("fields", &self.fields.len())
            .field("checks", &self.checks.len())
            .finish()
    }
}

impl Icd {
    pub(crate) fn new(
        data_format: DataFormat,
        field_names: Vec<String>,
        fields: Vec<Box<dyn FieldFormat>>,
        checks: Vec<Box<dyn Check>>,
    ) -> Self {
        Self {
            data_format,
            field_names,
            fields,
            checks,
        }
    }

    pub fn data_format(&self) -> &DataFormat {
        &self.data_format
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn fields(&self) -> &[Box<dyn FieldFormat>] {
        &self.fields
    }

    pub fn checks(&self) -> &[Box<dyn Check>] {
        &self.checks
    }

    pub fn checks_mut(&mut self) -> &mut [Box<dyn Check>] {
        &mut self.checks
    }

    /// Exact field widths for fixed width data. The loader guarantees
    /// every field of a fixed width ICD declares one.
    pub fn fixed_widths(&self) -> Vec<usize> {
        self.fields
            .iter()
            .filter_map(|field| field.length().and_then(|range| range.exact_width()))
            .collect()
    }
}
