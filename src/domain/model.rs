use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const FIELD_ID: &str = "id";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PHONE: &str = "phone";
pub const FIELD_SALARY: &str = "salary";
pub const FIELD_HIRE_DATE: &str = "hire_date";

/// 欄位檢查順序固定，稽核輸出的錯誤順序依此決定
pub const EVALUATION_ORDER: [&str; 5] = [FIELD_ID, FIELD_EMAIL, FIELD_PHONE, FIELD_SALARY, FIELD_HIRE_DATE];

/// One input row: field name to raw text, in source column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    /// Builds a record from (name, value) pairs. A repeated name keeps its first
    /// position and takes the later value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: Vec<(String, String)> = Vec::new();
        for (name, value) in pairs {
            let name = name.into();
            let value = value.into();
            match fields.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => fields.push((name, value)),
            }
        }
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CleanValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl fmt::Display for CleanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanValue::Text(text) => f.write_str(text),
            CleanValue::Number(value) => write!(f, "{}", value),
            CleanValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// A fully validated row with canonical typed values, in source column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    fields: Vec<(String, CleanValue)>,
}

impl CleanRecord {
    pub(crate) fn new(fields: Vec<(String, CleanValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&CleanValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &CleanValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn id(&self) -> Option<&str> {
        match self.get(FIELD_ID) {
            Some(CleanValue::Text(id)) => Some(id),
            _ => None,
        }
    }

    pub fn salary(&self) -> Option<f64> {
        match self.get(FIELD_SALARY) {
            Some(CleanValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn hire_date(&self) -> Option<NaiveDate> {
        match self.get(FIELD_HIRE_DATE) {
            Some(CleanValue::Date(date)) => Some(*date),
            _ => None,
        }
    }
}

impl Serialize for CleanRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Min,
    Max,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Min => f.write_str("min"),
            Bound::Max => f.write_str("max"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ErrorKind {
    UnparsableSalary,
    SalaryBoundsError { violated_bound: Bound },
    FormatMismatch,
    InvalidCalendarDate,
    IdFormatError,
    EmailFormatError,
    PhoneLengthError,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnparsableSalary => "unparsable_salary",
            ErrorKind::SalaryBoundsError { .. } => "salary_bounds_error",
            ErrorKind::FormatMismatch => "format_mismatch",
            ErrorKind::InvalidCalendarDate => "invalid_calendar_date",
            ErrorKind::IdFormatError => "id_format_error",
            ErrorKind::EmailFormatError => "email_format_error",
            ErrorKind::PhoneLengthError => "phone_length_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SalaryBoundsError { violated_bound } => {
                write!(f, "{}:{}", self.code(), violated_bound)
            }
            _ => f.write_str(self.code()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub raw_value: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowStatus {
    Accepted(CleanRecord),
    Rejected(Vec<FieldError>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowVerdict {
    pub row_index: usize,
    pub status: RowStatus,
}

impl RowVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, RowStatus::Accepted(_))
    }

    pub fn errors(&self) -> &[FieldError] {
        match &self.status {
            RowStatus::Accepted(_) => &[],
            RowStatus::Rejected(errors) => errors,
        }
    }
}

/// `row_index` is the 0-based position of the data row, header excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedRow {
    pub row_index: usize,
    pub record: CleanRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub row_index: usize,
    pub employee_id: Option<String>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub total_errors: usize,
    pub field_error_counts: BTreeMap<String, usize>,
    pub kind_error_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub accepted: Vec<AcceptedRow>,
    pub rejected: Vec<RejectedRow>,
    pub summary: RunSummary,
}
