use crate::core::normalize::{normalize_date, normalize_salary, Violation};
use crate::core::rules::RuleSet;
use crate::core::validate::{validate_email, validate_id, validate_phone, validate_salary_bounds};
use crate::domain::model::{
    CleanRecord, CleanValue, FieldError, RawRecord, RowStatus, RowVerdict, FIELD_EMAIL, FIELD_HIRE_DATE,
    FIELD_ID, FIELD_PHONE, FIELD_SALARY,
};
use chrono::NaiveDate;

/// Drives one [`RawRecord`] through every applicable check.
///
/// All checks always run; the row is accepted only when none of them failed.
pub struct RowEvaluator<'a> {
    rules: &'a RuleSet,
}

impl<'a> RowEvaluator<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    pub fn evaluate(&self, row_index: usize, record: &RawRecord) -> RowVerdict {
        // 稽核保留原始儲存格，檢查一律用去除空白後的值
        let cell = |field: &str| record.get(field).unwrap_or("");
        let raw = |field: &str| cell(field).trim();

        // 先做正規化，薪資失敗不影響日期
        let salary = normalize_salary(raw(FIELD_SALARY), self.rules.number_words());
        let hire_date: Option<Result<NaiveDate, Violation>> = self
            .rules
            .date_format()
            .map(|format| normalize_date(raw(FIELD_HIRE_DATE), format));

        let mut errors = Vec::new();
        let mut record_error = |field: &str, violation: Violation| {
            errors.push(FieldError {
                field: field.to_string(),
                raw_value: cell(field).to_string(),
                kind: violation.kind,
                message: violation.message,
            });
        };

        let id = match self.rules.id_rule() {
            Some(rule) => validate_id(raw(FIELD_ID), rule).map(CleanValue::Text),
            None => Ok(CleanValue::Text(raw(FIELD_ID).to_string())),
        };
        let id = id.map_err(|v| record_error(FIELD_ID, v)).ok();

        let email = validate_email(raw(FIELD_EMAIL))
            .map(CleanValue::Text)
            .map_err(|v| record_error(FIELD_EMAIL, v))
            .ok();

        let phone = match self.rules.phone_rule() {
            Some(rule) => validate_phone(raw(FIELD_PHONE), rule).map(CleanValue::Text),
            None => Ok(CleanValue::Text(raw(FIELD_PHONE).to_string())),
        };
        let phone = phone.map_err(|v| record_error(FIELD_PHONE, v)).ok();

        let salary = salary.and_then(|value| match self.rules.salary_bounds() {
            Some(bounds) => validate_salary_bounds(value, bounds),
            None => Ok(value),
        });
        let salary = salary
            .map(CleanValue::Number)
            .map_err(|v| record_error(FIELD_SALARY, v))
            .ok();

        let hire_date = match hire_date {
            Some(result) => result
                .map(CleanValue::Date)
                .map_err(|v| record_error(FIELD_HIRE_DATE, v))
                .ok(),
            None => Some(CleanValue::Text(raw(FIELD_HIRE_DATE).to_string())),
        };

        if !errors.is_empty() {
            return RowVerdict {
                row_index,
                status: RowStatus::Rejected(errors),
            };
        }

        let mut canonical = [
            (FIELD_ID, id),
            (FIELD_EMAIL, email),
            (FIELD_PHONE, phone),
            (FIELD_SALARY, salary),
            (FIELD_HIRE_DATE, hire_date),
        ];

        let fields = record
            .fields()
            .map(|(name, value)| {
                let clean = canonical
                    .iter_mut()
                    .find(|(field, _)| *field == name)
                    .and_then(|(_, slot)| slot.take())
                    .unwrap_or_else(|| CleanValue::Text(value.trim().to_string()));
                (name.to_string(), clean)
            })
            .collect();

        RowVerdict {
            row_index,
            status: RowStatus::Accepted(CleanRecord::new(fields)),
        }
    }
}
