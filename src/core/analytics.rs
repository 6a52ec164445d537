use crate::domain::model::AcceptedRow;
use chrono::NaiveDate;
use serde::Serialize;

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Earner {
    pub row_index: usize,
    pub employee_id: String,
    pub salary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkforceAnalytics {
    pub as_of: NaiveDate,
    pub accepted_records: usize,
    pub average_salary: Option<f64>,
    pub top_earners: Vec<Earner>,
    pub average_tenure_years: Option<f64>,
}

pub fn average_salary(rows: &[AcceptedRow]) -> Option<f64> {
    let salaries: Vec<f64> = rows.iter().filter_map(|row| row.record.salary()).collect();
    if salaries.is_empty() {
        return None;
    }
    Some(salaries.iter().sum::<f64>() / salaries.len() as f64)
}

/// Highest salaries first; equal salaries keep input order.
pub fn top_earners(rows: &[AcceptedRow], limit: usize) -> Vec<Earner> {
    let mut earners: Vec<Earner> = rows
        .iter()
        .filter_map(|row| {
            row.record.salary().map(|salary| Earner {
                row_index: row.row_index,
                employee_id: row.record.id().unwrap_or_default().to_string(),
                salary,
            })
        })
        .collect();

    earners.sort_by(|a, b| {
        b.salary
            .total_cmp(&a.salary)
            .then_with(|| a.row_index.cmp(&b.row_index))
    });
    earners.truncate(limit);
    earners
}

/// Hire dates after `as_of` are left out.
pub fn average_tenure_years(rows: &[AcceptedRow], as_of: NaiveDate) -> Option<f64> {
    let tenures: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.record.hire_date())
        .filter(|hired| *hired <= as_of)
        .map(|hired| (as_of - hired).num_days() as f64 / DAYS_PER_YEAR)
        .collect();

    if tenures.is_empty() {
        return None;
    }
    Some(tenures.iter().sum::<f64>() / tenures.len() as f64)
}

pub fn analyze(rows: &[AcceptedRow], as_of: NaiveDate, top_n: usize) -> WorkforceAnalytics {
    WorkforceAnalytics {
        as_of,
        accepted_records: rows.len(),
        average_salary: average_salary(rows),
        top_earners: top_earners(rows, top_n),
        average_tenure_years: average_tenure_years(rows, as_of),
    }
}
