use crate::config::rules::RuleConfiguration;
use crate::core::evaluator::RowEvaluator;
use crate::core::rules::RuleSet;
use crate::domain::model::{
    AcceptedRow, RawRecord, RejectedRow, RowStatus, RunSummary, ValidationOutcome, FIELD_ID,
};
use crate::utils::error::Result;

/// Evaluates every row against one [`RuleSet`] and partitions the results.
///
/// Holds no per-run state; each call to [`ValidationRunner::run`] starts from zero.
#[derive(Debug, Clone)]
pub struct ValidationRunner {
    rules: RuleSet,
}

impl ValidationRunner {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Fails before any row is read when the configuration is broken.
    pub fn from_config(config: &RuleConfiguration) -> Result<Self> {
        Ok(Self::new(RuleSet::compile(config)?))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn run(&self, rows: &[RawRecord]) -> ValidationOutcome {
        let evaluator = RowEvaluator::new(&self.rules);
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        let mut summary = RunSummary {
            total_rows: rows.len(),
            ..Default::default()
        };

        for (row_index, record) in rows.iter().enumerate() {
            let verdict = evaluator.evaluate(row_index, record);

            match verdict.status {
                RowStatus::Accepted(clean) => {
                    summary.accepted_count += 1;
                    accepted.push(AcceptedRow {
                        row_index,
                        record: clean,
                    });
                }
                RowStatus::Rejected(errors) => {
                    summary.rejected_count += 1;
                    summary.total_errors += errors.len();

                    for error in &errors {
                        tracing::warn!(
                            row_index,
                            field = %error.field,
                            kind = %error.kind,
                            "{}",
                            error.message
                        );
                        *summary.field_error_counts.entry(error.field.clone()).or_default() += 1;
                        *summary
                            .kind_error_counts
                            .entry(error.kind.code().to_string())
                            .or_default() += 1;
                    }

                    let employee_id = record
                        .get(FIELD_ID)
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string);

                    rejected.push(RejectedRow {
                        row_index,
                        employee_id,
                        errors,
                    });
                }
            }
        }

        tracing::info!(
            "Validated {} rows: {} accepted, {} rejected ({} field errors)",
            summary.total_rows,
            summary.accepted_count,
            summary.rejected_count,
            summary.total_errors
        );

        ValidationOutcome {
            accepted,
            rejected,
            summary,
        }
    }
}

/// One-shot helper: compile `config`, then validate `rows`.
pub fn run(rows: &[RawRecord], config: &RuleConfiguration) -> Result<ValidationOutcome> {
    let runner = ValidationRunner::from_config(config)?;
    Ok(runner.run(rows))
}
