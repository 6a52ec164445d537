use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct EtlReport {
    pub output_path: String,
    pub summary: RunSummary,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<EtlReport> {
        tracing::info!("Starting validation run...");

        // Extract
        let raw_rows = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", raw_rows.len());

        // Transform
        let outcome = self.pipeline.transform(raw_rows).await?;
        tracing::info!(
            "Validated {} records: {} accepted, {} rejected",
            outcome.summary.total_rows,
            outcome.summary.accepted_count,
            outcome.summary.rejected_count
        );

        // Load
        let output_path = self.pipeline.load(&outcome).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(EtlReport {
            output_path,
            summary: outcome.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rules::RuleConfiguration;
    use crate::core::runner::ValidationRunner;
    use crate::domain::model::{RawRecord, ValidationOutcome};
    use crate::utils::error::EtlError;
    use std::sync::Mutex;

    struct StubPipeline {
        rows: Vec<RawRecord>,
        runner: ValidationRunner,
        fail_load: bool,
        loaded: Mutex<Option<usize>>,
    }

    impl StubPipeline {
        fn new(rows: Vec<RawRecord>, fail_load: bool) -> Self {
            Self {
                rows,
                runner: ValidationRunner::from_config(&RuleConfiguration::default()).unwrap(),
                fail_load,
                loaded: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<Vec<RawRecord>> {
            Ok(self.rows.clone())
        }

        async fn transform(&self, rows: Vec<RawRecord>) -> Result<ValidationOutcome> {
            Ok(self.runner.run(&rows))
        }

        async fn load(&self, outcome: &ValidationOutcome) -> Result<String> {
            if self.fail_load {
                return Err(EtlError::ProcessingError {
                    message: "disk full".to_string(),
                });
            }
            *self.loaded.lock().unwrap() = Some(outcome.accepted.len());
            Ok("stub-output".to_string())
        }
    }

    fn rows() -> Vec<RawRecord> {
        vec![
            RawRecord::from_pairs([("id", "A1"), ("email", "a@corp.com"), ("salary", "50k")]),
            RawRecord::from_pairs([("id", "B2"), ("email", "broken"), ("salary", "50k")]),
        ]
    }

    #[test]
    fn test_engine_runs_all_stages() {
        let engine = EtlEngine::new(StubPipeline::new(rows(), false));
        let report = tokio_test::block_on(engine.run()).unwrap();

        assert_eq!(report.output_path, "stub-output");
        assert_eq!(report.summary.total_rows, 2);
        assert_eq!(report.summary.accepted_count, 1);
        assert_eq!(*engine.pipeline.loaded.lock().unwrap(), Some(1));
    }

    #[test]
    fn test_engine_propagates_load_failure() {
        let engine = EtlEngine::new(StubPipeline::new(rows(), true));
        let err = tokio_test::block_on(engine.run()).unwrap_err();
        assert!(matches!(err, EtlError::ProcessingError { .. }));
    }
}
