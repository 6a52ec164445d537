use crate::core::analytics::{analyze, WorkforceAnalytics};
use crate::core::report::{
    bundle_zip, render_clean_csv, render_clean_json, AuditFormat, CLEAN_BASENAME,
};
use crate::core::runner::ValidationRunner;
use crate::core::source::read_raw_records;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{RawRecord, RunSummary, ValidationOutcome};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

const TOP_EARNERS: usize = 5;
pub const SUMMARY_FILE: &str = "run_summary.json";

#[derive(Serialize)]
struct RunReport<'a> {
    generated_at: String,
    summary: &'a RunSummary,
    analytics: WorkforceAnalytics,
}

/// 員工資料驗證管道：讀取 → 驗證 → 輸出乾淨資料與稽核紀錄
pub struct HrPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    runner: ValidationRunner,
    run_started: DateTime<Utc>,
}

impl<S: Storage, C: ConfigProvider> HrPipeline<S, C> {
    pub fn new(storage: S, config: C, runner: ValidationRunner) -> Self {
        Self {
            storage,
            config,
            runner,
            run_started: Utc::now(),
        }
    }

    /// 固定執行時間，輸出內容即可逐位元組比對
    pub fn with_run_timestamp(mut self, run_started: DateTime<Utc>) -> Self {
        self.run_started = run_started;
        self
    }

    fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), name)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HrPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        tracing::info!("📥 Reading records from: {}", self.config.input_path());

        let data = self.storage.read_file(self.config.input_path()).await?;
        let mut records = read_raw_records(&data, self.config.delimiter(), self.config.field_mapping())?;

        if let Some(max) = self.config.max_records() {
            if records.len() > max {
                tracing::info!("Limiting input to the first {} of {} records", max, records.len());
                records.truncate(max);
            }
        }

        tracing::debug!("Extracted {} raw records", records.len());
        Ok(records)
    }

    async fn transform(&self, rows: Vec<RawRecord>) -> Result<ValidationOutcome> {
        Ok(self.runner.run(&rows))
    }

    async fn load(&self, outcome: &ValidationOutcome) -> Result<String> {
        let mut written: Vec<(String, Vec<u8>)> = Vec::new();

        written.push((format!("{}.csv", CLEAN_BASENAME), render_clean_csv(&outcome.accepted)?));
        written.push((format!("{}.json", CLEAN_BASENAME), render_clean_json(&outcome.accepted)?));

        let mut formats: Vec<AuditFormat> = Vec::new();
        for format in self.config.output_formats() {
            let format: AuditFormat = format.parse()?;
            if formats.contains(&format) {
                tracing::warn!("Audit format {:?} requested more than once; writing it once", format);
                continue;
            }
            formats.push(format);
        }

        for format in formats {
            let data = format.render(&outcome.rejected, self.run_started)?;
            written.push((format.file_name(), data));
        }

        let report = RunReport {
            generated_at: self.run_started.to_rfc3339(),
            summary: &outcome.summary,
            analytics: analyze(&outcome.accepted, self.run_started.date_naive(), TOP_EARNERS),
        };
        written.push((SUMMARY_FILE.to_string(), serde_json::to_vec_pretty(&report)?));

        for (name, data) in &written {
            tracing::debug!("Writing {} ({} bytes)", name, data.len());
            self.storage.write_file(&self.output_file(name), data).await?;
        }

        if let Some(archive) = self.config.archive_name() {
            let zip_data = bundle_zip(&written)?;
            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(&self.output_file(archive), &zip_data).await?;
        }

        if outcome.rejected.is_empty() {
            tracing::info!("Report: 0 errors recorded. Data is clean!");
        } else {
            tracing::info!(
                "Audit trail written: {} rejected rows, {} errors",
                outcome.summary.rejected_count,
                outcome.summary.total_errors
            );
        }

        Ok(self.config.output_path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rules::{DateRules, IdRules, PhoneRules, RuleConfiguration, SalaryRules};
    use crate::utils::error::EtlError;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        output_formats: Vec<String>,
        archive: Option<String>,
        max_records: Option<usize>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                output_formats: vec!["csv".to_string(), "json".to_string()],
                archive: None,
                max_records: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "employees.csv"
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn output_formats(&self) -> &[String] {
            &self.output_formats
        }

        fn max_records(&self) -> Option<usize> {
            self.max_records
        }

        fn archive_name(&self) -> Option<&str> {
            self.archive.as_deref()
        }
    }

    const EMPLOYEES: &str = "id,name,email,phone,salary,hire_date
EMP0001,Ann,ann@corp.com,555-0001,\"$85,000\",2020-01-06
SHORT,Bo,bademail.com,555-0002,70000,2021-05-01
EMP0003,Cy,cy@corp.com,555-0003,Seventy-K,2022-07-19
EMP0004,Dee,dee@corp.com,12345,ABC,12/25/2023
";

    fn runner() -> ValidationRunner {
        ValidationRunner::from_config(&RuleConfiguration {
            salary_rules: Some(SalaryRules {
                min: 30000.0,
                max: 150000.0,
            }),
            date_rules: Some(DateRules {
                expected_format: "YYYY-MM-DD".to_string(),
            }),
            id_rules: Some(IdRules {
                required_length: Some(7),
                ..Default::default()
            }),
            phone_rules: Some(PhoneRules {
                required_digit_count: 7,
            }),
            number_words: None,
        })
        .unwrap()
    }

    async fn pipeline_with(config: MockConfig) -> (HrPipeline<MockStorage, MockConfig>, MockStorage) {
        let storage = MockStorage::new();
        storage.put("employees.csv", EMPLOYEES.as_bytes()).await;
        let pipeline = HrPipeline::new(storage.clone(), config, runner())
            .with_run_timestamp(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        (pipeline, storage)
    }

    #[tokio::test]
    async fn test_extract_reads_all_rows() {
        let (pipeline, _) = pipeline_with(MockConfig::new()).await;
        let rows = pipeline.extract().await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].get("salary"), Some("Seventy-K"));
    }

    #[tokio::test]
    async fn test_extract_respects_max_records() {
        let mut config = MockConfig::new();
        config.max_records = Some(2);
        let (pipeline, _) = pipeline_with(config).await;
        assert_eq!(pipeline.extract().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_extract_missing_input_fails() {
        let pipeline = HrPipeline::new(MockStorage::new(), MockConfig::new(), runner());
        assert!(pipeline.extract().await.is_err());
    }

    #[tokio::test]
    async fn test_full_run_writes_clean_and_audit_files() {
        let (pipeline, storage) = pipeline_with(MockConfig::new()).await;
        let rows = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(rows).await.unwrap();
        let output = pipeline.load(&outcome).await.unwrap();

        assert_eq!(output, "out");
        assert_eq!(outcome.summary.accepted_count, 2);
        assert_eq!(outcome.summary.rejected_count, 2);

        let clean = String::from_utf8(storage.get_file("out/clean_employees.csv").await.unwrap()).unwrap();
        let clean_lines: Vec<&str> = clean.lines().collect();
        assert_eq!(clean_lines[0], "row_index,id,name,email,phone,salary,hire_date");
        assert_eq!(clean_lines[1], "0,EMP0001,Ann,ann@corp.com,5550001,85000,2020-01-06");
        assert_eq!(clean_lines[2], "2,EMP0003,Cy,cy@corp.com,5550003,70000,2022-07-19");

        let audit = String::from_utf8(storage.get_file("out/validation_errors.csv").await.unwrap()).unwrap();
        assert_eq!(audit.lines().count(), 1 + 2 + 3);

        assert!(storage.get_file("out/validation_errors.json").await.is_some());
        assert!(storage.get_file("out/validation_errors.tsv").await.is_none());

        let summary: serde_json::Value =
            serde_json::from_slice(&storage.get_file("out/run_summary.json").await.unwrap()).unwrap();
        assert_eq!(summary["summary"]["total_rows"], 4);
        assert_eq!(summary["analytics"]["average_salary"], 77500.0);
        assert_eq!(summary["analytics"]["top_earners"][0]["employee_id"], "EMP0001");
    }

    #[tokio::test]
    async fn test_load_with_archive() {
        let mut config = MockConfig::new();
        config.archive = Some("audit_bundle.zip".to_string());
        let (pipeline, storage) = pipeline_with(config).await;

        let rows = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(rows).await.unwrap();
        pipeline.load(&outcome).await.unwrap();

        let zip_data = storage.get_file("out/audit_bundle.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "clean_employees.csv",
                "clean_employees.json",
                "run_summary.json",
                "validation_errors.csv",
                "validation_errors.json",
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_format_written_once_into_archive() {
        let mut config = MockConfig::new();
        config.output_formats = vec!["csv".to_string(), "CSV".to_string()];
        config.archive = Some("audit_bundle.zip".to_string());
        let (pipeline, storage) = pipeline_with(config).await;

        let rows = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(rows).await.unwrap();
        pipeline.load(&outcome).await.unwrap();

        let zip_data = storage.get_file("out/audit_bundle.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let audits = archive.file_names().filter(|name| name.starts_with("validation_errors")).count();
        assert_eq!(audits, 1);
    }

    #[cfg(feature = "parquet")]
    #[tokio::test]
    async fn test_parquet_audit_is_bundled() {
        let mut config = MockConfig::new();
        config.output_formats = vec!["csv".to_string(), "parquet".to_string()];
        config.archive = Some("audit_bundle.zip".to_string());
        let (pipeline, storage) = pipeline_with(config).await;

        let rows = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(rows).await.unwrap();
        pipeline.load(&outcome).await.unwrap();

        let parquet = storage.get_file("out/validation_errors.parquet").await.unwrap();
        assert_eq!(&parquet[..4], b"PAR1");

        let zip_data = storage.get_file("out/audit_bundle.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert!(archive.file_names().any(|name| name == "validation_errors.parquet"));
    }

    #[tokio::test]
    async fn test_unknown_format_fails_load() {
        let mut config = MockConfig::new();
        config.output_formats = vec!["xml".to_string()];
        let (pipeline, _) = pipeline_with(config).await;

        let outcome = pipeline.transform(vec![]).await.unwrap();
        assert!(pipeline.load(&outcome).await.is_err());
    }

    #[tokio::test]
    async fn test_repeated_loads_are_byte_identical() {
        let (pipeline, storage) = pipeline_with(MockConfig::new()).await;
        let rows = pipeline.extract().await.unwrap();

        let outcome = pipeline.transform(rows.clone()).await.unwrap();
        pipeline.load(&outcome).await.unwrap();
        let first = storage.get_file("out/validation_errors.json").await.unwrap();

        let outcome = pipeline.transform(rows).await.unwrap();
        pipeline.load(&outcome).await.unwrap();
        let second = storage.get_file("out/validation_errors.json").await.unwrap();

        assert_eq!(first, second);
    }
}
