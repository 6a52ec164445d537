use crate::domain::model::{RawRecord, ValidationOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];

    fn delimiter(&self) -> u8 {
        b','
    }

    fn field_mapping(&self) -> Option<&HashMap<String, String>> {
        None
    }

    fn max_records(&self) -> Option<usize> {
        None
    }

    /// 啟用壓縮時回傳 zip 檔名
    fn archive_name(&self) -> Option<&str> {
        None
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRecord>>;
    async fn transform(&self, rows: Vec<RawRecord>) -> Result<ValidationOutcome>;
    async fn load(&self, outcome: &ValidationOutcome) -> Result<String>;
}
