pub mod cli;
pub mod rules;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::{EtlError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_output_formats, validate_path, validate_positive_number, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "hr-etl")]
#[command(about = "Validate and clean HR employee records against a rule set")]
pub struct CliConfig {
    #[arg(long, default_value = "employees.csv")]
    pub input: String,

    #[arg(long, default_value = "config.json", help = "Rules file (.json or .toml)")]
    pub rules: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_values = ["csv", "json"])]
    pub formats: Vec<String>,

    #[arg(long, default_value = ",", help = "Single-byte column delimiter of the input file")]
    pub delimiter: char,

    #[arg(long)]
    pub max_records: Option<usize>,

    #[arg(long, help = "Also bundle every output file into this zip archive")]
    pub zip: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Load and check the rules, then stop")]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn delimiter(&self) -> u8 {
        // validate() 已保證為單一位元組
        self.delimiter as u8
    }

    fn max_records(&self) -> Option<usize> {
        self.max_records
    }

    fn archive_name(&self) -> Option<&str> {
        self.zip.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_path("rules", &self.rules)?;
        validate_path("output_path", &self.output_path)?;
        validate_output_formats("formats", &self.formats, crate::core::report::SUPPORTED_FORMATS)?;

        if !self.delimiter.is_ascii() {
            return Err(EtlError::InvalidConfigValueError {
                field: "delimiter".to_string(),
                value: self.delimiter.to_string(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            });
        }
        if let Some(max) = self.max_records {
            validate_positive_number("max_records", max, 1)?;
        }
        if let Some(zip) = &self.zip {
            validate_path("zip", zip)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CliConfig::parse_from(["hr-etl"]);
        assert_eq!(config.input, "employees.csv");
        assert_eq!(config.rules, "config.json");
        assert_eq!(config.formats, vec!["csv", "json"]);
        assert_eq!(ConfigProvider::delimiter(&config), b',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_format_and_wide_delimiter() {
        let config = CliConfig::parse_from(["hr-etl", "--formats", "csv,xml"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["hr-etl", "--delimiter", "§"]);
        assert!(config.validate().is_err());
    }
}
