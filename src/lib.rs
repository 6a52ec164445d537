pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalStorage, rules::RuleConfiguration, toml_config::TomlConfig};
pub use crate::core::{
    etl::{EtlEngine, EtlReport},
    pipeline::HrPipeline,
    rules::RuleSet,
    runner::{run, ValidationRunner},
};
pub use crate::domain::model::{
    AcceptedRow, Bound, CleanRecord, CleanValue, ErrorKind, FieldError, RawRecord, RejectedRow, RowStatus,
    RowVerdict, RunSummary, ValidationOutcome,
};
pub use crate::utils::error::{EtlError, Result};
