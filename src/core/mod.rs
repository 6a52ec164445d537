pub mod analytics;
pub mod etl;
pub mod evaluator;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod runner;
pub mod source;
pub mod validate;

pub use crate::domain::model::{RawRecord, ValidationOutcome};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
