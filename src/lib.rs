pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{LocalStorage, RunConfig};

pub use crate::adapters::{console::ConsolePrompt, inputs::RunInputs, reference::ReferenceTable};
pub use crate::core::engine::{QuantEngine, RunOutcome};
pub use crate::domain::layout::{Delimiter, FileLayout};
pub use crate::domain::model::{
    AnalysisReport, CalibrationPoint, DilutionFactor, LinearModel, QuantifiedSample, SampleRecord,
};
pub use crate::utils::error::{QuantError, Result};
