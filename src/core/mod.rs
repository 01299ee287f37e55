pub mod calibration;
pub mod engine;
pub mod fit;
pub mod parser;
pub mod quantify;
pub mod report;

pub use crate::domain::model::{
    AnalysisReport, CalibrationPoint, DilutionFactor, LinearModel, QuantifiedSample, SampleRecord,
};
pub use crate::domain::ports::{
    ConfigProvider, DilutionPolicy, ReferenceSource, ReportWriter, Storage,
};
pub use crate::utils::error::Result;
