use crate::utils::error::{QuantError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One parsed data row of an instrument export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// 1-based line number in the source file.
    pub row_index: usize,
    pub sample_name: Option<String>,
    pub measured_area: f64,
}

impl SampleRecord {
    /// Name used in reports, falling back to the row when the export left it blank.
    pub fn display_name(&self) -> String {
        match &self.sample_name {
            Some(name) => name.clone(),
            None => format!("row {}", self.row_index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub measured_area: f64,
    pub reference_concentration: f64,
}

/// First-degree calibration line: `concentration = slope * area + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearModel {
    pub fn predict(&self, area: f64) -> f64 {
        self.slope * area + self.intercept
    }

    /// A fit no better than the horizontal mean line.
    pub fn is_poor_fit(&self) -> bool {
        self.r_squared <= 0.0
    }
}

/// Multiplicative correction for a diluted batch. Always finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DilutionFactor(f64);

impl DilutionFactor {
    pub const NONE: DilutionFactor = DilutionFactor(1.0);

    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(QuantError::InvalidDilutionFactor { value })
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_diluted(self) -> bool {
        self.0 != 1.0
    }
}

impl Default for DilutionFactor {
    fn default() -> Self {
        Self::NONE
    }
}

impl TryFrom<f64> for DilutionFactor {
    type Error = QuantError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DilutionFactor> for f64 {
    fn from(factor: DilutionFactor) -> f64 {
        factor.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantifiedSample {
    pub sample_name: String,
    pub measured_area: f64,
    pub estimated_concentration: f64,
    pub dilution_factor: f64,
}

/// A data row dropped during parsing, kept for the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_index: usize,
    pub reason: String,
}

/// Values a plot renderer needs to draw the calibration curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationCurve {
    pub areas: Vec<f64>,
    pub concentrations: Vec<f64>,
    /// Fitted line evaluated at the smallest and largest calibration area.
    pub line: [(f64, f64); 2],
    pub r_squared: f64,
}

/// Final result of one run. Built once by the report assembler, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) source: String,
    pub(crate) model: LinearModel,
    pub(crate) dilution_factor: DilutionFactor,
    pub(crate) calibration: Vec<CalibrationPoint>,
    pub(crate) samples: Vec<QuantifiedSample>,
    pub(crate) skipped_rows: Vec<SkippedRow>,
    pub(crate) poor_fit: bool,
}

impl AnalysisReport {
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    pub fn r_squared(&self) -> f64 {
        self.model.r_squared
    }

    pub fn dilution_factor(&self) -> DilutionFactor {
        self.dilution_factor
    }

    pub fn calibration(&self) -> &[CalibrationPoint] {
        &self.calibration
    }

    pub fn samples(&self) -> &[QuantifiedSample] {
        &self.samples
    }

    pub fn skipped_rows(&self) -> &[SkippedRow] {
        &self.skipped_rows
    }

    pub fn poor_fit(&self) -> bool {
        self.poor_fit
    }

    pub fn calibration_areas(&self) -> Vec<f64> {
        self.calibration.iter().map(|p| p.measured_area).collect()
    }

    pub fn calibration_concentrations(&self) -> Vec<f64> {
        self.calibration
            .iter()
            .map(|p| p.reference_concentration)
            .collect()
    }

    pub fn curve(&self) -> CalibrationCurve {
        let areas = self.calibration_areas();
        let min = areas.iter().copied().fold(f64::INFINITY, f64::min);
        let max = areas.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        CalibrationCurve {
            concentrations: self.calibration_concentrations(),
            line: [
                (min, self.model.predict(min)),
                (max, self.model.predict(max)),
            ],
            areas,
            r_squared: self.model.r_squared,
        }
    }
}
