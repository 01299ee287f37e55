use crate::domain::model::{
    AnalysisReport, CalibrationPoint, DilutionFactor, LinearModel, QuantifiedSample, SkippedRow,
};
use chrono::{DateTime, Utc};

/// Groups the outputs of a run into one [`AnalysisReport`]. No computation beyond grouping.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    source: String,
    dilution_factor: DilutionFactor,
    skipped_rows: Vec<SkippedRow>,
    generated_at: DateTime<Utc>,
}

impl ReportAssembler {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dilution_factor: DilutionFactor::NONE,
            skipped_rows: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn dilution_factor(mut self, dilution_factor: DilutionFactor) -> Self {
        self.dilution_factor = dilution_factor;
        self
    }

    pub fn skipped_rows(mut self, skipped_rows: Vec<SkippedRow>) -> Self {
        self.skipped_rows = skipped_rows;
        self
    }

    pub fn assemble(
        self,
        model: LinearModel,
        calibration: Vec<CalibrationPoint>,
        samples: Vec<QuantifiedSample>,
    ) -> AnalysisReport {
        AnalysisReport {
            generated_at: self.generated_at,
            source: self.source,
            poor_fit: model.is_poor_fit(),
            model,
            dilution_factor: self.dilution_factor,
            calibration,
            samples,
            skipped_rows: self.skipped_rows,
        }
    }
}

/// Assembles a report with no source metadata.
pub fn assemble(
    model: LinearModel,
    calibration: Vec<CalibrationPoint>,
    samples: Vec<QuantifiedSample>,
) -> AnalysisReport {
    ReportAssembler::new("").assemble(model, calibration, samples)
}
