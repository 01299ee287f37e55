use crate::domain::model::{CalibrationPoint, SampleRecord};
use crate::domain::ports::ReferenceSource;
use crate::utils::error::{QuantError, Result};

/// Pairs calibration rows with their externally supplied reference concentrations.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationSetBuilder {
    target: usize,
}

impl CalibrationSetBuilder {
    pub fn new(target: usize) -> Self {
        Self { target }
    }

    /// Pulls records until `target` points exist. Never reads past the last
    /// calibration row, so the same iterator can continue into the unknown section.
    pub fn build<I, S>(&self, records: I, references: &mut S) -> Result<Vec<CalibrationPoint>>
    where
        I: IntoIterator<Item = Result<SampleRecord>>,
        S: ReferenceSource + ?Sized,
    {
        let mut records = records.into_iter();
        let mut points = Vec::with_capacity(self.target);

        while points.len() < self.target {
            let Some(record) = records.next().transpose()? else {
                return Err(QuantError::InsufficientCalibrationData {
                    expected: self.target,
                    found: points.len(),
                });
            };

            let index = points.len();
            let concentration = references.concentration_for(index, &record)?;
            if !concentration.is_finite() || concentration < 0.0 {
                return Err(QuantError::ReferenceUnavailable {
                    index,
                    reason: format!(
                        "concentration must be finite and non-negative, got {}",
                        concentration
                    ),
                });
            }

            tracing::debug!(
                "Calibration point {}: area={} concentration={}",
                index + 1,
                record.measured_area,
                concentration
            );

            points.push(CalibrationPoint {
                measured_area: record.measured_area,
                reference_concentration: concentration,
            });
        }

        Ok(points)
    }
}
