use crate::domain::model::SampleRecord;
use crate::domain::ports::ReferenceSource;
use crate::utils::error::{QuantError, Result};

/// Pre-loaded reference concentrations, consumed in calibration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    values: Vec<f64>,
}

impl ReferenceTable {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }
}

impl ReferenceSource for ReferenceTable {
    fn concentration_for(&mut self, index: usize, record: &SampleRecord) -> Result<f64> {
        self.values
            .get(index)
            .copied()
            .ok_or_else(|| QuantError::ReferenceUnavailable {
                index,
                reason: format!(
                    "table has {} values, none for {}",
                    self.values.len(),
                    record.display_name()
                ),
            })
    }
}
