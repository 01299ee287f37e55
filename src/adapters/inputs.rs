use crate::domain::model::{DilutionFactor, SampleRecord};
use crate::domain::ports::{DilutionPolicy, ReferenceSource};
use crate::utils::error::Result;

/// Pairs a reference source with a dilution policy so the engine can take both
/// as one collaborator.
#[derive(Debug, Clone)]
pub struct RunInputs<R, D> {
    pub references: R,
    pub dilution: D,
}

impl<R, D> RunInputs<R, D> {
    pub fn new(references: R, dilution: D) -> Self {
        Self {
            references,
            dilution,
        }
    }
}

impl<R: ReferenceSource, D> ReferenceSource for RunInputs<R, D> {
    fn concentration_for(&mut self, index: usize, record: &SampleRecord) -> Result<f64> {
        self.references.concentration_for(index, record)
    }
}

impl<R, D: DilutionPolicy> DilutionPolicy for RunInputs<R, D> {
    fn dilution_factor(&mut self, sample_count: usize) -> Result<DilutionFactor> {
        self.dilution.dilution_factor(sample_count)
    }
}
