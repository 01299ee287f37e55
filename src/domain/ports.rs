use crate::domain::layout::FileLayout;
use crate::domain::model::{AnalysisReport, DilutionFactor, SampleRecord};
use crate::utils::error::Result;
use std::io::Read;

pub trait Storage {
    type Reader: Read;

    /// Opens `path` for one sequential read. The handle is released when the
    /// returned reader is dropped.
    fn open(&self, path: &str) -> Result<Self::Reader>;

    /// Writes an artifact and returns the location it was written to.
    fn write_file(&self, path: &str, data: &[u8]) -> Result<String>;
}

pub trait ConfigProvider {
    fn input_path(&self) -> &str;
    fn layout(&self) -> &FileLayout;
    fn calibration_points(&self) -> usize;
    /// `None` reads unknown samples until end of file.
    fn sample_count(&self) -> Option<usize>;
    fn output_formats(&self) -> &[String];
    fn zip_bundle(&self) -> bool;
}

/// Supplies the known concentration of each calibration standard, in file order.
pub trait ReferenceSource {
    fn concentration_for(&mut self, index: usize, record: &SampleRecord) -> Result<f64>;
}

impl<F> ReferenceSource for F
where
    F: FnMut(usize, &SampleRecord) -> Result<f64>,
{
    fn concentration_for(&mut self, index: usize, record: &SampleRecord) -> Result<f64> {
        self(index, record)
    }
}

/// Decides the dilution applied to a whole batch of unknown samples.
pub trait DilutionPolicy {
    fn dilution_factor(&mut self, sample_count: usize) -> Result<DilutionFactor>;
}

impl DilutionPolicy for DilutionFactor {
    fn dilution_factor(&mut self, _sample_count: usize) -> Result<DilutionFactor> {
        Ok(*self)
    }
}

pub trait ReportWriter {
    fn file_name(&self) -> &str;
    fn render(&self, report: &AnalysisReport) -> Result<Vec<u8>>;
}
