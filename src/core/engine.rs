use crate::adapters::writers::{bundle_zip, writers_for};
use crate::core::calibration::CalibrationSetBuilder;
use crate::core::fit::fit;
use crate::core::parser::{collect_samples, InstrumentReader};
use crate::core::quantify::quantify_batch;
use crate::core::report::ReportAssembler;
use crate::core::{AnalysisReport, ConfigProvider, DilutionPolicy, ReferenceSource, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::fmt;

pub const ZIP_BUNDLE_NAME: &str = "hplc_report.zip";

/// Stages of one run, always entered in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParseCalibration,
    FitModel,
    ParseUnknowns,
    Quantify,
    AssembleReport,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ParseCalibration => "parse calibration",
            Stage::FitModel => "fit model",
            Stage::ParseUnknowns => "parse unknowns",
            Stage::Quantify => "quantify",
            Stage::AssembleReport => "assemble report",
            Stage::Load => "write reports",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: AnalysisReport,
    pub artifacts: Vec<String>,
}

/// Drives one calibration-and-quantification run. Any stage failure ends the run.
pub struct QuantEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    monitor: SystemMonitor,
}

impl<S: Storage, C: ConfigProvider> QuantEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self::new_with_monitoring(storage, config, false)
    }

    pub fn new_with_monitoring(storage: S, config: C, monitor_enabled: bool) -> Self {
        Self {
            storage,
            config,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    fn enter(&mut self, stage: Stage) {
        tracing::info!("▶️ Stage: {}", stage);
        self.monitor.log_stats(&stage.to_string());
    }

    /// Runs every stage up to the assembled report without writing anything.
    ///
    /// The export is opened once and read front to back; the handle is dropped
    /// before quantification starts, or earlier on any error.
    pub fn analyze<I>(&mut self, inputs: &mut I) -> Result<AnalysisReport>
    where
        I: ReferenceSource + DilutionPolicy + ?Sized,
    {
        let path = self.config.input_path().to_string();
        let layout = self.config.layout().clone();

        tracing::info!("📂 Reading instrument export: {}", path);
        let file = self.storage.open(&path)?;
        let mut reader = InstrumentReader::new(path.clone(), file, &layout);

        self.enter(Stage::ParseCalibration);
        reader.skip_preamble()?;
        let builder = CalibrationSetBuilder::new(self.config.calibration_points());
        let points = builder.build(reader.calibration_rows(), inputs)?;
        tracing::info!("Collected {} calibration points", points.len());

        self.enter(Stage::FitModel);
        let model = fit(&points)?;
        tracing::info!(
            "📈 Calibration line: concentration = {} * area + {} (R² = {:.6})",
            model.slope,
            model.intercept,
            model.r_squared
        );
        if model.is_poor_fit() {
            tracing::warn!(
                "⚠️ R² = {} : the calibration line fits no better than the mean concentration",
                model.r_squared
            );
        }

        self.enter(Stage::ParseUnknowns);
        reader.skip_section_gap()?;
        let samples = collect_samples(&mut reader, self.config.sample_count())?;
        let skipped_rows = reader.take_skipped_rows();
        drop(reader);

        tracing::info!("Collected {} unknown samples", samples.len());
        if samples.is_empty() {
            tracing::warn!("⚠️ No unknown samples found after the calibration section");
        }
        if !skipped_rows.is_empty() {
            tracing::warn!("⚠️ {} malformed rows were skipped", skipped_rows.len());
        }

        self.enter(Stage::Quantify);
        let dilution = inputs.dilution_factor(samples.len())?;
        if dilution.is_diluted() {
            tracing::info!("Applying dilution factor {}", dilution.value());
        }
        let results = quantify_batch(&model, &samples, dilution);
        for result in results.iter().filter(|r| r.estimated_concentration < 0.0) {
            tracing::warn!(
                "⚠️ {} quantified below zero ({}); area {} is under the calibration range",
                result.sample_name,
                result.estimated_concentration,
                result.measured_area
            );
        }

        self.enter(Stage::AssembleReport);
        let report = ReportAssembler::new(path)
            .dilution_factor(dilution)
            .skipped_rows(skipped_rows)
            .assemble(model, points, results);

        Ok(report)
    }

    /// Renders every configured format and hands the bytes to storage.
    pub fn load(&mut self, report: &AnalysisReport) -> Result<Vec<String>> {
        self.enter(Stage::Load);

        let mut rendered = Vec::new();
        for writer in writers_for(self.config.output_formats())? {
            tracing::debug!("Rendering {}", writer.file_name());
            rendered.push((writer.file_name().to_string(), writer.render(report)?));
        }

        if self.config.zip_bundle() {
            tracing::debug!("Creating ZIP file with {} files", rendered.len());
            let zip_data = bundle_zip(&rendered)?;
            let location = self.storage.write_file(ZIP_BUNDLE_NAME, &zip_data)?;
            return Ok(vec![location]);
        }

        rendered
            .iter()
            .map(|(name, data)| self.storage.write_file(name, data))
            .collect()
    }

    pub fn run<I>(&mut self, inputs: &mut I) -> Result<RunOutcome>
    where
        I: ReferenceSource + DilutionPolicy + ?Sized,
    {
        tracing::info!("Starting quantification run");
        let report = self.analyze(inputs)?;
        let artifacts = self.load(&report)?;
        self.monitor.log_final_stats();

        Ok(RunOutcome { report, artifacts })
    }
}
