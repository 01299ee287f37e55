use crate::domain::layout::Delimiter;
use crate::domain::model::AnalysisReport;
use crate::domain::ports::ReportWriter;
use crate::utils::error::{QuantError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const OUTPUT_FORMATS: [&str; 5] = ["txt", "json", "csv", "tsv", "curve"];

/// Plain-text run report with one labelled section per series.
#[derive(Debug, Clone, Default)]
pub struct TextReportWriter;

impl ReportWriter for TextReportWriter {
    fn file_name(&self) -> &str {
        "report.txt"
    }

    fn render(&self, report: &AnalysisReport) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        writeln!(out, "=== Analysis Report ===\n")?;
        writeln!(out, "R-Square Value: {}", report.r_squared())?;
        if report.poor_fit() {
            writeln!(
                out,
                "WARNING: the calibration line fits no better than the mean concentration"
            )?;
        }
        writeln!(out)?;
        writeln!(out, "Source: {}", report.source())?;
        writeln!(out, "Generated: {}", report.generated_at().to_rfc3339())?;
        writeln!(out, "Slope: {}", report.model().slope)?;
        writeln!(out, "Intercept: {}", report.model().intercept)?;
        writeln!(out, "Dilution Factor: {}", report.dilution_factor().value())?;

        writeln!(out, "\n=== AreasCon ===")?;
        for (i, area) in report.calibration_areas().iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, area)?;
        }

        writeln!(out, "\n=== Concentrations ===")?;
        for (i, conc) in report.calibration_concentrations().iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, conc)?;
        }

        writeln!(out, "\n=== AreaUK ===")?;
        for (i, sample) in report.samples().iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, sample.measured_area)?;
        }

        writeln!(out, "\n=== Unknowns ===")?;
        for (i, sample) in report.samples().iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, sample.estimated_concentration)?;
        }

        writeln!(out, "\n=== Sample Names ===")?;
        for (i, sample) in report.samples().iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, sample.sample_name)?;
        }

        if !report.skipped_rows().is_empty() {
            writeln!(out, "\n=== Skipped Rows ===")?;
            for skipped in report.skipped_rows() {
                writeln!(out, "  row {}: {}", skipped.row_index, skipped.reason)?;
            }
        }

        writeln!(out, "\n=== End of Report ===")?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonReportWriter;

impl ReportWriter for JsonReportWriter {
    fn file_name(&self) -> &str {
        "report.json"
    }

    fn render(&self, report: &AnalysisReport) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(report)?)
    }
}

/// One row per quantified sample, comma- or tab-separated.
#[derive(Debug, Clone)]
pub struct SampleTableWriter {
    delimiter: Delimiter,
    file_name: String,
}

impl SampleTableWriter {
    pub fn new(delimiter: Delimiter) -> Self {
        let file_name = match delimiter {
            Delimiter::Tab => "results.tsv",
            _ => "results.csv",
        };
        Self {
            delimiter,
            file_name: file_name.to_string(),
        }
    }
}

impl ReportWriter for SampleTableWriter {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn render(&self, report: &AnalysisReport) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter.as_byte())
            .from_writer(Vec::new());

        writer.write_record([
            "sample_name",
            "measured_area",
            "estimated_concentration",
            "dilution_factor",
        ])?;
        for sample in report.samples() {
            writer.write_record([
                sample.sample_name.clone(),
                sample.measured_area.to_string(),
                sample.estimated_concentration.to_string(),
                sample.dilution_factor.to_string(),
            ])?;
        }

        writer
            .into_inner()
            .map_err(|e| QuantError::IoError(e.into_error()))
    }
}

/// Calibration points plus the fitted line endpoints, for an external plotter.
#[derive(Debug, Clone, Default)]
pub struct CurveWriter;

impl ReportWriter for CurveWriter {
    fn file_name(&self) -> &str {
        "calibration_curve.csv"
    }

    fn render(&self, report: &AnalysisReport) -> Result<Vec<u8>> {
        let curve = report.curve();
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(["series", "area", "concentration"])?;
        for (area, conc) in curve.areas.iter().zip(&curve.concentrations) {
            writer.write_record(["point".to_string(), area.to_string(), conc.to_string()])?;
        }
        for (area, conc) in curve.line {
            writer.write_record(["fit".to_string(), area.to_string(), conc.to_string()])?;
        }

        writer
            .into_inner()
            .map_err(|e| QuantError::IoError(e.into_error()))
    }
}

pub fn writer_for(format: &str) -> Result<Box<dyn ReportWriter>> {
    match format {
        "txt" => Ok(Box::new(TextReportWriter)),
        "json" => Ok(Box::new(JsonReportWriter)),
        "csv" => Ok(Box::new(SampleTableWriter::new(Delimiter::Comma))),
        "tsv" => Ok(Box::new(SampleTableWriter::new(Delimiter::Tab))),
        "curve" => Ok(Box::new(CurveWriter)),
        other => Err(QuantError::InvalidConfigValueError {
            field: "output.formats".to_string(),
            value: other.to_string(),
            reason: format!(
                "Unsupported format. Valid formats: {}",
                OUTPUT_FORMATS.join(", ")
            ),
        }),
    }
}

pub fn writers_for(formats: &[String]) -> Result<Vec<Box<dyn ReportWriter>>> {
    formats.iter().map(|f| writer_for(f)).collect()
}

/// Packs already-rendered artifacts into one ZIP archive.
pub fn bundle_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
