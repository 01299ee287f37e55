use crate::config::run_config::{MonitoringConfig, RunConfig};
use crate::domain::layout::Delimiter;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "hplc-quant")]
#[command(about = "Fit an HPLC calibration line and quantify unknown samples")]
pub struct CliConfig {
    /// Instrument export to analyse (overrides `run.input` from --config)
    pub input: Option<String>,

    /// TOML run configuration; flags given on the command line override it
    #[arg(short, long)]
    pub config: Option<String>,

    /// Number of calibration standards at the top of the data section
    #[arg(short = 'n', long)]
    pub calibration_points: Option<usize>,

    /// Reference concentrations in calibration order; prompted for when absent
    #[arg(long, value_delimiter = ',')]
    pub concentrations: Option<Vec<f64>>,

    /// Number of unknown samples; reads to end of file when absent
    #[arg(short, long)]
    pub samples: Option<usize>,

    /// Dilution factor applied to every unknown sample
    #[arg(short, long, conflicts_with = "prompt_dilution")]
    pub dilution: Option<f64>,

    /// Ask whether the batch was diluted
    #[arg(long)]
    pub prompt_dilution: bool,

    #[arg(long)]
    pub delimiter: Option<Delimiter>,

    #[arg(long)]
    pub header_rows: Option<usize>,

    #[arg(long)]
    pub section_gap_rows: Option<usize>,

    #[arg(long)]
    pub name_column: Option<usize>,

    #[arg(long)]
    pub area_column: Option<usize>,

    #[arg(short, long)]
    pub output_path: Option<String>,

    /// Report formats: txt, json, csv, tsv, curve
    #[arg(long, value_delimiter = ',')]
    pub formats: Option<Vec<String>>,

    /// Bundle all written reports into one ZIP archive
    #[arg(long)]
    pub zip: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Log CPU and memory usage per stage
    #[arg(long)]
    pub monitor: bool,

    /// Validate configuration and print the run summary without reading data
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// Loads `--config` if given and applies command-line overrides on top.
    pub fn into_run_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(self, config: &mut RunConfig) {
        if let Some(input) = self.input {
            config.run.input = input;
        }
        if let Some(points) = self.calibration_points {
            config.calibration.points = Some(points);
        }
        if let Some(concentrations) = self.concentrations {
            config.calibration.concentrations = Some(concentrations);
        }
        if let Some(samples) = self.samples {
            config.unknowns.count = Some(samples);
        }
        if let Some(dilution) = self.dilution {
            config.unknowns.dilution_factor = Some(dilution);
            config.unknowns.prompt_dilution = false;
        }
        if self.prompt_dilution {
            config.unknowns.prompt_dilution = true;
            config.unknowns.dilution_factor = None;
        }

        if let Some(delimiter) = self.delimiter {
            config.layout.delimiter = delimiter;
        }
        if let Some(header_rows) = self.header_rows {
            config.layout.header_rows = header_rows;
        }
        if let Some(gap) = self.section_gap_rows {
            config.layout.section_gap_rows = gap;
        }
        if let Some(name_column) = self.name_column {
            config.layout.name_column = name_column;
        }
        if let Some(area_column) = self.area_column {
            config.layout.area_column = area_column;
        }

        if let Some(path) = self.output_path {
            config.output.path = path;
        }
        if let Some(formats) = self.formats {
            config.output.formats = formats;
        }
        if self.zip {
            config.output.zip = true;
        }

        if self.monitor || self.json_logs {
            let monitoring = config.monitoring.get_or_insert_with(MonitoringConfig::default);
            monitoring.enabled |= self.monitor;
            monitoring.json_logs |= self.json_logs;
        }
    }
}
