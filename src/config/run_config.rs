use crate::adapters::writers::OUTPUT_FORMATS;
use crate::core::ConfigProvider;
use crate::domain::layout::FileLayout;
use crate::utils::error::{QuantError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run: RunSection,
    pub layout: FileLayout,
    pub calibration: CalibrationConfig,
    pub unknowns: UnknownsConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub name: Option<String>,
    pub input: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub points: Option<usize>,
    pub concentrations: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnknownsConfig {
    pub count: Option<usize>,
    pub dilution_factor: Option<f64>,
    pub prompt_dilution: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub zip: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            formats: vec!["txt".to_string()],
            zip: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: bool,
}

impl RunConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(QuantError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| QuantError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    // unset variables are left as written
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| QuantError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("run.input", &self.run.input)?;
        validation::validate_file_extension("run.input", &self.run.input, &["csv", "tsv", "txt"])?;
        validation::validate_path("output.path", &self.output.path)?;
        self.layout.validate()?;

        if self.calibration.points.is_none() && self.calibration.concentrations.is_none() {
            return Err(QuantError::MissingConfigError {
                field: "calibration.points".to_string(),
            });
        }
        validation::validate_positive_number("calibration.points", self.calibration_points(), 2)?;

        if let Some(concentrations) = &self.calibration.concentrations {
            if concentrations.len() != self.calibration_points() {
                return Err(QuantError::ConfigValidationError {
                    field: "calibration.concentrations".to_string(),
                    message: format!(
                        "{} concentrations given for {} calibration points",
                        concentrations.len(),
                        self.calibration_points()
                    ),
                });
            }
            for value in concentrations {
                if !value.is_finite() || *value < 0.0 {
                    return Err(QuantError::InvalidConfigValueError {
                        field: "calibration.concentrations".to_string(),
                        value: value.to_string(),
                        reason: "Concentrations must be finite and non-negative".to_string(),
                    });
                }
            }
        }

        if let Some(count) = self.unknowns.count {
            validation::validate_positive_number("unknowns.count", count, 1)?;
        }

        if let Some(factor) = self.unknowns.dilution_factor {
            if self.unknowns.prompt_dilution {
                return Err(QuantError::ConfigValidationError {
                    field: "unknowns.prompt_dilution".to_string(),
                    message: "cannot both prompt for and fix the dilution factor".to_string(),
                });
            }
            validation::validate_positive_float("unknowns.dilution_factor", factor)
                .map_err(|_| QuantError::InvalidDilutionFactor { value: factor })?;
        }

        for format in &self.output.formats {
            validation::validate_one_of("output.formats", format, &OUTPUT_FORMATS)?;
        }

        Ok(())
    }

    pub fn run_name(&self) -> &str {
        self.run.name.as_deref().unwrap_or("hplc-quant")
    }

    pub fn calibration_points(&self) -> usize {
        self.calibration
            .points
            .or_else(|| self.calibration.concentrations.as_ref().map(Vec::len))
            .unwrap_or(0)
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.json_logs).unwrap_or(false)
    }
}

impl ConfigProvider for RunConfig {
    fn input_path(&self) -> &str {
        &self.run.input
    }

    fn layout(&self) -> &FileLayout {
        &self.layout
    }

    fn calibration_points(&self) -> usize {
        self.calibration_points()
    }

    fn sample_count(&self) -> Option<usize> {
        self.unknowns.count
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn zip_bundle(&self) -> bool {
        self.output.zip
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
