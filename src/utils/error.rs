use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuantError {
    #[error("Input file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read input file '{path}': {source}")]
    FileReadFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("Insufficient calibration data: expected {expected} points, found {found}")]
    InsufficientCalibrationData { expected: usize, found: usize },

    #[error("Insufficient sample data: expected {expected} samples, found {found}")]
    InsufficientSampleData { expected: usize, found: usize },

    #[error("Degenerate fit: {reason}")]
    DegenerateFit { reason: String },

    #[error("Invalid dilution factor: {value} (must be strictly positive)")]
    InvalidDilutionFactor { value: f64 },

    #[error("Reference concentration {index} unavailable: {reason}")]
    ReferenceUnavailable { index: usize, reason: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Model,
    Configuration,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl QuantError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            QuantError::FileNotFound { .. } | QuantError::FileReadFailure { .. } => {
                ErrorCategory::Input
            }
            QuantError::MalformedRecord { .. }
            | QuantError::InsufficientCalibrationData { .. }
            | QuantError::InsufficientSampleData { .. }
            | QuantError::ReferenceUnavailable { .. }
            | QuantError::CsvError(_) => ErrorCategory::Data,
            QuantError::DegenerateFit { .. } | QuantError::InvalidDilutionFactor { .. } => {
                ErrorCategory::Model
            }
            QuantError::ConfigValidationError { .. }
            | QuantError::InvalidConfigValueError { .. }
            | QuantError::MissingConfigError { .. } => ErrorCategory::Configuration,
            QuantError::ZipError(_) | QuantError::IoError(_) | QuantError::SerializationError(_) => {
                ErrorCategory::Output
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單列錯誤只會被略過
            QuantError::MalformedRecord { .. } => ErrorSeverity::Low,
            QuantError::ReferenceUnavailable { .. } => ErrorSeverity::Medium,
            QuantError::FileNotFound { .. }
            | QuantError::FileReadFailure { .. }
            | QuantError::IoError(_)
            | QuantError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuantError::MalformedRecord { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            QuantError::FileNotFound { .. } => "Check the input path and that the export file exists",
            QuantError::FileReadFailure { .. } | QuantError::IoError(_) => {
                "Check file permissions and that the file is not locked by the instrument software"
            }
            QuantError::MalformedRecord { .. } | QuantError::CsvError(_) => {
                "Check the delimiter and column offsets in the layout configuration"
            }
            QuantError::InsufficientCalibrationData { .. } => {
                "Lower the calibration point count or check header_rows so calibration rows are not skipped"
            }
            QuantError::InsufficientSampleData { .. } => {
                "Lower the sample count or omit it to read unknowns until end of file"
            }
            QuantError::DegenerateFit { .. } => {
                "Provide at least two calibration standards with different peak areas"
            }
            QuantError::InvalidDilutionFactor { .. } => "Enter a dilution factor greater than zero",
            QuantError::ReferenceUnavailable { .. } => {
                "Supply one reference concentration per calibration point"
            }
            QuantError::ZipError(_) | QuantError::SerializationError(_) => {
                "Check the output directory is writable"
            }
            QuantError::ConfigValidationError { .. }
            | QuantError::InvalidConfigValueError { .. }
            | QuantError::MissingConfigError { .. } => "Fix the configuration file or command-line flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            QuantError::FileNotFound { path } => format!("Cannot find input file '{}'", path),
            QuantError::InsufficientCalibrationData { expected, found } => format!(
                "Only {} of {} calibration rows could be read",
                found, expected
            ),
            QuantError::InsufficientSampleData { expected, found } => {
                format!("Only {} of {} sample rows could be read", found, expected)
            }
            QuantError::DegenerateFit { reason } => {
                format!("Cannot fit a calibration line: {}", reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuantError>;
