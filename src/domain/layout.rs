use crate::utils::error::{QuantError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field separator of the instrument export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Semicolon,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
            Delimiter::Semicolon => b';',
        }
    }
}

impl FromStr for Delimiter {
    type Err = QuantError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "," | "comma" => Ok(Delimiter::Comma),
            "\t" | "\\t" | "tab" => Ok(Delimiter::Tab),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            other => Err(QuantError::InvalidConfigValueError {
                field: "layout.delimiter".to_string(),
                value: other.to_string(),
                reason: "Valid delimiters: comma, tab, semicolon".to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Delimiter {
    type Error = QuantError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Delimiter> for String {
    fn from(d: Delimiter) -> String {
        d.to_string()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Delimiter::Comma => "comma",
            Delimiter::Tab => "tab",
            Delimiter::Semicolon => "semicolon",
        };
        f.write_str(name)
    }
}

/// Row/column layout of an instrument export.
///
/// The file is a preamble of `header_rows` lines, the calibration rows, then
/// `section_gap_rows` separator lines, then the unknown-sample rows. Columns are
/// 0-based field offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLayout {
    pub delimiter: Delimiter,
    pub header_rows: usize,
    pub section_gap_rows: usize,
    pub name_column: usize,
    pub area_column: usize,
}

impl Default for FileLayout {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            header_rows: 5,
            section_gap_rows: 1,
            name_column: 1,
            area_column: 6,
        }
    }
}

impl Validate for FileLayout {
    fn validate(&self) -> Result<()> {
        validation::validate_range("layout.name_column", self.name_column, 0, 1024)?;
        validation::validate_range("layout.area_column", self.area_column, 0, 1024)?;
        if self.name_column == self.area_column {
            return Err(QuantError::ConfigValidationError {
                field: "layout.area_column".to_string(),
                message: "area column must differ from name column".to_string(),
            });
        }
        Ok(())
    }
}
