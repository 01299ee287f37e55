use crate::domain::model::{DilutionFactor, SampleRecord};
use crate::domain::ports::{DilutionPolicy, ReferenceSource};
use crate::utils::error::{QuantError, Result};
use std::io::{BufRead, Write};

const MAX_ATTEMPTS: usize = 3;

/// Interactive collaborator: asks an operator for reference concentrations and
/// the batch dilution over any line-based input/output pair.
pub struct ConsolePrompt<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `question` and reads one trimmed answer; `None` at end of input.
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(None);
        }
        Ok(Some(answer.trim().to_string()))
    }

    fn ask_number(&mut self, question: &str) -> Result<Option<f64>> {
        for _ in 0..MAX_ATTEMPTS {
            let Some(answer) = self.ask(question)? else {
                return Ok(None);
            };
            match answer.parse::<f64>() {
                Ok(value) if value.is_finite() => return Ok(Some(value)),
                _ => writeln!(self.output, "'{}' is not a number, try again.", answer)?,
            }
        }
        Ok(None)
    }
}

impl<R: BufRead, W: Write> ReferenceSource for ConsolePrompt<R, W> {
    fn concentration_for(&mut self, index: usize, record: &SampleRecord) -> Result<f64> {
        let question = format!(
            "Please enter the concentration of calibration standard {} ({}, area {}): ",
            index + 1,
            record.display_name(),
            record.measured_area
        );

        self.ask_number(&question)?
            .ok_or_else(|| QuantError::ReferenceUnavailable {
                index,
                reason: "no valid concentration was entered".to_string(),
            })
    }
}

impl<R: BufRead, W: Write> DilutionPolicy for ConsolePrompt<R, W> {
    fn dilution_factor(&mut self, sample_count: usize) -> Result<DilutionFactor> {
        let question = format!(
            "Was there a dilution in this batch of {} samples? Y/N: ",
            sample_count
        );

        for _ in 0..MAX_ATTEMPTS {
            let Some(answer) = self.ask(&question)? else {
                break;
            };
            match answer.as_str() {
                "Y" | "y" => {
                    let value = self
                        .ask_number("What was the dilution in parts: ")?
                        .ok_or_else(|| QuantError::MissingConfigError {
                            field: "dilution factor".to_string(),
                        })?;
                    return DilutionFactor::new(value);
                }
                "N" | "n" => return Ok(DilutionFactor::NONE),
                other => writeln!(self.output, "Please answer Y or N (got '{}').", other)?,
            }
        }

        Err(QuantError::MissingConfigError {
            field: "dilution decision".to_string(),
        })
    }
}
