use crate::domain::layout::{Delimiter, FileLayout};
use crate::domain::model::{SampleRecord, SkippedRow};
use crate::utils::error::{QuantError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::io::{BufRead, BufReader, Read};

/// Turns one delimited data row into a [`SampleRecord`].
#[derive(Debug, Clone)]
pub struct RecordParser {
    delimiter: Delimiter,
    name_column: usize,
    area_column: usize,
}

impl RecordParser {
    pub fn new(layout: &FileLayout) -> Self {
        Self {
            delimiter: layout.delimiter,
            name_column: layout.name_column,
            area_column: layout.area_column,
        }
    }

    /// Splits `line` with the csv reader so quoted fields keep embedded delimiters.
    pub fn parse_line(&self, row_index: usize, line: &str) -> Result<SampleRecord> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter.as_byte())
            .from_reader(line.as_bytes());

        let mut record = StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(true) => self.parse_record(row_index, &record),
            Ok(false) => Err(QuantError::MalformedRecord {
                row: row_index,
                reason: "empty row".to_string(),
            }),
            Err(e) => Err(QuantError::MalformedRecord {
                row: row_index,
                reason: e.to_string(),
            }),
        }
    }

    /// True for lines that carry no fields, such as a blank line or `,,,,,,`.
    pub fn is_separator(&self, line: &str) -> bool {
        line.split(self.delimiter.as_byte() as char)
            .all(|field| field.trim().trim_matches('"').trim().is_empty())
    }

    pub fn parse_record(&self, row_index: usize, record: &StringRecord) -> Result<SampleRecord> {
        let area_field = record
            .get(self.area_column)
            .ok_or_else(|| QuantError::MalformedRecord {
                row: row_index,
                reason: format!(
                    "expected at least {} columns, found {}",
                    self.area_column + 1,
                    record.len()
                ),
            })?
            .trim();

        let measured_area: f64 = area_field.parse().map_err(|_| QuantError::MalformedRecord {
            row: row_index,
            reason: format!("non-numeric peak area '{}'", area_field),
        })?;

        if !measured_area.is_finite() || measured_area < 0.0 {
            return Err(QuantError::MalformedRecord {
                row: row_index,
                reason: format!("peak area must be finite and non-negative, got {}", area_field),
            });
        }

        let sample_name = record
            .get(self.name_column)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(SampleRecord {
            row_index,
            sample_name,
            measured_area,
        })
    }
}

/// Sequential reader over one instrument export.
///
/// The header skip counts physical lines. The calibration section ends at the
/// first separator line, and the section gap consumes separator lines only.
/// Data lines that fail to parse are logged and collected as [`SkippedRow`]s.
/// Iterating yields the next valid record, passing over separator lines.
pub struct InstrumentReader<R: Read> {
    source: String,
    lines: BufReader<R>,
    parser: RecordParser,
    layout: FileLayout,
    line_number: usize,
    skipped: Vec<SkippedRow>,
    pending: Option<(usize, String)>,
    buffer: Vec<u8>,
}

impl<R: Read> InstrumentReader<R> {
    pub fn new(source: impl Into<String>, reader: R, layout: &FileLayout) -> Self {
        Self {
            source: source.into(),
            lines: BufReader::new(reader),
            parser: RecordParser::new(layout),
            layout: layout.clone(),
            line_number: 0,
            skipped: Vec::new(),
            pending: None,
            buffer: Vec::new(),
        }
    }

    /// Skips the metadata preamble in front of the calibration rows.
    pub fn skip_preamble(&mut self) -> Result<usize> {
        let n = self.layout.header_rows;
        let skipped = self.skip_lines(n)?;
        tracing::debug!("Skipped {} of {} header rows", skipped, n);
        Ok(skipped)
    }

    /// Records of the calibration section; iteration stops at the first separator line.
    pub fn calibration_rows(&mut self) -> SectionRows<'_, R> {
        SectionRows { reader: self }
    }

    /// Consumes up to `section_gap_rows` separator lines. A data line met first is
    /// left in place for the unknown section.
    pub fn skip_section_gap(&mut self) -> Result<usize> {
        let n = self.layout.section_gap_rows;
        let mut skipped = 0;

        while skipped < n {
            match self.next_line()? {
                Some((_, line)) if self.parser.is_separator(&line) => skipped += 1,
                Some((row, line)) => {
                    tracing::warn!(
                        "⚠️ Expected {} separator rows before the unknown section of {}, found {} before row {}",
                        n,
                        self.source,
                        skipped,
                        row
                    );
                    self.pending = Some((row, line));
                    break;
                }
                None => break,
            }
        }

        tracing::debug!("Skipped {} of {} section gap rows", skipped, n);
        Ok(skipped)
    }

    /// Returns how many lines were actually skipped; fewer than `n` means end of file.
    fn skip_lines(&mut self, n: usize) -> Result<usize> {
        for skipped in 0..n {
            if self.next_line()?.is_none() {
                return Ok(skipped);
            }
        }
        Ok(n)
    }

    pub fn take_skipped_rows(&mut self) -> Vec<SkippedRow> {
        std::mem::take(&mut self.skipped)
    }

    /// Next valid data record, or `None` at end of file.
    pub fn next_record(&mut self) -> Result<Option<SampleRecord>> {
        while let Some((row, line)) = self.next_line()? {
            if self.parser.is_separator(&line) {
                continue;
            }
            if let Some(record) = self.parse_data_line(row, &line)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Like [`next_record`](Self::next_record) but stops at a separator line,
    /// which stays unread for [`skip_section_gap`](Self::skip_section_gap).
    fn next_in_section(&mut self) -> Result<Option<SampleRecord>> {
        while let Some((row, line)) = self.next_line()? {
            if self.parser.is_separator(&line) {
                tracing::debug!("Section boundary at row {}", row);
                self.pending = Some((row, line));
                return Ok(None);
            }
            if let Some(record) = self.parse_data_line(row, &line)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn parse_data_line(&mut self, row: usize, line: &str) -> Result<Option<SampleRecord>> {
        match self.parser.parse_line(row, line) {
            Ok(record) => {
                tracing::debug!(
                    "Row {}: {} area={}",
                    row,
                    record.display_name(),
                    record.measured_area
                );
                Ok(Some(record))
            }
            Err(e) if e.is_recoverable() => {
                let reason = malformed_reason(e);
                tracing::warn!("⚠️ Skipping row {} of {}: {}", row, self.source, reason);
                self.skipped.push(SkippedRow {
                    row_index: row,
                    reason,
                });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        if let Some(pending) = self.pending.take() {
            return Ok(Some(pending));
        }

        self.buffer.clear();
        let read = self
            .lines
            .read_until(b'\n', &mut self.buffer)
            .map_err(|source| QuantError::FileReadFailure {
                path: self.source.clone(),
                source,
            })?;

        if read == 0 {
            return Ok(None);
        }

        self.line_number += 1;
        // 儀器匯出檔不一定是 UTF-8
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line
            .trim_start_matches('\u{feff}')
            .trim_end_matches(['\n', '\r'])
            .to_string();

        Ok(Some((self.line_number, line)))
    }
}

impl<R: Read> Iterator for InstrumentReader<R> {
    type Item = Result<SampleRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Borrowing iterator over the calibration section of an [`InstrumentReader`].
pub struct SectionRows<'a, R: Read> {
    reader: &'a mut InstrumentReader<R>,
}

impl<R: Read> Iterator for SectionRows<'_, R> {
    type Item = Result<SampleRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_in_section().transpose()
    }
}

fn malformed_reason(error: QuantError) -> String {
    match error {
        QuantError::MalformedRecord { reason, .. } => reason,
        other => other.to_string(),
    }
}

/// Collects the unknown-sample section.
///
/// With `count` set, exactly that many records are read and running out first is
/// [`QuantError::InsufficientSampleData`]; without it, records are read to end of file.
pub fn collect_samples<I>(records: I, count: Option<usize>) -> Result<Vec<SampleRecord>>
where
    I: IntoIterator<Item = Result<SampleRecord>>,
{
    let mut records = records.into_iter();

    let Some(expected) = count else {
        return records.collect();
    };

    let mut samples = Vec::with_capacity(expected);
    while samples.len() < expected {
        let Some(record) = records.next().transpose()? else {
            return Err(QuantError::InsufficientSampleData {
                expected,
                found: samples.len(),
            });
        };
        samples.push(record);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
Instrument,HPLC-01
Method,Caffeine
Operator,lab
Date,2024-12-04
#,Name,RT,Type,Height,Width,Area
1,Std 1,2.31,BB,50,0.1,100
2,Std 2,2.30,BB,99,0.1,200
3,Std 3,2.31,BB,151,0.1,300

4,Coffee A,2.30,BB,75,0.1,150
5,Coffee B,2.32,BB,120,0.1,250
";

    fn layout() -> FileLayout {
        FileLayout::default()
    }

    #[test]
    fn test_parse_line_reads_name_and_area() {
        let parser = RecordParser::new(&layout());
        let record = parser
            .parse_line(6, "1,Std 1,2.31,BB,50,0.1,100.5")
            .unwrap();

        assert_eq!(record.row_index, 6);
        assert_eq!(record.sample_name.as_deref(), Some("Std 1"));
        assert_eq!(record.measured_area, 100.5);
    }

    #[test]
    fn test_parse_line_honours_quotes_and_tabs() {
        let parser = RecordParser::new(&layout());
        let record = parser
            .parse_line(1, "1,\"Mix, 1:10\",2.31,BB,50,0.1,42")
            .unwrap();
        assert_eq!(record.sample_name.as_deref(), Some("Mix, 1:10"));
        assert_eq!(record.measured_area, 42.0);

        let tab_layout = FileLayout {
            delimiter: Delimiter::Tab,
            ..layout()
        };
        let parser = RecordParser::new(&tab_layout);
        let record = parser.parse_line(1, "1\tS\t2.3\tBB\t5\t0.1\t7.25").unwrap();
        assert_eq!(record.measured_area, 7.25);
    }

    #[test]
    fn test_parse_line_rejects_bad_rows() {
        let parser = RecordParser::new(&layout());

        let short = parser.parse_line(3, "1,Std,2.3").unwrap_err();
        assert!(matches!(short, QuantError::MalformedRecord { row: 3, .. }));

        let text_area = parser.parse_line(4, "1,Std,2.3,BB,5,0.1,n/a").unwrap_err();
        assert!(text_area.to_string().contains("non-numeric"));

        let negative = parser.parse_line(5, "1,Std,2.3,BB,5,0.1,-3").unwrap_err();
        assert!(matches!(negative, QuantError::MalformedRecord { .. }));
    }

    #[test]
    fn test_blank_name_is_none() {
        let parser = RecordParser::new(&layout());
        let record = parser.parse_line(2, "1, ,2.3,BB,5,0.1,9").unwrap();
        assert!(record.sample_name.is_none());
    }

    #[test]
    fn test_reader_walks_both_sections() {
        let mut reader = InstrumentReader::new("export.csv", EXPORT.as_bytes(), &layout());
        assert_eq!(reader.skip_preamble().unwrap(), 5);

        let calibration: Vec<SampleRecord> = reader
            .by_ref()
            .take(3)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(calibration.len(), 3);
        assert_eq!(calibration[0].row_index, 6);
        assert_eq!(calibration[2].measured_area, 300.0);

        assert_eq!(reader.skip_section_gap().unwrap(), 1);
        let unknowns = collect_samples(&mut reader, None).unwrap();
        assert_eq!(unknowns.len(), 2);
        assert_eq!(unknowns[0].sample_name.as_deref(), Some("Coffee A"));
        assert_eq!(unknowns[0].row_index, 10);
        assert!(reader.take_skipped_rows().is_empty());
    }

    #[test]
    fn test_reader_records_skipped_rows() {
        let data = "h\n1,A,0,0,0,0,10\n2,B,0,0,0,0,oops\n3,C,0,0,0,0,30\n";
        let layout = FileLayout {
            header_rows: 1,
            ..layout()
        };
        let mut reader = InstrumentReader::new("mem", data.as_bytes(), &layout);
        reader.skip_preamble().unwrap();

        let records: Vec<SampleRecord> = reader.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        let skipped = reader.take_skipped_rows();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].row_index, 3);
    }

    #[test]
    fn test_separator_lines() {
        let parser = RecordParser::new(&layout());
        assert!(parser.is_separator(""));
        assert!(parser.is_separator("   "));
        assert!(parser.is_separator(",,,,,,"));
        assert!(parser.is_separator("\"\", , ,,,,"));
        assert!(!parser.is_separator("3,Std 3"));
        assert!(!parser.is_separator(",,,,,,oops"));
    }

    #[test]
    fn test_calibration_section_ends_at_separator() {
        let export = EXPORT.replace("2,Std 2,2.30,BB,99,0.1,200", "2,Std 2,2.30,BB,99,0.1,oops");
        let mut reader = InstrumentReader::new("export.csv", export.as_bytes(), &layout());
        reader.skip_preamble().unwrap();

        let calibration: Vec<SampleRecord> = reader
            .calibration_rows()
            .take(3)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(calibration.len(), 2);
        assert_eq!(calibration[1].measured_area, 300.0);

        assert_eq!(reader.skip_section_gap().unwrap(), 1);
        let unknowns = collect_samples(&mut reader, None).unwrap();
        let names: Vec<_> = unknowns.iter().filter_map(|s| s.sample_name.as_deref()).collect();
        assert_eq!(names, vec!["Coffee A", "Coffee B"]);

        let skipped = reader.take_skipped_rows();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].row_index, 7);
    }

    #[test]
    fn test_section_gap_leaves_data_rows_in_place() {
        let data = "1,Std 1,0,0,0,0,100\n2,Std 2,0,0,0,0,200\n3,Coffee A,0,0,0,0,150\n";
        let layout = FileLayout {
            header_rows: 0,
            section_gap_rows: 2,
            ..layout()
        };
        let mut reader = InstrumentReader::new("mem", data.as_bytes(), &layout);

        let calibration: Vec<SampleRecord> = reader
            .calibration_rows()
            .take(2)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(calibration.len(), 2);

        assert_eq!(reader.skip_section_gap().unwrap(), 0);
        let unknowns = collect_samples(&mut reader, None).unwrap();
        assert_eq!(unknowns.len(), 1);
        assert_eq!(unknowns[0].sample_name.as_deref(), Some("Coffee A"));
        assert_eq!(unknowns[0].row_index, 3);
    }

    #[test]
    fn test_collect_samples_with_count() {
        let data = "1,A,0,0,0,0,10\n2,B,0,0,0,0,20\n";
        let layout = FileLayout {
            header_rows: 0,
            ..layout()
        };

        let reader = InstrumentReader::new("mem", data.as_bytes(), &layout);
        assert_eq!(collect_samples(reader, Some(1)).unwrap().len(), 1);

        let reader = InstrumentReader::new("mem", data.as_bytes(), &layout);
        let err = collect_samples(reader, Some(3)).unwrap_err();
        assert!(matches!(
            err,
            QuantError::InsufficientSampleData {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_crlf_and_bom_are_stripped() {
        let data = "\u{feff}header\r\n1,A,0,0,0,0,12.5\r\n";
        let layout = FileLayout {
            header_rows: 1,
            ..layout()
        };
        let mut reader = InstrumentReader::new("mem", data.as_bytes(), &layout);
        reader.skip_preamble().unwrap();
        let record = reader.next_record().unwrap().unwrap();
        assert_eq!(record.measured_area, 12.5);
        assert_eq!(record.row_index, 2);
    }
}
