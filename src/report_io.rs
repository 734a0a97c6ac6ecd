
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::data_types::alignment_record::{AlignmentRecord, CompactRecord, FullRecord, ReportSchema, Strand};

/// Errors produced while reading or writing an alignment report
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("unrecognized report schema for {0:?}, expected an .m1 or .m5 file")]
    UnknownSchema(PathBuf),
    #[error("line {line_number}: expected {expected} fields for an {schema} record, found {found}")]
    FieldCount {
        line_number: usize,
        schema: ReportSchema,
        expected: usize,
        found: usize
    },
    #[error("line {line_number}: could not parse {field} from {value:?}")]
    InvalidField {
        line_number: usize,
        field: &'static str,
        value: String
    },
    #[error("cannot write an {found} record to an {expected} report")]
    SchemaMismatch {
        expected: ReportSchema,
        found: ReportSchema
    },
    #[error(transparent)]
    Io(#[from] std::io::Error)
}

/// Parses one whitespace token into a typed field, tagging failures with position info
fn parse_field<T: FromStr>(line_number: usize, field: &'static str, value: &str) -> Result<T, ReportError> {
    value.parse().map_err(|_| ReportError::InvalidField {
        line_number,
        field,
        value: value.to_string()
    })
}

/// Builds a compact record from a token list that already passed the count check
fn parse_compact(line_number: usize, tokens: &[&str]) -> Result<AlignmentRecord, ReportError> {
    Ok(AlignmentRecord::Compact(CompactRecord {
        qname: tokens[0].to_string(),
        tname: tokens[1].to_string(),
        qstrand: parse_field::<Strand>(line_number, "qstrand", tokens[2])?,
        tstrand: parse_field::<Strand>(line_number, "tstrand", tokens[3])?,
        score: parse_field(line_number, "score", tokens[4])?,
        pctsimilarity: parse_field(line_number, "pctsimilarity", tokens[5])?,
        tstart: parse_field(line_number, "tstart", tokens[6])?,
        tend: parse_field(line_number, "tend", tokens[7])?,
        tlength: parse_field(line_number, "tlength", tokens[8])?,
        qstart: parse_field(line_number, "qstart", tokens[9])?,
        qend: parse_field(line_number, "qend", tokens[10])?,
        qlength: parse_field(line_number, "qlength", tokens[11])?,
        ncells: parse_field(line_number, "ncells", tokens[12])?
    }))
}

/// Builds a full record from a token list that already passed the count check
fn parse_full(line_number: usize, tokens: &[&str]) -> Result<AlignmentRecord, ReportError> {
    Ok(AlignmentRecord::Full(FullRecord {
        qname: tokens[0].to_string(),
        qlength: parse_field(line_number, "qlength", tokens[1])?,
        qstart: parse_field(line_number, "qstart", tokens[2])?,
        qend: parse_field(line_number, "qend", tokens[3])?,
        qstrand: parse_field::<Strand>(line_number, "qstrand", tokens[4])?,
        tname: tokens[5].to_string(),
        tlength: parse_field(line_number, "tlength", tokens[6])?,
        tstart: parse_field(line_number, "tstart", tokens[7])?,
        tend: parse_field(line_number, "tend", tokens[8])?,
        tstrand: parse_field::<Strand>(line_number, "tstrand", tokens[9])?,
        score: parse_field(line_number, "score", tokens[10])?,
        nmat: parse_field(line_number, "nmat", tokens[11])?,
        nmis: parse_field(line_number, "nmis", tokens[12])?,
        nins: parse_field(line_number, "nins", tokens[13])?,
        ndel: parse_field(line_number, "ndel", tokens[14])?,
        mapqv: parse_field(line_number, "mapqv", tokens[15])?,
        qstring: tokens[16].to_string(),
        astring: tokens[17].to_string(),
        tstring: tokens[18].to_string()
    }))
}

/// Lazy reader over an alignment report.
/// Header lines and the blank separator lines between records are skipped;
/// anything else that does not match the schema is a hard error.
pub struct ReportReader<R: BufRead> {
    reader: R,
    schema: ReportSchema,
    line_number: usize
}

impl ReportReader<BufReader<File>> {
    /// Opens a report, inferring the schema from the file extension.
    /// # Arguments
    /// * `filename` - the report to open, must end in .m1 or .m5
    /// # Errors
    /// * if the extension maps to no known schema
    /// * if the file does not open properly
    pub fn from_path(filename: &Path) -> Result<Self, ReportError> {
        let schema = match ReportSchema::from_path(filename) {
            Some(schema) => schema,
            None => return Err(ReportError::UnknownSchema(filename.to_path_buf()))
        };
        Self::from_path_with_schema(filename, schema)
    }

    /// Opens a report under an explicitly declared schema, ignoring the extension
    pub fn from_path_with_schema(filename: &Path, schema: ReportSchema) -> Result<Self, ReportError> {
        debug!("Opening {schema} alignment report {filename:?}");
        let file = File::open(filename)?;
        Ok(Self::new(BufReader::new(file), schema))
    }
}

impl<R: BufRead> ReportReader<R> {
    /// Wraps an already-open stream
    pub fn new(reader: R, schema: ReportSchema) -> Self {
        ReportReader {
            reader,
            schema,
            line_number: 0
        }
    }

    pub fn schema(&self) -> ReportSchema {
        self.schema
    }
}

impl<R: BufRead> Iterator for ReportReader<R> {
    type Item = Result<AlignmentRecord, ReportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {},
                Err(e) => return Some(Err(e.into()))
            };
            self.line_number += 1;

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                // blank separator between records
                continue;
            }
            if tokens[0] == ReportSchema::HEADER_TOKEN {
                // header line, metadata rather than a record
                continue;
            }
            if tokens.len() != self.schema.field_count() {
                return Some(Err(ReportError::FieldCount {
                    line_number: self.line_number,
                    schema: self.schema,
                    expected: self.schema.field_count(),
                    found: tokens.len()
                }));
            }

            return Some(match self.schema {
                ReportSchema::Compact => parse_compact(self.line_number, &tokens),
                ReportSchema::Full => parse_full(self.line_number, &tokens)
            });
        }
    }
}

/// Eagerly loads a whole report, schema inferred from the extension.
/// # Errors
/// * if the report cannot be opened or any record line is malformed
pub fn read_report(filename: &Path) -> Result<Vec<AlignmentRecord>, ReportError> {
    ReportReader::from_path(filename)?.collect()
}

/// Writes alignment records back out in the report layout:
/// one header line, then each record followed by a blank separator line.
pub struct ReportWriter<W: Write> {
    writer: W,
    schema: ReportSchema
}

impl ReportWriter<BufWriter<File>> {
    /// Creates a report file and writes the schema header.
    /// # Errors
    /// * if the file cannot be created or written
    pub fn to_path(filename: &Path, schema: ReportSchema) -> Result<Self, ReportError> {
        let file = File::create(filename)?;
        Self::new(BufWriter::new(file), schema)
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wraps an open stream and immediately writes the header line
    pub fn new(mut writer: W, schema: ReportSchema) -> Result<Self, ReportError> {
        writeln!(writer, "{}", schema.header_line())?;
        Ok(ReportWriter {
            writer,
            schema
        })
    }

    /// Writes one record plus its separator line.
    /// # Errors
    /// * if the record belongs to the other schema
    /// * if the underlying stream errors
    pub fn write_record(&mut self, record: &AlignmentRecord) -> Result<(), ReportError> {
        if record.schema() != self.schema {
            return Err(ReportError::SchemaMismatch {
                expected: self.schema,
                found: record.schema()
            });
        }
        writeln!(self.writer, "{}", record.to_report_line())?;
        writeln!(self.writer)?;
        Ok(())
    }

    /// Writes every record in a container, in order
    pub fn write_all<'a>(&mut self, records: impl IntoIterator<Item = &'a AlignmentRecord>) -> Result<(), ReportError> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Flushes the underlying stream
    pub fn flush(&mut self) -> Result<(), ReportError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn example_full_record() -> AlignmentRecord {
        AlignmentRecord::Full(FullRecord {
            qname: "Barcode0--0_Cluster0_Phase0_NumReads91".to_string(),
            qlength: 4, qstart: 0, qend: 4, qstrand: Strand::Forward,
            tname: "HLA_A*01:01:01:01".to_string(),
            tlength: 4, tstart: 0, tend: 4, tstrand: Strand::Reverse,
            score: -1800, nmat: 3, nmis: 1, nins: 0, ndel: 0, mapqv: 254,
            qstring: "ACGT".to_string(), astring: "|||*".to_string(), tstring: "ACGA".to_string()
        })
    }

    fn example_compact_record() -> AlignmentRecord {
        AlignmentRecord::Compact(CompactRecord {
            qname: "Barcode0--0_Cluster0_Phase0_NumReads91".to_string(),
            tname: "HLA_A*01:01:01:01".to_string(),
            qstrand: Strand::Forward,
            tstrand: Strand::Forward,
            score: -1800, pctsimilarity: 98.75,
            tstart: 0, tend: 4, tlength: 4,
            qstart: 0, qend: 4, qlength: 4,
            ncells: 16
        })
    }

    /// write N records, read them back, expect the same N records in order
    fn round_trip(records: &[AlignmentRecord], schema: ReportSchema) {
        let mut buffer: Vec<u8> = vec![];
        let mut writer = ReportWriter::new(&mut buffer, schema).unwrap();
        writer.write_all(records.iter()).unwrap();
        writer.flush().unwrap();

        let reader = ReportReader::new(Cursor::new(buffer), schema);
        let reloaded: Vec<AlignmentRecord> = reader.map(|entry| entry.unwrap()).collect();
        assert_eq!(records, reloaded.as_slice());
    }

    #[test]
    fn test_full_round_trip() {
        let mut second = example_full_record();
        if let AlignmentRecord::Full(record) = &mut second {
            record.qname = "Barcode0--0_Cluster1_Phase0_NumReads12".to_string();
            record.tname = "HLA_A*02:01:01:01".to_string();
            record.nmis = 0;
        }
        round_trip(&[example_full_record(), second], ReportSchema::Full);
    }

    #[test]
    fn test_compact_round_trip() {
        round_trip(&[example_compact_record()], ReportSchema::Compact);
    }

    #[test]
    fn test_header_skip() {
        let report = format!("{}\n{}\n", ReportSchema::Full.header_line(), example_full_record().to_report_line());
        let reader = ReportReader::new(Cursor::new(report), ReportSchema::Full);
        let records: Vec<AlignmentRecord> = reader.map(|entry| entry.unwrap()).collect();
        assert_eq!(records, vec![example_full_record()]);
    }

    #[test]
    fn test_field_count_error() {
        let reader = ReportReader::new(Cursor::new("only three tokens\n"), ReportSchema::Compact);
        let entries: Vec<Result<AlignmentRecord, ReportError>> = reader.collect();
        assert_eq!(entries.len(), 1);
        assert!(matches!(
            entries[0],
            Err(ReportError::FieldCount { line_number: 1, expected: 13, found: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_strand_error() {
        let mut line = example_compact_record().to_report_line();
        line = line.replace(" + ", " ? ");
        let reader = ReportReader::new(Cursor::new(line), ReportSchema::Compact);
        let entries: Vec<Result<AlignmentRecord, ReportError>> = reader.collect();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0], Err(ReportError::InvalidField { field: "qstrand", .. })));
    }

    #[test]
    fn test_unknown_schema() {
        let result = ReportReader::from_path(Path::new("alignments.tsv"));
        assert!(matches!(result, Err(ReportError::UnknownSchema(_))));
    }

    #[test]
    fn test_schema_mismatch_on_write() {
        let mut buffer: Vec<u8> = vec![];
        let mut writer = ReportWriter::new(&mut buffer, ReportSchema::Compact).unwrap();
        let result = writer.write_record(&example_full_record());
        assert!(matches!(result, Err(ReportError::SchemaMismatch { .. })));
    }
}
