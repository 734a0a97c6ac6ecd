
use lazy_static::lazy_static;
use regex::Regex;
use rustc_hash::FxHashMap as HashMap;

use crate::data_types::sequence_record::SequenceRecord;
use crate::selection::config::SortMetric;
use crate::selection::errors::SelectionError;

lazy_static! {
    /// Matches the read-support tag consensus tools embed in sequence names
    pub static ref NUM_READS_REGEX: Regex = Regex::new(r"NumReads(?<count>\d+)").unwrap();
}

/// Highest Phred value we accept before assuming the quality track is corrupt
const MAX_PHRED_VALUE: u8 = 93;
/// Number of decimal digits accuracy values are rounded to
const ACCURACY_PRECISION: f64 = 1e7;

/// Extracts the read-support count from a sequence name, e.g.
/// "Barcode0--0_Cluster0_Phase0_NumReads91" supports 91 reads.
/// # Errors
/// * if the name does not contain a parsable NumReads tag
pub fn read_support(name: &str) -> Result<u64, SelectionError> {
    let missing = || SelectionError::MissingReadSupport(name.to_string());
    let captures = NUM_READS_REGEX.captures(name).ok_or_else(missing)?;
    captures["count"].parse::<u64>().map_err(|_| missing())
}

/// Read support of a record, keyed off its id
pub fn record_support(record: &SequenceRecord) -> Result<u64, SelectionError> {
    read_support(record.id())
}

/// Converts a Phred quality value into the probability the base call is correct
fn quality_to_p(quality: u8) -> f64 {
    1.0 - 10.0_f64.powf(-f64::from(quality) / 10.0)
}

/// Predicted accuracy of a record, the mean per-base correctness probability
/// rounded to seven decimal digits.
/// # Errors
/// * if the record has no quality values
/// * if any quality value is outside the Phred range
pub fn record_accuracy(record: &SequenceRecord) -> Result<f64, SelectionError> {
    let quality = match record.quality() {
        Some(quality) if !quality.is_empty() => quality,
        _ => return Err(SelectionError::MissingQuality(record.id().to_string()))
    };
    if let Some(&bad) = quality.iter().find(|&&quality| quality > MAX_PHRED_VALUE) {
        return Err(SelectionError::QualityOutOfRange {
            name: record.id().to_string(),
            quality: bad
        });
    }

    let total: f64 = quality.iter().map(|&quality| quality_to_p(quality)).sum();
    let average = total / quality.len() as f64;
    Ok((average * ACCURACY_PRECISION).round() / ACCURACY_PRECISION)
}

/// Builds the per-id score lookup the group sort runs on.
/// Returns `None` for the pass-through metric, which keeps the order the
/// aligner already ranked the records in.
/// # Errors
/// * if the metric needs a value some record cannot provide
pub fn score_sequences(records: &[SequenceRecord], metric: SortMetric) -> Result<Option<HashMap<String, f64>>, SelectionError> {
    let mut scores: HashMap<String, f64> = Default::default();
    match metric {
        SortMetric::ReadSupport => {
            for record in records.iter() {
                scores.insert(record.id().to_string(), record_support(record)? as f64);
            }
        },
        SortMetric::Accuracy => {
            for record in records.iter() {
                scores.insert(record.id().to_string(), record_accuracy(record)?);
            }
        },
        SortMetric::InsertionOrder => {
            // constant scores and a stable sort leave the order untouched
            for record in records.iter() {
                scores.insert(record.id().to_string(), 1.0);
            }
        },
        SortMetric::Best => {
            return Ok(None);
        }
    }
    Ok(Some(scores))
}
