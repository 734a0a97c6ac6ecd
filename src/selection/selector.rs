
use log::{debug, info};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Serialize;
use simple_error::bail;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::data_types::alignment_record::AlignmentRecord;
use crate::data_types::sequence_record::{SequenceFormat, SequenceRecord};
use crate::report_io::read_report;
use crate::selection::config::SelectionConfig;
use crate::selection::errors::SelectionError;
use crate::selection::grouping::{group_alignments, AlignmentGroups};
use crate::selection::scoring::{read_support, score_sequences};
use crate::util::file_io::{derived_output_path, read_sequence_file, write_sequence_file};

/// Count of records that survived selection, reported to the caller
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SelectionSummary {
    /// number of sequences chosen as allele candidates
    pub selected: usize,
    /// number of sequences that went in
    pub total: usize
}

/// Orders each group descending by the score lookup; the sort is stable, so
/// tied candidates keep their original order. No lookup means the groups are
/// already ranked and stay untouched.
/// # Errors
/// * if an alignment query has no entry in the lookup
fn sort_groups(groups: &mut AlignmentGroups, scores: Option<&HashMap<String, f64>>) -> Result<(), SelectionError> {
    let scores = match scores {
        Some(scores) => scores,
        None => return Ok(())
    };

    for group in groups.values_mut() {
        // surface the unmatched query before sorting so the failure is deterministic
        for record in group.iter() {
            if !scores.contains_key(record.qname()) {
                return Err(SelectionError::UnmatchedQuery(record.qname().to_string()));
            }
        }
        group.sort_by(|a, b| {
            scores[b.qname()].partial_cmp(&scores[a.qname()]).unwrap_or(Ordering::Equal)
        });
    }
    Ok(())
}

/// Runs the heterozygote heuristic on one ranked group, adding 0-2 query
/// names to the selected set.
///
/// The top-ranked record is always an allele. Lower-ranked records that look
/// like the same allele (same target, same mismatch count) fold their read
/// support into the leader's total, so a fragmented top allele cannot starve
/// a real second allele of its threshold. The first divergent record whose
/// own support beats `accumulated * min_fraction` is the second allele and
/// ends the scan.
/// # Errors
/// * if any scanned record lacks a read-support tag
fn select_from_group(group: &[AlignmentRecord], min_fraction: f64, selected: &mut HashSet<String>) -> Result<(), SelectionError> {
    let (first, rest) = match group.split_first() {
        Some(pair) => pair,
        // an empty group has nothing to offer, not an error
        None => return Ok(())
    };
    selected.insert(first.qname().to_string());

    let mut first_support = read_support(first.qname())?;
    for record in rest.iter() {
        let support = read_support(record.qname())?;
        if record.tname() == first.tname() && record.mismatch_count() == first.mismatch_count() {
            // same apparent reference allele, treat it as more evidence for the leader
            first_support += support;
        } else if support as f64 > first_support as f64 * min_fraction {
            selected.insert(record.qname().to_string());
            break;
        }
    }
    Ok(())
}

/// Selects the 1-2 allele candidates per group from a sequence collection.
/// The returned records are the input records filtered to the selected query
/// names, in their original order.
/// # Arguments
/// * `sequences` - every candidate consensus sequence in the batch
/// * `alignments` - the alignment records tying candidates to reference alleles
/// * `config` - validated grouping/sorting/threshold settings
/// # Errors
/// * if scoring or the per-group scan hits a record it cannot score
pub fn select_sequences(
    sequences: &[SequenceRecord], alignments: Vec<AlignmentRecord>, config: &SelectionConfig
) -> Result<(Vec<SequenceRecord>, SelectionSummary), SelectionError> {
    debug!("Grouping {} alignments with method \"{}\"", alignments.len(), config.method());
    let mut groups = group_alignments(alignments, config.method(), config.loci());

    debug!("Sorting {} groups with metric \"{}\"", groups.len(), config.sort());
    let scores = score_sequences(sequences, config.sort())?;
    sort_groups(&mut groups, scores.as_ref())?;

    let mut selected_ids: HashSet<String> = Default::default();
    for group in groups.values() {
        select_from_group(group, config.min_fraction(), &mut selected_ids)?;
    }

    let selected: Vec<SequenceRecord> = sequences.iter()
        .filter(|record| selected_ids.contains(record.id()))
        .cloned()
        .collect();
    let summary = SelectionSummary {
        selected: selected.len(),
        total: sequences.len()
    };
    info!("Selected {} sequences from {} total for further analysis", summary.selected, summary.total);
    Ok((selected, summary))
}

/// Whole-file driver: reads the candidates and their alignment report, runs
/// selection, and writes the survivors next to the input.
/// # Arguments
/// * `input_filename` - FASTA/FASTQ of candidate sequences
/// * `align_filename` - alignment report for the candidates
/// * `output_filename` - optional explicit output; derived as `<input>.selected.<type>` otherwise
/// * `config` - validated selection settings
/// # Errors
/// * if any file cannot be read/written, or selection fails
pub fn select_allele_file(
    input_filename: &Path, align_filename: &Path, output_filename: Option<&Path>, config: &SelectionConfig
) -> Result<(PathBuf, SelectionSummary), Box<dyn std::error::Error>> {
    info!("Selecting allele candidates from {input_filename:?}");
    let sequences = read_sequence_file(input_filename)?;

    let output_filename = match output_filename {
        Some(filename) => filename.to_path_buf(),
        None => derived_output_path(input_filename, "selected")?
    };
    let output_format = match SequenceFormat::from_path(&output_filename) {
        Some(format) => format,
        None => bail!("Output file must be either FASTA or FASTQ: {output_filename:?}")
    };

    let alignments = read_report(align_filename)?;
    let (selected, summary) = select_sequences(&sequences, alignments, config)?;

    write_sequence_file(&output_filename, &selected, output_format)?;
    Ok((output_filename, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::alignment_record::{FullRecord, ReportSchema, Strand};
    use crate::report_io::ReportWriter;
    use crate::selection::config::{GroupingMethod, SortMetric, DEFAULT_MIN_FRACTION};

    fn alignment(qname: &str, tname: &str, nmis: u64) -> AlignmentRecord {
        AlignmentRecord::Full(FullRecord {
            qname: qname.to_string(),
            qlength: 100, qstart: 0, qend: 100, qstrand: Strand::Forward,
            tname: tname.to_string(),
            tlength: 100, tstart: 0, tend: 100, tstrand: Strand::Forward,
            score: -500, nmat: 100 - nmis, nmis, nins: 0, ndel: 0, mapqv: 254,
            qstring: String::new(), astring: String::new(), tstring: String::new()
        })
    }

    fn sequence(id: &str) -> SequenceRecord {
        SequenceRecord::new(id.to_string(), b"ACGT".to_vec())
    }

    fn config(sort: SortMetric, min_fraction: f64) -> SelectionConfig {
        let loci: Vec<String> = vec!["A".to_string()];
        SelectionConfig::new(GroupingMethod::Locus, sort, &loci, min_fraction).unwrap()
    }

    /// group scanned in given order: leader, a same-allele fragment, a divergent candidate
    fn two_allele_group() -> Vec<AlignmentRecord> {
        vec![
            alignment("r1_NumReads100", "HLA_A*01:01", 2),
            alignment("r3_NumReads5", "HLA_A*01:01", 2),
            alignment("r2_NumReads40", "HLA_A*02:01", 1)
        ]
    }

    #[test]
    fn test_two_allele_selection() {
        // r3 folds into the leader (support 105); r2 clears 105 * 0.15 = 15.75
        let mut selected: HashSet<String> = Default::default();
        select_from_group(&two_allele_group(), DEFAULT_MIN_FRACTION, &mut selected).unwrap();

        let mut ids: Vec<&str> = selected.iter().map(|id| id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["r1_NumReads100", "r2_NumReads40"]);
    }

    #[test]
    fn test_no_qualifying_second_allele() {
        // same group, but the divergent candidate only has 10 reads, under the 15.75 bar
        let group = vec![
            alignment("r1_NumReads100", "HLA_A*01:01", 2),
            alignment("r3_NumReads5", "HLA_A*01:01", 2),
            alignment("r2_NumReads10", "HLA_A*02:01", 1)
        ];
        let mut selected: HashSet<String> = Default::default();
        select_from_group(&group, DEFAULT_MIN_FRACTION, &mut selected).unwrap();

        assert_eq!(selected.len(), 1);
        assert!(selected.contains("r1_NumReads100"));
    }

    #[test]
    fn test_first_qualifying_candidate_wins() {
        // both divergent candidates clear the bar, only the higher-ranked one is taken
        let group = vec![
            alignment("r1_NumReads100", "HLA_A*01:01", 2),
            alignment("r2_NumReads60", "HLA_A*02:01", 1),
            alignment("r4_NumReads50", "HLA_A*03:01", 0)
        ];
        let mut selected: HashSet<String> = Default::default();
        select_from_group(&group, DEFAULT_MIN_FRACTION, &mut selected).unwrap();

        assert_eq!(selected.len(), 2);
        assert!(selected.contains("r2_NumReads60"));
        assert!(!selected.contains("r4_NumReads50"));
    }

    #[test]
    fn test_empty_group_contributes_nothing() {
        let mut selected: HashSet<String> = Default::default();
        select_from_group(&[], DEFAULT_MIN_FRACTION, &mut selected).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_missing_support_tag_fails() {
        let group = vec![alignment("untagged_consensus", "HLA_A*01:01", 2)];
        let mut selected: HashSet<String> = Default::default();
        let result = select_from_group(&group, DEFAULT_MIN_FRACTION, &mut selected);
        assert_eq!(result.unwrap_err(), SelectionError::MissingReadSupport("untagged_consensus".to_string()));
    }

    #[test]
    fn test_threshold_monotonicity() {
        // raising min_fraction can only drop the second allele, never add one;
        // the leader survives any threshold
        let mut previous_count = usize::MAX;
        for min_fraction in [0.05, 0.15, 0.35, 0.39] {
            let mut selected: HashSet<String> = Default::default();
            select_from_group(&two_allele_group(), min_fraction, &mut selected).unwrap();
            assert!(selected.contains("r1_NumReads100"));
            assert!(selected.len() <= previous_count);
            previous_count = selected.len();
        }

        // 40 > 105 * 0.38 but not 105 * 0.39, the boundary sits between these two
        let mut selected: HashSet<String> = Default::default();
        select_from_group(&two_allele_group(), 0.38, &mut selected).unwrap();
        assert_eq!(selected.len(), 2);
        let mut selected: HashSet<String> = Default::default();
        select_from_group(&two_allele_group(), 0.39, &mut selected).unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_select_sequences_end_to_end() {
        // read-support sorting puts r1 first even though the report lists r2 first
        let sequences = vec![
            sequence("r2_NumReads40"),
            sequence("r1_NumReads100"),
            sequence("r3_NumReads5"),
            sequence("unaligned_NumReads7")
        ];
        let alignments = vec![
            alignment("r2_NumReads40", "HLA_A*02:01", 1),
            alignment("r1_NumReads100", "HLA_A*01:01", 2),
            alignment("r3_NumReads5", "HLA_A*01:01", 2)
        ];
        let config = config(SortMetric::ReadSupport, DEFAULT_MIN_FRACTION);
        let (selected, summary) = select_sequences(&sequences, alignments, &config).unwrap();

        // output preserves the original collection order, not rank order
        let ids: Vec<&str> = selected.iter().map(|record| record.id()).collect();
        assert_eq!(ids, vec!["r2_NumReads40", "r1_NumReads100"]);
        assert_eq!(summary, SelectionSummary { selected: 2, total: 4 });
    }

    #[test]
    fn test_stable_sort_keeps_tied_order() {
        // constant scores: the report order is the rank order
        let sequences = vec![
            sequence("r2_NumReads40"),
            sequence("r1_NumReads100"),
            sequence("r3_NumReads5")
        ];
        let alignments = two_allele_group();
        let config = config(SortMetric::InsertionOrder, DEFAULT_MIN_FRACTION);
        let (selected, _summary) = select_sequences(&sequences, alignments, &config).unwrap();

        let ids: Vec<&str> = selected.iter().map(|record| record.id()).collect();
        assert_eq!(ids, vec!["r2_NumReads40", "r1_NumReads100"]);
    }

    #[test]
    fn test_select_allele_file_driver() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input_filename = temp_dir.path().join("consensus.fasta");
        std::fs::write(
            &input_filename,
            ">r2_NumReads40\nACGT\n>r1_NumReads100\nGGCC\n>r3_NumReads5\nTTAA\n"
        ).unwrap();

        let align_filename = temp_dir.path().join("consensus.m5");
        let mut writer = ReportWriter::to_path(&align_filename, ReportSchema::Full).unwrap();
        writer.write_all([
            alignment("r2_NumReads40", "HLA_A*02:01", 1),
            alignment("r1_NumReads100", "HLA_A*01:01", 2),
            alignment("r3_NumReads5", "HLA_A*01:01", 2)
        ].iter()).unwrap();
        writer.flush().unwrap();

        let config = config(SortMetric::ReadSupport, DEFAULT_MIN_FRACTION);
        let (output_filename, summary) = select_allele_file(
            &input_filename, &align_filename, None, &config
        ).unwrap();

        assert_eq!(output_filename, temp_dir.path().join("consensus.selected.fasta"));
        let written = read_sequence_file(&output_filename).unwrap();
        let ids: Vec<&str> = written.iter().map(|record| record.id()).collect();
        assert_eq!(ids, vec!["r2_NumReads40", "r1_NumReads100"]);
        assert_eq!(summary, SelectionSummary { selected: 2, total: 3 });
    }

    #[test]
    fn test_unmatched_query_fails() {
        let sequences = vec![sequence("r1_NumReads100")];
        let alignments = vec![
            alignment("r1_NumReads100", "HLA_A*01:01", 2),
            alignment("phantom_NumReads9", "HLA_A*02:01", 1)
        ];
        let config = config(SortMetric::ReadSupport, DEFAULT_MIN_FRACTION);
        let result = select_sequences(&sequences, alignments, &config);
        assert_eq!(
            result.unwrap_err(),
            SelectionError::UnmatchedQuery("phantom_NumReads9".to_string())
        );
    }
}
