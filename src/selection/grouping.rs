
use std::collections::{BTreeMap, BTreeSet};

use crate::data_types::alignment_record::AlignmentRecord;
use crate::selection::config::GroupingMethod;

/// Named groups of alignment records; BTreeMap keeps group iteration
/// deterministic, members keep their first-seen order
pub type AlignmentGroups = BTreeMap<String, Vec<AlignmentRecord>>;

/// The prefix consensus tools put in front of the barcode pair
const BARCODE_PREFIX: &str = "Barcode";
/// The token that separates the barcode from the cluster suffix
const CLUSTER_SEPARATOR: &str = "_Cluster";

/// Derives the locus code from a reference allele name.
/// The reference part before the first '*' ends in the locus,
/// e.g. "HLA_A*01:01:01:01" aligns to locus "A".
pub fn target_locus(tname: &str) -> &str {
    let reference = tname.split('*').next().unwrap_or_default();
    reference.rsplit('_').next().unwrap_or_default()
}

/// Reduces a query name to its sample barcode,
/// e.g. "Barcode0--0_Cluster1_Phase0_NumReads5" came from sample "0--0"
pub fn barcode_key(qname: &str) -> &str {
    let mut name = qname.strip_prefix(BARCODE_PREFIX).unwrap_or(qname);
    name = name.strip_prefix('_').unwrap_or(name);
    match name.find(CLUSTER_SEPARATOR) {
        Some(index) => &name[..index],
        None => name
    }
}

/// Groups records by the locus of their reference target.
/// Records aligned to a locus outside the allow-list are dropped.
fn group_by_locus(records: Vec<AlignmentRecord>, loci: &BTreeSet<String>) -> AlignmentGroups {
    let mut groups = AlignmentGroups::new();
    for record in records {
        let locus = target_locus(record.tname()).to_string();
        if !loci.contains(&locus) {
            continue;
        }
        groups.entry(locus).or_default().push(record);
    }
    groups
}

/// Groups records by the barcode embedded in their query name
fn group_by_barcode(records: Vec<AlignmentRecord>) -> AlignmentGroups {
    let mut groups = AlignmentGroups::new();
    for record in records {
        let barcode = barcode_key(record.qname()).to_string();
        groups.entry(barcode).or_default().push(record);
    }
    groups
}

/// Groups records by barcode, then by locus within each barcode.
/// Barcode/locus pairs with no surviving records simply never materialize.
fn group_by_both(records: Vec<AlignmentRecord>, loci: &BTreeSet<String>) -> AlignmentGroups {
    let mut groups = AlignmentGroups::new();
    for (barcode, barcode_records) in group_by_barcode(records) {
        for (locus, locus_records) in group_by_locus(barcode_records, loci) {
            groups.insert(format!("{barcode}_{locus}"), locus_records);
        }
    }
    groups
}

/// Treats every record as its own singleton group, keyed by query name.
/// A repeated query name keeps only its last record.
fn group_by_all(records: Vec<AlignmentRecord>) -> AlignmentGroups {
    let mut groups = AlignmentGroups::new();
    for record in records {
        groups.insert(record.qname().to_string(), vec![record]);
    }
    groups
}

/// Partitions alignment records into genotyping groups.
/// # Arguments
/// * `records` - the alignment records to partition
/// * `method` - the partitioning strategy
/// * `loci` - allow-list applied by the locus-based strategies
pub fn group_alignments(records: Vec<AlignmentRecord>, method: GroupingMethod, loci: &BTreeSet<String>) -> AlignmentGroups {
    match method {
        GroupingMethod::Locus => group_by_locus(records, loci),
        GroupingMethod::Barcode => group_by_barcode(records),
        GroupingMethod::Both => group_by_both(records, loci),
        GroupingMethod::All => group_by_all(records)
    }
}
