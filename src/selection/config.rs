
use lazy_static::lazy_static;
use log::warn;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::selection::errors::ConfigError;

lazy_static! {
    /// Contains all HLA loci we currently support; BTreeSet keeps them ordered for iterating and searching
    pub static ref SUPPORTED_LOCI: BTreeSet<String> = {
        let supported_vec = [
            // Class I
            "A", "B", "C",
            // Class II
            "DPA1", "DPB1",
            "DQA1", "DQB1",
            "DRB1",
            // add any new ones here
        ];
        supported_vec.iter()
            .map(|locus| locus.to_string())
            .collect()
    };
}

/// The second-allele threshold used when the caller does not provide one
pub const DEFAULT_MIN_FRACTION: f64 = 0.15;

/// How alignment records are partitioned into genotyping groups
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum GroupingMethod {
    /// one group per reference locus
    #[default]
    Locus,
    /// one group per sample barcode
    Barcode,
    /// one group per barcode/locus pair
    Both,
    /// every record is its own group
    All
}

/// How candidates are ordered within a group before selection
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum_macros::Display, strum_macros::EnumString)]
pub enum SortMetric {
    /// descending by the read-support count embedded in the sequence name
    #[strum(to_string = "reads")]
    ReadSupport,
    /// descending by predicted accuracy from the quality values
    #[default]
    #[strum(to_string = "accuracy")]
    Accuracy,
    /// constant score, i.e. keep the insertion order
    #[strum(to_string = "none")]
    InsertionOrder,
    /// no scoring at all, trust the order the aligner ranked them in
    #[strum(to_string = "best")]
    Best
}

/// Immutable, fully-validated settings for one selection pass.
/// Construction is the single validation point, so a bad method string or an
/// out-of-range fraction can never reach the grouping or selection logic.
#[derive(Clone, Debug)]
pub struct SelectionConfig {
    method: GroupingMethod,
    sort: SortMetric,
    loci: BTreeSet<String>,
    min_fraction: f64
}

impl SelectionConfig {
    /// Builds a config from already-typed parts, validating loci and the fraction.
    /// Unsupported loci are dropped with a warning; an empty remainder is an error.
    /// # Errors
    /// * if no supplied locus is in the supported set
    /// * if `min_fraction` is not strictly between 0 and 1
    pub fn new(method: GroupingMethod, sort: SortMetric, loci: &[String], min_fraction: f64) -> Result<SelectionConfig, ConfigError> {
        let mut valid_loci: BTreeSet<String> = Default::default();
        for locus in loci.iter() {
            if SUPPORTED_LOCI.contains(locus) {
                valid_loci.insert(locus.clone());
            } else {
                warn!("Ignoring unsupported locus {locus:?}");
            }
        }
        if valid_loci.is_empty() {
            return Err(ConfigError::NoValidLoci);
        }

        if !(min_fraction > 0.0 && min_fraction < 1.0) {
            return Err(ConfigError::InvalidMinFraction(min_fraction));
        }

        Ok(SelectionConfig {
            method,
            sort,
            loci: valid_loci,
            min_fraction
        })
    }

    /// Builds a config from the string-valued CLI inputs.
    /// # Errors
    /// * if the method or sort label is unknown
    /// * anything `SelectionConfig::new` rejects
    pub fn from_strings(method: &str, sort: &str, loci: &[String], min_fraction: f64) -> Result<SelectionConfig, ConfigError> {
        let method = GroupingMethod::from_str(method)
            .map_err(|_| ConfigError::InvalidGroupingMethod(method.to_string()))?;
        let sort = SortMetric::from_str(sort)
            .map_err(|_| ConfigError::InvalidSortMetric(sort.to_string()))?;
        SelectionConfig::new(method, sort, loci, min_fraction)
    }

    pub fn method(&self) -> GroupingMethod {
        self.method
    }

    pub fn sort(&self) -> SortMetric {
        self.sort
    }

    pub fn loci(&self) -> &BTreeSet<String> {
        &self.loci
    }

    pub fn min_fraction(&self) -> f64 {
        self.min_fraction
    }
}
