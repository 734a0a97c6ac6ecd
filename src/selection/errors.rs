
/// Errors raised while validating a selection configuration.
/// These all surface before any alignment or sequence data is touched.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid record grouping method: {0:?}")]
    InvalidGroupingMethod(String),
    #[error("invalid sorting metric: {0:?}")]
    InvalidSortMetric(String),
    #[error("no valid loci supplied")]
    NoValidLoci,
    #[error("minimum fraction must be strictly between 0.0 and 1.0, got {0}")]
    InvalidMinFraction(f64)
}

/// Errors raised while scoring candidates or selecting alleles, these abort
/// the whole selection rather than producing partial output
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error("sequence name {0:?} does not contain a NumReads tag")]
    MissingReadSupport(String),
    #[error("sequence {0:?} has no quality values to score accuracy from")]
    MissingQuality(String),
    #[error("sequence {name:?} has quality value {quality}, outside the Phred range")]
    QualityOutOfRange {
        name: String,
        quality: u8
    },
    #[error("alignment query {0:?} has no matching sequence record")]
    UnmatchedQuery(String)
}
