
/// Validated selection configuration and the supported locus set
pub mod config;
/// Typed errors for configuration and selection failures
pub mod errors;
/// Partitioning of alignment records into genotyping groups
pub mod grouping;
/// Read-support and accuracy scoring of candidate sequences
pub mod scoring;
/// The per-group allele selection heuristic and whole-file driver
pub mod selector;
