
/// Typed records for the pairwise alignment report schemas
pub mod alignment_record;
/// Named nucleotide sequences with optional quality values
pub mod sequence_record;
