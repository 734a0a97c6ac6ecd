
/// Sequence file loading/saving and output path handling
pub mod file_io;
/// Functions for sequence manipulation
pub mod sequence;
