
/// Contains all the CLI related functionality
pub mod cli;
/// Contains the specialized data types that are shared across the tooling
pub mod data_types;
/// Contains the orientation pass that flips sequences onto the reference strand
pub mod orientation;
/// Contains the reader and writer for pairwise alignment reports
pub mod report_io;
/// Contains the grouping, scoring, and allele selection machinery
pub mod selection;
/// Contains generic utilities that are handy wrappers
pub mod util;
