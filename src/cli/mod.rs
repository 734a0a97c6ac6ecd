
/// the main CLI module
pub mod core;
/// the orient CLI subcommand for normalizing sequence orientation
pub mod orient;
/// the select CLI subcommand for picking allele candidates
pub mod select;
