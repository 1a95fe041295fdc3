//! File input and output: feature tables in, fold results out.
pub mod results;
pub mod table;
