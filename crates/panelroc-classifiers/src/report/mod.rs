//! Selection tallies, ROC plots and standalone HTML reports.
pub mod plots;
pub mod report;
pub mod tally;
