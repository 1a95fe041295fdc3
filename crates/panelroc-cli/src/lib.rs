pub mod cli;
pub mod panels;
