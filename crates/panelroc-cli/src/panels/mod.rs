pub mod cv;
pub mod input;
pub mod report;
pub mod util;
pub mod validate;
