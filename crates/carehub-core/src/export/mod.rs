//! Export of dashboard reports for sharing and spreadsheets.

mod dashboard;

pub use dashboard::*;
