//! Domain models for CareHub reporting.

mod appointment;
mod raw;
mod report;
mod session;
mod staff;

pub use appointment::*;
pub use raw::*;
pub use report::*;
pub use session::*;
pub use staff::*;
