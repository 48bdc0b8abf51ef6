//! Data models for the TrustPaper certificate service.
//!
//! JSON field names are camelCase, except where the web forms fix a name (`class`).

mod design;
mod notification;
mod student;

pub use design::*;
pub use notification::*;
pub use student::*;
