//! Output formatting and reporting

pub mod json;
pub mod text;
