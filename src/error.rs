//! Error types for log parsing

use thiserror::Error;

/// Failures raised while reading an Openambit log.
///
/// At document level (`Log`, `Header`) these abort the whole conversion.
/// At sample level they only cause that single sample to be dropped.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("missing element: {0}")]
    MissingElement(&'static str),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}
