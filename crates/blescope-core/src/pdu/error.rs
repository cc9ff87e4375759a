use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PduError {
    #[error("PDU body too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("extended header length {declared} exceeds PDU body of {available} bytes")]
    ExtHeaderLength { declared: usize, available: usize },
    #[error("extended header field {field} needs {needed} bytes, {available} left")]
    ExtHeaderField {
        field: &'static str,
        needed: usize,
        available: usize,
    },
}
