use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("code must not be empty")]
    EmptyCode,
    #[error("code is longer than {max} characters")]
    CodeTooLong { max: usize },
    #[error("code contains unsupported character '{0}'")]
    CodeCharacter(char),
    #[error("invalid ip address '{0}'")]
    InvalidIp(String),
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),
}

/// Failure kinds a scan run can surface. Only `LockBusy` and `InvalidCode`
/// end a run before it starts; the others are recorded on the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ScanError {
    #[error("a scan is already being processed")]
    LockBusy,
    #[error("invalid code: {0}")]
    InvalidCode(String),
    #[error("code '{0}' is not eligible for a goodie bag")]
    IneligibleGoodieBag(String),
    #[error("status lookup failed: {0}")]
    StatusFetch(String),
    #[error("identity lookup failed: {0}")]
    IdentityFetch(String),
    #[error("submission failed: {0}")]
    Submission(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no code found in frame")]
    DecodeMiss,
    #[error("camera stream interrupted: {0}")]
    StreamInterrupted(String),
    #[error("camera error: {0}")]
    Other(String),
}
