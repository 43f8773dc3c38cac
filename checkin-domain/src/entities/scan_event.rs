// Scan event entity
// One check-in or goodie-bag mutation, sent once to the attendee store

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AttendeeCode, ScanMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    pub code: String,
    pub mode: ScanMode,
    pub timestamp: String,
    pub user_name: String,
}

impl ScanEvent {
    pub fn new(code: &AttendeeCode, mode: ScanMode, at: DateTime<Utc>, user_name: &str) -> Self {
        Self {
            code: code.as_str().to_string(),
            mode,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            user_name: user_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
    Camera,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanIntent {
    #[default]
    Submit,
    Lookup,
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub text: String,
    pub source: ScanSource,
    pub intent: ScanIntent,
}

impl ScanRequest {
    pub fn camera(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ScanSource::Camera,
            intent: ScanIntent::Submit,
        }
    }

    pub fn manual(text: impl Into<String>, intent: ScanIntent) -> Self {
        Self {
            text: text.into(),
            source: ScanSource::Manual,
            intent,
        }
    }
}
