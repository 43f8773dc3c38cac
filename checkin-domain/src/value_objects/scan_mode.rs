// Scan mode value object

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScanMode {
    #[default]
    #[serde(rename = "Check-in")]
    CheckIn,
    #[serde(rename = "Goodie Bag")]
    GoodieBag,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::CheckIn => "Check-in",
            ScanMode::GoodieBag => "Goodie Bag",
        }
    }

    /// Lenient parser for user-facing input such as `goodie-bag` or `CHECKIN`.
    pub fn parse(value: &str) -> Option<Self> {
        let compact = value
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "checkin" => Some(ScanMode::CheckIn),
            "goodiebag" | "goodie" | "gb" => Some(ScanMode::GoodieBag),
            _ => None,
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
