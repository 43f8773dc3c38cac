// Attendee entities
// Snapshots returned by the remote store and the record merged from them

use serde::{Deserialize, Serialize};

use crate::value_objects::AttendeeCode;

pub const UNKNOWN_FIELD: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(default)]
    pub is_checked_in: bool,
    #[serde(default)]
    pub check_in_time: Option<String>,
    #[serde(default)]
    pub has_goodie_bag: bool,
    #[serde(default)]
    pub goodie_bag_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub timestamp: String,
}

impl IdentitySnapshot {
    /// Placeholder used when the identity lookup fails.
    pub fn unknown() -> Self {
        Self {
            firstname: UNKNOWN_FIELD.to_string(),
            lastname: String::new(),
            email: UNKNOWN_FIELD.to_string(),
            timestamp: UNKNOWN_FIELD.to_string(),
        }
    }

    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.firstname.trim(), self.lastname.trim());
        let name = name.trim();
        if name.is_empty() {
            UNKNOWN_FIELD.to_string()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    pub code: String,
    pub name: String,
    pub email: String,
    pub registered_at: String,
    pub is_checked_in: bool,
    pub check_in_time: Option<String>,
    pub has_goodie_bag: bool,
    pub goodie_bag_time: Option<String>,
}

impl AttendeeRecord {
    pub fn merge(code: &AttendeeCode, identity: &IdentitySnapshot, status: &StatusSnapshot) -> Self {
        Self {
            code: code.as_str().to_string(),
            name: identity.display_name(),
            email: non_empty_or_unknown(&identity.email),
            registered_at: non_empty_or_unknown(&identity.timestamp),
            is_checked_in: status.is_checked_in,
            check_in_time: non_empty(status.check_in_time.as_deref()),
            has_goodie_bag: status.has_goodie_bag,
            goodie_bag_time: non_empty(status.goodie_bag_time.as_deref()),
        }
    }
}

/// Display-ready projection of an attendee, every field already a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeView {
    pub code: String,
    pub name: String,
    pub email: String,
    pub registered_at: String,
    pub check_in: String,
    pub goodie_bag: String,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

fn non_empty_or_unknown(value: &str) -> String {
    non_empty(Some(value)).unwrap_or_else(|| UNKNOWN_FIELD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_snapshot_accepts_missing_and_null_times() {
        let status: StatusSnapshot = serde_json::from_str(
            r#"{"isCheckedIn":true,"checkInTime":"2025-05-06T09:00:00Z","hasGoodieBag":false,"goodieBagTime":null}"#,
        )
        .expect("status");
        assert!(status.is_checked_in);
        assert_eq!(status.check_in_time.as_deref(), Some("2025-05-06T09:00:00Z"));
        assert_eq!(status.goodie_bag_time, None);
    }

    #[test]
    fn merge_joins_names_and_drops_blank_times() {
        let code = AttendeeCode::parse("A1").expect("code");
        let identity = IdentitySnapshot {
            firstname: "Jane".to_string(),
            lastname: "Doe".to_string(),
            email: "j@x.com".to_string(),
            timestamp: "2025-05-06T12:00:00Z".to_string(),
        };
        let status = StatusSnapshot {
            is_checked_in: true,
            check_in_time: Some("  ".to_string()),
            ..StatusSnapshot::default()
        };

        let record = AttendeeRecord::merge(&code, &identity, &status);
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.email, "j@x.com");
        assert_eq!(record.check_in_time, None);
        assert!(record.is_checked_in);
    }

    #[test]
    fn unknown_identity_renders_placeholders() {
        let code = AttendeeCode::parse("A1").expect("code");
        let record = AttendeeRecord::merge(&code, &IdentitySnapshot::unknown(), &StatusSnapshot::default());
        assert_eq!(record.name, UNKNOWN_FIELD);
        assert_eq!(record.email, UNKNOWN_FIELD);
        assert_eq!(record.registered_at, UNKNOWN_FIELD);
    }
}
