// Attendee code value object
// A format-checked code as printed on the badge QR

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::services::validator;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendeeCode(String);

impl AttendeeCode {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validator::validate_code(raw).map(AttendeeCode)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_goodie_bag_eligible(&self) -> bool {
        validator::is_goodie_bag_eligible(&self.0)
    }
}

impl fmt::Display for AttendeeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AttendeeCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
