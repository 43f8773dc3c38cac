// Record -> view projection
// Pure, so rendering decisions can be tested without a front-end

use crate::entities::{AttendeeRecord, AttendeeView, UNKNOWN_FIELD};
use crate::value_objects::AttendeeCode;

pub const LOADING_TEXT: &str = "Loading...";

pub fn project(record: &AttendeeRecord) -> AttendeeView {
    AttendeeView {
        code: record.code.clone(),
        name: record.name.clone(),
        email: record.email.clone(),
        registered_at: record.registered_at.clone(),
        check_in: check_in_text(record.is_checked_in, record.check_in_time.as_deref()),
        goodie_bag: goodie_bag_text(record.has_goodie_bag, record.goodie_bag_time.as_deref()),
    }
}

pub fn loading_view(code: &AttendeeCode) -> AttendeeView {
    AttendeeView {
        code: code.as_str().to_string(),
        name: LOADING_TEXT.to_string(),
        email: LOADING_TEXT.to_string(),
        registered_at: LOADING_TEXT.to_string(),
        check_in: LOADING_TEXT.to_string(),
        goodie_bag: LOADING_TEXT.to_string(),
    }
}

/// Both status fields carry the error; identity was never fetched.
pub fn status_error_view(code: &AttendeeCode, message: &str) -> AttendeeView {
    let text = format!("Error: {}", message);
    AttendeeView {
        code: code.as_str().to_string(),
        name: UNKNOWN_FIELD.to_string(),
        email: UNKNOWN_FIELD.to_string(),
        registered_at: UNKNOWN_FIELD.to_string(),
        check_in: text.clone(),
        goodie_bag: text,
    }
}

fn check_in_text(done: bool, at: Option<&str>) -> String {
    match (done, at) {
        (true, Some(at)) => format!("Checked in at {}", at),
        (true, None) => "Checked in".to_string(),
        (false, _) => "Not checked in yet".to_string(),
    }
}

fn goodie_bag_text(done: bool, at: Option<&str>) -> String {
    match (done, at) {
        (true, Some(at)) => format!("Received at {}", at),
        (true, None) => "Received".to_string(),
        (false, _) => "Not received yet".to_string(),
    }
}
