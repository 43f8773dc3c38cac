// Access gate entities
// Whitelisted station clients and the requests waiting for admin approval

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistEntry {
    pub ip: String,
    #[serde(default)]
    pub label: Option<String>,
    pub added_at: i64,
    #[serde(default)]
    pub added_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl AccessRequestStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(AccessRequestStatus::Pending),
            "approved" => Some(AccessRequestStatus::Approved),
            "rejected" => Some(AccessRequestStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub id: String,
    pub ip: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: AccessRequestStatus,
    pub requested_at: i64,
    #[serde(default)]
    pub decided_at: Option<i64>,
    #[serde(default)]
    pub decided_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessBook {
    #[serde(default)]
    pub whitelist: Vec<WhitelistEntry>,
    #[serde(default)]
    pub requests: Vec<AccessRequest>,
}

impl AccessBook {
    pub fn is_whitelisted(&self, ip: &str) -> bool {
        self.whitelist.iter().any(|entry| entry.ip == ip)
    }

    pub fn pending_for(&self, ip: &str) -> Option<&AccessRequest> {
        self.requests
            .iter()
            .find(|request| request.ip == ip && request.status == AccessRequestStatus::Pending)
    }

    pub fn request_mut(&mut self, id: &str) -> Option<&mut AccessRequest> {
        self.requests.iter_mut().find(|request| request.id == id)
    }

    /// Adds or relabels an entry. Returns false when the ip was already listed.
    pub fn allow(&mut self, entry: WhitelistEntry) -> bool {
        if let Some(existing) = self.whitelist.iter_mut().find(|item| item.ip == entry.ip) {
            if entry.label.is_some() {
                existing.label = entry.label;
            }
            return false;
        }
        self.whitelist.push(entry);
        self.whitelist.sort_by(|a, b| a.ip.cmp(&b.ip));
        true
    }

    pub fn revoke(&mut self, ip: &str) -> bool {
        let before = self.whitelist.len();
        self.whitelist.retain(|entry| entry.ip != ip);
        before != self.whitelist.len()
    }
}
