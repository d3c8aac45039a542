use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::null_as_empty;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tunnel {
    pub id: String,
    pub name: String,
    #[serde(rename = "dnsRecords", default, deserialize_with = "null_as_empty")]
    pub dns_records: Vec<DnsRecord>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub deleted_at: String,
}

impl Tunnel {
    /// Hostnames routed to this tunnel, in backend order.
    pub fn hostnames(&self) -> Vec<&str> {
        self.dns_records.iter().map(|r| r.name.as_str()).collect()
    }
}

/// A DNS record pointing a hostname at a tunnel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default)]
    pub proxiable: bool,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub ttl: i64,
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub meta: Value,
    // Wire name is misspelled by the backend.
    #[serde(rename = "commnet", default)]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<Value>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub modified_on: String,
}
