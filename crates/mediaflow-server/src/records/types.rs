//! Wire types for the record store API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope returned by the create endpoint: `{records: [{id, fields, createdTime}]}`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<RecordResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordResponse {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Value,
    #[serde(rename = "createdTime", default)]
    pub created_time: Option<DateTime<Utc>>,
}

/// A child record as acknowledged by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub id: String,
    pub created_time: Option<DateTime<Utc>>,
}

impl From<RecordResponse> for CreatedRecord {
    fn from(record: RecordResponse) -> Self {
        Self {
            id: record.id,
            created_time: record.created_time,
        }
    }
}
