use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_MEDIA_TABLE: &str = "Media";
pub const DEFAULT_PARENT_TABLE: &str = "Listings";
pub const DEFAULT_ATTACHMENT_FIELD: &str = "File";
pub const DEFAULT_LINK_FIELD: &str = "Link";
pub const DEFAULT_PARENT_LINK_FIELD: &str = "Listings";
pub const DEFAULT_CHILDREN_FIELD: &str = "Images";

/// Tabular record store location, credentials and field mapping
#[derive(Clone, Serialize, Deserialize)]
pub struct RecordStoreConfig {
    pub api_url: String,
    pub base_id: String,
    pub token: String,
    /// Table receiving one child record per uploaded item
    pub media_table: String,
    /// Table holding the parent record
    pub parent_table: String,
    /// Attachment field on the child record (`[{url}]`)
    pub attachment_field: String,
    /// Plain-text copy of the address on the child record, if the table has one
    pub link_field: Option<String>,
    /// Field on the child linking back to the parent (`[parentId]`)
    pub parent_link_field: String,
    /// Field on the parent referencing the children
    pub children_field: String,
}

impl std::fmt::Debug for RecordStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStoreConfig")
            .field("api_url", &self.api_url)
            .field("base_id", &self.base_id)
            .field("token", &"<redacted>")
            .field("media_table", &self.media_table)
            .field("parent_table", &self.parent_table)
            .field("attachment_field", &self.attachment_field)
            .field("link_field", &self.link_field)
            .field("parent_link_field", &self.parent_link_field)
            .field("children_field", &self.children_field)
            .finish()
    }
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            base_id: String::new(),
            token: String::new(),
            media_table: DEFAULT_MEDIA_TABLE.to_string(),
            parent_table: DEFAULT_PARENT_TABLE.to_string(),
            attachment_field: DEFAULT_ATTACHMENT_FIELD.to_string(),
            link_field: Some(DEFAULT_LINK_FIELD.to_string()),
            parent_link_field: DEFAULT_PARENT_LINK_FIELD.to_string(),
            children_field: DEFAULT_CHILDREN_FIELD.to_string(),
        }
    }
}

impl RecordStoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_url: env::var("AIRTABLE_API_URL").unwrap_or(defaults.api_url),
            base_id: env::var("AIRTABLE_BASE").unwrap_or_default(),
            token: env::var("AIRTABLE_TOKEN")
                .or_else(|_| env::var("AIRTABLE_API_KEY"))
                .unwrap_or_default(),
            media_table: env::var("AIRTABLE_MEDIA_TABLE").unwrap_or(defaults.media_table),
            parent_table: env::var("AIRTABLE_PARENT_TABLE").unwrap_or(defaults.parent_table),
            attachment_field: env::var("AIRTABLE_ATTACHMENT_FIELD")
                .unwrap_or(defaults.attachment_field),
            // Present but empty disables the field
            link_field: match env::var("AIRTABLE_LINK_FIELD") {
                Ok(field) if field.trim().is_empty() => None,
                Ok(field) => Some(field),
                Err(_) => defaults.link_field,
            },
            parent_link_field: env::var("AIRTABLE_PARENT_LINK_FIELD")
                .unwrap_or(defaults.parent_link_field),
            children_field: env::var("AIRTABLE_CHILDREN_FIELD").unwrap_or(defaults.children_field),
        }
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.api_url.trim_end_matches('/'), self.base_id, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let config = RecordStoreConfig {
            api_url: "https://api.airtable.com/v0/".to_string(),
            base_id: "appABC".to_string(),
            ..Default::default()
        };
        assert_eq!(config.table_url("Media"), "https://api.airtable.com/v0/appABC/Media");
    }

    #[test]
    fn test_defaults_match_listing_schema() {
        let config = RecordStoreConfig::default();
        assert_eq!(config.media_table, "Media");
        assert_eq!(config.parent_table, "Listings");
        assert_eq!(config.attachment_field, "File");
        assert_eq!(config.link_field.as_deref(), Some("Link"));
        assert_eq!(config.parent_link_field, "Listings");
        assert_eq!(config.children_field, "Images");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = RecordStoreConfig {
            token: "patSECRET".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("patSECRET"));
    }
}
