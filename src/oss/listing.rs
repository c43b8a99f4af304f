//! Bucket listing (`GET /?prefix=...`) and the rules for which listed objects
//! belong to a published dataset.

use reqwest::Url;
use serde::Deserialize;

use crate::constants::LIST_MAX_KEYS;
use crate::error::{Result, RosterError};

/// The parts of a `ListBucketResult` response we read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBucketResult {
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub next_marker: Option<String>,
    #[serde(default)]
    pub contents: Vec<ObjectSummary>,
}

impl ListBucketResult {
    /// Marker for the next page, if the listing was truncated.
    pub fn continuation(&self) -> Option<&str> {
        if !self.is_truncated {
            return None;
        }
        self.next_marker.as_deref().filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectSummary {
    pub key: String,
    #[serde(default)]
    pub size: u64,
}

pub fn parse_listing(xml: &str) -> Result<ListBucketResult> {
    Ok(quick_xml::de::from_str(xml)?)
}

/// Object-key prefix (no leading slash) shared by everything published under `key`.
pub fn dataset_prefix(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}

pub fn list_url(endpoint: &str, object_prefix: &str, marker: Option<&str>) -> Result<String> {
    let base = format!("{}/", endpoint.trim_end_matches('/'));
    let max_keys = LIST_MAX_KEYS.to_string();
    let mut params = vec![("prefix", object_prefix), ("max-keys", max_keys.as_str())];
    if let Some(marker) = marker {
        params.push(("marker", marker));
    }
    let url = Url::parse_with_params(&base, &params)
        .map_err(|e| RosterError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
    Ok(url.to_string())
}

/// True for `<key>.json`, `<key>_index.json` and `<key>_part<N>.json` directly under `prefix`.
pub fn belongs_to_dataset(object_key: &str, prefix: &str, key: &str) -> bool {
    let prefix = prefix.trim_matches('/');
    let name = if prefix.is_empty() {
        object_key
    } else {
        match object_key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(name) => name,
            None => return false,
        }
    };

    let Some(stem) = name.strip_suffix(".json") else {
        return false;
    };
    let Some(rest) = stem.strip_prefix(key) else {
        return false;
    };
    match rest {
        "" | "_index" => true,
        _ => rest
            .strip_prefix("_part")
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit())),
    }
}
