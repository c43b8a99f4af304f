//! Aliyun OSS request model: signing, request construction and upload outcomes.

pub mod listing;
pub mod signer;

use serde::{Deserialize, Serialize};

pub use listing::{ListBucketResult, ObjectSummary};
pub use signer::{format_oss_date, OssCredentials, OssSigner, SignedHeaders};

pub const PUT: &str = "PUT";
pub const GET: &str = "GET";
pub const DELETE: &str = "DELETE";

/// `/<prefix>/<key>.json`; an empty prefix puts the object at the bucket root.
pub fn resource_path(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("/{}.json", key)
    } else {
        format!("/{}/{}.json", prefix, key)
    }
}

pub fn object_url(endpoint: &str, resource: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), resource)
}

/// A fully signed PUT, ready to hand to a transport.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub method: &'static str,
    pub resource: String,
    pub url: String,
    pub headers: SignedHeaders,
    pub body: Vec<u8>,
}

impl UploadRequest {
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Signed headers plus `Content-Length`, in send order.
    pub fn header_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = self
            .headers
            .pairs()
            .iter()
            .map(|(name, value)| (*name, value.to_string()))
            .collect();
        pairs.push(("Content-Length", self.content_length().to_string()));
        pairs
    }
}

/// A signed request without a body (bucket listing, object delete).
#[derive(Debug, Clone)]
pub struct ObjectRequest {
    pub method: &'static str,
    pub resource: String,
    pub url: String,
    pub headers: SignedHeaders,
}

impl ObjectRequest {
    /// `Content-Type` is signed as empty and therefore not sent.
    pub fn header_pairs(&self) -> Vec<(&'static str, String)> {
        self.headers
            .pairs()
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (*name, value.to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { url: String, status: u16 },
    Rejected { url: String, status: u16, body: String },
    TransportFailed { url: String, message: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            UploadOutcome::Uploaded { url, .. }
            | UploadOutcome::Rejected { url, .. }
            | UploadOutcome::TransportFailed { url, .. } => url,
        }
    }
}

/// Result of publishing one logical dataset, possibly split across part objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReport {
    Single(UploadOutcome),
    Batched {
        parts: Vec<UploadOutcome>,
        index: UploadOutcome,
    },
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        match self {
            PublishReport::Single(outcome) => outcome.is_success(),
            PublishReport::Batched { parts, index } => {
                parts.iter().all(UploadOutcome::is_success) && index.is_success()
            }
        }
    }

    pub fn outcomes(&self) -> Vec<&UploadOutcome> {
        match self {
            PublishReport::Single(outcome) => vec![outcome],
            PublishReport::Batched { parts, index } => {
                parts.iter().chain(std::iter::once(index)).collect()
            }
        }
    }
}

/// Manifest uploaded as `<key>_index.json` next to batched part objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIndex {
    pub storage_key: String,
    pub total_records: usize,
    pub total_batches: usize,
    pub batch_size: usize,
    pub batches: Vec<BatchEntry>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub batch_index: usize,
    pub count: usize,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_path() {
        assert_eq!(resource_path("jinxing-edu", "kt_staff"), "/jinxing-edu/kt_staff.json");
        assert_eq!(resource_path("/jinxing-edu/", "kt_staff"), "/jinxing-edu/kt_staff.json");
        assert_eq!(resource_path("", "kt_staff"), "/kt_staff.json");
    }

    #[test]
    fn test_object_url() {
        assert_eq!(
            object_url("https://venus-data.oss-cn-beijing.aliyuncs.com/", "/jinxing-edu/kt_staff.json"),
            "https://venus-data.oss-cn-beijing.aliyuncs.com/jinxing-edu/kt_staff.json"
        );
    }

    #[test]
    fn test_object_request_omits_empty_content_type() {
        let request = ObjectRequest {
            method: DELETE,
            resource: "/jinxing-edu/kt_staff.json".into(),
            url: "https://venus-data.oss-cn-beijing.aliyuncs.com/jinxing-edu/kt_staff.json".into(),
            headers: SignedHeaders {
                authorization: "OSS id:sig".into(),
                date: "Wed, 15 Oct 2025 08:30:00 GMT".into(),
                content_type: String::new(),
            },
        };
        let names: Vec<&str> = request.header_pairs().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["Authorization", "Date"]);
    }

    #[test]
    fn test_batched_report_needs_index() {
        let ok = UploadOutcome::Uploaded { url: "u".into(), status: 200 };
        let failed = UploadOutcome::Rejected { url: "i".into(), status: 403, body: String::new() };
        let report = PublishReport::Batched { parts: vec![ok.clone(), ok], index: failed };
        assert!(!report.is_success());
        assert_eq!(report.outcomes().len(), 3);
    }
}
