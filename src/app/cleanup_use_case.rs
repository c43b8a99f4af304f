use tracing::{info, instrument, warn};

use crate::app::ports::HttpObjectPort;
use crate::error::{Result, RosterError};
use crate::metrics::PublishMetrics;
use crate::oss::listing::{belongs_to_dataset, dataset_prefix, list_url, parse_listing};
use crate::oss::{object_url, ObjectRequest, OssSigner, DELETE, GET};

/// What a cleanup pass removed from the bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    /// `(object key, reason)` for deletes the store refused or never answered.
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Use case for removing a dataset's previous objects (main document, parts, index)
pub struct CleanupUseCase {
    http: Box<dyn HttpObjectPort>,
    signer: OssSigner,
    endpoint: String,
    prefix: String,
}

impl CleanupUseCase {
    pub fn new(
        http: Box<dyn HttpObjectPort>,
        signer: OssSigner,
        endpoint: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            http,
            signer,
            endpoint: endpoint.into(),
            prefix: prefix.into(),
        }
    }

    fn signed(&self, method: &'static str, resource: String, url: String) -> Result<ObjectRequest> {
        let headers = self.signer.sign(method, &resource, "", "")?;
        Ok(ObjectRequest {
            method,
            resource,
            url,
            headers,
        })
    }

    /// Object keys published under `key`, following listing pages to the end.
    #[instrument(skip(self))]
    pub fn list_dataset(&self, key: &str) -> Result<Vec<String>> {
        let object_prefix = dataset_prefix(&self.prefix, key);
        let mut keys = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let url = list_url(&self.endpoint, &object_prefix, marker.as_deref())?;
            // Query parameters are not part of the signed resource for listings
            let request = self.signed(GET, "/".to_string(), url)?;
            let resp = self.http.send(&request).map_err(RosterError::Listing)?;
            if !resp.is_success() {
                return Err(RosterError::Listing(format!(
                    "status {}: {}",
                    resp.status, resp.body
                )));
            }

            let page = parse_listing(&resp.body)?;
            keys.extend(
                page.contents
                    .iter()
                    .map(|o| o.key.clone())
                    .filter(|k| belongs_to_dataset(k, &self.prefix, key)),
            );
            match page.continuation() {
                Some(next) if marker.as_deref() != Some(next) => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(keys)
    }

    /// Deletes every object of the dataset. Individual delete failures are reported, not raised.
    #[instrument(skip(self))]
    pub fn remove_dataset(&self, key: &str) -> Result<CleanupReport> {
        let objects = self.list_dataset(key)?;
        info!("Found {} existing objects for {}", objects.len(), key);

        let mut report = CleanupReport::default();
        for object_key in objects {
            let resource = format!("/{}", object_key);
            let request = self.signed(DELETE, resource.clone(), object_url(&self.endpoint, &resource))?;
            let failure = match self.http.send(&request) {
                Ok(resp) if resp.is_success() => None,
                Ok(resp) => Some(format!("status {}: {}", resp.status, resp.body)),
                Err(message) => Some(message),
            };
            PublishMetrics::record_delete(failure.is_none());
            match failure {
                None => {
                    info!("Deleted {}", object_key);
                    report.deleted.push(object_key);
                }
                Some(reason) => {
                    warn!("Could not delete {}: {}", object_key, reason);
                    report.failed.push((object_key, reason));
                }
            }
        }
        Ok(report)
    }
}
