use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::app::ports::HttpPutPort;
use crate::constants::JSON_CONTENT_TYPE;
use crate::document::to_json_bytes;
use crate::error::Result;
use crate::metrics::PublishMetrics;
use crate::oss::{
    object_url, resource_path, BatchEntry, BatchIndex, OssSigner, PublishReport, UploadOutcome,
    UploadRequest, PUT,
};

#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub delay: Duration,
}

/// Use case for publishing JSON documents to the bucket as whole-object replaces
pub struct PublishUseCase {
    http: Box<dyn HttpPutPort>,
    signer: OssSigner,
    endpoint: String,
    prefix: String,
    batching: Option<BatchSettings>,
}

impl PublishUseCase {
    pub fn new(
        http: Box<dyn HttpPutPort>,
        signer: OssSigner,
        endpoint: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            http,
            signer,
            endpoint: endpoint.into(),
            prefix: prefix.into(),
            batching: None,
        }
    }

    /// Split record lists longer than `batch_size` into part objects plus an index.
    pub fn with_batching(mut self, settings: BatchSettings) -> Self {
        self.batching = (settings.batch_size > 0).then_some(settings);
        self
    }

    /// Serializes `payload` and signs a PUT for `<prefix>/<key>.json`.
    pub fn build_request<T: Serialize + ?Sized>(&self, key: &str, payload: &T) -> Result<UploadRequest> {
        let body = to_json_bytes(payload)?;
        let resource = resource_path(&self.prefix, key);
        let headers = self.signer.sign(PUT, &resource, JSON_CONTENT_TYPE, "")?;
        Ok(UploadRequest {
            method: PUT,
            url: object_url(&self.endpoint, &resource),
            resource,
            headers,
            body,
        })
    }

    /// Remote failures come back as an outcome; only local serialization/signing errors are `Err`.
    #[instrument(skip(self, payload))]
    pub fn upload<T: Serialize + ?Sized>(&self, key: &str, payload: &T) -> Result<UploadOutcome> {
        let request = self.build_request(key, payload)?;
        Ok(self.send(&request))
    }

    pub fn send(&self, request: &UploadRequest) -> UploadOutcome {
        let url = request.url.clone();
        let outcome = match self.http.put(request) {
            Ok(resp) if resp.is_success() => {
                info!("Uploaded {} ({} bytes, status {})", url, request.content_length(), resp.status);
                UploadOutcome::Uploaded { url, status: resp.status }
            }
            Ok(resp) => {
                warn!("Upload rejected: {} - {}", resp.status, resp.body);
                UploadOutcome::Rejected {
                    url,
                    status: resp.status,
                    body: resp.body,
                }
            }
            Err(message) => {
                error!("Upload transport failure for {}: {}", url, message);
                UploadOutcome::TransportFailed { url, message }
            }
        };
        PublishMetrics::record_outcome(&outcome, request.content_length());
        outcome
    }

    pub fn publish_records<T: Serialize>(&self, key: &str, records: &[T]) -> Result<PublishReport> {
        match self.batching {
            Some(settings) if records.len() > settings.batch_size => {
                self.publish_batched(key, records, settings)
            }
            _ => Ok(PublishReport::Single(self.upload(key, records)?)),
        }
    }

    /// Publishes a document read back from disk; arrays may be batched, anything else is one object.
    pub fn publish_document(&self, key: &str, document: &Value) -> Result<PublishReport> {
        match document {
            Value::Array(items) => self.publish_records(key, items),
            other => Ok(PublishReport::Single(self.upload(key, other)?)),
        }
    }

    fn publish_batched<T: Serialize>(
        &self,
        key: &str,
        records: &[T],
        settings: BatchSettings,
    ) -> Result<PublishReport> {
        let total_batches = records.len().div_ceil(settings.batch_size);
        info!("Uploading {} records as {} batches", records.len(), total_batches);

        let mut parts = Vec::with_capacity(total_batches);
        let mut entries = Vec::with_capacity(total_batches);
        for (i, chunk) in records.chunks(settings.batch_size).enumerate() {
            if i > 0 && !settings.delay.is_zero() {
                thread::sleep(settings.delay);
            }
            let outcome = self.upload(&format!("{}_part{}", key, i), chunk)?;
            entries.push(BatchEntry {
                batch_index: i,
                count: chunk.len(),
                success: outcome.is_success(),
            });
            parts.push(outcome);
        }

        let index = BatchIndex {
            storage_key: key.to_string(),
            total_records: records.len(),
            total_batches,
            batch_size: settings.batch_size,
            batches: entries,
            updated_at: Utc::now().to_rfc3339(),
        };
        let index = self.upload(&format!("{}_index", key), &index)?;

        Ok(PublishReport::Batched { parts, index })
    }
}
