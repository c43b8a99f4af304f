//! Counters for extraction and publishing.
//!
//! Recorded through the `metrics` facade into a Prometheus recorder installed
//! by [`init_metrics`]. A run is short-lived, so instead of serving `/metrics`
//! the CLI can write a text snapshot for a node_exporter textfile collector.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::oss::UploadOutcome;

pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder not installed (possibly already installed): {}", e);
            None
        }
    }
}

pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, handle.render())?;
    info!("Wrote metrics snapshot to {}", path.display());
    Ok(())
}

pub struct ExtractMetrics;

impl ExtractMetrics {
    pub fn record_sheet(kind: &'static str, emitted: usize, skipped: usize) {
        ::metrics::counter!("roster_records_extracted_total", "kind" => kind).increment(emitted as u64);
        ::metrics::counter!("roster_rows_skipped_total", "kind" => kind).increment(skipped as u64);
    }
}

pub struct PublishMetrics;

impl PublishMetrics {
    pub fn record_outcome(outcome: &UploadOutcome, body_bytes: usize) {
        let result = match outcome {
            UploadOutcome::Uploaded { .. } => "uploaded",
            UploadOutcome::Rejected { .. } => "rejected",
            UploadOutcome::TransportFailed { .. } => "transport_failed",
        };
        ::metrics::counter!("roster_uploads_total", "outcome" => result).increment(1);
        ::metrics::histogram!("roster_upload_bytes").record(body_bytes as f64);
    }

    pub fn record_delete(success: bool) {
        let result = if success { "deleted" } else { "failed" };
        ::metrics::counter!("roster_deletes_total", "outcome" => result).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn recorded(f: impl FnOnce()) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, f);
        handle.render()
    }

    #[test]
    fn test_extract_counters() {
        let text = recorded(|| {
            ExtractMetrics::record_sheet("staff", 2, 1);
            ExtractMetrics::record_sheet("staff", 3, 0);
            ExtractMetrics::record_sheet("student", 4, 2);
        });
        assert!(text.contains("roster_records_extracted_total{kind=\"staff\"} 5"));
        assert!(text.contains("roster_records_extracted_total{kind=\"student\"} 4"));
        assert!(text.contains("roster_rows_skipped_total{kind=\"student\"} 2"));
    }

    #[test]
    fn test_publish_counters() {
        let text = recorded(|| {
            let ok = UploadOutcome::Uploaded { url: "u".into(), status: 200 };
            let denied = UploadOutcome::Rejected { url: "u".into(), status: 403, body: String::new() };
            PublishMetrics::record_outcome(&ok, 100);
            PublishMetrics::record_outcome(&ok, 100);
            PublishMetrics::record_outcome(&denied, 100);
            PublishMetrics::record_delete(true);
        });
        assert!(text.contains("roster_uploads_total{outcome=\"uploaded\"} 2"));
        assert!(text.contains("roster_uploads_total{outcome=\"rejected\"} 1"));
        assert!(text.contains("roster_deletes_total{outcome=\"deleted\"} 1"));
        assert!(text.contains("roster_upload_bytes_count 3"));
    }

    #[test]
    fn test_snapshot_written_to_disk() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || ExtractMetrics::record_sheet("staff", 1, 0));

        let dir = tempdir().unwrap();
        let path = dir.path().join("metrics/roster.prom");
        write_snapshot(&handle, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("roster_records_extracted_total{kind=\"staff\"} 1"));
    }
}
