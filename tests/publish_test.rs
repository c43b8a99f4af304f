use anyhow::Result;
use chrono::{DateTime, Utc};
use roster_sync::app::cleanup_use_case::CleanupUseCase;
use roster_sync::app::publish_use_case::PublishUseCase;
use roster_sync::infra::ReqwestHttp;
use roster_sync::oss::{OssCredentials, OssSigner, UploadOutcome};
use roster_sync::types::StaffRecord;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct CapturedRequest {
    request_line: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

/// Accepts one connection, records the request and answers with `status_line` and `body`.
fn serve_once(status_line: &'static str, body: &'static str) -> Result<(String, JoinHandle<CapturedRequest>)> {
    serve_raw(format!(
        "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    ))
}

/// Like [`serve_once`] but writes `response` verbatim, then closes the connection.
fn serve_raw(response: String) -> Result<(String, JoinHandle<CapturedRequest>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let endpoint = format!("http://{}", listener.local_addr()?);

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers
                    .entry(name.trim().to_ascii_lowercase())
                    .or_insert_with(|| value.trim().to_string());
            }
        }

        let length: usize = headers
            .get("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let mut payload = vec![0u8; length];
        reader.read_exact(&mut payload).unwrap();

        stream.write_all(response.as_bytes()).unwrap();

        CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: payload,
        }
    });

    Ok((endpoint, handle))
}

fn signer() -> OssSigner {
    OssSigner::new(OssCredentials::new("test-id", "test-secret"), "venus-data")
}

fn publisher(endpoint: &str) -> Result<PublishUseCase> {
    let http = ReqwestHttp::new(Duration::from_secs(5))?;
    Ok(PublishUseCase::new(Box::new(http), signer(), endpoint, "jinxing-edu"))
}

fn staff() -> Vec<StaffRecord> {
    vec![
        StaffRecord {
            id: "staff_1".into(),
            name: "张三".into(),
            phone: "13812345678".into(),
            role: "教师".into(),
            gender: "女".into(),
            assigned_classes: vec!["小一班".into()],
        },
        StaffRecord {
            id: "staff_2".into(),
            name: "李四".into(),
            phone: "13700001111".into(),
            role: "保育员".into(),
            gender: "".into(),
            assigned_classes: vec![],
        },
    ]
}

#[test]
fn test_signed_put_over_http() -> Result<()> {
    let (endpoint, server) = serve_once("HTTP/1.1 200 OK", "")?;
    let records = staff();

    let outcome = publisher(&endpoint)?.upload("kt_staff", &records)?;
    let captured = server.join().unwrap();

    assert_eq!(
        outcome,
        UploadOutcome::Uploaded {
            url: format!("{}/jinxing-edu/kt_staff.json", endpoint),
            status: 200,
        }
    );
    assert_eq!(captured.request_line, "PUT /jinxing-edu/kt_staff.json HTTP/1.1");
    assert_eq!(captured.headers["content-type"], "application/json");
    assert_eq!(
        captured.headers["content-length"],
        captured.body.len().to_string()
    );

    // The Authorization header must be reproducible from the Date header that was sent
    let date = DateTime::parse_from_rfc2822(&captured.headers["date"])?.with_timezone(&Utc);
    let expected = signer().sign_at("PUT", "/jinxing-edu/kt_staff.json", "application/json", "", date)?;
    assert_eq!(captured.headers["date"], expected.date);
    assert_eq!(captured.headers["authorization"], expected.authorization);
    assert!(expected.authorization.starts_with("OSS test-id:"));

    let sent: Vec<StaffRecord> = serde_json::from_slice(&captured.body)?;
    assert_eq!(sent, records);
    Ok(())
}

#[test]
fn test_rejected_put_keeps_server_message() -> Result<()> {
    let error_body = "<Error><Code>SignatureDoesNotMatch</Code></Error>";
    let (endpoint, server) = serve_once("HTTP/1.1 403 Forbidden", error_body)?;

    let outcome = publisher(&endpoint)?.upload("kt_staff", &staff())?;
    server.join().unwrap();

    match outcome {
        UploadOutcome::Rejected { status, body, .. } => {
            assert_eq!(status, 403);
            assert!(body.contains("SignatureDoesNotMatch"));
        }
        other => panic!("expected a rejection, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_truncated_error_body_is_reported() -> Result<()> {
    // Promises 200 bytes, sends a few, then hangs up
    let (endpoint, server) = serve_raw(
        "HTTP/1.1 403 Forbidden\r\nContent-Length: 200\r\nConnection: close\r\n\r\n<Error>".to_string(),
    )?;

    let outcome = publisher(&endpoint)?.upload("kt_staff", &staff())?;
    server.join().unwrap();

    match outcome {
        UploadOutcome::Rejected { status, body, .. } => {
            assert_eq!(status, 403);
            assert!(body.starts_with("<unreadable body:"), "body was {:?}", body);
        }
        other => panic!("expected a rejection, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_unreachable_endpoint_is_transport_failure() -> Result<()> {
    // Bind then drop to get a port nothing listens on
    let endpoint = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        format!("http://{}", listener.local_addr()?)
    };

    let outcome = publisher(&endpoint)?.upload("kt_staff", &staff())?;
    assert!(matches!(outcome, UploadOutcome::TransportFailed { .. }));
    assert!(!outcome.is_success());
    Ok(())
}

#[test]
fn test_signed_listing_over_http() -> Result<()> {
    let listing = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <ListBucketResult><Name>venus-data</Name><IsTruncated>false</IsTruncated>\
        <Contents><Key>jinxing-edu/kt_staff_part3.json</Key><Size>10</Size></Contents>\
        </ListBucketResult>";
    let (endpoint, server) = serve_once("HTTP/1.1 200 OK", listing)?;

    let http = ReqwestHttp::new(Duration::from_secs(5))?;
    let cleanup = CleanupUseCase::new(Box::new(http), signer(), endpoint.as_str(), "jinxing-edu");
    let keys = cleanup.list_dataset("kt_staff")?;
    let captured = server.join().unwrap();

    assert_eq!(keys, vec!["jinxing-edu/kt_staff_part3.json"]);
    assert_eq!(
        captured.request_line,
        "GET /?prefix=jinxing-edu%2Fkt_staff&max-keys=1000 HTTP/1.1"
    );
    assert!(!captured.headers.contains_key("content-type"));

    let date = DateTime::parse_from_rfc2822(&captured.headers["date"])?.with_timezone(&Utc);
    let expected = signer().sign_at("GET", "/", "", "", date)?;
    assert_eq!(captured.headers["authorization"], expected.authorization);
    Ok(())
}
