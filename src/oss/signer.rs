//! OSS header signing (the `Authorization: OSS <id>:<signature>` scheme).
//!
//! The string to sign is
//!
//! ```text
//! VERB\nContent-MD5\nContent-Type\nDate\n/<bucket><resource>
//! ```
//!
//! and the signature is `base64(hmac_sha1(secret, string_to_sign))`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

use crate::constants::OSS_DATE_FORMAT;
use crate::error::{Result, RosterError};

type HmacSha1 = Hmac<Sha1>;

#[derive(Clone)]
pub struct OssCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl OssCredentials {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }
}

impl fmt::Debug for OssCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OssCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// Headers produced by one signing pass. `date` is the exact value that was signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub date: String,
    pub content_type: String,
}

impl SignedHeaders {
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("Authorization", self.authorization.as_str()),
            ("Date", self.date.as_str()),
            ("Content-Type", self.content_type.as_str()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct OssSigner {
    credentials: OssCredentials,
    bucket: String,
}

impl OssSigner {
    pub fn new(credentials: OssCredentials, bucket: impl Into<String>) -> Self {
        Self {
            credentials,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Signs a request at the current wall-clock time.
    pub fn sign(
        &self,
        method: &str,
        resource: &str,
        content_type: &str,
        content_md5: &str,
    ) -> Result<SignedHeaders> {
        self.sign_at(method, resource, content_type, content_md5, Utc::now())
    }

    pub fn sign_at(
        &self,
        method: &str,
        resource: &str,
        content_type: &str,
        content_md5: &str,
        at: DateTime<Utc>,
    ) -> Result<SignedHeaders> {
        let date = format_oss_date(at);
        let string_to_sign = self.string_to_sign(method, resource, content_type, content_md5, &date);
        let signature = hmac_sha1_base64(&self.credentials.access_key_secret, &string_to_sign)?;

        Ok(SignedHeaders {
            authorization: format!("OSS {}:{}", self.credentials.access_key_id, signature),
            date,
            content_type: content_type.to_string(),
        })
    }

    /// `resource` must already start with `/`; it is appended to `/<bucket>` verbatim.
    pub fn string_to_sign(
        &self,
        method: &str,
        resource: &str,
        content_type: &str,
        content_md5: &str,
        date: &str,
    ) -> String {
        format!(
            "{}\n{}\n{}\n{}\n/{}{}",
            method, content_md5, content_type, date, self.bucket, resource
        )
    }
}

pub fn format_oss_date(at: DateTime<Utc>) -> String {
    at.format(OSS_DATE_FORMAT).to_string()
}

fn hmac_sha1_base64(secret: &str, message: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| RosterError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
