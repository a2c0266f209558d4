use std::time::Duration;

use http::Method;
use object_store::{path::Path as ObjectPath, signer::Signer};
use quick_xml::de::from_str;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::error::{ConnectError, StoreError};
use crate::domain::models::DEFAULT_REGION;

/// Lifetime of the signed URLs used for bucket-level requests
const SIGNATURE_TTL: Duration = Duration::from_secs(60);

/// HTTP timeout for bucket-level requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// S3 error document returned with non-2xx responses
#[derive(Debug, Deserialize)]
struct S3ErrorBody {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

/// Bucket-level requests (`HEAD /bucket`, `PUT /bucket`).
///
/// `object_store` only speaks to objects, so these go out over plain HTTP
/// against URLs signed by a store scoped to the target bucket. Signing the
/// empty path yields the bucket URL itself.
#[derive(Clone, Debug)]
pub struct BucketRequests {
    http: Client,
    region: String,
}

impl BucketRequests {
    pub fn new(region: impl Into<String>) -> Result<Self, ConnectError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConnectError::Client(e.to_string()))?;

        Ok(Self {
            http,
            region: region.into(),
        })
    }

    /// `Ok(false)` only for a 404; any other failure is an error
    pub async fn exists(&self, signer: &dyn Signer) -> Result<bool, StoreError> {
        let url = signer
            .signed_url(Method::HEAD, &ObjectPath::default(), SIGNATURE_TTL)
            .await?;

        let response = self.http.head(url.as_str()).send().await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            // HEAD responses carry no error document
            status => Err(StoreError::Http {
                status: status.as_u16(),
                code: None,
                message: status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string(),
            }),
        }
    }

    pub async fn create(&self, signer: &dyn Signer) -> Result<(), StoreError> {
        let url = signer
            .signed_url(Method::PUT, &ObjectPath::default(), SIGNATURE_TTL)
            .await?;

        let response = self
            .http
            .put(url.as_str())
            .body(create_bucket_body(&self.region))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }
}

/// us-east-1 is the implicit location and must not be sent as a constraint
fn create_bucket_body(region: &str) -> String {
    if region.is_empty() || region == DEFAULT_REGION {
        String::new()
    } else {
        format!(
            "<CreateBucketConfiguration><LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
            region
        )
    }
}

fn error_from_body(status: StatusCode, body: &str) -> StoreError {
    let parsed = from_str::<S3ErrorBody>(body).ok();
    let (code, message) = match parsed {
        Some(S3ErrorBody { code, message }) => (code, message),
        None => (None, None),
    };

    StoreError::Http {
        status: status.as_u16(),
        code,
        message: message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string()
        }),
    }
}
