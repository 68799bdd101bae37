//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from bcp-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_smithy_types::DateTime;
use jiff::Timestamp;

use bcp_core::{CopyRequest, Error, ListPage, ObjectRecord, ObjectStore, Result, S3Settings};

/// Keys requested per ListObjectsV2 call
const LIST_PAGE_SIZE: i32 = 1000;

/// S3 client wrapper
///
/// Cloning is cheap: the SDK client is reference counted internally, so each
/// pool worker can hold its own handle.
#[derive(Clone, Debug)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a client using ambient credentials
    ///
    /// Credentials come from the default provider chain (environment,
    /// shared config/profile files, web identity, instance metadata).
    /// Interactive MFA prompts are not supported.
    pub async fn new(settings: &S3Settings) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &settings.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;
        if config.region().is_none() {
            return Err(Error::Config(
                "No AWS region configured; pass --region or set AWS_REGION".to_string(),
            ));
        }

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(settings.force_path_style)
            .build();

        tracing::debug!(
            region = ?config.region(),
            endpoint = ?settings.endpoint_url,
            path_style = settings.force_path_style,
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_page(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        let response = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(LIST_PAGE_SIZE)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, bucket))?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|object| {
                let key = object.key()?;
                let last_modified = match object.last_modified() {
                    Some(dt) => to_timestamp(dt),
                    None => {
                        tracing::warn!(key, "Listed object has no last-modified time");
                        Timestamp::UNIX_EPOCH
                    }
                };
                Some(ObjectRecord::new(key, last_modified))
            })
            .collect();

        let continuation_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(|s| s.to_string())
        } else {
            None
        };

        Ok(ListPage {
            objects,
            continuation_token,
        })
    }

    async fn copy_object(&self, req: &CopyRequest) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(encode_copy_source(&req.source_bucket, &req.key))
            .bucket(&req.dest_bucket)
            .key(&req.key)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, &format!("{}/{}", req.source_bucket, req.key)))?;

        Ok(())
    }
}

/// Build the `x-amz-copy-source` value: `bucket/key` with each key segment
/// URL-encoded and "/" kept as the separator
pub fn encode_copy_source(bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{bucket}/{encoded_key}")
}

fn to_timestamp(dt: &DateTime) -> Timestamp {
    Timestamp::new(dt.secs(), dt.subsec_nanos() as i32)
        .or_else(|_| Timestamp::from_second(dt.secs()))
        .unwrap_or(Timestamp::UNIX_EPOCH)
}

/// Map an SDK error to the engine's error taxonomy
fn classify_sdk_error<E>(error: &SdkError<E>, subject: &str) -> Error
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    match error {
        SdkError::ServiceError(service_err) => {
            let err = service_err.err();
            let status = service_err.raw().status().as_u16();
            let detail = match err.code() {
                Some(code) => format!("{code}: {}", err.message().unwrap_or("no message")),
                None => format!("HTTP {status}: {err}"),
            };
            classify_service_error(err.code(), status, format!("{subject}: {detail}"))
        }
        SdkError::TimeoutError(_) => Error::Timeout(format!("{subject}: request timeout")),
        SdkError::DispatchFailure(err) => {
            let msg = format!("{subject}: network dispatch error: {err:?}");
            if err.is_timeout() {
                Error::Timeout(msg)
            } else {
                Error::Network(msg)
            }
        }
        SdkError::ConstructionFailure(err) => {
            let msg = format!("{subject}: request construction failed: {err:?}");
            if msg.to_lowercase().contains("credential") {
                Error::Auth(msg)
            } else {
                Error::General(msg)
            }
        }
        SdkError::ResponseError(err) => {
            Error::Network(format!("{subject}: response error: {err:?}"))
        }
        _ => Error::General(format!("{subject}: {error}")),
    }
}

fn classify_service_error(code: Option<&str>, status: u16, msg: String) -> Error {
    match code {
        Some(
            "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken"
            | "InvalidToken" | "AllAccessDisabled",
        ) => Error::Auth(msg),
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => Error::NotFound(msg),
        Some(
            "SlowDown" | "Throttling" | "ThrottlingException" | "RequestLimitExceeded"
            | "TooManyRequests" | "ServiceUnavailable",
        ) => Error::Throttled(msg),
        Some("RequestTimeout") => Error::Timeout(msg),
        Some("InternalError") => Error::Network(msg),
        _ => match status {
            401 | 403 => Error::Auth(msg),
            404 => Error::NotFound(msg),
            429 | 503 => Error::Throttled(msg),
            500..=599 => Error::Network(msg),
            _ => Error::General(msg),
        },
    }
}
