//! bcp-s3: S3 SDK adapter for bcp
//!
//! Implements the [`bcp_core::ObjectStore`] trait on top of `aws-sdk-s3`,
//! resolving credentials through the standard AWS provider chain.

mod client;

pub use client::{S3Client, encode_copy_source};
