// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Wire-level types for the cloud access key API.
//!
//! These structures mirror the request and response bodies exchanged with the
//! remote access key service. They are shared between client implementations
//! (which own transport and authentication) and the reconciliation engine in
//! `cloudaccess-keys`, which only ever sees them through the client trait.
//!
//! Field names follow the remote API's camelCase convention and enum values
//! its SCREAMING_SNAKE_CASE convention.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

// ============================================================================
// Type Aliases
// ============================================================================

/// Remote-assigned identifier of an access key
pub type AccessKeyUid = i64;

/// Remote-assigned, per-key monotonically increasing version number
pub type VersionNumber = i64;

/// Identifier of an asynchronous remote request
pub type RequestId = i64;

// ============================================================================
// Enumerations
// ============================================================================

/// Signing scheme the CDN uses with the cloud storage origin.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
)]
pub enum AuthenticationMethod {
    /// AWS Signature Version 4
    #[serde(rename = "AWS4_HMAC_SHA256")]
    #[strum(serialize = "AWS4_HMAC_SHA256")]
    Aws4HmacSha256,
    /// Google Cloud Storage HMAC signing
    #[serde(rename = "GOOG4_HMAC_SHA256")]
    #[strum(serialize = "GOOG4_HMAC_SHA256")]
    Goog4HmacSha256,
}

/// Tier of the delivery network the key is deployed to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityNetwork {
    EnhancedTls,
    StandardTls,
}

/// Additional regional CDN the key is deployed to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AdditionalCdn {
    ChinaCdn,
    RussiaCdn,
}

/// Processing state of an asynchronous create request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    /// The request has been accepted and is still being processed
    InProgress,
    /// The request completed successfully
    Done,
    /// The request failed; the resource it describes was not created
    Failed,
}

impl ProcessingStatus {
    /// Whether no further status change is expected
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessingStatus::InProgress)
    }
}

/// Lifecycle stage of a credential version on the delivery network.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    #[default]
    PendingActivation,
    Active,
    PendingDeletion,
}

// ============================================================================
// Requests
// ============================================================================

/// Network placement of an access key. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    pub security_network: SecurityNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_cdn: Option<AdditionalCdn>,
}

/// A cloud-side credential pair as sent to the remote API.
///
/// The secret is write-only: the remote service never returns it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub cloud_access_key_id: String,
    pub cloud_secret_access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("cloud_access_key_id", &self.cloud_access_key_id)
            .field("cloud_secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Body of the create-access-key request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessKeyRequest {
    pub access_key_name: String,
    pub authentication_method: AuthenticationMethod,
    pub contract_id: String,
    pub group_id: i64,
    pub network_configuration: NetworkConfiguration,
    pub credentials: Credentials,
}

/// Body of the create-access-key-version request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessKeyVersionRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
}

// ============================================================================
// Responses
// ============================================================================

/// Handle to an asynchronous remote operation.
///
/// `retry_after` is the remote system's stated minimum processing time; no
/// status check is useful before it has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperation {
    pub request_id: RequestId,
    pub retry_after: Duration,
}

impl PendingOperation {
    pub fn new(request_id: RequestId, retry_after: Duration) -> Self {
        Self {
            request_id,
            retry_after,
        }
    }
}

/// Status of an access key creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCreationStatus {
    pub request_id: RequestId,
    pub processing_status: ProcessingStatus,
    /// Set once the key exists
    #[serde(default)]
    pub access_key_uid: Option<AccessKeyUid>,
    /// Version created together with the key
    #[serde(default)]
    pub version: Option<VersionNumber>,
}

/// Status of a credential version creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCreationStatus {
    pub request_id: RequestId,
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub access_key_uid: Option<AccessKeyUid>,
    #[serde(default)]
    pub version: Option<VersionNumber>,
}

/// A group (and the contracts within it) that owns an access key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyGroup {
    pub group_id: i64,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub contract_ids: Vec<String>,
}

/// Access key metadata as returned by get-key and list-keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyMetadata {
    pub access_key_uid: AccessKeyUid,
    pub access_key_name: String,
    pub authentication_method: AuthenticationMethod,
    pub network_configuration: NetworkConfiguration,
    #[serde(default)]
    pub groups: Vec<AccessKeyGroup>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub latest_version: Option<VersionNumber>,
}

impl AccessKeyMetadata {
    /// First `(contract, group)` pair the key is assigned to, if any.
    pub fn primary_assignment(&self) -> Option<(&str, i64)> {
        self.groups.iter().find_map(|g| {
            g.contract_ids
                .first()
                .map(|contract| (contract.as_str(), g.group_id))
        })
    }
}

/// A credential version as returned by get-version and list-versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyVersion {
    pub access_key_uid: AccessKeyUid,
    pub version: VersionNumber,
    pub version_guid: String,
    pub cloud_access_key_id: String,
    #[serde(default)]
    pub deployment_status: DeploymentStatus,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
}

/// A delivery property that signs origin requests with a credential version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyReference {
    pub property_id: String,
    pub property_name: String,
    #[serde(default)]
    pub production_version: Option<i64>,
    #[serde(default)]
    pub staging_version: Option<i64>,
}
