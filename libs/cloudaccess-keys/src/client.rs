// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Remote access key client capability
//!
//! The engine never talks to the network itself. Transport, authentication
//! and request signing belong to whatever implements [`AccessKeyClient`];
//! the engine only sequences calls and polls their results. Implementations
//! must not retry mutating calls on their own, since every retry and backoff
//! decision is made by the poller.

use async_trait::async_trait;
use thiserror::Error;

use cloudaccess_types::{
    AccessKeyMetadata, AccessKeyUid, AccessKeyVersion, CreateAccessKeyRequest,
    CreateAccessKeyVersionRequest, KeyCreationStatus, PendingOperation, PropertyReference,
    RequestId, VersionCreationStatus, VersionNumber,
};

/// Errors surfaced by a client implementation
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The addressed key, version or request does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote API answered with a non-success status
    #[error("API error {status}: {title}: {detail}")]
    Api {
        status: u16,
        title: String,
        detail: String,
    },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::NotFound(_) => true,
            ClientError::Api { status, .. } => *status == 404,
            ClientError::Transport(_) => false,
        }
    }
}

/// Atomic operations offered by the remote access key service.
#[async_trait]
pub trait AccessKeyClient: Send + Sync {
    /// Start creating a key together with its first credential version.
    async fn create_access_key(
        &self,
        request: &CreateAccessKeyRequest,
    ) -> Result<PendingOperation, ClientError>;

    async fn get_access_key_status(
        &self,
        request_id: RequestId,
    ) -> Result<KeyCreationStatus, ClientError>;

    /// Start creating an additional credential version on an existing key.
    async fn create_access_key_version(
        &self,
        access_key_uid: AccessKeyUid,
        request: &CreateAccessKeyVersionRequest,
    ) -> Result<PendingOperation, ClientError>;

    async fn get_access_key_version_status(
        &self,
        request_id: RequestId,
    ) -> Result<VersionCreationStatus, ClientError>;

    async fn get_access_key(
        &self,
        access_key_uid: AccessKeyUid,
    ) -> Result<AccessKeyMetadata, ClientError>;

    async fn update_access_key_name(
        &self,
        access_key_uid: AccessKeyUid,
        access_key_name: &str,
    ) -> Result<AccessKeyMetadata, ClientError>;

    /// Versions of a key, newest first.
    async fn list_access_key_versions(
        &self,
        access_key_uid: AccessKeyUid,
    ) -> Result<Vec<AccessKeyVersion>, ClientError>;

    async fn get_access_key_version(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
    ) -> Result<AccessKeyVersion, ClientError>;

    /// Request deletion of a version. Completion is only observable by the
    /// version disappearing from [`AccessKeyClient::list_access_key_versions`].
    async fn delete_access_key_version(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
    ) -> Result<(), ClientError>;

    /// Request deletion of a key that no longer owns any version.
    async fn delete_access_key(&self, access_key_uid: AccessKeyUid) -> Result<(), ClientError>;

    async fn list_access_keys(&self) -> Result<Vec<AccessKeyMetadata>, ClientError>;

    /// Delivery properties that sign requests with the given version.
    async fn lookup_properties(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
    ) -> Result<Vec<PropertyReference>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection() {
        assert!(ClientError::NotFound("key 1".to_string()).is_not_found());
        assert!(
            ClientError::Api {
                status: 404,
                title: "Not Found".to_string(),
                detail: "access key 1 does not exist".to_string(),
            }
            .is_not_found()
        );
        assert!(
            !ClientError::Api {
                status: 500,
                title: "Internal Server Error".to_string(),
                detail: String::new(),
            }
            .is_not_found()
        );
        assert!(!ClientError::Transport("connection reset".to_string()).is_not_found());
    }
}
