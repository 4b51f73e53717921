// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Error types for cloudaccess-keys

use std::time::Duration;

use thiserror::Error;

use cloudaccess_types::{AccessKeyUid, RequestId, VersionNumber};

use crate::client::ClientError;
use crate::state::{AccessKeyState, Slot};

/// Problems detected locally, before any remote call is issued
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one of credentials_a or credentials_b must be supplied")]
    MissingCredentials,

    #[error("only one of credentials_a and credentials_b may be primary")]
    DualPrimary,

    #[error("credentials_a and credentials_b must use different cloud access key ids ({0})")]
    DuplicateAccessKeyId(String),

    #[error(
        "credentials_a and credentials_b swapped their cloud access key ids; \
         change one slot at a time"
    )]
    SwappedSlots,

    #[error(
        "slot {slot}: cloud secret access key cannot change while the cloud access \
         key id stays the same; supply a new cloud access key id to rotate"
    )]
    SecretReplaced { slot: Slot },

    #[error("slot {slot}: cloud secret access key is required to create a new version")]
    MissingSecret { slot: Slot },

    #[error("{attribute} cannot be changed after the access key is created")]
    ImmutableAttribute { attribute: &'static str },

    #[error("invalid import id {0:?}: expected a numeric access key uid")]
    InvalidImportId(String),
}

/// Errors returned by the reconciliation engine
#[derive(Debug, Error)]
pub enum AccessKeyError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("access key {access_key_uid} not found")]
    NotFound { access_key_uid: AccessKeyUid },

    #[error("no access key named {access_key_name:?}")]
    NameNotFound { access_key_name: String },

    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    #[error(
        "version {version} of access key {access_key_uid} is in use by properties: {}; \
         remove it from those properties before deleting it",
        properties.join(", ")
    )]
    InUse {
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
        properties: Vec<String>,
    },

    #[error("{operation} failed: request {request_id} finished in FAILED state")]
    ProcessingFailed {
        operation: &'static str,
        request_id: RequestId,
    },

    #[error("timed out after {waited:?} waiting for {operation}")]
    Timeout {
        operation: &'static str,
        waited: Duration,
    },

    #[error("cancelled while waiting for {operation}")]
    Cancelled { operation: &'static str },

    #[error("inconsistent remote state: {0}")]
    Inconsistent(String),
}

impl AccessKeyError {
    pub(crate) fn remote(operation: &'static str) -> impl FnOnce(ClientError) -> Self {
        move |source| AccessKeyError::Remote { operation, source }
    }

    /// Short machine-oriented category of the error
    pub fn category(&self) -> &'static str {
        match self {
            AccessKeyError::Validation(_) => "validation",
            AccessKeyError::NotFound { .. } | AccessKeyError::NameNotFound { .. } => "not_found",
            AccessKeyError::Remote { .. } => "remote",
            AccessKeyError::InUse { .. } => "in_use",
            AccessKeyError::ProcessingFailed { .. } => "processing_failed",
            AccessKeyError::Timeout { .. } | AccessKeyError::Cancelled { .. } => "timeout",
            AccessKeyError::Inconsistent(_) => "inconsistent",
        }
    }

    /// Whether the remote system failed to converge within the allotted time
    /// (or the wait was cancelled), as opposed to rejecting the request.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            AccessKeyError::Timeout { .. } | AccessKeyError::Cancelled { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AccessKeyError::NotFound { .. } | AccessKeyError::NameNotFound { .. }
        )
    }
}

/// Failure of a mutating operation.
///
/// `state` holds whatever progress was committed before the failing step (for
/// instance a key that exists remotely but is still missing its second
/// credential). Callers should persist it so a retry resumes instead of
/// starting over.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PartialFailure {
    #[source]
    pub error: AccessKeyError,
    pub state: Option<Box<AccessKeyState>>,
}

impl PartialFailure {
    pub fn new(error: impl Into<AccessKeyError>, state: Option<AccessKeyState>) -> Self {
        Self {
            error: error.into(),
            state: state.map(Box::new),
        }
    }

    /// Failure that committed nothing.
    pub fn clean(error: impl Into<AccessKeyError>) -> Self {
        Self::new(error, None)
    }

    pub fn category(&self) -> &'static str {
        self.error.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_cancel_share_a_category() {
        let timeout = AccessKeyError::Timeout {
            operation: "access key creation",
            waited: Duration::from_secs(60),
        };
        let cancelled = AccessKeyError::Cancelled {
            operation: "access key creation",
        };

        assert_eq!(timeout.category(), "timeout");
        assert_eq!(cancelled.category(), "timeout");
        assert!(timeout.is_timeout());
        assert!(cancelled.is_timeout());
    }

    #[test]
    fn remote_rejection_is_not_a_timeout() {
        let err = AccessKeyError::remote("create access key")(ClientError::Api {
            status: 400,
            title: "Bad Request".to_string(),
            detail: "invalid group".to_string(),
        });

        assert_eq!(err.category(), "remote");
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("invalid group"));
    }

    #[test]
    fn in_use_names_version_key_and_properties() {
        let err = AccessKeyError::InUse {
            access_key_uid: 4242,
            version: 2,
            properties: vec!["www.example.com".to_string(), "img.example.com".to_string()],
        };

        let message = err.to_string();
        assert!(message.contains("version 2"));
        assert!(message.contains("access key 4242"));
        assert!(message.contains("www.example.com, img.example.com"));
        assert_eq!(err.category(), "in_use");
    }

    #[test]
    fn validation_errors_render_slot_labels() {
        let err = AccessKeyError::from(ValidationError::SecretReplaced { slot: Slot::B });
        assert!(err.to_string().contains("slot B"));
        assert_eq!(err.category(), "validation");
    }
}
