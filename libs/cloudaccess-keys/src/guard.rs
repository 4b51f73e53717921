// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Property-safety guard
//!
//! A credential version that a delivery property still signs with must never
//! be deleted. Deletions run in batches, and the whole batch is checked before
//! the first version is deleted: callers run [`ensure_unused`] to completion
//! and only then start deleting.

use futures_util::future::try_join_all;
use tracing::{debug, warn};

use cloudaccess_types::{AccessKeyUid, VersionNumber};

use crate::client::AccessKeyClient;
use crate::error::AccessKeyError;

/// Names of the properties that reference `version`, empty if none do.
pub async fn properties_using<C>(
    client: &C,
    access_key_uid: AccessKeyUid,
    version: VersionNumber,
) -> Result<Vec<String>, AccessKeyError>
where
    C: AccessKeyClient + ?Sized,
{
    let references = client
        .lookup_properties(access_key_uid, version)
        .await
        .map_err(AccessKeyError::remote("look up properties using version"))?;

    Ok(references
        .into_iter()
        .map(|reference| reference.property_name)
        .collect())
}

pub async fn is_version_in_use<C>(
    client: &C,
    access_key_uid: AccessKeyUid,
    version: VersionNumber,
) -> Result<bool, AccessKeyError>
where
    C: AccessKeyClient + ?Sized,
{
    Ok(!properties_using(client, access_key_uid, version)
        .await?
        .is_empty())
}

/// Check every version in `versions` and fail if any is in use.
///
/// Lookups are read-only and run concurrently. The error names the first
/// offending version in the order given.
pub async fn ensure_unused<C>(
    client: &C,
    access_key_uid: AccessKeyUid,
    versions: &[VersionNumber],
) -> Result<(), AccessKeyError>
where
    C: AccessKeyClient + ?Sized,
{
    let lookups = versions.iter().map(|&version| async move {
        properties_using(client, access_key_uid, version)
            .await
            .map(|properties| (version, properties))
    });
    let results = try_join_all(lookups).await?;

    for (version, properties) in results {
        if !properties.is_empty() {
            warn!(
                access_key_uid,
                version,
                properties = ?properties,
                "credential version is still in use, refusing to delete"
            );
            return Err(AccessKeyError::InUse {
                access_key_uid,
                version,
                properties,
            });
        }
    }

    debug!(access_key_uid, versions = ?versions, "versions are safe to delete");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::testutil::FakeAccessKeyApi;

    #[tokio::test]
    async fn unused_versions_pass() {
        let api = FakeAccessKeyApi::new();
        let uid = api.seed_key("origin", &[("k1", "g1"), ("k2", "g2")]);

        ensure_unused(&api, uid, &[1, 2]).await.unwrap();
        assert!(!is_version_in_use(&api, uid, 1).await.unwrap());
    }

    #[tokio::test]
    async fn any_referenced_version_blocks_the_batch() {
        let api = FakeAccessKeyApi::new();
        let uid = api.seed_key("origin", &[("k1", "g1"), ("k2", "g2")]);
        api.reference_version(uid, 2, "www.example.com");

        let err = ensure_unused(&api, uid, &[1, 2]).await.unwrap_err();

        match err {
            AccessKeyError::InUse {
                access_key_uid,
                version,
                properties,
            } => {
                assert_eq!(access_key_uid, uid);
                assert_eq!(version, 2);
                assert_eq!(properties, vec!["www.example.com".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(is_version_in_use(&api, uid, 2).await.unwrap());
        assert_eq!(api.count_calls("lookup_properties"), 3);
    }

    #[tokio::test]
    async fn lookup_failures_are_fatal() {
        let api = FakeAccessKeyApi::new();
        let uid = api.seed_key("origin", &[("k1", "g1")]);
        api.fail_next("lookup_properties");

        let err = ensure_unused(&api, uid, &[1]).await.unwrap_err();

        assert_eq!(err.category(), "remote");
    }
}
