// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Read-only queries over access keys

use futures_util::future::try_join_all;

use cloudaccess_types::{AccessKeyMetadata, AccessKeyUid, AccessKeyVersion, PropertyReference};

use crate::client::AccessKeyClient;
use crate::error::AccessKeyError;

/// A credential version together with the properties signing with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionUsage {
    pub version: AccessKeyVersion,
    pub properties: Vec<PropertyReference>,
}

impl VersionUsage {
    pub fn is_in_use(&self) -> bool {
        !self.properties.is_empty()
    }
}

/// Find the key whose display name is `access_key_name`.
///
/// Names are not unique remotely; more than one match is reported as
/// inconsistent rather than picking one.
pub async fn find_access_key<C>(
    client: &C,
    access_key_name: &str,
) -> Result<AccessKeyMetadata, AccessKeyError>
where
    C: AccessKeyClient + ?Sized,
{
    let keys = client
        .list_access_keys()
        .await
        .map_err(AccessKeyError::remote("list access keys"))?;

    let mut matching = keys
        .into_iter()
        .filter(|key| key.access_key_name == access_key_name);

    match (matching.next(), matching.next()) {
        (Some(key), None) => Ok(key),
        (None, _) => Err(AccessKeyError::NameNotFound {
            access_key_name: access_key_name.to_string(),
        }),
        (Some(first), Some(second)) => Err(AccessKeyError::Inconsistent(format!(
            "access key name {:?} is ambiguous (uids {}, {}{})",
            access_key_name,
            first.access_key_uid,
            second.access_key_uid,
            if matching.next().is_some() { ", ..." } else { "" }
        ))),
    }
}

/// Every version of a key, newest first, with the properties using it.
pub async fn list_versions_with_properties<C>(
    client: &C,
    access_key_uid: AccessKeyUid,
) -> Result<Vec<VersionUsage>, AccessKeyError>
where
    C: AccessKeyClient + ?Sized,
{
    let versions = match client.list_access_key_versions(access_key_uid).await {
        Ok(versions) => versions,
        Err(err) if err.is_not_found() => {
            return Err(AccessKeyError::NotFound { access_key_uid });
        }
        Err(err) => return Err(AccessKeyError::remote("list access key versions")(err)),
    };

    let lookups = versions.into_iter().map(|version| async move {
        let properties = client
            .lookup_properties(access_key_uid, version.version)
            .await
            .map_err(AccessKeyError::remote("look up properties using version"))?;
        Ok::<_, AccessKeyError>(VersionUsage {
            version,
            properties,
        })
    });

    try_join_all(lookups).await
}
