// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Adopting keys that were created outside of the engine

use tracing::{info, warn};

use cloudaccess_types::AccessKeyUid;

use crate::client::AccessKeyClient;
use crate::drift;
use crate::error::{AccessKeyError, ValidationError};
use crate::resource::AccessKeyResource;
use crate::state::{AccessKeyState, CredentialSlots, Timeouts};

/// Parse an import id of the form `"<access key uid>"`.
pub fn parse_import_id(id: &str) -> Result<AccessKeyUid, ValidationError> {
    match id.trim().parse::<AccessKeyUid>() {
        Ok(uid) if uid > 0 => Ok(uid),
        _ => Err(ValidationError::InvalidImportId(id.to_string())),
    }
}

impl<C> AccessKeyResource<C>
where
    C: AccessKeyClient + ?Sized,
{
    /// Build the observed state of an existing key.
    ///
    /// Secrets are never returned by the remote system, so imported
    /// credentials have none and no slot is primary until the caller declares
    /// one on the next update.
    pub async fn import(&self, id: &str) -> Result<AccessKeyState, AccessKeyError> {
        let access_key_uid = parse_import_id(id)?;

        let metadata = match self.client().get_access_key(access_key_uid).await {
            Ok(metadata) => metadata,
            Err(err) if err.is_not_found() => {
                return Err(AccessKeyError::NotFound { access_key_uid });
            }
            Err(err) => return Err(AccessKeyError::remote("get access key")(err)),
        };

        let (contract_id, group_id) = metadata.primary_assignment().ok_or_else(|| {
            AccessKeyError::Inconsistent(format!(
                "access key {} is not assigned to any contract and group",
                access_key_uid
            ))
        })?;
        let contract_id = contract_id.to_string();

        let versions = self
            .client()
            .list_access_key_versions(access_key_uid)
            .await
            .map_err(AccessKeyError::remote("list access key versions"))?;

        let resolved = drift::resolve(&CredentialSlots::default(), &versions);
        if !resolved.untracked.is_empty() {
            warn!(
                access_key_uid,
                untracked = ?resolved.untracked,
                "imported access key has more credential versions than slots"
            );
        }

        let mut state = AccessKeyState {
            access_key_uid,
            access_key_name: metadata.access_key_name,
            authentication_method: metadata.authentication_method,
            contract_id,
            group_id,
            network_configuration: metadata.network_configuration,
            credentials: resolved.credentials,
            primary_guid: String::new(),
            untracked_versions: resolved.untracked,
            timeouts: Timeouts::default(),
        };
        state.refresh_primary_guid();

        info!(access_key_uid, "access key imported");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("4242", Some(4242) ; "plain uid")]
    #[test_case(" 4242\n", Some(4242) ; "surrounding whitespace")]
    #[test_case("0", None ; "zero")]
    #[test_case("-7", None ; "negative")]
    #[test_case("key-4242", None ; "not a number")]
    #[test_case("", None ; "empty")]
    fn import_ids(id: &str, expected: Option<AccessKeyUid>) {
        assert_eq!(parse_import_id(id).ok(), expected);
    }
}
