// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Mapping remote credential versions back onto slots A and B

use tracing::debug;

use cloudaccess_types::{AccessKeyVersion, VersionNumber};

use crate::state::{CredentialSlots, Slot, StoredCredential};

/// Outcome of resolving the remote version list against stored slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlots {
    pub credentials: CredentialSlots<StoredCredential>,
    /// Versions left over once both slots were taken, oldest first
    pub untracked: Vec<VersionNumber>,
}

/// Resolve `remote` (as listed, newest first) against the `stored` slots.
///
/// A version whose number matches a stored slot stays in that slot and has
/// its remote-supplied fields refreshed; the secret and primary flag are kept
/// from the stored slot. Stored slots whose version no longer exists are
/// emptied. Remaining versions are drift: in ascending version order they fill
/// whichever slots are still empty, with no secret and `primary = false`.
pub fn resolve(
    stored: &CredentialSlots<StoredCredential>,
    remote: &[AccessKeyVersion],
) -> ResolvedSlots {
    let mut ascending: Vec<&AccessKeyVersion> = remote.iter().rev().collect();
    ascending.sort_by_key(|version| version.version);

    let mut credentials = CredentialSlots::default();
    let mut drifted = Vec::new();

    for remote_version in ascending {
        let matched = Slot::ALL.into_iter().find_map(|slot| {
            stored
                .get(slot)
                .filter(|current| current.version == remote_version.version)
                .map(|current| (slot, current))
        });

        match matched {
            Some((slot, current)) => {
                credentials.set(
                    slot,
                    Some(StoredCredential {
                        cloud_access_key_id: remote_version.cloud_access_key_id.clone(),
                        cloud_secret_access_key: current.cloud_secret_access_key.clone(),
                        primary: current.primary,
                        version: remote_version.version,
                        version_guid: remote_version.version_guid.clone(),
                    }),
                );
            }
            None => drifted.push(remote_version),
        }
    }

    let mut untracked = Vec::new();
    for remote_version in drifted {
        match Slot::ALL
            .into_iter()
            .find(|&slot| credentials.get(slot).is_none())
        {
            Some(slot) => {
                debug!(
                    slot = %slot,
                    version = remote_version.version,
                    "adopting credential version created outside of this state"
                );
                credentials.set(
                    slot,
                    Some(StoredCredential {
                        cloud_access_key_id: remote_version.cloud_access_key_id.clone(),
                        cloud_secret_access_key: None,
                        primary: false,
                        version: remote_version.version,
                        version_guid: remote_version.version_guid.clone(),
                    }),
                );
            }
            None => untracked.push(remote_version.version),
        }
    }

    ResolvedSlots {
        credentials,
        untracked,
    }
}
