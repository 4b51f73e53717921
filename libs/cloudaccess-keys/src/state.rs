// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Desired and observed access key state
//!
//! The hosting layer owns persistence of these snapshots. The engine only
//! receives them as inputs and returns new [`AccessKeyState`] values.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use strum::{Display, EnumString};

use cloudaccess_types::{
    AccessKeyUid, AuthenticationMethod, Credentials, NetworkConfiguration, VersionNumber,
};

/// One of the two fixed positions a credential version may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::A, Slot::B];

    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// A cloud-side secret access key.
///
/// The remote system never returns secrets, so a secret is only known when
/// the caller supplied it. Empty input is represented as `None` by callers
/// (see [`CloudSecret::non_empty`]).
pub struct CloudSecret(SecretString);

impl CloudSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        let secret: String = secret.into();
        Self(SecretString::new(secret.into_boxed_str()))
    }

    /// Wrap `secret`, mapping the empty string to `None`.
    pub fn non_empty(secret: impl Into<String>) -> Option<Self> {
        let secret: String = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self::new(secret))
        }
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for CloudSecret {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl PartialEq for CloudSecret {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for CloudSecret {}

impl fmt::Debug for CloudSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CloudSecret([REDACTED])")
    }
}

/// A credential as declared by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub cloud_access_key_id: String,
    pub cloud_secret_access_key: Option<CloudSecret>,
    pub primary: bool,
}

impl Credential {
    pub fn new(
        cloud_access_key_id: impl Into<String>,
        cloud_secret_access_key: impl Into<String>,
        primary: bool,
    ) -> Self {
        Self {
            cloud_access_key_id: cloud_access_key_id.into(),
            cloud_secret_access_key: CloudSecret::non_empty(cloud_secret_access_key),
            primary,
        }
    }

    /// Wire credentials, if the secret is known.
    pub(crate) fn to_wire(&self) -> Option<Credentials> {
        self.cloud_secret_access_key
            .as_ref()
            .map(|secret| Credentials {
                cloud_access_key_id: self.cloud_access_key_id.clone(),
                cloud_secret_access_key: secret.expose().to_string(),
            })
    }
}

/// A credential version as last observed in a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub cloud_access_key_id: String,
    /// Known only if supplied by the caller; never refreshed from the remote
    pub cloud_secret_access_key: Option<CloudSecret>,
    pub primary: bool,
    pub version: VersionNumber,
    pub version_guid: String,
}

/// Fixed-cardinality credential holder addressed by [`Slot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSlots<T> {
    pub a: Option<T>,
    pub b: Option<T>,
}

impl<T> Default for CredentialSlots<T> {
    fn default() -> Self {
        Self { a: None, b: None }
    }
}

impl<T> CredentialSlots<T> {
    pub fn new(a: Option<T>, b: Option<T>) -> Self {
        Self { a, b }
    }

    pub fn get(&self, slot: Slot) -> Option<&T> {
        match slot {
            Slot::A => self.a.as_ref(),
            Slot::B => self.b.as_ref(),
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        match slot {
            Slot::A => self.a.as_mut(),
            Slot::B => self.b.as_mut(),
        }
    }

    pub fn set(&mut self, slot: Slot, value: Option<T>) {
        match slot {
            Slot::A => self.a = value,
            Slot::B => self.b = value,
        }
    }

    /// Populated slots in A, B order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        Slot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|value| (slot, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_none() && self.b.is_none()
    }
}

/// Per-resource operation deadlines; unset values fall back to the
/// configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Option<Duration>,
    pub update: Option<Duration>,
    pub delete: Option<Duration>,
}

/// Desired state of an access key, as declared by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeySpec {
    pub access_key_name: String,
    pub authentication_method: AuthenticationMethod,
    pub contract_id: String,
    pub group_id: i64,
    pub network_configuration: NetworkConfiguration,
    pub credentials: CredentialSlots<Credential>,
    pub timeouts: Timeouts,
}

/// Observed state of an access key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyState {
    pub access_key_uid: AccessKeyUid,
    pub access_key_name: String,
    pub authentication_method: AuthenticationMethod,
    pub contract_id: String,
    pub group_id: i64,
    pub network_configuration: NetworkConfiguration,
    pub credentials: CredentialSlots<StoredCredential>,
    /// Version GUID of the primary credential, empty if none is primary
    pub primary_guid: String,
    /// Remote versions that neither slot could hold on the last read
    pub untracked_versions: Vec<VersionNumber>,
    pub timeouts: Timeouts,
}

impl AccessKeyState {
    /// State of a freshly created key, before any credential is recorded.
    pub(crate) fn from_spec(access_key_uid: AccessKeyUid, spec: &AccessKeySpec) -> Self {
        Self {
            access_key_uid,
            access_key_name: spec.access_key_name.clone(),
            authentication_method: spec.authentication_method,
            contract_id: spec.contract_id.clone(),
            group_id: spec.group_id,
            network_configuration: spec.network_configuration,
            credentials: CredentialSlots::default(),
            primary_guid: String::new(),
            untracked_versions: Vec::new(),
            timeouts: spec.timeouts,
        }
    }

    /// Recompute [`AccessKeyState::primary_guid`] from the slots.
    pub fn refresh_primary_guid(&mut self) {
        self.primary_guid = primary_guid(&self.credentials);
    }
}

/// Version GUID of whichever slot is primary, or empty.
pub fn primary_guid(credentials: &CredentialSlots<StoredCredential>) -> String {
    credentials
        .iter()
        .find(|(_, credential)| credential.primary)
        .map(|(_, credential)| credential.version_guid.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: &str, version: VersionNumber, primary: bool) -> StoredCredential {
        StoredCredential {
            cloud_access_key_id: id.to_string(),
            cloud_secret_access_key: None,
            primary,
            version,
            version_guid: format!("guid-{}", version),
        }
    }

    #[test]
    fn primary_guid_follows_primary_slot() {
        let slots = CredentialSlots::new(Some(stored("k1", 1, false)), Some(stored("k2", 2, true)));
        assert_eq!(primary_guid(&slots), "guid-2");

        let slots = CredentialSlots::new(Some(stored("k1", 1, false)), None);
        assert_eq!(primary_guid(&slots), "");
    }

    #[test]
    fn slots_iterate_in_label_order() {
        let slots = CredentialSlots::new(Some(1), Some(2));
        let seen: Vec<_> = slots.iter().map(|(slot, v)| (slot, *v)).collect();
        assert_eq!(seen, vec![(Slot::A, 1), (Slot::B, 2)]);

        let slots: CredentialSlots<i32> = CredentialSlots::new(None, Some(2));
        assert_eq!(slots.iter().count(), 1);
        assert!(!slots.is_empty());
    }

    #[test]
    fn empty_secret_is_unknown() {
        let credential = Credential::new("k1", "", true);
        assert!(credential.cloud_secret_access_key.is_none());
        assert!(credential.to_wire().is_none());

        let credential = Credential::new("k1", "s1", true);
        let wire = credential.to_wire();
        assert_eq!(
            wire.map(|w| w.cloud_secret_access_key),
            Some("s1".to_string())
        );
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = CloudSecret::new("hunter2");
        assert!(!format!("{:?}", secret).contains("hunter2"));
        assert_eq!(secret.clone(), secret);
    }
}
