// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! In-memory access key service for tests.
//!
//! Feature-gated behind `testutil` so it never ships in production builds.
//! Integration tests enable it through a self dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! cloudaccess-keys = { workspace = true, features = ["testutil"] }
//! ```
//!
//! [`FakeAccessKeyApi`] records every call by method name and models the
//! asynchronous parts of the real service: creation requests stay
//! `IN_PROGRESS` for a configurable number of status checks, and deleted
//! versions and keys linger in listings for a configurable number of list
//! calls.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use cloudaccess_types::{
    AccessKeyGroup, AccessKeyMetadata, AccessKeyUid, AccessKeyVersion, AuthenticationMethod,
    CreateAccessKeyRequest, CreateAccessKeyVersionRequest, DeploymentStatus, KeyCreationStatus,
    NetworkConfiguration, PendingOperation, ProcessingStatus, PropertyReference, RequestId,
    SecurityNetwork, VersionCreationStatus, VersionNumber,
};

use crate::client::{AccessKeyClient, ClientError};

/// Contract of keys created through [`FakeAccessKeyApi::seed_key`]
pub const SEEDED_CONTRACT_ID: &str = "ctr_1-TEST";
/// Group of keys created through [`FakeAccessKeyApi::seed_key`]
pub const SEEDED_GROUP_ID: i64 = 12345;

#[derive(Debug)]
struct FakeVersion {
    version: AccessKeyVersion,
    secret: String,
    /// List calls left before a deleted version disappears
    lists_until_gone: Option<u32>,
}

#[derive(Debug)]
struct FakeKey {
    metadata: AccessKeyMetadata,
    versions: BTreeMap<VersionNumber, FakeVersion>,
    lists_until_gone: Option<u32>,
}

#[derive(Debug)]
struct FakeRequest {
    access_key_uid: Option<AccessKeyUid>,
    version: Option<VersionNumber>,
    polls_remaining: u32,
    failed: bool,
}

#[derive(Debug, Default)]
struct Inner {
    next_uid: AccessKeyUid,
    next_request: RequestId,
    keys: BTreeMap<AccessKeyUid, FakeKey>,
    requests: HashMap<RequestId, FakeRequest>,
    references: HashMap<(AccessKeyUid, VersionNumber), Vec<String>>,
    calls: Vec<String>,
    failures: Vec<String>,
    polls_until_done: u32,
    lists_until_gone: u32,
    retry_after: Duration,
    fail_processing: bool,
}

impl Inner {
    fn record(&mut self, method: &str) -> Result<(), ClientError> {
        self.calls.push(method.to_string());
        match self.failures.iter().position(|m| m == method) {
            Some(index) => {
                self.failures.remove(index);
                Err(ClientError::Transport(format!("injected {} failure", method)))
            }
            None => Ok(()),
        }
    }

    fn key(&self, access_key_uid: AccessKeyUid) -> Result<&FakeKey, ClientError> {
        self.keys
            .get(&access_key_uid)
            .ok_or_else(|| ClientError::NotFound(format!("access key {}", access_key_uid)))
    }

    fn key_mut(&mut self, access_key_uid: AccessKeyUid) -> Result<&mut FakeKey, ClientError> {
        self.keys
            .get_mut(&access_key_uid)
            .ok_or_else(|| ClientError::NotFound(format!("access key {}", access_key_uid)))
    }

    fn insert_key(
        &mut self,
        access_key_name: &str,
        authentication_method: AuthenticationMethod,
        contract_id: &str,
        group_id: i64,
        network_configuration: NetworkConfiguration,
    ) -> AccessKeyUid {
        self.next_uid += 1;
        let access_key_uid = 100_000 + self.next_uid;
        self.keys.insert(
            access_key_uid,
            FakeKey {
                metadata: AccessKeyMetadata {
                    access_key_uid,
                    access_key_name: access_key_name.to_string(),
                    authentication_method,
                    network_configuration,
                    groups: vec![AccessKeyGroup {
                        group_id,
                        group_name: Some(format!("group {}", group_id)),
                        contract_ids: vec![contract_id.to_string()],
                    }],
                    created_by: Some("fake".to_string()),
                    created_time: None,
                    latest_version: None,
                },
                versions: BTreeMap::new(),
                lists_until_gone: None,
            },
        );
        access_key_uid
    }

    fn insert_version(
        &mut self,
        access_key_uid: AccessKeyUid,
        cloud_access_key_id: &str,
        secret: &str,
        version_guid: Option<&str>,
    ) -> Result<VersionNumber, ClientError> {
        let key = self.key_mut(access_key_uid)?;
        let version = key.metadata.latest_version.unwrap_or(0) + 1;
        key.metadata.latest_version = Some(version);
        key.versions.insert(
            version,
            FakeVersion {
                version: AccessKeyVersion {
                    access_key_uid,
                    version,
                    version_guid: version_guid
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{}-v{}", access_key_uid, version)),
                    cloud_access_key_id: cloud_access_key_id.to_string(),
                    deployment_status: DeploymentStatus::Active,
                    created_by: Some("fake".to_string()),
                    created_time: None,
                },
                secret: secret.to_string(),
                lists_until_gone: None,
            },
        );
        Ok(version)
    }

    fn new_request(
        &mut self,
        access_key_uid: Option<AccessKeyUid>,
        version: Option<VersionNumber>,
    ) -> PendingOperation {
        self.next_request += 1;
        let request_id = self.next_request;
        self.requests.insert(
            request_id,
            FakeRequest {
                access_key_uid,
                version,
                polls_remaining: self.polls_until_done,
                failed: self.fail_processing,
            },
        );
        PendingOperation::new(request_id, self.retry_after)
    }

    fn poll_request(
        &mut self,
        request_id: RequestId,
    ) -> Result<(ProcessingStatus, Option<AccessKeyUid>, Option<VersionNumber>), ClientError> {
        let request = self
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| ClientError::NotFound(format!("request {}", request_id)))?;
        if request.polls_remaining > 0 {
            request.polls_remaining -= 1;
            return Ok((ProcessingStatus::InProgress, None, None));
        }
        if request.failed {
            return Ok((ProcessingStatus::Failed, None, None));
        }
        Ok((
            ProcessingStatus::Done,
            request.access_key_uid,
            request.version,
        ))
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process lingering deletions the way a listing observes them.
fn expire<K: Ord + Copy, V>(
    entries: &mut BTreeMap<K, V>,
    lists_until_gone: impl Fn(&mut V) -> &mut Option<u32>,
) {
    let mut gone = Vec::new();
    for (id, entry) in entries.iter_mut() {
        match lists_until_gone(entry) {
            Some(0) => gone.push(*id),
            Some(remaining) => *remaining -= 1,
            None => {}
        }
    }
    for id in gone {
        entries.remove(&id);
    }
}

/// In-memory [`AccessKeyClient`]
#[derive(Debug)]
pub struct FakeAccessKeyApi {
    inner: Mutex<Inner>,
}

impl Default for FakeAccessKeyApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAccessKeyApi {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Status checks answered `IN_PROGRESS` before a request completes.
    pub fn set_polls_until_done(&self, polls: u32) {
        lock(&self.inner).polls_until_done = polls;
    }

    /// List calls that still show a deleted version or key.
    pub fn set_lists_until_gone(&self, lists: u32) {
        lock(&self.inner).lists_until_gone = lists;
    }

    /// Initial delay advertised by new requests.
    pub fn set_retry_after(&self, retry_after: Duration) {
        lock(&self.inner).retry_after = retry_after;
    }

    /// Make subsequent creation requests end in `FAILED`.
    pub fn fail_processing(&self, fail: bool) {
        lock(&self.inner).fail_processing = fail;
    }

    /// Fail the next call of `method` with a transport error.
    pub fn fail_next(&self, method: &str) {
        lock(&self.inner).failures.push(method.to_string());
    }

    /// Create an active key holding one version per `(cloud access key id,
    /// version guid)` pair, numbered from 1.
    pub fn seed_key(&self, access_key_name: &str, versions: &[(&str, &str)]) -> AccessKeyUid {
        let mut inner = lock(&self.inner);
        let access_key_uid = inner.insert_key(
            access_key_name,
            AuthenticationMethod::Aws4HmacSha256,
            SEEDED_CONTRACT_ID,
            SEEDED_GROUP_ID,
            NetworkConfiguration {
                security_network: SecurityNetwork::StandardTls,
                additional_cdn: None,
            },
        );
        for &(cloud_access_key_id, version_guid) in versions {
            // The key was just inserted.
            let _ = inner.insert_version(
                access_key_uid,
                cloud_access_key_id,
                "seeded-secret",
                Some(version_guid),
            );
        }
        access_key_uid
    }

    /// Create a version out of band, as another tool would.
    pub fn add_version(
        &self,
        access_key_uid: AccessKeyUid,
        cloud_access_key_id: &str,
    ) -> Option<VersionNumber> {
        lock(&self.inner)
            .insert_version(access_key_uid, cloud_access_key_id, "out-of-band", None)
            .ok()
    }

    /// Remove a version out of band.
    pub fn remove_version(&self, access_key_uid: AccessKeyUid, version: VersionNumber) {
        if let Some(key) = lock(&self.inner).keys.get_mut(&access_key_uid) {
            key.versions.remove(&version);
        }
    }

    /// Remove a key out of band.
    pub fn remove_key(&self, access_key_uid: AccessKeyUid) {
        lock(&self.inner).keys.remove(&access_key_uid);
    }

    /// Make `property_name` reference `version` of a key.
    pub fn reference_version(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
        property_name: &str,
    ) {
        lock(&self.inner)
            .references
            .entry((access_key_uid, version))
            .or_default()
            .push(property_name.to_string());
    }

    pub fn key(&self, access_key_uid: AccessKeyUid) -> Option<AccessKeyMetadata> {
        lock(&self.inner)
            .keys
            .get(&access_key_uid)
            .map(|key| key.metadata.clone())
    }

    /// Versions currently stored for a key, newest first, without advancing
    /// lingering deletions.
    pub fn versions(&self, access_key_uid: AccessKeyUid) -> Vec<AccessKeyVersion> {
        lock(&self.inner)
            .keys
            .get(&access_key_uid)
            .map(|key| {
                key.versions
                    .values()
                    .rev()
                    .map(|v| v.version.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Secret a version was created with.
    pub fn secret_of(&self, access_key_uid: AccessKeyUid, version: VersionNumber) -> Option<String> {
        lock(&self.inner)
            .keys
            .get(&access_key_uid)
            .and_then(|key| key.versions.get(&version))
            .map(|v| v.secret.clone())
    }

    /// Every call made so far, by method name.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.inner).calls.clone()
    }

    pub fn count_calls(&self, method: &str) -> usize {
        lock(&self.inner)
            .calls
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }

    /// Calls that change remote state.
    pub fn mutating_calls(&self) -> Vec<String> {
        const MUTATING: [&str; 5] = [
            "create_access_key",
            "create_access_key_version",
            "update_access_key_name",
            "delete_access_key_version",
            "delete_access_key",
        ];
        lock(&self.inner)
            .calls
            .iter()
            .filter(|m| MUTATING.contains(&m.as_str()))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AccessKeyClient for FakeAccessKeyApi {
    async fn create_access_key(
        &self,
        request: &CreateAccessKeyRequest,
    ) -> Result<PendingOperation, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("create_access_key")?;
        if inner.fail_processing {
            return Ok(inner.new_request(None, None));
        }
        let access_key_uid = inner.insert_key(
            &request.access_key_name,
            request.authentication_method,
            &request.contract_id,
            request.group_id,
            request.network_configuration,
        );
        let version = inner.insert_version(
            access_key_uid,
            &request.credentials.cloud_access_key_id,
            &request.credentials.cloud_secret_access_key,
            None,
        )?;
        Ok(inner.new_request(Some(access_key_uid), Some(version)))
    }

    async fn get_access_key_status(
        &self,
        request_id: RequestId,
    ) -> Result<KeyCreationStatus, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("get_access_key_status")?;
        let (processing_status, access_key_uid, version) = inner.poll_request(request_id)?;
        Ok(KeyCreationStatus {
            request_id,
            processing_status,
            access_key_uid,
            version,
        })
    }

    async fn create_access_key_version(
        &self,
        access_key_uid: AccessKeyUid,
        request: &CreateAccessKeyVersionRequest,
    ) -> Result<PendingOperation, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("create_access_key_version")?;
        inner.key(access_key_uid)?;
        if inner.fail_processing {
            return Ok(inner.new_request(Some(access_key_uid), None));
        }
        let version = inner.insert_version(
            access_key_uid,
            &request.credentials.cloud_access_key_id,
            &request.credentials.cloud_secret_access_key,
            None,
        )?;
        Ok(inner.new_request(Some(access_key_uid), Some(version)))
    }

    async fn get_access_key_version_status(
        &self,
        request_id: RequestId,
    ) -> Result<VersionCreationStatus, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("get_access_key_version_status")?;
        let (processing_status, access_key_uid, version) = inner.poll_request(request_id)?;
        Ok(VersionCreationStatus {
            request_id,
            processing_status,
            access_key_uid,
            version,
        })
    }

    async fn get_access_key(
        &self,
        access_key_uid: AccessKeyUid,
    ) -> Result<AccessKeyMetadata, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("get_access_key")?;
        Ok(inner.key(access_key_uid)?.metadata.clone())
    }

    async fn update_access_key_name(
        &self,
        access_key_uid: AccessKeyUid,
        access_key_name: &str,
    ) -> Result<AccessKeyMetadata, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("update_access_key_name")?;
        let key = inner.key_mut(access_key_uid)?;
        key.metadata.access_key_name = access_key_name.to_string();
        Ok(key.metadata.clone())
    }

    async fn list_access_key_versions(
        &self,
        access_key_uid: AccessKeyUid,
    ) -> Result<Vec<AccessKeyVersion>, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("list_access_key_versions")?;
        let key = inner.key_mut(access_key_uid)?;
        expire(&mut key.versions, |v| &mut v.lists_until_gone);
        Ok(key
            .versions
            .values()
            .rev()
            .map(|v| v.version.clone())
            .collect())
    }

    async fn get_access_key_version(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
    ) -> Result<AccessKeyVersion, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("get_access_key_version")?;
        inner
            .key(access_key_uid)?
            .versions
            .get(&version)
            .map(|v| v.version.clone())
            .ok_or_else(|| {
                ClientError::NotFound(format!(
                    "version {} of access key {}",
                    version, access_key_uid
                ))
            })
    }

    async fn delete_access_key_version(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
    ) -> Result<(), ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("delete_access_key_version")?;
        let lists_until_gone = inner.lists_until_gone;
        let key = inner.key_mut(access_key_uid)?;
        let entry = key.versions.get_mut(&version).ok_or_else(|| {
            ClientError::NotFound(format!(
                "version {} of access key {}",
                version, access_key_uid
            ))
        })?;
        entry.version.deployment_status = DeploymentStatus::PendingDeletion;
        entry.lists_until_gone.get_or_insert(lists_until_gone);
        Ok(())
    }

    async fn delete_access_key(&self, access_key_uid: AccessKeyUid) -> Result<(), ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("delete_access_key")?;
        let lists_until_gone = inner.lists_until_gone;
        let key = inner.key_mut(access_key_uid)?;
        if !key.versions.is_empty() {
            return Err(ClientError::Api {
                status: 409,
                title: "Conflict".to_string(),
                detail: format!("access key {} still has versions", access_key_uid),
            });
        }
        key.lists_until_gone.get_or_insert(lists_until_gone);
        Ok(())
    }

    async fn list_access_keys(&self) -> Result<Vec<AccessKeyMetadata>, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("list_access_keys")?;
        expire(&mut inner.keys, |k| &mut k.lists_until_gone);
        Ok(inner.keys.values().map(|k| k.metadata.clone()).collect())
    }

    async fn lookup_properties(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
    ) -> Result<Vec<PropertyReference>, ClientError> {
        let mut inner = lock(&self.inner);
        inner.record("lookup_properties")?;
        Ok(inner
            .references
            .get(&(access_key_uid, version))
            .map(|names| {
                names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| PropertyReference {
                        property_id: format!("prp_{}", i + 1),
                        property_name: name.clone(),
                        production_version: Some(1),
                        staging_version: None,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn deleted_versions_linger_for_configured_lists() {
        let api = FakeAccessKeyApi::new();
        let uid = api.seed_key("origin", &[("k1", "g1"), ("k2", "g2")]);
        api.set_lists_until_gone(1);

        api.delete_access_key_version(uid, 1).await.unwrap();

        let first = api.list_access_key_versions(uid).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].deployment_status, DeploymentStatus::PendingDeletion);

        let second = api.list_access_key_versions(uid).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].version, 2);
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let api = FakeAccessKeyApi::new();
        let uid = api.seed_key("origin", &[("k1", "g1")]);
        api.fail_next("get_access_key");

        assert!(api.get_access_key(uid).await.is_err());
        assert!(api.get_access_key(uid).await.is_ok());
        assert_eq!(api.count_calls("get_access_key"), 2);
    }
}
