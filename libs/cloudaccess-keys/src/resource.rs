// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Access key resource orchestration
//!
//! [`AccessKeyResource`] is the entry point used by the hosting layer. Each
//! operation runs under its own [`Deadline`], derived from the configured
//! timeout (or the resource's override) and the caller's cancellation token.
//!
//! Lifecycle of a key as driven from here:
//!
//! ```text
//! absent -> pending activation (create request) -> active (0, 1 or 2 versions)
//!        -> pending deletion (per version) -> absent
//! ```
//!
//! Mutating operations commit progress into the state they return. When a
//! step fails after something was changed remotely, the error carries that
//! partial state ([`PartialFailure`]) so the caller can persist it and retry
//! incrementally.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cloudaccess_types::{
    AccessKeyUid, AccessKeyVersion, CreateAccessKeyRequest, CreateAccessKeyVersionRequest,
    DeploymentStatus, ProcessingStatus, RequestId, VersionNumber,
};

use crate::client::AccessKeyClient;
use crate::config::ReconcilerConfig;
use crate::drift;
use crate::error::{AccessKeyError, PartialFailure, ValidationError};
use crate::guard;
use crate::poller::{Deadline, PollStatus, Poller};
use crate::slots::{self, Creation, Deletion};
use crate::state::{AccessKeySpec, AccessKeyState, Credential, Slot, StoredCredential};

/// Orchestrates create, read, update and delete of one kind of resource
/// against an injected [`AccessKeyClient`].
pub struct AccessKeyResource<C: ?Sized> {
    client: Arc<C>,
    config: ReconcilerConfig,
    poller: Poller,
}

impl<C> AccessKeyResource<C>
where
    C: AccessKeyClient + ?Sized,
{
    pub fn new(client: Arc<C>, config: ReconcilerConfig) -> Self {
        let poller = Poller::new(config.poll_interval());
        Self {
            client,
            config,
            poller,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Create the key with its first credential, then the second credential
    /// if one was declared.
    pub async fn create(
        &self,
        spec: &AccessKeySpec,
        cancel: &CancellationToken,
    ) -> Result<AccessKeyState, PartialFailure> {
        slots::validate_desired(&spec.credentials).map_err(PartialFailure::clean)?;

        let mut declared = spec.credentials.iter().map(|(slot, credential)| Creation {
            slot,
            credential: credential.clone(),
        });
        let first = declared
            .next()
            .ok_or(ValidationError::MissingCredentials)
            .map_err(PartialFailure::clean)?;
        let second = declared.next();

        let first_credentials = first.credential.to_wire().ok_or_else(|| {
            PartialFailure::clean(ValidationError::MissingSecret { slot: first.slot })
        })?;
        if let Some(second) = &second
            && second.credential.cloud_secret_access_key.is_none()
        {
            return Err(PartialFailure::clean(ValidationError::MissingSecret {
                slot: second.slot,
            }));
        }

        let deadline = Deadline::new(
            self.config.create_timeout(&spec.timeouts),
            cancel.clone(),
        );

        let request = CreateAccessKeyRequest {
            access_key_name: spec.access_key_name.clone(),
            authentication_method: spec.authentication_method,
            contract_id: spec.contract_id.clone(),
            group_id: spec.group_id,
            network_configuration: spec.network_configuration,
            credentials: first_credentials,
        };
        let pending = self
            .client
            .create_access_key(&request)
            .await
            .map_err(AccessKeyError::remote("create access key"))
            .map_err(PartialFailure::clean)?;
        info!(
            access_key_name = %spec.access_key_name,
            request_id = pending.request_id,
            "access key creation requested"
        );

        let client = &*self.client;
        let (access_key_uid, version) = self
            .poller
            .wait(
                "access key creation",
                pending.retry_after,
                &deadline,
                || async move {
                    let status = client
                        .get_access_key_status(pending.request_id)
                        .await
                        .map_err(AccessKeyError::remote("get access key creation status"))?;
                    poll_status(
                        status.processing_status,
                        status.request_id,
                        status.access_key_uid.zip(status.version),
                    )
                },
            )
            .await
            .map_err(PartialFailure::clean)?;

        let mut state = AccessKeyState::from_spec(access_key_uid, spec);
        info!(access_key_uid, version, "access key created");

        // From here on the key exists remotely, so every failure returns the
        // state committed so far.
        let created = match self.fetch_version(access_key_uid, version).await {
            Ok(created) => created,
            Err(err) => return Err(PartialFailure::new(err, Some(state))),
        };
        state
            .credentials
            .set(first.slot, Some(stored_from(&first.credential, &created)));
        state.refresh_primary_guid();

        if let Some(second) = second {
            match self
                .create_version(access_key_uid, &second, &deadline)
                .await
            {
                Ok(stored) => {
                    state.credentials.set(second.slot, Some(stored));
                    state.refresh_primary_guid();
                }
                Err(err) => return Err(PartialFailure::new(err, Some(state))),
            }
        }

        Ok(state)
    }

    /// Refresh `state` from the remote system.
    ///
    /// Returns `Ok(None)` when the key no longer exists, so the caller can
    /// stop tracking it.
    pub async fn read(
        &self,
        state: &AccessKeyState,
    ) -> Result<Option<AccessKeyState>, AccessKeyError> {
        let access_key_uid = state.access_key_uid;

        let metadata = match self.client.get_access_key(access_key_uid).await {
            Ok(metadata) => metadata,
            Err(err) if err.is_not_found() => {
                info!(access_key_uid, "access key no longer exists");
                return Ok(None);
            }
            Err(err) => return Err(AccessKeyError::remote("get access key")(err)),
        };

        let versions = self
            .client
            .list_access_key_versions(access_key_uid)
            .await
            .map_err(AccessKeyError::remote("list access key versions"))?;

        let resolved = drift::resolve(&state.credentials, &versions);
        if !resolved.untracked.is_empty() {
            warn!(
                access_key_uid,
                untracked = ?resolved.untracked,
                "access key has more credential versions than slots; extra versions are not tracked"
            );
        }

        let mut next = state.clone();
        next.access_key_name = metadata.access_key_name;
        next.authentication_method = metadata.authentication_method;
        next.network_configuration = metadata.network_configuration;
        next.credentials = resolved.credentials;
        next.untracked_versions = resolved.untracked;
        next.refresh_primary_guid();

        Ok(Some(next))
    }

    /// Converge the remote key from `state` to `spec`.
    pub async fn update(
        &self,
        state: &AccessKeyState,
        spec: &AccessKeySpec,
        cancel: &CancellationToken,
    ) -> Result<AccessKeyState, PartialFailure> {
        let access_key_uid = state.access_key_uid;

        check_immutable(state, spec).map_err(PartialFailure::clean)?;
        if spec.credentials.is_empty() {
            return Err(PartialFailure::clean(ValidationError::MissingCredentials));
        }
        let plan =
            slots::plan(&state.credentials, &spec.credentials).map_err(PartialFailure::clean)?;

        // Commit carried-over credentials first. Versions awaiting deletion
        // stay visible in their old slot while it is free, demoted so the
        // primary invariant holds.
        let mut next = state.clone();
        next.timeouts = spec.timeouts;
        next.credentials = plan.kept.clone();
        for deletion in &plan.deletions {
            if next.credentials.get(deletion.slot).is_none()
                && let Some(current) = state.credentials.get(deletion.slot)
            {
                next.credentials.set(
                    deletion.slot,
                    Some(StoredCredential {
                        primary: false,
                        ..current.clone()
                    }),
                );
            }
        }
        next.refresh_primary_guid();

        let rename = spec.access_key_name != state.access_key_name;
        if !rename && !plan.is_structural() {
            debug!(access_key_uid, "no remote changes required");
            return Ok(next);
        }

        let deadline = Deadline::new(
            self.config.update_timeout(&spec.timeouts),
            cancel.clone(),
        );

        if rename {
            match self
                .client
                .update_access_key_name(access_key_uid, &spec.access_key_name)
                .await
            {
                Ok(metadata) => {
                    info!(
                        access_key_uid,
                        access_key_name = %metadata.access_key_name,
                        "access key renamed"
                    );
                    next.access_key_name = metadata.access_key_name;
                }
                Err(err) => {
                    return Err(PartialFailure::new(
                        AccessKeyError::remote("update access key name")(err),
                        Some(next),
                    ));
                }
            }
        }

        if !plan.deletions.is_empty() {
            if let Err(err) =
                guard::ensure_unused(&*self.client, access_key_uid, &plan.deleted_versions()).await
            {
                return Err(PartialFailure::new(err, Some(next)));
            }
            if let Err(err) = self
                .delete_versions(access_key_uid, &plan.deletions, &deadline, &mut next)
                .await
            {
                return Err(PartialFailure::new(err, Some(next)));
            }
        }

        for creation in &plan.creations {
            match self
                .create_version(access_key_uid, creation, &deadline)
                .await
            {
                Ok(stored) => {
                    next.credentials.set(creation.slot, Some(stored));
                    next.refresh_primary_guid();
                }
                Err(err) => return Err(PartialFailure::new(err, Some(next))),
            }
        }

        next.refresh_primary_guid();
        Ok(next)
    }

    /// Delete every credential version and then the key itself.
    ///
    /// All versions are checked against the property guard before anything
    /// is deleted.
    pub async fn delete(
        &self,
        state: &AccessKeyState,
        cancel: &CancellationToken,
    ) -> Result<(), AccessKeyError> {
        let access_key_uid = state.access_key_uid;
        let deadline = Deadline::new(self.config.delete_timeout(&state.timeouts), cancel.clone());

        let versions = match self.client.list_access_key_versions(access_key_uid).await {
            Ok(versions) => versions,
            Err(err) if err.is_not_found() => {
                info!(access_key_uid, "access key already deleted");
                return Ok(());
            }
            Err(err) => return Err(AccessKeyError::remote("list access key versions")(err)),
        };

        let numbers: Vec<VersionNumber> = versions.iter().map(|v| v.version).collect();
        guard::ensure_unused(&*self.client, access_key_uid, &numbers).await?;

        for version in &versions {
            self.delete_version(
                access_key_uid,
                version.version,
                version.deployment_status,
                &deadline,
            )
            .await?;
        }

        match self.client.delete_access_key(access_key_uid).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(AccessKeyError::remote("delete access key")(err)),
        }
        info!(access_key_uid, "access key deletion requested");

        let client = &*self.client;
        self.poller
            .wait("access key deletion", self.poller.interval(), &deadline, || async move {
                match client.list_access_keys().await {
                    Ok(keys) if keys.iter().any(|k| k.access_key_uid == access_key_uid) => {
                        Ok(PollStatus::Pending)
                    }
                    Ok(_) => Ok(PollStatus::Done(())),
                    Err(err) => {
                        warn!(access_key_uid, error = %err, "failed to list access keys, retrying");
                        Ok(PollStatus::Pending)
                    }
                }
            })
            .await?;

        info!(access_key_uid, "access key deleted");
        Ok(())
    }

    async fn fetch_version(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
    ) -> Result<AccessKeyVersion, AccessKeyError> {
        self.client
            .get_access_key_version(access_key_uid, version)
            .await
            .map_err(AccessKeyError::remote("get access key version"))
    }

    async fn create_version(
        &self,
        access_key_uid: AccessKeyUid,
        creation: &Creation,
        deadline: &Deadline,
    ) -> Result<StoredCredential, AccessKeyError> {
        let credentials = creation
            .credential
            .to_wire()
            .ok_or(ValidationError::MissingSecret {
                slot: creation.slot,
            })?;
        let request = CreateAccessKeyVersionRequest { credentials };

        let pending = self
            .client
            .create_access_key_version(access_key_uid, &request)
            .await
            .map_err(AccessKeyError::remote("create access key version"))?;
        info!(
            access_key_uid,
            slot = %creation.slot,
            request_id = pending.request_id,
            "credential version creation requested"
        );

        let client = &*self.client;
        let version = self
            .poller
            .wait(
                "credential version creation",
                pending.retry_after,
                deadline,
                || async move {
                    let status = client
                        .get_access_key_version_status(pending.request_id)
                        .await
                        .map_err(AccessKeyError::remote(
                            "get access key version creation status",
                        ))?;
                    poll_status(status.processing_status, status.request_id, status.version)
                },
            )
            .await?;

        let created = self.fetch_version(access_key_uid, version).await?;
        info!(
            access_key_uid,
            slot = %creation.slot,
            version,
            "credential version created"
        );
        Ok(stored_from(&creation.credential, &created))
    }

    async fn delete_versions(
        &self,
        access_key_uid: AccessKeyUid,
        deletions: &[Deletion],
        deadline: &Deadline,
        state: &mut AccessKeyState,
    ) -> Result<(), AccessKeyError> {
        for deletion in deletions {
            self.delete_version(
                access_key_uid,
                deletion.version,
                DeploymentStatus::Active,
                deadline,
            )
            .await?;

            for slot in Slot::ALL {
                if state
                    .credentials
                    .get(slot)
                    .is_some_and(|c| c.version == deletion.version)
                {
                    state.credentials.set(slot, None);
                }
            }
            state.refresh_primary_guid();
        }
        Ok(())
    }

    /// Delete one version and wait until it disappears from the version list.
    async fn delete_version(
        &self,
        access_key_uid: AccessKeyUid,
        version: VersionNumber,
        status: DeploymentStatus,
        deadline: &Deadline,
    ) -> Result<(), AccessKeyError> {
        if status == DeploymentStatus::PendingDeletion {
            debug!(access_key_uid, version, "version deletion already in progress");
        } else {
            match self
                .client
                .delete_access_key_version(access_key_uid, version)
                .await
            {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    debug!(access_key_uid, version, "version already deleted");
                }
                Err(err) => return Err(AccessKeyError::remote("delete access key version")(err)),
            }
            info!(access_key_uid, version, "credential version deletion requested");
        }

        let client = &*self.client;
        self.poller
            .wait(
                "credential version deletion",
                Duration::ZERO,
                deadline,
                || async move {
                    match client.list_access_key_versions(access_key_uid).await {
                        Ok(versions) if versions.iter().any(|v| v.version == version) => {
                            Ok(PollStatus::Pending)
                        }
                        Ok(_) => Ok(PollStatus::Done(())),
                        Err(err) if err.is_not_found() => Ok(PollStatus::Done(())),
                        Err(err) => {
                            warn!(
                                access_key_uid,
                                version,
                                error = %err,
                                "failed to list access key versions, retrying"
                            );
                            Ok(PollStatus::Pending)
                        }
                    }
                },
            )
            .await?;

        info!(access_key_uid, version, "credential version deleted");
        Ok(())
    }
}

fn check_immutable(state: &AccessKeyState, spec: &AccessKeySpec) -> Result<(), ValidationError> {
    let attribute = if state.authentication_method != spec.authentication_method {
        "authentication_method"
    } else if state.contract_id != spec.contract_id {
        "contract_id"
    } else if state.group_id != spec.group_id {
        "group_id"
    } else if state.network_configuration != spec.network_configuration {
        "network_configuration"
    } else {
        return Ok(());
    };
    Err(ValidationError::ImmutableAttribute { attribute })
}

fn stored_from(credential: &Credential, created: &AccessKeyVersion) -> StoredCredential {
    StoredCredential {
        cloud_access_key_id: created.cloud_access_key_id.clone(),
        cloud_secret_access_key: credential.cloud_secret_access_key.clone(),
        primary: credential.primary,
        version: created.version,
        version_guid: created.version_guid.clone(),
    }
}

/// Map a creation request status to a poll step. `created` is what a `DONE`
/// status must identify.
fn poll_status<T>(
    processing_status: ProcessingStatus,
    request_id: RequestId,
    created: Option<T>,
) -> Result<PollStatus<T>, AccessKeyError> {
    if !processing_status.is_terminal() {
        return Ok(PollStatus::Pending);
    }
    if processing_status == ProcessingStatus::Failed {
        return Ok(PollStatus::Failed { request_id });
    }
    created.map(PollStatus::Done).ok_or_else(|| {
        AccessKeyError::Inconsistent(format!(
            "request {} reported DONE without identifying what it created",
            request_id
        ))
    })
}
