// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Refresh, drift resolution and import against the in-memory API.

// Allow unwrap in tests
#![allow(clippy::unwrap_used)]

mod common;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use cloudaccess_keys::testutil::SEEDED_CONTRACT_ID;
use cloudaccess_keys::{AccessKeyClient, AccessKeyError, CloudSecret};

use common::{cred, setup, spec};

#[tokio::test(start_paused = true)]
async fn read_returns_none_once_the_key_is_gone() {
    let (api, resource) = setup();
    let state = resource
        .create(&spec(Some(cred("k1", "s1", true)), None), &CancellationToken::new())
        .await
        .unwrap();
    api.remove_key(state.access_key_uid);

    assert_eq!(resource.read(&state).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn read_without_changes_is_stable() {
    let (_api, resource) = setup();
    let state = resource
        .create(
            &spec(Some(cred("k1", "s1", true)), Some(cred("k2", "s2", false))),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let refreshed = resource.read(&state).await.unwrap().unwrap();

    assert_eq!(refreshed, state);
}

#[tokio::test(start_paused = true)]
async fn read_adopts_out_of_band_rotation() {
    let (api, resource) = setup();
    let state = resource
        .create(
            &spec(Some(cred("k1", "s1", true)), Some(cred("k2", "s2", false))),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let uid = state.access_key_uid;

    // Another tool replaced version 2 with version 3.
    api.remove_version(uid, 2);
    let added = api.add_version(uid, "k3").unwrap();

    let refreshed = resource.read(&state).await.unwrap().unwrap();

    assert_eq!(refreshed.credentials.a, state.credentials.a);
    let b = refreshed.credentials.b.as_ref().unwrap();
    assert_eq!(b.version, added);
    assert_eq!(b.cloud_access_key_id, "k3");
    assert!(b.cloud_secret_access_key.is_none());
    assert!(!b.primary);
    assert_eq!(refreshed.primary_guid, state.primary_guid);
    assert!(refreshed.untracked_versions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn read_reports_versions_beyond_two_slots() {
    let (api, resource) = setup();
    let state = resource
        .create(
            &spec(Some(cred("k1", "s1", true)), Some(cred("k2", "s2", false))),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let extra = api.add_version(state.access_key_uid, "k3").unwrap();

    let refreshed = resource.read(&state).await.unwrap().unwrap();

    assert_eq!(refreshed.credentials, state.credentials);
    assert_eq!(refreshed.untracked_versions, vec![extra]);
}

#[tokio::test(start_paused = true)]
async fn read_picks_up_remote_rename() {
    let (api, resource) = setup();
    let state = resource
        .create(&spec(Some(cred("k1", "s1", true)), None), &CancellationToken::new())
        .await
        .unwrap();
    api.update_access_key_name(state.access_key_uid, "renamed")
        .await
        .unwrap();

    let refreshed = resource.read(&state).await.unwrap().unwrap();

    assert_eq!(refreshed.access_key_name, "renamed");
}

#[tokio::test(start_paused = true)]
async fn import_builds_state_from_remote_versions() {
    let (api, resource) = setup();
    let uid = api.seed_key("legacy", &[("k1", "g1"), ("k2", "g2")]);

    let state = resource.import(&uid.to_string()).await.unwrap();

    assert_eq!(state.access_key_uid, uid);
    assert_eq!(state.access_key_name, "legacy");
    assert_eq!(state.contract_id, SEEDED_CONTRACT_ID);
    let a = state.credentials.a.as_ref().unwrap();
    let b = state.credentials.b.as_ref().unwrap();
    assert_eq!((a.version, a.version_guid.as_str()), (1, "g1"));
    assert_eq!((b.version, b.version_guid.as_str()), (2, "g2"));
    assert!(a.cloud_secret_access_key.is_none());
    assert!(!a.primary && !b.primary);
    assert_eq!(state.primary_guid, "");
}

#[tokio::test(start_paused = true)]
async fn imported_credentials_can_be_declared_without_secrets() {
    let (api, resource) = setup();
    let uid = api.seed_key("origin-signing", &[("k1", "g1"), ("k2", "g2")]);
    let state = resource.import(&uid.to_string()).await.unwrap();
    let before = api.calls().len();

    let next = resource
        .update(
            &state,
            &spec(Some(cred("k1", "", true)), Some(cred("k2", "s2", false))),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(api.calls().len(), before);
    assert_eq!(next.primary_guid, "g1");
    assert_eq!(
        next.credentials.b.as_ref().unwrap().cloud_secret_access_key,
        CloudSecret::non_empty("s2")
    );
}

#[tokio::test(start_paused = true)]
async fn import_of_unknown_or_malformed_ids_fails() {
    let (_api, resource) = setup();

    let missing = resource.import("987654").await.unwrap_err();
    assert!(matches!(
        missing,
        AccessKeyError::NotFound {
            access_key_uid: 987654
        }
    ));

    let malformed = resource.import("not-a-uid").await.unwrap_err();
    assert_eq!(malformed.category(), "validation");
}
