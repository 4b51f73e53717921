// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Test helpers for cloudaccess-keys integration tests

// Not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Arc;

use cloudaccess_keys::testutil::{FakeAccessKeyApi, SEEDED_CONTRACT_ID, SEEDED_GROUP_ID};
use cloudaccess_keys::{
    AccessKeyResource, AccessKeySpec, Credential, CredentialSlots, ReconcilerConfig, Timeouts,
};
use cloudaccess_types::{AuthenticationMethod, NetworkConfiguration, SecurityNetwork};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fake API plus a resource driving it with default configuration
pub fn setup() -> (Arc<FakeAccessKeyApi>, AccessKeyResource<FakeAccessKeyApi>) {
    init_tracing();
    let api = Arc::new(FakeAccessKeyApi::new());
    let resource = AccessKeyResource::new(Arc::clone(&api), ReconcilerConfig::default());
    (api, resource)
}

pub fn cred(cloud_access_key_id: &str, secret: &str, primary: bool) -> Credential {
    Credential::new(cloud_access_key_id, secret, primary)
}

/// Desired state matching the contract and group of seeded keys
pub fn spec(a: Option<Credential>, b: Option<Credential>) -> AccessKeySpec {
    AccessKeySpec {
        access_key_name: "origin-signing".to_string(),
        authentication_method: AuthenticationMethod::Aws4HmacSha256,
        contract_id: SEEDED_CONTRACT_ID.to_string(),
        group_id: SEEDED_GROUP_ID,
        network_configuration: NetworkConfiguration {
            security_network: SecurityNetwork::StandardTls,
            additional_cdn: None,
        },
        credentials: CredentialSlots::new(a, b),
        timeouts: Timeouts::default(),
    }
}
