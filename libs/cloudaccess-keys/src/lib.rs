// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Cloud access key lifecycle and reconciliation engine
//!
//! This library converges a remote cloud access key (a named signing identity
//! holding up to two credential versions) towards a declared desired state.
//! It provides:
//!
//! - A bounded poller for the remote service's asynchronous requests
//! - A property-safety guard that refuses to delete versions still in use
//! - A slot reconciler mapping desired credentials A/B to version creations
//!   and deletions
//! - A drift resolver mapping remote versions back onto slots
//! - An orchestrator ([`AccessKeyResource`]) implementing create, read,
//!   update, delete and import
//!
//! The remote service is reached only through the [`AccessKeyClient`] trait.
//! Persistence of [`AccessKeyState`] belongs to the caller.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cloudaccess_keys::{AccessKeyResource, ReconcilerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let resource = AccessKeyResource::new(Arc::new(client), ReconcilerConfig::from_env()?);
//! let cancel = CancellationToken::new();
//!
//! let state = match resource.create(&spec, &cancel).await {
//!     Ok(state) => state,
//!     Err(failure) => {
//!         // Persist failure.state (if any) before reporting the error.
//!         return Err(failure.into());
//!     }
//! };
//! ```

pub mod client;
pub mod config;
pub mod drift;
pub mod error;
pub mod guard;
pub mod import;
pub mod lookup;
pub mod poller;
pub mod resource;
pub mod slots;
pub mod state;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use client::{AccessKeyClient, ClientError};
pub use config::ReconcilerConfig;
pub use error::{AccessKeyError, PartialFailure, ValidationError};
pub use lookup::{VersionUsage, find_access_key, list_versions_with_properties};
pub use resource::AccessKeyResource;
pub use state::{
    AccessKeySpec, AccessKeyState, CloudSecret, Credential, CredentialSlots, Slot,
    StoredCredential, Timeouts,
};
