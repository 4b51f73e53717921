// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Credential slot reconciliation
//!
//! Planning is pure: [`plan`] compares observed and desired slots and returns
//! the version deletions and creations needed to converge, without touching
//! the remote system. Credentials are matched by cloud access key id, never by
//! slot position, so a credential that only changes its primary flag (or is
//! re-declared without its secret after an import) is carried over as-is.

use cloudaccess_types::VersionNumber;

use crate::error::ValidationError;
use crate::state::{Credential, CredentialSlots, Slot, StoredCredential};

/// A version to delete, identified by the slot it occupied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub slot: Slot,
    pub version: VersionNumber,
    pub cloud_access_key_id: String,
}

/// A credential to create in the given slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creation {
    pub slot: Slot,
    pub credential: Credential,
}

/// Ordered operations converging observed slots to desired slots.
///
/// Execution order is: commit `kept`, delete everything in `deletions` (after
/// the property guard cleared all of them), then create `creations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPlan {
    /// Observed versions that survive, placed in their desired slots with
    /// the desired primary flag applied
    pub kept: CredentialSlots<StoredCredential>,
    pub deletions: Vec<Deletion>,
    pub creations: Vec<Creation>,
}

impl SlotPlan {
    /// Whether the plan needs any remote call
    pub fn is_structural(&self) -> bool {
        !self.deletions.is_empty() || !self.creations.is_empty()
    }

    pub fn deleted_versions(&self) -> Vec<VersionNumber> {
        self.deletions.iter().map(|d| d.version).collect()
    }
}

/// Reject desired slots that are inconsistent on their own.
pub fn validate_desired(desired: &CredentialSlots<Credential>) -> Result<(), ValidationError> {
    if let (Some(a), Some(b)) = (&desired.a, &desired.b) {
        if a.primary && b.primary {
            return Err(ValidationError::DualPrimary);
        }
        if a.cloud_access_key_id == b.cloud_access_key_id {
            return Err(ValidationError::DuplicateAccessKeyId(
                a.cloud_access_key_id.clone(),
            ));
        }
    }
    Ok(())
}

/// Compute the plan that takes `observed` to `desired`.
pub fn plan(
    observed: &CredentialSlots<StoredCredential>,
    desired: &CredentialSlots<Credential>,
) -> Result<SlotPlan, ValidationError> {
    validate_desired(desired)?;
    reject_swap(observed, desired)?;

    let mut kept = CredentialSlots::default();
    let mut creations = Vec::new();

    for (slot, wanted) in desired.iter() {
        match find_by_id(observed, &wanted.cloud_access_key_id) {
            Some((_, current)) => {
                if let (Some(old), Some(new)) = (
                    &current.cloud_secret_access_key,
                    &wanted.cloud_secret_access_key,
                ) && old != new
                {
                    return Err(ValidationError::SecretReplaced { slot });
                }

                let carried = StoredCredential {
                    cloud_access_key_id: current.cloud_access_key_id.clone(),
                    cloud_secret_access_key: wanted
                        .cloud_secret_access_key
                        .clone()
                        .or_else(|| current.cloud_secret_access_key.clone()),
                    primary: wanted.primary,
                    version: current.version,
                    version_guid: current.version_guid.clone(),
                };
                kept.set(slot, Some(carried));
            }
            None => {
                if wanted.cloud_secret_access_key.is_none() {
                    return Err(ValidationError::MissingSecret { slot });
                }
                creations.push(Creation {
                    slot,
                    credential: wanted.clone(),
                });
            }
        }
    }

    let deletions = observed
        .iter()
        .filter(|(_, current)| find_by_id(desired, &current.cloud_access_key_id).is_none())
        .map(|(slot, current)| Deletion {
            slot,
            version: current.version,
            cloud_access_key_id: current.cloud_access_key_id.clone(),
        })
        .collect();

    Ok(SlotPlan {
        kept,
        deletions,
        creations,
    })
}

fn reject_swap(
    observed: &CredentialSlots<StoredCredential>,
    desired: &CredentialSlots<Credential>,
) -> Result<(), ValidationError> {
    if let (Some(old_a), Some(old_b), Some(new_a), Some(new_b)) =
        (&observed.a, &observed.b, &desired.a, &desired.b)
        && old_a.cloud_access_key_id != old_b.cloud_access_key_id
        && new_a.cloud_access_key_id == old_b.cloud_access_key_id
        && new_b.cloud_access_key_id == old_a.cloud_access_key_id
    {
        return Err(ValidationError::SwappedSlots);
    }
    Ok(())
}

trait HasAccessKeyId {
    fn cloud_access_key_id(&self) -> &str;
}

impl HasAccessKeyId for Credential {
    fn cloud_access_key_id(&self) -> &str {
        &self.cloud_access_key_id
    }
}

impl HasAccessKeyId for StoredCredential {
    fn cloud_access_key_id(&self) -> &str {
        &self.cloud_access_key_id
    }
}

fn find_by_id<'a, T: HasAccessKeyId>(
    slots: &'a CredentialSlots<T>,
    cloud_access_key_id: &str,
) -> Option<(Slot, &'a T)> {
    slots
        .iter()
        .find(|(_, credential)| credential.cloud_access_key_id() == cloud_access_key_id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use test_case::test_case;

    use super::*;
    use crate::state::CloudSecret;

    fn stored(id: &str, secret: &str, version: VersionNumber, primary: bool) -> StoredCredential {
        StoredCredential {
            cloud_access_key_id: id.to_string(),
            cloud_secret_access_key: CloudSecret::non_empty(secret),
            primary,
            version,
            version_guid: format!("guid-{}", version),
        }
    }

    fn wanted(id: &str, secret: &str, primary: bool) -> Credential {
        Credential::new(id, secret, primary)
    }

    #[test]
    fn adding_slot_b_creates_one_version() {
        let observed = CredentialSlots::new(Some(stored("k1", "s1", 1, true)), None);
        let desired = CredentialSlots::new(
            Some(wanted("k1", "s1", true)),
            Some(wanted("k2", "s2", false)),
        );

        let plan = plan(&observed, &desired).unwrap();

        assert!(plan.deletions.is_empty());
        assert_eq!(plan.creations.len(), 1);
        assert_eq!(plan.creations[0].slot, Slot::B);
        assert_eq!(plan.creations[0].credential.cloud_access_key_id, "k2");
        assert_eq!(plan.kept.a, Some(stored("k1", "s1", 1, true)));
        assert_eq!(plan.kept.b, None);
    }

    #[test]
    fn rotation_deletes_then_creates_in_the_same_slot() {
        let observed = CredentialSlots::new(
            Some(stored("k1", "s1", 1, false)),
            Some(stored("k2", "s2", 2, true)),
        );
        let desired = CredentialSlots::new(
            Some(wanted("k3", "s3", false)),
            Some(wanted("k2", "s2", true)),
        );

        let plan = plan(&observed, &desired).unwrap();

        assert_eq!(
            plan.deletions,
            vec![Deletion {
                slot: Slot::A,
                version: 1,
                cloud_access_key_id: "k1".to_string(),
            }]
        );
        assert_eq!(plan.creations.len(), 1);
        assert_eq!(plan.creations[0].slot, Slot::A);
        assert_eq!(plan.kept.b.as_ref().map(|c| c.version), Some(2));
    }

    #[test]
    fn primary_flip_is_local_only() {
        let observed = CredentialSlots::new(
            Some(stored("k1", "s1", 1, true)),
            Some(stored("k2", "s2", 2, false)),
        );
        let desired = CredentialSlots::new(
            Some(wanted("k1", "s1", false)),
            Some(wanted("k2", "s2", true)),
        );

        let plan = plan(&observed, &desired).unwrap();

        assert!(!plan.is_structural());
        assert!(!plan.kept.a.as_ref().unwrap().primary);
        assert!(plan.kept.b.as_ref().unwrap().primary);
    }

    #[test]
    fn empty_desired_secret_keeps_observed_secret() {
        let observed = CredentialSlots::new(Some(stored("k1", "s1", 1, true)), None);
        let desired = CredentialSlots::new(Some(wanted("k1", "", true)), None);

        let plan = plan(&observed, &desired).unwrap();

        assert!(!plan.is_structural());
        assert_eq!(plan.kept.a, Some(stored("k1", "s1", 1, true)));
    }

    #[test]
    fn secret_can_be_supplied_after_import() {
        let observed = CredentialSlots::new(Some(stored("k1", "", 1, false)), None);
        let desired = CredentialSlots::new(Some(wanted("k1", "s1", true)), None);

        let plan = plan(&observed, &desired).unwrap();

        assert!(!plan.is_structural());
        assert_eq!(plan.kept.a, Some(stored("k1", "s1", 1, true)));
    }

    #[test]
    fn relocated_credential_keeps_its_version() {
        let observed = CredentialSlots::new(
            Some(stored("k1", "s1", 1, false)),
            Some(stored("k2", "s2", 2, true)),
        );
        let desired = CredentialSlots::new(Some(wanted("k2", "", true)), None);

        let plan = plan(&observed, &desired).unwrap();

        assert!(plan.creations.is_empty());
        assert_eq!(plan.deleted_versions(), vec![1]);
        assert_eq!(plan.kept.a, Some(stored("k2", "s2", 2, true)));
    }

    #[test]
    fn rotating_both_slots_replaces_both_versions() {
        let observed = CredentialSlots::new(
            Some(stored("k1", "s1", 1, false)),
            Some(stored("k2", "s2", 2, true)),
        );
        let desired = CredentialSlots::new(
            Some(wanted("k3", "s3", true)),
            Some(wanted("k4", "s4", false)),
        );

        let plan = plan(&observed, &desired).unwrap();

        assert_eq!(plan.deleted_versions(), vec![1, 2]);
        assert!(plan.kept.is_empty());
        let created: Vec<_> = plan
            .creations
            .iter()
            .map(|c| (c.slot, c.credential.cloud_access_key_id.as_str()))
            .collect();
        assert_eq!(created, vec![(Slot::A, "k3"), (Slot::B, "k4")]);
    }

    #[test_case(
        Some(("k1", "s1", true)), Some(("k2", "s2", true))
        => ValidationError::DualPrimary ; "both slots primary"
    )]
    #[test_case(
        Some(("k2", "s2", true)), Some(("k1", "s1", false))
        => ValidationError::SwappedSlots ; "slots swapped"
    )]
    #[test_case(
        Some(("k1", "other", true)), Some(("k2", "s2", false))
        => ValidationError::SecretReplaced { slot: Slot::A } ; "secret replaced under same id"
    )]
    #[test_case(
        Some(("k1", "s1", true)), Some(("k3", "", false))
        => ValidationError::MissingSecret { slot: Slot::B } ; "new credential without secret"
    )]
    #[test_case(
        Some(("k9", "s9", true)), Some(("k9", "s8", false))
        => ValidationError::DuplicateAccessKeyId("k9".to_string()) ; "same id in both slots"
    )]
    fn rejected_plans(
        a: Option<(&str, &str, bool)>,
        b: Option<(&str, &str, bool)>,
    ) -> ValidationError {
        let observed = CredentialSlots::new(
            Some(stored("k1", "s1", 1, true)),
            Some(stored("k2", "s2", 2, false)),
        );
        let desired = CredentialSlots::new(
            a.map(|(id, secret, primary)| wanted(id, secret, primary)),
            b.map(|(id, secret, primary)| wanted(id, secret, primary)),
        );

        plan(&observed, &desired).unwrap_err()
    }

    #[test]
    fn partial_relocation_is_not_a_swap() {
        let observed = CredentialSlots::new(
            Some(stored("k1", "s1", 1, true)),
            Some(stored("k2", "s2", 2, false)),
        );
        let desired = CredentialSlots::new(
            Some(wanted("k2", "", false)),
            Some(wanted("k3", "s3", true)),
        );

        let plan = plan(&observed, &desired).unwrap();

        assert_eq!(plan.deleted_versions(), vec![1]);
        assert_eq!(plan.creations[0].slot, Slot::B);
        assert_eq!(plan.kept.a.as_ref().map(|c| c.version), Some(2));
    }
}
