//! Planning for the account → profile reconciliation job.
//!
//! Every sign-up creates an auth account; the shop keeps a separate profile
//! row per account. When the two drift apart (failed trigger, manual import)
//! the sync job inserts a profile for each account that lacks one. Existing
//! profiles are never touched, so the job can be re-run at any time.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;


/// An authentication account as exposed by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthAccount {
    pub id: Uuid,
    pub email: Option<String>,
    /// Free-form sign-up metadata (`full_name`, `phone`, ...).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// An existing profile row. Only the id matters for reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
}

/// A profile row to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: String,
}

impl NewProfile {
    /// Build a profile with default field values for `account`.
    ///
    /// - `full_name`: metadata `full_name`, else the text before the first
    ///   `@` of the email, else empty
    /// - `phone`: metadata `phone`, else empty
    /// - `email`: the trimmed account email, else empty
    #[must_use]
    pub fn for_account(account: &AuthAccount) -> Self {
        let email = account
            .email
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned();
        let full_name = metadata_str(&account.metadata, "full_name")
            .or_else(|| local_part(&email))
            .map(str::to_owned)
            .unwrap_or_default();
        let phone = metadata_str(&account.metadata, "phone")
            .map(str::to_owned)
            .unwrap_or_default();

        Self {
            id: account.id,
            full_name,
            phone,
            email,
        }
    }
}

/// Profiles to insert so every account has one.
///
/// Accounts whose id already has a profile are skipped. Duplicate account
/// ids produce a single profile (the first occurrence wins).
#[must_use]
pub fn plan_missing_profiles(
    accounts: &[AuthAccount],
    profiles: &[ProfileRecord],
) -> Vec<NewProfile> {
    let mut seen: HashSet<Uuid> = profiles.iter().map(|p| p.id).collect();
    accounts
        .iter()
        .filter(|account| seen.insert(account.id))
        .map(NewProfile::for_account)
        .collect()
}

fn local_part(email: &str) -> Option<&str> {
    email
        .split_once('@')
        .map(|(local, _)| local)
        .filter(|local| !local.is_empty())
}

fn metadata_str<'a>(metadata: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn account(n: u128, email: Option<&str>, metadata: serde_json::Value) -> AuthAccount {
        AuthAccount {
            id: Uuid::from_u128(n),
            email: email.map(str::to_owned),
            metadata,
        }
    }

    #[test]
    fn test_name_prefers_metadata_then_email_local_part() {
        let with_meta = account(1, Some("ava@gems.io"), json!({"full_name": "Ava Stone"}));
        assert_eq!(NewProfile::for_account(&with_meta).full_name, "Ava Stone");

        let blank_meta = account(2, Some("ben@gems.io"), json!({"full_name": ""}));
        assert_eq!(NewProfile::for_account(&blank_meta).full_name, "ben");

        let malformed = account(4, Some("not-an-email"), json!({}));
        assert_eq!(NewProfile::for_account(&malformed).full_name, "");
        assert_eq!(NewProfile::for_account(&malformed).email, "not-an-email");

        let two_ats = account(5, Some("a@b@c.com"), json!({}));
        assert_eq!(NewProfile::for_account(&two_ats).full_name, "a");

        let no_local = account(6, Some("@gems.io"), json!({}));
        assert_eq!(NewProfile::for_account(&no_local).full_name, "");

        let nothing = account(3, None, json!({}));
        let profile = NewProfile::for_account(&nothing);
        assert_eq!(profile.full_name, "");
        assert_eq!(profile.email, "");
    }

    #[test]
    fn test_email_is_trimmed_like_the_name() {
        let padded = account(1, Some("  pad@x.com "), json!({}));
        let profile = NewProfile::for_account(&padded);
        assert_eq!(profile.email, "pad@x.com");
        assert_eq!(profile.full_name, "pad");
    }

    #[test]
    fn test_phone_from_metadata_or_empty() {
        let with_phone = account(1, Some("a@b.c"), json!({"phone": "+1 555 0100"}));
        assert_eq!(NewProfile::for_account(&with_phone).phone, "+1 555 0100");

        let numeric_phone = account(2, Some("a@b.c"), json!({"phone": 5550100}));
        assert_eq!(NewProfile::for_account(&numeric_phone).phone, "");

        let null_metadata = account(3, Some("a@b.c"), serde_json::Value::Null);
        assert_eq!(NewProfile::for_account(&null_metadata).phone, "");
    }

    #[test]
    fn test_plan_skips_existing_profiles() {
        let accounts: Vec<_> = (1..=5)
            .map(|n| account(n, Some(&format!("user{n}@gems.io")), json!({})))
            .collect();
        let profiles: Vec<_> = [1, 3, 5]
            .into_iter()
            .map(|n| ProfileRecord {
                id: Uuid::from_u128(n),
            })
            .collect();

        let plan = plan_missing_profiles(&accounts, &profiles);
        let ids: Vec<_> = plan.iter().map(|p| p.id).collect();
        assert_eq!(ids, [Uuid::from_u128(2), Uuid::from_u128(4)]);
        assert_eq!(plan[0].full_name, "user2");
        assert_eq!(plan[1].email, "user4@gems.io");
    }

    #[test]
    fn test_plan_collapses_duplicate_accounts() {
        let accounts = vec![
            account(9, Some("first@gems.io"), json!({})),
            account(9, Some("second@gems.io"), json!({})),
        ];
        let plan = plan_missing_profiles(&accounts, &[]);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].email, "first@gems.io");
    }

    #[test]
    fn test_plan_is_empty_when_in_sync() {
        let accounts = vec![account(1, None, json!({}))];
        let profiles = vec![ProfileRecord {
            id: Uuid::from_u128(1),
        }];
        assert!(plan_missing_profiles(&accounts, &profiles).is_empty());
    }
}
