//! Profile reconciliation job.
//!
//! Reads every account and every profile, inserts profiles for accounts that
//! lack one, and reports how many were created. Safe to re-run: existing
//! profiles are skipped, never updated.

use std::future::Future;

use lustre_core::profile_sync::{AuthAccount, NewProfile, ProfileRecord, plan_missing_profiles};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::db::RepositoryError;

/// Source of account and profile records.
pub trait ProfileDirectory {
    fn list_accounts(
        &self,
    ) -> impl Future<Output = Result<Vec<AuthAccount>, RepositoryError>> + Send;

    fn list_profiles(
        &self,
    ) -> impl Future<Output = Result<Vec<ProfileRecord>, RepositoryError>> + Send;

    /// Insert profiles and return how many rows were written.
    fn insert_profiles(
        &self,
        profiles: &[NewProfile],
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Errors from the sync job.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read accounts: {0}")]
    ListAccounts(#[source] RepositoryError),

    #[error("failed to read profiles: {0}")]
    ListProfiles(#[source] RepositoryError),

    #[error("failed to insert profiles: {0}")]
    Insert(#[source] RepositoryError),
}

/// Outcome of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub accounts: usize,
    pub existing_profiles: usize,
    /// Profiles missing before the run.
    pub missing: usize,
    /// Profiles written (always 0 for a dry run).
    pub inserted: u64,
    pub dry_run: bool,
}

/// Insert a profile for every account that has none.
///
/// # Errors
///
/// Returns `SyncError` naming the step that failed.
#[instrument(skip(directory))]
pub async fn sync_profiles<D>(directory: &D, dry_run: bool) -> Result<SyncReport, SyncError>
where
    D: ProfileDirectory + Sync,
{
    let accounts = directory
        .list_accounts()
        .await
        .map_err(SyncError::ListAccounts)?;
    let profiles = directory
        .list_profiles()
        .await
        .map_err(SyncError::ListProfiles)?;

    let missing = plan_missing_profiles(&accounts, &profiles);
    tracing::info!(
        accounts = accounts.len(),
        profiles = profiles.len(),
        missing = missing.len(),
        "Planned profile sync"
    );

    let inserted = if dry_run || missing.is_empty() {
        0
    } else {
        directory
            .insert_profiles(&missing)
            .await
            .map_err(SyncError::Insert)?
    };

    if inserted > 0 {
        tracing::info!(inserted, "Inserted missing profiles");
    }

    Ok(SyncReport {
        accounts: accounts.len(),
        existing_profiles: profiles.len(),
        missing: missing.len(),
        inserted,
        dry_run,
    })
}
