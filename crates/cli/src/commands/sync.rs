//! Profile sync command.
//!
//! Prints the sync report as JSON on stdout.

use lustre_storefront::db::ProfileRepository;
use lustre_storefront::services::sync_profiles;

use super::{CommandError, connect};

/// Insert a profile for every account that lacks one.
pub async fn profiles(dry_run: bool) -> Result<(), CommandError> {
    let repository = ProfileRepository::new(connect().await?);
    let report = sync_profiles(&repository, dry_run).await?;

    if dry_run {
        tracing::info!(missing = report.missing, "Dry run, nothing written");
    } else {
        tracing::info!(inserted = report.inserted, "Profile sync complete!");
    }

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
