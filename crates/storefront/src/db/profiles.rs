//! Account and profile repository.
//!
//! Queries are built at runtime (`sqlx::query_as`) because `auth.users` is
//! owned by Supabase and is not part of this project's migrations.

use lustre_core::profile_sync::{AuthAccount, NewProfile, ProfileRecord};
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;
use crate::services::profile_sync::ProfileDirectory;

/// Repository over `auth.users` and `public.profiles`.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All authentication accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn accounts(&self) -> Result<Vec<AuthAccount>, RepositoryError> {
        let rows: Vec<(Uuid, Option<String>, Option<serde_json::Value>)> = sqlx::query_as(
            r"
            SELECT id, email, raw_user_meta_data
            FROM auth.users
            ORDER BY created_at, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, email, metadata)| AuthAccount {
                id,
                email,
                metadata: metadata.unwrap_or(serde_json::Value::Null),
            })
            .collect())
    }

    /// Ids of all existing profiles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn profiles(&self) -> Result<Vec<ProfileRecord>, RepositoryError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM public.profiles")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|id| ProfileRecord { id }).collect())
    }

    /// Insert profiles, skipping any id that already exists.
    ///
    /// Returns the number of rows actually inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, profiles: &[NewProfile]) -> Result<u64, RepositoryError> {
        if profiles.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
        let names: Vec<String> = profiles.iter().map(|p| p.full_name.clone()).collect();
        let phones: Vec<String> = profiles.iter().map(|p| p.phone.clone()).collect();
        let emails: Vec<String> = profiles.iter().map(|p| p.email.clone()).collect();

        let result = sqlx::query(
            r"
            INSERT INTO public.profiles (id, full_name, phone, email)
            SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::text[])
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(&ids)
        .bind(&names)
        .bind(&phones)
        .bind(&emails)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

impl ProfileDirectory for ProfileRepository {
    async fn list_accounts(&self) -> Result<Vec<AuthAccount>, RepositoryError> {
        self.accounts().await
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, RepositoryError> {
        self.profiles().await
    }

    async fn insert_profiles(&self, profiles: &[NewProfile]) -> Result<u64, RepositoryError> {
        self.insert(profiles).await
    }
}
