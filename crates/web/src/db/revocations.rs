//! Distributor revocation repository.
//!
//! A revocation starts out `pending`. Approving it revokes the distributor
//! in the same transaction; rejecting it only closes the request.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{DistributorId, LazyField, RevocationId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::DistributorRevocation;

#[derive(sqlx::FromRow)]
struct RevocationRow {
    id: i32,
    distributor_id: i32,
    contract: String,
    pending: bool,
    is_revoked: bool,
    created_at: DateTime<Utc>,
}

impl From<RevocationRow> for DistributorRevocation {
    fn from(row: RevocationRow) -> Self {
        Self {
            id: RevocationId::new(row.id),
            distributor_id: DistributorId::new(row.distributor_id),
            contract: row.contract,
            pending: row.pending,
            is_revoked: row.is_revoked,
            created_at: row.created_at,
            distributor: LazyField::new(),
        }
    }
}

/// Repository for revocation database operations.
pub struct RevocationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RevocationRepository<'a> {
    /// Create a new revocation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a revocation by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: RevocationId) -> Result<Option<DistributorRevocation>, RepositoryError> {
        let row = sqlx::query_as::<_, RevocationRow>(
            r"
            SELECT id, distributor_id, contract, pending, is_revoked, created_at
            FROM marketplace.distributor_revocations
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(DistributorRevocation::from))
    }

    /// The most recent revocation filed for a distributor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_distributor(
        &self,
        distributor_id: DistributorId,
    ) -> Result<Option<DistributorRevocation>, RepositoryError> {
        let row = sqlx::query_as::<_, RevocationRow>(
            r"
            SELECT id, distributor_id, contract, pending, is_revoked, created_at
            FROM marketplace.distributor_revocations
            WHERE distributor_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(distributor_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(DistributorRevocation::from))
    }

    /// File a revocation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if one is already pending or the
    /// distributor is already revoked. Concurrent filings are caught by
    /// `distributor_revocations_open_idx`.
    pub async fn create(
        &self,
        distributor_id: DistributorId,
        contract: &str,
    ) -> Result<DistributorRevocation, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let blocked: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM marketplace.distributor_revocations
                WHERE distributor_id = $1 AND (pending OR is_revoked)
            )
            ",
        )
        .bind(distributor_id)
        .fetch_one(&mut *tx)
        .await?;

        if blocked {
            return Err(RepositoryError::Conflict(
                "a revocation is already pending or approved".to_owned(),
            ));
        }

        let row = sqlx::query_as::<_, RevocationRow>(
            r"
            INSERT INTO marketplace.distributor_revocations (distributor_id, contract)
            VALUES ($1, $2)
            RETURNING id, distributor_id, contract, pending, is_revoked, created_at
            ",
        )
        .bind(distributor_id)
        .bind(contract)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "open revocation"))?;

        tx.commit().await?;

        Ok(DistributorRevocation::from(row))
    }

    /// Revocations waiting for review, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<DistributorRevocation>, RepositoryError> {
        let rows = sqlx::query_as::<_, RevocationRow>(
            r"
            SELECT id, distributor_id, contract, pending, is_revoked, created_at
            FROM marketplace.distributor_revocations
            WHERE pending
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(DistributorRevocation::from).collect())
    }

    /// Approve a pending revocation and revoke the distributor.
    ///
    /// Returns the revoked distributor's ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no pending revocation has this ID.
    pub async fn approve(&self, id: RevocationId) -> Result<DistributorId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let distributor_id: i32 = sqlx::query_scalar(
            r"
            UPDATE marketplace.distributor_revocations
            SET pending = FALSE, is_revoked = TRUE
            WHERE id = $1 AND pending
            RETURNING distributor_id
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query("UPDATE marketplace.distributors SET is_revoked = TRUE WHERE id = $1")
            .bind(distributor_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DistributorId::new(distributor_id))
    }

    /// Turn a pending revocation down.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no pending revocation has this ID.
    pub async fn reject(&self, id: RevocationId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE marketplace.distributor_revocations
            SET pending = FALSE, is_revoked = FALSE
            WHERE id = $1 AND pending
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
