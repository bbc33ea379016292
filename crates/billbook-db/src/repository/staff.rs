//! # Staff Repository
//!
//! Staff members who can sign in. Login resolves a verified phone to a
//! member here and reads the role that goes into the session token.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use billbook_core::{Role, StaffMember};

#[derive(Debug, FromRow)]
struct StaffRow {
    id: String,
    name: String,
    phone: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<StaffRow> for StaffMember {
    type Error = DbError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).map_err(|e| DbError::Serialization(e.to_string()))?;
        Ok(StaffMember {
            id: row.id,
            name: row.name,
            phone: row.phone,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Gets a staff member by ID.
    pub async fn get(&self, id: &str) -> DbResult<StaffMember> {
        let row: Option<StaffRow> = sqlx::query_as(
            "SELECT id, name, phone, role, is_active, created_at FROM staff WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DbError::not_found("Staff member", id))?
            .try_into()
    }

    /// Finds an active staff member by normalized phone.
    pub async fn find_active_by_phone(&self, phone: &str) -> DbResult<Option<StaffMember>> {
        let row: Option<StaffRow> = sqlx::query_as(
            "SELECT id, name, phone, role, is_active, created_at
             FROM staff WHERE phone = ?1 AND is_active = 1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StaffMember::try_from).transpose()
    }

    /// Inserts a new staff member.
    pub async fn insert(&self, member: &StaffMember) -> DbResult<()> {
        debug!(id = %member.id, role = %member.role, "Inserting staff member");

        sqlx::query(
            "INSERT INTO staff (id, name, phone, role, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.phone)
        .bind(member.role.as_str())
        .bind(member.is_active)
        .bind(member.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &member.phone),
            other => other,
        })?;

        Ok(())
    }

    /// Counts active staff members.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
