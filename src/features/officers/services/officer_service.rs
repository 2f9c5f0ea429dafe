use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::auth::password::hash_password;
use crate::features::officers::dtos::{
    CreateOfficerDto, ListOfficersQuery, OfficerResponseDto, UpdateOfficerDto,
};
use crate::features::officers::models::Officer;
use crate::shared::types::PaginationQuery;

const DUPLICATE_OFFICER: &str = "An officer with this officer number or username already exists";

async fn hash_off_thread(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
}

/// Service for officers and their user accounts
pub struct OfficerService {
    pool: PgPool,
}

impl OfficerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ListOfficersQuery) {
        builder.push(" WHERE TRUE");
        if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            let pattern = format!("%{}%", name);
            builder
                .push(" AND (u.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.last_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    pub async fn list(&self, query: &ListOfficersQuery) -> Result<(Vec<OfficerResponseDto>, i64)> {
        let pagination = PaginationQuery {
            page: query.page,
            page_size: query.page_size,
        };

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM officers o JOIN users u ON u.id = o.user_id",
        );
        Self::push_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count officers: {:?}", e);
                AppError::Database(e)
            })?;

        let mut select = QueryBuilder::<Postgres>::new(Officer::SELECT);
        Self::push_filters(&mut select, query);
        select
            .push(" ORDER BY o.officer_number LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let officers = select
            .build_query_as::<Officer>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list officers: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((officers.into_iter().map(Into::into).collect(), total))
    }

    pub async fn find(&self, id: i64) -> Result<Officer> {
        let sql = format!("{} WHERE o.id = $1", Officer::SELECT);
        sqlx::query_as::<_, Officer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get officer: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Officer {} not found", id)))
    }

    pub async fn get(&self, id: i64) -> Result<OfficerResponseDto> {
        Ok(self.find(id).await?.into())
    }

    /// Create the user account and the officer in one transaction
    pub async fn create(&self, dto: CreateOfficerDto) -> Result<OfficerResponseDto> {
        let password_hash = hash_off_thread(dto.user.password).await?;

        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&dto.user.username)
        .bind(&password_hash)
        .bind(&dto.user.first_name)
        .bind(&dto.user.last_name)
        .bind(dto.user.email.as_deref().unwrap_or(""))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, DUPLICATE_OFFICER))?;

        let officer_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO officers (user_id, officer_number, supervisor_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(dto.officer_number)
        .bind(dto.supervisor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, DUPLICATE_OFFICER))?;

        tx.commit().await?;

        tracing::info!(
            "Officer {} created (id={}, user '{}')",
            dto.officer_number,
            officer_id,
            dto.user.username
        );
        self.get(officer_id).await
    }

    pub async fn update(&self, id: i64, dto: UpdateOfficerDto) -> Result<OfficerResponseDto> {
        if dto.supervisor == Some(id) {
            return Err(AppError::InvalidFields(vec![
                "supervisor: An officer cannot supervise themselves".to_string(),
            ]));
        }

        let password_hash = match dto.password {
            Some(password) => Some(hash_off_thread(password).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            r#"
            UPDATE officers
            SET officer_number = COALESCE($2, officer_number),
                supervisor_id = COALESCE($3, supervisor_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING user_id
            "#,
        )
        .bind(id)
        .bind(dto.officer_number)
        .bind(dto.supervisor)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, DUPLICATE_OFFICER))?
        .ok_or_else(|| AppError::NotFound(format!("Officer {} not found", id)))?;

        sqlx::query(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(dto.first_name)
        .bind(dto.last_name)
        .bind(dto.email)
        .bind(password_hash)
        .bind(dto.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update officer user: {:?}", e);
            AppError::Database(e)
        })?;

        tx.commit().await?;
        self.get(id).await
    }

    /// Delete the officer together with its user account.
    /// Officers still named on an incident cannot be deleted.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM users WHERE id = (SELECT user_id FROM officers WHERE id = $1)",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match map_db_error(e, DUPLICATE_OFFICER) {
            AppError::BadRequest(_) => AppError::Conflict(
                "Officer is referenced by one or more incidents".to_string(),
            ),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Officer {} not found", id)));
        }

        tracing::info!("Officer {} deleted", id);
        Ok(())
    }
}
