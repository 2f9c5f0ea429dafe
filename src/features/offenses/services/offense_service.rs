use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::offenses::dtos::{CreateOffenseDto, ListOffensesQuery, UpdateOffenseDto};
use crate::features::offenses::models::Offense;
use crate::shared::types::PaginationQuery;

/// Service for offense code operations
pub struct OffenseService {
    pool: PgPool,
}

impl OffenseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, q: Option<&str>) {
        builder.push(" WHERE TRUE");
        if let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q);
            builder.push(" AND (");
            let mut columns = builder.separated(" OR ");
            for column in [
                "gcic_code",
                "ucr_code",
                "ucr_alpha",
                "ucr_name_classification",
                "ucr_subclass_description",
            ] {
                columns
                    .push(format!("{} ILIKE ", column))
                    .push_bind_unseparated(pattern.clone());
            }
            builder.push(")");
        }
    }

    pub async fn list(&self, query: &ListOffensesQuery) -> Result<(Vec<Offense>, i64)> {
        let pagination = PaginationQuery {
            page: query.page,
            page_size: query.page_size,
        };

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM offenses");
        Self::push_filters(&mut count, query.q.as_deref());
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count offenses: {:?}", e);
                AppError::Database(e)
            })?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM offenses", Offense::COLUMNS));
        Self::push_filters(&mut select, query.q.as_deref());
        select
            .push(" ORDER BY ucr_rank NULLS LAST, gcic_code, id LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let offenses = select
            .build_query_as::<Offense>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list offenses: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((offenses, total))
    }

    pub async fn get(&self, id: i64) -> Result<Offense> {
        let sql = format!("SELECT {} FROM offenses WHERE id = $1", Offense::COLUMNS);
        sqlx::query_as::<_, Offense>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get offense: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Offense {} not found", id)))
    }

    pub async fn create(&self, dto: CreateOffenseDto) -> Result<Offense> {
        let sql = format!(
            r#"
            INSERT INTO offenses (gcic_code, ucr_code, ucr_rank, code_group, ucr_alpha,
                                  ucr_name_classification, ucr_subclass_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            Offense::COLUMNS
        );

        let offense = sqlx::query_as::<_, Offense>(&sql)
            .bind(dto.gcic_code)
            .bind(dto.ucr_code)
            .bind(dto.ucr_rank)
            .bind(dto.code_group)
            .bind(dto.ucr_alpha)
            .bind(dto.ucr_name_classification)
            .bind(dto.ucr_subclass_description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Offense already exists"))?;

        tracing::info!("Offense {} created (id={})", offense.gcic_code, offense.id);
        Ok(offense)
    }

    pub async fn update(&self, id: i64, dto: UpdateOffenseDto) -> Result<Offense> {
        let sql = format!(
            r#"
            UPDATE offenses
            SET gcic_code = COALESCE($2, gcic_code),
                ucr_code = COALESCE($3, ucr_code),
                ucr_rank = COALESCE($4, ucr_rank),
                code_group = COALESCE($5, code_group),
                ucr_alpha = COALESCE($6, ucr_alpha),
                ucr_name_classification = COALESCE($7, ucr_name_classification),
                ucr_subclass_description = COALESCE($8, ucr_subclass_description)
            WHERE id = $1
            RETURNING {}
            "#,
            Offense::COLUMNS
        );

        sqlx::query_as::<_, Offense>(&sql)
            .bind(id)
            .bind(dto.gcic_code)
            .bind(dto.ucr_code)
            .bind(dto.ucr_rank)
            .bind(dto.code_group)
            .bind(dto.ucr_alpha)
            .bind(dto.ucr_name_classification)
            .bind(dto.ucr_subclass_description)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Offense already exists"))?
            .ok_or_else(|| AppError::NotFound(format!("Offense {} not found", id)))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM offenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete offense: {:?}", e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Offense {} not found", id)));
        }
        Ok(())
    }
}
