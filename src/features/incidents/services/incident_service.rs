use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::incident_files::services as incident_files;
use crate::features::incidents::dtos::{
    CreateIncidentDto, IncidentDetailDto, IncidentSummaryDto, IncidentValues, UpdateIncidentDto,
};
use crate::features::incidents::models::{Incident, IncidentListRow, OfficerSummary};
use crate::features::incidents::search::{parse_search, IncidentSearch};
use crate::features::incidents::services::address_service;
use crate::features::offenses::models::Offense;
use crate::features::parties::models::PartyType;
use crate::features::parties::services as parties;
use crate::modules::storage::FileStorage;
use crate::shared::types::PaginationQuery;

const DUPLICATE_INCIDENT: &str = "An incident with this incident number already exists";

const OFFICER_FIELDS: [&str; 5] = [
    "reporting_officer",
    "reviewed_by_officer",
    "investigating_officer",
    "officer_making_report",
    "supervisor",
];

/// Service for incidents and everything written together with them
pub struct IncidentService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl IncidentService {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    // =========================================================================
    // Reading
    // =========================================================================

    async fn page(
        &self,
        search: &IncidentSearch,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<IncidentSummaryDto>, i64)> {
        let mut count =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) {}", IncidentListRow::FROM));
        search.push_where(&mut count);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count incidents: {:?}", e);
                AppError::Database(e)
            })?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "{} {}",
            IncidentListRow::SELECT,
            IncidentListRow::FROM
        ));
        search.push_where(&mut select);
        select
            .push(" ORDER BY i.report_datetime DESC, i.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = select
            .build_query_as::<IncidentListRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list incidents: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Newest reports first
    pub async fn list(&self, pagination: &PaginationQuery) -> Result<(Vec<IncidentSummaryDto>, i64)> {
        self.page(&IncidentSearch::default(), pagination).await
    }

    /// Filter incidents by raw query parameters; `page` and `page_size` paginate
    pub async fn search(&self, params: &[(String, String)]) -> Result<(Vec<IncidentSummaryDto>, i64)> {
        let search = parse_search(params)?;
        let pagination = PaginationQuery::from_pairs(params);
        tracing::debug!(
            "Incident search: {} incident filters, {} party groups",
            search.incident.len(),
            search.parties.len()
        );
        self.page(&search, &pagination).await
    }

    async fn find(&self, id: i64) -> Result<Incident> {
        let sql = format!("SELECT {} FROM incidents i WHERE i.id = $1", Incident::COLUMNS);
        sqlx::query_as::<_, Incident>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get incident: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))
    }

    async fn officers(&self, ids: &[i64]) -> Result<HashMap<i64, OfficerSummary>> {
        let officers = sqlx::query_as::<_, OfficerSummary>(
            r#"
            SELECT o.id, o.officer_number, u.first_name, u.last_name
            FROM officers o
            JOIN users u ON u.id = o.user_id
            WHERE o.id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load incident officers: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(officers.into_iter().map(|o| (o.id, o)).collect())
    }

    async fn offenses(&self, incident_id: i64) -> Result<Vec<Offense>> {
        let sql = format!(
            "SELECT {} FROM offenses \
             WHERE id IN (SELECT offense_id FROM incident_offenses WHERE incident_id = $1) \
             ORDER BY id",
            Offense::COLUMNS
        );
        sqlx::query_as::<_, Offense>(&sql)
            .bind(incident_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load incident offenses: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Incident with officers, location, offenses, parties and files expanded
    pub async fn get_detail(&self, id: i64) -> Result<IncidentDetailDto> {
        let incident = self.find(id).await?;

        let officer_ids = [
            incident.reporting_officer_id,
            incident.reviewed_by_officer_id,
            incident.investigating_officer_id,
            incident.officer_making_report_id,
            incident.supervisor_id,
        ];
        let officers = self.officers(&officer_ids).await?;
        let officer = |officer_id: i64| {
            officers.get(&officer_id).cloned().ok_or_else(|| {
                AppError::Internal(format!(
                    "Officer {} of incident {} is missing",
                    officer_id, id
                ))
            })
        };

        let location = match incident.location_id {
            Some(location_id) => address_service::fetch_one(&self.pool, location_id).await?,
            None => None,
        };
        let offenses = self.offenses(id).await?;
        let (victims, suspects) = parties::load_for_incident(&self.pool, id).await?;
        let files = incident_files::load_for_incident(&self.pool, id).await?;

        Ok(IncidentDetailDto {
            id: incident.id,
            incident_number: incident.incident_number,
            report_datetime: incident.report_datetime,
            reporting_officer: officer(incident.reporting_officer_id)?,
            reviewed_by_officer: officer(incident.reviewed_by_officer_id)?,
            reviewed_datetime: incident.reviewed_datetime,
            investigating_officer: officer(incident.investigating_officer_id)?,
            officer_making_report: officer(incident.officer_making_report_id)?,
            supervisor: officer(incident.supervisor_id)?,
            approved_datetime: incident.approved_datetime,
            earliest_occurrence_datetime: incident.earliest_occurrence_datetime,
            latest_occurrence_datetime: incident.latest_occurrence_datetime,
            location,
            beat: incident.beat,
            shift: incident.shift,
            damaged_amount: incident.damaged_amount,
            stolen_amount: incident.stolen_amount,
            narrative: incident.narrative,
            offenses,
            victims,
            suspects,
            files,
            created_at: incident.created_at,
            updated_at: incident.updated_at,
        })
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Every referenced officer and offense must exist
    async fn check_references(conn: &mut PgConnection, values: &IncidentValues) -> Result<()> {
        let officer_ids = values.officer_ids();
        let found: HashSet<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM officers WHERE id = ANY($1)")
            .bind(&officer_ids[..])
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to check officers: {:?}", e);
                AppError::Database(e)
            })?
            .into_iter()
            .collect();

        let mut errors: Vec<String> = OFFICER_FIELDS
            .iter()
            .zip(officer_ids)
            .filter(|(_, id)| !found.contains(id))
            .map(|(field, id)| format!("{}: Officer {} does not exist.", field, id))
            .collect();

        if !values.offense_ids.is_empty() {
            let found: HashSet<i64> =
                sqlx::query_scalar::<_, i64>("SELECT id FROM offenses WHERE id = ANY($1)")
                    .bind(&values.offense_ids)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to check offenses: {:?}", e);
                        AppError::Database(e)
                    })?
                    .into_iter()
                    .collect();
            errors.extend(
                values
                    .offense_ids
                    .iter()
                    .filter(|id| !found.contains(*id))
                    .map(|id| format!("offenses: Offense {} does not exist.", id)),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(errors))
        }
    }

    async fn replace_offenses(conn: &mut PgConnection, incident_id: i64, offense_ids: &[i64]) -> Result<()> {
        sqlx::query("DELETE FROM incident_offenses WHERE incident_id = $1")
            .bind(incident_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear incident offenses: {:?}", e);
                AppError::Database(e)
            })?;

        if !offense_ids.is_empty() {
            sqlx::query(
                "INSERT INTO incident_offenses (incident_id, offense_id) \
                 SELECT $1, UNNEST($2::BIGINT[])",
            )
            .bind(incident_id)
            .bind(offense_ids)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_db_error(e, DUPLICATE_INCIDENT))?;
        }
        Ok(())
    }

    /// Insert a new incident row, or overwrite `existing` with `values`
    async fn write(conn: &mut PgConnection, values: &IncidentValues, existing: Option<i64>) -> Result<i64> {
        Self::check_references(conn, values).await?;
        let location_id =
            address_service::resolve(conn, "location", values.location.as_ref()).await?;

        let sql = match existing {
            None => {
                r#"
                INSERT INTO incidents (
                    incident_number, report_datetime, reporting_officer_id,
                    reviewed_by_officer_id, reviewed_datetime, investigating_officer_id,
                    officer_making_report_id, supervisor_id, approved_datetime,
                    earliest_occurrence_datetime, latest_occurrence_datetime, location_id,
                    beat, shift, damaged_amount, stolen_amount, narrative
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                RETURNING id
                "#
            }
            Some(_) => {
                r#"
                UPDATE incidents
                SET incident_number = $1, report_datetime = $2, reporting_officer_id = $3,
                    reviewed_by_officer_id = $4, reviewed_datetime = $5,
                    investigating_officer_id = $6, officer_making_report_id = $7,
                    supervisor_id = $8, approved_datetime = $9,
                    earliest_occurrence_datetime = $10, latest_occurrence_datetime = $11,
                    location_id = $12, beat = $13, shift = $14, damaged_amount = $15,
                    stolen_amount = $16, narrative = $17, updated_at = NOW()
                WHERE id = $18
                RETURNING id
                "#
            }
        };

        let mut query = sqlx::query_scalar::<_, i64>(sql)
            .bind(&values.incident_number)
            .bind(values.report_datetime)
            .bind(values.reporting_officer_id)
            .bind(values.reviewed_by_officer_id)
            .bind(values.reviewed_datetime)
            .bind(values.investigating_officer_id)
            .bind(values.officer_making_report_id)
            .bind(values.supervisor_id)
            .bind(values.approved_datetime)
            .bind(values.earliest_occurrence_datetime)
            .bind(values.latest_occurrence_datetime)
            .bind(location_id)
            .bind(values.beat)
            .bind(values.shift)
            .bind(values.damaged_amount)
            .bind(values.stolen_amount)
            .bind(&values.narrative);
        if let Some(id) = existing {
            query = query.bind(id);
        }

        let id = query
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_db_error(e, DUPLICATE_INCIDENT))?;

        Self::replace_offenses(conn, id, &values.offense_ids).await?;
        Ok(id)
    }

    /// Create the incident with its offenses, victims and suspects in one transaction
    pub async fn create(&self, dto: CreateIncidentDto) -> Result<IncidentDetailDto> {
        let (values, victims, suspects) = dto.resolve()?;

        let mut tx = self.pool.begin().await?;
        let id = Self::write(&mut tx, &values, None).await?;

        for (party_type, group) in [(PartyType::Victim, &victims), (PartyType::Suspect, &suspects)] {
            for (index, party) in group.iter().enumerate() {
                let sequence = party
                    .display_sequence
                    .or_else(|| i32::try_from(index).ok());
                parties::insert(&mut tx, id, party_type, party, sequence).await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Incident {} created (id={}, {} victims, {} suspects)",
            values.incident_number,
            id,
            victims.len(),
            suspects.len()
        );
        self.get_detail(id).await
    }

    /// Apply a partial update. Victims, suspects and files are left alone.
    pub async fn update(&self, id: i64, dto: UpdateIncidentDto) -> Result<IncidentDetailDto> {
        let incident = self.find(id).await?;
        let location = match incident.location_id {
            Some(location_id) => address_service::fetch_one(&self.pool, location_id).await?,
            None => None,
        };
        let offense_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT offense_id FROM incident_offenses WHERE incident_id = $1 ORDER BY offense_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load incident offenses: {:?}", e);
            AppError::Database(e)
        })?;

        let current = IncidentValues::from_existing(&incident, location, offense_ids);
        let values = dto.apply(current)?;
        let renamed_from = (values.incident_number != incident.incident_number)
            .then(|| incident.incident_number.clone());

        let mut tx = self.pool.begin().await?;
        Self::write(&mut tx, &values, Some(id)).await?;

        // Files follow the incident number on disk
        if let Some(old_number) = &renamed_from {
            let moved =
                incident_files::move_paths(&mut tx, id, old_number, &values.incident_number)
                    .await?;
            self.storage
                .rename_dir(old_number, &values.incident_number)
                .await?;
            tracing::info!(
                "Incident {} renumbered from {} to {} ({} files moved)",
                id,
                old_number,
                values.incident_number,
                moved
            );
        }

        if let Err(e) = tx.commit().await {
            if let Some(old_number) = &renamed_from {
                if let Err(undo) = self
                    .storage
                    .rename_dir(&values.incident_number, old_number)
                    .await
                {
                    tracing::error!(
                        "Could not move files of incident {} back to {}: {}",
                        id,
                        old_number,
                        undo
                    );
                }
            }
            return Err(e.into());
        }

        self.get_detail(id).await
    }

    /// Delete the incident, cascading to parties, files and offense links,
    /// then remove its upload directory
    pub async fn delete(&self, id: i64) -> Result<()> {
        let incident_number: String =
            sqlx::query_scalar("DELETE FROM incidents WHERE id = $1 RETURNING incident_number")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to delete incident: {:?}", e);
                    AppError::Database(e)
                })?
                .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;

        if let Err(e) = self.storage.remove_dir(&incident_number).await {
            tracing::error!(
                "Incident {} deleted but its files could not be removed: {}",
                incident_number,
                e
            );
        }

        tracing::info!("Incident {} deleted (id={})", incident_number, id);
        Ok(())
    }
}
