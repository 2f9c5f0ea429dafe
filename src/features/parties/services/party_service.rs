use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::incidents::models::Address;
use crate::features::incidents::services::address_service;
use crate::features::parties::dtos::{PartyInput, PartyResponseDto, UpdatePartyDto};
use crate::features::parties::models::{Party, PartyType};

const DUPLICATE_PARTY: &str = "This party already exists";

/// Write one victim or suspect, resolving its addresses on the same connection.
/// `sequence` overrides the input's display_sequence; when both are absent the
/// party is appended after the existing ones of its type.
pub(crate) async fn insert(
    conn: &mut PgConnection,
    incident_id: i64,
    party_type: PartyType,
    input: &PartyInput,
    sequence: Option<i32>,
) -> Result<i64> {
    let field = party_type.plural();
    let date_of_birth = input.parsed_date_of_birth()?;
    let home_address_id = address_service::resolve(
        conn,
        &format!("{}.home_address", field),
        input.home_address.as_ref(),
    )
    .await?;
    let employer_address_id = address_service::resolve(
        conn,
        &format!("{}.employer_address", field),
        input.employer_address.as_ref(),
    )
    .await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO incident_involved_parties (
            incident_id, officer_signed_id, party_type, first_name, last_name, juvenile,
            home_address_id, date_of_birth, sex, race, height, weight, hair_color,
            eye_color, drivers_license, drivers_license_state, employer,
            employer_address_id, build, tattoos, scars, hairstyle, display_sequence
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
            $18, $19, $20, $21, $22,
            COALESCE($23, (
                SELECT COALESCE(MAX(display_sequence) + 1, 0)
                FROM incident_involved_parties
                WHERE incident_id = $1 AND party_type = $3
            ))
        )
        RETURNING id
        "#,
    )
    .bind(incident_id)
    .bind(input.officer_signed.map(|o| o.id()))
    .bind(party_type)
    .bind(input.first_name.trim())
    .bind(input.last_name.trim())
    .bind(input.juvenile)
    .bind(home_address_id)
    .bind(date_of_birth)
    .bind(input.sex)
    .bind(input.race)
    .bind(input.height)
    .bind(input.weight)
    .bind(&input.hair_color)
    .bind(&input.eye_color)
    .bind(&input.drivers_license)
    .bind(&input.drivers_license_state)
    .bind(&input.employer)
    .bind(employer_address_id)
    .bind(&input.build)
    .bind(&input.tattoos)
    .bind(&input.scars)
    .bind(&input.hairstyle)
    .bind(sequence.or(input.display_sequence))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_db_error(e, DUPLICATE_PARTY))?;

    Ok(id)
}

fn order_key(p: &PartyResponseDto) -> (i32, i64) {
    (p.display_sequence, p.id)
}

/// Attach addresses to loaded party rows
async fn with_addresses(pool: &PgPool, parties: Vec<Party>) -> Result<Vec<PartyResponseDto>> {
    let ids: Vec<i64> = parties
        .iter()
        .flat_map(|p| [p.home_address_id, p.employer_address_id])
        .flatten()
        .collect();
    let addresses: HashMap<i64, Address> = address_service::fetch_many(pool, &ids).await?;

    let lookup = |id: Option<i64>| id.and_then(|id| addresses.get(&id).cloned());
    let mut result: Vec<PartyResponseDto> = parties
        .into_iter()
        .map(|p| {
            let home = lookup(p.home_address_id);
            let employer = lookup(p.employer_address_id);
            PartyResponseDto::from_party(p, home, employer)
        })
        .collect();
    result.sort_by_key(order_key);
    Ok(result)
}

/// Every victim and suspect of an incident, each list in display order
pub(crate) async fn load_for_incident(
    pool: &PgPool,
    incident_id: i64,
) -> Result<(Vec<PartyResponseDto>, Vec<PartyResponseDto>)> {
    let sql = format!(
        "SELECT {} FROM incident_involved_parties WHERE incident_id = $1",
        Party::COLUMNS
    );
    let rows = sqlx::query_as::<_, Party>(&sql)
        .bind(incident_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load incident parties: {:?}", e);
            AppError::Database(e)
        })?;

    let (victims, suspects): (Vec<PartyResponseDto>, Vec<PartyResponseDto>) =
        with_addresses(pool, rows)
            .await?
            .into_iter()
            .partition(|p| p.party_type == PartyType::Victim);
    Ok((victims, suspects))
}

/// Victims and suspects scoped to one incident
pub struct PartyService {
    pool: PgPool,
}

impl PartyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_incident(&self, incident_id: i64) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM incidents WHERE id = $1)")
            .bind(incident_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to check incident: {:?}", e);
                AppError::Database(e)
            })?;

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Incident {} not found", incident_id)))
        }
    }

    async fn find(&self, incident_id: i64, party_type: PartyType, id: i64) -> Result<Party> {
        let sql = format!(
            "SELECT {} FROM incident_involved_parties \
             WHERE id = $1 AND incident_id = $2 AND party_type = $3",
            Party::COLUMNS
        );
        sqlx::query_as::<_, Party>(&sql)
            .bind(id)
            .bind(incident_id)
            .bind(party_type)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get party: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", party_type.label(), id)))
    }

    pub async fn list(&self, incident_id: i64, party_type: PartyType) -> Result<Vec<PartyResponseDto>> {
        self.ensure_incident(incident_id).await?;

        let sql = format!(
            "SELECT {} FROM incident_involved_parties \
             WHERE incident_id = $1 AND party_type = $2 \
             ORDER BY display_sequence, id",
            Party::COLUMNS
        );
        let rows = sqlx::query_as::<_, Party>(&sql)
            .bind(incident_id)
            .bind(party_type)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list parties: {:?}", e);
                AppError::Database(e)
            })?;

        with_addresses(&self.pool, rows).await
    }

    pub async fn get(&self, incident_id: i64, party_type: PartyType, id: i64) -> Result<PartyResponseDto> {
        let party = self.find(incident_id, party_type, id).await?;
        let mut loaded = with_addresses(&self.pool, vec![party]).await?;
        loaded
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", party_type.label(), id)))
    }

    pub async fn create(
        &self,
        incident_id: i64,
        party_type: PartyType,
        input: PartyInput,
    ) -> Result<PartyResponseDto> {
        self.ensure_incident(incident_id).await?;

        let mut tx = self.pool.begin().await?;
        let id = insert(&mut tx, incident_id, party_type, &input, None).await?;
        tx.commit().await?;

        tracing::info!(
            "{} {} added to incident {}",
            party_type.label(),
            id,
            incident_id
        );
        self.get(incident_id, party_type, id).await
    }

    pub async fn update(
        &self,
        incident_id: i64,
        party_type: PartyType,
        id: i64,
        dto: UpdatePartyDto,
    ) -> Result<PartyResponseDto> {
        let party = self.find(incident_id, party_type, id).await?;
        let home = match party.home_address_id {
            Some(address_id) => address_service::fetch_one(&self.pool, address_id).await?,
            None => None,
        };
        let employer = match party.employer_address_id {
            Some(address_id) => address_service::fetch_one(&self.pool, address_id).await?,
            None => None,
        };
        let input = dto.merge_into(&party, home, employer);
        let date_of_birth = input.parsed_date_of_birth()?;

        let mut tx = self.pool.begin().await?;
        let field = party_type.plural();
        let home_address_id = address_service::resolve(
            &mut tx,
            &format!("{}.home_address", field),
            input.home_address.as_ref(),
        )
        .await?;
        let employer_address_id = address_service::resolve(
            &mut tx,
            &format!("{}.employer_address", field),
            input.employer_address.as_ref(),
        )
        .await?;

        sqlx::query(
            r#"
            UPDATE incident_involved_parties
            SET officer_signed_id = $2, first_name = $3, last_name = $4, juvenile = $5,
                home_address_id = $6, date_of_birth = $7, sex = $8, race = $9,
                height = $10, weight = $11, hair_color = $12, eye_color = $13,
                drivers_license = $14, drivers_license_state = $15, employer = $16,
                employer_address_id = $17, build = $18, tattoos = $19, scars = $20,
                hairstyle = $21, display_sequence = $22, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.officer_signed.map(|o| o.id()))
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.juvenile)
        .bind(home_address_id)
        .bind(date_of_birth)
        .bind(input.sex)
        .bind(input.race)
        .bind(input.height)
        .bind(input.weight)
        .bind(&input.hair_color)
        .bind(&input.eye_color)
        .bind(&input.drivers_license)
        .bind(&input.drivers_license_state)
        .bind(&input.employer)
        .bind(employer_address_id)
        .bind(&input.build)
        .bind(&input.tattoos)
        .bind(&input.scars)
        .bind(&input.hairstyle)
        .bind(input.display_sequence.unwrap_or(party.display_sequence))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, DUPLICATE_PARTY))?;

        tx.commit().await?;
        self.get(incident_id, party_type, id).await
    }

    pub async fn delete(&self, incident_id: i64, party_type: PartyType, id: i64) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM incident_involved_parties \
             WHERE id = $1 AND incident_id = $2 AND party_type = $3",
        )
        .bind(id)
        .bind(incident_id)
        .bind(party_type)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete party: {:?}", e);
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                party_type.label(),
                id
            )));
        }

        tracing::info!("{} {} deleted from incident {}", party_type.label(), id, incident_id);
        Ok(())
    }
}
