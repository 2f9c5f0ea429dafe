use std::collections::HashMap;

use sqlx::{PgConnection, PgExecutor};

use crate::core::error::{AppError, Result};
use crate::features::incidents::dtos::AddressInput;
use crate::features::incidents::models::Address;

/// Find the address matching every component, creating the city and the
/// address rows when they do not exist yet. `field` names the input in
/// validation messages, e.g. `location` or `victims[0].home_address`.
pub async fn get_or_create(conn: &mut PgConnection, field: &str, input: &AddressInput) -> Result<i64> {
    let input = input.normalized();

    let state_id: i64 = sqlx::query_scalar("SELECT id FROM states WHERE abbreviation = $1")
        .bind(&input.state)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up state: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| {
            AppError::InvalidFields(vec![format!(
                "{}.state: '{}' is not a valid state",
                field, input.state
            )])
        })?;

    let city_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO cities (name, state_id)
        VALUES ($1, $2)
        ON CONFLICT (name, state_id) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(&input.city)
    .bind(state_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert city: {:?}", e);
        AppError::Database(e)
    })?;

    let address_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO addresses (street_number, route, city_id, postal_code)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (street_number, route, city_id, postal_code)
        DO UPDATE SET route = EXCLUDED.route
        RETURNING id
        "#,
    )
    .bind(&input.street_number)
    .bind(&input.route)
    .bind(city_id)
    .bind(&input.postal_code)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert address: {:?}", e);
        AppError::Database(e)
    })?;

    Ok(address_id)
}

/// Resolve an optional address input; blank input means no address
pub async fn resolve(
    conn: &mut PgConnection,
    field: &str,
    input: Option<&AddressInput>,
) -> Result<Option<i64>> {
    match input.filter(|a| !a.is_blank()) {
        Some(address) => Ok(Some(get_or_create(conn, field, address).await?)),
        None => Ok(None),
    }
}

pub async fn fetch_many<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[i64],
) -> Result<HashMap<i64, Address>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!("{} WHERE a.id = ANY($1)", Address::SELECT);
    let rows = sqlx::query_as::<_, Address>(&sql)
        .bind(ids)
        .fetch_all(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch addresses: {:?}", e);
            AppError::Database(e)
        })?;

    Ok(rows.into_iter().map(|a| (a.id, a)).collect())
}

pub async fn fetch_one<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Address>> {
    let sql = format!("{} WHERE a.id = $1", Address::SELECT);
    sqlx::query_as::<_, Address>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch address: {:?}", e);
            AppError::Database(e)
        })
}
