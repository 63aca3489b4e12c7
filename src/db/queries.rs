//! Database queries for tours, options and their pricing fields

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::pricing::entity::{EntityPricing, Tour};

use super::models::{PricingColumns, TourOptionRow, TourRow};

/// Get a tour row by id
pub async fn get_tour_row(pool: &PgPool, tour_id: Uuid) -> Result<TourRow> {
    let row = sqlx::query_as::<_, TourRow>(
        r#"
        SELECT
            id,
            title,
            currency,
            price_per_unit,
            max_group_size,
            group_price,
            group_pricing_tiers
        FROM tours
        WHERE id = $1
          AND deleted_at IS NULL
        "#,
    )
    .bind(tour_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(row)
}

/// Get the options belonging to a tour
pub async fn get_tour_option_rows(pool: &PgPool, tour_id: Uuid) -> Result<Vec<TourOptionRow>> {
    let rows = sqlx::query_as::<_, TourOptionRow>(
        r#"
        SELECT
            id,
            tour_id,
            title,
            currency,
            price_per_unit,
            max_group_size,
            group_price,
            group_pricing_tiers,
            sort_order
        FROM tour_options
        WHERE tour_id = $1
          AND deleted_at IS NULL
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(tour_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Load a tour snapshot with all its options
pub async fn load_tour(pool: &PgPool, tour_id: Uuid) -> Result<Tour> {
    let row = get_tour_row(pool, tour_id).await?;
    let options = get_tour_option_rows(pool, tour_id).await?;
    Ok(row.into_tour(options))
}

fn columns(pricing: &EntityPricing) -> Result<PricingColumns> {
    PricingColumns::from_pricing(pricing)
        .map_err(|e| AppError::Internal(format!("Failed to encode tiers: {}", e)))
}

/// Write a tour's pricing fields
pub async fn update_tour_pricing(pool: &PgPool, tour_id: Uuid, pricing: &EntityPricing) -> Result<()> {
    let columns = columns(pricing)?;
    let result = sqlx::query(
        r#"
        UPDATE tours
        SET currency = $2,
            price_per_unit = $3,
            max_group_size = $4,
            group_price = $5,
            group_pricing_tiers = $6,
            updated_at = NOW()
        WHERE id = $1
          AND deleted_at IS NULL
        "#,
    )
    .bind(tour_id)
    .bind(&columns.currency)
    .bind(columns.price_per_unit)
    .bind(columns.max_group_size)
    .bind(columns.group_price)
    .bind(&columns.group_pricing_tiers)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Write an option's pricing fields
pub async fn update_option_pricing(
    pool: &PgPool,
    tour_id: Uuid,
    option_id: Uuid,
    pricing: &EntityPricing,
) -> Result<()> {
    let columns = columns(pricing)?;
    let result = sqlx::query(
        r#"
        UPDATE tour_options
        SET currency = $3,
            price_per_unit = $4,
            max_group_size = $5,
            group_price = $6,
            group_pricing_tiers = $7,
            updated_at = NOW()
        WHERE id = $2
          AND tour_id = $1
          AND deleted_at IS NULL
        "#,
    )
    .bind(tour_id)
    .bind(option_id)
    .bind(&columns.currency)
    .bind(columns.price_per_unit)
    .bind(columns.max_group_size)
    .bind(columns.group_price)
    .bind(&columns.group_pricing_tiers)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
