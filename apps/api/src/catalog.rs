// University catalog. Read-only through the API; rows are seeded by migration or ops.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::PgExecutor;

use crate::errors::AppError;
use crate::models::university::UniversityRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub country: Option<String>,
}

/// All universities, best ranked first. `country` matches case-insensitively.
pub async fn list_universities<'e, E: PgExecutor<'e>>(
    db: E,
    country: Option<&str>,
) -> Result<Vec<UniversityRow>, sqlx::Error> {
    sqlx::query_as::<_, UniversityRow>(
        r#"
        SELECT * FROM universities
        WHERE $1::TEXT IS NULL OR LOWER(country) = LOWER($1)
        ORDER BY ranking ASC NULLS LAST, id ASC
        "#,
    )
    .bind(country)
    .fetch_all(db)
    .await
}

pub async fn fetch_university<'e, E: PgExecutor<'e>>(
    db: E,
    university_id: i64,
) -> Result<Option<UniversityRow>, sqlx::Error> {
    sqlx::query_as::<_, UniversityRow>("SELECT * FROM universities WHERE id = $1")
        .bind(university_id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_universities_by_ids<'e, E: PgExecutor<'e>>(
    db: E,
    ids: &[i64],
) -> Result<Vec<UniversityRow>, sqlx::Error> {
    sqlx::query_as::<_, UniversityRow>("SELECT * FROM universities WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await
}

/// GET /api/v1/universities
pub async fn handle_list_universities(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<UniversityRow>>, AppError> {
    let country = query
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    Ok(Json(list_universities(&state.db, country).await?))
}
