use serde::Deserialize;
use sqlx::PgExecutor;

use crate::counsellor::fit_scoring::Category;
use crate::models::shortlist::ShortlistRow;

#[derive(Debug, Clone, Deserialize)]
pub struct NewShortlist {
    pub university_id: i64,
    pub category: Category,
    pub fit_score: f64,
    pub risk_level: String,
    pub ai_reasoning: String,
}

/// Inserts unless the university is already on the user's shortlist.
/// Returns `None` for the duplicate case.
pub async fn insert_shortlist<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    entry: &NewShortlist,
) -> Result<Option<ShortlistRow>, sqlx::Error> {
    sqlx::query_as::<_, ShortlistRow>(
        r#"
        INSERT INTO shortlisted_universities
            (user_id, university_id, category, fit_score, risk_level, ai_reasoning)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, university_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(entry.university_id)
    .bind(entry.category.as_str())
    .bind(entry.fit_score)
    .bind(&entry.risk_level)
    .bind(&entry.ai_reasoning)
    .fetch_optional(db)
    .await
}

pub async fn list_shortlist<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
) -> Result<Vec<ShortlistRow>, sqlx::Error> {
    sqlx::query_as::<_, ShortlistRow>(
        "SELECT * FROM shortlisted_universities WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// `(shortlisted, locked)` counts for a user.
pub async fn shortlist_counts<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), COUNT(*) FILTER (WHERE is_locked)
        FROM shortlisted_universities
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Locks or unlocks a shortlist row by its own id.
pub async fn set_lock<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    shortlist_id: i64,
    lock: bool,
) -> Result<Option<ShortlistRow>, sqlx::Error> {
    sqlx::query_as::<_, ShortlistRow>(
        r#"
        UPDATE shortlisted_universities
        SET is_locked = $3,
            locked_at = CASE WHEN $3 THEN NOW() ELSE NULL END
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(shortlist_id)
    .bind(user_id)
    .bind(lock)
    .fetch_optional(db)
    .await
}

/// Locks the shortlist row for a university. Returns whether a row was found.
pub async fn lock_university<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    university_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE shortlisted_universities
        SET is_locked = TRUE, locked_at = NOW()
        WHERE user_id = $1 AND university_id = $2
        "#,
    )
    .bind(user_id)
    .bind(university_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_shortlist<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    shortlist_id: i64,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM shortlisted_universities WHERE id = $1 AND user_id = $2")
            .bind(shortlist_id)
            .bind(user_id)
            .execute(db)
            .await?;
    Ok(result.rows_affected() > 0)
}
