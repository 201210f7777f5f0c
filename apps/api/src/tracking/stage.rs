use sqlx::PgExecutor;
use tracing::info;

use crate::models::user::UserStage;

/// Unconditionally moves a user to `stage`.
pub async fn set_stage<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    stage: UserStage,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET current_stage = $1, updated_at = NOW() WHERE id = $2")
        .bind(stage.as_str())
        .bind(user_id)
        .execute(db)
        .await?;
    info!("User {user_id} moved to stage {stage}");
    Ok(())
}

/// Moves a user from `from` to `to`; no-op when the user is in any other stage.
/// Returns whether the stage changed.
pub async fn advance_stage<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    from: UserStage,
    to: UserStage,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET current_stage = $1, updated_at = NOW() \
         WHERE id = $2 AND current_stage = $3",
    )
    .bind(to.as_str())
    .bind(user_id)
    .bind(from.as_str())
    .execute(db)
    .await?;

    let changed = result.rows_affected() > 0;
    if changed {
        info!("User {user_id} advanced from {from} to {to}");
    }
    Ok(changed)
}
