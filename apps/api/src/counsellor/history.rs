use sqlx::PgExecutor;

use crate::models::chat::ChatMessageRow;

pub async fn insert_message<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    role: &str,
    content: &str,
) -> Result<ChatMessageRow, sqlx::Error> {
    sqlx::query_as::<_, ChatMessageRow>(
        r#"
        INSERT INTO chat_messages (user_id, role, content)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(role)
    .bind(content)
    .fetch_one(db)
    .await
}

/// Full chat log, oldest first.
pub async fn list_messages<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
) -> Result<Vec<ChatMessageRow>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessageRow>(
        "SELECT * FROM chat_messages WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// The newest `limit` messages, returned oldest first.
pub async fn recent_messages<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ChatMessageRow>, sqlx::Error> {
    let mut rows = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        SELECT * FROM chat_messages
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    rows.reverse();
    Ok(rows)
}
