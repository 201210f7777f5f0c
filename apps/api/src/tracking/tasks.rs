use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgExecutor;

use crate::models::task::{TaskRow, TaskStatus};

pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    pub due_date: Option<DateTime<Utc>>,
}

fn default_priority() -> i32 {
    MIN_PRIORITY
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Tasks created for every student when onboarding completes.
pub fn initial_tasks() -> Vec<NewTask> {
    [
        (
            "Complete English proficiency test",
            "Take IELTS or TOEFL if not already done",
            5,
        ),
        ("Start SOP draft", "Begin writing your Statement of Purpose", 4),
        (
            "Research universities",
            "Explore universities that match your profile",
            3,
        ),
    ]
    .into_iter()
    .map(|(title, description, priority)| NewTask {
        title: title.to_string(),
        description: Some(description.to_string()),
        priority,
        due_date: None,
    })
    .collect()
}

pub fn clamp_priority(priority: i32) -> i32 {
    priority.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

pub async fn insert_task<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    task: &NewTask,
) -> Result<TaskRow, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(
        r#"
        INSERT INTO tasks (user_id, title, description, priority, due_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(clamp_priority(task.priority))
    .bind(task.due_date)
    .fetch_one(db)
    .await
}

/// Highest priority first, then oldest first.
pub async fn list_tasks<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(
        "SELECT * FROM tasks WHERE user_id = $1 ORDER BY priority DESC, created_at ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Up to `limit` tasks that are not completed, highest priority first.
pub async fn list_open_tasks<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    limit: i64,
) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT * FROM tasks
        WHERE user_id = $1 AND status <> 'completed'
        ORDER BY priority DESC, created_at ASC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
}

/// Applies `update` to the caller's task. `completed_at` is stamped the first time
/// the task reaches `completed`.
pub async fn update_task<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    task_id: i64,
    update: &TaskUpdate,
) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(
        r#"
        UPDATE tasks SET
            title = COALESCE($3, title),
            description = COALESCE($4, description),
            status = COALESCE($5, status),
            priority = COALESCE($6, priority),
            due_date = COALESCE($7, due_date),
            completed_at = CASE
                WHEN $5 = 'completed' AND completed_at IS NULL THEN NOW()
                ELSE completed_at
            END
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(task_id)
    .bind(user_id)
    .bind(&update.title)
    .bind(&update.description)
    .bind(update.status.map(|s| s.as_str()))
    .bind(update.priority.map(clamp_priority))
    .bind(update.due_date)
    .fetch_optional(db)
    .await
}

/// Returns whether a task was deleted.
pub async fn delete_task<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    task_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_tasks_are_ordered_by_priority() {
        let tasks = initial_tasks();
        assert_eq!(tasks.len(), 3);
        let priorities: Vec<i32> = tasks.iter().map(|t| t.priority).collect();
        assert_eq!(priorities, vec![5, 4, 3]);
        assert_eq!(tasks[1].title, "Start SOP draft");
    }

    #[test]
    fn test_priority_is_clamped() {
        assert_eq!(clamp_priority(0), 1);
        assert_eq!(clamp_priority(3), 3);
        assert_eq!(clamp_priority(42), 5);
    }

    #[test]
    fn test_new_task_defaults_priority() {
        let task: NewTask = serde_json::from_str(r#"{"title": "Email professor"}"#).unwrap();
        assert_eq!(task.priority, MIN_PRIORITY);
        assert!(task.description.is_none());
    }

    #[test]
    fn test_task_update_parses_status() {
        let update: TaskUpdate = serde_json::from_str(r#"{"status": "in_progress"}"#).unwrap();
        assert_eq!(update.status, Some(TaskStatus::InProgress));
        assert!(update.title.is_none());
    }
}
