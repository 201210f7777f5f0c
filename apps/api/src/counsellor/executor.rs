//! Action executor. Applies the actions an advisor reply requested.
//!
//! Params arrive as untyped JSON from the model, so each action is first interpreted
//! into a [`CounsellorAction`] with lenient coercion (numeric strings accepted, missing
//! fields defaulted). Actions that cannot be interpreted are logged and skipped.
//! All actions for one chat turn share a transaction, each behind its own savepoint,
//! so one rejected action does not undo the others.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::counsellor::actions::{ActionParams, ParsedAction};
use crate::counsellor::fit_scoring::Category;
use crate::models::user::UserStage;
use crate::tracking::shortlist::{insert_shortlist, lock_university, NewShortlist};
use crate::tracking::stage::{advance_stage, set_stage};
use crate::tracking::tasks::{delete_task, insert_task, NewTask};

const DEFAULT_TASK_TITLE: &str = "New Task";
const DEFAULT_TASK_PRIORITY: i32 = 3;
const DEFAULT_SHORTLIST_FIT: f64 = 70.0;
const DEFAULT_SHORTLIST_RISK: &str = "Medium";
const DEFAULT_SHORTLIST_REASONING: &str = "Recommended by AI Counsellor";

/// A recognized action with validated, typed params.
#[derive(Debug, Clone, PartialEq)]
pub enum CounsellorAction {
    CreateTask(NewTaskParams),
    UpdateStage(UserStage),
    ShortlistUniversity(ShortlistParams),
    LockUniversity { university_id: i64 },
    DeleteTask { task_id: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskParams {
    pub title: String,
    pub description: String,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShortlistParams {
    pub university_id: i64,
    pub category: Category,
    pub fit_score: f64,
    pub risk_level: String,
    pub reasoning: String,
}

/// Maps a parsed action onto the known vocabulary. `None` when the name is unknown
/// or a required param is missing or unusable.
pub fn interpret(action: &ParsedAction) -> Option<CounsellorAction> {
    let params = &action.params;
    match action.action.as_str() {
        "CREATE_TASK" => Some(CounsellorAction::CreateTask(NewTaskParams {
            title: string_param(params, "title").unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string()),
            description: string_param(params, "description").unwrap_or_default(),
            priority: params
                .get("priority")
                .and_then(coerce_int)
                .and_then(|p| i32::try_from(p).ok())
                .unwrap_or(DEFAULT_TASK_PRIORITY),
        })),
        "UPDATE_STAGE" => params
            .get("stage")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<UserStage>().ok())
            .map(CounsellorAction::UpdateStage),
        "SHORTLIST_UNIVERSITY" => {
            let university_id = id_param(params, "university_id")?;
            Some(CounsellorAction::ShortlistUniversity(ShortlistParams {
                university_id,
                category: params
                    .get("category")
                    .and_then(|v| serde_json::from_value::<Category>(v.clone()).ok())
                    .unwrap_or(Category::Target),
                fit_score: params
                    .get("fit_score")
                    .and_then(coerce_float)
                    .map(|s| s.clamp(0.0, 100.0))
                    .unwrap_or(DEFAULT_SHORTLIST_FIT),
                risk_level: string_param(params, "risk_level")
                    .unwrap_or_else(|| DEFAULT_SHORTLIST_RISK.to_string()),
                reasoning: string_param(params, "reasoning")
                    .unwrap_or_else(|| DEFAULT_SHORTLIST_REASONING.to_string()),
            }))
        }
        "LOCK_UNIVERSITY" => Some(CounsellorAction::LockUniversity {
            university_id: id_param(params, "university_id")?,
        }),
        "DELETE_TASK" => Some(CounsellorAction::DeleteTask {
            task_id: id_param(params, "task_id")?,
        }),
        _ => None,
    }
}

/// Integers, integral floats and numeric strings.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Finite numbers and numeric strings. "NaN" and "inf" are rejected.
fn coerce_float(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

/// Non-zero id. Zero is treated as absent.
fn id_param(params: &ActionParams, key: &str) -> Option<i64> {
    params.get(key).and_then(coerce_int).filter(|id| *id != 0)
}

fn string_param(params: &ActionParams, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(String::from)
}

/// What happened to one parsed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Applied,
    /// Valid, but nothing changed (already shortlisted, no matching row).
    Unchanged,
    /// Unknown name or unusable params.
    Skipped,
    /// The database rejected it; its savepoint was rolled back.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub action: String,
    pub status: ActionStatus,
}

/// Applies one interpreted action. The Postgres store isolates each call in a
/// savepoint so a failure leaves earlier actions intact.
#[async_trait]
pub trait ActionStore: Send {
    async fn apply(&mut self, user_id: i64, action: &CounsellorAction) -> Result<bool, sqlx::Error>;
}

/// Runs every parsed action in order. A skipped or failed action never stops the
/// ones after it.
pub async fn run_actions<S: ActionStore>(
    store: &mut S,
    user_id: i64,
    actions: &[ParsedAction],
) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::with_capacity(actions.len());

    for parsed in actions {
        let status = match interpret(parsed) {
            None => {
                let params = serde_json::Value::Object(parsed.params.clone()).to_string();
                warn!(
                    "Skipping unrecognized or invalid action '{}' with params {params}",
                    parsed.action
                );
                ActionStatus::Skipped
            }
            Some(action) => match store.apply(user_id, &action).await {
                Ok(true) => ActionStatus::Applied,
                Ok(false) => ActionStatus::Unchanged,
                Err(e) => {
                    warn!("Action '{}' failed for user {user_id}: {e}", parsed.action);
                    ActionStatus::Failed
                }
            },
        };
        outcomes.push(ActionOutcome {
            action: parsed.action.clone(),
            status,
        });
    }

    outcomes
}

/// Postgres-backed store: one savepoint per action inside the turn's transaction.
struct SavepointStore<'a, 'c> {
    tx: &'a mut Transaction<'c, Postgres>,
}

#[async_trait]
impl<'a, 'c> ActionStore for SavepointStore<'a, 'c> {
    async fn apply(&mut self, user_id: i64, action: &CounsellorAction) -> Result<bool, sqlx::Error> {
        let mut savepoint = Acquire::begin(&mut *self.tx).await?;
        match apply(&mut savepoint, user_id, action).await {
            Ok(changed) => {
                savepoint.commit().await?;
                Ok(changed)
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e)
            }
        }
    }
}

/// Runs the parsed actions for `user_id` in one transaction, each behind its own
/// savepoint. Only connection-level errors (begin, commit) are returned.
pub async fn execute_actions(
    pool: &PgPool,
    user_id: i64,
    actions: &[ParsedAction],
) -> Result<Vec<ActionOutcome>, sqlx::Error> {
    if actions.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;
    let outcomes = run_actions(&mut SavepointStore { tx: &mut tx }, user_id, actions).await;
    tx.commit().await?;

    let applied = outcomes
        .iter()
        .filter(|o| o.status == ActionStatus::Applied)
        .count();
    info!("Applied {applied}/{} advisor action(s) for user {user_id}", actions.len());
    Ok(outcomes)
}

async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    action: &CounsellorAction,
) -> Result<bool, sqlx::Error> {
    match action {
        CounsellorAction::CreateTask(params) => {
            let task = NewTask {
                title: params.title.clone(),
                description: Some(params.description.clone()),
                priority: params.priority,
                due_date: None,
            };
            insert_task(&mut **tx, user_id, &task).await?;
            Ok(true)
        }
        CounsellorAction::UpdateStage(stage) => {
            set_stage(&mut **tx, user_id, *stage).await?;
            Ok(true)
        }
        CounsellorAction::ShortlistUniversity(params) => {
            let entry = NewShortlist {
                university_id: params.university_id,
                category: params.category,
                fit_score: params.fit_score,
                risk_level: params.risk_level.clone(),
                ai_reasoning: params.reasoning.clone(),
            };
            let inserted = insert_shortlist(&mut **tx, user_id, &entry).await?;
            if inserted.is_none() {
                return Ok(false);
            }
            advance_stage(
                &mut **tx,
                user_id,
                UserStage::DiscoveringUniversities,
                UserStage::FinalizingUniversities,
            )
            .await?;
            Ok(true)
        }
        CounsellorAction::LockUniversity { university_id } => {
            if !lock_university(&mut **tx, user_id, *university_id).await? {
                return Ok(false);
            }
            set_stage(&mut **tx, user_id, UserStage::PreparingApplications).await?;
            Ok(true)
        }
        CounsellorAction::DeleteTask { task_id } => delete_task(&mut **tx, user_id, *task_id).await,
    }
}
