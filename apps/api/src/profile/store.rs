use sqlx::PgExecutor;
use tracing::info;

use crate::models::profile::ProfileRow;
use crate::models::user::{User, UserStage};

pub async fn fetch_user<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// Creates a user. Returns `None` when the email is already registered.
pub async fn insert_user<'e, E: PgExecutor<'e>>(
    db: E,
    email: &str,
    full_name: &str,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, full_name)
        VALUES ($1, $2)
        ON CONFLICT (email) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(full_name)
    .fetch_optional(db)
    .await?;

    if let Some(u) = &user {
        info!("Created user {} <{}>", u.id, u.email);
    }
    Ok(user)
}

/// Marks onboarding done and moves the user on to university discovery.
pub async fn complete_onboarding<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET onboarding_completed = TRUE, current_stage = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(UserStage::DiscoveringUniversities.as_str())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn fetch_profile<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// Inserts `profile` for `profile.user_id`. Returns `None` if one already exists.
pub async fn insert_profile<'e, E: PgExecutor<'e>>(
    db: E,
    profile: &ProfileRow,
) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO user_profiles (
            user_id, education_level, degree, major, graduation_year, gpa, age,
            intended_degree, field_of_study, target_intake_year, preferred_countries,
            budget_min, budget_max, funding_plan,
            ielts_score, toefl_score, gre_score, gmat_score, sop_status,
            academic_strength, exam_strength, sop_strength
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22)
        ON CONFLICT (user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(profile.user_id)
    .bind(&profile.education_level)
    .bind(&profile.degree)
    .bind(&profile.major)
    .bind(profile.graduation_year)
    .bind(profile.gpa)
    .bind(profile.age)
    .bind(&profile.intended_degree)
    .bind(&profile.field_of_study)
    .bind(profile.target_intake_year)
    .bind(&profile.preferred_countries)
    .bind(profile.budget_min)
    .bind(profile.budget_max)
    .bind(&profile.funding_plan)
    .bind(profile.ielts_score)
    .bind(profile.toefl_score)
    .bind(profile.gre_score)
    .bind(profile.gmat_score)
    .bind(&profile.sop_status)
    .bind(&profile.academic_strength)
    .bind(&profile.exam_strength)
    .bind(&profile.sop_strength)
    .fetch_optional(db)
    .await
}

/// Overwrites every editable column with the values in `profile`.
pub async fn save_profile<'e, E: PgExecutor<'e>>(
    db: E,
    profile: &ProfileRow,
) -> Result<ProfileRow, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        UPDATE user_profiles SET
            education_level = $2, degree = $3, major = $4, graduation_year = $5,
            gpa = $6, age = $7, intended_degree = $8, field_of_study = $9,
            target_intake_year = $10, preferred_countries = $11,
            budget_min = $12, budget_max = $13, funding_plan = $14,
            ielts_score = $15, toefl_score = $16, gre_score = $17, gmat_score = $18,
            sop_status = $19, academic_strength = $20, exam_strength = $21,
            sop_strength = $22, updated_at = NOW()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(profile.user_id)
    .bind(&profile.education_level)
    .bind(&profile.degree)
    .bind(&profile.major)
    .bind(profile.graduation_year)
    .bind(profile.gpa)
    .bind(profile.age)
    .bind(&profile.intended_degree)
    .bind(&profile.field_of_study)
    .bind(profile.target_intake_year)
    .bind(&profile.preferred_countries)
    .bind(profile.budget_min)
    .bind(profile.budget_max)
    .bind(&profile.funding_plan)
    .bind(profile.ielts_score)
    .bind(profile.toefl_score)
    .bind(profile.gre_score)
    .bind(profile.gmat_score)
    .bind(&profile.sop_status)
    .bind(&profile.academic_strength)
    .bind(&profile.exam_strength)
    .bind(&profile.sop_strength)
    .fetch_one(db)
    .await
}
