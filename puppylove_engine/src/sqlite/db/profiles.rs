use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{Profile, Registration},
    traits::{ProfileError, UsersInfo},
};

pub async fn fetch_profile(roll_no: &str, conn: &mut SqliteConnection) -> Result<Option<Profile>, sqlx::Error> {
    let profile =
        sqlx::query_as("SELECT * FROM profiles WHERE roll_no = $1").bind(roll_no).fetch_optional(conn).await?;
    Ok(profile)
}

/// Like [`fetch_profile`], but a missing profile is an error.
pub async fn fetch_existing_profile(roll_no: &str, conn: &mut SqliteConnection) -> Result<Profile, ProfileError> {
    fetch_profile(roll_no, conn).await?.ok_or_else(|| ProfileError::ProfileNotFound(roll_no.to_string()))
}

/// Inserts a blank, unregistered profile for `roll_no` unless one already exists, and returns the stored profile.
pub async fn insert_if_missing(
    roll_no: &str,
    user_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Profile, sqlx::Error> {
    let now = Utc::now();
    let res = sqlx::query(
        r#"
            INSERT INTO profiles (roll_no, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT(roll_no) DO NOTHING
        "#,
    )
    .bind(roll_no)
    .bind(user_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    if res.rows_affected() > 0 {
        debug!("🗃️ Created blank profile for {roll_no}");
    }
    sqlx::query_as("SELECT * FROM profiles WHERE roll_no = $1").bind(roll_no).fetch_one(conn).await
}

/// Upserts the registration. Only unregistered (or missing) profiles are touched; if the profile is already
/// registered, `AlreadyRegistered` is returned.
pub async fn register(registration: Registration, conn: &mut SqliteConnection) -> Result<Profile, ProfileError> {
    let roll_no = registration.roll_no.clone();
    let profile: Option<Profile> = sqlx::query_as(
        r#"
            INSERT INTO profiles (
                roll_no,
                user_id,
                gender,
                public_key,
                private_key,
                data,
                registered,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            ON CONFLICT(roll_no) DO UPDATE SET
                user_id = COALESCE(excluded.user_id, profiles.user_id),
                gender = excluded.gender,
                public_key = excluded.public_key,
                private_key = excluded.private_key,
                data = excluded.data,
                registered = TRUE,
                updated_at = excluded.updated_at
            WHERE profiles.registered = FALSE
            RETURNING *;
        "#,
    )
    .bind(registration.roll_no)
    .bind(registration.user_id)
    .bind(registration.gender)
    .bind(registration.public_key)
    .bind(registration.private_key)
    .bind(registration.data)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() && err.message().contains("public_key") => {
            ProfileError::PublicKeyInUse
        },
        e => ProfileError::from(e),
    })?;
    profile.ok_or(ProfileError::AlreadyRegistered(roll_no))
}

/// Returns the profile to the canonical unregistered state. Gender, about and interests survive a reset.
pub async fn reset(roll_no: &str, conn: &mut SqliteConnection) -> Result<Option<Profile>, sqlx::Error> {
    let profile = sqlx::query_as(
        r#"
            UPDATE profiles SET
                public_key = '',
                private_key = '',
                data = '',
                claims = '',
                submitted = FALSE,
                registered = FALSE,
                publish = FALSE,
                matches = '{}',
                updated_at = $2
            WHERE roll_no = $1
            RETURNING *;
        "#,
    )
    .bind(roll_no)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(profile)
}

/// Sets the `submitted` flag, but only if it is not set already. Returns `true` if this call set the flag.
pub async fn mark_submitted(roll_no: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE profiles SET submitted = TRUE, updated_at = $2 WHERE roll_no = $1 AND submitted = FALSE",
    )
    .bind(roll_no)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Bumps `updated_at`. Fails with `ProfileNotFound` if there is no such profile.
pub async fn touch(roll_no: &str, conn: &mut SqliteConnection) -> Result<(), ProfileError> {
    let res = sqlx::query("UPDATE profiles SET updated_at = $1 WHERE roll_no = $2")
        .bind(Utc::now())
        .bind(roll_no)
        .execute(conn)
        .await?;
    match res.rows_affected() {
        0 => Err(ProfileError::ProfileNotFound(roll_no.to_string())),
        _ => Ok(()),
    }
}

async fn update_text_field(
    field: &'static str,
    roll_no: &str,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<(), ProfileError> {
    let sql = format!("UPDATE profiles SET {field} = $1, updated_at = $2 WHERE roll_no = $3");
    let res = sqlx::query(&sql).bind(value).bind(Utc::now()).bind(roll_no).execute(conn).await?;
    match res.rows_affected() {
        0 => Err(ProfileError::ProfileNotFound(roll_no.to_string())),
        _ => {
            trace!("🗃️ Updated {field} for {roll_no}");
            Ok(())
        },
    }
}

pub async fn update_about(roll_no: &str, about: &str, conn: &mut SqliteConnection) -> Result<(), ProfileError> {
    update_text_field("about", roll_no, about, conn).await
}

pub async fn update_interests(
    roll_no: &str,
    interests: &str,
    conn: &mut SqliteConnection,
) -> Result<(), ProfileError> {
    update_text_field("interests", roll_no, interests, conn).await
}

pub async fn update_draft_data(roll_no: &str, data: &str, conn: &mut SqliteConnection) -> Result<(), ProfileError> {
    update_text_field("data", roll_no, data, conn).await
}

pub async fn update_claims(roll_no: &str, claims: &str, conn: &mut SqliteConnection) -> Result<(), ProfileError> {
    update_text_field("claims", roll_no, claims, conn).await
}

pub async fn set_publish(roll_no: &str, conn: &mut SqliteConnection) -> Result<(), ProfileError> {
    let res = sqlx::query("UPDATE profiles SET publish = TRUE, updated_at = $2 WHERE roll_no = $1")
        .bind(roll_no)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    match res.rows_affected() {
        0 => Err(ProfileError::ProfileNotFound(roll_no.to_string())),
        _ => Ok(()),
    }
}

pub async fn update_matches(
    roll_no: &str,
    matches: &HashMap<String, String>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE profiles SET matches = $1, updated_at = $2 WHERE roll_no = $3")
        .bind(Json(matches))
        .bind(Utc::now())
        .bind(roll_no)
        .execute(conn)
        .await?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub enum PollCursor {
    SentHearts,
    ReturnHearts,
}

impl PollCursor {
    fn column(&self) -> &'static str {
        match self {
            PollCursor::SentHearts => "send_hearts_timestamp",
            PollCursor::ReturnHearts => "return_hearts_timestamp",
        }
    }
}

/// Reads the polling cursor for the given ledger. Returns `None` if the profile does not exist.
pub async fn fetch_cursor(
    roll_no: &str,
    cursor: PollCursor,
    conn: &mut SqliteConnection,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let sql = format!("SELECT {} FROM profiles WHERE roll_no = $1", cursor.column());
    let ts = sqlx::query_scalar(&sql).bind(roll_no).fetch_optional(conn).await?;
    Ok(ts)
}

pub async fn move_cursor(
    roll_no: &str,
    cursor: PollCursor,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    let sql = format!("UPDATE profiles SET {} = $1 WHERE roll_no = $2", cursor.column());
    sqlx::query(&sql).bind(to).bind(roll_no).execute(conn).await?;
    Ok(())
}

pub async fn fetch_public_keys(conn: &mut SqliteConnection) -> Result<HashMap<String, String>, sqlx::Error> {
    let keys: Vec<(String, String)> =
        sqlx::query_as("SELECT roll_no, public_key FROM profiles WHERE registered = TRUE AND public_key <> ''")
            .fetch_all(conn)
            .await?;
    Ok(keys.into_iter().collect())
}

pub async fn fetch_users_info(conn: &mut SqliteConnection) -> Result<UsersInfo, sqlx::Error> {
    let rows: Vec<(String, String, String)> =
        sqlx::query_as("SELECT roll_no, about, interests FROM profiles WHERE registered = TRUE")
            .fetch_all(conn)
            .await?;
    let mut info = UsersInfo::default();
    for (roll_no, about, interests) in rows {
        info.about.insert(roll_no.clone(), about);
        info.interests.insert(roll_no, interests);
    }
    Ok(info)
}

pub async fn fetch_active_users(conn: &mut SqliteConnection) -> Result<Vec<String>, sqlx::Error> {
    let users = sqlx::query_scalar("SELECT roll_no FROM profiles WHERE registered = TRUE ORDER BY roll_no")
        .fetch_all(conn)
        .await?;
    Ok(users)
}

pub async fn fetch_registered_profiles(conn: &mut SqliteConnection) -> Result<Vec<Profile>, sqlx::Error> {
    let profiles =
        sqlx::query_as("SELECT * FROM profiles WHERE registered = TRUE ORDER BY roll_no").fetch_all(conn).await?;
    Ok(profiles)
}
