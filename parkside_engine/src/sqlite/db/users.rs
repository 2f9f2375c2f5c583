use log::info;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, Role, User, UserStatus},
    traits::{AccountApiError, LoginIdentity},
};

/// Inserts the user and maps them to the default `User` role. Uniqueness is checked per field first so
/// the caller can report exactly which of username/email/phone clashed; a racing insert still lands on
/// the unique index and is reported as a generic conflict on the same field set.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<i64, AccountApiError> {
    let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(&user.username)
        .fetch_optional(&mut *conn)
        .await?;
    if taken.is_some() {
        return Err(AccountApiError::UsernameTaken);
    }
    let taken: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE email = $1").bind(&user.email).fetch_optional(&mut *conn).await?;
    if taken.is_some() {
        return Err(AccountApiError::EmailTaken);
    }
    let taken: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE phone = $1").bind(&user.phone).fetch_optional(&mut *conn).await?;
    if taken.is_some() {
        return Err(AccountApiError::PhoneTaken);
    }
    let user_id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO users (username, email, phone, password_hash) VALUES ($1, $2, $3, $4)
            RETURNING id;
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.password_hash)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => AccountApiError::UsernameTaken,
        _ => AccountApiError::from(e),
    })?;
    sqlx::query(
        "INSERT INTO user_role_mappings (user_id, role_id) SELECT $1, id FROM user_roles WHERE name = 'User'",
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    info!("👤️ Registered user {} with id {user_id}", user.username);
    Ok(user_id)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_login_identity(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<LoginIdentity>, sqlx::Error> {
    let row: Option<(i64, String, String, String, String)> = sqlx::query_as(
        r#"
            SELECT u.id, u.username, u.email, u.status, r.name
            FROM users u
            JOIN user_role_mappings m ON u.id = m.user_id
            JOIN user_roles r ON m.role_id = r.id
            WHERE u.email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(user_id, username, email, status, role)| LoginIdentity {
        user_id,
        username,
        email,
        role: Role::from(role),
        status: UserStatus::from(status),
    }))
}

pub async fn fetch_all_users_with_roles(conn: &mut SqliteConnection) -> Result<Vec<(User, Role)>, sqlx::Error> {
    let rows: Vec<(i64, String)> = sqlx::query_as(
        r#"
            SELECT m.user_id, r.name
            FROM user_role_mappings m JOIN user_roles r ON m.role_id = r.id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY id").fetch_all(conn).await?;
    let result = users
        .into_iter()
        .map(|u| {
            let role = rows
                .iter()
                .find(|(uid, _)| *uid == u.id)
                .map(|(_, name)| Role::from(name.clone()))
                .unwrap_or(Role::User);
            (u, role)
        })
        .collect();
    Ok(result)
}

pub async fn update_status(
    user_id: i64,
    status: UserStatus,
    conn: &mut SqliteConnection,
) -> Result<(), AccountApiError> {
    let result = sqlx::query("UPDATE users SET status = $1 WHERE id = $2")
        .bind(status.to_string())
        .bind(user_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AccountApiError::UserNotFound(user_id));
    }
    info!("👤️ User {user_id} status updated to {status}");
    Ok(())
}

/// Promotes (or demotes) a user by replacing their role mapping. Used by seeding and tooling.
pub async fn assign_role(user_id: i64, role: Role, conn: &mut SqliteConnection) -> Result<(), AccountApiError> {
    sqlx::query("DELETE FROM user_role_mappings WHERE user_id = $1").bind(user_id).execute(&mut *conn).await?;
    sqlx::query("INSERT INTO user_role_mappings (user_id, role_id) SELECT $1, id FROM user_roles WHERE name = $2")
        .bind(user_id)
        .bind(role.to_string())
        .execute(conn)
        .await?;
    Ok(())
}
