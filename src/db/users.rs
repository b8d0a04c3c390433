//! Database queries for users (team members).

use crate::models::{TeamMember, User};
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// Check whether a user id exists in any team.
pub async fn user_exists(conn: &mut SqliteConnection, user_id: &str) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?)")
        .bind(user_id)
        .fetch_one(conn)
        .await?;

    Ok(exists)
}

/// Insert a user under a team.
pub async fn insert_user(
    conn: &mut SqliteConnection,
    member: &TeamMember,
    team_name: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, username, team_name, is_active)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&member.user_id)
    .bind(&member.username)
    .bind(team_name)
    .bind(member.is_active)
    .execute(conn)
    .await?;

    Ok(())
}

/// Delete a user scoped to both team and id.
///
/// # Returns
/// Number of rows removed (0 when the user is not in that team)
pub async fn delete_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    team_name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE user_id = ? AND team_name = ?")
        .bind(user_id)
        .bind(team_name)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// All members of a team, active or not, ordered by user id.
pub async fn get_users_by_team(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Vec<TeamMember>, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(
        r#"
        SELECT user_id, username, is_active
        FROM users
        WHERE team_name = ?
        ORDER BY user_id
        "#,
    )
    .bind(team_name)
    .fetch_all(conn)
    .await
}

/// Active members of a team, minus the excluded ids, ordered by user id.
pub async fn get_active_users_by_team(
    conn: &mut SqliteConnection,
    team_name: &str,
    exclude: &[&str],
) -> Result<Vec<User>, sqlx::Error> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, username, team_name, is_active
        FROM users
        WHERE team_name = ? AND is_active = 1
        ORDER BY user_id
        "#,
    )
    .bind(team_name)
    .fetch_all(conn)
    .await?;

    let excluded: HashSet<&str> = exclude.iter().copied().collect();
    Ok(users
        .into_iter()
        .filter(|u| !excluded.contains(u.user_id.as_str()))
        .collect())
}

/// Look up a user by id.
pub async fn get_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Set the active flag and return the updated user, or `None` if absent.
pub async fn set_user_active(
    conn: &mut SqliteConnection,
    user_id: &str,
    is_active: bool,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET is_active = ?
        WHERE user_id = ?
        RETURNING user_id, username, team_name, is_active
        "#,
    )
    .bind(is_active)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}
