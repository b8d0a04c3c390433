//! Database queries for teams.

use sqlx::SqliteConnection;

/// Check whether a team row exists.
pub async fn team_exists(conn: &mut SqliteConnection, team_name: &str) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = ?)")
        .bind(team_name)
        .fetch_one(conn)
        .await?;

    Ok(exists)
}

/// Insert a team row. Fails with a constraint error if the name is taken.
pub async fn insert_team(conn: &mut SqliteConnection, team_name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO teams (team_name) VALUES (?)")
        .bind(team_name)
        .execute(conn)
        .await?;

    Ok(())
}
