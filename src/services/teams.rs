//! Team and user registry.
//!
//! Maintains team membership and the active flags the pull request
//! lifecycle draws reviewer candidates from. The `teams` row is the
//! authority on whether a team exists.

use crate::db::pool::DbPool;
use crate::db::{self, teams, users};
use crate::error::{AppError, ConflictReason};
use crate::models::{Team, TeamMember, User};
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// Create a team together with its initial members.
///
/// All uniqueness checks happen before the first write, and everything is
/// committed in one exclusive transaction: either the team and every member
/// exist afterwards, or nothing does.
pub async fn create_team(pool: &DbPool, team: &Team) -> Result<Team, AppError> {
    if team.team_name.trim().is_empty() {
        return Err(AppError::invalid_input_field("team_name is required", "team_name"));
    }

    let mut tx = db::begin_exclusive(pool).await?;

    if teams::team_exists(&mut tx, &team.team_name).await? {
        return Err(AppError::conflict(
            ConflictReason::TeamExists,
            format!("team {} already exists", team.team_name),
        ));
    }

    let mut seen = HashSet::new();
    for member in &team.members {
        if !seen.insert(member.user_id.as_str()) || users::user_exists(&mut tx, &member.user_id).await? {
            return Err(AppError::conflict(
                ConflictReason::UserExists,
                format!("user {} already exists", member.user_id),
            ));
        }
    }

    teams::insert_team(&mut tx, &team.team_name).await?;
    for member in &team.members {
        users::insert_user(&mut tx, member, &team.team_name).await?;
    }

    let created = load_team(&mut tx, &team.team_name).await?;
    tx.commit().await?;

    log::info!(
        "[teams] Created team {} with {} members",
        created.team_name,
        created.members.len()
    );
    Ok(created)
}

/// Get a team and all of its members, active or not.
pub async fn get_team(pool: &DbPool, team_name: &str) -> Result<Team, AppError> {
    let mut conn = pool.acquire().await?;
    load_team(&mut conn, team_name).await
}

/// Flip the active flag of a user.
pub async fn set_user_active(
    pool: &DbPool,
    user_id: &str,
    is_active: bool,
) -> Result<User, AppError> {
    let mut tx = db::begin_exclusive(pool).await?;

    let user = users::set_user_active(&mut tx, user_id, is_active)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("User", user_id))?;

    tx.commit().await?;

    log::info!("[teams] User {} is_active={}", user.user_id, user.is_active);
    Ok(user)
}

/// Add a new user to an existing team.
pub async fn add_user_to_team(
    pool: &DbPool,
    team_name: &str,
    member: &TeamMember,
) -> Result<Team, AppError> {
    let mut tx = db::begin_exclusive(pool).await?;

    if !teams::team_exists(&mut tx, team_name).await? {
        return Err(AppError::not_found_with_id("Team", team_name));
    }

    if users::user_exists(&mut tx, &member.user_id).await? {
        return Err(AppError::conflict(
            ConflictReason::UserExists,
            format!("user {} already exists", member.user_id),
        ));
    }

    users::insert_user(&mut tx, member, team_name).await?;
    let team = load_team(&mut tx, team_name).await?;
    tx.commit().await?;

    log::info!("[teams] Added user {} to team {}", member.user_id, team_name);
    Ok(team)
}

/// Remove a user from a team (hard delete).
///
/// Pull requests authored or reviewed by the user keep the id.
pub async fn remove_user_from_team(
    pool: &DbPool,
    team_name: &str,
    user_id: &str,
) -> Result<Team, AppError> {
    let mut tx = db::begin_exclusive(pool).await?;

    if users::delete_user(&mut tx, user_id, team_name).await? == 0 {
        return Err(AppError::not_found_with_id(
            "TeamMember",
            format!("{}/{}", team_name, user_id),
        ));
    }

    let team = load_team(&mut tx, team_name).await?;
    tx.commit().await?;

    log::info!("[teams] Removed user {} from team {}", user_id, team_name);
    Ok(team)
}

async fn load_team(conn: &mut SqliteConnection, team_name: &str) -> Result<Team, AppError> {
    if !teams::team_exists(&mut *conn, team_name).await? {
        return Err(AppError::not_found_with_id("Team", team_name));
    }

    let members = users::get_users_by_team(conn, team_name).await?;
    Ok(Team {
        team_name: team_name.to_string(),
        members,
    })
}
