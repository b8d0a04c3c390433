//! Pull request lifecycle: creation with reviewer assignment, merge and
//! reviewer reassignment.
//!
//! Every mutation runs as one exclusive transaction, which is also the lock
//! on the pull request: concurrent merges and reassignments of the same pull
//! request are serialized, and no partial write is ever committed.

use crate::db::pool::DbPool;
use crate::db::{self, pull_requests, users};
use crate::error::{AppError, ConflictReason};
use crate::models::{NewPullRequest, PullRequest, PullRequestShort, PullRequestStatus};
use crate::services::selection::ReviewerPicker;
use serde::Serialize;
use sqlx::SqliteConnection;

/// Result of a successful reviewer reassignment.
#[derive(Debug, Clone, Serialize)]
pub struct Reassignment {
    pub pull_request: PullRequest,
    /// User id of the new reviewer.
    pub replaced_by: String,
}

/// Orchestrates the pull request lifecycle against the database.
pub struct PullRequestService {
    pool: DbPool,
    picker: ReviewerPicker,
}

impl PullRequestService {
    pub fn new(pool: DbPool, picker: ReviewerPicker) -> Self {
        Self { pool, picker }
    }

    /// Create an OPEN pull request and assign up to two reviewers from the
    /// author's team.
    ///
    /// Fewer than two eligible teammates is not an error; the pull request
    /// simply gets fewer reviewers.
    pub async fn create(&self, new_pr: &NewPullRequest) -> Result<PullRequest, AppError> {
        let mut tx = db::begin_exclusive(&self.pool).await?;

        if pull_requests::pull_request_exists(&mut tx, &new_pr.pull_request_id).await? {
            return Err(AppError::conflict(
                ConflictReason::PullRequestExists,
                format!("pull request {} already exists", new_pr.pull_request_id),
            ));
        }

        let author = users::get_user(&mut tx, &new_pr.author_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("Author", &new_pr.author_id))?;

        let candidates =
            users::get_active_users_by_team(&mut tx, &author.team_name, &[author.user_id.as_str()])
                .await?;
        let pool_size = candidates.len();
        let reviewers = self.picker.pick_for_creation(candidates);

        pull_requests::insert_pull_request(&mut tx, new_pr, db::now_millis()).await?;
        for reviewer in &reviewers {
            pull_requests::insert_reviewer(&mut tx, &new_pr.pull_request_id, &reviewer.user_id)
                .await?;
        }

        let created = load_pull_request(&mut tx, &new_pr.pull_request_id).await?;
        tx.commit().await?;

        log::debug!(
            "[pull_requests] Picked {} of {} candidates from team {}",
            reviewers.len(),
            pool_size,
            author.team_name
        );
        log::info!(
            "[pull_requests] Created {} by {} with reviewers {:?}",
            created.pull_request_id,
            created.author_id,
            created.assigned_reviewers
        );
        Ok(created)
    }

    /// Merge a pull request. Merging an already merged pull request returns
    /// its current state untouched.
    pub async fn merge(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        let mut tx = db::begin_exclusive(&self.pool).await?;

        let pr = load_pull_request(&mut tx, pull_request_id).await?;
        if pr.is_merged() {
            log::debug!("[pull_requests] {} already merged", pull_request_id);
            return Ok(pr);
        }

        pull_requests::update_status(
            &mut tx,
            pull_request_id,
            PullRequestStatus::Merged,
            Some(db::now_millis()),
        )
        .await?;

        let merged = load_pull_request(&mut tx, pull_request_id).await?;
        tx.commit().await?;

        log::info!("[pull_requests] Merged {}", pull_request_id);
        Ok(merged)
    }

    /// Replace one reviewer with a random eligible teammate of theirs.
    ///
    /// Eligible means active, in the old reviewer's team, and neither the
    /// author nor any current reviewer.
    pub async fn reassign(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
    ) -> Result<Reassignment, AppError> {
        let mut tx = db::begin_exclusive(&self.pool).await?;

        let pr = load_pull_request(&mut tx, pull_request_id).await?;

        if pr.is_merged() {
            return Err(AppError::conflict(
                ConflictReason::PullRequestMerged,
                format!("cannot reassign on merged pull request {}", pull_request_id),
            ));
        }

        if !pr.has_reviewer(old_user_id) {
            return Err(AppError::not_assigned(pull_request_id, old_user_id));
        }

        let old_reviewer = users::get_user(&mut tx, old_user_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("User", old_user_id))?;

        let mut exclude: Vec<&str> = pr.assigned_reviewers.iter().map(String::as_str).collect();
        exclude.push(pr.author_id.as_str());

        let candidates =
            users::get_active_users_by_team(&mut tx, &old_reviewer.team_name, &exclude).await?;

        let replacement = self.picker.pick_for_reassignment(candidates).ok_or_else(|| {
            AppError::conflict(
                ConflictReason::NoCandidate,
                format!(
                    "no active replacement candidate in team {}",
                    old_reviewer.team_name
                ),
            )
        })?;

        if !pull_requests::replace_reviewer(
            &mut tx,
            pull_request_id,
            old_user_id,
            &replacement.user_id,
        )
        .await?
        {
            // Unreachable while the exclusive transaction is held.
            return Err(AppError::internal(format!(
                "reviewer {} disappeared from {} during reassignment",
                old_user_id, pull_request_id
            )));
        }

        let updated = load_pull_request(&mut tx, pull_request_id).await?;
        tx.commit().await?;

        log::info!(
            "[pull_requests] Reassigned reviewer on {}: {} -> {}",
            pull_request_id,
            old_user_id,
            replacement.user_id
        );
        Ok(Reassignment {
            pull_request: updated,
            replaced_by: replacement.user_id,
        })
    }

    /// Pull requests the user currently reviews, newest first.
    ///
    /// Unknown users simply have none.
    pub async fn list_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequestShort>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Ok(pull_requests::get_pull_requests_by_reviewer(&mut conn, user_id).await?)
    }

    /// Fetch a single pull request.
    pub async fn get(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        let mut conn = self.pool.acquire().await?;
        load_pull_request(&mut conn, pull_request_id).await
    }
}

async fn load_pull_request(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<PullRequest, AppError> {
    pull_requests::get_pull_request(conn, pull_request_id)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("PullRequest", pull_request_id))
}
