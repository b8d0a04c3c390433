//! Database queries for pull requests and reviewer assignments.

use crate::models::{NewPullRequest, PullRequest, PullRequestShort, PullRequestStatus};
use sqlx::SqliteConnection;

/// Check whether a pull request id is taken.
pub async fn pull_request_exists(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM pull_requests WHERE pull_request_id = ?)",
    )
    .bind(pull_request_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

/// Insert an OPEN pull request without reviewers.
pub async fn insert_pull_request(
    conn: &mut SqliteConnection,
    pr: &NewPullRequest,
    created_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pr.pull_request_id)
    .bind(&pr.pull_request_name)
    .bind(&pr.author_id)
    .bind(PullRequestStatus::Open)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Assign a reviewer to a pull request.
pub async fn insert_reviewer(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO pr_reviewers (pr_id, user_id) VALUES (?, ?)")
        .bind(pull_request_id)
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Reviewer ids of a pull request, sorted.
pub async fn get_reviewers(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM pr_reviewers WHERE pr_id = ? ORDER BY user_id")
        .bind(pull_request_id)
        .fetch_all(conn)
        .await
}

/// Load a pull request with its reviewers.
///
/// Inside an exclusive transaction this is the locking read: the write lock
/// is already held, so the returned state cannot change until commit.
pub async fn get_pull_request(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Option<PullRequest>, sqlx::Error> {
    let pr = sqlx::query_as::<_, PullRequest>(
        r#"
        SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE pull_request_id = ?
        "#,
    )
    .bind(pull_request_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(mut pr) = pr else {
        return Ok(None);
    };

    pr.assigned_reviewers = get_reviewers(conn, pull_request_id).await?;
    Ok(Some(pr))
}

/// Update status and merge timestamp.
///
/// # Returns
/// Number of rows updated
pub async fn update_status(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    status: PullRequestStatus,
    merged_at: Option<i64>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE pull_requests SET status = ?, merged_at = ? WHERE pull_request_id = ?",
    )
    .bind(status)
    .bind(merged_at)
    .bind(pull_request_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Swap one reviewer for another.
///
/// Both statements run on the caller's connection; run it inside a
/// transaction so no reader observes the intermediate state.
///
/// # Returns
/// `false` if `old_user_id` was not assigned (nothing is changed then)
pub async fn replace_reviewer(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    old_user_id: &str,
    new_user_id: &str,
) -> Result<bool, sqlx::Error> {
    let removed = sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = ? AND user_id = ?")
        .bind(pull_request_id)
        .bind(old_user_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if removed == 0 {
        return Ok(false);
    }

    insert_reviewer(conn, pull_request_id, new_user_id).await?;
    Ok(true)
}

/// Pull requests a user currently reviews, newest first.
pub async fn get_pull_requests_by_reviewer(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<PullRequestShort>, sqlx::Error> {
    sqlx::query_as::<_, PullRequestShort>(
        r#"
        SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
        FROM pull_requests pr
        JOIN pr_reviewers rr ON rr.pr_id = pr.pull_request_id
        WHERE rr.user_id = ?
        ORDER BY pr.created_at DESC, pr.rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}
