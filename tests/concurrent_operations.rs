//! Concurrency tests.
//!
//! Mutations on the same pull request must serialize: concurrent merges all
//! observe one merge, concurrent reassignments never lose an update, and
//! racing team creations never share a user id.

use futures::future::join_all;
use review_roster_lib::db::pool::DbPool;
use review_roster_lib::error::{AppError, ConflictReason};
use review_roster_lib::models::{NewPullRequest, Team, TeamMember};
use review_roster_lib::services::{teams, PullRequestService, ReviewerPicker};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn member(id: &str) -> TeamMember {
    TeamMember {
        user_id: id.to_string(),
        username: format!("User {}", id),
        is_active: true,
    }
}

async fn setup(members: &[&str]) -> (TempDir, DbPool, Arc<PullRequestService>) {
    let dir = tempdir().unwrap();
    let pool = review_roster_lib::db::initialize(&dir.path().join("test.db"))
        .await
        .unwrap();
    teams::create_team(
        &pool,
        &Team {
            team_name: "platform".to_string(),
            members: members.iter().map(|id| member(id)).collect(),
        },
    )
    .await
    .unwrap();

    let svc = Arc::new(PullRequestService::new(pool.clone(), ReviewerPicker::seeded(17)));
    svc.create(&NewPullRequest {
        pull_request_id: "pr-1".to_string(),
        pull_request_name: "Shared change".to_string(),
        author_id: members[0].to_string(),
    })
    .await
    .unwrap();

    (dir, pool, svc)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_merges_agree_on_one_merge() {
    let (_dir, _pool, svc) = setup(&["a", "b", "c"]).await;

    let tasks = (0..12).map(|_| {
        let svc = svc.clone();
        tokio::spawn(async move { svc.merge("pr-1").await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let merged_at: HashSet<Option<i64>> = results.iter().map(|pr| pr.merged_at).collect();
    assert_eq!(merged_at.len(), 1, "Every caller sees the same merge");
    assert!(results.iter().all(|pr| pr.is_merged()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reassign_of_same_reviewer() {
    let (_dir, _pool, svc) = setup(&["a", "b", "c", "d", "e", "f"]).await;
    let old = svc.get("pr-1").await.unwrap().assigned_reviewers[0].clone();

    let tasks = (0..6).map(|_| {
        let svc = svc.clone();
        let old = old.clone();
        tokio::spawn(async move { svc.reassign("pr-1", &old).await })
    });
    let results: Vec<Result<_, AppError>> =
        join_all(tasks).await.into_iter().map(|j| j.unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "Only the first reassignment finds the reviewer");
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::NotAssigned { .. })));

    let pr = svc.get("pr-1").await.unwrap();
    assert_eq!(pr.assigned_reviewers.len(), 2);
    assert!(!pr.has_reviewer(&old));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reassign_of_both_reviewers() {
    let (_dir, _pool, svc) = setup(&["a", "b", "c", "d", "e", "f"]).await;
    let original = svc.get("pr-1").await.unwrap().assigned_reviewers;

    let tasks = original.iter().cloned().map(|old| {
        let svc = svc.clone();
        tokio::spawn(async move { svc.reassign("pr-1", &old).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let pr = svc.get("pr-1").await.unwrap();
    assert_eq!(pr.assigned_reviewers.len(), 2);
    assert_ne!(pr.assigned_reviewers[0], pr.assigned_reviewers[1]);
    assert!(!pr.has_reviewer("a"));

    // The second reassignment saw the first one's commit, so its result is
    // the final state and may re-pick the reviewer the first one freed.
    let last = results
        .iter()
        .find(|r| r.pull_request.assigned_reviewers == pr.assigned_reviewers)
        .expect("one reassignment observes the final reviewer set");
    assert!(pr.has_reviewer(&last.replaced_by));
    for result in &results {
        assert_eq!(result.pull_request.assigned_reviewers.len(), 2);
        assert!(!result.pull_request.has_reviewer("a"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_merge_racing_reassign() {
    let (_dir, _pool, svc) = setup(&["a", "b", "c", "d"]).await;
    let old = svc.get("pr-1").await.unwrap().assigned_reviewers[0].clone();

    let reassign = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.reassign("pr-1", &old).await })
    };
    let merge = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.merge("pr-1").await })
    };

    let reassigned = reassign.await.unwrap();
    let merged = merge.await.unwrap().unwrap();
    let final_state = svc.get("pr-1").await.unwrap();

    assert!(final_state.is_merged());
    assert_eq!(final_state.assigned_reviewers, merged.assigned_reviewers);
    match reassigned {
        // Reassignment ran first: the merge froze its result
        Ok(result) => assert_eq!(
            result.pull_request.assigned_reviewers,
            final_state.assigned_reviewers
        ),
        Err(e) => assert_eq!(e.conflict_reason(), Some(ConflictReason::PullRequestMerged)),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_team_creates_never_share_a_user() {
    let dir = tempdir().unwrap();
    let pool = review_roster_lib::db::initialize(&dir.path().join("test.db"))
        .await
        .unwrap();

    let tasks = (0..8).map(|i| {
        let pool = pool.clone();
        tokio::spawn(async move {
            teams::create_team(
                &pool,
                &Team {
                    team_name: format!("team-{}", i),
                    members: vec![member(&format!("own-{}", i)), member("shared")],
                },
            )
            .await
        })
    });
    let results: Vec<_> = join_all(tasks).await.into_iter().map(|j| j.unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.conflict_reason(), Some(ConflictReason::UserExists));
    }

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 2);
}
