//! Data models for the application.
//!
//! These models represent the core entities stored in the SQLite database.
//! Row types derive `FromRow` for SQLx queries and `Serialize` for the API.

pub mod pull_request;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{NewPullRequest, PullRequest, PullRequestShort, PullRequestStatus};
pub use team::{Team, TeamMember};
pub use user::User;
