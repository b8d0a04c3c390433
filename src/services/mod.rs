//! Business logic services.
//!
//! - `selection`: reviewer selection policy
//! - `teams`: team and user registry
//! - `pull_requests`: pull request lifecycle
//! - `api` / `server`: HTTP request layer
//!
//! The registry and lifecycle know nothing about HTTP; the request layer
//! only translates between JSON and their results.

pub mod api;
pub mod pull_requests;
pub mod selection;
pub mod server;
pub mod teams;

pub use pull_requests::{PullRequestService, Reassignment};
pub use selection::ReviewerPicker;
