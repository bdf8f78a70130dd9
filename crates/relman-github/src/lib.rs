//! relman-github: GitHub source host for relman
//!
//! A thin reqwest client over the GitHub REST API that implements
//! [`relman_core::SourceHost`]: repository search, pull request listing,
//! creation, labeling and merging, and branch head lookup.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::GitHubClient;
pub use config::GitHubClientConfig;
pub use error::GitHubError;
