//! GitHub REST client
//!
//! Implements [`SourceHost`] over the v3 REST API. List and search calls
//! follow `page` numbers until a short page comes back.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use relman_core::domain::{
    ManagedRepository, NewPullRequest, PromotionRequest, Result, StateFilter,
};
use relman_core::ports::{PullRequestQuery, RepositoryQuery, SourceHost};

use crate::config::GitHubClientConfig;
use crate::error::GitHubError;
use crate::models::{
    AddLabelsBody, BranchPayload, CreatePullRequestBody, MergeResponse, PullRequestPayload,
    RepositoryPayload, SearchResponse,
};

const API_VERSION: &str = "2022-11-28";

/// Search qualifier string for managed-release repositories.
pub fn search_qualifiers(query: &RepositoryQuery) -> String {
    format!(
        "org:{} is:{} topic:{}",
        query.org,
        query.visibility.as_str(),
        query.topic
    )
}

/// Error for a non-success `status` on `resource`.
pub fn status_error(status: StatusCode, resource: &str, message: String) -> GitHubError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GitHubError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND => GitHubError::NotFound(resource.to_string()),
        _ => GitHubError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// A 200 merge response can still report that nothing was merged.
pub fn merge_outcome(
    resource: &str,
    response: MergeResponse,
) -> std::result::Result<(), GitHubError> {
    if response.merged {
        return Ok(());
    }
    Err(GitHubError::Api {
        status: StatusCode::OK.as_u16(),
        message: format!("{resource} was not merged: {}", response.message),
    })
}

/// GitHub client for release operations
pub struct GitHubClient {
    config: GitHubClientConfig,
    http_client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> std::result::Result<Self, GitHubError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(GitHubClient {
            config,
            http_client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.config.api_url, path))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(self.config.token.expose_secret())
    }

    async fn check(
        response: Response,
        resource: &str,
    ) -> std::result::Result<Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read response body".to_string());
        Err(status_error(status, resource, message))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        resource: &str,
    ) -> std::result::Result<T, GitHubError> {
        let response = Self::check(builder.send().await?, resource).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn search_page(
        &self,
        query: &RepositoryQuery,
        page: u32,
    ) -> std::result::Result<SearchResponse, GitHubError> {
        let builder = self.request(Method::GET, "/search/repositories").query(&[
            ("q", search_qualifiers(query)),
            ("per_page", self.config.page_size.to_string()),
            ("page", page.to_string()),
        ]);
        self.fetch(builder, "repository search").await
    }

    async fn pulls_page(
        &self,
        repo: &ManagedRepository,
        query: &PullRequestQuery,
        page: u32,
    ) -> std::result::Result<Vec<PullRequestPayload>, GitHubError> {
        let state = match query.state {
            StateFilter::Open => "open",
            StateFilter::All => "all",
        };
        let mut params = vec![
            ("state", state.to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", self.config.page_size.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(base) = &query.base {
            params.push(("base", base.clone()));
        }
        let builder = self
            .request(Method::GET, &format!("/repos/{}/pulls", repo.full_name))
            .query(&params);
        self.fetch(builder, &repo.full_name).await
    }

    fn is_last_page(&self, received: usize) -> bool {
        received < self.config.page_size as usize
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn search_repositories(
        &self,
        query: &RepositoryQuery,
    ) -> Result<Vec<ManagedRepository>> {
        let mut repositories = Vec::new();
        let mut page = 1;
        loop {
            let response = self.search_page(query, page).await?;
            if response.incomplete_results {
                warn!(page, "GitHub reported incomplete search results");
            }
            let received = response.items.len();
            repositories.extend(response.items.into_iter().map(ManagedRepository::from));
            debug!(page, received, total = response.total_count, "repository search page");
            if self.is_last_page(received) || repositories.len() as u64 >= response.total_count {
                break;
            }
            page += 1;
        }
        Ok(repositories)
    }

    async fn repository(&self, full_name: &str) -> Result<ManagedRepository> {
        let builder = self.request(Method::GET, &format!("/repos/{full_name}"));
        let payload: RepositoryPayload = self.fetch(builder, full_name).await?;
        Ok(payload.into())
    }

    async fn list_pull_requests(
        &self,
        repo: &ManagedRepository,
        query: &PullRequestQuery,
    ) -> Result<Vec<PromotionRequest>> {
        let mut pulls = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.pulls_page(repo, query, page).await?;
            let received = batch.len();
            pulls.extend(batch.into_iter().map(PromotionRequest::from));
            if self.is_last_page(received) {
                break;
            }
            page += 1;
        }
        Ok(pulls)
    }

    async fn pull_request(
        &self,
        repo: &ManagedRepository,
        number: u64,
    ) -> Result<PromotionRequest> {
        let resource = format!("{}#{number}", repo.full_name);
        let builder = self.request(
            Method::GET,
            &format!("/repos/{}/pulls/{number}", repo.full_name),
        );
        let payload: PullRequestPayload = self.fetch(builder, &resource).await?;
        Ok(payload.into())
    }

    async fn create_pull_request(
        &self,
        repo: &ManagedRepository,
        request: &NewPullRequest,
    ) -> Result<PromotionRequest> {
        let builder = self
            .request(Method::POST, &format!("/repos/{}/pulls", repo.full_name))
            .json(&CreatePullRequestBody::from(request));
        let payload: PullRequestPayload = self.fetch(builder, &repo.full_name).await?;
        Ok(payload.into())
    }

    async fn add_labels(
        &self,
        repo: &ManagedRepository,
        number: u64,
        labels: &[String],
    ) -> Result<()> {
        let builder = self
            .request(
                Method::POST,
                &format!("/repos/{}/issues/{number}/labels", repo.full_name),
            )
            .json(&AddLabelsBody { labels });
        let response = builder.send().await.map_err(GitHubError::from)?;
        Self::check(response, &format!("{}#{number}", repo.full_name)).await?;
        Ok(())
    }

    async fn merge_pull_request(&self, repo: &ManagedRepository, number: u64) -> Result<()> {
        let resource = format!("{}#{number}", repo.full_name);
        let builder = self
            .request(
                Method::PUT,
                &format!("/repos/{}/pulls/{number}/merge", repo.full_name),
            )
            .json(&serde_json::json!({}));
        let response: MergeResponse = self.fetch(builder, &resource).await?;
        merge_outcome(&resource, response)?;
        Ok(())
    }

    async fn branch_head(&self, repo: &ManagedRepository, branch: &str) -> Result<String> {
        let resource = format!("{}@{branch}", repo.full_name);
        let builder = self.request(
            Method::GET,
            &format!("/repos/{}/branches/{branch}", repo.full_name),
        );
        let payload: BranchPayload = self.fetch(builder, &resource).await?;
        Ok(payload.commit.sha)
    }
}
