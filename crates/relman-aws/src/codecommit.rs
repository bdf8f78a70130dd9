//! CodeCommit promotion host.

use async_trait::async_trait;
use aws_sdk_codecommit::config::{BehaviorVersion, Region};
use aws_sdk_codecommit::error::DisplayErrorContext;
use aws_sdk_codecommit::types::{self, Target};
use tracing::info;

use relman_core::{BranchPair, PromotionHost, Result, SessionCredential};

use crate::error::AwsError;
use crate::session::{ensure_fresh, opt, static_credentials};

const SERVICE: &str = "codecommit";

pub fn promotion_target(
    repository: &str,
    branches: &BranchPair,
) -> std::result::Result<Target, AwsError> {
    Target::builder()
        .repository_name(repository)
        .source_reference(&branches.source)
        .destination_reference(&branches.destination)
        .build()
        .map_err(|e| AwsError::Request(e.to_string()))
}

/// Opens and merges promotion pull requests with the shared-role credential
/// supplied per call.
#[derive(Debug, Clone)]
pub struct CodeCommitPromotionHost {
    region: String,
}

impl CodeCommitPromotionHost {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    fn client(
        &self,
        credential: &SessionCredential,
    ) -> std::result::Result<aws_sdk_codecommit::Client, AwsError> {
        ensure_fresh(credential)?;
        let config = aws_sdk_codecommit::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(static_credentials(credential))
            .build();
        Ok(aws_sdk_codecommit::Client::from_conf(config))
    }
}

#[async_trait]
impl PromotionHost for CodeCommitPromotionHost {
    async fn create_pull_request(
        &self,
        credential: &SessionCredential,
        repository: &str,
        branches: &BranchPair,
        title: &str,
    ) -> Result<String> {
        let output = self
            .client(credential)?
            .create_pull_request()
            .title(title)
            .targets(promotion_target(repository, branches)?)
            .send()
            .await
            .map_err(|e| AwsError::service(SERVICE, DisplayErrorContext(&e)))?;
        let id = opt::<types::PullRequest>(output.pull_request())
            .and_then(|pr| opt::<str>(pr.pull_request_id()))
            .ok_or(AwsError::MissingField {
                service: SERVICE,
                field: "pullRequestId",
            })?;
        info!(%branches, pull_request_id = %id, "codecommit pull request created");
        Ok(id.to_string())
    }

    async fn merge_fast_forward(
        &self,
        credential: &SessionCredential,
        repository: &str,
        pull_request_id: &str,
    ) -> Result<()> {
        self.client(credential)?
            .merge_pull_request_by_fast_forward()
            .pull_request_id(pull_request_id)
            .repository_name(repository)
            .send()
            .await
            .map_err(|e| AwsError::service(SERVICE, DisplayErrorContext(&e)))?;
        info!(pull_request_id, "codecommit pull request fast-forward merged");
        Ok(())
    }
}
