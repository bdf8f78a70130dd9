//! relman-aws: AWS adapters for relman
//!
//! - [`StsIdentityBroker`]: MFA assume-role through STS
//! - [`CodePipelineProvider`]: pipeline definitions and latest executions
//! - [`CodeCommitPromotionHost`]: environment promotion pull requests
//!
//! Every call takes the role-scoped [`relman_core::SessionCredential`]
//! explicitly and builds its service client from it.

pub mod codecommit;
pub mod codepipeline;
pub mod error;
pub mod session;
pub mod sts;

pub use codecommit::CodeCommitPromotionHost;
pub use codepipeline::CodePipelineProvider;
pub use error::AwsError;
pub use sts::StsIdentityBroker;
