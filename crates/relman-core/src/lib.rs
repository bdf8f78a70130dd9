//! relman core library
//!
//! Release state machine and validation protocol, independent of the concrete
//! GitHub and AWS clients. Those plug in through the traits in [`ports`].

pub mod config;
pub mod deployer;
pub mod domain;
pub mod fakes;
pub mod identity;
pub mod initializer;
pub mod obs;
pub mod pipeline_check;
pub mod ports;
pub mod prepare;
pub mod report;
pub mod selector;
pub mod telemetry;
pub mod validator;

pub use config::{resolve_config, ReleaseConfig, RoleProfile};
pub use deployer::ReleaseDeployer;
pub use domain::{
    BranchPair, DeployTarget, ManagedRepository, MfaCode, PromotionRequest, ReleaseError,
    ReleaseId, Result, Role, SessionCredential,
};
pub use identity::assume_role;
pub use initializer::ReleaseInitializer;
pub use pipeline_check::{PipelineStatus, PipelineValidator};
pub use ports::{
    IdentityBroker, PipelineProvider, PromotionHost, PullRequestQuery, RepositoryQuery, SourceHost,
};
pub use prepare::{PrepareRelease, PrepareVerdict};
pub use report::{CheckRecord, Outcome, Phase, ReleaseReport};
pub use selector::RepositorySelector;
pub use validator::{PullRequestStatus, ReleaseValidator};
