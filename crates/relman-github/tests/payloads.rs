//! Decoding of recorded GitHub REST responses into relman domain types.

use relman_core::domain::{ManagedRepository, PromotionRequest, PullRequestState};
use relman_github::models::{
    BranchPayload, MergeResponse, PullRequestPayload, SearchResponse,
};

const SEARCH: &str = include_str!("fixtures/search_repositories.json");
const PULLS: &str = include_str!("fixtures/pulls_list.json");
const PULL_DETAIL: &str = include_str!("fixtures/pull_detail.json");
const BRANCH: &str = include_str!("fixtures/branch.json");
const MERGE: &str = include_str!("fixtures/merge.json");

#[test]
fn search_response_maps_to_managed_repositories() {
    let response: SearchResponse = serde_json::from_str(SEARCH).unwrap();
    assert_eq!(response.total_count, 2);

    let repos: Vec<ManagedRepository> = response.items.into_iter().map(Into::into).collect();
    assert_eq!(repos[0].full_name, "moxionio/app-a");
    assert_eq!(repos[0].clone_url, "https://github.com/moxionio/app-a.git");
    assert!(repos[0].has_topic("managed-release"));
    assert!(repos[1].matches_filter("APP-B"));
}

#[test]
fn pull_list_states_and_labels() {
    let payloads: Vec<PullRequestPayload> = serde_json::from_str(PULLS).unwrap();
    let pulls: Vec<PromotionRequest> = payloads.into_iter().map(Into::into).collect();

    assert_eq!(pulls[0].state, PullRequestState::Open);
    assert!(pulls[0].has_label("REL-42"));
    assert_eq!(pulls[0].mergeable, None);
    assert_eq!(pulls[0].head, "stage");
    assert_eq!(pulls[0].base, "prod");
    assert_eq!(pulls[0].url, "https://github.com/moxionio/app-a/pull/12");

    assert_eq!(pulls[1].state, PullRequestState::Merged);
    assert_eq!(pulls[2].state, PullRequestState::Draft);
}

#[test]
fn pull_detail_carries_mergeability() {
    let payload: PullRequestPayload = serde_json::from_str(PULL_DETAIL).unwrap();
    let pr: PromotionRequest = payload.into();
    assert_eq!(pr.mergeable, Some(true));
    assert_eq!(pr.state, PullRequestState::Open);
}

#[test]
fn branch_and_merge_responses() {
    let branch: BranchPayload = serde_json::from_str(BRANCH).unwrap();
    assert_eq!(branch.name, "prod");
    assert_eq!(branch.commit.sha, "DEF456aa11");

    let merge: MergeResponse = serde_json::from_str(MERGE).unwrap();
    assert!(merge.merged);
}
