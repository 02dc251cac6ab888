//! Action interpreter backed by the GitHub REST API via octocrab.
//!
//! Each action maps to exactly one API call. Calls carry a 10 second
//! deadline; the executor owns retry policy, so nothing here retries.
//!
//! Endpoints without a typed octocrab surface (commit statuses, git refs)
//! go through octocrab's generic verb methods, following the same shape as
//! the typed calls.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::effects::{Action, ActionInterpreter, RepoContext, StatusState};
use crate::types::{PrNumber, Sha};

use super::client::OctocrabClient;
use super::error::PlatformError;

/// Deadline for a single GitHub API call.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Pagination safety limit when counting a creator's issues.
const MAX_ISSUE_PAGES: u32 = 10;

async fn with_deadline<T>(
    what: &'static str,
    fut: impl Future<Output = Result<T, PlatformError>>,
) -> Result<T, PlatformError> {
    match tokio::time::timeout(CALL_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(PlatformError::timed_out(format!(
            "{} did not complete within {}s",
            what,
            CALL_TIMEOUT.as_secs()
        ))),
    }
}

impl ActionInterpreter for OctocrabClient {
    type Error = PlatformError;

    async fn interpret(&self, action: Action) -> Result<(), PlatformError> {
        match action {
            Action::Comment { pr, body } => {
                with_deadline("create_comment", post_comment(self, pr, body)).await
            }
            Action::AddLabel { pr, name } => {
                with_deadline("add_labels", add_label(self, pr, name)).await
            }
            Action::SetStatus {
                sha,
                state,
                context,
            } => {
                let sha = sha.ok_or_else(|| {
                    PlatformError::without_source(
                        crate::effects::ErrorKind::NotFound,
                        "set_status requires a head SHA the payload did not carry",
                    )
                })?;
                with_deadline("create_status", set_status(self, sha, state, context)).await
            }
            Action::DeleteRef { git_ref } => {
                let git_ref = git_ref.ok_or_else(|| {
                    PlatformError::without_source(
                        crate::effects::ErrorKind::NotFound,
                        "delete_ref requires a head ref the payload did not carry",
                    )
                })?;
                with_deadline("delete_ref", delete_ref(self, git_ref)).await
            }
        }
    }
}

async fn post_comment(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
) -> Result<(), PlatformError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create_comment(pr.0, body)
        .await
        .map(|_| ())
        .map_err(PlatformError::from_octocrab)
}

async fn add_label(
    client: &OctocrabClient,
    pr: PrNumber,
    name: String,
) -> Result<(), PlatformError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .add_labels(pr.0, &[name])
        .await
        .map(|_| ())
        .map_err(PlatformError::from_octocrab)
}

async fn set_status(
    client: &OctocrabClient,
    sha: Sha,
    state: StatusState,
    context: String,
) -> Result<(), PlatformError> {
    let url = format!(
        "/repos/{}/{}/statuses/{}",
        client.owner(),
        client.repo_name(),
        sha
    );

    #[derive(Serialize)]
    struct StatusRequest {
        state: &'static str,
        context: String,
    }

    let result: Result<serde_json::Value, _> = client
        .inner()
        .post(
            &url,
            Some(&StatusRequest {
                state: state.as_api_str(),
                context,
            }),
        )
        .await;

    result.map(|_| ()).map_err(PlatformError::from_octocrab)
}

async fn delete_ref(client: &OctocrabClient, git_ref: String) -> Result<(), PlatformError> {
    // The qualified ref ("heads/feature-1") slots straight into the path.
    // A non-2xx here usually means the branch is already gone, which the
    // executor records as not-found.
    let url = format!(
        "/repos/{}/{}/git/refs/{}",
        client.owner(),
        client.repo_name(),
        git_ref
    );

    let response = client
        .inner()
        ._delete(&url, None::<&()>)
        .await
        .map_err(PlatformError::from_octocrab)?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(PlatformError::from_status(
            status.as_u16(),
            format!("failed to delete ref {}", git_ref),
        ))
    }
}

// Git ref lookup payload, just enough to reach object.sha.
#[derive(Debug, Deserialize)]
struct RefLookup {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

impl RepoContext for OctocrabClient {
    type Error = PlatformError;

    async fn ref_sha(&self, git_ref: &str) -> Result<Sha, PlatformError> {
        with_deadline("get_ref", async {
            let url = format!(
                "/repos/{}/{}/git/ref/{}",
                self.owner(),
                self.repo_name(),
                git_ref
            );

            let looked_up: RefLookup = self
                .inner()
                .get(&url, None::<&()>)
                .await
                .map_err(PlatformError::from_octocrab)?;

            Ok(Sha::new(looked_up.object.sha))
        })
        .await
    }

    async fn labels(&self, pr: PrNumber) -> Result<Vec<String>, PlatformError> {
        with_deadline("list_labels", async {
            let page = self
                .inner()
                .issues(self.owner(), self.repo_name())
                .list_labels_for_issue(pr.0)
                .per_page(100)
                .send()
                .await
                .map_err(PlatformError::from_octocrab)?;

            Ok(page.items.into_iter().map(|label| label.name).collect())
        })
        .await
    }

    async fn issues_created_by(&self, login: &str) -> Result<u64, PlatformError> {
        with_deadline("count_creator_issues", async {
            let mut count = 0u64;
            let mut page_number = 1u32;

            loop {
                let page = self
                    .inner()
                    .issues(self.owner(), self.repo_name())
                    .list()
                    .creator(login.to_string())
                    .state(octocrab::params::State::All)
                    .per_page(100)
                    .page(page_number)
                    .send()
                    .await
                    .map_err(PlatformError::from_octocrab)?;

                let fetched = page.items.len();
                count += fetched as u64;

                if fetched < 100 || page_number >= MAX_ISSUE_PAGES {
                    break;
                }
                page_number += 1;
            }

            Ok(count)
        })
        .await
    }
}
