//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::{PolicySource, PullRequestSource};
use crate::types::{PullRequestSnapshot, Repository};
use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::pulls::ReviewState;
use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use tracing::debug;

/// Default location of the policy document in a repository
pub const DEFAULT_POLICY_PATH: &str = ".mergify.yml";

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    /// Token for raw HTTP requests (policy content)
    token: String,
    /// HTTP client for raw requests (policy content)
    http_client: Client,
    /// API base URL, without trailing slash
    api_url: String,
    /// Path of the policy document inside repositories
    policy_path: String,
}

impl GitHubService {
    /// Create a new GitHub service for github.com or an Enterprise `host`
    pub fn new(token: &str, host: Option<&str>) -> Result<Self> {
        let api_url = host.map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self::with_api_url(token, &api_url)
    }

    /// Create a service talking to an explicit API base URL
    pub fn with_api_url(token: &str, api_url: &str) -> Result<Self> {
        let api_url = api_url.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(&api_url)
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("pr-policy")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.to_string(),
            http_client,
            api_url,
            policy_path: DEFAULT_POLICY_PATH.to_string(),
        })
    }

    /// Read policies from `path` instead of `.mergify.yml`
    #[must_use]
    pub fn with_policy_path(mut self, path: impl Into<String>) -> Self {
        self.policy_path = path.into();
        self
    }

    /// Path of the policy document inside repositories
    pub fn policy_path(&self) -> &str {
        &self.policy_path
    }
}

/// Reduce a review history to the latest verdict per reviewer.
///
/// Returns `(approved_by, changes_requested_by)`, each sorted. Comment-only
/// reviews do not override an earlier verdict.
pub fn latest_reviews<'a>(
    reviews: impl IntoIterator<Item = (&'a str, &'a ReviewState)>,
) -> (Vec<String>, Vec<String>) {
    let mut latest: BTreeMap<&str, &ReviewState> = BTreeMap::new();
    for (login, state) in reviews {
        match state {
            ReviewState::Approved | ReviewState::ChangesRequested | ReviewState::Dismissed => {
                latest.insert(login, state);
            }
            _ => {}
        }
    }

    let with_state = |wanted: &ReviewState| {
        latest
            .iter()
            .filter(|(_, state)| **state == wanted)
            .map(|(login, _)| (*login).to_string())
            .collect::<Vec<_>>()
    };
    (
        with_state(&ReviewState::Approved),
        with_state(&ReviewState::ChangesRequested),
    )
}

#[async_trait]
impl PolicySource for GitHubService {
    async fn fetch_policy(
        &self,
        repository: &Repository,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>> {
        debug!(%repository, git_ref, path = %self.policy_path, "fetching policy");

        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, repository.owner, repository.repo, self.policy_path
        );

        let mut request = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.raw+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(r) = git_ref {
            request = request.query(&[("ref", r)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch policy: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%repository, "no policy document");
            return Err(Error::NoRules);
        }
        if !status.is_success() {
            return Err(Error::GitHubApi(format!(
                "Failed to fetch {}: HTTP {status}",
                self.policy_path
            )));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to read policy: {e}")))?;

        debug!(%repository, bytes = content.len(), "fetched policy");
        Ok(content.to_vec())
    }
}

#[async_trait]
impl PullRequestSource for GitHubService {
    async fn pull_request_snapshot(
        &self,
        repository: &Repository,
        number: u64,
    ) -> Result<PullRequestSnapshot> {
        debug!(%repository, number, "building pull request snapshot");
        let pulls = self.client.pulls(&repository.owner, &repository.repo);

        let pr = pulls.get(number).await?;
        let files_page = pulls.list_files(number).await?;
        let files = self.client.all_pages(files_page).await?;
        let reviews_page = pulls.list_reviews(number).send().await?;
        let reviews = self.client.all_pages(reviews_page).await?;

        let (approved, changes_requested) = latest_reviews(reviews.iter().filter_map(|r| {
            r.user
                .as_ref()
                .map(|u| u.login.as_str())
                .zip(r.state.as_ref())
        }));

        let merged = pr.merged_at.is_some();
        let closed = !matches!(pr.state, Some(octocrab::models::IssueState::Open));

        let snapshot = PullRequestSnapshot::new()
            .with("number", pr.number)
            .with("title", pr.title.clone())
            .with("body", pr.body.clone())
            .with("author", pr.user.as_ref().map(|u| u.login.clone()))
            .with("merged_by", pr.merged_by.as_ref().map(|u| u.login.clone()))
            .with("head", pr.head.ref_field.clone())
            .with("base", pr.base.ref_field.clone())
            .with(
                "label",
                pr.labels
                    .iter()
                    .flatten()
                    .map(|l| l.name.clone())
                    .collect::<Vec<_>>(),
            )
            .with(
                "assignee",
                pr.assignees
                    .iter()
                    .flatten()
                    .map(|a| a.login.clone())
                    .collect::<Vec<_>>(),
            )
            .with("milestone", pr.milestone.as_ref().map(|m| m.title.clone()))
            .with(
                "files",
                files.into_iter().map(|f| f.filename).collect::<Vec<_>>(),
            )
            .with("merged", merged)
            .with("closed", closed)
            .with("draft", pr.draft.unwrap_or(false))
            .with("approved-reviews-by", approved)
            .with("changes-requested-reviews-by", changes_requested);

        debug!(
            number,
            attributes = snapshot.attributes().len(),
            "built pull request snapshot"
        );
        Ok(snapshot)
    }
}
