//! Mock policy source for testing

use async_trait::async_trait;
use pr_policy::error::{Error, Result};
use pr_policy::platform::PolicySource;
use pr_policy::types::Repository;
use std::collections::HashMap;
use std::sync::Mutex;

/// Call record for `fetch_policy`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub repository: String,
    pub git_ref: Option<String>,
}

/// In-memory policy source
///
/// Features:
/// - Per-ref documents (`None` = default branch)
/// - Call tracking for verification
/// - Error injection for failure path testing
#[derive(Default)]
pub struct MockPolicySource {
    documents: Mutex<HashMap<Option<String>, Vec<u8>>>,
    fetch_calls: Mutex<Vec<FetchCall>>,
    error_on_fetch: Mutex<Option<String>>,
}

impl MockPolicySource {
    /// Create an empty mock (every fetch is `NoRules`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `git_ref`
    pub fn set_policy(&self, git_ref: Option<&str>, content: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(git_ref.map(String::from), content.as_bytes().to_vec());
    }

    /// Make `fetch_policy` return a transport error
    pub fn fail_fetch(&self, msg: &str) {
        *self.error_on_fetch.lock().unwrap() = Some(msg.to_string());
    }

    /// Recorded calls
    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        self.fetch_calls.lock().unwrap().clone()
    }

    /// Assert the refs fetched, in order
    pub fn assert_fetched_refs(&self, expected: &[Option<&str>]) {
        let refs: Vec<Option<String>> = self
            .fetch_calls()
            .into_iter()
            .map(|call| call.git_ref)
            .collect();
        let expected: Vec<Option<String>> =
            expected.iter().map(|r| r.map(String::from)).collect();
        assert_eq!(refs, expected, "fetched refs mismatch");
    }
}

#[async_trait]
impl PolicySource for MockPolicySource {
    async fn fetch_policy(
        &self,
        repository: &Repository,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>> {
        self.fetch_calls.lock().unwrap().push(FetchCall {
            repository: repository.to_string(),
            git_ref: git_ref.map(String::from),
        });

        if let Some(msg) = self.error_on_fetch.lock().unwrap().clone() {
            return Err(Error::GitHubApi(msg));
        }

        self.documents
            .lock()
            .unwrap()
            .get(&git_ref.map(String::from))
            .cloned()
            .ok_or(Error::NoRules)
    }
}
