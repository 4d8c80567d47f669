//! GitHub API helpers for posting the coverage diff on a pull request.

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;

use crate::report::COMMENT_MARKER;

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Pull request to comment on, read from environment variables.
pub struct Context {
    token: String,
    owner: String,
    repo: String,
    pr_number: u64,
    api_url: String,
}

impl Context {
    /// Build a context from `GITHUB_TOKEN`, `GITHUB_REPOSITORY` (`owner/repo`)
    /// and `GITHUB_PULL_REQUEST_ID`. `GITHUB_API_URL` overrides the API host.
    ///
    /// Returns `None` (after logging why) when any of them is missing or
    /// malformed, in which case nothing should be published.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let Some(token) = var("GITHUB_TOKEN") else {
            tracing::warn!("no GITHUB_TOKEN, unable to report back to GitHub pull request");
            return None;
        };
        let Some(repository) = var("GITHUB_REPOSITORY") else {
            tracing::warn!("no GITHUB_REPOSITORY, not reporting to GitHub");
            return None;
        };
        let Some((owner, repo)) = repository.split_once('/') else {
            tracing::warn!(%repository, "GITHUB_REPOSITORY is not owner/repo, not reporting to GitHub");
            return None;
        };
        let Some(pr_id) = var("GITHUB_PULL_REQUEST_ID") else {
            tracing::warn!("no GITHUB_PULL_REQUEST_ID, not reporting to GitHub");
            return None;
        };
        let Ok(pr_number) = pr_id.trim().parse() else {
            tracing::warn!(%pr_id, "GITHUB_PULL_REQUEST_ID is not a valid number, not reporting to GitHub");
            return None;
        };
        let api_url = var("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Some(Self {
            token,
            owner: owner.to_string(),
            repo: repo.to_string(),
            pr_number,
            api_url,
        })
    }

    /// Create the coverage comment, or update the existing one if its body
    /// differs from `body`.
    pub fn publish(&self, body: &str) -> Result<Publication> {
        let comments = self.list_comments()?;
        let outcome = match plan(&comments, body) {
            Plan::Keep => Publication::Unchanged,
            Plan::Edit(id) => {
                self.edit_comment(id, body)?;
                Publication::Updated(id)
            }
            Plan::Create => {
                self.create_comment(body)?;
                Publication::Created
            }
        };
        tracing::info!(
            repo = %format!("{}/{}", self.owner, self.repo),
            pr = self.pr_number,
            ?outcome,
            "coverage comment published"
        );
        Ok(outcome)
    }

    fn list_comments(&self) -> Result<Vec<Comment>> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{}/repos/{}/{}/issues/{}/comments?per_page=100&page={}",
                self.api_url, self.owner, self.repo, self.pr_number, page
            );
            let resp = self
                .request("GET", &url)
                .call()
                .context("Failed to list PR comments")?;

            let comments: Vec<Comment> =
                resp.into_json().context("Failed to parse comments JSON")?;
            if comments.is_empty() {
                break;
            }
            all.extend(comments);
            page += 1;
        }
        Ok(all)
    }

    fn edit_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/comments/{}",
            self.api_url, self.owner, self.repo, comment_id
        );
        let resp = self
            .request("PATCH", &url)
            .send_json(serde_json::json!({ "body": body }));
        check(resp, "updating comment")
    }

    fn create_comment(&self, body: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.owner, self.repo, self.pr_number
        );
        let resp = self
            .request("POST", &url)
            .send_json(serde_json::json!({ "body": body }));
        check(resp, "creating comment")
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        ureq::request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "coverdiff")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }
}

fn check(resp: std::result::Result<ureq::Response, ureq::Error>, action: &str) -> Result<()> {
    match resp {
        Ok(_) => Ok(()),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            bail!("GitHub API error {action} (HTTP {code}): {body}");
        }
        Err(e) => bail!("Failed {action}: {e}"),
    }
}

/// What happened to the pull request comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    /// An identical comment already exists.
    Unchanged,
    /// The existing coverage comment with this id was edited.
    Updated(u64),
    Created,
}

#[derive(Debug, Deserialize)]
struct Comment {
    id: u64,
    body: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Plan {
    Keep,
    Edit(u64),
    Create,
}

/// Decide what to do given the existing comments, in the order GitHub lists them.
fn plan(comments: &[Comment], body: &str) -> Plan {
    for c in comments {
        let Some(existing) = c.body.as_deref() else {
            continue;
        };
        if existing == body {
            return Plan::Keep;
        }
        if existing.starts_with(COMMENT_MARKER) {
            return Plan::Edit(c.id);
        }
    }
    Plan::Create
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn comment(id: u64, body: Option<&str>) -> Comment {
        Comment {
            id,
            body: body.map(str::to_string),
        }
    }

    fn context_from(vars: &[(&str, &str)]) -> Option<Context> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Context::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_plan_create_when_no_coverage_comment() {
        let comments = vec![comment(1, Some("LGTM")), comment(2, None)];
        assert_eq!(plan(&comments, "### coverage diff\nx"), Plan::Create);
        assert_eq!(plan(&[], "### coverage diff\nx"), Plan::Create);
    }

    #[test]
    fn test_plan_keep_identical() {
        let body = "### coverage diff\nCoverage unchanged.\n";
        let comments = vec![comment(1, Some("LGTM")), comment(7, Some(body))];
        assert_eq!(plan(&comments, body), Plan::Keep);
    }

    #[test]
    fn test_plan_edit_existing() {
        let comments = vec![
            comment(1, Some("nice")),
            comment(5, Some("### coverage diff\nCoverage unchanged.\n")),
        ];
        assert_eq!(
            plan(&comments, "### coverage diff\nCoverage increased by 1.00%.\n"),
            Plan::Edit(5)
        );
    }

    #[test]
    fn test_comment_deserialize() {
        let comments: Vec<Comment> =
            serde_json::from_str(r#"[{"id": 3, "body": "hi", "user": {"login": "x"}}, {"id": 4, "body": null}]"#)
                .unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, 3);
        assert_eq!(comments[1].body, None);
    }

    #[test]
    fn test_context_from_env_vars() {
        let ctx = context_from(&[
            ("GITHUB_TOKEN", "secret"),
            ("GITHUB_REPOSITORY", "flipgroup/golang-cover-diff"),
            ("GITHUB_PULL_REQUEST_ID", "42"),
        ])
        .unwrap();
        assert_eq!(ctx.owner, "flipgroup");
        assert_eq!(ctx.repo, "golang-cover-diff");
        assert_eq!(ctx.pr_number, 42);
        assert_eq!(ctx.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_context_api_url_override() {
        let ctx = context_from(&[
            ("GITHUB_TOKEN", "secret"),
            ("GITHUB_REPOSITORY", "o/r"),
            ("GITHUB_PULL_REQUEST_ID", "1"),
            ("GITHUB_API_URL", "https://github.example.com/api/v3/"),
        ])
        .unwrap();
        assert_eq!(ctx.api_url, "https://github.example.com/api/v3");
    }

    #[test]
    fn test_context_missing_config() {
        assert!(context_from(&[]).is_none());
        assert!(context_from(&[("GITHUB_TOKEN", "t"), ("GITHUB_REPOSITORY", "o/r")]).is_none());
        assert!(context_from(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPOSITORY", "no-slash"),
            ("GITHUB_PULL_REQUEST_ID", "1"),
        ])
        .is_none());
        assert!(context_from(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPOSITORY", "o/r"),
            ("GITHUB_PULL_REQUEST_ID", "abc"),
        ])
        .is_none());
        assert!(context_from(&[
            ("GITHUB_TOKEN", ""),
            ("GITHUB_REPOSITORY", "o/r"),
            ("GITHUB_PULL_REQUEST_ID", "1"),
        ])
        .is_none());
    }
}
