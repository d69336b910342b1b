//! The source-hosting collaborator
//!
//! It serves each repository's tracked-package configuration and accepts
//! build requests, which land as commits on the repository's build branch.

use async_trait::async_trait;
use pacsmith_config::RemoteConfig;
use pacsmith_errors::{ConfigError, Error, RemoteError};
use pacsmith_types::{PkgConfig, RepoRecord};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[async_trait]
pub trait Remote: Send + Sync {
    /// Tracked packages of `repo`, read from its source branch
    async fn pkg_config(&self, repo: &RepoRecord) -> Result<PkgConfig, Error>;

    /// Ask for a build of `repo` with the given commit message
    async fn trigger(&self, repo: &RepoRecord, message: &str) -> Result<(), Error>;
}

/// Body of a build request
#[derive(Debug, Serialize)]
struct TriggerRequest<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    message: &'a str,
}

/// [`Remote`] over plain HTTP
///
/// URL templates are expanded with `{owner}` and `{repo}` (the source
/// repository), `{branch}` (the source branch) and `{file}` (the config
/// file name).
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    config_url: String,
    trigger_url: String,
    token: Option<String>,
    config_file: String,
}

fn expand(template: &str, repo: &RepoRecord, file: &str) -> String {
    template
        .replace("{owner}", &repo.source_owner)
        .replace("{repo}", &repo.source_name)
        .replace("{branch}", &repo.source_branch)
        .replace("{file}", file)
}

impl HttpRemote {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if either URL template is unset,
    /// or an error if the HTTP client cannot be built.
    pub fn from_config(config: &RemoteConfig, timeout: Duration) -> Result<Self, Error> {
        let missing = |field: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            value: String::new(),
        };
        let config_url = config
            .config_url
            .clone()
            .ok_or_else(|| missing("remote.config_url"))?;
        let trigger_url = config
            .trigger_url
            .clone()
            .ok_or_else(|| missing("remote.trigger_url"))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("pacsmith/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| pacsmith_errors::NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self {
            client,
            config_url,
            trigger_url,
            token: config.token.clone(),
            config_file: config.config_file.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn pkg_config(&self, repo: &RepoRecord) -> Result<PkgConfig, Error> {
        let fail = |message: String| RemoteError::ConfigFetch {
            repo: repo.key().to_string(),
            message,
        };

        let url = expand(&self.config_url, repo, &self.config_file);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("{url} returned {status}")).into());
        }

        let body = response.text().await.map_err(|e| fail(e.to_string()))?;
        PkgConfig::from_yaml(&body).map_err(|e| fail(e.to_string()).into())
    }

    async fn trigger(&self, repo: &RepoRecord, message: &str) -> Result<(), Error> {
        let fail = |message: String| RemoteError::BuildTrigger {
            repo: repo.key().to_string(),
            message,
        };

        let url = expand(&self.trigger_url, repo, &self.config_file);
        let body = TriggerRequest {
            source_branch: &repo.source_branch,
            target_branch: &repo.build_branch,
            message,
        };
        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(fail(format!("{url} returned {status}: {}", detail.trim())).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RepoRecord {
        RepoRecord {
            owner: "mikkel".into(),
            name: "repo".into(),
            archs: vec![],
            private: false,
            source_owner: "mikkeloscar".into(),
            source_name: "pkgbuilds".into(),
            source_branch: "master".into(),
            build_branch: "build".into(),
            last_check: None,
        }
    }

    #[test]
    fn test_expand_template() {
        assert_eq!(
            expand(
                "https://raw.example.com/{owner}/{repo}/{branch}/{file}",
                &record(),
                "packages.yml"
            ),
            "https://raw.example.com/mikkeloscar/pkgbuilds/master/packages.yml"
        );
    }

    #[test]
    fn test_requires_urls() {
        let config = RemoteConfig::default();
        let err = HttpRemote::from_config(&config, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref field, .. }) if field == "remote.config_url"
        ));
    }
}
