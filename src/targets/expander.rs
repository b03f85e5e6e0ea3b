//! Expansion of base targets into concrete resolution requests.
//!
//! A base target without an external project yields a single request against
//! the local project directory. A base target with an external project yields
//! one request per matching ref of that repository:
//!
//! | declared | effective pattern | dynamic |
//! |---|---|---|
//! | `ref: main` | `main` (literal, must exist as a branch) | no |
//! | `refPattern: env/.*` | `env/.*` | yes |
//! | neither | the default branch (literal) | no |

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::ref_matcher::RefMatcher;
use crate::core::TargetError;
use crate::git::strip_auth_from_url;
use crate::project::{GitProject, Target};
use crate::repository::{GitTree, RepositoryProvider};

/// Where the target config of a request is read from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// The local project directory
    Local {
        dir: PathBuf,
    },
    /// A snapshot of one ref of an external repository
    Git {
        tree: Arc<dyn GitTree>,
        /// Subdirectory the config file name is relative to
        sub_dir: Option<String>,
    },
}

/// One base target paired with a concrete place to load its config from.
///
/// Requests are transient: they live for a single resolution pass.
#[derive(Debug, Clone)]
pub struct ExpansionRequest {
    pub base: Arc<Target>,
    pub source: ConfigSource,
    /// Short name of the ref this request was produced for
    pub ref_name: Option<String>,
    /// The pattern that selected `ref_name`
    pub ref_pattern: Option<String>,
    /// Default branch of the repository
    pub default_ref: Option<String>,
}

impl ExpansionRequest {
    /// Whether this request came from a declared `refPattern`.
    ///
    /// Failures of dynamic requests only drop the request, failures of any
    /// other request abort the resolution pass.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.base.ref_pattern().is_some()
    }

    /// Short description for log messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.source {
            ConfigSource::Local {
                ..
            } => format!("target '{}'", self.base.name),
            ConfigSource::Git {
                tree,
                ..
            } => format!("target '{}' ({})", self.base.name, tree.describe()),
        }
    }
}

/// Turns base targets into [`ExpansionRequest`]s.
pub struct TargetExpander {
    project_dir: PathBuf,
    provider: Arc<dyn RepositoryProvider>,
}

impl TargetExpander {
    pub fn new(project_dir: impl Into<PathBuf>, provider: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            project_dir: project_dir.into(),
            provider,
        }
    }

    /// Expand one base target.
    ///
    /// Requests are returned ordered by ref short name.
    pub async fn expand(&self, base: &Arc<Target>) -> Result<Vec<ExpansionRequest>> {
        match base.external_project() {
            Some(project) => self.expand_external(base, project).await,
            None => self.expand_simple(base).map_err(Into::into),
        }
    }

    fn expand_simple(&self, base: &Arc<Target>) -> Result<Vec<ExpansionRequest>, TargetError> {
        if let Some(tc) = &base.target_config
            && (tc.git_ref.is_some() || tc.ref_pattern.is_some())
        {
            return Err(TargetError::config(
                "'ref' and/or 'refPattern' are not allowed for non-external dynamic targets",
            ));
        }

        Ok(vec![ExpansionRequest {
            base: base.clone(),
            source: ConfigSource::Local {
                dir: self.project_dir.clone(),
            },
            ref_name: None,
            ref_pattern: None,
            default_ref: None,
        }])
    }

    async fn expand_external(
        &self,
        base: &Arc<Target>,
        project: &GitProject,
    ) -> Result<Vec<ExpansionRequest>> {
        let url = project.url.as_str();
        let display_url = strip_auth_from_url(url);
        let tc = base.target_config.as_ref();
        let git_ref = tc.and_then(|tc| tc.git_ref.as_deref());
        let ref_pattern = tc.and_then(|tc| tc.ref_pattern.as_deref());

        if git_ref.is_some() && ref_pattern.is_some() {
            return Err(TargetError::config("'refPattern' and 'ref' can't be specified together").into());
        }

        let info = self
            .provider
            .get_entry(url)
            .await
            .with_context(|| format!("Failed to query git project {display_url}"))?;

        let effective = match (git_ref, ref_pattern) {
            (Some(r), _) => {
                if !info.has_branch(r) {
                    return Err(TargetError::config(format!("git project {display_url} has no ref {r}")).into());
                }
                regex::escape(r)
            }
            (None, Some(p)) => p.to_string(),
            (None, None) => {
                let default = info.default_ref.as_deref().ok_or_else(|| {
                    TargetError::config(format!("git project {display_url} seems to have no default branch"))
                })?;
                if !info.has_branch(default) {
                    return Err(
                        TargetError::config(format!("git project {display_url} has no ref {default}")).into()
                    );
                }
                regex::escape(default)
            }
        };

        let matcher = RefMatcher::new(&effective)?;
        let mut matched: Vec<String> =
            info.remote_refs.iter().filter_map(|r| matcher.matches(r)).collect();
        // Refs have no inherent order, sort so duplicate names resolve the same way every run
        matched.sort();
        matched.dedup();

        tracing::debug!(
            "Target '{}': {} of {} ref(s) in {} match '{}'",
            base.name,
            matched.len(),
            info.remote_refs.len(),
            display_url,
            effective
        );

        let dynamic = ref_pattern.is_some();
        let mut requests = Vec::with_capacity(matched.len());
        for short in matched {
            let tree = match self.provider.get_tree(url, &short).await {
                Ok(tree) => tree,
                Err(e) if dynamic => {
                    tracing::warn!(
                        "Skipping ref '{}' of {} for target '{}': {:#}",
                        short,
                        display_url,
                        base.name,
                        e
                    );
                    continue;
                }
                Err(e) => {
                    return Err(e.context(format!("Failed to read ref '{short}' of {display_url}")));
                }
            };

            requests.push(ExpansionRequest {
                base: base.clone(),
                source: ConfigSource::Git {
                    tree,
                    sub_dir: project.sub_dir.clone(),
                },
                ref_name: Some(short),
                ref_pattern: Some(effective.clone()),
                default_ref: info.default_ref.clone(),
            });
        }

        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorKind, classify};
    use crate::project::ExternalTargetConfig;
    use crate::test_utils::{MemoryRepositoryProvider, MemoryRepo};

    const URL: &str = "https://example.com/envs.git";

    fn provider() -> Arc<MemoryRepositoryProvider> {
        let provider = MemoryRepositoryProvider::new();
        provider.add_repo(
            URL,
            MemoryRepo::new("main")
                .branch("main", &[("target-config.yml", "args: {}")])
                .branch("env/prod", &[])
                .branch("env/dev", &[])
                .tag("v1", &[]),
        );
        Arc::new(provider)
    }

    fn external(git_ref: Option<&str>, ref_pattern: Option<&str>) -> Arc<Target> {
        Arc::new(Target {
            name: "{{ target.targetConfig.ref }}".to_string(),
            target_config: Some(ExternalTargetConfig {
                project: Some(GitProject {
                    url: URL.to_string(),
                    sub_dir: None,
                }),
                git_ref: git_ref.map(String::from),
                ref_pattern: ref_pattern.map(String::from),
                file: None,
            }),
            ..Default::default()
        })
    }

    fn refs(requests: &[ExpansionRequest]) -> Vec<&str> {
        requests.iter().filter_map(|r| r.ref_name.as_deref()).collect()
    }

    #[tokio::test]
    async fn test_simple_target_uses_project_dir() {
        let expander = TargetExpander::new("/project", provider());
        let base = Arc::new(Target {
            name: "local".to_string(),
            ..Default::default()
        });
        let requests = expander.expand(&base).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(matches!(&requests[0].source, ConfigSource::Local { dir } if dir == &PathBuf::from("/project")));
        assert!(!requests[0].is_dynamic());
    }

    #[tokio::test]
    async fn test_simple_target_rejects_ref() {
        let expander = TargetExpander::new("/project", provider());
        let base = Arc::new(Target {
            name: "local".to_string(),
            target_config: Some(ExternalTargetConfig {
                ref_pattern: Some(".*".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        let err = expander.expand(&base).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_ref_and_pattern_together_rejected() {
        let expander = TargetExpander::new("/project", provider());
        let err = expander.expand(&external(Some("v1"), Some("v.*"))).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_pattern_expands_sorted() {
        let expander = TargetExpander::new("/project", provider());
        let requests = expander.expand(&external(None, Some("env/.*"))).await.unwrap();
        assert_eq!(refs(&requests), vec!["env/dev", "env/prod"]);
        assert!(requests.iter().all(ExpansionRequest::is_dynamic));
        assert_eq!(requests[0].default_ref.as_deref(), Some("main"));
        assert_eq!(requests[0].ref_pattern.as_deref(), Some("env/.*"));
    }

    #[tokio::test]
    async fn test_pattern_matches_tags() {
        let expander = TargetExpander::new("/project", provider());
        let requests = expander.expand(&external(None, Some("v[0-9]+"))).await.unwrap();
        assert_eq!(refs(&requests), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_default_branch_used_when_nothing_declared() {
        let expander = TargetExpander::new("/project", provider());
        let requests = expander.expand(&external(None, None)).await.unwrap();
        assert_eq!(refs(&requests), vec!["main"]);
        assert!(!requests[0].is_dynamic());
    }

    #[tokio::test]
    async fn test_explicit_ref_must_exist_as_branch() {
        let expander = TargetExpander::new("/project", provider());
        let requests = expander.expand(&external(Some("env/dev"), None)).await.unwrap();
        assert_eq!(refs(&requests), vec!["env/dev"]);

        let err = expander.expand(&external(Some("v1"), None)).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Config);
        assert!(err.to_string().contains("has no ref v1"));
    }

    #[tokio::test]
    async fn test_no_default_branch() {
        let provider = MemoryRepositoryProvider::new();
        provider.add_repo(URL, MemoryRepo::without_default().branch("main", &[]));
        let expander = TargetExpander::new("/project", Arc::new(provider));
        let err = expander.expand(&external(None, None)).await.unwrap_err();
        assert!(err.to_string().contains("no default branch"));

        // An explicit pattern does not need a default branch
        let requests = expander.expand(&external(None, Some("ma.*"))).await.unwrap();
        assert_eq!(refs(&requests), vec!["main"]);
    }

    #[tokio::test]
    async fn test_default_branch_must_exist() {
        let provider = MemoryRepositoryProvider::new();
        provider.add_repo(URL, MemoryRepo::new("master").branch("main", &[]));
        let expander = TargetExpander::new("/project", Arc::new(provider));
        let err = expander.expand(&external(None, None)).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Config);
        assert!(err.to_string().contains("has no ref master"));
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let expander = TargetExpander::new("/project", provider());
        let err = expander.expand(&external(None, Some("env/("))).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Pattern);
    }

    #[tokio::test]
    async fn test_unknown_repository() {
        let expander = TargetExpander::new("/project", Arc::new(MemoryRepositoryProvider::new()));
        assert!(expander.expand(&external(None, Some(".*"))).await.is_err());
    }
}
