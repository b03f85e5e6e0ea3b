//! Target declarations as they appear in `.targetgen.yml` and in target config files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A deployment target.
///
/// The same type is used for the base declaration in the project file, for
/// the merged-but-unrendered intermediate value and for the final resolved
/// target. Every string field may contain template expressions referencing
/// `target.*` and `cluster.*`.
///
/// `Clone` is the deep copy and `PartialEq` the structural equality used by
/// the fixed-point renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// Target name, usually templated for dynamic targets.
    pub name: String,

    /// Name of the cluster config this target deploys to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    /// Kubernetes context override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Discriminator used by later stages to tell deployments apart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    /// Arguments passed to the deployment.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,

    /// Image overrides, earlier entries take priority.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<FixedImage>,

    /// Arguments a loaded target config is allowed to set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_args: Vec<DynamicArg>,

    /// Where to load the dynamic target config from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_config: Option<ExternalTargetConfig>,
}

impl Target {
    /// Whether this target expands per matching ref of an external repository.
    #[must_use]
    pub fn ref_pattern(&self) -> Option<&str> {
        self.target_config.as_ref().and_then(|tc| tc.ref_pattern.as_deref())
    }

    /// The external project, if any.
    #[must_use]
    pub fn external_project(&self) -> Option<&GitProject> {
        self.target_config.as_ref().and_then(|tc| tc.project.as_ref())
    }
}

/// Declaration of where a target's dynamic config lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTargetConfig {
    /// External git project holding the config. Local project dir when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<GitProject>,

    /// Explicit branch to load the config from.
    ///
    /// After expansion this holds the short name of the ref that produced the target.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// Regular expression selecting branches and tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_pattern: Option<String>,

    /// Config file name overriding the default probing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Reference to an external git repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitProject {
    pub url: String,

    /// Subdirectory of the repository the config file is relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_dir: Option<String>,
}

/// An argument name a target config may set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicArg {
    /// Dotted key path, e.g. `environment` or `resources.replicas`.
    pub name: String,

    /// Optional regular expression the stringified value must fully match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// An image override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedImage {
    pub image: String,
    pub result_image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// Contents of a loaded `target-config.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default)]
    pub args: Option<Map<String, Value>>,

    #[serde(default)]
    pub images: Vec<FixedImage>,
}

/// The project file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub targets: Vec<Target>,
}
