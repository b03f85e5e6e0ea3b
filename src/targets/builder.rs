//! Building unrendered targets from expansion requests.

use anyhow::{Context, Result};

use super::args::{DynamicArgValidator, deep_merge};
use super::config_loader::load_target_config;
use super::expander::ExpansionRequest;
use crate::core::TargetError;
use crate::project::{Target, TargetConfig};
use crate::utils::parse_yaml;

/// Build the merged but unrendered target of `request`.
///
/// The base declaration is cloned, never modified. A base target without
/// `targetConfig` is returned as is.
pub async fn build_target(request: &ExpansionRequest) -> Result<Target> {
    let mut target = request.base.as_ref().clone();
    if target.target_config.is_none() {
        return Ok(target);
    }

    let file = load_target_config(request).await?;
    let config: TargetConfig = parse_yaml(&file.bytes, &file.location)?;

    merge_target_config(&mut target, config, request.ref_name.as_deref())
        .with_context(|| format!("Invalid target config {}", file.location))?;
    Ok(target)
}

/// Merge a loaded target config into `target`.
///
/// Every argument is validated before anything is merged, so a rejected
/// config leaves `target` untouched. Loaded images are placed ahead of the
/// existing ones. `ref_name`, if any, is recorded as `targetConfig.ref`.
pub fn merge_target_config(
    target: &mut Target,
    config: TargetConfig,
    ref_name: Option<&str>,
) -> Result<(), TargetError> {
    if let Some(args) = config.args {
        DynamicArgValidator::new(&target.name, &target.dynamic_args)?.check_all(&args)?;
        deep_merge(&mut target.args, args);
    }

    let mut images = config.images;
    images.append(&mut target.images);
    target.images = images;

    if let Some(ref_name) = ref_name {
        target.target_config.get_or_insert_with(Default::default).git_ref = Some(ref_name.to_string());
    }

    Ok(())
}
