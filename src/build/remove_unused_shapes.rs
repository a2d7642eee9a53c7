//! `removeUnusedShapes`: prune shapes and trait definitions that no service
//! reaches, unless they carry an export tag

use serde::Deserialize;
use std::collections::BTreeSet;

use super::{ConfigurableTransformer, TransformContext};
use crate::error::Result;
use crate::graph::Model;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoveUnusedShapesConfig {
    /// Tags that export otherwise unreferenced shapes and trait definitions
    #[serde(default)]
    pub export_tagged: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveUnusedShapes;

impl ConfigurableTransformer for RemoveUnusedShapes {
    type Config = RemoveUnusedShapesConfig;

    fn name(&self) -> &'static str {
        "removeUnusedShapes"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["treeShaker"]
    }

    fn legacy_args_key(&self) -> Option<&'static str> {
        Some("exportTagged")
    }

    fn transform_with_config(&self, context: TransformContext, config: Self::Config) -> Result<Model> {
        context.transformer.prune(&context.model, &config.export_tagged)
    }
}
