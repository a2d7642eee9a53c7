//! `includeShapesByTag`: keep only shapes carrying one of the listed tags

use serde::Deserialize;
use std::collections::BTreeSet;

use super::{ConfigurableTransformer, TransformContext};
use crate::error::Result;
use crate::graph::Model;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IncludeShapesByTagConfig {
    pub tags: BTreeSet<String>,
}

/// Removes every non-prelude shape without an included tag
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeShapesByTag;

impl ConfigurableTransformer for IncludeShapesByTag {
    type Config = IncludeShapesByTagConfig;

    fn name(&self) -> &'static str {
        "includeShapesByTag"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["includeByTag"]
    }

    fn legacy_args_key(&self) -> Option<&'static str> {
        Some("tags")
    }

    fn transform_with_config(&self, context: TransformContext, config: Self::Config) -> Result<Model> {
        context.transformer.filter_shapes(&context.model, |shape| {
            shape.tags().into_iter().any(|tag| config.tags.contains(tag))
        })
    }
}
