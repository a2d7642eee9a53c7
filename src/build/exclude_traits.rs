//! `excludeTraits`: remove trait definitions and every application of them

use serde::Deserialize;
use std::collections::BTreeSet;

use super::{ConfigurableTransformer, TransformContext};
use crate::error::{ProjectionError, Result};
use crate::graph::prelude::PRELUDE_NAMESPACE;
use crate::graph::{Model, ShapeId};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExcludeTraitsConfig {
    /// Absolute trait IDs, or bare names resolved against the prelude
    pub traits: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExcludeTraits;

impl ConfigurableTransformer for ExcludeTraits {
    type Config = ExcludeTraitsConfig;

    fn name(&self) -> &'static str {
        "excludeTraits"
    }

    fn legacy_args_key(&self) -> Option<&'static str> {
        Some("traits")
    }

    fn transform_with_config(&self, context: TransformContext, config: Self::Config) -> Result<Model> {
        let ids = config
            .traits
            .iter()
            .map(|name| {
                resolve_trait_id(name).map_err(|e| ProjectionError::MalformedConfiguration {
                    context: "excludeTraits".to_string(),
                    key: "traits".to_string(),
                    message: e.to_string(),
                    location: context.settings_location.clone(),
                })
            })
            .collect::<Result<Vec<ShapeId>>>()?;

        context.transformer.remove_trait_definitions(&context.model, ids)
    }
}

fn resolve_trait_id(name: &str) -> Result<ShapeId> {
    if name.contains('#') {
        name.parse()
    } else {
        ShapeId::new(PRELUDE_NAMESPACE, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::ProjectionTransformer;
    use crate::graph::{prelude, Shape, SimpleType, TraitDefinition, TraitValue};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        s.parse().unwrap()
    }

    fn model() -> Model {
        Model::builder()
            .add_shape(
                Shape::simple(id("ns.foo#baz"), SimpleType::String)
                    .with_trait(prelude::sensitive_trait(), TraitValue::Annotation)
                    .with_trait(prelude::documentation_trait(), TraitValue::Text("docs".into()))
                    .with_trait(id("ns.foo#audit"), TraitValue::Annotation),
            )
            .add_trait_definition(TraitDefinition::new(id("ns.foo#audit")))
            .build()
            .unwrap()
    }

    #[test]
    fn test_removes_relative_prelude_trait() {
        let context = TransformContext::new(model()).with_settings(json!({"traits": ["documentation"]}));
        let result = ExcludeTraits.transform(context).unwrap();

        let shape = result.expect_shape(&id("ns.foo#baz")).unwrap();
        assert!(!shape.has_trait(&prelude::documentation_trait()));
        assert!(shape.has_trait(&prelude::sensitive_trait()));
        assert!(result.trait_definition(&prelude::documentation_trait()).is_none());
    }

    #[test]
    fn test_removes_absolute_trait() {
        let context = TransformContext::new(model()).with_settings(json!({"traits": ["ns.foo#audit"]}));
        let result = ExcludeTraits.transform(context).unwrap();
        assert!(result.trait_definition(&id("ns.foo#audit")).is_none());
        assert!(!result.expect_shape(&id("ns.foo#baz")).unwrap().has_trait(&id("ns.foo#audit")));
    }

    #[test]
    fn test_invalid_trait_name_is_malformed() {
        let context = TransformContext::new(model()).with_settings(json!({"traits": ["not a trait"]}));
        let err = ExcludeTraits.transform(context).unwrap_err();
        assert!(matches!(err, ProjectionError::MalformedConfiguration { key, .. } if key == "traits"));
    }
}
