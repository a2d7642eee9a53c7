//! `includeNamespaces`: keep only shapes from the listed namespaces

use serde::Deserialize;
use std::collections::BTreeSet;

use super::{ConfigurableTransformer, TransformContext};
use crate::error::Result;
use crate::graph::Model;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IncludeNamespacesConfig {
    /// Namespaces whose shapes survive the filter
    pub namespaces: BTreeSet<String>,
}

/// Removes every non-prelude shape outside the configured namespaces
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeNamespaces;

impl ConfigurableTransformer for IncludeNamespaces {
    type Config = IncludeNamespacesConfig;

    fn name(&self) -> &'static str {
        "includeNamespaces"
    }

    fn legacy_args_key(&self) -> Option<&'static str> {
        Some("namespaces")
    }

    fn transform_with_config(&self, context: TransformContext, config: Self::Config) -> Result<Model> {
        context.transformer.filter_shapes(&context.model, |shape| {
            config.namespaces.contains(shape.id().namespace())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::ProjectionTransformer;
    use crate::error::ProjectionError;
    use crate::graph::{Shape, ShapeId, SimpleType, TraitDefinition};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        s.parse().unwrap()
    }

    fn model() -> Model {
        Model::builder()
            .add_shape(Shape::simple(id("ns.foo#Keep"), SimpleType::String))
            .add_shape(Shape::structure(id("ns.bar#Drop"), [("a", id("smithy.api#String"))]))
            .add_shape(Shape::list(id("ns.baz#Drop"), id("smithy.api#Integer")))
            .build()
            .unwrap()
    }

    #[test]
    fn test_keeps_listed_namespaces_and_prelude() {
        let context = TransformContext::new(model())
            .with_settings(json!({"namespaces": ["ns.foo", "ns.baz"]}));
        let result = IncludeNamespaces.transform(context).unwrap();

        assert!(result.contains(&id("ns.foo#Keep")));
        assert!(result.contains(&id("ns.baz#Drop")));
        assert!(!result.contains(&id("ns.bar#Drop")));
        assert!(!result.contains(&id("ns.bar#Drop$a")));
        assert!(result.contains(&id("smithy.api#String")));
    }

    #[test]
    fn test_trait_definitions_follow_their_value_shapes() {
        let model = Model::builder()
            .add_shape(Shape::simple(id("ns.foo#Keep"), SimpleType::String))
            .add_shape(Shape::simple(id("ns.bar#Value"), SimpleType::String))
            .add_trait_definition(TraitDefinition::new(id("ns.bar#annotation")))
            .add_trait_definition(TraitDefinition::new(id("ns.bar#valued")).with_shape(id("ns.bar#Value")))
            .add_trait_definition(TraitDefinition::new(id("ns.bar#local")).with_shape(id("ns.foo#Keep")))
            .build()
            .unwrap();

        let context = TransformContext::new(model).with_settings(json!({"namespaces": ["ns.foo"]}));
        let result = IncludeNamespaces.transform(context).unwrap();

        assert!(result.trait_definition(&id("ns.bar#annotation")).is_some());
        assert!(result.trait_definition(&id("ns.bar#local")).is_some());
        assert!(result.trait_definition(&id("ns.bar#valued")).is_none());
    }

    #[test]
    fn test_accepts_legacy_args() {
        let context = TransformContext::new(model()).with_settings(json!({"__args": ["ns.foo"]}));
        let result = IncludeNamespaces.transform(context).unwrap();
        assert!(result.contains(&id("ns.foo#Keep")));
        assert!(!result.contains(&id("ns.baz#Drop")));
    }

    #[test]
    fn test_namespaces_are_required() {
        let err = IncludeNamespaces
            .transform(TransformContext::new(model()))
            .unwrap_err();
        assert!(matches!(err, ProjectionError::MalformedConfiguration { context, .. } if context == "includeNamespaces"));
    }
}
