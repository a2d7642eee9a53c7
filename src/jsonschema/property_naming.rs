//! Property names for structure and union members

use crate::config::JsonSchemaConfig;
use crate::graph::Shape;

/// Computes the serialized property name of a member
pub trait PropertyNamingStrategy {
    fn to_property_name(&self, container: &Shape, member: &Shape, config: &JsonSchemaConfig) -> String;
}

/// Member name, or the `jsonName` trait when `useJsonName` is set
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPropertyNaming;

impl PropertyNamingStrategy for DefaultPropertyNaming {
    fn to_property_name(&self, _container: &Shape, member: &Shape, config: &JsonSchemaConfig) -> String {
        if config.use_json_name {
            if let Some(name) = member.json_name() {
                return name.to_string();
            }
        }
        member.id().member().unwrap_or_default().to_string()
    }
}

impl<F> PropertyNamingStrategy for F
where
    F: Fn(&Shape, &Shape, &JsonSchemaConfig) -> String,
{
    fn to_property_name(&self, container: &Shape, member: &Shape, config: &JsonSchemaConfig) -> String {
        self(container, member, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{prelude, ShapeId, TraitValue};

    fn id(s: &str) -> ShapeId {
        s.parse().unwrap()
    }

    #[test]
    fn test_json_name_only_when_enabled() {
        let container = Shape::structure(id("ns#S"), [("fooBar", id("smithy.api#String"))]);
        let member = Shape::member(id("ns#S$fooBar"), id("smithy.api#String"))
            .with_trait(prelude::json_name_trait(), TraitValue::Text("foo_bar".into()));

        let mut config = JsonSchemaConfig::default();
        assert_eq!(DefaultPropertyNaming.to_property_name(&container, &member, &config), "fooBar");

        config.use_json_name = true;
        assert_eq!(DefaultPropertyNaming.to_property_name(&container, &member, &config), "foo_bar");
    }

    #[test]
    fn test_closures_are_strategies() {
        let container = Shape::structure(id("ns#S"), [("a", id("smithy.api#String"))]);
        let member = Shape::member(id("ns#S$a"), id("smithy.api#String"));
        let upper = |_: &Shape, m: &Shape, _: &JsonSchemaConfig| {
            m.id().member().unwrap_or_default().to_uppercase()
        };
        assert_eq!(upper.to_property_name(&container, &member, &JsonSchemaConfig::default()), "A");
    }
}
