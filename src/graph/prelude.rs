//! Prelude
//!
//! Built-in shapes and trait definitions that every model contains.
//! Prelude shapes are retained by every filter and never pruned.

use super::shape::{Shape, SimpleType, TraitDefinition};
use super::ShapeId;

pub const PRELUDE_NAMESPACE: &str = "smithy.api";

/// Whether the ID lives in the prelude namespace
pub fn is_prelude_shape(id: &ShapeId) -> bool {
    id.namespace() == PRELUDE_NAMESPACE
}

pub fn enum_trait() -> ShapeId {
    ShapeId::prelude("enum")
}

pub fn tags_trait() -> ShapeId {
    ShapeId::prelude("tags")
}

pub fn documentation_trait() -> ShapeId {
    ShapeId::prelude("documentation")
}

pub fn json_name_trait() -> ShapeId {
    ShapeId::prelude("jsonName")
}

pub fn required_trait() -> ShapeId {
    ShapeId::prelude("required")
}

pub fn sensitive_trait() -> ShapeId {
    ShapeId::prelude("sensitive")
}

/// Prelude shape for a primitive kind (`smithy.api#String`, ...)
pub fn simple_shape_id(simple: SimpleType) -> ShapeId {
    ShapeId::prelude(&simple.prelude_name())
}

/// All prelude shapes, members included
pub fn shapes() -> Vec<Shape> {
    let string = simple_shape_id(SimpleType::String);

    let mut shapes: Vec<Shape> = SimpleType::ALL
        .into_iter()
        .map(|simple| Shape::simple(simple_shape_id(simple), simple))
        .collect();

    let string_list = ShapeId::prelude("StringList");
    shapes.push(Shape::member(string_list.member_id("member"), string.clone()));
    shapes.push(Shape::list(string_list, string.clone()));

    let string_map = ShapeId::prelude("StringMap");
    shapes.push(Shape::member(string_map.member_id("key"), string.clone()));
    shapes.push(Shape::member(string_map.member_id("value"), string.clone()));
    shapes.push(Shape::map(string_map, string.clone(), string));

    shapes
}

/// All prelude trait definitions
pub fn trait_definitions() -> Vec<TraitDefinition> {
    let string = simple_shape_id(SimpleType::String);

    vec![
        TraitDefinition::new(enum_trait())
            .with_shape(ShapeId::prelude("StringMap"))
            .with_documentation("Constrains a string to a fixed set of values."),
        TraitDefinition::new(tags_trait())
            .with_shape(ShapeId::prelude("StringList"))
            .with_documentation("Tags a shape with arbitrary strings."),
        TraitDefinition::new(documentation_trait())
            .with_shape(string.clone())
            .with_documentation("Adds documentation to a shape."),
        TraitDefinition::new(json_name_trait())
            .with_shape(string)
            .with_documentation("Serialized JSON property name of a member."),
        TraitDefinition::new(required_trait())
            .with_documentation("Marks a structure member as required."),
        TraitDefinition::new(sensitive_trait())
            .with_documentation("Marks data as sensitive."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_contains_every_simple_type() {
        let shapes = shapes();
        for simple in SimpleType::ALL {
            let id = simple_shape_id(simple);
            assert!(shapes.iter().any(|s| s.id() == &id), "missing {}", id);
        }
    }

    #[test]
    fn test_trait_definition_shapes_exist_in_prelude() {
        let shapes = shapes();
        for definition in trait_definitions() {
            if let Some(target) = definition.shape() {
                assert!(shapes.iter().any(|s| s.id() == target), "missing {}", target);
            }
        }
    }

    #[test]
    fn test_is_prelude_shape() {
        assert!(is_prelude_shape(&enum_trait()));
        assert!(!is_prelude_shape(&"com.foo#String".parse().unwrap()));
    }
}
