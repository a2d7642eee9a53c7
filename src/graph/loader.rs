//! Model Loading
//!
//! Reads a JSON model document into a validated `Model`.
//!
//! ```json
//! {
//!   "shapes": {
//!     "com.foo#Page": { "type": "list", "member": { "target": "smithy.api#String" } },
//!     "com.foo#Person": {
//!       "type": "structure",
//!       "members": { "name": { "target": "smithy.api#String", "traits": { "smithy.api#required": true } } },
//!       "traits": { "smithy.api#tags": ["public"] }
//!     }
//!   },
//!   "traitDefinitions": { "com.foo#audit": { "shape": "smithy.api#String" } }
//! }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{Model, Shape, ShapeId, ShapeKind, SimpleType, SourceLocation, TraitDefinition, TraitValue};
use crate::error::{ProjectionError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ModelDocument {
    #[serde(default)]
    shapes: BTreeMap<ShapeId, ShapeNode>,
    #[serde(default)]
    trait_definitions: BTreeMap<ShapeId, TraitDefinitionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ShapeNode {
    #[serde(rename = "type")]
    shape_type: String,
    member: Option<MemberNode>,
    key: Option<MemberNode>,
    value: Option<MemberNode>,
    members: Option<BTreeMap<String, MemberNode>>,
    #[serde(default)]
    operations: Vec<ShapeId>,
    #[serde(default)]
    resources: Vec<ShapeId>,
    input: Option<ShapeId>,
    output: Option<ShapeId>,
    #[serde(default)]
    errors: Vec<ShapeId>,
    #[serde(default)]
    traits: BTreeMap<ShapeId, TraitNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MemberNode {
    target: ShapeId,
    #[serde(default)]
    traits: BTreeMap<ShapeId, TraitNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraitDefinitionNode {
    shape: Option<ShapeId>,
    documentation: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Trait values as they appear in documents
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraitNode {
    Flag(bool),
    Text(String),
    List(Vec<String>),
    Struct(BTreeMap<String, String>),
}

/// Load a model document from a file
pub fn load_from_path(path: &Path) -> Result<Model> {
    let content = fs::read_to_string(path)?;
    parse_document(&content, SourceLocation::new(path.display().to_string(), 0, 0))
}

/// Load a model document from a string
pub fn load_from_str(content: &str) -> Result<Model> {
    parse_document(content, SourceLocation::none())
}

fn parse_document(content: &str, location: SourceLocation) -> Result<Model> {
    let deserializer = &mut serde_json::Deserializer::from_str(content);
    let document: ModelDocument = serde_path_to_error::deserialize(deserializer).map_err(|e| {
        let inner = e.inner();
        ProjectionError::MalformedModel {
            location: SourceLocation::new(
                location.filename.clone(),
                u32::try_from(inner.line()).unwrap_or(u32::MAX),
                u32::try_from(inner.column()).unwrap_or(u32::MAX),
            ),
            message: format!("{}: {}", e.path(), inner),
        }
    })?;

    let mut builder = Model::builder();

    for (id, node) in document.shapes {
        for shape in convert_shape(id, node, &location)? {
            builder = builder.add_shape(shape);
        }
    }

    for (id, node) in document.trait_definitions {
        let mut definition = TraitDefinition::new(id).with_source_location(location.clone());
        if let Some(shape) = node.shape {
            definition = definition.with_shape(shape);
        }
        if let Some(docs) = node.documentation {
            definition = definition.with_documentation(docs);
        }
        for tag in node.tags {
            definition = definition.with_tag(tag);
        }
        builder = builder.add_trait_definition(definition);
    }

    builder.build()
}

/// Convert one document shape into the shape plus its explicit member shapes
fn convert_shape(id: ShapeId, node: ShapeNode, location: &SourceLocation) -> Result<Vec<Shape>> {
    let malformed = |message: String| ProjectionError::MalformedModel {
        location: location.clone(),
        message: format!("shape `{}`: {}", id, message),
    };
    let required = |member: Option<MemberNode>, field: &str| {
        member.ok_or_else(|| malformed(format!("`{}` shapes require `{}`", node.shape_type, field)))
    };

    let mut members: Vec<(String, MemberNode)> = Vec::new();

    let kind = match node.shape_type.as_str() {
        "list" | "set" => {
            let member = required(node.member, "member")?;
            let target = member.target.clone();
            members.push(("member".to_string(), member));
            if node.shape_type == "list" {
                ShapeKind::List { member: target }
            } else {
                ShapeKind::Set { member: target }
            }
        }
        "map" => {
            let key = required(node.key, "key")?;
            let value = required(node.value, "value")?;
            let kind = ShapeKind::Map {
                key: key.target.clone(),
                value: value.target.clone(),
            };
            members.push(("key".to_string(), key));
            members.push(("value".to_string(), value));
            kind
        }
        "structure" | "union" => {
            let declared = node.members.unwrap_or_default();
            let targets = declared
                .iter()
                .map(|(name, member)| (name.clone(), member.target.clone()))
                .collect();
            members.extend(declared);
            if node.shape_type == "structure" {
                ShapeKind::Structure { members: targets }
            } else {
                ShapeKind::Union { members: targets }
            }
        }
        "service" => ShapeKind::Service {
            operations: node.operations.into_iter().collect(),
            resources: node.resources.into_iter().collect(),
        },
        "resource" => ShapeKind::Resource {
            operations: node.operations.into_iter().collect(),
            resources: node.resources.into_iter().collect(),
        },
        "operation" => ShapeKind::Operation {
            input: node.input,
            output: node.output,
            errors: node.errors.into_iter().collect(),
        },
        other => match SimpleType::from_name(other) {
            Some(simple) => ShapeKind::Simple(simple),
            None => return Err(malformed(format!("unknown shape type `{}`", other))),
        },
    };

    let mut shape = Shape::new(id.clone(), kind).with_source_location(location.clone());
    for (trait_id, value) in node.traits {
        let value = convert_trait(&trait_id, value).map_err(&malformed)?;
        shape = shape.with_trait(trait_id, value);
    }

    let mut shapes = vec![shape];
    for (name, member) in members {
        let mut member_shape =
            Shape::member(id.with_member(name)?, member.target).with_source_location(location.clone());
        for (trait_id, value) in member.traits {
            let value = convert_trait(&trait_id, value).map_err(&malformed)?;
            member_shape = member_shape.with_trait(trait_id, value);
        }
        shapes.push(member_shape);
    }

    Ok(shapes)
}

fn convert_trait(trait_id: &ShapeId, node: TraitNode) -> std::result::Result<TraitValue, String> {
    match node {
        TraitNode::Flag(true) => Ok(TraitValue::Annotation),
        TraitNode::Flag(false) => Err(format!(
            "annotation trait `{}` must be `true` or `{{}}`",
            trait_id
        )),
        TraitNode::Text(text) => Ok(TraitValue::Text(text)),
        TraitNode::List(values) => Ok(TraitValue::List(values)),
        TraitNode::Struct(fields) if fields.is_empty() => Ok(TraitValue::Annotation),
        TraitNode::Struct(fields) => Ok(TraitValue::Struct(fields)),
    }
}
