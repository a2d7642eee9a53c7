//! Default Reference Strategy
//!
//! Canonical pointers computed from a shape's own identity:
//! `root + [PascalCase namespace] + name`, with inlined members resolved
//! through their container.

use regex::Regex;

use super::property_naming::PropertyNamingStrategy;
use super::RefStrategy;
use crate::config::JsonSchemaConfig;
use crate::error::{ProjectionError, Result};
use crate::graph::shape::MAP_KEY_MEMBER;
use crate::graph::{Model, Shape, ShapeId, ShapeKind};

const NON_ALPHANUMERIC: &str = "[^A-Za-z0-9]";

// =============================================================================
// Pointer Formatting
// =============================================================================

/// Root pointer plus name cleanup shared by the strategies
#[derive(Debug, Clone)]
pub(crate) struct PointerFormat {
    root: String,
    keep_namespaces: bool,
    non_alphanumeric: Option<Regex>,
}

impl PointerFormat {
    pub(crate) fn new(config: &JsonSchemaConfig) -> Result<Self> {
        let non_alphanumeric = if config.alphanumeric_only_refs {
            Some(Regex::new(NON_ALPHANUMERIC)?)
        } else {
            None
        };

        Ok(Self {
            root: config.root_pointer(),
            keep_namespaces: config.keep_namespaces,
            non_alphanumeric,
        })
    }

    pub(crate) fn keep_namespaces(&self) -> bool {
        self.keep_namespaces
    }

    /// Remove non-alphanumerics when `alphanumericOnlyRefs` is set
    pub(crate) fn clean(&self, name: &str) -> String {
        match &self.non_alphanumeric {
            Some(pattern) => pattern.replace_all(name, "").into_owned(),
            None => name.to_string(),
        }
    }

    fn shape_pointer(&self, id: &ShapeId) -> String {
        let mut name = String::new();
        if self.keep_namespaces {
            name.push_str(&namespace_prefix(id.namespace()));
        }
        name.push_str(id.name());
        format!("{}{}", self.root, self.clean(&name))
    }
}

/// `smithy.example` -> `SmithyExample`
pub(crate) fn namespace_prefix(namespace: &str) -> String {
    namespace.split('.').map(capitalize).collect()
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

// =============================================================================
// Strategy
// =============================================================================

pub struct DefaultRefStrategy<'a, N> {
    model: &'a Model,
    config: JsonSchemaConfig,
    format: PointerFormat,
    naming: N,
}

impl<'a, N: PropertyNamingStrategy> DefaultRefStrategy<'a, N> {
    pub fn new(model: &'a Model, config: JsonSchemaConfig, naming: N) -> Result<Self> {
        let format = PointerFormat::new(&config)?;
        Ok(Self {
            model,
            config,
            format,
            naming,
        })
    }

    pub fn config(&self) -> &JsonSchemaConfig {
        &self.config
    }

    fn member_pointer(&self, id: &ShapeId) -> Result<String> {
        let member = self.model.expect_shape(id)?;
        if !member.is_member() {
            return Err(ProjectionError::invalid_reference(id, "member ID names a non-member shape"));
        }
        if !self.is_inlined(member)? {
            return Err(ProjectionError::invalid_reference(
                id,
                "cannot generate a pointer for a member that is not inlined",
            ));
        }

        let container = self.model.expect_shape(&id.without_member())?;
        let parent = self.to_pointer(container.id())?;
        let member_name = id.member().unwrap_or_default();

        let pointer = match container.kind() {
            ShapeKind::List { .. } | ShapeKind::Set { .. } => format!("{}/items", parent),
            ShapeKind::Map { .. } if member_name == MAP_KEY_MEMBER => format!("{}/propertyNames", parent),
            ShapeKind::Map { .. } => format!("{}/additionalProperties", parent),
            ShapeKind::Structure { .. } | ShapeKind::Union { .. } => format!(
                "{}/properties/{}",
                parent,
                self.naming.to_property_name(container, member, &self.config)
            ),
            ShapeKind::Simple(_)
            | ShapeKind::Service { .. }
            | ShapeKind::Resource { .. }
            | ShapeKind::Operation { .. }
            | ShapeKind::Member { .. } => {
                return Err(ProjectionError::invalid_reference(
                    id,
                    format!("container is a {} shape", container.shape_type()),
                ))
            }
        };

        Ok(pointer)
    }
}

impl<N: PropertyNamingStrategy> RefStrategy for DefaultRefStrategy<'_, N> {
    fn to_pointer(&self, id: &ShapeId) -> Result<String> {
        if id.has_member() {
            return self.member_pointer(id);
        }
        Ok(self.format.shape_pointer(id))
    }

    fn is_inlined(&self, shape: &Shape) -> Result<bool> {
        match shape.member_target() {
            Some(target) => self.is_inlined(self.model.expect_shape(target)?),
            None => Ok(shape.is_simple() && !shape.has_enum_trait()),
        }
    }
}
