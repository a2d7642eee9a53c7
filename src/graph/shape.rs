//! Shapes and Traits
//!
//! A shape is one node of the model graph. The variant set is closed so
//! every consumer matches exhaustively on `ShapeKind`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::diagnostics::SourceLocation;
use super::prelude;
use super::ShapeId;

/// Member name used by list and set shapes
pub const COLLECTION_MEMBER: &str = "member";
/// Member name of a map key
pub const MAP_KEY_MEMBER: &str = "key";
/// Member name of a map value
pub const MAP_VALUE_MEMBER: &str = "value";

// =============================================================================
// Shape Types
// =============================================================================

/// Primitive shape kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SimpleType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    String,
    Blob,
    Timestamp,
    Document,
}

impl SimpleType {
    pub const ALL: [SimpleType; 13] = [
        Self::Boolean,
        Self::Byte,
        Self::Short,
        Self::Integer,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::BigInteger,
        Self::BigDecimal,
        Self::String,
        Self::Blob,
        Self::Timestamp,
        Self::Document,
    ];

    /// Lower camel case name as written in model documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::BigInteger => "bigInteger",
            Self::BigDecimal => "bigDecimal",
            Self::String => "string",
            Self::Blob => "blob",
            Self::Timestamp => "timestamp",
            Self::Document => "document",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Name of the matching prelude shape (`String`, `BigInteger`, ...)
    pub fn prelude_name(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

/// Discriminant of a shape, used for "same type" comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Simple(SimpleType),
    List,
    Set,
    Map,
    Structure,
    Union,
    Service,
    Resource,
    Operation,
    Member,
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple(simple) => simple.as_str(),
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Structure => "structure",
            Self::Union => "union",
            Self::Service => "service",
            Self::Resource => "resource",
            Self::Operation => "operation",
            Self::Member => "member",
        };
        write!(f, "{}", name)
    }
}

/// Variant-specific shape data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    Simple(SimpleType),
    List { member: ShapeId },
    Set { member: ShapeId },
    Map { key: ShapeId, value: ShapeId },
    Structure { members: BTreeMap<String, ShapeId> },
    Union { members: BTreeMap<String, ShapeId> },
    Service {
        operations: BTreeSet<ShapeId>,
        resources: BTreeSet<ShapeId>,
    },
    Resource {
        operations: BTreeSet<ShapeId>,
        resources: BTreeSet<ShapeId>,
    },
    Operation {
        input: Option<ShapeId>,
        output: Option<ShapeId>,
        errors: BTreeSet<ShapeId>,
    },
    Member { target: ShapeId },
}

/// Edge label for a shape-to-shape relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    /// Aggregate to one of its member shapes
    Member,
    /// Member to the shape it targets
    MemberTarget,
    Operation,
    Resource,
    Input,
    Output,
    Error,
}

// =============================================================================
// Traits
// =============================================================================

/// Value attached to a shape for one trait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraitValue {
    /// Presence-only trait
    Annotation,
    Text(String),
    List(Vec<String>),
    Struct(BTreeMap<String, String>),
}

impl TraitValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

/// Definition of a trait: its value shape (if any), docs and tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitDefinition {
    id: ShapeId,
    shape: Option<ShapeId>,
    documentation: Option<String>,
    tags: BTreeSet<String>,
    source_location: SourceLocation,
}

impl TraitDefinition {
    /// An annotation trait definition (no value shape)
    pub fn new(id: ShapeId) -> Self {
        Self {
            id,
            shape: None,
            documentation: None,
            tags: BTreeSet::new(),
            source_location: SourceLocation::none(),
        }
    }

    pub fn with_shape(mut self, shape: ShapeId) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_documentation(mut self, docs: impl Into<String>) -> Self {
        self.documentation = Some(docs.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_source_location(mut self, location: SourceLocation) -> Self {
        self.source_location = location;
        self
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    /// Value shape of the trait; `None` for annotation traits
    pub fn shape(&self) -> Option<&ShapeId> {
        self.shape.as_ref()
    }

    pub fn is_annotation(&self) -> bool {
        self.shape.is_none()
    }

    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn source_location(&self) -> &SourceLocation {
        &self.source_location
    }
}

// =============================================================================
// Shape
// =============================================================================

/// A node in the model graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    traits: BTreeMap<ShapeId, TraitValue>,
    source_location: SourceLocation,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind) -> Self {
        Self {
            id,
            kind,
            traits: BTreeMap::new(),
            source_location: SourceLocation::none(),
        }
    }

    pub fn simple(id: ShapeId, simple: SimpleType) -> Self {
        Self::new(id, ShapeKind::Simple(simple))
    }

    pub fn list(id: ShapeId, member: ShapeId) -> Self {
        Self::new(id, ShapeKind::List { member })
    }

    pub fn set(id: ShapeId, member: ShapeId) -> Self {
        Self::new(id, ShapeKind::Set { member })
    }

    pub fn map(id: ShapeId, key: ShapeId, value: ShapeId) -> Self {
        Self::new(id, ShapeKind::Map { key, value })
    }

    pub fn structure<I, S>(id: ShapeId, members: I) -> Self
    where
        I: IntoIterator<Item = (S, ShapeId)>,
        S: Into<String>,
    {
        let members = members.into_iter().map(|(n, t)| (n.into(), t)).collect();
        Self::new(id, ShapeKind::Structure { members })
    }

    pub fn union<I, S>(id: ShapeId, members: I) -> Self
    where
        I: IntoIterator<Item = (S, ShapeId)>,
        S: Into<String>,
    {
        let members = members.into_iter().map(|(n, t)| (n.into(), t)).collect();
        Self::new(id, ShapeKind::Union { members })
    }

    pub fn service(
        id: ShapeId,
        operations: impl IntoIterator<Item = ShapeId>,
        resources: impl IntoIterator<Item = ShapeId>,
    ) -> Self {
        Self::new(
            id,
            ShapeKind::Service {
                operations: operations.into_iter().collect(),
                resources: resources.into_iter().collect(),
            },
        )
    }

    pub fn resource(
        id: ShapeId,
        operations: impl IntoIterator<Item = ShapeId>,
        resources: impl IntoIterator<Item = ShapeId>,
    ) -> Self {
        Self::new(
            id,
            ShapeKind::Resource {
                operations: operations.into_iter().collect(),
                resources: resources.into_iter().collect(),
            },
        )
    }

    pub fn operation(
        id: ShapeId,
        input: Option<ShapeId>,
        output: Option<ShapeId>,
        errors: impl IntoIterator<Item = ShapeId>,
    ) -> Self {
        Self::new(
            id,
            ShapeKind::Operation {
                input,
                output,
                errors: errors.into_iter().collect(),
            },
        )
    }

    pub fn member(id: ShapeId, target: ShapeId) -> Self {
        Self::new(id, ShapeKind::Member { target })
    }

    pub fn with_trait(mut self, id: ShapeId, value: TraitValue) -> Self {
        self.traits.insert(id, value);
        self
    }

    /// Append tags to the `tags` trait
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self
            .traits
            .entry(prelude::tags_trait())
            .or_insert_with(|| TraitValue::List(Vec::new()));
        if let TraitValue::List(values) = entry {
            values.extend(tags.into_iter().map(Into::into));
        }
        self
    }

    pub fn with_source_location(mut self, location: SourceLocation) -> Self {
        self.source_location = location;
        self
    }

    // ========== Accessors ==========

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn source_location(&self) -> &SourceLocation {
        &self.source_location
    }

    pub fn shape_type(&self) -> ShapeType {
        match &self.kind {
            ShapeKind::Simple(simple) => ShapeType::Simple(*simple),
            ShapeKind::List { .. } => ShapeType::List,
            ShapeKind::Set { .. } => ShapeType::Set,
            ShapeKind::Map { .. } => ShapeType::Map,
            ShapeKind::Structure { .. } => ShapeType::Structure,
            ShapeKind::Union { .. } => ShapeType::Union,
            ShapeKind::Service { .. } => ShapeType::Service,
            ShapeKind::Resource { .. } => ShapeType::Resource,
            ShapeKind::Operation { .. } => ShapeType::Operation,
            ShapeKind::Member { .. } => ShapeType::Member,
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.kind, ShapeKind::Simple(_))
    }

    pub fn is_member(&self) -> bool {
        matches!(self.kind, ShapeKind::Member { .. })
    }

    pub fn is_service(&self) -> bool {
        matches!(self.kind, ShapeKind::Service { .. })
    }

    /// List or set
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, ShapeKind::List { .. } | ShapeKind::Set { .. })
    }

    pub fn is_map(&self) -> bool {
        matches!(self.kind, ShapeKind::Map { .. })
    }

    /// Target of a member shape
    pub fn member_target(&self) -> Option<&ShapeId> {
        match &self.kind {
            ShapeKind::Member { target } => Some(target),
            _ => None,
        }
    }

    /// Member name to target for aggregate shapes, ordered by member name
    /// for structures and unions
    pub fn member_targets(&self) -> Vec<(&str, &ShapeId)> {
        match &self.kind {
            ShapeKind::List { member } | ShapeKind::Set { member } => {
                vec![(COLLECTION_MEMBER, member)]
            }
            ShapeKind::Map { key, value } => {
                vec![(MAP_KEY_MEMBER, key), (MAP_VALUE_MEMBER, value)]
            }
            ShapeKind::Structure { members } | ShapeKind::Union { members } => {
                members.iter().map(|(name, target)| (name.as_str(), target)).collect()
            }
            ShapeKind::Simple(_)
            | ShapeKind::Service { .. }
            | ShapeKind::Resource { .. }
            | ShapeKind::Operation { .. }
            | ShapeKind::Member { .. } => Vec::new(),
        }
    }

    /// Outgoing shape relationships (trait applications are not included)
    pub fn relationships(&self) -> Vec<(RelationshipKind, ShapeId)> {
        match &self.kind {
            ShapeKind::Simple(_) => Vec::new(),
            ShapeKind::List { .. }
            | ShapeKind::Set { .. }
            | ShapeKind::Map { .. }
            | ShapeKind::Structure { .. }
            | ShapeKind::Union { .. } => self
                .member_targets()
                .into_iter()
                .map(|(name, _)| (RelationshipKind::Member, self.id.member_id(name)))
                .collect(),
            ShapeKind::Member { target } => vec![(RelationshipKind::MemberTarget, target.clone())],
            ShapeKind::Service { operations, resources }
            | ShapeKind::Resource { operations, resources } => operations
                .iter()
                .map(|op| (RelationshipKind::Operation, op.clone()))
                .chain(resources.iter().map(|r| (RelationshipKind::Resource, r.clone())))
                .collect(),
            ShapeKind::Operation { input, output, errors } => input
                .iter()
                .map(|i| (RelationshipKind::Input, i.clone()))
                .chain(output.iter().map(|o| (RelationshipKind::Output, o.clone())))
                .chain(errors.iter().map(|e| (RelationshipKind::Error, e.clone())))
                .collect(),
        }
    }

    // ========== Traits ==========

    /// All applied traits, ordered by trait ID
    pub fn traits(&self) -> &BTreeMap<ShapeId, TraitValue> {
        &self.traits
    }

    pub fn has_trait(&self, id: &ShapeId) -> bool {
        self.traits.contains_key(id)
    }

    pub fn get_trait(&self, id: &ShapeId) -> Option<&TraitValue> {
        self.traits.get(id)
    }

    /// Whether the shape carries the enum trait
    pub fn has_enum_trait(&self) -> bool {
        self.has_trait(&prelude::enum_trait())
    }

    pub fn is_required(&self) -> bool {
        self.has_trait(&prelude::required_trait())
    }

    pub fn json_name(&self) -> Option<&str> {
        self.get_trait(&prelude::json_name_trait())
            .and_then(TraitValue::as_text)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.get_trait(&prelude::tags_trait())
            .and_then(TraitValue::as_list)
            .map(|tags| tags.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }

    // ========== Crate-internal rewriting ==========

    pub(crate) fn set_kind(&mut self, kind: ShapeKind) {
        self.kind = kind;
    }

    pub(crate) fn retain_traits(&mut self, mut keep: impl FnMut(&ShapeId) -> bool) {
        self.traits.retain(|id, _| keep(id));
    }
}
