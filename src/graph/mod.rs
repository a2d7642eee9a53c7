//! Shape Graph
//!
//! Immutable model of shapes keyed by `ShapeId`, plus the trait definitions
//! those shapes apply. Built once by `ModelBuilder` (or the JSON loader) and
//! replaced, never edited, by each transform.
//!
//! This module is shared between:
//! - Projection transforms (filtering and pruning)
//! - Reference naming (pointer assignment)
//!
//! Both consume the same `Model` so they agree on membership and targets.

pub mod analysis;
pub mod diagnostics;
pub mod loader;
pub mod prelude;
pub mod shape;
mod shape_id;

pub use analysis::{reachable_shapes, Reachability};
pub use diagnostics::{Diagnostics, EventCode, Severity, SourceLocation, ValidationEvent};
pub use loader::{load_from_path, load_from_str};
pub use shape::{
    RelationshipKind, Shape, ShapeKind, ShapeType, SimpleType, TraitDefinition, TraitValue,
};
pub use shape_id::ShapeId;

use std::collections::HashMap;

use crate::error::{ProjectionError, Result};

/// The shape graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    shapes: HashMap<ShapeId, Shape>,
    trait_definitions: HashMap<ShapeId, TraitDefinition>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// Validate and wrap already-assembled parts (used by transforms)
    pub(crate) fn from_parts(
        shapes: HashMap<ShapeId, Shape>,
        trait_definitions: HashMap<ShapeId, TraitDefinition>,
    ) -> Result<Self> {
        let model = Self {
            shapes,
            trait_definitions,
        };

        let diagnostics = model.validate();
        if diagnostics.has_danger() {
            return Err(ProjectionError::InvalidModel(diagnostics));
        }

        Ok(model)
    }

    /// Start a builder holding every shape of this model (prelude included)
    pub fn to_builder(&self) -> ModelBuilder {
        ModelBuilder {
            shapes: self.shapes.values().cloned().collect(),
            trait_definitions: self.trait_definitions.values().cloned().collect(),
            include_prelude: false,
        }
    }

    // ========== Public API ==========

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn trait_definition_count(&self) -> usize {
        self.trait_definitions.len()
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    pub fn get_shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Get a shape that the caller requires to exist
    pub fn expect_shape(&self, id: &ShapeId) -> Result<&Shape> {
        self.shapes
            .get(id)
            .ok_or_else(|| ProjectionError::invalid_reference(id, "shape not found in model"))
    }

    /// All shapes in unspecified order
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    /// All shapes in total `ShapeId` order
    pub fn sorted_shapes(&self) -> Vec<&Shape> {
        let mut shapes: Vec<&Shape> = self.shapes.values().collect();
        shapes.sort_by(|a, b| a.id().cmp(b.id()));
        shapes
    }

    pub fn trait_definition(&self, id: &ShapeId) -> Option<&TraitDefinition> {
        self.trait_definitions.get(id)
    }

    /// All trait definitions in unspecified order
    pub fn trait_definitions(&self) -> impl Iterator<Item = &TraitDefinition> {
        self.trait_definitions.values()
    }

    pub fn sorted_trait_definitions(&self) -> Vec<&TraitDefinition> {
        let mut definitions: Vec<&TraitDefinition> = self.trait_definitions.values().collect();
        definitions.sort_by(|a, b| a.id().cmp(b.id()));
        definitions
    }

    /// Member shapes of an aggregate, in member order
    pub fn members(&self, container: &Shape) -> Vec<&Shape> {
        container
            .member_targets()
            .into_iter()
            .filter_map(|(name, _)| self.shapes.get(&container.id().member_id(name)))
            .collect()
    }

    /// Container of a member shape
    pub fn container_of(&self, member: &Shape) -> Option<&Shape> {
        member
            .id()
            .member()
            .and_then(|_| self.shapes.get(&member.id().without_member()))
    }

    pub(crate) fn into_parts(
        self,
    ) -> (HashMap<ShapeId, Shape>, HashMap<ShapeId, TraitDefinition>) {
        (self.shapes, self.trait_definitions)
    }

    // ========== Validation ==========

    /// Check graph closure: members, targets, and trait references resolve
    fn validate(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        for shape in self.sorted_shapes() {
            self.validate_member(shape, &mut diagnostics);

            for (kind, target) in shape.relationships() {
                if !self.shapes.contains_key(&target) {
                    diagnostics.push(
                        ValidationEvent::new(
                            EventCode::UnresolvedTarget,
                            format!("{:?} relationship targets unknown shape `{}`", kind, target),
                        )
                        .with_shape(shape.id())
                        .with_location(shape.source_location()),
                    );
                }
            }

            for trait_id in shape.traits().keys() {
                if !self.trait_definitions.contains_key(trait_id) {
                    diagnostics.push(
                        ValidationEvent::new(
                            EventCode::UnknownTrait,
                            format!("Trait `{}` is applied but never defined", trait_id),
                        )
                        .with_shape(shape.id())
                        .with_location(shape.source_location()),
                    );
                }
            }
        }

        for definition in self.sorted_trait_definitions() {
            if let Some(value_shape) = definition.shape() {
                if !self.shapes.contains_key(value_shape) {
                    diagnostics.push(
                        ValidationEvent::new(
                            EventCode::UnresolvedTraitShape,
                            format!("Trait value shape `{}` not found", value_shape),
                        )
                        .with_shape(definition.id())
                        .with_location(definition.source_location()),
                    );
                }
            }
        }

        diagnostics
    }

    fn validate_member(&self, shape: &Shape, diagnostics: &mut Diagnostics) {
        let orphan = |reason: String| {
            ValidationEvent::new(EventCode::OrphanMember, reason)
                .with_shape(shape.id())
                .with_location(shape.source_location())
        };

        match (shape.id().member(), shape.member_target()) {
            (None, None) => {}
            (None, Some(_)) => {
                diagnostics.push(orphan("Member shape ID has no member component".to_string()));
            }
            (Some(_), None) => {
                diagnostics.push(orphan(format!(
                    "Member ID used for a {} shape",
                    shape.shape_type()
                )));
            }
            (Some(name), Some(target)) => {
                let container = self.shapes.get(&shape.id().without_member());
                let declared = container.and_then(|c| {
                    c.member_targets()
                        .into_iter()
                        .find(|(member, _)| *member == name)
                        .map(|(_, t)| t)
                });

                match declared {
                    None => diagnostics.push(orphan(
                        "Container does not declare this member".to_string(),
                    )),
                    Some(declared) if declared != target => diagnostics.push(orphan(format!(
                        "Member targets `{}` but its container declares `{}`",
                        target, declared
                    ))),
                    Some(_) => {}
                }
            }
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Assembles a `Model`, synthesizing member shapes and validating closure
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    shapes: Vec<Shape>,
    trait_definitions: Vec<TraitDefinition>,
    include_prelude: bool,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self {
            shapes: Vec::new(),
            trait_definitions: Vec::new(),
            include_prelude: true,
        }
    }
}

impl ModelBuilder {
    pub fn add_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn add_shapes(mut self, shapes: impl IntoIterator<Item = Shape>) -> Self {
        self.shapes.extend(shapes);
        self
    }

    pub fn add_trait_definition(mut self, definition: TraitDefinition) -> Self {
        self.trait_definitions.push(definition);
        self
    }

    /// Skip adding prelude shapes and trait definitions
    pub fn without_prelude(mut self) -> Self {
        self.include_prelude = false;
        self
    }

    /// Build the model; any DANGER finding rejects it with every event collected
    pub fn build(self) -> Result<Model> {
        let mut shapes: HashMap<ShapeId, Shape> = HashMap::new();
        let mut trait_definitions: HashMap<ShapeId, TraitDefinition> = HashMap::new();

        if self.include_prelude {
            for shape in prelude::shapes() {
                shapes.insert(shape.id().clone(), shape);
            }
            for definition in prelude::trait_definitions() {
                trait_definitions.insert(definition.id().clone(), definition);
            }
        }

        for shape in self.shapes {
            shapes.insert(shape.id().clone(), shape);
        }
        for definition in self.trait_definitions {
            trait_definitions.insert(definition.id().clone(), definition);
        }

        let mut synthesized = Vec::new();
        for shape in shapes.values() {
            for (name, target) in shape.member_targets() {
                let member_id = shape.id().with_member(name)?;
                if !shapes.contains_key(&member_id) {
                    synthesized.push(
                        Shape::member(member_id, target.clone())
                            .with_source_location(shape.source_location().clone()),
                    );
                }
            }
        }
        for member in synthesized {
            shapes.insert(member.id().clone(), member);
        }

        Model::from_parts(shapes, trait_definitions)
    }
}
