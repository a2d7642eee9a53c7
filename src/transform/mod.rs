//! Model Transformer
//!
//! Pure graph rewrites shared by the projection transforms. Every operation
//! takes a `&Model` and returns a new validated `Model`; the input is never
//! touched.
//!
//! Removal cascades so the result always satisfies graph closure:
//! - members of removed containers go with them
//! - structure/union members that target removed shapes are dropped
//! - lists, sets and maps whose member target is removed are removed
//! - operation/service/resource references to removed shapes are dropped
//! - trait definitions whose value shape is removed are removed, and
//!   their applications stripped

use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::error::Result;
use crate::graph::prelude::is_prelude_shape;
use crate::graph::{Model, Reachability, Shape, ShapeId, ShapeKind, TraitDefinition};

/// Generic shape graph rewrites
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelTransformer;

impl ModelTransformer {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    // Shape Removal
    // =========================================================================

    /// Remove the given shapes and everything that can no longer stand
    /// without them.
    ///
    /// IDs that are not in the model are ignored.
    pub fn remove_shapes(
        &self,
        model: &Model,
        ids: impl IntoIterator<Item = ShapeId>,
    ) -> Result<Model> {
        let (mut shapes, mut trait_definitions) = model.clone().into_parts();

        let mut removed: HashSet<ShapeId> = ids
            .into_iter()
            .filter(|id| shapes.contains_key(id))
            .collect();
        if removed.is_empty() {
            return Ok(model.clone());
        }

        loop {
            let mut cascade = Vec::new();

            for shape in shapes.values() {
                if removed.contains(shape.id()) {
                    continue;
                }

                if shape.id().has_member() {
                    if removed.contains(&shape.id().without_member()) {
                        cascade.push(shape.id().clone());
                    }
                    continue;
                }

                let lost: Vec<ShapeId> = shape
                    .member_targets()
                    .into_iter()
                    .map(|(name, target)| (shape.id().member_id(name), target))
                    .filter(|(member, target)| removed.contains(member) || removed.contains(*target))
                    .map(|(member, _)| member)
                    .collect();

                if lost.is_empty() {
                    continue;
                }

                // A collection without its element type is meaningless
                if shape.is_collection() || shape.is_map() {
                    cascade.push(shape.id().clone());
                } else {
                    cascade.extend(lost);
                }
            }

            let before = removed.len();
            removed.extend(cascade);
            if removed.len() == before {
                break;
            }
        }

        shapes.retain(|id, _| !removed.contains(id));

        for shape in shapes.values_mut() {
            if let Some(kind) = without_references(shape, &removed) {
                shape.set_kind(kind);
            }
        }

        let orphaned_traits: HashSet<ShapeId> = trait_definitions
            .values()
            .filter(|definition| definition.shape().is_some_and(|s| removed.contains(s)))
            .map(|definition| definition.id().clone())
            .collect();
        trait_definitions.retain(|id, _| !orphaned_traits.contains(id));
        if !orphaned_traits.is_empty() {
            for shape in shapes.values_mut() {
                shape.retain_traits(|id| !orphaned_traits.contains(id));
            }
        }

        debug!(
            shapes = removed.len(),
            trait_definitions = orphaned_traits.len(),
            "Removed shapes"
        );

        Model::from_parts(shapes, trait_definitions)
    }

    /// Keep prelude shapes and every shape matching the predicate.
    ///
    /// Member shapes are never tested; they follow their container.
    pub fn filter_shapes(&self, model: &Model, predicate: impl Fn(&Shape) -> bool) -> Result<Model> {
        let rejected: Vec<ShapeId> = model
            .shapes()
            .filter(|shape| !is_prelude_shape(shape.id()) && !shape.is_member())
            .filter(|shape| !predicate(shape))
            .map(|shape| shape.id().clone())
            .collect();

        self.remove_shapes(model, rejected)
    }

    // =========================================================================
    // Trait Definition Removal
    // =========================================================================

    /// Remove trait definitions and strip their applications from every shape
    pub fn remove_trait_definitions(
        &self,
        model: &Model,
        ids: impl IntoIterator<Item = ShapeId>,
    ) -> Result<Model> {
        let (mut shapes, mut trait_definitions) = model.clone().into_parts();

        let removed: HashSet<ShapeId> = ids
            .into_iter()
            .filter(|id| trait_definitions.contains_key(id))
            .collect();
        if removed.is_empty() {
            return Ok(model.clone());
        }

        trait_definitions.retain(|id, _| !removed.contains(id));
        for shape in shapes.values_mut() {
            shape.retain_traits(|id| !removed.contains(id));
        }

        debug!(trait_definitions = removed.len(), "Removed trait definitions");

        Model::from_parts(shapes, trait_definitions)
    }

    // =========================================================================
    // Unreferenced Removal
    // =========================================================================

    /// Remove removal candidates that nothing reaches.
    ///
    /// Candidates are non-prelude, non-member shapes for which `keep` is
    /// true. Roots are services, prelude shapes, shapes that are not
    /// candidates, and value shapes of present trait definitions.
    pub fn remove_unreferenced_shapes(
        &self,
        model: &Model,
        keep: impl Fn(&Shape) -> bool,
    ) -> Result<Model> {
        let is_candidate =
            |shape: &Shape| !is_prelude_shape(shape.id()) && !shape.is_member() && keep(shape);

        let mut roots: Vec<&ShapeId> = model
            .shapes()
            .filter(|shape| shape.is_service() || (!shape.is_member() && !is_candidate(shape)))
            .map(Shape::id)
            .collect();
        roots.extend(model.trait_definitions().filter_map(TraitDefinition::shape));

        let reached = Reachability::new(model).reachable_from(roots);

        let unreferenced: Vec<ShapeId> = model
            .shapes()
            .filter(|shape| is_candidate(shape) && !reached.contains(shape.id()))
            .map(|shape| shape.id().clone())
            .collect();

        debug!(count = unreferenced.len(), "Unreferenced shapes");
        self.remove_shapes(model, unreferenced)
    }

    /// Remove candidate trait definitions that no shape meaningfully applies.
    ///
    /// An application made from inside the definition's own value-shape
    /// closure does not count unless that shape is also reachable from a
    /// root: a service, the prelude, a shape for which `keep_shape` is
    /// false, or another definition's value shape.
    pub fn remove_unreferenced_trait_definitions(
        &self,
        model: &Model,
        keep_shape: impl Fn(&Shape) -> bool,
        keep: impl Fn(&TraitDefinition) -> bool,
    ) -> Result<Model> {
        let reachability = Reachability::new(model);
        let base_roots: Vec<&ShapeId> = model
            .shapes()
            .filter(|shape| {
                shape.is_service()
                    || is_prelude_shape(shape.id())
                    || (!shape.is_member() && !keep_shape(shape))
            })
            .map(Shape::id)
            .collect();

        let mut unreferenced = Vec::new();

        for definition in model.sorted_trait_definitions() {
            if is_prelude_shape(definition.id()) || !keep(definition) {
                continue;
            }

            let own_closure = match definition.shape() {
                Some(value_shape) => reachability.reachable_from([value_shape]),
                None => HashSet::new(),
            };

            let supported = if own_closure.is_empty() {
                HashSet::new()
            } else {
                let other_values = model
                    .trait_definitions()
                    .filter(|other| other.id() != definition.id())
                    .filter_map(TraitDefinition::shape);
                reachability.reachable_from(base_roots.iter().copied().chain(other_values))
            };

            let referenced = model.shapes().any(|shape| {
                shape.has_trait(definition.id())
                    && (!own_closure.contains(shape.id()) || supported.contains(shape.id()))
            });

            if !referenced {
                unreferenced.push(definition.id().clone());
            }
        }

        debug!(count = unreferenced.len(), "Unreferenced trait definitions");
        self.remove_trait_definitions(model, unreferenced)
    }

    // =========================================================================
    // Pruning
    // =========================================================================

    /// Remove unreferenced shapes and trait definitions until nothing changes.
    ///
    /// Shapes and trait definitions tagged with any export tag are never
    /// removal candidates.
    pub fn prune(&self, model: &Model, export_tags: &BTreeSet<String>) -> Result<Model> {
        let keep_shape = |shape: &Shape| !shape.tags().iter().any(|tag| export_tags.contains(*tag));
        let keep_definition =
            |definition: &TraitDefinition| !definition.tags().any(|tag| export_tags.contains(tag));

        let mut current = model.clone();
        let mut passes = 0usize;

        loop {
            passes += 1;
            let shaken = self.remove_unreferenced_shapes(&current, keep_shape)?;
            let next = self.remove_unreferenced_trait_definitions(&shaken, keep_shape, keep_definition)?;

            if next == current {
                debug!(
                    passes,
                    shapes = next.shape_count(),
                    trait_definitions = next.trait_definition_count(),
                    "Pruning converged"
                );
                return Ok(next);
            }
            current = next;
        }
    }
}

/// Shorthand for `ModelTransformer::prune`
pub fn prune(model: &Model, export_tags: &BTreeSet<String>) -> Result<Model> {
    ModelTransformer::new().prune(model, export_tags)
}

/// Rewritten kind with references to removed shapes dropped, if any changed
fn without_references(shape: &Shape, removed: &HashSet<ShapeId>) -> Option<ShapeKind> {
    let keep = |id: &ShapeId| !removed.contains(id);
    let kind = match shape.kind() {
        ShapeKind::Structure { members } | ShapeKind::Union { members } => {
            let members = members
                .iter()
                .filter(|(name, _)| keep(&shape.id().member_id(name)))
                .map(|(name, target)| (name.clone(), target.clone()))
                .collect();
            if matches!(shape.kind(), ShapeKind::Structure { .. }) {
                ShapeKind::Structure { members }
            } else {
                ShapeKind::Union { members }
            }
        }
        ShapeKind::Service { operations, resources } => ShapeKind::Service {
            operations: operations.iter().filter(|id| keep(id)).cloned().collect(),
            resources: resources.iter().filter(|id| keep(id)).cloned().collect(),
        },
        ShapeKind::Resource { operations, resources } => ShapeKind::Resource {
            operations: operations.iter().filter(|id| keep(id)).cloned().collect(),
            resources: resources.iter().filter(|id| keep(id)).cloned().collect(),
        },
        ShapeKind::Operation { input, output, errors } => ShapeKind::Operation {
            input: input.clone().filter(|id| keep(id)),
            output: output.clone().filter(|id| keep(id)),
            errors: errors.iter().filter(|id| keep(id)).cloned().collect(),
        },
        ShapeKind::Simple(_)
        | ShapeKind::List { .. }
        | ShapeKind::Set { .. }
        | ShapeKind::Map { .. }
        | ShapeKind::Member { .. } => return None,
    };

    (&kind != shape.kind()).then_some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{prelude, SimpleType, TraitValue};

    fn id(s: &str) -> ShapeId {
        s.parse().unwrap()
    }

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn service_model() -> Model {
        Model::builder()
            .add_shape(Shape::service(id("ns#Svc"), [id("ns#Op")], []))
            .add_shape(Shape::operation(id("ns#Op"), Some(id("ns#In")), None, [id("ns#Oops")]))
            .add_shape(Shape::structure(
                id("ns#In"),
                [("names", id("ns#Names")), ("count", id("smithy.api#Integer"))],
            ))
            .add_shape(Shape::list(id("ns#Names"), id("ns#Name")))
            .add_shape(Shape::simple(id("ns#Name"), SimpleType::String))
            .add_shape(Shape::structure(id("ns#Oops"), [("message", id("smithy.api#String"))]))
            .add_shape(Shape::structure(id("ns#Loose"), [("name", id("ns#Name"))]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_remove_shapes_cascades_through_collections_and_members() {
        let transformer = ModelTransformer::new();
        let result = transformer.remove_shapes(&service_model(), [id("ns#Name")]).unwrap();

        // list of Name goes, and so does the structure member that targeted it
        assert!(!result.contains(&id("ns#Names")));
        assert!(!result.contains(&id("ns#Names$member")));
        assert!(!result.contains(&id("ns#In$names")));
        assert!(!result.contains(&id("ns#Loose$name")));

        let input = result.expect_shape(&id("ns#In")).unwrap();
        assert_eq!(input.member_targets(), vec![("count", &id("smithy.api#Integer"))]);
    }

    #[test]
    fn test_remove_shapes_drops_operation_references() {
        let transformer = ModelTransformer::new();
        let result = transformer
            .remove_shapes(&service_model(), [id("ns#Oops"), id("ns#In")])
            .unwrap();

        let op = result.expect_shape(&id("ns#Op")).unwrap();
        assert!(op.relationships().is_empty());
        assert!(!result.contains(&id("ns#In$count")));
    }

    #[test]
    fn test_remove_shapes_removes_trait_definitions_with_missing_value_shape() {
        let model = Model::builder()
            .add_shape(Shape::simple(id("ns#AuditInfo"), SimpleType::String))
            .add_shape(
                Shape::simple(id("ns#Thing"), SimpleType::Integer)
                    .with_trait(id("ns#audit"), TraitValue::Text("x".into())),
            )
            .add_trait_definition(TraitDefinition::new(id("ns#audit")).with_shape(id("ns#AuditInfo")))
            .build()
            .unwrap();

        let result = ModelTransformer::new()
            .remove_shapes(&model, [id("ns#AuditInfo")])
            .unwrap();
        assert!(result.trait_definition(&id("ns#audit")).is_none());
        assert!(!result.expect_shape(&id("ns#Thing")).unwrap().has_trait(&id("ns#audit")));
    }

    #[test]
    fn test_remove_nothing_returns_equal_model() {
        let model = service_model();
        let result = ModelTransformer::new().remove_shapes(&model, [id("ns#Absent")]).unwrap();
        assert_eq!(result, model);
    }

    #[test]
    fn test_filter_shapes_keeps_prelude_and_members_follow_container() {
        let model = service_model();
        let result = ModelTransformer::new()
            .filter_shapes(&model, |shape| shape.id().name() != "Loose")
            .unwrap();

        assert!(!result.contains(&id("ns#Loose")));
        assert!(!result.contains(&id("ns#Loose$name")));
        assert!(result.contains(&id("ns#In$names")));

        let nothing = ModelTransformer::new().filter_shapes(&model, |_| false).unwrap();
        assert!(nothing.contains(&id("smithy.api#String")));
        assert!(nothing.shapes().all(|shape| is_prelude_shape(shape.id())));
    }

    #[test]
    fn test_remove_trait_definitions_strips_applications() {
        let model = Model::builder()
            .add_shape(
                Shape::simple(id("ns#S"), SimpleType::String)
                    .with_trait(prelude::documentation_trait(), TraitValue::Text("docs".into())),
            )
            .build()
            .unwrap();

        let result = ModelTransformer::new()
            .remove_trait_definitions(&model, [prelude::documentation_trait()])
            .unwrap();
        assert!(result.trait_definition(&prelude::documentation_trait()).is_none());
        assert!(result.expect_shape(&id("ns#S")).unwrap().traits().is_empty());
    }

    #[test]
    fn test_unreferenced_shapes_keep_service_closure() {
        let result = ModelTransformer::new()
            .remove_unreferenced_shapes(&service_model(), |_| true)
            .unwrap();

        assert!(!result.contains(&id("ns#Loose")));
        for kept in ["ns#Svc", "ns#Op", "ns#In", "ns#Names", "ns#Name", "ns#Oops"] {
            assert!(result.contains(&id(kept)), "expected {} to survive", kept);
        }
    }

    #[test]
    fn test_non_candidates_are_roots() {
        let result = ModelTransformer::new()
            .remove_unreferenced_shapes(&service_model(), |shape| shape.id().name() != "Loose")
            .unwrap();
        assert!(result.contains(&id("ns#Loose")));
    }

    #[test]
    fn test_self_applied_trait_converges_over_several_passes() {
        // X is only referenced as the value shape of a trait that only X applies
        let model = Model::builder()
            .add_shape(
                Shape::structure(id("ns#X"), [("a", id("smithy.api#String"))])
                    .with_trait(id("ns#onlyUsedByX"), TraitValue::Annotation),
            )
            .add_trait_definition(TraitDefinition::new(id("ns#onlyUsedByX")).with_shape(id("ns#X")))
            .build()
            .unwrap();

        let transformer = ModelTransformer::new();
        let single_pass = transformer.remove_unreferenced_shapes(&model, |_| true).unwrap();
        assert!(single_pass.contains(&id("ns#X")));

        let pruned = transformer.prune(&model, &BTreeSet::new()).unwrap();
        assert!(!pruned.contains(&id("ns#X")));
        assert!(pruned.trait_definition(&id("ns#onlyUsedByX")).is_none());
        assert_eq!(transformer.prune(&pruned, &BTreeSet::new()).unwrap(), pruned);
    }

    #[test]
    fn test_trait_value_shape_removed_after_last_user() {
        let model = Model::builder()
            .add_shape(Shape::simple(id("ns#X"), SimpleType::String))
            .add_shape(
                Shape::simple(id("ns#Y"), SimpleType::Integer)
                    .with_trait(id("ns#t"), TraitValue::Text("v".into())),
            )
            .add_trait_definition(TraitDefinition::new(id("ns#t")).with_shape(id("ns#X")))
            .build()
            .unwrap();

        let pruned = prune(&model, &BTreeSet::new()).unwrap();
        assert!(!pruned.contains(&id("ns#Y")));
        assert!(!pruned.contains(&id("ns#X")));
        assert!(pruned.trait_definition(&id("ns#t")).is_none());
    }

    #[test]
    fn test_trait_used_by_service_closure_survives() {
        let model = Model::builder()
            .add_shape(Shape::service(id("ns#Svc"), [], []).with_trait(id("ns#t"), TraitValue::Annotation))
            .add_shape(Shape::simple(id("ns#Loose"), SimpleType::Integer))
            .add_trait_definition(TraitDefinition::new(id("ns#t")))
            .add_trait_definition(TraitDefinition::new(id("ns#unused")))
            .build()
            .unwrap();

        let pruned = prune(&model, &BTreeSet::new()).unwrap();
        assert!(pruned.trait_definition(&id("ns#t")).is_some());
        assert!(pruned.trait_definition(&id("ns#unused")).is_none());
        assert!(!pruned.contains(&id("ns#Loose")));
        assert!(pruned.contains(&id("ns#Svc")));
    }

    #[test]
    fn test_export_tags_protect_shapes_and_definitions() {
        let model = Model::builder()
            .add_shape(Shape::structure(id("ns#Public"), [("p", id("ns#Payload"))]).with_tags(["export"]))
            .add_shape(Shape::simple(id("ns#Payload"), SimpleType::Blob))
            .add_shape(Shape::simple(id("ns#Private"), SimpleType::Blob).with_tags(["internal"]))
            .add_trait_definition(TraitDefinition::new(id("ns#marker")).with_tag("export"))
            .build()
            .unwrap();

        let pruned = prune(&model, &tags(&["export"])).unwrap();
        assert!(pruned.contains(&id("ns#Public")));
        assert!(pruned.contains(&id("ns#Payload")));
        assert!(!pruned.contains(&id("ns#Private")));
        assert!(pruned.trait_definition(&id("ns#marker")).is_some());
    }

    #[test]
    fn test_exported_closure_keeps_self_valued_trait() {
        let model = Model::builder()
            .add_shape(Shape::structure(id("ns#E"), [("v", id("ns#V"))]).with_tags(["export"]))
            .add_shape(
                Shape::simple(id("ns#V"), SimpleType::String)
                    .with_trait(id("ns#t"), TraitValue::Text("x".into())),
            )
            .add_trait_definition(TraitDefinition::new(id("ns#t")).with_shape(id("ns#V")))
            .build()
            .unwrap();

        let pruned = prune(&model, &tags(&["export"])).unwrap();
        assert!(pruned.contains(&id("ns#E")));
        assert!(pruned.contains(&id("ns#V")));
        assert!(pruned.trait_definition(&id("ns#t")).is_some());
        assert!(pruned.expect_shape(&id("ns#V")).unwrap().has_trait(&id("ns#t")));
        assert_eq!(pruned, model);
    }

    #[test]
    fn test_trait_pass_roots_shapes_that_are_not_candidates() {
        let model = Model::builder()
            .add_shape(
                Shape::structure(id("ns#V"), [("n", id("smithy.api#String"))])
                    .with_trait(id("ns#t"), TraitValue::Annotation),
            )
            .add_trait_definition(TraitDefinition::new(id("ns#t")).with_shape(id("ns#V")))
            .build()
            .unwrap();

        let transformer = ModelTransformer::new();
        let kept = transformer
            .remove_unreferenced_trait_definitions(&model, |_| false, |_| true)
            .unwrap();
        assert!(kept.trait_definition(&id("ns#t")).is_some());

        let removed = transformer
            .remove_unreferenced_trait_definitions(&model, |_| true, |_| true)
            .unwrap();
        assert!(removed.trait_definition(&id("ns#t")).is_none());
        assert!(!removed.expect_shape(&id("ns#V")).unwrap().has_trait(&id("ns#t")));
    }

    #[test]
    fn test_prune_never_removes_prelude() {
        let model = Model::builder().build().unwrap();
        let pruned = prune(&model, &BTreeSet::new()).unwrap();
        assert_eq!(pruned, model);
    }
}
