//! Deconflicting Strategy
//!
//! Wraps a delegate strategy and guarantees that no two non-equivalent
//! shapes share a pointer. All shapes are scanned once, in `ShapeId` order,
//! when the strategy is built:
//! - the first shape to produce a pointer claims it
//! - a later simple shape identical in type and traits is elided onto it
//! - a later simple, collection or map shape gets a new pointer: the
//!   namespace-qualified name first, then `2`, `3`, ... suffixes
//! - any other collision fails with `ConflictingShapeName`

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

use super::default_strategy::{namespace_prefix, PointerFormat};
use super::RefStrategy;
use crate::config::JsonSchemaConfig;
use crate::error::{ProjectionError, Result};
use crate::graph::{Diagnostics, EventCode, Model, Shape, ShapeId, ShapeKind, ValidationEvent};

pub struct DeconflictingStrategy<'a, D> {
    model: &'a Model,
    delegate: D,
    /// Assignments made by the up-front scan
    pointers: HashMap<ShapeId, String>,
    /// Pointer to the shape that claimed it
    claimed: HashMap<String, ShapeId>,
    /// Pointers computed on demand after construction
    cache: RwLock<HashMap<ShapeId, String>>,
    diagnostics: Diagnostics,
}

impl<'a, D: RefStrategy> DeconflictingStrategy<'a, D> {
    pub fn new(model: &'a Model, delegate: D, config: &JsonSchemaConfig) -> Result<Self> {
        let format = PointerFormat::new(config)?;
        let mut strategy = Self {
            model,
            delegate,
            pointers: HashMap::new(),
            claimed: HashMap::new(),
            cache: RwLock::new(HashMap::new()),
            diagnostics: Diagnostics::new(),
        };

        // Sorted so the same model always yields the same winners
        for shape in model.sorted_shapes() {
            if is_ignored_shape(shape) {
                continue;
            }
            strategy.assign(shape, &format)?;
        }

        debug!(
            pointers = strategy.pointers.len(),
            definitions = strategy.claimed.len(),
            "Computed JSON schema pointers"
        );

        Ok(strategy)
    }

    fn assign(&mut self, shape: &Shape, format: &PointerFormat) -> Result<()> {
        let pointer = self.delegate.to_pointer(shape.id())?;

        let Some(existing_id) = self.claimed.get(&pointer).cloned() else {
            self.claim(shape.id(), pointer);
            return Ok(());
        };
        let existing = self.model.expect_shape(&existing_id)?;

        if can_elide(existing, shape) {
            info!(
                "Eliding `{}` into `{}` since they are equivalent; both use the JSON schema pointer `{}`",
                shape.id(),
                existing_id,
                pointer
            );
            self.diagnostics.push(
                ValidationEvent::new(
                    EventCode::ElidedShape,
                    format!("Shares the JSON schema pointer `{}` with `{}`", pointer, existing_id),
                )
                .with_shape(shape.id())
                .with_location(shape.source_location()),
            );
            self.pointers.insert(shape.id().clone(), pointer);
            return Ok(());
        }

        if !is_safe_to_deconflict(shape) {
            return Err(ProjectionError::ConflictingShapeName {
                shape: shape.id().clone(),
                existing: existing_id,
                pointer,
            });
        }

        let deconflicted = self.next_free_pointer(&pointer, shape.id(), format);
        info!(
            "De-conflicted `{}` JSON schema pointer from `{}` to `{}`",
            shape.id(),
            pointer,
            deconflicted
        );
        self.diagnostics.push(
            ValidationEvent::new(
                EventCode::DeconflictedPointer,
                format!(
                    "Pointer `{}` is taken by `{}`; using `{}`",
                    pointer, existing_id, deconflicted
                ),
            )
            .with_shape(shape.id())
            .with_location(shape.source_location()),
        );
        self.claim(shape.id(), deconflicted);
        Ok(())
    }

    fn claim(&mut self, id: &ShapeId, pointer: String) {
        self.claimed.insert(pointer.clone(), id.clone());
        self.pointers.insert(id.clone(), pointer);
    }

    fn next_free_pointer(&self, pointer: &str, id: &ShapeId, format: &PointerFormat) -> String {
        if !format.keep_namespaces() {
            let qualified = format!("{}{}", pointer, format.clean(&namespace_prefix(id.namespace())));
            if !self.claimed.contains_key(&qualified) {
                return qualified;
            }
        }

        (2..)
            .map(|suffix| format!("{}{}", pointer, suffix))
            .find(|candidate| !self.claimed.contains_key(candidate))
            .unwrap_or_else(|| pointer.to_string())
    }

    /// Non-fatal events recorded while assigning pointers
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Every precomputed assignment in `ShapeId` order
    pub fn pointers(&self) -> Vec<(&ShapeId, &str)> {
        let mut pointers: Vec<(&ShapeId, &str)> = self
            .pointers
            .iter()
            .map(|(id, pointer)| (id, pointer.as_str()))
            .collect();
        pointers.sort_by(|a, b| a.0.cmp(b.0));
        pointers
    }

    fn compute_pointer(&self, id: &ShapeId) -> Result<String> {
        if !id.has_member() {
            return self.delegate.to_pointer(id);
        }

        // Rebase the delegate's member path onto the container's assignment
        let container = id.without_member();
        let container_pointer = self.to_pointer(&container)?;
        let delegate_container = self.delegate.to_pointer(&container)?;
        let delegate_member = self.delegate.to_pointer(id)?;

        Ok(match delegate_member.strip_prefix(&delegate_container) {
            Some(suffix) => format!("{}{}", container_pointer, suffix),
            None => delegate_member,
        })
    }
}

impl<D: RefStrategy> RefStrategy for DeconflictingStrategy<'_, D> {
    fn to_pointer(&self, id: &ShapeId) -> Result<String> {
        if let Some(pointer) = self.pointers.get(id) {
            return Ok(pointer.clone());
        }
        if let Ok(cache) = self.cache.read() {
            if let Some(pointer) = cache.get(id) {
                return Ok(pointer.clone());
            }
        }

        let pointer = self.compute_pointer(id)?;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id.clone(), pointer.clone());
        }
        Ok(pointer)
    }

    fn is_inlined(&self, shape: &Shape) -> Result<bool> {
        self.delegate.is_inlined(shape)
    }
}

/// Shapes with no JSON schema definition of their own
fn is_ignored_shape(shape: &Shape) -> bool {
    matches!(
        shape.kind(),
        ShapeKind::Service { .. }
            | ShapeKind::Resource { .. }
            | ShapeKind::Operation { .. }
            | ShapeKind::Member { .. }
    )
}

fn can_elide(existing: &Shape, shape: &Shape) -> bool {
    if existing.shape_type() != shape.shape_type() || !existing.is_simple() {
        debug!(
            "Shape {} conflicts with {} because they are not both simple shapes of the same type",
            existing.id(),
            shape.id()
        );
        return false;
    }

    if existing.has_enum_trait() || shape.has_enum_trait() {
        debug!("Shape {} conflicts with {} because of an enum trait", existing.id(), shape.id());
        return false;
    }

    if existing.traits() != shape.traits() {
        debug!("Shape {} conflicts with {} because of differing traits", existing.id(), shape.id());
        return false;
    }

    true
}

/// Structures, unions and enums are never renamed.
fn is_safe_to_deconflict(shape: &Shape) -> bool {
    !shape.has_enum_trait() && (shape.is_simple() || shape.is_collection() || shape.is_map())
}
