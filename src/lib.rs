//! Shape Projection
//!
//! Schema-projection layer for a shape-based interface definition model:
//! prunes a model graph with named projection transforms, then assigns
//! every shape a stable, collision-free JSON Schema pointer.
//!
//! ## Features
//!
//! - **Deterministic Naming**: Pointers depend only on the model, never on map order
//! - **Deconfliction**: Colliding names are elided or renamed, or rejected when unsafe
//! - **Fixed-Point Pruning**: Unreferenced shapes and trait definitions are removed until stable
//! - **Projection Transforms**: Namespace, tag and trait filters with legacy argument support
//!
//! ## Architecture
//!
//! ```text
//! model.json ──► graph::load_from_path ──► Model
//!                                            │
//!                 build::TransformRegistry ◄─┘  (includeNamespaces, removeUnusedShapes, ...)
//!                                            │
//!           jsonschema::create_default_strategy ──► shape id → #/definitions/Name
//! ```

pub mod build;
pub mod config;
pub mod error;
pub mod graph;
pub mod jsonschema;
pub mod transform;

pub use build::{ProjectionTransformer, TransformConfig, TransformContext, TransformRegistry};
pub use config::JsonSchemaConfig;
pub use error::{ProjectionError, Result};
pub use graph::{Model, ModelBuilder, Shape, ShapeId};
pub use jsonschema::{create_default_strategy, RefStrategy};
pub use transform::{prune, ModelTransformer};
