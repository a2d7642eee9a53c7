//! JSON Schema Reference Naming
//!
//! Assigns every shape a stable JSON pointer and decides whether it is
//! inlined at its use sites. Strategies are built once per conversion run
//! over one `Model` and never shared between runs.

mod deconflicting;
mod default_strategy;
mod property_naming;

pub use deconflicting::DeconflictingStrategy;
pub use default_strategy::DefaultRefStrategy;
pub use property_naming::{DefaultPropertyNaming, PropertyNamingStrategy};

pub use crate::config::DEFAULT_POINTER;

use crate::config::JsonSchemaConfig;
use crate::error::Result;
use crate::graph::{Model, Shape, ShapeId};

/// Converts shape IDs to `$ref` pointers
pub trait RefStrategy {
    /// JSON pointer used to refer to the shape, e.g. `#/definitions/MyShape`
    fn to_pointer(&self, id: &ShapeId) -> Result<String>;

    /// Whether the shape is written at its use site instead of referenced
    fn is_inlined(&self, shape: &Shape) -> Result<bool>;
}

/// The strategy used by conversions: default naming wrapped in deconfliction
pub fn create_default_strategy<N: PropertyNamingStrategy>(
    model: &Model,
    config: JsonSchemaConfig,
    naming: N,
) -> Result<DeconflictingStrategy<'_, DefaultRefStrategy<'_, N>>> {
    let delegate = DefaultRefStrategy::new(model, config.clone(), naming)?;
    DeconflictingStrategy::new(model, delegate, &config)
}
