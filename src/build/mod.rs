//! Projection Transforms
//!
//! Named, configurable model rewrites applied in order to produce a
//! projection of a model. Each transform receives a `TransformContext`
//! holding the current model, the shared `ModelTransformer`, and an untyped
//! settings document that it deserializes into its own config type.
//!
//! Older build files wrote transform arguments as a bare list of strings.
//! These arrive as `{"__args": [...]}` (or as the bare array itself) and are
//! rewritten to the transform's named property before deserialization.

mod exclude_traits;
mod include_namespaces;
mod include_shapes_by_tag;
mod remove_unused_shapes;

pub use exclude_traits::{ExcludeTraits, ExcludeTraitsConfig};
pub use include_namespaces::{IncludeNamespaces, IncludeNamespacesConfig};
pub use include_shapes_by_tag::{IncludeShapesByTag, IncludeShapesByTagConfig};
pub use remove_unused_shapes::{RemoveUnusedShapes, RemoveUnusedShapesConfig};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ProjectionError, Result};
use crate::graph::{Model, SourceLocation};
use crate::transform::ModelTransformer;

/// Settings key used by legacy list-of-strings arguments
pub const LEGACY_ARGS: &str = "__args";

// =============================================================================
// Context
// =============================================================================

/// Everything a transform needs for one invocation
#[derive(Debug, Clone)]
pub struct TransformContext {
    pub model: Model,
    pub transformer: ModelTransformer,
    pub settings: Value,
    /// Where the settings were declared, for error attribution
    pub settings_location: SourceLocation,
}

impl TransformContext {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            transformer: ModelTransformer::new(),
            settings: Value::Object(Map::new()),
            settings_location: SourceLocation::none(),
        }
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_settings_location(mut self, location: SourceLocation) -> Self {
        self.settings_location = location;
        self
    }
}

// =============================================================================
// Transformer Contracts
// =============================================================================

/// A named projection transform
pub trait ProjectionTransformer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Legacy names that also resolve to this transform
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn transform(&self, context: TransformContext) -> Result<Model>;
}

/// A transform with a typed settings object
pub trait ConfigurableTransformer: Send + Sync {
    type Config: DeserializeOwned;

    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Property that legacy `__args` lists are rewritten to
    fn legacy_args_key(&self) -> Option<&'static str> {
        None
    }

    fn transform_with_config(&self, context: TransformContext, config: Self::Config) -> Result<Model>;
}

impl<T: ConfigurableTransformer> ProjectionTransformer for T {
    fn name(&self) -> &'static str {
        ConfigurableTransformer::name(self)
    }

    fn aliases(&self) -> &'static [&'static str] {
        ConfigurableTransformer::aliases(self)
    }

    fn transform(&self, mut context: TransformContext) -> Result<Model> {
        let name = ConfigurableTransformer::name(self);

        if let Some(key) = self.legacy_args_key() {
            if let Some(rewritten) = rewrite_legacy_args(&context.settings, key) {
                warn!(
                    "Deprecated projection transform arguments detected for `{}`; change this list of \
                     strings to an object with a property named `{}`",
                    name, key
                );
                context.settings = rewritten;
            }
        }

        let config = deserialize_settings::<T::Config>(name, &context.settings, &context.settings_location)?;
        debug!(transform = name, "Applying projection transform");
        self.transform_with_config(context, config)
    }
}

/// Rewrite `{"__args": [...]}` or a bare array into `{key: [...]}`.
///
/// Returns `None` when the settings are already in the current form.
fn rewrite_legacy_args(settings: &Value, key: &str) -> Option<Value> {
    match settings {
        Value::Array(args) => {
            let mut object = Map::new();
            object.insert(key.to_string(), Value::Array(args.clone()));
            Some(Value::Object(object))
        }
        Value::Object(object) if object.contains_key(LEGACY_ARGS) => {
            let mut object = object.clone();
            if let Some(args) = object.remove(LEGACY_ARGS) {
                object.insert(key.to_string(), args);
            }
            Some(Value::Object(object))
        }
        _ => None,
    }
}

/// Deserialize a settings document, reporting the path of the first bad key
fn deserialize_settings<C: DeserializeOwned>(
    context: &str,
    settings: &Value,
    location: &SourceLocation,
) -> Result<C> {
    let malformed = |key: String, message: String| ProjectionError::MalformedConfiguration {
        context: context.to_string(),
        key,
        message,
        location: location.clone(),
    };

    if !settings.is_object() {
        return Err(malformed(
            "<root>".to_string(),
            format!("expected an object, found {}", value_kind(settings)),
        ));
    }

    serde_path_to_error::deserialize(settings).map_err(|e| {
        let path = e.path().to_string();
        let message = e.into_inner().to_string();
        malformed(path, message)
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Registry
// =============================================================================

/// One entry of a transform list: `{"name": "...", "args": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    pub name: String,
    #[serde(default = "empty_object")]
    pub args: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Lookup of projection transforms by name or alias
pub struct TransformRegistry {
    transformers: Vec<Box<dyn ProjectionTransformer>>,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::empty()
            .with(IncludeNamespaces)
            .with(IncludeShapesByTag)
            .with(RemoveUnusedShapes)
            .with(ExcludeTraits)
    }
}

impl TransformRegistry {
    /// A registry with no transforms
    pub fn empty() -> Self {
        Self {
            transformers: Vec::new(),
        }
    }

    pub fn with(mut self, transformer: impl ProjectionTransformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// Find a transform by its name or one of its aliases
    pub fn find(&self, name: &str) -> Option<&dyn ProjectionTransformer> {
        self.transformers
            .iter()
            .find(|t| t.name() == name || t.aliases().contains(&name))
            .map(|t| t.as_ref())
    }

    /// Names of every registered transform
    pub fn names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    pub fn apply(&self, name: &str, context: TransformContext) -> Result<Model> {
        let transformer = self
            .find(name)
            .ok_or_else(|| ProjectionError::UnknownTransform(name.to_string()))?;
        transformer.transform(context)
    }

    /// Apply a transform list in order, each step seeing the previous result
    pub fn apply_all(&self, model: Model, transforms: &[TransformConfig]) -> Result<Model> {
        transforms.iter().try_fold(model, |model, step| {
            let context = TransformContext::new(model).with_settings(step.args.clone());
            self.apply(&step.name, context)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    struct EchoConfig {
        values: Vec<String>,
    }

    struct Echo;

    impl ConfigurableTransformer for Echo {
        type Config = EchoConfig;

        fn name(&self) -> &'static str {
            "echo"
        }

        fn legacy_args_key(&self) -> Option<&'static str> {
            Some("values")
        }

        fn transform_with_config(&self, context: TransformContext, config: EchoConfig) -> Result<Model> {
            assert_eq!(config.values, vec!["a", "b"]);
            Ok(context.model)
        }
    }

    fn context(settings: Value) -> TransformContext {
        TransformContext::new(Model::builder().build().unwrap()).with_settings(settings)
    }

    #[test]
    fn test_legacy_args_are_rewritten() {
        assert!(Echo.transform(context(json!({"__args": ["a", "b"]}))).is_ok());
        assert!(Echo.transform(context(json!(["a", "b"]))).is_ok());
        assert!(Echo.transform(context(json!({"values": ["a", "b"]}))).is_ok());
    }

    /// Run `f` under a subscriber that records formatted warnings
    fn capture_warnings(f: impl FnOnce()) -> String {
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Buffer {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn deprecation_count(output: &str) -> usize {
        output.matches("Deprecated projection transform arguments").count()
    }

    #[test]
    fn test_legacy_args_warn_once_per_invocation() {
        let output = capture_warnings(|| {
            Echo.transform(context(json!({"__args": ["a", "b"]}))).unwrap();
        });
        assert_eq!(deprecation_count(&output), 1);
        assert!(output.contains("`echo`"));

        let output = capture_warnings(|| {
            Echo.transform(context(json!(["a", "b"]))).unwrap();
        });
        assert_eq!(deprecation_count(&output), 1);

        let output = capture_warnings(|| {
            Echo.transform(context(json!({"values": ["a", "b"]}))).unwrap();
        });
        assert_eq!(deprecation_count(&output), 0);

        let output = capture_warnings(|| {
            Echo.transform(context(json!({"__args": ["a", "b"]}))).unwrap();
            Echo.transform(context(json!({"__args": ["a", "b"]}))).unwrap();
        });
        assert_eq!(deprecation_count(&output), 2);
    }

    #[test]
    fn test_rewrite_is_skipped_for_current_form() {
        assert_eq!(rewrite_legacy_args(&json!({"values": []}), "values"), None);
        assert_eq!(
            rewrite_legacy_args(&json!({"__args": ["x"], "other": 1}), "values"),
            Some(json!({"values": ["x"], "other": 1}))
        );
    }

    #[test]
    fn test_malformed_settings_report_key_path() {
        let err = Echo.transform(context(json!({"values": ["a", 3]}))).unwrap_err();
        match err {
            ProjectionError::MalformedConfiguration { context, key, .. } => {
                assert_eq!(context, "echo");
                assert_eq!(key, "values[1]");
            }
            other => panic!("Expected MalformedConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_setting_is_malformed() {
        let err = Echo.transform(context(json!({}))).unwrap_err();
        assert!(matches!(err, ProjectionError::MalformedConfiguration { message, .. } if message.contains("values")));
    }

    #[test]
    fn test_non_object_settings_are_malformed_at_root() {
        let err = Echo.transform(context(json!("values"))).unwrap_err();
        assert!(matches!(err, ProjectionError::MalformedConfiguration { key, .. } if key == "<root>"));
    }

    #[test]
    fn test_registry_resolves_names_and_aliases() {
        let registry = TransformRegistry::default();
        assert_eq!(registry.find("treeShaker").map(|t| t.name()), Some("removeUnusedShapes"));
        assert_eq!(registry.find("includeByTag").map(|t| t.name()), Some("includeShapesByTag"));
        assert!(registry.find("flatten").is_none());
        assert_eq!(registry.names().len(), 4);

        let err = registry.apply("flatten", context(json!({}))).unwrap_err();
        assert!(matches!(err, ProjectionError::UnknownTransform(name) if name == "flatten"));
    }
}
