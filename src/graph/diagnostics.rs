//! Diagnostics
//!
//! Collects validation events during model assembly and reference naming.
//! Findings accumulate instead of failing fast so a single run reports
//! every issue at once.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ShapeId;

// =============================================================================
// Source Location
// =============================================================================

/// Where a shape, trait definition, or settings document was declared
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
        }
    }

    /// The "unknown location" marker
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.filename.is_empty()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "N/A")
        } else {
            write!(f, "{} [{}, {}]", self.filename, self.line, self.column)
        }
    }
}

// =============================================================================
// Event Codes
// =============================================================================

/// Code for categorizing validation events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCode {
    // === Model Assembly ===
    /// Member, operation, or resource reference does not resolve
    UnresolvedTarget,
    /// Shape applies a trait that has no definition
    UnknownTrait,
    /// Trait definition value shape does not resolve
    UnresolvedTraitShape,
    /// Member shape without a container that declares it
    OrphanMember,

    // === Reference Naming ===
    /// Two equivalent shapes share one definition
    ElidedShape,
    /// A colliding pointer was given a distinguishing suffix
    DeconflictedPointer,
}

impl EventCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedTarget => "Target",
            Self::UnknownTrait => "TraitTarget",
            Self::UnresolvedTraitShape => "TraitDefinitionShape",
            Self::OrphanMember => "Member",
            Self::ElidedShape => "ElidedShape",
            Self::DeconflictedPointer => "DeconflictedPointer",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedTarget
            | Self::UnknownTrait
            | Self::UnresolvedTraitShape
            | Self::OrphanMember => Severity::Danger,

            Self::ElidedShape | Self::DeconflictedPointer => Severity::Note,
        }
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Event severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Note,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note => write!(f, "NOTE"),
            Self::Warning => write!(f, "WARNING"),
            Self::Danger => write!(f, "DANGER"),
        }
    }
}

// =============================================================================
// Validation Event
// =============================================================================

/// A single validation event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvent {
    pub code: EventCode,
    pub message: String,
    /// Shape the event is attributed to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_id: Option<ShapeId>,
    #[serde(default)]
    pub source_location: SourceLocation,
}

impl ValidationEvent {
    pub fn new(code: EventCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            shape_id: None,
            source_location: SourceLocation::none(),
        }
    }

    pub fn with_shape(mut self, id: &ShapeId) -> Self {
        self.shape_id = Some(id.clone());
        self
    }

    pub fn with_location(mut self, location: &SourceLocation) -> Self {
        self.source_location = location.clone();
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.severity())?;
        if let Some(id) = &self.shape_id {
            write!(f, "{}: ", id)?;
        }
        write!(f, "{} | {} {}", self.message, self.code, self.source_location)
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of validation events from one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    events: Vec<ValidationEvent>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ValidationEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ValidationEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Events at or above the given severity
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &ValidationEvent> {
        self.events.iter().filter(move |e| e.severity() >= severity)
    }

    /// Whether any event is severe enough to reject a model
    pub fn has_danger(&self) -> bool {
        self.at_least(Severity::Danger).next().is_some()
    }

    pub fn count_by_code(&self, code: EventCode) -> usize {
        self.events.iter().filter(|e| e.code == code).count()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{}", event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Danger > Severity::Warning);
        assert!(Severity::Warning > Severity::Note);
    }

    #[test]
    fn test_has_danger() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(ValidationEvent::new(EventCode::ElidedShape, "elided"));
        assert!(!diagnostics.has_danger());

        diagnostics.push(ValidationEvent::new(EventCode::UnresolvedTarget, "missing"));
        assert!(diagnostics.has_danger());
        assert_eq!(diagnostics.at_least(Severity::Warning).count(), 1);
    }

    #[test]
    fn test_event_display_includes_shape_and_location() {
        let id: ShapeId = "ns.a#Foo".parse().unwrap();
        let event = ValidationEvent::new(EventCode::UnknownTrait, "no definition")
            .with_shape(&id)
            .with_location(&SourceLocation::new("model.json", 3, 7));

        assert_eq!(
            event.to_string(),
            "[DANGER] ns.a#Foo: no definition | TraitTarget model.json [3, 7]"
        );
    }
}
