//! Shape Identifiers
//!
//! A `ShapeId` is `namespace#Name` with an optional `$member` suffix.
//! Ordering is namespace, then name, then member (absent before present),
//! which is exactly the derived field order below.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProjectionError, Result};

/// Structured, totally ordered shape identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapeId {
    namespace: String,
    name: String,
    member: Option<String>,
}

impl ShapeId {
    /// Create a validated top-level shape ID
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();

        if !is_valid_namespace(&namespace) || !is_identifier(&name) {
            return Err(ProjectionError::InvalidShapeId(format!("{}#{}", namespace, name)));
        }

        Ok(Self {
            namespace,
            name,
            member: None,
        })
    }

    /// Prelude IDs are literals owned by this crate and skip validation.
    pub(crate) fn prelude(name: &str) -> Self {
        Self {
            namespace: super::prelude::PRELUDE_NAMESPACE.to_string(),
            name: name.to_string(),
            member: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    pub fn has_member(&self) -> bool {
        self.member.is_some()
    }

    /// Same ID with the given member component
    pub fn with_member(&self, member: impl Into<String>) -> Result<Self> {
        let member = member.into();
        if !is_identifier(&member) {
            return Err(ProjectionError::InvalidShapeId(format!("{}${}", self, member)));
        }

        Ok(Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: Some(member),
        })
    }

    /// Member names on stored shapes were validated when the model was built.
    pub(crate) fn member_id(&self, member: &str) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: Some(member.to_string()),
        }
    }

    /// Same ID without the member component (the container for member IDs)
    pub fn without_member(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: None,
        }
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.name)?;
        if let Some(member) = &self.member {
            write!(f, "${}", member)?;
        }
        Ok(())
    }
}

impl FromStr for ShapeId {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ProjectionError::InvalidShapeId(s.to_string());

        let (namespace, rest) = s.split_once('#').ok_or_else(invalid)?;
        let (name, member) = match rest.split_once('$') {
            Some((name, member)) => (name, Some(member)),
            None => (rest, None),
        };

        let id = Self::new(namespace, name).map_err(|_| invalid())?;
        match member {
            Some(member) => id.with_member(member).map_err(|_| invalid()),
            None => Ok(id),
        }
    }
}

impl TryFrom<String> for ShapeId {
    type Error = ProjectionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ShapeId> for String {
    fn from(id: ShapeId) -> Self {
        id.to_string()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn is_valid_namespace(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}
