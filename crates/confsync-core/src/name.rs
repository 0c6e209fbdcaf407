//! Hierarchical names.
//!
//! A name is a sequence of non-empty components written in URI form,
//! `/ndn/broadcast/discovery`. The root name has no components and is
//! written `/`. Queries are routed by prefix: a registration for `/a/b`
//! covers `/a/b` and `/a/b/c`, but not `/a/bc`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// A hierarchical name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// The root name `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a name from its URI form.
    ///
    /// Repeated and trailing slashes are ignored, so `//a/b/` is `/a/b`.
    pub fn parse(uri: &str) -> Result<Self> {
        if !uri.is_empty() && !uri.starts_with('/') {
            return Err(CoreError::InvalidName(format!(
                "{uri:?} does not start with '/'"
            )));
        }
        let mut name = Self::root();
        for component in uri.split('/').filter(|c| !c.is_empty()) {
            validate_component(component)?;
            name.components.push(component.to_string());
        }
        Ok(name)
    }

    /// Build a name from individual components.
    pub fn from_components<I, S>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut name = Self::root();
        for component in components {
            let component = component.into();
            validate_component(&component)?;
            name.components.push(component);
        }
        Ok(name)
    }

    /// Return a new name with `component` appended.
    pub fn child(&self, component: &str) -> Result<Self> {
        validate_component(component)?;
        let mut name = self.clone();
        name.components.push(component.to_string());
        Ok(name)
    }

    /// Append a component that is valid by construction.
    pub(crate) fn push_trusted(&mut self, component: String) {
        debug_assert!(validate_component(&component).is_ok());
        self.components.push(component);
    }

    /// The name without its last component, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.components.is_empty() {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True for the root name.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    /// Last component.
    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// All components in order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    /// True if every component of `self` leads `other`.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }
}

/// Check that `component` can live inside a name.
pub fn validate_component(component: &str) -> Result<()> {
    let reason = if component.is_empty() {
        "empty"
    } else if component.contains('/') {
        "contains '/'"
    } else if component.contains('\n') {
        "contains a newline"
    } else {
        return Ok(());
    };
    Err(CoreError::InvalidComponent {
        component: component.to_string(),
        reason,
    })
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

impl FromStr for Name {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Name {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.to_string()
    }
}
