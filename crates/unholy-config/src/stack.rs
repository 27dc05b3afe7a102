//! Layered configuration lookup with recursive merge
//!
//! A [`ConfigStack`] is an ordered list of TOML documents, highest
//! precedence first. Lookups follow two rules:
//!
//! - For a scalar, the first layer that defines the key wins.
//! - For a table, the result is another view built from *every* layer whose
//!   value for that key is a table, in the same order. Sibling keys from
//!   lower layers therefore stay visible unless a higher layer redefines
//!   that exact key.
//!
//! The kind of the first definer decides what a key is. Layers that define
//! the key with the other kind are skipped when building a nested view.

use std::fmt;

use toml_edit::{Item, TableLike};

use crate::document::ConfigDocument;
use crate::error::{Error, Result};

/// Where a configuration layer came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayerSource {
    /// Synthetic values derived from the project name
    Defaults,
    /// Built into the tool
    Core,
    /// The per-machine Unholyfile
    User,
    /// The local record for a named project
    Project(String),
    /// The Unholyfile committed to the project repository
    Repo,
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::Core => write!(f, "core"),
            Self::User => write!(f, "user"),
            Self::Project(name) => write!(f, "project:{}", name),
            Self::Repo => write!(f, "repo"),
        }
    }
}

/// One configuration document bound to its source.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: LayerSource,
    pub document: ConfigDocument,
}

impl ConfigLayer {
    pub fn new(source: LayerSource, document: ConfigDocument) -> Self {
        Self { source, document }
    }
}

/// The merged configuration for a project.
#[derive(Debug, Clone, Default)]
pub struct ConfigStack {
    /// Highest precedence first
    layers: Vec<ConfigLayer>,
}

impl ConfigStack {
    /// Build a stack from layers ordered highest precedence first.
    pub fn new(layers: Vec<ConfigLayer>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// Whether a layer from `source` takes part in this stack.
    pub fn has_layer(&self, source: &LayerSource) -> bool {
        self.layers.iter().any(|l| &l.source == source)
    }

    /// The top-level view over every layer.
    pub fn view(&self) -> StackView<'_> {
        StackView {
            entries: self
                .layers
                .iter()
                .map(|l| (&l.source, l.document.as_table() as &dyn TableLike))
                .collect(),
        }
    }

    /// Look up a single top-level key.
    pub fn lookup(&self, key: &str) -> Option<Resolved<'_>> {
        self.view().lookup(key)
    }

    /// Resolve a dotted path such as `dev.volume`.
    pub fn get(&self, path: &str) -> Result<Resolved<'_>> {
        self.view().get(path)
    }

    /// Resolve a dotted path that must be a string.
    pub fn get_str(&self, path: &str) -> Result<&str> {
        self.view().get_str(path)
    }

    /// Resolve a dotted path that may be absent but must be a string if set.
    pub fn find_str(&self, path: &str) -> Result<Option<&str>> {
        self.view().find_str(path)
    }

    /// Resolve a dotted path that must be a table.
    pub fn section(&self, path: &str) -> Result<StackView<'_>> {
        self.view().section(path)
    }
}

/// The outcome of a lookup: a winning scalar, or a merged nested view.
#[derive(Clone)]
pub enum Resolved<'a> {
    Scalar {
        source: &'a LayerSource,
        item: &'a Item,
    },
    Section(StackView<'a>),
}

impl<'a> Resolved<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Self::Scalar { item, .. } => (*item).as_str(),
            Self::Section(_) => None,
        }
    }

    /// The layer that supplied a scalar.
    pub fn source(&self) -> Option<&'a LayerSource> {
        match self {
            Self::Scalar { source, .. } => Some(*source),
            Self::Section(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Scalar { item, .. } => item.type_name(),
            Self::Section(_) => "table",
        }
    }
}

impl fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { source, item } => f
                .debug_struct("Scalar")
                .field("source", source)
                .field("item", &item.to_string().trim())
                .finish(),
            Self::Section(view) => f.debug_tuple("Section").field(view).finish(),
        }
    }
}

/// A read-only view of one table level across several layers.
#[derive(Clone)]
pub struct StackView<'a> {
    entries: Vec<(&'a LayerSource, &'a dyn TableLike)>,
}

impl<'a> StackView<'a> {
    /// Sources contributing to this view, highest precedence first.
    pub fn sources(&self) -> impl Iterator<Item = &'a LayerSource> + '_ {
        self.entries.iter().map(|(source, _)| *source)
    }

    /// Every key defined at this level, in first-seen precedence order.
    pub fn keys(&self) -> Vec<&'a str> {
        let mut keys: Vec<&'a str> = Vec::new();
        for &(_, table) in &self.entries {
            for (key, item) in table.iter() {
                if !item.is_none() && !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Look up a single key at this level.
    pub fn lookup(&self, key: &str) -> Option<Resolved<'a>> {
        let (source, first) = self.entries.iter().find_map(|&(source, table)| {
            table
                .get(key)
                .filter(|item| !item.is_none())
                .map(|item| (source, item))
        })?;

        if first.is_table_like() {
            let entries = self
                .entries
                .iter()
                .filter_map(|&(source, table)| {
                    table
                        .get(key)
                        .and_then(Item::as_table_like)
                        .map(|nested| (source, nested))
                })
                .collect();
            Some(Resolved::Section(StackView { entries }))
        } else {
            Some(Resolved::Scalar {
                source,
                item: first,
            })
        }
    }

    /// Resolve a dotted path relative to this view.
    pub fn get(&self, path: &str) -> Result<Resolved<'a>> {
        let mut segments = path.split('.').peekable();
        let mut view = self.clone();
        let mut walked = String::new();

        while let Some(segment) = segments.next() {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            let resolved = view.lookup(segment).ok_or_else(|| Error::KeyNotFound {
                key: path.to_string(),
            })?;

            if segments.peek().is_none() {
                return Ok(resolved);
            }

            match resolved {
                Resolved::Section(nested) => view = nested,
                other => {
                    return Err(Error::WrongType {
                        key: walked,
                        expected: "table",
                        found: other.kind(),
                    });
                }
            }
        }

        Err(Error::KeyNotFound {
            key: path.to_string(),
        })
    }

    pub fn get_str(&self, path: &str) -> Result<&'a str> {
        let resolved = self.get(path)?;
        resolved.as_str().ok_or_else(|| Error::WrongType {
            key: path.to_string(),
            expected: "string",
            found: resolved.kind(),
        })
    }

    pub fn find_str(&self, path: &str) -> Result<Option<&'a str>> {
        match self.get_str(path) {
            Ok(value) => Ok(Some(value)),
            Err(Error::KeyNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn section(&self, path: &str) -> Result<StackView<'a>> {
        match self.get(path)? {
            Resolved::Section(view) => Ok(view),
            other => Err(Error::WrongType {
                key: path.to_string(),
                expected: "table",
                found: other.kind(),
            }),
        }
    }
}

impl fmt::Debug for StackView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackView")
            .field("sources", &self.sources().collect::<Vec<_>>())
            .field("keys", &self.keys())
            .finish()
    }
}
