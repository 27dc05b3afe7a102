//! Ordered bootstrap scripts gathered from Unholyfile tails

use crate::stack::LayerSource;

/// The script half of one Unholyfile layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub source: LayerSource,
    pub text: String,
}

impl Script {
    pub fn new(source: LayerSource, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
        }
    }

    /// Blank scripts are kept in the stack but never executed.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Scripts in execution order: `core`, `user`, `project`, `repo`.
///
/// Indexes are stable; a blank entry keeps its slot so that every executed
/// script can be traced back to its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptStack {
    scripts: Vec<Script>,
}

impl ScriptStack {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self { scripts }
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.iter()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.scripts.iter().map(|s| s.text.as_str()).collect()
    }

    /// Scripts that should run, paired with their stack index.
    pub fn runnable(&self) -> impl Iterator<Item = (usize, &Script)> {
        self.scripts
            .iter()
            .enumerate()
            .filter(|(_, script)| !script.is_blank())
    }
}

impl<'a> IntoIterator for &'a ScriptStack {
    type Item = &'a Script;
    type IntoIter = std::slice::Iter<'a, Script>;

    fn into_iter(self) -> Self::IntoIter {
        self.scripts.iter()
    }
}
