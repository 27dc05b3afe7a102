//! Value types exchanged with a container platform

use std::collections::BTreeMap;

/// Resource labels, and label filters (every pair must match).
pub type Labels = BTreeMap<String, String>;

/// Build a label map from string pairs.
pub fn labels<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Labels {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Whether `candidate` carries every label in `filter`.
pub fn matches_labels(candidate: &Labels, filter: &Labels) -> bool {
    filter
        .iter()
        .all(|(key, value)| candidate.get(key) == Some(value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub name: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub labels: Labels,
    /// Platform-reported state, e.g. `created`, `running`, `exited`
    pub state: String,
}

impl Container {
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub labels: Labels,
}

/// A filesystem attached to a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mount {
    /// A named volume
    Volume { source: String, target: String },
    /// A host path
    Bind { source: String, target: String },
    /// In-memory scratch space
    Tmpfs { target: String },
}

impl Mount {
    pub fn target(&self) -> &str {
        match self {
            Self::Volume { target, .. } | Self::Bind { target, .. } | Self::Tmpfs { target } => {
                target
            }
        }
    }
}

/// Everything needed to create a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: Option<String>,
    pub image: String,
    pub command: Vec<String>,
    pub labels: Labels,
    pub mounts: Vec<Mount>,
    pub working_dir: Option<String>,
    pub env: BTreeMap<String, String>,
    /// Run an init process as PID 1
    pub init: bool,
    /// Remove the container as soon as it stops
    pub auto_remove: bool,
}

/// How a command is run inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    pub working_dir: Option<String>,
    pub env: BTreeMap<String, String>,
    pub user: Option<String>,
    pub tty: bool,
    pub interactive: bool,
    /// Capture output instead of passing it through to the terminal
    pub capture: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: Stream,
    pub data: Vec<u8>,
}

/// Result of an exec. `chunks` is empty when output was not captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub chunks: Vec<OutputChunk>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Output from one stream, concatenated.
    pub fn stream(&self, stream: Stream) -> Vec<u8> {
        self.chunks
            .iter()
            .filter(|c| c.stream == stream)
            .flat_map(|c| c.data.iter().copied())
            .collect()
    }

    /// All captured output in arrival order, lossily decoded.
    pub fn text(&self) -> String {
        let bytes: Vec<u8> = self
            .chunks
            .iter()
            .flat_map(|c| c.data.iter().copied())
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
