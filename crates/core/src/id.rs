//! Strongly-typed identifiers for Skein entities.
//!
//! Each identifier is a `domain-key` `Uuid<D>` wrapper parameterized by a
//! unique domain marker, so `WorkflowId` and `ExecutionId` cannot be mixed up
//! at compile time even though both are backed by the same 16-byte UUID.
//! All ID types are `Copy`, `Eq + Hash + Ord`, and round-trip through serde as
//! plain UUID strings.

use domain_key::define_uuid;

pub use domain_key::UuidParseError;

define_uuid!(WorkflowIdDomain => WorkflowId);
define_uuid!(ExecutionIdDomain => ExecutionId);
define_uuid!(BreakpointIdDomain => BreakpointId);
define_uuid!(NodeIdDomain => NodeId);

/// The name of a workflow task. Unlike the UUID-backed identifiers above,
/// task names are caller-chosen strings used as the keys of the task
/// registry and as routing destinations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TaskName(String);

impl TaskName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::borrow::Borrow<str> for TaskName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The name of an agent-graph node. A distinct namespace from [`TaskName`]:
/// a single workflow task commonly drives an entire agent graph containing
/// many nodes, so the two are never interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeName(String);

impl NodeName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::borrow::Borrow<str> for NodeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
