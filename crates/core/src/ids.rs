use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize, Serializer};

/// Identity of a task queue. Assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueId(pub u64);

impl QueueId {
    /// The always-present default queue.
    pub const DEFAULT: QueueId = QueueId(0);

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key under which execution cost is aggregated.
///
/// Either supplied by the caller as a name or derived from the function or
/// closure that performs the work. Derived kinds are keyed by the callable's
/// [`TypeId`], so every function item and every closure expression is its own
/// kind even when several closures share a type name. The type name is kept
/// as the label used for display, logs, and metrics.
#[derive(Debug, Clone)]
pub struct TaskKind {
    type_id: Option<TypeId>,
    name: Cow<'static, str>,
}

impl TaskKind {
    pub const fn from_static(name: &'static str) -> Self {
        Self {
            type_id: None,
            name: Cow::Borrowed(name),
        }
    }

    /// Kind derived from the type of `F`. Labelled with its path
    /// (`my_crate::Chunk::rebuild`, or `my_crate::f::{{closure}}` for closures).
    pub fn of<F: ?Sized + 'static>() -> Self {
        Self {
            type_id: Some(TypeId::of::<F>()),
            name: Cow::Borrowed(std::any::type_name::<F>()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Whether the kind was derived from a callable rather than named.
    pub fn is_derived(&self) -> bool {
        self.type_id.is_some()
    }
}

impl PartialEq for TaskKind {
    fn eq(&self, other: &Self) -> bool {
        match (self.type_id, other.type_id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

impl Eq for TaskKind {}

impl Hash for TaskKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.type_id {
            Some(id) => id.hash(state),
            None => self.name.hash(state),
        }
    }
}

impl Serialize for TaskKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl From<&'static str> for TaskKind {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for TaskKind {
    fn from(name: String) -> Self {
        Self {
            type_id: None,
            name: Cow::Owned(name),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
