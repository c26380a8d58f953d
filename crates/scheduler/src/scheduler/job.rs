use std::fmt;
use std::sync::{Arc, Weak};

use framefill_core::TaskKind;

type Body = Box<dyn FnOnce() + Send>;
type Liveness = Box<dyn Fn() -> bool + Send>;

/// One unit of deferred work.
///
/// A job carries the [`TaskKind`] its cost is aggregated under. Jobs built
/// with [`Job::bound`] hold their target weakly: once the target is dropped
/// the job is no longer valid and the scheduler discards it instead of
/// running it.
pub struct Job {
    kind: TaskKind,
    liveness: Option<Liveness>,
    body: Body,
}

impl Job {
    /// Wrap a closure or function. The kind is derived from its type, so each
    /// distinct closure or function aggregates cost separately.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            kind: TaskKind::of::<F>(),
            liveness: None,
            body: Box::new(f),
        }
    }

    /// Run `f` against `target` if the target is still alive at execution time.
    ///
    /// The kind is derived from `f`, so `Job::bound(&chunk, Chunk::rebuild)`
    /// aggregates cost for every chunk rebuild regardless of the chunk.
    pub fn bound<T, F>(target: &Arc<T>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) + Send + 'static,
    {
        let probe: Weak<T> = Arc::downgrade(target);
        let weak = Weak::clone(&probe);
        Self {
            kind: TaskKind::of::<F>(),
            liveness: Some(Box::new(move || probe.strong_count() > 0)),
            body: Box::new(move || {
                if let Some(target) = weak.upgrade() {
                    f(&target);
                }
            }),
        }
    }

    /// Replace the derived kind with an explicit one.
    pub fn with_kind(mut self, kind: impl Into<TaskKind>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// Whether the job's target still exists.
    pub fn is_valid(&self) -> bool {
        self.liveness.as_ref().map_or(true, |alive| alive())
    }

    pub(crate) fn run(self) {
        (self.body)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("kind", &self.kind)
            .field("valid", &self.is_valid())
            .finish()
    }
}
