//! World construction options.
//!
//! The teacher's `PersistenceConfig` (`ecsdb::config`) loads from TOML
//! files with `ECDB_*` environment overrides, because the teacher's
//! database persists to disk. Persistence is an explicit non-goal here,
//! so `WorldOptions` stays an in-memory `Default`-able struct with no
//! file or environment loading: there is nothing on disk to point it at.

/// Tunables for a freshly constructed [`crate::World`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WorldOptions {
    /// Enables per-frame added/removed/changed bookkeeping in
    /// [`crate::World`]. Off by default: most callers query state
    /// directly and never touch `added`/`removed`/`changed`.
    pub track_changes: bool,
    /// Emits `tracing::warn!` events on undefined-behavior boundaries
    /// (e.g. mutating a dead entity, a duplicate system name, spawning
    /// an unregistered prefab) instead of staying silent.
    pub debug: bool,
}

impl WorldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track_changes(mut self, track_changes: bool) -> Self {
        self.track_changes = track_changes;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
