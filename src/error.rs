//! Unified error type for the ECS core.

use thiserror::Error;

use crate::component::ComponentId;
use crate::entity::Entity;

/// All fallible outcomes a [`crate::World`] operation can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The entity's generation no longer matches the registry (it was
    /// destroyed, or never existed).
    #[error("entity {0:?} is not alive")]
    UnknownEntity(Entity),

    /// The component id was never registered on this world.
    #[error("component {0:?} is not registered")]
    UnknownComponent(ComponentId),

    /// `set` was called on a tag component, or `add` on a non-tag
    /// component.
    #[error("component {0:?} has the wrong store kind for this operation")]
    WrongKind(ComponentId),

    /// `add_system` was called with a name already in use.
    #[error("system '{0}' already exists")]
    DuplicateSystem(String),

    /// `remove_system`/`enable_system`/`disable_system` referenced an
    /// unregistered system name.
    #[error("system '{0}' is not registered")]
    UnknownSystem(String),

    /// `spawn` referenced a prefab name that was never built with one.
    #[error("prefab '{0}' is not registered")]
    UnknownPrefab(String),

    /// A component value failed to downcast to the requested Rust type.
    #[error("component {0:?} does not hold a value of the requested type")]
    TypeMismatch(ComponentId),
}

pub type Result<T> = std::result::Result<T, WorldError>;
