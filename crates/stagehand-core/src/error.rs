//! Kernel error type.

use thiserror::Error;

use crate::enums::MessageType;
use crate::ids::ActorId;

/// Errors surfaced by kernel operations.
#[derive(Debug, Error)]
pub enum GmError {
    /// Component names are unique within one game manager.
    #[error("a component named `{0}` is already registered")]
    DuplicateComponentName(String),

    #[error("no component named `{0}` is registered")]
    UnknownComponent(String),

    #[error("no actor type registered for `{category}.{name}`")]
    UnknownActorType { category: String, name: String },

    #[error("actor {0} is already registered")]
    ActorAlreadyAdded(ActorId),

    #[error("actor {0} is not registered")]
    ActorNotFound(ActorId),

    /// Remote actor mirrors may not be published by this peer.
    #[error("remote actor {0} may not be published")]
    ActorIsRemote(ActorId),

    #[error("actors may not be registered with a nil id")]
    NilActorId,

    #[error("actor {actor} has no invokable named `{invokable}`")]
    UnknownInvokable { actor: ActorId, invokable: String },

    /// Some message types are delivered to components only.
    #[error("{message_type:?} listeners are restricted to components")]
    ComponentsOnly { message_type: MessageType },
}
