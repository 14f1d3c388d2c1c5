//! Enumeration types used throughout the kernel.

use serde::{Deserialize, Serialize};

/// Every message carried by the kernel is tagged with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    // --- Tick ---
    /// Frame event for locally owned actors.
    TickLocal,
    /// Frame event for remotely owned actor mirrors.
    TickRemote,
    /// End of the simulation step. Delivered to components only.
    TickEndOfFrame,
    /// Frame-phase event between pre-frame and post-frame.
    FrameSynch,
    /// Sent after the frame phase, before the next frame begins.
    PostFrame,

    // --- Info ---
    /// A timer registered with the game manager has fired.
    TimerElapsed,
    /// A local actor was created and added to the world.
    ActorCreated,
    /// An actor was published to the rest of the simulation.
    ActorPublished,
    /// An actor was removed from the world.
    ActorDeleted,
    /// An actor's state changed enough to inform the rest of the world.
    ActorUpdated,
    /// The simulation clock was paused.
    Paused,
    /// The simulation clock resumed from a pause.
    Resumed,
    /// The simulation was restarted.
    Restarted,
    /// The simulation time or time scale was changed.
    TimeChanged,
    /// A named application-level event fired.
    GameEvent,

    // --- Command ---
    CommandPause,
    CommandResume,
    CommandSetTime,
    CommandRestart,

    // --- Request ---
    RequestPause,
    RequestResume,
    RequestSetTime,
    RequestRestart,

    // --- Server ---
    /// A request message was rejected as invalid.
    ServerRequestRejected,
}

impl MessageType {
    /// Broad family of the type, matching the names used in logs.
    pub fn category(&self) -> &'static str {
        use MessageType::*;
        match self {
            TickLocal | TickRemote | TickEndOfFrame | FrameSynch | PostFrame => "Tick",
            TimerElapsed | ActorCreated | ActorPublished | ActorDeleted | ActorUpdated
            | Paused | Resumed | Restarted | TimeChanged | GameEvent => "Info",
            CommandPause | CommandResume | CommandSetTime | CommandRestart => "Command",
            RequestPause | RequestResume | RequestSetTime | RequestRestart => "Request",
            ServerRequestRejected => "Server",
        }
    }

    /// Types actors may not register listeners for.
    pub fn components_only(&self) -> bool {
        matches!(self, MessageType::TickEndOfFrame)
    }
}

/// Delivery priority of a component.
///
/// Components with a lower order id receive messages earlier. Components of
/// equal priority are invoked in registration order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ComponentPriority {
    /// Highest possible priority. Gets messages first.
    Highest,
    /// After Highest, before all others.
    Higher,
    #[default]
    Normal,
    /// After Normal, before Lowest.
    Lower,
    /// Gets messages after all others.
    Lowest,
}

impl ComponentPriority {
    /// The order id. The higher the priority, the lower the number.
    pub fn order_id(self) -> u8 {
        match self {
            ComponentPriority::Highest => 1,
            ComponentPriority::Higher => 2,
            ComponentPriority::Normal => 3,
            ComponentPriority::Lower => 4,
            ComponentPriority::Lowest => 5,
        }
    }
}

/// Actor lifecycle state.
///
/// Removal is always deferred: a deleted actor sits in `PendingRemoval`
/// until the end of the current frame, then transitions to `Removed` for
/// the duration of its removed-from-world hook before the entry is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorState {
    /// Constructed but not yet added to the world.
    #[default]
    Created,
    /// In the world, receiving messages.
    InWorld,
    /// Delete has been requested; removal happens at end of frame.
    PendingRemoval,
    /// Being removed; only its own removed-from-world hook sees this.
    Removed,
}
