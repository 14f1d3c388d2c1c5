//! The message envelope and typed payloads.
//!
//! Constructing a message through [`Message::new`] pairs each
//! [`MessageType`] with that type's default payload, so type/payload
//! agreement is a construction invariant rather than a runtime check.

use serde::{Deserialize, Serialize};

use crate::enums::MessageType;
use crate::ids::{ActorId, MachineId};
use crate::types::TickInfo;

/// Typed payload data, one variant per message family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessagePayload {
    /// No payload beyond the envelope.
    Empty,
    /// Frame timing for the tick family.
    Tick {
        delta_sim_time: f64,
        delta_real_time: f64,
        time_scale: f64,
        sim_time: f64,
    },
    /// A named timer fired. `late_time` is how many seconds past the
    /// deadline the firing happened.
    TimerElapsed { timer_name: String, late_time: f64 },
    /// Identity of a created or updated actor.
    ActorUpdate {
        name: String,
        category: String,
        type_name: String,
    },
    /// New simulation time settings.
    TimeChange { sim_time: f64, time_scale: f64 },
    /// A named application-level event.
    GameEvent { event: String },
    /// Why a request was rejected.
    Rejected { reason: String },
}

impl MessagePayload {
    /// The default payload carried by each message type.
    pub fn default_for(message_type: MessageType) -> Self {
        use MessageType::*;
        match message_type {
            TickLocal | TickRemote | TickEndOfFrame | FrameSynch | PostFrame => {
                MessagePayload::Tick {
                    delta_sim_time: 0.0,
                    delta_real_time: 0.0,
                    time_scale: 1.0,
                    sim_time: 0.0,
                }
            }
            TimerElapsed => MessagePayload::TimerElapsed {
                timer_name: String::new(),
                late_time: 0.0,
            },
            ActorCreated | ActorUpdated => MessagePayload::ActorUpdate {
                name: String::new(),
                category: String::new(),
                type_name: String::new(),
            },
            TimeChanged | CommandSetTime | RequestSetTime => MessagePayload::TimeChange {
                sim_time: 0.0,
                time_scale: 1.0,
            },
            GameEvent => MessagePayload::GameEvent {
                event: String::new(),
            },
            ServerRequestRejected => MessagePayload::Rejected {
                reason: String::new(),
            },
            _ => MessagePayload::Empty,
        }
    }
}

/// A single message flowing through the kernel.
///
/// The `about_actor` field addresses a specific actor; dispatch consults the
/// target's handler table and any listeners registered against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    message_type: MessageType,
    source: MachineId,
    destination: Option<MachineId>,
    about_actor: Option<ActorId>,
    sending_actor: Option<ActorId>,
    payload: MessagePayload,
    /// The message that caused this one, if any. Set by the reject flow.
    causing: Option<Box<Message>>,
}

impl Message {
    /// Build a message of the given type with that type's default payload.
    pub fn new(message_type: MessageType, source: MachineId) -> Self {
        Self {
            message_type,
            source,
            destination: None,
            about_actor: None,
            sending_actor: None,
            payload: MessagePayload::default_for(message_type),
            causing: None,
        }
    }

    pub fn with_payload(mut self, payload: MessagePayload) -> Self {
        self.payload = payload;
        self
    }

    /// Address the message at a specific actor.
    pub fn about(mut self, actor: ActorId) -> Self {
        self.about_actor = Some(actor);
        self
    }

    pub fn from_actor(mut self, actor: ActorId) -> Self {
        self.sending_actor = Some(actor);
        self
    }

    pub fn to_machine(mut self, machine: MachineId) -> Self {
        self.destination = Some(machine);
        self
    }

    pub fn caused_by(mut self, causing: Message) -> Self {
        self.causing = Some(Box::new(causing));
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn source(&self) -> MachineId {
        self.source
    }

    pub fn destination(&self) -> Option<MachineId> {
        self.destination
    }

    pub fn about_actor(&self) -> Option<ActorId> {
        self.about_actor
    }

    pub fn sending_actor(&self) -> Option<ActorId> {
        self.sending_actor
    }

    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    pub fn causing(&self) -> Option<&Message> {
        self.causing.as_deref()
    }

    /// Frame timing, when the payload carries it.
    pub fn tick(&self) -> Option<TickInfo> {
        match self.payload {
            MessagePayload::Tick {
                delta_sim_time,
                delta_real_time,
                time_scale,
                sim_time,
            } => Some(TickInfo {
                delta_sim_time,
                delta_real_time,
                time_scale,
                sim_time,
            }),
            _ => None,
        }
    }
}
