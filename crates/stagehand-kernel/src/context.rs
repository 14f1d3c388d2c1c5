//! Handler context: read-only queries plus queued mutation ops.
//!
//! Hooks never mutate the registries directly. They queue ops on the
//! context; the manager applies them when the hook returns. Queries see the
//! registry as of the start of the current hook.

use std::collections::HashMap;

use log::warn;

use stagehand_core::enums::MessageType;
use stagehand_core::error::GmError;
use stagehand_core::ids::{ActorId, MachineInfo};
use stagehand_core::message::Message;
use stagehand_core::types::GameClock;

use crate::actor::{ActorDescriptor, ActorEntry, ActorInfo, GameActor};
use crate::factory::{ActorFactory, ActorType};

/// A registry mutation queued by a handler.
pub(crate) enum PendingOp {
    SendMessage(Message),
    SendNetworkMessage(Message),
    AddActor {
        actor: Box<dyn GameActor>,
        descriptor: ActorDescriptor,
    },
    DeleteActor(ActorId),
    RegisterGlobal {
        message_type: MessageType,
        listener: ActorId,
        invokable: String,
    },
    UnregisterGlobal {
        message_type: MessageType,
        listener: ActorId,
        invokable: String,
    },
    RegisterAboutActor {
        message_type: MessageType,
        target: ActorId,
        listener: ActorId,
        invokable: String,
    },
    UnregisterAboutActor {
        message_type: MessageType,
        target: ActorId,
        listener: ActorId,
        invokable: String,
    },
    RegisterSelfHandler {
        actor: ActorId,
        message_type: MessageType,
        invokable: String,
    },
    RegisterForTicks(ActorId),
    SetTimer {
        name: String,
        about: Option<ActorId>,
        seconds: f64,
        repeat: bool,
        real_time: bool,
    },
    ClearTimer {
        name: String,
        about: Option<ActorId>,
    },
    SetPaused(bool),
    ChangeTimeSettings {
        sim_time: f64,
        time_scale: f64,
    },
    Reject {
        causing: Message,
        reason: String,
    },
    RemoveComponent(String),
}

/// The context handed to every actor and component hook.
///
/// Mutating calls queue [`PendingOp`]s; queries read the live registry.
/// Inside an actor hook, [`GmContext::current_actor`] identifies the actor
/// being invoked.
pub struct GmContext<'a> {
    ops: &'a mut Vec<PendingOp>,
    actors: &'a HashMap<ActorId, ActorEntry>,
    factory: &'a ActorFactory,
    clock: &'a GameClock,
    machine: &'a MachineInfo,
    current_actor: Option<ActorId>,
}

impl<'a> GmContext<'a> {
    pub(crate) fn new(
        ops: &'a mut Vec<PendingOp>,
        actors: &'a HashMap<ActorId, ActorEntry>,
        factory: &'a ActorFactory,
        clock: &'a GameClock,
        machine: &'a MachineInfo,
        current_actor: Option<ActorId>,
    ) -> Self {
        Self {
            ops,
            actors,
            factory,
            clock,
            machine,
            current_actor,
        }
    }

    // --- queries ---

    pub fn machine(&self) -> &MachineInfo {
        self.machine
    }

    pub fn clock(&self) -> &GameClock {
        self.clock
    }

    pub fn sim_time(&self) -> f64 {
        self.clock.sim_time
    }

    pub fn is_paused(&self) -> bool {
        self.clock.paused
    }

    /// The actor whose hook is currently running, if any.
    pub fn current_actor(&self) -> Option<ActorId> {
        self.current_actor
    }

    pub fn find_actor(&self, id: ActorId) -> Option<ActorInfo> {
        self.actors.get(&id).map(|entry| entry.info.clone())
    }

    pub fn find_actors_by_name(&self, name: &str) -> Vec<ActorInfo> {
        self.actors
            .values()
            .filter(|entry| entry.info.name == name)
            .map(|entry| entry.info.clone())
            .collect()
    }

    pub fn find_actors_by_type(&self, actor_type: &ActorType) -> Vec<ActorInfo> {
        self.actors
            .values()
            .filter(|entry| &entry.info.actor_type == actor_type)
            .map(|entry| entry.info.clone())
            .collect()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    // --- messages ---

    /// Build a message of the given type stamped with this peer as source.
    pub fn new_message(&self, message_type: MessageType) -> Message {
        let msg = Message::new(message_type, self.machine.id);
        match self.current_actor {
            Some(id) => msg.from_actor(id),
            None => msg,
        }
    }

    /// Queue a message for processing this frame.
    pub fn send_message(&mut self, message: Message) {
        self.ops.push(PendingOp::SendMessage(message));
    }

    /// Queue a message for the network dispatch path.
    pub fn send_network_message(&mut self, message: Message) {
        self.ops.push(PendingOp::SendNetworkMessage(message));
    }

    /// Reject a request message. The rejection carries the causing message
    /// and routes back toward the machine that sent it.
    pub fn reject_message(&mut self, causing: &Message, reason: impl Into<String>) {
        self.ops.push(PendingOp::Reject {
            causing: causing.clone(),
            reason: reason.into(),
        });
    }

    // --- actors ---

    /// Construct an actor from the factory. Pair with [`GmContext::add_actor`].
    pub fn create_actor(&self, actor_type: &ActorType) -> Result<Box<dyn GameActor>, GmError> {
        self.factory.create(actor_type)
    }

    /// Queue an actor for registration. It enters the world when the current
    /// hook returns.
    pub fn add_actor(&mut self, actor: Box<dyn GameActor>, descriptor: ActorDescriptor) {
        self.ops.push(PendingOp::AddActor { actor, descriptor });
    }

    /// Queue an actor for removal at the end of the current frame.
    pub fn delete_actor(&mut self, id: ActorId) {
        self.ops.push(PendingOp::DeleteActor(id));
    }

    // --- listeners ---

    /// Subscribe the current actor to every message of the given type.
    pub fn subscribe(&mut self, message_type: MessageType, invokable: impl Into<String>) {
        let Some(listener) = self.require_current_actor("subscribe") else {
            return;
        };
        self.register_for_messages(message_type, listener, invokable);
    }

    /// Subscribe the current actor to messages of the given type addressed
    /// to another actor.
    pub fn subscribe_about(
        &mut self,
        message_type: MessageType,
        target: ActorId,
        invokable: impl Into<String>,
    ) {
        let Some(listener) = self.require_current_actor("subscribe_about") else {
            return;
        };
        self.register_for_messages_about_actor(message_type, target, listener, invokable);
    }

    /// Map a message type addressed to the current actor to one of its own
    /// invokables.
    pub fn handle_self(&mut self, message_type: MessageType, invokable: impl Into<String>) {
        let Some(actor) = self.require_current_actor("handle_self") else {
            return;
        };
        if Self::validate_registration(message_type) {
            self.ops.push(PendingOp::RegisterSelfHandler {
                actor,
                message_type,
                invokable: invokable.into(),
            });
        }
    }

    /// Subscribe the current actor to the tick path matching its ownership:
    /// tick-local for local actors, tick-remote for remote mirrors.
    pub fn register_for_ticks(&mut self) {
        let Some(actor) = self.require_current_actor("register_for_ticks") else {
            return;
        };
        self.ops.push(PendingOp::RegisterForTicks(actor));
    }

    pub fn register_for_messages(
        &mut self,
        message_type: MessageType,
        listener: ActorId,
        invokable: impl Into<String>,
    ) {
        if Self::validate_registration(message_type) {
            self.ops.push(PendingOp::RegisterGlobal {
                message_type,
                listener,
                invokable: invokable.into(),
            });
        }
    }

    pub fn unregister_for_messages(
        &mut self,
        message_type: MessageType,
        listener: ActorId,
        invokable: impl Into<String>,
    ) {
        self.ops.push(PendingOp::UnregisterGlobal {
            message_type,
            listener,
            invokable: invokable.into(),
        });
    }

    pub fn register_for_messages_about_actor(
        &mut self,
        message_type: MessageType,
        target: ActorId,
        listener: ActorId,
        invokable: impl Into<String>,
    ) {
        if Self::validate_registration(message_type) {
            self.ops.push(PendingOp::RegisterAboutActor {
                message_type,
                target,
                listener,
                invokable: invokable.into(),
            });
        }
    }

    pub fn unregister_for_messages_about_actor(
        &mut self,
        message_type: MessageType,
        target: ActorId,
        listener: ActorId,
        invokable: impl Into<String>,
    ) {
        self.ops.push(PendingOp::UnregisterAboutActor {
            message_type,
            target,
            listener,
            invokable: invokable.into(),
        });
    }

    // --- timers ---

    /// Arm a simulation-clock timer. It fires a `TimerElapsed` message about
    /// `about` (if given) after `seconds` of simulation time.
    pub fn set_timer(
        &mut self,
        name: impl Into<String>,
        about: Option<ActorId>,
        seconds: f64,
        repeat: bool,
    ) {
        self.ops.push(PendingOp::SetTimer {
            name: name.into(),
            about,
            seconds,
            repeat,
            real_time: false,
        });
    }

    /// Arm a real-clock timer. Real-clock timers keep firing while the
    /// simulation is paused.
    pub fn set_real_timer(
        &mut self,
        name: impl Into<String>,
        about: Option<ActorId>,
        seconds: f64,
        repeat: bool,
    ) {
        self.ops.push(PendingOp::SetTimer {
            name: name.into(),
            about,
            seconds,
            repeat,
            real_time: true,
        });
    }

    pub fn clear_timer(&mut self, name: impl Into<String>, about: Option<ActorId>) {
        self.ops.push(PendingOp::ClearTimer {
            name: name.into(),
            about,
        });
    }

    // --- control ---

    pub fn set_paused(&mut self, paused: bool) {
        self.ops.push(PendingOp::SetPaused(paused));
    }

    pub fn change_time_settings(&mut self, sim_time: f64, time_scale: f64) {
        self.ops.push(PendingOp::ChangeTimeSettings {
            sim_time,
            time_scale,
        });
    }

    /// Queue removal of a component by name.
    pub fn remove_component(&mut self, name: impl Into<String>) {
        self.ops.push(PendingOp::RemoveComponent(name.into()));
    }

    fn require_current_actor(&self, operation: &str) -> Option<ActorId> {
        let id = self.current_actor;
        if id.is_none() {
            warn!("{operation} called outside an actor hook; ignoring");
        }
        id
    }

    fn validate_registration(message_type: MessageType) -> bool {
        if message_type.components_only() {
            warn!("actors may not register listeners for {message_type:?}; ignoring");
            return false;
        }
        true
    }
}
