//! The actor trait and per-actor bookkeeping.

use std::any::Any;
use std::collections::HashMap;

use stagehand_core::constants::invokables;
use stagehand_core::enums::{ActorState, MessageType};
use stagehand_core::error::GmError;
use stagehand_core::ids::ActorId;
use stagehand_core::message::Message;

use crate::context::GmContext;
use crate::factory::ActorType;

/// A simulation entity managed by the game manager.
///
/// The kernel owns actors as boxed trait objects and drives them through the
/// hooks below. All hooks run on the kernel thread. Registry mutation from
/// inside a hook goes through the [`GmContext`] op queue and is applied when
/// the hook returns.
pub trait GameActor: Any + Send {
    /// Called once when the actor enters the world. Register listeners,
    /// self handlers, and timers here.
    fn on_entered_world(&mut self, _ctx: &mut GmContext<'_>) {}

    /// Called at end of frame while the actor is being removed. The actor
    /// may still queue messages and delete other actors.
    fn on_removed_from_world(&mut self, _ctx: &mut GmContext<'_>) {}

    /// Frame update for locally owned actors.
    fn on_tick_local(&mut self, _ctx: &mut GmContext<'_>, _msg: &Message) {}

    /// Frame update for remotely owned actor mirrors.
    fn on_tick_remote(&mut self, _ctx: &mut GmContext<'_>, _msg: &Message) {}

    /// Catch-all handler for subscribed or addressed messages.
    fn process_message(&mut self, _ctx: &mut GmContext<'_>, _msg: &Message) {}

    /// Route a named invokable to a handler.
    ///
    /// The default covers the standard names; override to add custom
    /// invokables, falling back to this for the rest. An unknown name is an
    /// error the kernel logs and survives.
    fn invoke(
        &mut self,
        ctx: &mut GmContext<'_>,
        invokable: &str,
        msg: &Message,
    ) -> Result<(), GmError> {
        match invokable {
            invokables::TICK_LOCAL => self.on_tick_local(ctx, msg),
            invokables::TICK_REMOTE => self.on_tick_remote(ctx, msg),
            invokables::PROCESS_MESSAGE => self.process_message(ctx, msg),
            other => {
                return Err(GmError::UnknownInvokable {
                    actor: ctx.current_actor().unwrap_or_else(ActorId::nil),
                    invokable: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Registration parameters for a new actor.
#[derive(Debug, Clone)]
pub struct ActorDescriptor {
    pub name: String,
    pub actor_type: ActorType,
    /// True when this peer does not own the actor (networked mirror).
    pub remote: bool,
    /// Publish immediately after the actor enters the world. Local only.
    pub publish: bool,
}

impl ActorDescriptor {
    /// A locally owned, unpublished actor.
    pub fn local(name: impl Into<String>, actor_type: ActorType) -> Self {
        Self {
            name: name.into(),
            actor_type,
            remote: false,
            publish: false,
        }
    }

    /// A mirror of an actor owned by another peer.
    pub fn remote(name: impl Into<String>, actor_type: ActorType) -> Self {
        Self {
            name: name.into(),
            actor_type,
            remote: true,
            publish: false,
        }
    }

    /// Publish as soon as the actor enters the world.
    pub fn published(mut self) -> Self {
        self.publish = true;
        self
    }
}

/// Observable state of a registered actor.
#[derive(Debug, Clone)]
pub struct ActorInfo {
    pub id: ActorId,
    pub name: String,
    pub actor_type: ActorType,
    pub remote: bool,
    pub published: bool,
    pub state: ActorState,
}

/// Registry entry: the actor's metadata, its self-handler table, and the
/// boxed actor itself. The box is taken out while one of the actor's hooks
/// is running so the registry stays borrowable for queries.
pub(crate) struct ActorEntry {
    pub info: ActorInfo,
    /// Message-type to invokable names, consulted for messages addressed to
    /// this actor.
    pub self_handlers: HashMap<MessageType, Vec<String>>,
    pub actor: Option<Box<dyn GameActor>>,
}
