//! Listener tables mapping message types to actor invokables.

use std::collections::HashMap;

use stagehand_core::enums::MessageType;
use stagehand_core::ids::ActorId;

/// One registration: which actor to invoke, and the invokable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListenerEntry {
    pub listener: ActorId,
    pub invokable: String,
}

/// Global and about-actor listener registrations.
///
/// Dispatch snapshots the matching entries before invoking anything, so
/// handlers may re-register freely; unregistration is eager.
#[derive(Default)]
pub(crate) struct ListenerTables {
    global: HashMap<MessageType, Vec<ListenerEntry>>,
    about: HashMap<MessageType, HashMap<ActorId, Vec<ListenerEntry>>>,
}

impl ListenerTables {
    pub fn register_global(&mut self, message_type: MessageType, listener: ActorId, invokable: String) {
        self.global
            .entry(message_type)
            .or_default()
            .push(ListenerEntry { listener, invokable });
    }

    pub fn unregister_global(
        &mut self,
        message_type: MessageType,
        listener: ActorId,
        invokable: &str,
    ) {
        if let Some(entries) = self.global.get_mut(&message_type) {
            if let Some(index) = entries
                .iter()
                .position(|e| e.listener == listener && e.invokable == invokable)
            {
                entries.remove(index);
            }
        }
    }

    pub fn register_about(
        &mut self,
        message_type: MessageType,
        target: ActorId,
        listener: ActorId,
        invokable: String,
    ) {
        self.about
            .entry(message_type)
            .or_default()
            .entry(target)
            .or_default()
            .push(ListenerEntry { listener, invokable });
    }

    pub fn unregister_about(
        &mut self,
        message_type: MessageType,
        target: ActorId,
        listener: ActorId,
        invokable: &str,
    ) {
        if let Some(targets) = self.about.get_mut(&message_type) {
            if let Some(entries) = targets.get_mut(&target) {
                entries.retain(|e| !(e.listener == listener && e.invokable == invokable));
            }
        }
    }

    /// Snapshot of the global listeners for a message type.
    pub fn global_for(&self, message_type: MessageType) -> Vec<ListenerEntry> {
        self.global
            .get(&message_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of the listeners registered against one target actor.
    pub fn about_for(&self, message_type: MessageType, target: ActorId) -> Vec<ListenerEntry> {
        self.about
            .get(&message_type)
            .and_then(|targets| targets.get(&target))
            .cloned()
            .unwrap_or_default()
    }

    /// Drop every registration involving the actor, as listener or target.
    pub fn unregister_all_for(&mut self, id: ActorId) {
        for entries in self.global.values_mut() {
            entries.retain(|e| e.listener != id);
        }
        for targets in self.about.values_mut() {
            targets.remove(&id);
            for entries in targets.values_mut() {
                entries.retain(|e| e.listener != id);
            }
        }
    }
}
