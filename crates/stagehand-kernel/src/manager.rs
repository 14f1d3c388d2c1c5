//! The game manager: actor and component registries, message dispatch, and
//! the frame loop.
//!
//! Dispatch for one message runs components in priority order, then global
//! actor listeners, then the addressed actor's own handlers, then listeners
//! registered against the addressed actor. Everything is synchronous on the
//! caller's thread; handler-initiated mutation is queued on the handler's
//! [`GmContext`] and applied when it returns.

use std::any::Any;
use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use stagehand_core::constants::invokables;
use stagehand_core::enums::{ActorState, ComponentPriority, MessageType};
use stagehand_core::error::GmError;
use stagehand_core::ids::{ActorId, MachineInfo};
use stagehand_core::message::{Message, MessagePayload};
use stagehand_core::types::{GameClock, TickInfo};

use crate::actor::{ActorDescriptor, ActorEntry, ActorInfo, GameActor};
use crate::component::{ComponentSlot, GmComponent};
use crate::context::{GmContext, PendingOp};
use crate::factory::{ActorFactory, ActorType};
use crate::listeners::ListenerTables;
use crate::snapshot::KernelSnapshot;
use crate::statistics::{GmStatistics, StatsTracker};
use crate::timers::TimerQueue;

/// The central simulation kernel. Owns the actors and components and drives
/// the tick loop.
pub struct GameManager {
    machine: MachineInfo,
    clock: GameClock,
    factory: ActorFactory,
    components: Vec<ComponentSlot>,
    actors: HashMap<ActorId, ActorEntry>,
    /// Actors awaiting end-of-frame removal, in deletion order.
    delete_list: Vec<ActorId>,
    listeners: ListenerTables,
    send_queue: VecDeque<Message>,
    network_queue: VecDeque<Message>,
    sim_timers: TimerQueue,
    real_timers: TimerQueue,
    stats: StatsTracker,
}

impl GameManager {
    /// Create a game manager identified by a fresh machine with this name.
    pub fn new(machine_name: impl Into<String>) -> Self {
        Self::with_machine(MachineInfo::new(machine_name))
    }

    pub fn with_machine(machine: MachineInfo) -> Self {
        Self {
            machine,
            clock: GameClock::default(),
            factory: ActorFactory::default(),
            components: Vec::new(),
            actors: HashMap::new(),
            delete_list: Vec::new(),
            listeners: ListenerTables::default(),
            send_queue: VecDeque::new(),
            network_queue: VecDeque::new(),
            sim_timers: TimerQueue::default(),
            real_timers: TimerQueue::default(),
            stats: StatsTracker::default(),
        }
    }

    pub fn machine(&self) -> &MachineInfo {
        &self.machine
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn sim_time(&self) -> f64 {
        self.clock.sim_time
    }

    pub fn time_scale(&self) -> f64 {
        self.clock.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.clock.paused
    }

    pub fn factory(&self) -> &ActorFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ActorFactory {
        &mut self.factory
    }

    pub fn statistics(&self) -> GmStatistics {
        self.stats.totals
    }

    /// Seconds of real time between statistics log summaries. Zero disables.
    pub fn set_statistics_interval(&mut self, seconds: f64) {
        self.stats.set_interval(seconds);
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Add a component at the given priority.
    ///
    /// The list re-sorts by priority; the sort is stable, so components of
    /// equal priority keep their insertion order.
    pub fn add_component(
        &mut self,
        component: Box<dyn GmComponent>,
        priority: ComponentPriority,
    ) -> Result<(), GmError> {
        let name = component.name().to_string();
        if self.live_component_index(&name).is_some() {
            return Err(GmError::DuplicateComponentName(name));
        }

        self.components.push(ComponentSlot {
            name: name.clone(),
            priority,
            removed: false,
            component: Some(component),
        });
        self.components.sort_by_key(|slot| slot.priority.order_id());

        if let Some(index) = self.live_component_index(&name) {
            self.with_component_at(index, |component, ctx| component.on_added_to_gm(ctx));
        }
        Ok(())
    }

    /// Remove a component by name. The slot is tombstoned and swept on the
    /// next dispatch walk, so removal during dispatch is safe.
    pub fn remove_component(&mut self, name: &str) -> Result<(), GmError> {
        let index = self
            .live_component_index(name)
            .ok_or_else(|| GmError::UnknownComponent(name.to_string()))?;
        self.with_component_at(index, |component, ctx| component.on_removed_from_gm(ctx));
        self.components[index].removed = true;
        self.components[index].component = None;
        Ok(())
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.live_component_index(name).is_some()
    }

    /// Component names in delivery order.
    pub fn component_names(&self) -> Vec<String> {
        self.components
            .iter()
            .filter(|slot| !slot.removed)
            .map(|slot| slot.name.clone())
            .collect()
    }

    /// Borrow a component by concrete type and name.
    pub fn component<T: GmComponent>(&self, name: &str) -> Option<&T> {
        let index = self.live_component_index(name)?;
        let component = self.components[index].component.as_deref()?;
        let any: &dyn Any = component;
        any.downcast_ref::<T>()
    }

    fn live_component_index(&self, name: &str) -> Option<usize> {
        self.components
            .iter()
            .position(|slot| !slot.removed && slot.name == name)
    }

    // ------------------------------------------------------------------
    // Actors
    // ------------------------------------------------------------------

    /// Construct an actor from the factory by registered type.
    pub fn create_actor(&self, actor_type: &ActorType) -> Result<Box<dyn GameActor>, GmError> {
        self.factory.create(actor_type)
    }

    /// Add an actor under a freshly generated id. Returns the id.
    pub fn add_actor(
        &mut self,
        actor: Box<dyn GameActor>,
        descriptor: ActorDescriptor,
    ) -> Result<ActorId, GmError> {
        let id = ActorId::generate();
        self.add_actor_with_id(actor, id, descriptor)?;
        Ok(id)
    }

    /// Add an actor under a caller-provided id (remote mirrors arrive with
    /// their id fixed by the owning peer).
    ///
    /// Local actors announce themselves with an `ActorCreated` message; the
    /// entered-world hook runs before this call returns. Publishing a remote
    /// actor fails before any state is touched.
    pub fn add_actor_with_id(
        &mut self,
        actor: Box<dyn GameActor>,
        id: ActorId,
        descriptor: ActorDescriptor,
    ) -> Result<(), GmError> {
        if id.is_nil() {
            return Err(GmError::NilActorId);
        }
        if self.actors.contains_key(&id) {
            return Err(GmError::ActorAlreadyAdded(id));
        }
        if descriptor.publish && descriptor.remote {
            return Err(GmError::ActorIsRemote(id));
        }

        let info = ActorInfo {
            id,
            name: descriptor.name,
            actor_type: descriptor.actor_type,
            remote: descriptor.remote,
            published: false,
            state: ActorState::Created,
        };
        let announce = if descriptor.remote {
            // Remote mirrors are created in response to a network message;
            // announcing them again is noise.
            None
        } else {
            Some(
                self.new_message(MessageType::ActorCreated)
                    .about(id)
                    .with_payload(MessagePayload::ActorUpdate {
                        name: info.name.clone(),
                        category: info.actor_type.category.clone(),
                        type_name: info.actor_type.name.clone(),
                    }),
            )
        };

        self.actors.insert(
            id,
            ActorEntry {
                info,
                self_handlers: HashMap::new(),
                actor: Some(actor),
            },
        );
        if let Some(message) = announce {
            self.send_queue.push_back(message);
        }

        if let Some(entry) = self.actors.get_mut(&id) {
            entry.info.state = ActorState::InWorld;
        }
        self.with_actor_hook(id, |actor, ctx| actor.on_entered_world(ctx));

        if descriptor.publish {
            self.publish_actor(id)?;
        }
        Ok(())
    }

    /// Publish a local actor, announcing it with `ActorPublished`.
    pub fn publish_actor(&mut self, id: ActorId) -> Result<(), GmError> {
        let entry = self.actors.get_mut(&id).ok_or(GmError::ActorNotFound(id))?;
        if entry.info.remote {
            return Err(GmError::ActorIsRemote(id));
        }
        entry.info.published = true;

        let message = Message::new(MessageType::ActorPublished, self.machine.id).about(id);
        self.send_queue.push_back(message);
        Ok(())
    }

    /// Mark an actor for removal at the end of the current frame.
    ///
    /// The actor keeps its registry entry (state `PendingRemoval`) until the
    /// end-of-frame removal pass so in-flight messages can still resolve it.
    /// Local actors announce the removal with `ActorDeleted`.
    pub fn delete_actor(&mut self, id: ActorId) {
        let (state, remote) = match self.actors.get(&id) {
            Some(entry) => (entry.info.state, entry.info.remote),
            None => {
                debug!("delete requested for unknown actor {id}");
                return;
            }
        };
        if state != ActorState::InWorld {
            return;
        }

        if let Some(entry) = self.actors.get_mut(&id) {
            entry.info.state = ActorState::PendingRemoval;
        }
        self.delete_list.push(id);

        if !remote {
            let message = Message::new(MessageType::ActorDeleted, self.machine.id).about(id);
            self.send_queue.push_back(message);
        }
    }

    /// Delete every actor. With `immediate`, the queue is drained and the
    /// removal loop runs before this returns; otherwise removal happens at
    /// the usual end-of-frame point.
    pub fn delete_all_actors(&mut self, immediate: bool) {
        // Clear the timers first so each removal does not rescan them.
        self.sim_timers.clear_all();
        self.real_timers.clear_all();

        let ids: Vec<ActorId> = self.actors.keys().copied().collect();
        for id in ids {
            self.delete_actor(id);
        }

        if immediate {
            loop {
                self.drain_send_queue();
                if self.remove_deleted_actors() {
                    break;
                }
            }
        }
    }

    pub fn find_actor(&self, id: ActorId) -> Option<&ActorInfo> {
        self.actors.get(&id).map(|entry| &entry.info)
    }

    pub fn all_actors(&self) -> Vec<&ActorInfo> {
        self.actors.values().map(|entry| &entry.info).collect()
    }

    pub fn find_actors_by_name(&self, name: &str) -> Vec<&ActorInfo> {
        self.actors
            .values()
            .filter(|entry| entry.info.name == name)
            .map(|entry| &entry.info)
            .collect()
    }

    pub fn find_actors_by_type(&self, actor_type: &ActorType) -> Vec<&ActorInfo> {
        self.actors
            .values()
            .filter(|entry| &entry.info.actor_type == actor_type)
            .map(|entry| &entry.info)
            .collect()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Borrow an actor by concrete type.
    pub fn actor<T: GameActor>(&self, id: ActorId) -> Option<&T> {
        let actor = self.actors.get(&id)?.actor.as_deref()?;
        let any: &dyn Any = actor;
        any.downcast_ref::<T>()
    }

    /// Mutably borrow an actor by concrete type.
    pub fn actor_mut<T: GameActor>(&mut self, id: ActorId) -> Option<&mut T> {
        let actor = self.actors.get_mut(&id)?.actor.as_deref_mut()?;
        let any: &mut dyn Any = actor;
        any.downcast_mut::<T>()
    }

    // ------------------------------------------------------------------
    // Listener registration
    // ------------------------------------------------------------------

    pub fn register_for_messages(
        &mut self,
        message_type: MessageType,
        listener: ActorId,
        invokable: impl Into<String>,
    ) -> Result<(), GmError> {
        if message_type.components_only() {
            return Err(GmError::ComponentsOnly { message_type });
        }
        self.listeners
            .register_global(message_type, listener, invokable.into());
        Ok(())
    }

    pub fn unregister_for_messages(
        &mut self,
        message_type: MessageType,
        listener: ActorId,
        invokable: &str,
    ) {
        self.listeners
            .unregister_global(message_type, listener, invokable);
    }

    pub fn register_for_messages_about_actor(
        &mut self,
        message_type: MessageType,
        target: ActorId,
        listener: ActorId,
        invokable: impl Into<String>,
    ) -> Result<(), GmError> {
        if message_type.components_only() {
            return Err(GmError::ComponentsOnly { message_type });
        }
        self.listeners
            .register_about(message_type, target, listener, invokable.into());
        Ok(())
    }

    pub fn unregister_for_messages_about_actor(
        &mut self,
        message_type: MessageType,
        target: ActorId,
        listener: ActorId,
        invokable: &str,
    ) {
        self.listeners
            .unregister_about(message_type, target, listener, invokable);
    }

    /// Map a message type addressed to `id` to one of the actor's own
    /// invokables.
    pub fn register_self_handler(
        &mut self,
        id: ActorId,
        message_type: MessageType,
        invokable: impl Into<String>,
    ) -> Result<(), GmError> {
        if message_type.components_only() {
            return Err(GmError::ComponentsOnly { message_type });
        }
        let entry = self.actors.get_mut(&id).ok_or(GmError::ActorNotFound(id))?;
        entry
            .self_handlers
            .entry(message_type)
            .or_default()
            .push(invokable.into());
        Ok(())
    }

    /// Subscribe an actor to the tick path matching its ownership.
    pub fn register_for_ticks(&mut self, id: ActorId) -> Result<(), GmError> {
        let remote = self
            .actors
            .get(&id)
            .map(|entry| entry.info.remote)
            .ok_or(GmError::ActorNotFound(id))?;
        if remote {
            self.register_for_messages(MessageType::TickRemote, id, invokables::TICK_REMOTE)
        } else {
            self.register_for_messages(MessageType::TickLocal, id, invokables::TICK_LOCAL)
        }
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Build a message of the given type stamped with this peer as source.
    pub fn new_message(&self, message_type: MessageType) -> Message {
        Message::new(message_type, self.machine.id)
    }

    /// Queue a message for processing this frame.
    pub fn send_message(&mut self, message: Message) {
        self.send_queue.push_back(message);
    }

    /// Queue a message for the network dispatch path. Network traffic only
    /// ever reaches components.
    pub fn send_network_message(&mut self, message: Message) {
        self.network_queue.push_back(message);
    }

    /// Reject a request message. The rejection carries the causing message;
    /// it goes on the process queue when the offender is this machine, on
    /// the network queue otherwise, so it eventually reaches its sender.
    pub fn reject_message(&mut self, causing: &Message, reason: impl Into<String>) {
        let reject = self
            .new_message(MessageType::ServerRequestRejected)
            .with_payload(MessagePayload::Rejected {
                reason: reason.into(),
            })
            .to_machine(causing.source())
            .caused_by(causing.clone());

        if causing.source() == self.machine.id {
            self.send_message(reject);
        } else {
            self.send_network_message(reject);
        }
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Arm a simulation-clock timer.
    pub fn set_timer(
        &mut self,
        name: impl Into<String>,
        about: Option<ActorId>,
        seconds: f64,
        repeat: bool,
    ) {
        self.sim_timers
            .set(name.into(), about, seconds, repeat, self.clock.sim_micros());
    }

    /// Arm a real-clock timer. These keep firing while paused.
    pub fn set_real_timer(
        &mut self,
        name: impl Into<String>,
        about: Option<ActorId>,
        seconds: f64,
        repeat: bool,
    ) {
        self.real_timers
            .set(name.into(), about, seconds, repeat, self.clock.real_micros());
    }

    /// Clear a timer by name and bound actor. No-op if none matches.
    pub fn clear_timer(&mut self, name: &str, about: Option<ActorId>) {
        self.sim_timers.clear(name, about);
        self.real_timers.clear(name, about);
    }

    // ------------------------------------------------------------------
    // Pause and time settings
    // ------------------------------------------------------------------

    /// Pause or resume the simulation clock. A no-op when the state does not
    /// change; otherwise fires `Paused`/`Resumed`.
    pub fn set_paused(&mut self, paused: bool) {
        if self.clock.paused == paused {
            return;
        }
        self.clock.paused = paused;
        let message_type = if paused {
            MessageType::Paused
        } else {
            MessageType::Resumed
        };
        let message = self.new_message(message_type);
        self.send_queue.push_back(message);
    }

    /// Set the simulation time and time scale, firing `TimeChanged`.
    pub fn change_time_settings(&mut self, sim_time: f64, time_scale: f64) {
        self.clock.sim_time = sim_time;
        self.clock.time_scale = time_scale;
        let message = self
            .new_message(MessageType::TimeChanged)
            .with_payload(MessagePayload::TimeChange {
                sim_time,
                time_scale,
            });
        self.send_queue.push_back(message);
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Advance the clock by one frame of real time and run all three frame
    /// phases.
    pub fn step(&mut self, delta_real: f64) {
        let tick = self.clock.advance(delta_real);
        self.pre_frame(&tick);
        self.frame(&tick);
        self.post_frame(&tick);
    }

    /// The pre-frame phase: network drain, tick local, timers, tick remote,
    /// deferred actor removal, and the components-only end-of-frame tick.
    pub fn pre_frame(&mut self, tick: &TickInfo) {
        self.drain_network_queue();

        // Tick local and everything it provokes.
        let message = self.tick_message(MessageType::TickLocal, tick);
        self.send_queue.push_back(message);
        self.fire_timers();
        self.drain_send_queue();

        // Tick remote comes after all responses to tick local.
        let message = self.tick_message(MessageType::TickRemote, tick);
        self.send_queue.push_back(message);
        self.drain_send_queue();

        // Deferred removal. Actors may delete other actors from their
        // removed-from-world hook, so drain and remove until quiescent.
        loop {
            self.drain_send_queue();
            if self.remove_deleted_actors() {
                break;
            }
        }
        self.drain_send_queue();

        let message = self.tick_message(MessageType::TickEndOfFrame, tick);
        self.dispatch_to_components(&message, false);
    }

    /// The frame phase: broadcast `FrameSynch`.
    pub fn frame(&mut self, tick: &TickInfo) {
        let message = self.tick_message(MessageType::FrameSynch, tick);
        self.process_one_message(message);
    }

    /// The post-frame phase: broadcast `PostFrame` and drain what it
    /// provoked.
    pub fn post_frame(&mut self, tick: &TickInfo) {
        let message = self.tick_message(MessageType::PostFrame, tick);
        self.process_one_message(message);
        self.drain_send_queue();
        self.stats.frame_complete(self.clock.real_time);
    }

    /// Shut the kernel down: remove every actor immediately, then every
    /// component, and drop whatever is still queued.
    pub fn shutdown(&mut self) {
        debug!("game manager shutting down");
        self.delete_all_actors(true);
        self.drain_send_queue();

        for name in self.component_names() {
            if let Err(err) = self.remove_component(&name) {
                warn!("failed to remove component during shutdown: {err}");
            }
        }
        self.components.clear();
        self.send_queue.clear();
        self.network_queue.clear();
    }

    /// Build a snapshot of observable kernel state.
    pub fn snapshot(&self) -> KernelSnapshot {
        let mut local_actors = 0;
        let mut remote_actors = 0;
        let mut pending_removal = 0;
        for entry in self.actors.values() {
            match entry.info.state {
                ActorState::PendingRemoval | ActorState::Removed => pending_removal += 1,
                _ if entry.info.remote => remote_actors += 1,
                _ => local_actors += 1,
            }
        }
        KernelSnapshot {
            sim_time: self.clock.sim_time,
            real_time: self.clock.real_time,
            time_scale: self.clock.time_scale,
            paused: self.clock.paused,
            local_actors,
            remote_actors,
            pending_removal,
            components: self.component_names(),
            queued_messages: self.send_queue.len() + self.network_queue.len(),
            pending_timers: self.sim_timers.len() + self.real_timers.len(),
            statistics: self.stats.totals,
        }
    }

    // ------------------------------------------------------------------
    // Dispatch internals
    // ------------------------------------------------------------------

    fn tick_message(&self, message_type: MessageType, tick: &TickInfo) -> Message {
        self.new_message(message_type)
            .with_payload(MessagePayload::Tick {
                delta_sim_time: tick.delta_sim_time,
                delta_real_time: tick.delta_real_time,
                time_scale: tick.time_scale,
                sim_time: tick.sim_time,
            })
            .to_machine(self.machine.id)
    }

    /// Emit `TimerElapsed` for every due timer, real clock first.
    fn fire_timers(&mut self) {
        let mut fired = self.real_timers.advance(self.clock.real_micros());
        fired.extend(self.sim_timers.advance(self.clock.sim_micros()));

        for elapsed in fired {
            let mut message = self
                .new_message(MessageType::TimerElapsed)
                .with_payload(MessagePayload::TimerElapsed {
                    timer_name: elapsed.name,
                    late_time: elapsed.late_secs,
                });
            if let Some(about) = elapsed.about_actor {
                message = message.about(about);
            }
            self.send_queue.push_back(message);
        }
    }

    /// Process queued messages until the queue is empty. Handlers may queue
    /// more; those are processed in the same drain.
    fn drain_send_queue(&mut self) {
        while let Some(message) = self.send_queue.pop_front() {
            self.process_one_message(message);
        }
    }

    fn drain_network_queue(&mut self) {
        while let Some(message) = self.network_queue.pop_front() {
            self.stats.totals.network_messages_sent += 1;
            self.dispatch_to_components(&message, true);
        }
    }

    /// Full delivery for one message: components, global listeners, the
    /// addressed actor, listeners about the addressed actor.
    fn process_one_message(&mut self, message: Message) {
        self.stats.totals.messages_processed += 1;

        self.dispatch_to_components(&message, false);
        self.invoke_global_listeners(&message);

        if let Some(about) = message.about_actor() {
            self.invoke_self_handlers(&message, about);
            self.invoke_about_listeners(&message, about);
        }
    }

    fn dispatch_to_components(&mut self, message: &Message, to_network: bool) {
        let mut index = 0;
        while index < self.components.len() {
            if self.components[index].removed {
                // Tombstone from an earlier removal; sweep it.
                self.components.remove(index);
                continue;
            }
            let Some(mut component) = self.components[index].component.take() else {
                index += 1;
                continue;
            };

            let mut ops = Vec::new();
            {
                let mut ctx = GmContext::new(
                    &mut ops,
                    &self.actors,
                    &self.factory,
                    &self.clock,
                    &self.machine,
                    None,
                );
                if to_network {
                    component.dispatch_network_message(&mut ctx, message);
                } else {
                    component.process_message(&mut ctx, message);
                }
            }
            self.components[index].component = Some(component);
            self.apply_ops(ops);
            index += 1;
        }
    }

    fn invoke_global_listeners(&mut self, message: &Message) {
        for entry in self.listeners.global_for(message.message_type()) {
            match self.actors.get(&entry.listener).map(|e| e.info.state) {
                Some(ActorState::InWorld) => {
                    self.invoke_on_actor(entry.listener, &entry.invokable, message);
                }
                Some(_) => debug!(
                    "skipping listener {}: actor is no longer in the world",
                    entry.listener
                ),
                None => debug!("skipping listener {}: actor no longer exists", entry.listener),
            }
        }
    }

    fn invoke_self_handlers(&mut self, message: &Message, about: ActorId) {
        let handler_names = match self.actors.get(&about) {
            Some(entry) if entry.info.state == ActorState::InWorld => entry
                .self_handlers
                .get(&message.message_type())
                .cloned()
                .unwrap_or_default(),
            Some(_) => {
                debug!(
                    "message {:?} is about actor {about}, which is leaving the world",
                    message.message_type()
                );
                return;
            }
            None => {
                warn!(
                    "message {:?} is about actor {about}, which is not registered; \
                     components were still notified",
                    message.message_type()
                );
                return;
            }
        };

        for invokable in handler_names {
            self.invoke_on_actor(about, &invokable, message);
        }
    }

    fn invoke_about_listeners(&mut self, message: &Message, about: ActorId) {
        for entry in self.listeners.about_for(message.message_type(), about) {
            match self.actors.get(&entry.listener).map(|e| e.info.state) {
                Some(ActorState::InWorld) => {
                    self.invoke_on_actor(entry.listener, &entry.invokable, message);
                }
                Some(_) | None => debug!(
                    "skipping about-actor listener {}: no longer available",
                    entry.listener
                ),
            }
        }
    }

    /// Invoke one named invokable on one actor, applying whatever it queued.
    fn invoke_on_actor(&mut self, id: ActorId, invokable: &str, message: &Message) {
        let Some(mut actor) = self.actors.get_mut(&id).and_then(|e| e.actor.take()) else {
            return;
        };

        debug!(
            "invoking `{invokable}` on actor {id} for {:?}",
            message.message_type()
        );
        let mut ops = Vec::new();
        let result = {
            let mut ctx = GmContext::new(
                &mut ops,
                &self.actors,
                &self.factory,
                &self.clock,
                &self.machine,
                Some(id),
            );
            actor.invoke(&mut ctx, invokable, message)
        };
        if let Some(entry) = self.actors.get_mut(&id) {
            entry.actor = Some(actor);
        }
        if let Err(err) = result {
            warn!(
                "listener for {:?} failed: {err}",
                message.message_type()
            );
        }
        self.apply_ops(ops);
    }

    /// Run one lifecycle hook on an actor with a fresh op buffer.
    fn with_actor_hook<F>(&mut self, id: ActorId, hook: F)
    where
        F: FnOnce(&mut dyn GameActor, &mut GmContext<'_>),
    {
        let Some(mut actor) = self.actors.get_mut(&id).and_then(|e| e.actor.take()) else {
            return;
        };
        let mut ops = Vec::new();
        {
            let mut ctx = GmContext::new(
                &mut ops,
                &self.actors,
                &self.factory,
                &self.clock,
                &self.machine,
                Some(id),
            );
            hook(actor.as_mut(), &mut ctx);
        }
        if let Some(entry) = self.actors.get_mut(&id) {
            entry.actor = Some(actor);
        }
        self.apply_ops(ops);
    }

    fn with_component_at<F>(&mut self, index: usize, hook: F)
    where
        F: FnOnce(&mut dyn GmComponent, &mut GmContext<'_>),
    {
        let Some(mut component) = self.components[index].component.take() else {
            return;
        };
        let mut ops = Vec::new();
        {
            let mut ctx = GmContext::new(
                &mut ops,
                &self.actors,
                &self.factory,
                &self.clock,
                &self.machine,
                None,
            );
            hook(component.as_mut(), &mut ctx);
        }
        self.components[index].component = Some(component);
        self.apply_ops(ops);
    }

    /// Remove the actors queued for deletion when this pass started.
    ///
    /// Removed-from-world hooks may delete more actors; those stay queued
    /// for the next pass. Returns true when the delete list is empty.
    fn remove_deleted_actors(&mut self) -> bool {
        let batch = std::mem::take(&mut self.delete_list);
        for id in batch {
            if let Some(entry) = self.actors.get_mut(&id) {
                entry.info.state = ActorState::Removed;
            } else {
                continue;
            }
            self.with_actor_hook(id, |actor, ctx| actor.on_removed_from_world(ctx));
            self.listeners.unregister_all_for(id);
            self.sim_timers.clear_for_actor(id);
            self.real_timers.clear_for_actor(id);
            self.actors.remove(&id);
        }
        self.delete_list.is_empty()
    }

    /// Apply the ops a handler queued. May recurse through actor adds,
    /// whose entered-world hooks queue ops of their own.
    fn apply_ops(&mut self, ops: Vec<PendingOp>) {
        for op in ops {
            match op {
                PendingOp::SendMessage(message) => self.send_queue.push_back(message),
                PendingOp::SendNetworkMessage(message) => self.network_queue.push_back(message),
                PendingOp::AddActor { actor, descriptor } => {
                    if let Err(err) = self.add_actor(actor, descriptor) {
                        warn!("queued actor add failed: {err}");
                    }
                }
                PendingOp::DeleteActor(id) => self.delete_actor(id),
                PendingOp::RegisterGlobal {
                    message_type,
                    listener,
                    invokable,
                } => {
                    if let Err(err) = self.register_for_messages(message_type, listener, invokable)
                    {
                        warn!("queued listener registration failed: {err}");
                    }
                }
                PendingOp::UnregisterGlobal {
                    message_type,
                    listener,
                    invokable,
                } => self.unregister_for_messages(message_type, listener, &invokable),
                PendingOp::RegisterAboutActor {
                    message_type,
                    target,
                    listener,
                    invokable,
                } => {
                    if let Err(err) = self.register_for_messages_about_actor(
                        message_type,
                        target,
                        listener,
                        invokable,
                    ) {
                        warn!("queued about-actor registration failed: {err}");
                    }
                }
                PendingOp::UnregisterAboutActor {
                    message_type,
                    target,
                    listener,
                    invokable,
                } => self.unregister_for_messages_about_actor(
                    message_type,
                    target,
                    listener,
                    &invokable,
                ),
                PendingOp::RegisterSelfHandler {
                    actor,
                    message_type,
                    invokable,
                } => {
                    if let Err(err) = self.register_self_handler(actor, message_type, invokable) {
                        warn!("queued self-handler registration failed: {err}");
                    }
                }
                PendingOp::RegisterForTicks(id) => {
                    if let Err(err) = self.register_for_ticks(id) {
                        warn!("queued tick registration failed: {err}");
                    }
                }
                PendingOp::SetTimer {
                    name,
                    about,
                    seconds,
                    repeat,
                    real_time,
                } => {
                    if real_time {
                        self.set_real_timer(name, about, seconds, repeat);
                    } else {
                        self.set_timer(name, about, seconds, repeat);
                    }
                }
                PendingOp::ClearTimer { name, about } => self.clear_timer(&name, about),
                PendingOp::SetPaused(paused) => self.set_paused(paused),
                PendingOp::ChangeTimeSettings {
                    sim_time,
                    time_scale,
                } => self.change_time_settings(sim_time, time_scale),
                PendingOp::Reject { causing, reason } => self.reject_message(&causing, reason),
                PendingOp::RemoveComponent(name) => {
                    if let Err(err) = self.remove_component(&name) {
                        warn!("queued component removal failed: {err}");
                    }
                }
            }
        }
    }
}
