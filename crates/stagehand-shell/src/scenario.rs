//! Demo scenario: seeded patrol actors reporting to a watchtower component.
//!
//! Each patrol wanders outward along a fence line, reports in on a repeating
//! timer, and raises a breach event when it crosses the perimeter; the
//! watchtower counts reports and deletes breaching patrols. The wander is
//! driven by per-actor `ChaCha8Rng` streams, so the same install seed
//! produces an identical run; the determinism tests rely on that.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use stagehand_core::constants::invokables;
use stagehand_core::enums::{ComponentPriority, MessageType};
use stagehand_core::error::GmError;
use stagehand_core::ids::ActorId;
use stagehand_core::message::{Message, MessagePayload};

use stagehand_kernel::actor::{ActorDescriptor, GameActor};
use stagehand_kernel::component::GmComponent;
use stagehand_kernel::context::GmContext;
use stagehand_kernel::factory::ActorType;
use stagehand_kernel::manager::GameManager;

/// Distance from the post at which a patrol has breached the perimeter.
pub const PERIMETER: f64 = 100.0;

/// Patrol wander speed (units per second at full step).
pub const PATROL_SPEED: f64 = 40.0;

/// Interval between patrol reports (simulation seconds).
pub const REPORT_INTERVAL_SECS: f64 = 0.5;

const REPORT_TIMER: &str = "patrol-report";
const BREACH_EVENT: &str = "perimeter-breach";

pub fn patrol_type() -> ActorType {
    ActorType::new("demo", "patrol")
}

/// A patrol wandering outward from the watchtower.
pub struct PatrolActor {
    rng: ChaCha8Rng,
    position: f64,
    breached: bool,
}

impl PatrolActor {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            position: 0.0,
            breached: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }
}

impl GameActor for PatrolActor {
    fn on_entered_world(&mut self, ctx: &mut GmContext<'_>) {
        ctx.register_for_ticks();
        ctx.handle_self(MessageType::TimerElapsed, invokables::PROCESS_MESSAGE);
        ctx.set_timer(
            REPORT_TIMER,
            ctx.current_actor(),
            REPORT_INTERVAL_SECS,
            true,
        );
    }

    fn on_tick_local(&mut self, ctx: &mut GmContext<'_>, msg: &Message) {
        let Some(tick) = msg.tick() else { return };
        self.position += self.rng.gen_range(0.0..2.0) * PATROL_SPEED * tick.delta_sim_time;

        if self.position > PERIMETER && !self.breached {
            self.breached = true;
            if let Some(id) = ctx.current_actor() {
                let breach = ctx
                    .new_message(MessageType::GameEvent)
                    .with_payload(MessagePayload::GameEvent {
                        event: BREACH_EVENT.into(),
                    })
                    .about(id);
                ctx.send_message(breach);
            }
        }
    }

    fn process_message(&mut self, ctx: &mut GmContext<'_>, msg: &Message) {
        let MessagePayload::TimerElapsed { timer_name, .. } = msg.payload() else {
            return;
        };
        if timer_name != REPORT_TIMER {
            return;
        }
        if let Some(info) = ctx.current_actor().and_then(|id| ctx.find_actor(id)) {
            let report = ctx
                .new_message(MessageType::ActorUpdated)
                .about(info.id)
                .with_payload(MessagePayload::ActorUpdate {
                    name: info.name,
                    category: info.actor_type.category,
                    type_name: info.actor_type.name,
                });
            ctx.send_message(report);
        }
    }
}

/// Counts patrol reports and deletes patrols that breach the perimeter.
#[derive(Default)]
pub struct Watchtower {
    reports: u64,
    breaches: u64,
    last_breach: Option<ActorId>,
}

impl Watchtower {
    pub fn reports(&self) -> u64 {
        self.reports
    }

    pub fn breaches(&self) -> u64 {
        self.breaches
    }

    pub fn last_breach(&self) -> Option<ActorId> {
        self.last_breach
    }
}

impl GmComponent for Watchtower {
    fn name(&self) -> &str {
        "watchtower"
    }

    fn process_message(&mut self, ctx: &mut GmContext<'_>, msg: &Message) {
        match msg.payload() {
            MessagePayload::ActorUpdate { .. }
                if msg.message_type() == MessageType::ActorUpdated =>
            {
                self.reports += 1;
            }
            MessagePayload::GameEvent { event } if event == BREACH_EVENT => {
                self.breaches += 1;
                if let Some(about) = msg.about_actor() {
                    self.last_breach = Some(about);
                    ctx.delete_actor(about);
                }
            }
            _ => {}
        }
    }
}

/// Register the patrol type, add the watchtower, and spawn the patrols.
///
/// Each patrol gets its own rng stream derived from the install seed, so a
/// given (seed, patrol_count) pair always produces the same run.
pub fn install(manager: &mut GameManager, seed: u64, patrol_count: usize) -> Result<(), GmError> {
    let next_stream = AtomicU64::new(0);
    manager.factory_mut().register(patrol_type(), move || {
        let stream = next_stream.fetch_add(1, Ordering::Relaxed);
        let actor: Box<dyn GameActor> = Box::new(PatrolActor::new(seed.wrapping_add(stream)));
        actor
    });

    manager.add_component(Box::new(Watchtower::default()), ComponentPriority::Normal)?;

    for i in 0..patrol_count {
        let actor = manager.create_actor(&patrol_type())?;
        manager.add_actor(
            actor,
            ActorDescriptor::local(format!("patrol-{i}"), patrol_type()),
        )?;
    }
    Ok(())
}
