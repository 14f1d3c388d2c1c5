//! Kernel loop thread. Steps the game manager at a fixed rate and
//! publishes snapshots.
//!
//! The manager is built by the caller and moved into the thread. Commands
//! arrive via `mpsc` channel and are drained at the top of every frame;
//! the latest snapshot is stored in shared state for synchronous polling.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use stagehand_core::constants::TICK_RATE;
use stagehand_core::message::Message;
use stagehand_kernel::manager::GameManager;
use stagehand_kernel::snapshot::KernelSnapshot;

/// Nominal duration of one tick at 1x speed.
const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

/// Commands sent from other threads to the kernel loop.
#[derive(Debug)]
pub enum ShellCommand {
    /// Queue a message for processing at the next frame boundary.
    Post(Message),
    /// Pause or resume the simulation clock.
    SetPaused(bool),
    /// Change the simulation time scale, keeping the current sim time.
    SetTimeScale(f64),
    /// Shut the kernel down gracefully and end the loop thread.
    Shutdown,
}

/// Handle to a running kernel loop.
pub struct ShellHandle {
    command_tx: mpsc::Sender<ShellCommand>,
    latest_snapshot: Arc<Mutex<Option<KernelSnapshot>>>,
    join: JoinHandle<()>,
}

impl ShellHandle {
    /// A sender for background producers to post commands with.
    pub fn sender(&self) -> mpsc::Sender<ShellCommand> {
        self.command_tx.clone()
    }

    /// Post one message into the kernel.
    pub fn post(&self, message: Message) -> Result<(), mpsc::SendError<ShellCommand>> {
        self.command_tx.send(ShellCommand::Post(message))
    }

    /// The most recently published snapshot, if a frame has completed.
    pub fn latest_snapshot(&self) -> Option<KernelSnapshot> {
        self.latest_snapshot.lock().ok().and_then(|slot| slot.clone())
    }

    /// Request shutdown and wait for the loop thread to exit.
    pub fn shutdown(self) {
        let _ = self.command_tx.send(ShellCommand::Shutdown);
        let _ = self.join.join();
    }
}

/// Spawn the kernel loop in a new thread.
pub fn spawn_loop(manager: GameManager) -> ShellHandle {
    let (command_tx, command_rx) = mpsc::channel::<ShellCommand>();
    let latest_snapshot = Arc::new(Mutex::new(None));
    let snapshot_slot = Arc::clone(&latest_snapshot);

    let join = std::thread::Builder::new()
        .name("stagehand-kernel-loop".into())
        .spawn(move || {
            run_loop(manager, command_rx, &snapshot_slot);
        })
        .expect("Failed to spawn kernel loop thread");

    ShellHandle {
        command_tx,
        latest_snapshot,
        join,
    }
}

/// The kernel loop. Runs until Shutdown or channel disconnect.
fn run_loop(
    mut manager: GameManager,
    command_rx: mpsc::Receiver<ShellCommand>,
    latest_snapshot: &Mutex<Option<KernelSnapshot>>,
) {
    let mut next_tick_time = Instant::now();
    let mut last_frame = Instant::now();

    loop {
        // 1. Drain all pending commands
        loop {
            match command_rx.try_recv() {
                Ok(ShellCommand::Post(message)) => manager.send_message(message),
                Ok(ShellCommand::SetPaused(paused)) => manager.set_paused(paused),
                Ok(ShellCommand::SetTimeScale(scale)) => {
                    let sim_time = manager.sim_time();
                    manager.change_time_settings(sim_time, scale);
                }
                Ok(ShellCommand::Shutdown) | Err(mpsc::TryRecvError::Disconnected) => {
                    log::debug!("kernel loop exiting");
                    manager.shutdown();
                    return;
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }

        // 2. Advance one frame with the measured real delta
        let now = Instant::now();
        let delta_real = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;
        manager.step(delta_real);

        // 3. Publish the snapshot for synchronous polling
        if let Ok(mut slot) = latest_snapshot.lock() {
            *slot = Some(manager.snapshot());
        }

        // 4. Sleep until the next tick
        next_tick_time += TICK_DURATION;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > TICK_DURATION * 2 {
            // Too far behind; reset to avoid a catch-up spiral
            next_tick_time = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::enums::MessageType;
    use stagehand_core::ids::MachineInfo;

    #[test]
    fn test_command_channel_round_trip() {
        let (tx, rx) = mpsc::channel::<ShellCommand>();
        let machine = MachineInfo::new("test");

        tx.send(ShellCommand::Post(Message::new(
            MessageType::GameEvent,
            machine.id,
        )))
        .unwrap();
        tx.send(ShellCommand::SetPaused(true)).unwrap();
        tx.send(ShellCommand::Shutdown).unwrap();

        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }

        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], ShellCommand::Post(_)));
        assert!(matches!(commands[1], ShellCommand::SetPaused(true)));
        assert!(matches!(commands[2], ShellCommand::Shutdown));
    }

    #[test]
    fn test_tick_duration_constant() {
        // 30Hz = 33.333ms per tick
        let expected_nanos = 1_000_000_000u64 / TICK_RATE as u64;
        assert_eq!(TICK_DURATION.as_nanos(), expected_nanos as u128);
    }

    #[test]
    fn test_loop_publishes_snapshots_and_shuts_down() {
        let manager = GameManager::new("loop-test");
        let shell = spawn_loop(manager);

        // Give the loop a few frames to publish something.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut snapshot = None;
        while snapshot.is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            snapshot = shell.latest_snapshot();
        }
        let snapshot = snapshot.expect("loop published no snapshot within 2s");
        assert!(snapshot.real_time > 0.0);

        shell.shutdown();
    }

    #[test]
    fn test_paused_command_reaches_kernel() {
        let manager = GameManager::new("pause-test");
        let shell = spawn_loop(manager);
        shell
            .sender()
            .send(ShellCommand::SetPaused(true))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut paused = false;
        while !paused && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            paused = shell.latest_snapshot().map(|s| s.paused).unwrap_or(false);
        }
        assert!(paused, "kernel never observed the pause command");

        shell.shutdown();
    }
}
