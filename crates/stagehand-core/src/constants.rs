//! Kernel constants and standard invokable names.

/// Default shell tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per tick at the default tick rate.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Standard invokable names routed by the default `GameActor::invoke`.
pub mod invokables {
    /// Routes to the actor's local-ownership tick hook.
    pub const TICK_LOCAL: &str = "Tick Local";

    /// Routes to the actor's remote-ownership tick hook.
    pub const TICK_REMOTE: &str = "Tick Remote";

    /// Routes to the actor's catch-all message handler.
    pub const PROCESS_MESSAGE: &str = "Process Message";
}
