//! Aggregate contract for state that is decided, persisted, then applied.

/// Aggregate execution semantics (pure, deterministic).
///
/// - **Decision logic**: `handle(&self, cmd)` returns the event to record.
/// - **State mutation**: `apply(&mut self, event)` evolves state.
///
/// Splitting the two lets a caller persist the event between deciding and
/// applying it, so nothing is visible in memory before it is durable.
/// Aggregates must not perform IO.
pub trait Aggregate {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single event.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which event to emit given the current state and a command.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    fn handle(&self, command: &Self::Command) -> Result<Self::Event, Self::Error>;
}
