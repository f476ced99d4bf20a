mod clock;
mod cycle;
mod engine;
mod reconcile;
pub(crate) mod settings;
mod stage;
mod state;

pub use clock::{count_down, reset, ClockTick};
pub use cycle::{advance, Advance, Transition, WorkCompleted};
pub use engine::TimerEngine;
pub use reconcile::{reconcile, tick, Reconciliation, TickOutcome};
pub use settings::Settings;
pub use stage::Stage;
pub use state::TimerState;
