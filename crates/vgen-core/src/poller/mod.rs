//! Job poller: submits a job and tracks it to a terminal state.
//!
//! [`PollMachine`] holds the state machine and is free of I/O; [`Poller`]
//! runs it on tokio and hands the caller a [`PollSession`].

mod config;
mod event;
mod machine;
mod session;


pub use config::PollConfig;
pub use event::{Outcome, PollEvent};
pub use machine::{Action, Input, PollMachine, PollState, Step};
pub use session::{PollSession, Poller};
