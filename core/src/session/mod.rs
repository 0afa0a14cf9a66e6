pub mod controller;
pub mod machine;

pub use controller::{Analysis, SessionController};
pub use machine::{ready_for_analysis, SessionMachine, SessionState, Transition};
