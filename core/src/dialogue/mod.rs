pub mod engine;
pub mod message;
pub mod pacing;
pub mod rules;
pub mod script;
pub mod tasks;

pub use engine::{DialogueSession, DialogueState};
pub use message::{Message, Role, Timeline};
pub use pacing::{Pacer, ScriptedPacer, UniformPacer};
pub use rules::{classify, respond, ResponseRule, Topic, RESPONSE_RULES};
pub use script::{opening_for, Opening, FOLLOW_UP_PROMPT};
pub use tasks::TaskQueue;
