// Interview sessions: state machine, in-memory store, and HTTP handlers.

pub mod handlers;
pub mod machine;
pub mod store;
