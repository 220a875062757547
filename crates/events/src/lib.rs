//! Domain events and in-process event dispatch.

pub mod dispatcher;
pub mod event;

pub use dispatcher::{EventDispatcher, EventHandler};
pub use event::Event;
