pub mod listener;
mod loop_worker;
pub mod payload;
pub mod simulated;
pub mod source;
pub mod state;

pub use listener::{FeedListener, ListenerConfig, ListenerSnapshot};
pub use payload::{FeedPayload, UNKNOWN_LABEL};
pub use simulated::{SimulatedFeed, SimulatedFeedConfig};
pub use source::{ChannelFeed, FeedSource};
pub use state::{ListenerEvent, ListenerState, ListenerStatus, Transition};
