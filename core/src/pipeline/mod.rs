pub mod channel;
pub mod coordinator;
pub mod events;
pub mod feed;

pub use channel::Channel;
pub use coordinator::{PipelineCoordinator, SessionState, RANGE_GAP};
pub use events::{EventQueue, PipelineEvent};
pub use feed::{DetectionSource, FeedClosed, FeedHalt, FeedSender, FeedSource, IterSource};
