/// the gated queue: blocking put/get plus close and interrupt
pub mod queue;
pub use queue::CIFifoQueue;
pub use queue::CILifoQueue;
pub use queue::CIPriorityQueue;
pub use queue::CIQueue;

/// shutdown state of a queue
pub mod queue_state;
pub use queue_state::CIShutdownState;

/// ordering policies behind a queue
pub mod store;
pub use store::CIFifoStore;
pub use store::CILifoStore;
pub use store::CIPriorityStore;
pub use store::CIStore;

/// the errors
pub mod error;
pub use error::CIPutError;
pub use error::CIQueueError;

/// std or loom primitives
mod sync;

/// utils for internal usage
mod utils;
