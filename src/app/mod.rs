// Application layer - Job intake, processing and batch scheduling

pub mod container;
pub mod intake;
pub mod processor;
pub mod scheduler;

pub use container::{AppContainer, DefaultAppContainer, MediaBackend};
pub use intake::Intake;
pub use processor::JobProcessor;
pub use scheduler::{BatchScheduler, BatchSnapshot, DEFAULT_CONCURRENCY};
