pub mod advisory;
pub mod fallback;
pub mod orchestrator;
pub mod session;

pub use advisory::AdvisoryDesk;
pub use fallback::FallbackAdvisoryResolver;
pub use orchestrator::{Advance, ProgressiveOrchestrator};
pub use session::{Phase, Snapshot, Status};
