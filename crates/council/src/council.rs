//! Council deliberation engine: a fixed cast of advisor personas argues a
//! query over three rounds, with each advisor's statement produced by one of
//! the configured providers. Sessions are consumed as a pull-based event
//! stream so callers can forward progress incrementally.

pub mod advisors;
pub mod orchestrator;
pub mod session;
pub mod types;

pub use advisors::Advisor;
pub use orchestrator::CouncilOrchestrator;
pub use session::CouncilSession;
pub use types::{CouncilEvent, CouncilResult, CouncilWebResponse, Statement};
