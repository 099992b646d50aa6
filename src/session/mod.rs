//! Session orchestration: state, progress, errors, and the command loop.

pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod state;

pub use error::{SessionError, SessionErrorChannel};
pub use orchestrator::{SessionCommand, SessionEvent, SessionOpError, SessionOrchestrator};
pub use progress::{ProgressStage, ProgressState};
pub use state::{new_shared_session, SessionPhase, SessionState, SharedSession};
