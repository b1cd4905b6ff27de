//! Recording domain module

pub mod artifact;
pub mod elapsed;
pub mod state;
pub mod status;

pub use artifact::{ArtifactName, ArtifactStatus};
pub use elapsed::Elapsed;
pub use state::{InvalidStateTransition, JackState, RecordingMode, RecordingState};
pub use status::{RecordingStatus, TransitionRecord};
