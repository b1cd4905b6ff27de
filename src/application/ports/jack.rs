//! Jack-presence detector port interface

use crate::domain::error::JackError;
use crate::domain::recording::JackState;

/// Port for polling whether the input jack is inserted
pub trait JackDetector: Send + Sync {
    fn poll(&self) -> Result<JackState, JackError>;
}
