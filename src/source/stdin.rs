use super::{Acquired, Target};
use crate::error::SourceError;
use crate::platform::Host;

/// Accepts stdin only when something is piped or redirected into it.
pub(super) fn acquire(host: &dyn Host) -> Result<Acquired, SourceError> {
    if host.stdin_is_terminal() {
        return Err(SourceError::NoStdin);
    }
    Ok(Acquired {
        target: Target::Stdin,
        transcript: String::new(),
    })
}
