//! OS entropy pool floor check.
//!
//! Introspecting the host OS's entropy pool is explicitly out of the core's
//! scope; what the core *does* own is the policy: refuse to draw
//! key material if the pool is reported thin, after waiting up to a bounded
//! deadline. The actual introspection is injected through [`EntropySource`]
//! so the core never reaches into `/proc` or a platform API itself — the
//! production implementation of that trait lives outside this crate's
//! "THE CORE" boundary, the same way `tt_priv_cli.rs`'s `PepperProvider`
//! trait keeps OS-local file access behind a seam instead of inlining it
//! into the KDF/AEAD code.

use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::error::{Result, SbkError};

/// Reports how many bytes of estimated entropy the OS pool currently holds.
pub trait EntropySource {
    fn available_bytes(&self) -> usize;
}

/// Always reports a fixed value; used in tests and as a no-op default for
/// platforms where pool introspection isn't wired up.
pub struct FixedEntropySource(pub usize);

impl EntropySource for FixedEntropySource {
    fn available_bytes(&self) -> usize {
        self.0
    }
}

/// Poll `source` until it reports at least `floor` bytes or `max_wait`
/// elapses, sleeping in short increments between polls (the only
/// entropy-related suspension point).
pub fn wait_for_entropy(
    source: &dyn EntropySource,
    floor: usize,
    max_wait: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        if source.available_bytes() >= floor {
            return Ok(());
        }
        if start.elapsed() >= max_wait {
            return Err(SbkError::InsufficientEntropy {
                floor,
                waited_secs: start.elapsed().as_secs(),
            });
        }
        sleep(Duration::from_millis(100).min(max_wait - start.elapsed()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sufficient_entropy_returns_immediately() {
        let src = FixedEntropySource(32);
        assert!(wait_for_entropy(&src, 16, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn insufficient_entropy_times_out() {
        let src = FixedEntropySource(4);
        let err = wait_for_entropy(&src, 16, Duration::from_millis(150)).unwrap_err();
        assert!(matches!(err, SbkError::InsufficientEntropy { floor: 16, .. }));
    }
}
