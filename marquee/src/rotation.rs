use shared::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin selector over a fixed credential pool.
///
/// The counter is shared by every request; `fetch_add` keeps concurrent
/// callers from observing the same slot or skipping one.
pub struct KeyRotator {
    keys: Vec<String>,
    counter: AtomicUsize,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::Configuration(
                "credential pool must contain at least one key".into(),
            ));
        }

        Ok(Self {
            keys,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn next(&self) -> &str {
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        &self.keys[idx]
    }
}

impl fmt::Debug for KeyRotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRotator")
            .field("keys", &self.keys.len())
            .field("counter", &self.counter.load(Ordering::Relaxed))
            .finish()
    }
}
