//! Id generator implementations.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::infrastructure::ports::IdGenerator;

/// Length of generated document ids.
pub const ID_LENGTH: usize = 16;

/// Random alphanumeric ids, the same shape as ids the game system assigns.
pub struct SystemIds;

impl SystemIds {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SystemIds {
    fn generate_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Deterministic ids for testing: `id00000000000000`, `id00000000000001`, ...
#[cfg(test)]
pub struct SequentialIds(std::sync::atomic::AtomicUsize);

#[cfg(test)]
impl SequentialIds {
    pub fn new() -> Self {
        Self(std::sync::atomic::AtomicUsize::new(0))
    }
}

#[cfg(test)]
impl IdGenerator for SequentialIds {
    fn generate_id(&self) -> String {
        let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        format!("id{:0width$}", n, width = ID_LENGTH - 2)
    }
}
