use std::collections::HashSet;

use crate::foundation::error::{StageError, StageResult};
use crate::foundation::math::mix3;

const SUFFIX_LEN: u32 = 5;
const KEYSPACE: u64 = 26u64.pow(SUFFIX_LEN);

/// Issues `<prefix>_<5 lowercase letters>` identifiers, unique for the lifetime of one document.
///
/// Suffixes are drawn from a seeded hash stream. After `max_retries` collisions the registry
/// sweeps the keyspace from the last draw, so generation always terminates.
#[derive(Clone, Debug)]
pub struct IdRegistry {
    taken: HashSet<String>,
    seed: u64,
    counter: u64,
    max_retries: u32,
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new(crate::protocol::now_millis(), Self::DEFAULT_MAX_RETRIES)
    }
}

impl IdRegistry {
    /// Random draws attempted before the deterministic sweep.
    pub const DEFAULT_MAX_RETRIES: u32 = 16;

    /// Registry drawing from `seed`.
    pub fn new(seed: u64, max_retries: u32) -> Self {
        Self {
            taken: HashSet::new(),
            seed,
            counter: 0,
            max_retries,
        }
    }

    /// Generate and record a fresh identifier.
    pub fn generate(&mut self, prefix: &str) -> StageResult<String> {
        let mut last = 0u64;
        for attempt in 0..self.max_retries {
            self.counter = self.counter.wrapping_add(1);
            last = mix3(self.seed, self.counter, u64::from(attempt)) % KEYSPACE;
            let candidate = format_id(prefix, last);
            if self.taken.insert(candidate.clone()) {
                return Ok(candidate);
            }
            tracing::debug!(%candidate, attempt, "identifier collision");
        }

        for step in 1..=KEYSPACE {
            let candidate = format_id(prefix, (last + step) % KEYSPACE);
            if self.taken.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(StageError::validation(format!(
            "identifier space for prefix '{prefix}' is exhausted"
        )))
    }

    /// Mark identifiers as already taken.
    pub fn seed_existing<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.taken.extend(ids.into_iter().map(Into::into));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }

    /// Forget every identifier; the draw stream keeps advancing.
    pub fn clear(&mut self) {
        self.taken.clear();
    }
}

fn format_id(prefix: &str, mut index: u64) -> String {
    let mut suffix = [b'a'; SUFFIX_LEN as usize];
    for slot in suffix.iter_mut() {
        *slot = b'a' + (index % 26) as u8;
        index /= 26;
    }
    let mut out = String::with_capacity(prefix.len() + 1 + SUFFIX_LEN as usize);
    out.push_str(prefix);
    out.push('_');
    out.extend(suffix.iter().map(|&b| char::from(b)));
    out
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/ids.rs"]
mod tests;
