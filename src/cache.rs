use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::ast::Expression;
use crate::parser::{self, ParseError};
use crate::registry::FunctionRegistry;

/// A bounded parse cache keyed by expression text.
///
/// Parsed trees are immutable, so a hit hands back the same `Arc` the first
/// parse produced and evaluation proceeds exactly as if the text had been
/// parsed fresh. Eviction is least-recently-used. Parse failures are never
/// cached; retrying a bad expression re-parses it.
pub struct ParseCache {
    capacity: usize,
    inner: Mutex<CacheState>,
}

struct CacheState {
    entries: HashMap<String, Arc<Expression>>,
    recency: VecDeque<String>,
}

impl CacheState {
    fn touch(&mut self, text: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == text) {
            if let Some(key) = self.recency.remove(pos) {
                self.recency.push_back(key);
            }
        }
    }
}

impl ParseCache {
    /// A cache holding at most `capacity` parsed expressions.
    pub fn new(capacity: usize) -> Self {
        ParseCache {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheState {
                entries: HashMap::new(),
                recency: VecDeque::new(),
            }),
        }
    }

    /// Parse `text` against `registry`, reusing a previously parsed tree
    /// when the same text is seen again.
    pub fn get_or_parse(
        &self,
        text: &str,
        registry: &FunctionRegistry,
    ) -> Result<Arc<Expression>, ParseError> {
        let mut state = self.lock();
        if let Some(found) = state.entries.get(text).cloned() {
            state.touch(text);
            return Ok(found);
        }
        // Parse outside the lock; misses on the same text may race, the
        // first insert wins and later ones adopt it.
        drop(state);
        let parsed = Arc::new(parser::parse_with(text, registry)?);

        let mut state = self.lock();
        if let Some(found) = state.entries.get(text).cloned() {
            state.touch(text);
            return Ok(found);
        }
        state.entries.insert(text.to_string(), parsed.clone());
        state.recency.push_back(text.to_string());
        while state.entries.len() > self.capacity {
            match state.recency.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }
        Ok(parsed)
    }

    /// Number of cached expressions.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached expression, keeping the capacity.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.recency.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
