//! Opt-in deduplication of repeated hits from the same source.

use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

type HitKey = (Ipv4Addr, String);

/// Remembers which (source, tag) pairs were exported recently.
///
/// A tag is let through at most once per `window` for a given source. The
/// table never holds more than `capacity` keys; the oldest admission is
/// forgotten first.
#[derive(Debug)]
pub struct HitSuppressor {
    capacity: usize,
    window: Duration,
    state: Mutex<HitTable>,
}

#[derive(Debug, Default)]
struct HitTable {
    seen: HashMap<HitKey, Instant>,
    order: VecDeque<(HitKey, Instant)>,
}

impl HitSuppressor {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            capacity,
            window,
            state: Mutex::new(HitTable::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn len(&self) -> usize {
        self.state.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the tags of `tags` that were not admitted for `source` within
    /// the window, and records them as admitted now.
    pub fn filter(&self, source: Ipv4Addr, tags: Vec<String>) -> Vec<String> {
        self.filter_at(source, tags, Instant::now())
    }

    pub(crate) fn filter_at(&self, source: Ipv4Addr, tags: Vec<String>, now: Instant) -> Vec<String> {
        let mut table = self.state.lock();
        table.expire(now, self.window);

        let mut admitted: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            let key: HitKey = (source, tag);
            if table.seen.contains_key(&key) {
                continue;
            }
            table.seen.insert(key.clone(), now);
            table.order.push_back((key.clone(), now));
            admitted.push(key.1);
        }

        table.evict(self.capacity);
        admitted
    }

    /// Forgets tags admitted by [`filter`](Self::filter) whose export did
    /// not go through, so the next hit for them is let through again.
    pub fn release(&self, source: Ipv4Addr, tags: &[String]) {
        let mut table = self.state.lock();
        for tag in tags {
            let key: HitKey = (source, tag.clone());
            if table.seen.remove(&key).is_some() {
                table.order.retain(|(queued, _)| queued != &key);
            }
        }
    }
}

impl HitTable {
    fn expire(&mut self, now: Instant, window: Duration) {
        while let Some((key, at)) = self.order.front() {
            if now.duration_since(*at) < window {
                break;
            }
            if self.seen.get(key) == Some(at) {
                self.seen.remove(key);
            }
            self.order.pop_front();
        }
    }

    fn evict(&mut self, capacity: usize) {
        while self.seen.len() > capacity {
            let Some((key, at)) = self.order.pop_front() else {
                break;
            };
            if self.seen.get(&key) == Some(&at) {
                self.seen.remove(&key);
            }
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
