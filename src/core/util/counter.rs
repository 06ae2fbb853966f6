// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Simple counter trait
pub trait Count {
    fn add_get(&mut self, delta: i64) -> i64;

    fn get(&self) -> i64;
}

/// Byte usage counter.
///
/// Cloning a `Counter` shares the underlying count, all updates are atomic.
/// A counter made with `child` keeps a tally of its own and reports every
/// change to its parent as well, so one shared total can be fed by many
/// owners that each know their own part.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    count: Arc<AtomicI64>,
    parent: Option<Box<Counter>>,
}

impl Counter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns a handle on the same count, used by sub-consumers
    /// that report their allocations into their owner's total.
    pub fn shallow_copy(&self) -> Counter {
        self.clone()
    }

    /// A new count starting at zero whose changes also reach `self`.
    pub fn child(&self) -> Counter {
        Counter {
            count: Arc::new(AtomicI64::new(0)),
            parent: Some(Box::new(self.shallow_copy())),
        }
    }

    pub fn add(&self, delta: i64) -> i64 {
        if let Some(ref parent) = self.parent {
            parent.add(delta);
        }
        self.count.fetch_add(delta, Ordering::AcqRel) + delta
    }
}

impl Count for Counter {
    fn add_get(&mut self, delta: i64) -> i64 {
        self.add(delta)
    }

    fn get(&self) -> i64 {
        self.count.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_shared_counter_across_threads() {
        let counter = Counter::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut c = counter.shallow_copy();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        c.add_get(2);
                    }
                    for _ in 0..500 {
                        c.add_get(-1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.get(), 4 * (2000 - 500));
    }

    #[test]
    fn test_child_reports_to_parent() {
        let shared = Counter::new();
        let a = shared.child();
        let b = shared.child();
        let a_copy = a.shallow_copy();

        a_copy.add(100);
        b.add(40);
        assert_eq!(a.get(), 100);
        assert_eq!(b.get(), 40);
        assert_eq!(shared.get(), 140);

        let grand = a.child();
        grand.add(5);
        assert_eq!(a.get(), 105);
        assert_eq!(shared.get(), 145);

        // releasing one owner's share leaves the others alone
        let used = a.get();
        a.add(-used);
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 40);
        assert_eq!(shared.get(), 40);
    }
}
