use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// One-shot deferred callbacks. The "callback" is a payload handed back by
/// the owner's step function once the delay has elapsed.
pub trait TimerService<T> {
    fn schedule_once(&mut self, delay: f32, payload: T) -> TimerHandle;
    /// Cancelling an expired or unknown handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle) -> Option<T>;
    /// Seconds left before the timer fires, `0.0` if it is not active.
    fn remaining_time(&self, handle: TimerHandle) -> f32;
    fn is_active(&self, handle: TimerHandle) -> bool;
}

struct Entry<T> {
    remaining: f32,
    payload: T,
}

/// Frame-driven timer wheel: nothing fires until [`TimerWheel::advance`] is
/// called with the frame delta.
pub struct TimerWheel<T> {
    entries: BTreeMap<TimerHandle, Entry<T>>,
    next_id: u64,
}

impl<T> Default for TimerWheel<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T> TimerWheel<T> {
    /// Advance every timer by `dt` and return the expired payloads, earliest
    /// deadline first. Ties keep scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<(TimerHandle, T)> {
        let mut expired = Vec::new();
        for (handle, entry) in self.entries.iter_mut() {
            entry.remaining -= dt;
            if entry.remaining <= 0.0 {
                expired.push((*handle, entry.remaining));
            }
        }
        expired.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        expired
            .into_iter()
            .filter_map(|(handle, _)| {
                self.entries
                    .remove(&handle)
                    .map(|entry| (handle, entry.payload))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> TimerService<T> for TimerWheel<T> {
    fn schedule_once(&mut self, delay: f32, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            handle,
            Entry {
                remaining: delay.max(0.0),
                payload,
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        self.entries.remove(&handle).map(|entry| entry.payload)
    }

    fn remaining_time(&self, handle: TimerHandle) -> f32 {
        self.entries
            .get(&handle)
            .map_or(0.0, |entry| entry.remaining.max(0.0))
    }

    fn is_active(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }
}
