use std::collections::VecDeque;
use std::sync::Mutex;

/// Single-producer/single-consumer hand-off of the latest values.
///
/// Bounded FIFO: `put` never blocks, dropping the oldest entry on overflow so
/// a slow consumer lags by at most `capacity` values instead of accumulating
/// a stale backlog. `get` never blocks either; `None` means nothing new this
/// poll. Delivery preserves insertion order but the consumer may observe gaps
/// after an overflow.
pub struct DataChannel<T> {
    queue: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> DataChannel<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn put(&self, value: T) {
        let mut queue = self.queue.lock().expect("channel lock poisoned");
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(value);
    }

    pub fn get(&self) -> Option<T> {
        self.queue.lock().expect("channel lock poisoned").pop_front()
    }

    /// Drain everything queued and keep only the newest value.
    pub fn get_latest(&self) -> Option<T> {
        let mut queue = self.queue.lock().expect("channel lock poisoned");
        let last = queue.pop_back();
        queue.clear();
        last
    }

    pub fn len(&self) -> usize {
        self.queue.lock().expect("channel lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_get_returns_none_without_side_effects() {
        let channel: DataChannel<f64> = DataChannel::new(4);
        assert_eq!(channel.get(), None);
        assert_eq!(channel.get(), None);
        assert!(channel.is_empty());
    }

    #[test]
    fn delivery_is_fifo() {
        let channel = DataChannel::new(4);
        channel.put(1);
        channel.put(2);
        channel.put(3);
        assert_eq!(channel.get(), Some(1));
        assert_eq!(channel.get(), Some(2));
        assert_eq!(channel.get(), Some(3));
        assert_eq!(channel.get(), None);
    }

    #[test]
    fn overflow_drops_the_oldest() {
        let channel = DataChannel::new(2);
        channel.put(1);
        channel.put(2);
        channel.put(3);
        assert_eq!(channel.len(), 2);
        assert_eq!(channel.get(), Some(2));
        assert_eq!(channel.get(), Some(3));
    }

    #[test]
    fn get_latest_discards_backlog() {
        let channel = DataChannel::new(8);
        for v in 0..5 {
            channel.put(v);
        }
        assert_eq!(channel.get_latest(), Some(4));
        assert!(channel.is_empty());
    }
}
