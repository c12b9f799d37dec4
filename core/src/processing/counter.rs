/// Callback receiving every new running total.
pub type CountObserver = Box<dyn Fn(u64) + Send>;

/// Running spot total for one channel.
#[derive(Default)]
pub struct AccumulatorCounter {
    total: u64,
    observers: Vec<CountObserver>,
}

impl AccumulatorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: CountObserver) {
        observer(self.total);
        self.observers.push(observer);
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.notify();
    }

    pub fn add(&mut self, spots: u64) -> u64 {
        self.total = self.total.saturating_add(spots);
        self.notify();
        self.total
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer(self.total);
        }
    }
}

impl std::fmt::Debug for AccumulatorCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumulatorCounter")
            .field("total", &self.total)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn total_is_sum_of_adds_after_reset() {
        let mut counter = AccumulatorCounter::new();
        counter.add(40);
        counter.reset();

        let adds = [3u64, 0, 17, 5, 1];
        let mut last = 0;
        for n in adds {
            last = counter.add(n);
        }
        assert_eq!(last, adds.iter().sum::<u64>());
        assert_eq!(counter.total(), 26);
    }

    #[test]
    fn observers_see_every_total() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut counter = AccumulatorCounter::new();
        counter.add(2);
        counter.subscribe(Box::new(move |total| sink.lock().unwrap().push(total)));
        counter.add(3);
        counter.reset();

        assert_eq!(*seen.lock().unwrap(), vec![2, 5, 0]);
    }
}
