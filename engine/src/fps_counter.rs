use std::{collections::VecDeque, time::Duration};

/// Sliding window of frame times.
///
/// Keeps the most recent samples whose sum fits into the window.
/// A single sample longer than the window replaces all others.
pub struct FpsCounter {
    samples: VecDeque<Duration>,
    sum: Duration,
    window: Duration,
}

impl FpsCounter {
    pub fn new(window: Duration) -> Self {
        FpsCounter {
            samples: VecDeque::new(),
            sum: Duration::from_secs(0),
            window,
        }
    }

    pub fn add_sample(&mut self, sample: Duration) {
        if sample >= self.window {
            self.samples.clear();
            self.samples.push_back(sample);
            self.sum = sample;
            return;
        }

        while self.sum + sample > self.window {
            match self.samples.pop_front() {
                Some(oldest) => self.sum -= oldest,
                None => break,
            }
        }

        self.sum += sample;
        self.samples.push_back(sample);
    }

    pub fn average(&self) -> Duration {
        match self.samples.len() {
            0 => Duration::from_secs(0),
            len => self.sum / len as u32,
        }
    }

    /// Frames per second over the window. Zero until a sample arrives.
    pub fn fps(&self) -> f32 {
        let average = self.average().as_secs_f32();
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_recent_samples() {
        let mut counter = FpsCounter::new(Duration::from_millis(100));
        assert_eq!(counter.fps(), 0.0);

        for _ in 0..10 {
            counter.add_sample(Duration::from_millis(20));
        }
        // Only five samples fit into the window.
        assert_eq!(counter.samples.len(), 5);
        assert_eq!(counter.average(), Duration::from_millis(20));
        assert!((counter.fps() - 50.0).abs() < 1.0e-3);

        counter.add_sample(Duration::from_millis(10));
        assert_eq!(counter.samples.len(), 5);
        assert_eq!(counter.sum, Duration::from_millis(90));
    }

    #[test]
    fn long_sample_resets_window() {
        let mut counter = FpsCounter::new(Duration::from_millis(100));
        counter.add_sample(Duration::from_millis(20));
        counter.add_sample(Duration::from_millis(250));
        assert_eq!(counter.average(), Duration::from_millis(250));
        assert!((counter.fps() - 4.0).abs() < 1.0e-3);
    }
}
