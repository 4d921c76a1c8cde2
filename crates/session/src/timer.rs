use std::collections::VecDeque;
use std::time::Duration;

/// Sliding window over the most recent frame times.
#[derive(Debug)]
pub struct FrameTimer {
    window: VecDeque<Duration>,
    capacity: usize,
}

impl FrameTimer {
    /// Keep the last `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, frame_time: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(frame_time);
    }

    pub fn average(&self) -> Duration {
        match self.window.len() {
            0 => Duration::ZERO,
            n => self.window.iter().sum::<Duration>() / n as u32,
        }
    }

    pub fn max(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.window.iter().copied().min().unwrap_or_default()
    }

    /// Frames per second implied by the average frame time.
    pub fn fps(&self) -> f64 {
        let avg = self.average().as_secs_f64();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn summarizes_the_window() {
        let mut timer = FrameTimer::new(3);
        for n in [10, 20, 30] {
            timer.record(ms(n));
        }

        assert_eq!(timer.average(), ms(20));
        assert_eq!(timer.max(), ms(30));
        assert_eq!(timer.min(), ms(10));
    }

    #[test]
    fn oldest_sample_falls_out() {
        let mut timer = FrameTimer::new(2);
        for n in [10, 20, 30] {
            timer.record(ms(n));
        }

        assert_eq!(timer.average(), ms(25));
        assert_eq!(timer.min(), ms(20));
    }

    #[test]
    fn empty_timer_reports_zero() {
        let timer = FrameTimer::new(0);
        assert_eq!(timer.average(), Duration::ZERO);
        assert_eq!(timer.max(), Duration::ZERO);
        assert_eq!(timer.min(), Duration::ZERO);
        assert_eq!(timer.fps(), 0.0);
    }

    #[test]
    fn zero_capacity_still_keeps_one_sample() {
        let mut timer = FrameTimer::new(0);
        timer.record(ms(5));
        timer.record(ms(7));
        assert_eq!(timer.min(), ms(7));
        assert_eq!(timer.max(), ms(7));
    }

    #[test]
    fn fps_is_inverse_of_average() {
        let mut timer = FrameTimer::new(4);
        timer.record(ms(20));
        assert!((timer.fps() - 50.0).abs() < 1e-9);
    }
}
