use std::collections::VecDeque;

/// Bounded, oldest-first history of per-window FPS readings.
#[derive(Clone, Debug)]
pub struct FpsHistory {
    samples: VecDeque<u32>,
    capacity: usize,
}

impl FpsHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest once full.
    pub fn push(&mut self, fps: u32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(fps);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Arithmetic mean, `None` when empty.
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().map(|&s| s as u64).sum();
        Some(sum as f32 / self.samples.len() as f32)
    }

    pub fn all_above(&self, floor: f32) -> bool {
        self.samples.iter().all(|&s| s as f32 > floor)
    }

    pub fn samples(&self) -> impl Iterator<Item = u32> + '_ {
        self.samples.iter().copied()
    }
}

/// Counts frames inside a fixed-length window and reports the rate each
/// time the window closes.
#[derive(Clone, Debug)]
pub struct FrameRateMonitor {
    window_ms: f64,
    frames: u32,
    elapsed_ms: f64,
    last_fps: u32,
}

impl FrameRateMonitor {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            frames: 0,
            elapsed_ms: 0.0,
            last_fps: 0,
        }
    }

    /// Record one frame. Returns the window's FPS when this frame closes it.
    pub fn tick(&mut self, delta_ms: f64) -> Option<u32> {
        self.frames += 1;
        self.elapsed_ms += delta_ms;
        if self.elapsed_ms < self.window_ms {
            return None;
        }
        let fps = (self.frames as f64 * 1000.0 / self.elapsed_ms).round() as u32;
        self.frames = 0;
        self.elapsed_ms = 0.0;
        self.last_fps = fps;
        Some(fps)
    }

    /// Rate of the most recently closed window.
    pub fn last_fps(&self) -> u32 {
        self.last_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_evicts_oldest() {
        let mut h = FpsHistory::new(3);
        for fps in [10, 20, 30, 40] {
            h.push(fps);
        }
        assert_eq!(h.samples().collect::<Vec<_>>(), vec![20, 30, 40]);
        assert!(h.is_full());
    }

    #[test]
    fn test_history_average() {
        let mut h = FpsHistory::new(10);
        assert_eq!(h.average(), None);
        h.push(30);
        h.push(60);
        assert_eq!(h.average(), Some(45.0));
    }

    #[test]
    fn test_all_above_is_strict() {
        let mut h = FpsHistory::new(4);
        h.push(51);
        h.push(50);
        assert!(!h.all_above(50.0));
        assert!(h.all_above(49.0));
    }

    #[test]
    fn test_monitor_closes_window_at_one_second() {
        let mut m = FrameRateMonitor::new(1000.0);
        let frame = 1000.0 / 60.0;
        for _ in 0..59 {
            assert_eq!(m.tick(frame), None);
        }
        // last frame runs slightly long so the window surely closes
        assert_eq!(m.tick(frame + 1.0), Some(60));
        assert_eq!(m.last_fps(), 60);
    }

    #[test]
    fn test_monitor_rounds() {
        let mut m = FrameRateMonitor::new(1000.0);
        // 3 frames over 1100ms = 2.727 fps
        assert_eq!(m.tick(400.0), None);
        assert_eq!(m.tick(400.0), None);
        assert_eq!(m.tick(300.0), Some(3));
    }
}
