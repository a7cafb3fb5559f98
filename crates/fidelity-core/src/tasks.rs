use std::cell::Cell;
use std::rc::Rc;

/// Stops a [`RepeatingTask`]. Cloneable; any clone can stop it.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    active: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn stop(&self) {
        self.active.set(false);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// A callback that re-arms itself after every run, driven by the host's
/// frame clock. Cancellation is cooperative: the flag is checked before a
/// run and again before the next deadline is computed.
pub struct RepeatingTask {
    callback: Box<dyn FnMut(f64)>,
    interval: Box<dyn FnMut() -> f64>,
    next_due_ms: f64,
    active: Rc<Cell<bool>>,
    runs: u64,
}

impl RepeatingTask {
    /// First run is due at `start_ms + interval()`. `interval` is asked again
    /// after every run, so it may vary (jittered ambience, backoff, ...).
    pub fn new(
        start_ms: f64,
        mut interval: impl FnMut() -> f64 + 'static,
        callback: impl FnMut(f64) + 'static,
    ) -> (Self, TaskHandle) {
        let active = Rc::new(Cell::new(true));
        let first = start_ms + sanitize(interval());
        let task = Self {
            callback: Box::new(callback),
            interval: Box::new(interval),
            next_due_ms: first,
            active: active.clone(),
            runs: 0,
        };
        (task, TaskHandle { active })
    }

    /// Fixed-period convenience constructor.
    pub fn every(
        start_ms: f64,
        period_ms: f64,
        callback: impl FnMut(f64) + 'static,
    ) -> (Self, TaskHandle) {
        Self::new(start_ms, move || period_ms, callback)
    }

    /// Run the callback if due. Returns whether it ran.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if !self.active.get() || now_ms < self.next_due_ms {
            return false;
        }
        (self.callback)(now_ms);
        self.runs += 1;
        if self.active.get() {
            self.next_due_ms = now_ms + sanitize((self.interval)());
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn next_due_ms(&self) -> f64 {
        self.next_due_ms
    }
}

fn sanitize(interval_ms: f64) -> f64 {
    if interval_ms.is_finite() {
        interval_ms.max(0.0)
    } else {
        0.0
    }
}
