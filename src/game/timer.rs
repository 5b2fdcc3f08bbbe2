use serde::Serialize;

/// A one-shot deadline owned by whoever displays the thing it expires.
/// Scheduling again replaces the pending deadline; the last schedule wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timer {
    deadline: Option<f64>,
}

impl Timer {
    pub fn schedule(&mut self, now: f64, after: f64) {
        self.deadline = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fires at most once per schedule: true on the first poll at or after the deadline.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Transient notification that hides itself after a fixed duration.
#[derive(Debug, Clone)]
pub struct Toast<T> {
    content: Option<T>,
    timer: Timer,
    duration: f64,
}

/// What a client needs to draw a toast.
#[derive(Debug, Clone, Serialize)]
pub struct ToastSnapshot<T: Serialize> {
    pub content: T,
    pub expires_at: Option<f64>,
}

impl<T> Toast<T> {
    pub fn new(duration: f64) -> Self {
        Toast {
            content: None,
            timer: Timer::default(),
            duration,
        }
    }

    pub fn show(&mut self, content: T, now: f64) {
        self.content = Some(content);
        self.timer.schedule(now, self.duration);
    }

    pub fn dismiss(&mut self) {
        self.content = None;
        self.timer.cancel();
    }

    /// Hide the toast if its time is up. Returns true when it just expired.
    pub fn poll(&mut self, now: f64) -> bool {
        if self.timer.poll(now) {
            self.content = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.content.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.content.is_some()
    }
}

impl<T: Clone + Serialize> Toast<T> {
    pub fn snapshot(&self) -> Option<ToastSnapshot<T>> {
        self.content.as_ref().map(|content| ToastSnapshot {
            content: content.clone(),
            expires_at: self.timer.deadline(),
        })
    }
}
