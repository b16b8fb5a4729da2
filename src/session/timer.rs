//! Countdown timer driven by polling an injected clock.
//!
//! The timer never schedules anything on its own: the event loop calls
//! [`Timer::poll`] and the timer fires `on_tick` once for every whole second
//! that elapsed since the previous poll, then `on_expire` once when the
//! countdown reaches zero.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::Clock;

type TickFn = Box<dyn FnMut(u32)>;
type ExpireFn = Box<dyn FnOnce()>;

struct Run {
    started_at: DateTime<Utc>,
    duration: u32,
    /// Seconds already reported through `on_tick`.
    reported: u32,
    on_tick: TickFn,
    on_expire: Option<ExpireFn>,
}

impl Run {
    fn remaining(&self) -> u32 {
        self.duration - self.reported
    }
}

pub struct Timer {
    clock: Arc<dyn Clock>,
    run: Option<Run>,
}

impl Timer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, run: None }
    }

    /// Start counting down from `duration_seconds`. A run already in
    /// progress is stopped first and its callbacks are dropped unfired.
    pub fn start<T, E>(&mut self, duration_seconds: u32, on_tick: T, on_expire: E)
    where
        T: FnMut(u32) + 'static,
        E: FnOnce() + 'static,
    {
        self.stop();
        tracing::debug!("timer started for {}s", duration_seconds);
        self.run = Some(Run {
            started_at: self.clock.now(),
            duration: duration_seconds,
            reported: 0,
            on_tick: Box::new(on_tick),
            on_expire: Some(Box::new(on_expire)),
        });
    }

    /// Cancel future ticks. Safe to call at any time.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            tracing::debug!("timer stopped with {}s remaining", run.remaining());
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Seconds left in the current run, 0 when idle.
    pub fn remaining(&self) -> u32 {
        self.run.as_ref().map_or(0, Run::remaining)
    }

    /// Fire the callbacks owed since the last poll.
    pub fn poll(&mut self) {
        let now = self.clock.now();
        let Some(run) = self.run.as_mut() else {
            return;
        };

        let elapsed = (now - run.started_at).num_seconds().clamp(0, i64::from(run.duration));
        // elapsed is within 0..=duration, so it fits in u32
        let elapsed = elapsed as u32;

        while run.reported < elapsed {
            run.reported += 1;
            let remaining = run.remaining();
            (run.on_tick)(remaining);
        }

        if run.reported == run.duration {
            let on_expire = run.on_expire.take();
            self.run = None;
            tracing::debug!("timer expired");
            if let Some(on_expire) = on_expire {
                on_expire();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::session::ManualClock;

    fn timer_with_clock() -> (Timer, ManualClock) {
        let clock = ManualClock::default();
        (Timer::new(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn ticks_once_per_elapsed_second() {
        let (mut timer, clock) = timer_with_clock();
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ticks);
        timer.start(5, move |r| sink.borrow_mut().push(r), || {});

        clock.advance_secs(1);
        timer.poll();
        clock.advance_secs(2);
        timer.poll();

        assert_eq!(*ticks.borrow(), vec![4, 3, 2]);
        assert_eq!(timer.remaining(), 2);
    }

    #[test]
    fn sub_second_polls_do_not_tick() {
        let (mut timer, clock) = timer_with_clock();
        let ticks = Rc::new(Cell::new(0));
        let count = Rc::clone(&ticks);
        timer.start(5, move |_| count.set(count.get() + 1), || {});

        clock.advance(chrono::Duration::milliseconds(999));
        timer.poll();
        assert_eq!(ticks.get(), 0);
    }

    #[test]
    fn expires_exactly_once_and_stops() {
        let (mut timer, clock) = timer_with_clock();
        let expired = Rc::new(Cell::new(0));
        let count = Rc::clone(&expired);
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ticks);
        timer.start(2, move |r| sink.borrow_mut().push(r), move || count.set(count.get() + 1));

        clock.advance_secs(10);
        timer.poll();
        timer.poll();
        clock.advance_secs(10);
        timer.poll();

        assert_eq!(expired.get(), 1);
        assert_eq!(*ticks.borrow(), vec![1, 0]);
        assert!(!timer.is_running());
    }

    #[test]
    fn remaining_is_never_negative() {
        let (mut timer, clock) = timer_with_clock();
        let lowest = Rc::new(Cell::new(u32::MAX));
        let seen = Rc::clone(&lowest);
        timer.start(3, move |r| seen.set(seen.get().min(r)), || {});

        clock.advance_secs(100);
        timer.poll();
        assert_eq!(lowest.get(), 0);
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn stop_is_idempotent_and_cancels_expiry() {
        let (mut timer, clock) = timer_with_clock();
        let expired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&expired);
        timer.start(1, |_| {}, move || flag.set(true));

        timer.stop();
        timer.stop();
        clock.advance_secs(5);
        timer.poll();

        assert!(!expired.get());
    }

    #[test]
    fn restart_replaces_previous_run() {
        let (mut timer, clock) = timer_with_clock();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let a = Rc::clone(&first);
        let b = Rc::clone(&second);

        timer.start(1, |_| {}, move || a.set(a.get() + 1));
        timer.start(1, |_| {}, move || b.set(b.get() + 1));
        clock.advance_secs(1);
        timer.poll();

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn each_start_gets_its_own_expiry() {
        let (mut timer, clock) = timer_with_clock();
        let expired = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let count = Rc::clone(&expired);
            timer.start(1, |_| {}, move || count.set(count.get() + 1));
            clock.advance_secs(1);
            timer.poll();
        }
        assert_eq!(expired.get(), 2);
    }
}
