use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::Event;

use crate::drivers::InputDriver;
use crate::timer::{IntervalTimers, TimerId};

pub enum ControlFlow {
    Continue,
    Quit,
}

/// What the loop hands to its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Input(Event),
    Timer(TimerId),
    /// Once per iteration, before waiting for input. Used for drawing.
    Idle,
}

/// Single-threaded event loop: polls the input driver and fires due timers.
///
/// The poll timeout is capped by the nearest timer deadline, so a drag's
/// poll timer keeps ticking while the input queue is quiet.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
    timers: Rc<IntervalTimers>,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration, timers: Rc<IntervalTimers>) -> Self {
        Self {
            driver,
            poll_interval,
            timers,
        }
    }

    pub fn timers(&self) -> &Rc<IntervalTimers> {
        &self.timers
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        match self.timers.next_deadline() {
            Some(deadline) => deadline
                .saturating_duration_since(now)
                .min(self.poll_interval),
            None => self.poll_interval,
        }
    }

    /// Runs the loop on the current thread until the handler quits.
    ///
    /// Each iteration calls the handler with [`LoopEvent::Idle`], waits for
    /// input (bounded by the next timer deadline), drains every queued input
    /// event, then dispatches the timers that came due.
    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, LoopEvent) -> io::Result<ControlFlow>,
    {
        loop {
            if let ControlFlow::Quit = handler(&mut self.driver, LoopEvent::Idle)? {
                break;
            }

            let timeout = self.poll_timeout(Instant::now());
            if self.driver.poll(timeout)? {
                // Drain bursts (mouse drags) in one go so timers and drawing
                // do not fall behind the input stream.
                loop {
                    let event = self.driver.read()?;
                    if let ControlFlow::Quit = handler(&mut self.driver, LoopEvent::Input(event))? {
                        return Ok(());
                    }
                    if !self.driver.poll(Duration::from_millis(0))? {
                        break;
                    }
                }
            }

            for timer in self.timers.due(Instant::now()) {
                // A previous handler may have cancelled this one.
                if !self.timers.is_scheduled(timer) {
                    continue;
                }
                if let ControlFlow::Quit = handler(&mut self.driver, LoopEvent::Timer(timer))? {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
