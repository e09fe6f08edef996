//! Press/hover based drag detection for a group of widgets.
//!
//! A [`DragDropManager`] watches a set of registered widgets and turns raw
//! notifications (press, release, hover, visibility, destruction) plus a
//! repeating poll timer into a `Started` / `Update` / `Ended` stream:
//!
//! - A primary press arms the pressed widget. Releasing without leaving it
//!   is a plain click and never produces drag events.
//! - Losing hover while armed starts the drag and schedules the poll timer.
//! - Every tick emits an `Update` with the pointer position until the
//!   primary button is no longer held.
//!
//! Ends triggered by the pointer, visibility or destruction emit one final
//! `Update` right before `Ended`, so subscribers see the exact drop position
//! before learning the drag is over. [`DragDropManager::end_drag`] is meant
//! to be called from inside an `Update` handler and therefore emits `Ended`
//! alone. Updates are never dispatched re-entrantly: an update requested
//! while a handler is still running is dropped.
//!
//! Unrelated widget groups should use separate managers.

pub mod pointer;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::MouseButton;
use thiserror::Error;

use crate::constants::DRAG_POLL_INTERVAL;
use crate::geometry::Point;
use crate::timer::{TimerId, TimerSource};

pub use pointer::{PointerProbe, PointerState, SharedPointer};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    #[error("a drag is already active")]
    AlreadyActive,
    #[error("drag poll fired while no drag is active")]
    NotActive,
    #[error("drag poll fired for timer {0:?}, which this manager does not own")]
    ForeignTimer(TimerId),
    #[error("widget {0} is not registered with this drag manager")]
    UnknownWidget(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState<W> {
    Idle,
    /// Pressed but the pointer has not left the widget yet.
    Armed(W),
    Active(W),
}

/// Raw notifications fed into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragInput<W> {
    Press(W),
    Release(W),
    HoverGained(W),
    HoverLost(W),
    Hidden(W),
    Destroyed(W),
    Tick { held: bool },
    Start(W),
}

/// Side effect the manager performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect<W> {
    None,
    /// Schedule the poll timer and emit `Started`.
    Begin(W),
    /// Emit an `Update` with the current pointer position.
    Update(W),
    /// Cancel the timer, emit the final `Update`, then `Ended`.
    Finish(W),
    /// Finish the drag of `ended`, then arm `armed`. Covers a release the
    /// poll timer never observed.
    FinishThenArm { ended: W, armed: W },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<W> {
    pub state: DragState<W>,
    pub effect: Effect<W>,
}

impl<W: Copy + Eq> DragState<W> {
    pub fn widget(&self) -> Option<W> {
        match *self {
            DragState::Idle => None,
            DragState::Armed(w) | DragState::Active(w) => Some(w),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DragState::Active(_))
    }

    /// Transition table. Total over every (state, input) pair; the only
    /// failures are the programming errors of ticking an idle manager and
    /// starting a drag on top of an active one.
    pub fn next(self, input: DragInput<W>) -> Result<Transition<W>, DragError> {
        use DragInput as I;
        use DragState as S;

        let stay = Transition {
            state: self,
            effect: Effect::None,
        };
        let idle = Transition {
            state: S::Idle,
            effect: Effect::None,
        };
        let transition = match (self, input) {
            (S::Idle, I::Press(w)) => Transition {
                state: S::Armed(w),
                effect: Effect::None,
            },
            (S::Armed(_), I::Press(_)) => stay,
            (S::Active(d), I::Press(w)) => Transition {
                state: S::Armed(w),
                effect: Effect::FinishThenArm { ended: d, armed: w },
            },

            (S::Idle, I::Release(_)) => stay,
            (S::Armed(_), I::Release(_)) => idle,
            (S::Active(d), I::Release(_)) => Transition {
                state: S::Idle,
                effect: Effect::Finish(d),
            },

            (S::Armed(a), I::HoverLost(w)) if a == w => Transition {
                state: S::Active(a),
                effect: Effect::Begin(a),
            },
            (_, I::HoverLost(_)) => stay,

            (S::Active(d), I::HoverGained(_)) => Transition {
                state: S::Active(d),
                effect: Effect::Update(d),
            },
            (_, I::HoverGained(_)) => stay,

            (S::Armed(a), I::Hidden(w) | I::Destroyed(w)) if a == w => idle,
            (S::Active(d), I::Hidden(w) | I::Destroyed(w)) if d == w => Transition {
                state: S::Idle,
                effect: Effect::Finish(d),
            },
            (_, I::Hidden(_) | I::Destroyed(_)) => stay,

            (S::Active(d), I::Tick { held: true }) => Transition {
                state: S::Active(d),
                effect: Effect::Update(d),
            },
            (S::Active(d), I::Tick { held: false }) => Transition {
                state: S::Idle,
                effect: Effect::Finish(d),
            },
            (_, I::Tick { .. }) => return Err(DragError::NotActive),

            (S::Active(_), I::Start(_)) => return Err(DragError::AlreadyActive),
            (_, I::Start(w)) => Transition {
                state: S::Active(w),
                effect: Effect::Begin(w),
            },
        };
        Ok(transition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent<W> {
    Started { widget: W, pos: Point },
    Update { widget: W, pos: Point },
    Ended { widget: W, pos: Point },
}

impl<W: Copy> DragEvent<W> {
    pub fn widget(&self) -> W {
        match *self {
            DragEvent::Started { widget, .. }
            | DragEvent::Update { widget, .. }
            | DragEvent::Ended { widget, .. } => widget,
        }
    }

    pub fn pos(&self) -> Point {
        match *self {
            DragEvent::Started { pos, .. }
            | DragEvent::Update { pos, .. }
            | DragEvent::Ended { pos, .. } => pos,
        }
    }
}

/// Receives drag lifecycle events.
///
/// The manager hands itself back to the handler so the handler can call
/// [`DragDropManager::end_drag`] (or feed further notifications) while an
/// event is being dispatched.
pub trait DragHandler<W> {
    fn handle_drag_event(&mut self, dnd: &mut DragDropManager<W>, event: DragEvent<W>);
}

/// Collects events for callers that prefer to process them afterwards.
impl<W> DragHandler<W> for Vec<DragEvent<W>> {
    fn handle_drag_event(&mut self, _dnd: &mut DragDropManager<W>, event: DragEvent<W>) {
        self.push(event);
    }
}

/// Discards events.
impl<W> DragHandler<W> for () {
    fn handle_drag_event(&mut self, _dnd: &mut DragDropManager<W>, _event: DragEvent<W>) {}
}

pub struct DragDropManager<W> {
    state: DragState<W>,
    widgets: BTreeSet<W>,
    timer: Option<TimerId>,
    dispatching_update: bool,
    poll_interval: Duration,
    probe: Rc<dyn PointerProbe>,
    timers: Rc<dyn TimerSource>,
}

impl<W: Debug> Debug for DragDropManager<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragDropManager")
            .field("state", &self.state)
            .field("widgets", &self.widgets)
            .field("timer", &self.timer)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<W: Copy + Ord + Debug> DragDropManager<W> {
    pub fn new(probe: Rc<dyn PointerProbe>, timers: Rc<dyn TimerSource>) -> Self {
        Self::with_poll_interval(probe, timers, DRAG_POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        probe: Rc<dyn PointerProbe>,
        timers: Rc<dyn TimerSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            state: DragState::Idle,
            widgets: BTreeSet::new(),
            timer: None,
            dispatching_update: false,
            poll_interval,
            probe,
            timers,
        }
    }

    pub fn state(&self) -> DragState<W> {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// The widget being dragged, if a drag is active.
    pub fn dragged_widget(&self) -> Option<W> {
        match self.state {
            DragState::Active(w) => Some(w),
            _ => None,
        }
    }

    /// The poll timer of the active drag.
    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn register_widget(&mut self, widget: W) -> bool {
        self.widgets.insert(widget)
    }

    /// Forget `widget`. Does not touch a drag in progress; hosts that
    /// destroy the widget report it through [`Self::on_widget_destroyed`].
    pub fn unregister_widget(&mut self, widget: W) -> bool {
        self.widgets.remove(&widget)
    }

    pub fn is_registered(&self, widget: W) -> bool {
        self.widgets.contains(&widget)
    }

    pub fn widgets(&self) -> impl Iterator<Item = W> + '_ {
        self.widgets.iter().copied()
    }

    /// Start dragging `widget` without press/leave detection, e.g. to resume
    /// a drag handed over from another manager. If the primary button is not
    /// held the next poll ends the drag again.
    pub fn start_drag<H>(&mut self, widget: W, handler: &mut H) -> Result<(), DragError>
    where
        H: DragHandler<W> + ?Sized,
    {
        if !self.widgets.contains(&widget) {
            let err = DragError::UnknownWidget(format!("{widget:?}"));
            tracing::error!(%err, "refusing to start drag");
            return Err(err);
        }
        let transition = self
            .state
            .next(DragInput::Start(widget))
            .inspect_err(|err| tracing::error!(?widget, %err, "refusing to start drag"))?;
        self.apply(transition, None, handler);
        Ok(())
    }

    /// End the active drag, if any. Emits `Ended` without a preceding
    /// `Update`, which makes it safe to call from an `Update` handler.
    pub fn end_drag<H>(&mut self, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        if let DragState::Active(widget) = self.state {
            self.state = DragState::Idle;
            self.finish(widget, None, false, handler);
        }
    }

    pub fn on_button_press<H>(&mut self, widget: W, button: MouseButton, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        if button != MouseButton::Left || !self.widgets.contains(&widget) {
            return;
        }
        self.feed(DragInput::Press(widget), None, handler);
    }

    pub fn on_button_release<H>(&mut self, widget: W, button: MouseButton, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        if button != MouseButton::Left || !self.widgets.contains(&widget) {
            return;
        }
        self.feed(DragInput::Release(widget), None, handler);
    }

    /// Returns `true` when the host should not show hover styling on
    /// `widget`: a drag is passing over it and the next update will move the
    /// dragged widget into its place anyway.
    pub fn on_hover_changed<H>(&mut self, widget: W, hovered: bool, handler: &mut H) -> bool
    where
        H: DragHandler<W> + ?Sized,
    {
        if !self.widgets.contains(&widget) {
            return false;
        }
        let suppress = hovered && matches!(self.state, DragState::Active(d) if d != widget);
        let input = if hovered {
            DragInput::HoverGained(widget)
        } else {
            DragInput::HoverLost(widget)
        };
        self.feed(input, None, handler);
        suppress
    }

    pub fn on_visibility_changed<H>(&mut self, widget: W, visible: bool, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        // Becoming visible happens when a dragged widget lands on another
        // monitor and must not cancel anything.
        if visible || !self.widgets.contains(&widget) {
            return;
        }
        self.feed(DragInput::Hidden(widget), None, handler);
    }

    pub fn on_widget_destroyed<H>(&mut self, widget: W, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        if !self.widgets.contains(&widget) {
            return;
        }
        self.feed(DragInput::Destroyed(widget), None, handler);
        self.unregister_widget(widget);
    }

    /// Poll timer expiry. `timer` must be the one scheduled for the active
    /// drag; anything else means a timer outlived its drag.
    pub fn on_poll<H>(&mut self, timer: TimerId, handler: &mut H) -> Result<(), DragError>
    where
        H: DragHandler<W> + ?Sized,
    {
        let pointer = self.probe.read();
        let transition = self
            .state
            .next(DragInput::Tick {
                held: pointer.primary_held,
            })
            .inspect_err(|err| tracing::error!(timer = timer.raw(), %err, "stray drag poll"))?;
        if self.timer != Some(timer) {
            let err = DragError::ForeignTimer(timer);
            tracing::error!(%err, "stray drag poll");
            return Err(err);
        }
        tracing::trace!(x = pointer.pos.x, y = pointer.pos.y, "drag poll");
        self.apply(transition, Some(pointer), handler);
        Ok(())
    }

    /// Tear down: ends an active drag without a final update (the UI is
    /// going away, the user did not drop anything) and forgets every widget.
    pub fn destroy<H>(&mut self, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        self.end_drag(handler);
        self.state = DragState::Idle;
        self.widgets.clear();
    }

    fn feed<H>(&mut self, input: DragInput<W>, pointer: Option<PointerState>, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        match self.state.next(input) {
            Ok(transition) => self.apply(transition, pointer, handler),
            Err(err) => tracing::error!(?input, %err, "invalid drag input"),
        }
    }

    fn apply<H>(
        &mut self,
        transition: Transition<W>,
        pointer: Option<PointerState>,
        handler: &mut H,
    ) where
        H: DragHandler<W> + ?Sized,
    {
        match transition.effect {
            Effect::None => self.state = transition.state,
            Effect::Begin(widget) => {
                self.state = transition.state;
                self.begin(widget, handler);
            }
            Effect::Update(widget) => {
                self.state = transition.state;
                let pos = pointer.unwrap_or_else(|| self.probe.read()).pos;
                self.emit_update(widget, pos, handler);
            }
            Effect::Finish(widget) => {
                // Idle before dispatching so handlers calling end_drag() are
                // no-ops.
                self.state = DragState::Idle;
                self.finish(widget, pointer, true, handler);
            }
            Effect::FinishThenArm { ended, armed } => {
                self.state = DragState::Idle;
                self.finish(ended, pointer, true, handler);
                // A handler may have started a new drag meanwhile.
                if self.state == DragState::Idle {
                    self.state = DragState::Armed(armed);
                }
            }
        }
    }

    fn begin<H>(&mut self, widget: W, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        if let Some(stale) = self.timer.take() {
            tracing::warn!(timer = stale.raw(), "replacing leftover drag timer");
            self.timers.cancel(stale);
        }
        self.timer = Some(self.timers.schedule_repeating(self.poll_interval));
        let pos = self.probe.read().pos;
        tracing::debug!(?widget, x = pos.x, y = pos.y, "drag started");
        handler.handle_drag_event(self, DragEvent::Started { widget, pos });
    }

    fn finish<H>(
        &mut self,
        widget: W,
        pointer: Option<PointerState>,
        final_update: bool,
        handler: &mut H,
    ) where
        H: DragHandler<W> + ?Sized,
    {
        if let Some(timer) = self.timer.take() {
            self.timers.cancel(timer);
        }
        let pos = pointer.unwrap_or_else(|| self.probe.read()).pos;
        if final_update {
            self.emit_update(widget, pos, handler);
        }
        tracing::debug!(?widget, x = pos.x, y = pos.y, "drag ended");
        handler.handle_drag_event(self, DragEvent::Ended { widget, pos });
    }

    fn emit_update<H>(&mut self, widget: W, pos: Point, handler: &mut H)
    where
        H: DragHandler<W> + ?Sized,
    {
        if self.dispatching_update {
            tracing::trace!(?widget, "dropping nested drag update");
            return;
        }
        self.dispatching_update = true;
        handler.handle_drag_event(self, DragEvent::Update { widget, pos });
        self.dispatching_update = false;
    }
}

impl<W> Drop for DragDropManager<W> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.timers.cancel(timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::IntervalTimers;
    use pretty_assertions::assert_eq;

    type Ev = DragEvent<u8>;

    fn setup() -> (SharedPointer, Rc<IntervalTimers>, DragDropManager<u8>) {
        let pointer = SharedPointer::new();
        let timers = Rc::new(IntervalTimers::new());
        let mut dnd = DragDropManager::new(Rc::new(pointer.clone()), timers.clone());
        dnd.register_widget(1);
        dnd.register_widget(2);
        dnd.register_widget(3);
        (pointer, timers, dnd)
    }

    /// Press widget 1, leave it while held. Leaves the manager active.
    fn start_by_leaving(
        pointer: &SharedPointer,
        dnd: &mut DragDropManager<u8>,
        events: &mut Vec<Ev>,
    ) {
        pointer.move_to(Point::new(5, 0));
        pointer.press();
        dnd.on_button_press(1, MouseButton::Left, events);
        pointer.move_to(Point::new(12, 0));
        dnd.on_hover_changed(1, false, events);
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Ev>,
        end_on_update: bool,
        hover_on_update: Option<u8>,
    }

    impl DragHandler<u8> for Recorder {
        fn handle_drag_event(&mut self, dnd: &mut DragDropManager<u8>, event: Ev) {
            self.events.push(event);
            if let DragEvent::Update { .. } = event {
                if self.end_on_update {
                    dnd.end_drag(self);
                }
                if let Some(w) = self.hover_on_update.take() {
                    dnd.on_hover_changed(w, true, self);
                }
            }
        }
    }

    #[test]
    fn transition_table_covers_plain_click() {
        let s = DragState::<u8>::Idle;
        let t = s.next(DragInput::Press(1)).unwrap();
        assert_eq!(t.state, DragState::Armed(1));
        let t = t.state.next(DragInput::Release(1)).unwrap();
        assert_eq!(t.state, DragState::Idle);
        assert_eq!(t.effect, Effect::None);
    }

    #[test]
    fn transition_table_destroy_and_hide_are_independent() {
        let armed = DragState::Armed(1u8);
        for input in [DragInput::Hidden(1), DragInput::Destroyed(1)] {
            let t = armed.next(input).unwrap();
            assert_eq!(t.state, DragState::Idle);
            assert_eq!(t.effect, Effect::None);
        }
        let active = DragState::Active(1u8);
        for input in [DragInput::Hidden(1), DragInput::Destroyed(1)] {
            let t = active.next(input).unwrap();
            assert_eq!(t.state, DragState::Idle);
            assert_eq!(t.effect, Effect::Finish(1));
        }
        // other widgets do not matter
        let t = active.next(DragInput::Destroyed(2)).unwrap();
        assert_eq!(t.state, active);
        assert_eq!(t.effect, Effect::None);
    }

    #[test]
    fn transition_table_rejects_programming_errors() {
        assert_eq!(
            DragState::<u8>::Idle.next(DragInput::Tick { held: true }),
            Err(DragError::NotActive)
        );
        assert_eq!(
            DragState::Armed(1u8).next(DragInput::Tick { held: false }),
            Err(DragError::NotActive)
        );
        assert_eq!(
            DragState::Active(1u8).next(DragInput::Start(2)),
            Err(DragError::AlreadyActive)
        );
        let t = DragState::Armed(1u8).next(DragInput::Start(2)).unwrap();
        assert_eq!(t.state, DragState::Active(2));
    }

    #[test]
    fn full_lifecycle_emits_ordered_events() {
        let (pointer, timers, mut dnd) = setup();
        let mut events = Vec::new();
        start_by_leaving(&pointer, &mut dnd, &mut events);
        assert!(dnd.is_active());
        let timer = dnd.timer().expect("poll timer scheduled");
        assert!(timers.is_scheduled(timer));

        for x in [20, 30, 40] {
            pointer.move_to(Point::new(x, 0));
            dnd.on_poll(timer, &mut events).unwrap();
        }
        pointer.move_to(Point::new(45, 1));
        pointer.release();
        dnd.on_poll(timer, &mut events).unwrap();

        assert_eq!(
            events,
            vec![
                Ev::Started {
                    widget: 1,
                    pos: Point::new(12, 0)
                },
                Ev::Update {
                    widget: 1,
                    pos: Point::new(20, 0)
                },
                Ev::Update {
                    widget: 1,
                    pos: Point::new(30, 0)
                },
                Ev::Update {
                    widget: 1,
                    pos: Point::new(40, 0)
                },
                Ev::Update {
                    widget: 1,
                    pos: Point::new(45, 1)
                },
                Ev::Ended {
                    widget: 1,
                    pos: Point::new(45, 1)
                },
            ]
        );
        assert_eq!(dnd.state(), DragState::Idle);
        assert!(!timers.is_scheduled(timer));
        assert!(dnd.timer().is_none());
    }

    #[test]
    fn end_drag_from_update_handler_emits_single_ended() {
        let (pointer, _timers, mut dnd) = setup();
        let mut rec = Recorder::default();
        pointer.press();
        dnd.on_button_press(1, MouseButton::Left, &mut rec);
        dnd.on_hover_changed(1, false, &mut rec);
        let timer = dnd.timer().unwrap();
        rec.end_on_update = true;
        dnd.on_poll(timer, &mut rec).unwrap();

        let kinds: Vec<&str> = rec
            .events
            .iter()
            .map(|e| match e {
                Ev::Started { .. } => "started",
                Ev::Update { .. } => "update",
                Ev::Ended { .. } => "ended",
            })
            .collect();
        assert_eq!(kinds, vec!["started", "update", "ended"]);
        assert_eq!(dnd.state(), DragState::Idle);
        // the timer is gone, so a late poll is an error rather than a drag
        assert_eq!(dnd.on_poll(timer, &mut rec), Err(DragError::NotActive));
    }

    #[test]
    fn press_and_release_without_leaving_emits_nothing() {
        let (pointer, timers, mut dnd) = setup();
        let mut events = Vec::new();
        pointer.press();
        dnd.on_button_press(2, MouseButton::Left, &mut events);
        assert_eq!(dnd.state(), DragState::Armed(2));
        pointer.release();
        dnd.on_button_release(2, MouseButton::Left, &mut events);
        assert!(events.is_empty());
        assert_eq!(dnd.state(), DragState::Idle);
        assert!(timers.is_empty());
    }

    #[test]
    fn non_primary_buttons_and_unknown_widgets_are_ignored() {
        let (_pointer, _timers, mut dnd) = setup();
        let mut events = Vec::new();
        dnd.on_button_press(1, MouseButton::Right, &mut events);
        dnd.on_button_press(9, MouseButton::Left, &mut events);
        assert_eq!(dnd.state(), DragState::Idle);
        assert!(!dnd.on_hover_changed(9, true, &mut events));

        assert!(dnd.unregister_widget(2));
        dnd.on_button_press(2, MouseButton::Left, &mut events);
        assert_eq!(dnd.state(), DragState::Idle);
        assert!(events.is_empty());
    }

    #[test]
    fn missed_release_ends_drag_then_rearms() {
        let (pointer, timers, mut dnd) = setup();
        let mut events = Vec::new();
        start_by_leaving(&pointer, &mut dnd, &mut events);
        let timer = dnd.timer().unwrap();
        events.clear();

        pointer.move_to(Point::new(30, 0));
        dnd.on_button_press(3, MouseButton::Left, &mut events);
        assert_eq!(
            events,
            vec![
                Ev::Update {
                    widget: 1,
                    pos: Point::new(30, 0)
                },
                Ev::Ended {
                    widget: 1,
                    pos: Point::new(30, 0)
                },
            ]
        );
        assert_eq!(dnd.state(), DragState::Armed(3));
        assert!(!timers.is_scheduled(timer));
    }

    #[test]
    fn hiding_or_destroying_dragged_widget_cancels_with_final_update() {
        let (pointer, _timers, mut dnd) = setup();
        let mut events = Vec::new();
        start_by_leaving(&pointer, &mut dnd, &mut events);
        events.clear();
        // becoming visible never cancels
        dnd.on_visibility_changed(1, true, &mut events);
        assert!(dnd.is_active());
        dnd.on_visibility_changed(1, false, &mut events);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ev::Update { widget: 1, .. }));
        assert!(matches!(events[1], Ev::Ended { widget: 1, .. }));

        events.clear();
        start_by_leaving(&pointer, &mut dnd, &mut events);
        events.clear();
        dnd.on_widget_destroyed(1, &mut events);
        assert_eq!(events.len(), 2);
        assert!(!dnd.is_registered(1));
        assert_eq!(dnd.state(), DragState::Idle);
    }

    #[test]
    fn destroying_armed_widget_disarms_silently() {
        let (pointer, _timers, mut dnd) = setup();
        let mut events = Vec::new();
        pointer.press();
        dnd.on_button_press(2, MouseButton::Left, &mut events);
        dnd.on_widget_destroyed(2, &mut events);
        assert!(events.is_empty());
        assert_eq!(dnd.state(), DragState::Idle);
        assert!(!dnd.is_registered(2));
    }

    #[test]
    fn entering_another_widget_updates_immediately() {
        let (pointer, _timers, mut dnd) = setup();
        let mut events = Vec::new();
        start_by_leaving(&pointer, &mut dnd, &mut events);
        events.clear();
        pointer.move_to(Point::new(25, 0));
        let suppress = dnd.on_hover_changed(2, true, &mut events);
        assert!(suppress);
        assert_eq!(
            events,
            vec![Ev::Update {
                widget: 1,
                pos: Point::new(25, 0)
            }]
        );
    }

    #[test]
    fn nested_update_is_dropped() {
        let (pointer, _timers, mut dnd) = setup();
        let mut rec = Recorder::default();
        pointer.press();
        dnd.on_button_press(1, MouseButton::Left, &mut rec);
        dnd.on_hover_changed(1, false, &mut rec);
        rec.events.clear();
        rec.hover_on_update = Some(2);
        let timer = dnd.timer().unwrap();
        dnd.on_poll(timer, &mut rec).unwrap();
        // the hover inside the handler would have produced a second update
        assert_eq!(rec.events.len(), 1);
        assert!(dnd.is_active());
    }

    #[test]
    fn start_drag_rules() {
        let (pointer, timers, mut dnd) = setup();
        let mut events = Vec::new();
        pointer.press();
        assert!(matches!(
            dnd.start_drag(7, &mut events),
            Err(DragError::UnknownWidget(_))
        ));
        dnd.start_drag(2, &mut events).unwrap();
        assert_eq!(dnd.dragged_widget(), Some(2));
        assert_eq!(
            dnd.start_drag(3, &mut events),
            Err(DragError::AlreadyActive)
        );
        assert_eq!(timers.len(), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn poll_errors_when_idle_or_foreign() {
        let (pointer, timers, mut dnd) = setup();
        let mut events = Vec::new();
        let foreign = timers.schedule_repeating(Duration::from_millis(50));
        assert_eq!(dnd.on_poll(foreign, &mut events), Err(DragError::NotActive));
        pointer.press();
        dnd.start_drag(1, &mut events).unwrap();
        assert_eq!(
            dnd.on_poll(foreign, &mut events),
            Err(DragError::ForeignTimer(foreign))
        );
        assert!(dnd.is_active());
    }

    #[test]
    fn destroy_ends_without_final_update() {
        let (pointer, timers, mut dnd) = setup();
        let mut events = Vec::new();
        start_by_leaving(&pointer, &mut dnd, &mut events);
        events.clear();
        dnd.destroy(&mut events);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ev::Ended { widget: 1, .. }));
        assert!(timers.is_empty());
        assert_eq!(dnd.widgets().count(), 0);
    }

    #[test]
    fn dropping_manager_cancels_timer() {
        let (pointer, timers, mut dnd) = setup();
        let mut events = Vec::new();
        start_by_leaving(&pointer, &mut dnd, &mut events);
        assert_eq!(timers.len(), 1);
        drop(dnd);
        assert!(timers.is_empty());
    }
}
