use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::handle::EventId;
use super::scope::{qualify, Scope};
use super::value::EventFn;

/// Which sign changes of a [`ZeroCrossEvent`]'s scalar function trigger it.
/// `Both` is the Python original's default (it does not restrict which
/// *side* a crossing comes from) but, like `Negative`/`Positive`, still
/// requires an actual sign change — it is not a wildcard that matches every
/// step (§3 Data Model: "0 counts both").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Negative,
    Both,
    Positive,
}

impl Direction {
    /// Whether a sign change from `before` to `after` matches this
    /// direction filter. `before`/`after` are the event function's value at
    /// the start and end of the step being checked.
    pub(crate) fn matches(self, before: f64, after: f64) -> bool {
        match self {
            Direction::Both => {
                (before > 0.0 && after <= 0.0) || (before < 0.0 && after >= 0.0)
            }
            Direction::Negative => before > 0.0 && after <= 0.0,
            Direction::Positive => before < 0.0 && after >= 0.0,
        }
    }
}

/// A handler invoked when an event fires, given read access to the
/// evaluator and write access to the in-progress state update (§4.D
/// Simulator, event handling).
pub type EventListener = Box<dyn Fn(&mut crate::sim::state_update::EventContext) -> Result<(), crate::error::CoreError>>;

/// An event source whose scalar function is tracked for sign changes against
/// the adaptive integrator's steps. When a qualifying sign change is
/// detected, the simulator brackets and localizes the crossing time via the
/// configured root-finder, then dispatches every registered listener in
/// registration order.
pub struct ZeroCrossEvent {
    id: EventId,
    name: String,
    event_function: EventFn,
    direction: Direction,
    tolerance: f64,
    declaration_order: usize,
    listeners: RefCell<Vec<EventListener>>,
}

impl ZeroCrossEvent {
    pub fn new(
        parent: &dyn Scope,
        name: &str,
        event_function: impl Fn(&crate::eval::DataProvider) -> Result<f64, crate::error::CoreError>
            + 'static,
        direction: Direction,
        tolerance: f64,
    ) -> Rc<ZeroCrossEvent> {
        let full_name = qualify(parent, name);
        let inner = parent.system_inner();
        let mut inner_mut = inner.borrow_mut();
        let id = inner_mut.registry.allocate_event();
        let declaration_order = inner_mut.registry.next_declaration_order();
        drop(inner_mut);
        log::trace!("declared zero-cross event {full_name} at {id}");

        let event = Rc::new(ZeroCrossEvent {
            id,
            name: full_name,
            event_function: Box::new(event_function),
            direction,
            tolerance,
            declaration_order,
            listeners: RefCell::new(Vec::new()),
        });
        let mut inner_mut = inner.borrow_mut();
        inner_mut.zero_cross_events.push(event.clone());
        inner_mut
            .events_by_name
            .insert(event.name().to_string(), event.clone());
        drop(inner_mut);
        event
    }

    /// Appends a listener, invoked in registration order whenever this event
    /// fires (§3 Data Model: "multiple listeners per event source").
    pub fn register_listener(
        &self,
        listener: impl Fn(&mut crate::sim::state_update::EventContext) -> Result<(), crate::error::CoreError>
            + 'static,
    ) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn declaration_order(&self) -> usize {
        self.declaration_order
    }

    pub(crate) fn eval(
        &self,
        data: &crate::eval::DataProvider,
    ) -> Result<f64, crate::error::CoreError> {
        (self.event_function)(data)
    }

    pub(crate) fn dispatch(
        &self,
        ctx: &mut crate::sim::state_update::EventContext,
    ) -> Result<(), crate::error::CoreError> {
        for listener in self.listeners.borrow().iter() {
            listener(ctx)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ZeroCrossEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZeroCrossEvent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("tolerance", &self.tolerance)
            .field("declaration_order", &self.declaration_order)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ZeroCrossEvent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ZeroCrossEvent {}

/// A periodic event source: fires at `start_time + k * period` for every
/// integer `k >= 0`, up to and including `end_time` if one is set.
///
/// Has no counterpart in the Python original this crate is modeled after
/// (which only supports condition-based `EventSource`s); added as a
/// supplemental source of scheduled, non-state-dependent events, matching
/// the scheduler-level `ClockDef` concept used for periodic ticks in
/// register-transfer simulators.
pub struct Clock {
    name: String,
    start_time: f64,
    period: f64,
    end_time: Option<f64>,
    declaration_order: usize,
    listeners: RefCell<Vec<EventListener>>,
}

impl Clock {
    pub fn new(
        parent: &dyn Scope,
        name: &str,
        start_time: f64,
        period: f64,
        end_time: Option<f64>,
    ) -> Rc<Clock> {
        let full_name = qualify(parent, name);
        let inner = parent.system_inner();
        let declaration_order = inner.borrow_mut().registry.next_declaration_order();
        log::trace!("declared clock {full_name} (period {period})");

        let clock = Rc::new(Clock {
            name: full_name,
            start_time,
            period,
            end_time,
            declaration_order,
            listeners: RefCell::new(Vec::new()),
        });
        let mut inner_mut = inner.borrow_mut();
        inner_mut.clocks.push(clock.clone());
        inner_mut
            .clocks_by_name
            .insert(clock.name().to_string(), clock.clone());
        drop(inner_mut);
        clock
    }

    pub fn register_listener(
        &self,
        listener: impl Fn(&mut crate::sim::state_update::EventContext) -> Result<(), crate::error::CoreError>
            + 'static,
    ) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaration_order(&self) -> usize {
        self.declaration_order
    }

    /// Every scheduled fire time in `(t_start, t_end]`, in ascending order.
    /// Half-open on the lower bound so a fire time exactly at the current
    /// simulated instant is not re-fired on the next step.
    pub(crate) fn fire_times_in(&self, t_start: f64, t_end: f64) -> Vec<f64> {
        if self.period <= 0.0 {
            return Vec::new();
        }
        let t_end = match self.end_time {
            Some(end) => t_end.min(end),
            None => t_end,
        };
        if t_end <= t_start {
            return Vec::new();
        }

        let mut k = if t_start < self.start_time {
            0
        } else {
            (((t_start - self.start_time) / self.period).floor() as i64 + 1).max(0)
        };
        let mut out = Vec::new();
        loop {
            let t = self.start_time + (k as f64) * self.period;
            if t > t_end + 1e-12 {
                break;
            }
            if t > t_start {
                out.push(t);
            }
            k += 1;
        }
        out
    }

    pub(crate) fn dispatch(
        &self,
        ctx: &mut crate::sim::state_update::EventContext,
    ) -> Result<(), crate::error::CoreError> {
        for listener in self.listeners.borrow().iter() {
            listener(ctx)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("name", &self.name)
            .field("start_time", &self.start_time)
            .field("period", &self.period)
            .field("end_time", &self.end_time)
            .field("declaration_order", &self.declaration_order)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Clock {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Clock {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_fire_times_are_half_open_on_lower_bound() {
        let clock = Clock {
            name: "c".into(),
            start_time: 0.0,
            period: 1.0,
            end_time: None,
            declaration_order: 0,
            listeners: RefCell::new(Vec::new()),
        };
        assert_eq!(clock.fire_times_in(0.0, 3.0), vec![1.0, 2.0, 3.0]);
        assert_eq!(clock.fire_times_in(1.0, 3.0), vec![2.0, 3.0]);
    }

    #[test]
    fn clock_fire_times_respect_end_time() {
        let clock = Clock {
            name: "c".into(),
            start_time: 0.5,
            period: 0.5,
            end_time: Some(1.5),
            declaration_order: 0,
            listeners: RefCell::new(Vec::new()),
        };
        assert_eq!(clock.fire_times_in(0.0, 10.0), vec![0.5, 1.0, 1.5]);
    }
}
