//! Bounded step cursor for wizards and carousels.

use std::rc::Rc;

use tether_core::{Signal, remember, signal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepOptions {
    /// Clamped into `[0, max_step]`.
    pub initial_step: i64,
    pub max_step: usize,
    /// Wrap around at both ends instead of stopping.
    pub circular: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            initial_step: 0,
            max_step: 1,
            circular: false,
        }
    }
}

impl StepOptions {
    pub fn initial_step(mut self, step: i64) -> Self {
        self.initial_step = step;
        self
    }

    pub fn max_step(mut self, max: usize) -> Self {
        self.max_step = max;
        self
    }

    pub fn circular(mut self, circular: bool) -> Self {
        self.circular = circular;
        self
    }
}

/// `current` always lies in `[0, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepCursor {
    current: usize,
    max: usize,
    initial: usize,
    circular: bool,
}

fn clamp_step(n: i64, max: usize) -> usize {
    if n <= 0 {
        0
    } else {
        usize::try_from(n).map_or(max, |n| n.min(max))
    }
}

impl Default for StepCursor {
    fn default() -> Self {
        StepOptions::default().into()
    }
}

impl From<StepOptions> for StepCursor {
    fn from(o: StepOptions) -> Self {
        Self::new(o.initial_step, o.max_step, o.circular)
    }
}

impl StepCursor {
    pub fn new(initial_step: i64, max_step: usize, circular: bool) -> Self {
        let initial = clamp_step(initial_step, max_step);
        Self {
            current: initial,
            max: max_step,
            initial,
            circular,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    pub fn go_to_next_step(&mut self) {
        if self.current < self.max {
            self.current += 1;
        } else if self.circular {
            self.current = 0;
        }
    }

    pub fn go_to_previous_step(&mut self) {
        if self.current > 0 {
            self.current -= 1;
        } else if self.circular {
            self.current = self.max;
        }
    }

    pub fn go_to_step(&mut self, step: i64) {
        self.current = clamp_step(step, self.max);
    }

    /// Back to the clamped construction-time step, not necessarily 0.
    pub fn reset(&mut self) {
        self.current = self.initial.min(self.max);
    }

    pub fn set_max_step(&mut self, max: usize) {
        self.max = max;
        if self.current > max {
            self.current = max;
        }
    }

    pub fn is_first_step(&self) -> bool {
        self.current == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current == self.max
    }

    pub fn can_go_to_previous(&self) -> bool {
        self.circular || self.current > 0
    }

    pub fn can_go_to_next(&self) -> bool {
        self.circular || self.current < self.max
    }
}

/// Reactive wrapper around a [`StepCursor`]; every navigation publishes the
/// new cursor through [`Stepper::cursor_signal`].
#[derive(Clone, Debug)]
pub struct Stepper {
    cursor: Signal<StepCursor>,
}

impl Stepper {
    pub fn new(options: StepOptions) -> Self {
        Self {
            cursor: signal(options.into()),
        }
    }

    pub fn cursor(&self) -> StepCursor {
        self.cursor.get()
    }

    pub fn cursor_signal(&self) -> Signal<StepCursor> {
        self.cursor.clone()
    }

    pub fn current(&self) -> usize {
        self.cursor.with(StepCursor::current)
    }

    pub fn go_to_next_step(&self) {
        self.cursor.update(StepCursor::go_to_next_step);
    }

    pub fn go_to_previous_step(&self) {
        self.cursor.update(StepCursor::go_to_previous_step);
    }

    pub fn go_to_step(&self, step: i64) {
        self.cursor.update(|c| c.go_to_step(step));
    }

    pub fn reset(&self) {
        self.cursor.update(StepCursor::reset);
    }

    pub fn set_max_step(&self, max: usize) {
        self.cursor.update(|c| c.set_max_step(max));
    }
}

/// Options are read on the first pass only; later changes go through the
/// returned stepper.
pub fn use_step(options: StepOptions) -> Rc<Stepper> {
    remember(|| Stepper::new(options))
}
