//! Virtual user state machine.
//!
//! The scheduler is the only mutator of a [`Vu`]; transitions are checked
//! against the table in the governing specification and any other attempted
//! transition is a bug, not a typed error — [`Vu::transition_to`] panics.

/// Lifecycle state of a virtual user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VuState {
    Spawned,
    Ready,
    Executing,
    Waiting,
    Complete,
}

/// One virtual user's full mutable state, owned exclusively by the
/// scheduler.
#[derive(Debug, Clone, Copy)]
pub struct Vu {
    pub id: u32,
    pub state: VuState,
    pub spawn_tick: u64,
    pub last_transition_tick: u64,
    pub scenario_step: u32,
    pub pending_request_id: u64,
    pub timeout_tick: u64,
    /// Consecutive timeouts observed on the current scenario step; reset
    /// whenever a response is received or the step advances.
    pub timeouts_on_step: u32,
}

impl Vu {
    #[must_use]
    pub const fn new(id: u32, spawn_tick: u64) -> Self {
        assert!(id > 0, "vu id must be non-zero");
        Self {
            id,
            state: VuState::Spawned,
            spawn_tick,
            last_transition_tick: spawn_tick,
            scenario_step: 0,
            pending_request_id: 0,
            timeout_tick: 0,
            timeouts_on_step: 0,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, VuState::Spawned | VuState::Complete)
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.state, VuState::Complete)
    }

    #[must_use]
    pub const fn can_execute(&self) -> bool {
        matches!(self.state, VuState::Ready)
    }

    /// Attempt a state transition at logical time `now`.
    ///
    /// Panics if `new` is not reachable from the current state per the
    /// allowed-transition table, or if `now` precedes
    /// `last_transition_tick`. Both are invariant violations, never
    /// resource or configuration errors.
    pub fn transition_to(&mut self, new: VuState, now: u64) {
        assert!(
            now >= self.last_transition_tick,
            "vu {} transition at tick {now} precedes last transition at {}",
            self.id,
            self.last_transition_tick
        );
        let allowed = matches!(
            (self.state, new),
            (VuState::Spawned, VuState::Ready)
                | (VuState::Ready, VuState::Executing)
                | (VuState::Executing, VuState::Waiting)
                | (VuState::Waiting, VuState::Ready)
                | (VuState::Ready, VuState::Complete)
                | (VuState::Waiting, VuState::Complete)
        );
        assert!(
            allowed,
            "vu {} illegal transition {:?} -> {:?}",
            self.id, self.state, new
        );
        self.state = new;
        self.last_transition_tick = now;
    }
}
