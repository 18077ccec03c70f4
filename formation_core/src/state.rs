//! The tracking state store.
//!
//! One [`TrackingState`] describes what the pipeline concluded for the
//! current frame.  It is published whole: the single [`StateWriter`] swaps
//! in a fully built snapshot, so a [`StateReader`] can never observe a new
//! gesture mode next to last frame's formation.
//!
//! The store is single-threaded, matching the render loop that drives it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::formation::Formation;
use crate::gesture::GestureMode;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackingState {
    pub is_tracking:  bool,
    pub gesture_mode: GestureMode,
    pub formation:    Formation,
}

type Slot = Rc<RefCell<Rc<TrackingState>>>;

/// Constructor for a writer / reader pair sharing one state slot.
pub struct TrackingStore;

impl TrackingStore {
    /// Create the store, initialised to `{ false, DRAGON, empty }`.
    ///
    /// The writer is handed to the pipeline; clone the reader for every
    /// consumer that needs to look at the state.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (StateWriter, StateReader) {
        let slot: Slot = Rc::new(RefCell::new(Rc::new(TrackingState::default())));
        (StateWriter { slot: Rc::clone(&slot) }, StateReader { slot })
    }
}

/// The only handle that can change the state.  Deliberately not `Clone`.
#[derive(Debug)]
pub struct StateWriter {
    slot: Slot,
}

impl StateWriter {
    /// Replace the published state in one step.
    pub fn publish(&mut self, state: TrackingState) {
        *self.slot.borrow_mut() = Rc::new(state);
    }

    /// A reader onto the same slot.
    pub fn reader(&self) -> StateReader {
        StateReader { slot: Rc::clone(&self.slot) }
    }
}

/// Read-only view of the published state.
#[derive(Clone, Debug)]
pub struct StateReader {
    slot: Slot,
}

impl StateReader {
    /// The most recently published state.  The snapshot stays valid (and
    /// unchanged) even if the writer publishes again while it is held.
    pub fn snapshot(&self) -> Rc<TrackingState> {
        Rc::clone(&self.slot.borrow())
    }

    pub fn is_tracking(&self) -> bool {
        self.slot.borrow().is_tracking
    }

    pub fn gesture_mode(&self) -> GestureMode {
        self.slot.borrow().gesture_mode
    }
}
