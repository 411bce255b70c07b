//! Component A: the registry embedded in every [`crate::model::System`].
//!
//! Assigns dense, gap-free indices/slices to states, signals, events, inputs
//! and outputs as they are declared. Allocation order determines slice
//! layout and is the sole source of nondeterminism to avoid: given the same
//! construction sequence, two registries always hand out the same indices.
//! There is no deallocation — entities live exactly as long as their System.

use crate::model::handle::{EventId, InputId, OutputId, SignalId, StateId};

#[derive(Debug, Default)]
pub(crate) struct Registry {
    next_state: usize,
    next_signal: usize,
    next_event: usize,
    next_input: usize,
    next_output: usize,
    next_declaration_order: usize,
}

impl Registry {
    pub fn allocate_state(&mut self, size: usize) -> StateId {
        let idx = self.next_state;
        self.next_state += size;
        StateId(idx)
    }

    pub fn allocate_signal(&mut self, size: usize) -> SignalId {
        let idx = self.next_signal;
        self.next_signal += size;
        SignalId(idx)
    }

    pub fn allocate_event(&mut self) -> EventId {
        let idx = self.next_event;
        self.next_event += 1;
        EventId(idx)
    }

    pub fn allocate_input(&mut self, size: usize) -> InputId {
        let idx = self.next_input;
        self.next_input += size;
        InputId(idx)
    }

    pub fn allocate_output(&mut self, size: usize) -> OutputId {
        let idx = self.next_output;
        self.next_output += size;
        OutputId(idx)
    }

    /// Hands out a monotonic declaration index shared by every event source
    /// (zero-crossing or clock), used only to break ties when multiple
    /// events trigger at the same simulated time. Distinct from
    /// `allocate_event`, which only clocks-and-zero-crossings-that-have-a-
    /// scalar-value (i.e. zero-crossings) consume.
    pub fn next_declaration_order(&mut self) -> usize {
        let idx = self.next_declaration_order;
        self.next_declaration_order += 1;
        idx
    }

    pub fn num_states(&self) -> usize {
        self.next_state
    }

    pub fn num_signals(&self) -> usize {
        self.next_signal
    }

    pub fn num_events(&self) -> usize {
        self.next_event
    }

    pub fn num_inputs(&self) -> usize {
        self.next_input
    }

    pub fn num_outputs(&self) -> usize {
        self.next_output
    }
}
