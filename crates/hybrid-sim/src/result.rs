//! Component E: the simulation result buffer.
//!
//! Grounded on `simtree.simulation.SimulationResult`: an append-only,
//! pre-allocated store of sample rows, grown by a fixed increment once
//! exhausted rather than doubled, with read-only `[0, count)` slice
//! accessors over each column.

use ndarray::{s, Array1, Array2, ArrayView2};

use crate::error::CoreError;
use crate::model::{Port, Signal, State};

const INITIAL_RESULT_SIZE: usize = 16;
const RESULT_SIZE_EXTENSION: usize = 16;

/// The recorded time series of a simulation run: one row per accepted
/// sample (initial condition, then one row per completed step or localized
/// event), columns for time, inputs, state, signals, events and outputs.
pub struct SimulationResult {
    t: Array1<f64>,
    inputs: Array2<f64>,
    state: Array2<f64>,
    signals: Array2<f64>,
    events: Array2<f64>,
    outputs: Array2<f64>,
    count: usize,
}

impl SimulationResult {
    pub fn new(num_inputs: usize, num_states: usize, num_signals: usize, num_events: usize, num_outputs: usize) -> Self {
        SimulationResult {
            t: Array1::zeros(INITIAL_RESULT_SIZE),
            inputs: Array2::zeros((INITIAL_RESULT_SIZE, num_inputs)),
            state: Array2::zeros((INITIAL_RESULT_SIZE, num_states)),
            signals: Array2::zeros((INITIAL_RESULT_SIZE, num_signals)),
            events: Array2::zeros((INITIAL_RESULT_SIZE, num_events)),
            outputs: Array2::zeros((INITIAL_RESULT_SIZE, num_outputs)),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn time(&self) -> ndarray::ArrayView1<f64> {
        self.t.slice(s![0..self.count])
    }

    pub fn inputs(&self) -> ndarray::ArrayView2<f64> {
        self.inputs.slice(s![0..self.count, ..])
    }

    pub fn state(&self) -> ndarray::ArrayView2<f64> {
        self.state.slice(s![0..self.count, ..])
    }

    pub fn signals(&self) -> ndarray::ArrayView2<f64> {
        self.signals.slice(s![0..self.count, ..])
    }

    pub fn events(&self) -> ndarray::ArrayView2<f64> {
        self.events.slice(s![0..self.count, ..])
    }

    pub fn outputs(&self) -> ndarray::ArrayView2<f64> {
        self.outputs.slice(s![0..self.count, ..])
    }

    /// The recorded column(s) for a single [`State`], across every accepted
    /// sample (§4.E: "Signal access by Signal or Port object returns the
    /// column projection for that entity" — the same projection applies to
    /// states).
    pub fn state_for(&self, state: &State) -> ArrayView2<f64> {
        self.state.slice(s![0..self.count, state.state_slice()])
    }

    /// The recorded column(s) for a single [`Signal`], across every
    /// accepted sample.
    pub fn signal_for(&self, signal: &Signal) -> ArrayView2<f64> {
        self.signals.slice(s![0..self.count, signal.signal_slice()])
    }

    /// The recorded column(s) for a [`Port`], resolved through its
    /// connection chain to the source `Signal` whose values were recorded.
    pub fn port_for(&self, port: &Port) -> Result<ArrayView2<f64>, CoreError> {
        let signal = port.signal()?;
        Ok(self.signals.slice(s![0..self.count, signal.signal_slice()]))
    }

    pub fn append(
        &mut self,
        time: f64,
        inputs: &Array1<f64>,
        state: &Array1<f64>,
        signals: &Array1<f64>,
        events: &Array1<f64>,
        outputs: &Array1<f64>,
    ) {
        if self.count >= self.t.len() {
            self.extend();
        }
        self.t[self.count] = time;
        self.inputs.row_mut(self.count).assign(inputs);
        self.state.row_mut(self.count).assign(state);
        self.signals.row_mut(self.count).assign(signals);
        self.events.row_mut(self.count).assign(events);
        self.outputs.row_mut(self.count).assign(outputs);
        self.count += 1;
    }

    fn extend(&mut self) {
        self.t = grow_1d(&self.t, RESULT_SIZE_EXTENSION);
        self.inputs = grow_2d(&self.inputs, RESULT_SIZE_EXTENSION);
        self.state = grow_2d(&self.state, RESULT_SIZE_EXTENSION);
        self.signals = grow_2d(&self.signals, RESULT_SIZE_EXTENSION);
        self.events = grow_2d(&self.events, RESULT_SIZE_EXTENSION);
        self.outputs = grow_2d(&self.outputs, RESULT_SIZE_EXTENSION);
    }
}

fn grow_1d(arr: &Array1<f64>, extra: usize) -> Array1<f64> {
    let mut out = Array1::zeros(arr.len() + extra);
    out.slice_mut(s![0..arr.len()]).assign(arr);
    out
}

fn grow_2d(arr: &Array2<f64>, extra_rows: usize) -> Array2<f64> {
    let (rows, cols) = arr.dim();
    let mut out = Array2::zeros((rows + extra_rows, cols));
    out.slice_mut(s![0..rows, ..]).assign(arr);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_by_fixed_increment_once_exhausted() {
        let mut result = SimulationResult::new(0, 1, 0, 0, 0);
        for i in 0..INITIAL_RESULT_SIZE {
            result.append(
                i as f64,
                &Array1::zeros(0),
                &Array1::from_elem(1, i as f64),
                &Array1::zeros(0),
                &Array1::zeros(0),
                &Array1::zeros(0),
            );
        }
        assert_eq!(result.len(), INITIAL_RESULT_SIZE);
        assert_eq!(result.state().dim().0, INITIAL_RESULT_SIZE);

        result.append(
            100.0,
            &Array1::zeros(0),
            &Array1::from_elem(1, 100.0),
            &Array1::zeros(0),
            &Array1::zeros(0),
            &Array1::zeros(0),
        );
        assert_eq!(result.len(), INITIAL_RESULT_SIZE + 1);
        assert_eq!(result.time()[INITIAL_RESULT_SIZE], 100.0);
    }
}
