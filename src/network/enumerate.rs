//! Stateful iterators driving the stitching phase.

use super::Witness;

/// Lexicographic walk over `[1, dim]^len`: starts at all ones, the last
/// position varies fastest. `dim = 1` yields the single all-ones sequence.
#[derive(Debug, Clone)]
pub(crate) struct PositionSequences {
    dim: usize,
    current: Option<Vec<usize>>,
}

impl PositionSequences {
    pub fn new(dim: usize, len: usize) -> Self {
        Self {
            dim,
            current: Some(vec![1; len]),
        }
    }
}

impl Iterator for PositionSequences {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.current.take()?;

        let mut next = current.clone();
        for position in next.iter_mut().rev() {
            if *position < self.dim {
                *position += 1;
                self.current = Some(next);
                return Some(current);
            }
            *position = 1;
        }

        Some(current)
    }
}

/// One leaf block's contribution to a candidate: a state path and one
/// concrete input position per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LeafChoice {
    pub states: Vec<usize>,
    pub inputs: Vec<usize>,
}

/// Odometer over all combinations of one witness per leaf block and one
/// concrete input position per step of each chosen witness.
///
/// The witness combination advances outermost; within a fixed combination
/// the input choices advance with the last leaf's last step varying fastest.
/// Each combination is yielded as an immutable snapshot, so callers can hold
/// on to a candidate without aliasing the iterator's cursor.
#[derive(Debug, Clone)]
pub(crate) struct CandidateEnumerator<'a> {
    witnesses: Vec<&'a [Witness]>,
    witness_idx: Vec<usize>,
    input_idx: Vec<Vec<usize>>,
    done: bool,
}

impl<'a> CandidateEnumerator<'a> {
    /// `witnesses[i]` holds the candidate trajectories of the i-th leaf. A
    /// leaf without witnesses leaves nothing to enumerate.
    pub fn new(witnesses: Vec<&'a [Witness]>) -> Self {
        let done = witnesses.iter().any(|options| options.is_empty());
        let witness_idx = vec![0; witnesses.len()];
        let input_idx = witnesses
            .iter()
            .map(|options| vec![0; options.first().map_or(0, |first| first.inputs.len())])
            .collect();

        Self {
            witnesses,
            witness_idx,
            input_idx,
            done,
        }
    }

    fn snapshot(&self) -> Vec<LeafChoice> {
        self.witnesses
            .iter()
            .enumerate()
            .map(|(leaf, options)| {
                let witness = &options[self.witness_idx[leaf]];
                let inputs = witness
                    .inputs
                    .iter()
                    .zip(&self.input_idx[leaf])
                    .map(|(set, &choice)| set[choice])
                    .collect();
                LeafChoice {
                    states: witness.states.clone(),
                    inputs,
                }
            })
            .collect()
    }

    /// Advance the inner input odometer; false once it has wrapped around.
    fn advance_inputs(&mut self) -> bool {
        for leaf in (0..self.witnesses.len()).rev() {
            let witness = &self.witnesses[leaf][self.witness_idx[leaf]];
            for step in (0..self.input_idx[leaf].len()).rev() {
                if self.input_idx[leaf][step] + 1 < witness.inputs[step].len() {
                    self.input_idx[leaf][step] += 1;
                    return true;
                }
                self.input_idx[leaf][step] = 0;
            }
        }
        false
    }

    /// Advance the outer witness odometer; false once it has wrapped around.
    fn advance_witnesses(&mut self) -> bool {
        for leaf in (0..self.witnesses.len()).rev() {
            if self.witness_idx[leaf] + 1 < self.witnesses[leaf].len() {
                self.witness_idx[leaf] += 1;
                for later in leaf + 1..self.witnesses.len() {
                    self.witness_idx[later] = 0;
                }
                self.reset_inputs();
                return true;
            }
            self.witness_idx[leaf] = 0;
        }
        false
    }

    fn reset_inputs(&mut self) {
        for leaf in 0..self.witnesses.len() {
            let witness = &self.witnesses[leaf][self.witness_idx[leaf]];
            self.input_idx[leaf] = vec![0; witness.inputs.len()];
        }
    }
}

impl Iterator for CandidateEnumerator<'_> {
    type Item = Vec<LeafChoice>;

    fn next(&mut self) -> Option<Vec<LeafChoice>> {
        if self.done {
            return None;
        }

        let snapshot = self.snapshot();
        if !self.advance_inputs() && !self.advance_witnesses() {
            self.done = true;
        }

        Some(snapshot)
    }
}
