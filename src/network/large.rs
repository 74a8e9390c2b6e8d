use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use log::debug;

use crate::{
    lexer::{tokenize, Token},
    vector::LogicalVector,
};

use super::{
    enumerate::{CandidateEnumerator, LeafChoice, PositionSequences},
    partition::{partition, Partition},
    NetworkError, NetworkResult, SmallBcn, Witness,
};

/// One block's share of a full-network solution: `states` has one entry more
/// than `inputs`, and every `inputs[t]` is a position over the block's own
/// input variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTrajectory {
    pub states: Vec<usize>,
    pub inputs: Vec<usize>,
}

/// Input variables of a block, split by where their values come from.
#[derive(Debug, Clone, Default)]
pub struct BlockInputs {
    /// State variables of other blocks, supplied by predecessors.
    pub interior: Vec<String>,
    /// True network-level external inputs.
    pub exterior: Vec<String>,
}

/// A Boolean control network decomposed into the strongly connected blocks
/// of its variable dependency graph.
///
/// Each block is a [`SmallBcn`] over its own (much smaller) state space;
/// blocks are ordered topologically, so the inputs a block receives from
/// other blocks always come from earlier ones. The decomposition makes
/// networks tractable whose full state space `2^n` could never be
/// enumerated; a network forming a single large component degenerates to the
/// single-block search with its exponential cost.
pub struct LargeBcn {
    variables: Vec<String>,
    input_variables: Vec<String>,
    blocks: Vec<SmallBcn>,
    block_inputs: Vec<BlockInputs>,
    leaves: Vec<usize>,
    dependent: Vec<usize>,
    pred_list: HashMap<usize, Vec<usize>>,
}

impl LargeBcn {
    /// Build and partition the network from an ordered mapping of state
    /// variables to their update expressions.
    pub fn new(d: &IndexMap<String, String>) -> NetworkResult<Self> {
        if d.is_empty() {
            return Err(NetworkError::InvalidInitialState(
                "network has no variables".to_string(),
            ));
        }

        let variables: Vec<String> = d.keys().cloned().collect();
        let mut input_variables: Vec<String> = vec![];
        let mut tokens = vec![];

        for expr in d.values() {
            let stream = tokenize(expr)?;
            for name in stream.iter().filter_map(Token::variable) {
                if !variables.iter().any(|v| v == name)
                    && !input_variables.iter().any(|v| v == name)
                {
                    input_variables.push(name.to_string());
                }
            }
            tokens.push(stream);
        }

        let Partition {
            sccs,
            leaves,
            dependent,
            pred_list,
            topo_index,
        } = partition(&variables, &tokens)?;

        let mut blocks = vec![];
        for scc in &sccs {
            let mut restricted = IndexMap::new();
            for &var in scc {
                let name = &variables[var];
                if let Some(expr) = d.get(name) {
                    restricted.insert(name.clone(), expr.clone());
                }
            }
            blocks.push(SmallBcn::new(&restricted, None)?);
        }

        let mut owner = HashMap::new();
        for (block, scc) in sccs.iter().enumerate() {
            for &var in scc {
                owner.insert(variables[var].as_str(), block);
            }
        }

        let mut block_inputs = vec![];
        for (index, block) in blocks.iter().enumerate() {
            let mut inputs = BlockInputs::default();
            for name in block.input_variables() {
                if input_variables.iter().any(|v| v == name) {
                    inputs.exterior.push(name.clone());
                    continue;
                }
                let Some(&supplier) = owner.get(name.as_str()) else {
                    return Err(NetworkError::InconsistentPartition(format!(
                        "interior input '{name}' of block {index} is not a state variable of any block"
                    )));
                };
                if topo_index[supplier] >= topo_index[index] {
                    return Err(NetworkError::InconsistentPartition(format!(
                        "interior input '{name}' of block {index} is supplied by block {supplier}, which does not precede it"
                    )));
                }
                inputs.interior.push(name.clone());
            }
            block_inputs.push(inputs);
        }

        Ok(Self {
            variables,
            input_variables,
            blocks,
            block_inputs,
            leaves,
            dependent,
            pred_list,
        })
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The network-level external inputs, in order of first occurrence.
    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// One sub-network per strongly connected component.
    pub fn blocks(&self) -> &[SmallBcn] {
        &self.blocks
    }

    /// Interior/exterior input classification, indexed like [`Self::blocks`].
    pub fn block_inputs(&self) -> &[BlockInputs] {
        &self.block_inputs
    }

    /// Blocks without predecessors, in topological order.
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    /// Blocks with at least one predecessor, in topological order.
    pub fn dependent_blocks(&self) -> &[usize] {
        &self.dependent
    }

    pub fn predecessors(&self, block: usize) -> &[usize] {
        self.pred_list
            .get(&block)
            .map(|preds| preds.as_slice())
            .unwrap_or(&[])
    }

    /// `2^n`, the number of full-network states.
    pub fn state_dim(&self) -> usize {
        1 << self.variables.len()
    }

    /// Project a full-network state position into per-block positions.
    fn project(&self, state: usize) -> NetworkResult<Vec<usize>> {
        let bits = LogicalVector::new(state, self.state_dim())?.to_list();
        let assignment: HashMap<&str, u8> = self
            .variables
            .iter()
            .map(String::as_str)
            .zip(bits)
            .collect();

        let mut projected = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let block_bits: Vec<u8> = block
                .variables()
                .iter()
                .map(|var| assignment[var.as_str()])
                .collect();
            projected.push(LogicalVector::from_states(&block_bits)?.pos());
        }

        Ok(projected)
    }

    /// Minimal number of steps driving the full network from `init` to
    /// `dest`, together with one trajectory per block. Positions are over
    /// the full state space (`1..=2^n`); the search gives up past the
    /// `t_max` horizon.
    ///
    /// Leaf blocks are searched breadth-first in lockstep; at the first
    /// horizon where every leaf reaches its projected destination, the leaf
    /// trajectories are combined and each dependent block is reconstructed
    /// under its predecessors' fixed trajectories. The enumeration order is
    /// deterministic, so equal inputs always produce the same solution.
    pub fn optimal_time_control(
        &self,
        init: usize,
        dest: usize,
        t_max: usize,
    ) -> NetworkResult<(usize, Vec<BlockTrajectory>)> {
        self.check_position(init)?;
        self.check_position(dest)?;

        let inits = self.project(init)?;
        let dests = self.project(dest)?;

        let mut queues: Vec<VecDeque<(usize, Witness)>> = self
            .leaves
            .iter()
            .map(|&k| {
                VecDeque::from([(
                    inits[k],
                    Witness {
                        states: vec![inits[k]],
                        inputs: vec![],
                    },
                )])
            })
            .collect();

        for horizon in 1..=t_max {
            let mut res: Vec<Vec<Witness>> = Vec::with_capacity(self.leaves.len());
            let mut all_found = true;

            for (leaf, &k) in self.leaves.iter().enumerate() {
                let block = &self.blocks[k];
                let queue = &mut queues[leaf];

                while queue.front().map(|(_, w)| w.states.len()) == Some(horizon) {
                    let Some((state, witness)) = queue.pop_front() else {
                        break;
                    };
                    for (next, inputs) in block.one_step_states(state) {
                        let mut child = witness.clone();
                        child.states.push(next);
                        child.inputs.push(inputs);
                        queue.push_back((next, child));
                    }
                }

                let found: Vec<Witness> = queue
                    .iter()
                    .filter(|(state, _)| *state == dests[k])
                    .map(|(_, witness)| witness.clone())
                    .collect();
                if found.is_empty() {
                    all_found = false;
                }
                res.push(found);
            }

            if !all_found {
                continue;
            }

            debug!("every leaf block reaches its destination at horizon {horizon}, stitching");

            let witnesses: Vec<&[Witness]> = res.iter().map(Vec::as_slice).collect();
            for candidate in CandidateEnumerator::new(witnesses) {
                if let Some(solution) = self.stitch(horizon, &inits, &dests, &candidate)? {
                    return Ok((horizon, solution));
                }
            }
        }

        Err(NetworkError::Unreachable { init, dest, t_max })
    }

    /// Try to extend one leaf candidate over the dependent blocks. Returns
    /// the full per-block solution once every dependent block reaches its
    /// destination, `None` as soon as one of them cannot.
    fn stitch(
        &self,
        horizon: usize,
        inits: &[usize],
        dests: &[usize],
        candidate: &[LeafChoice],
    ) -> NetworkResult<Option<Vec<BlockTrajectory>>> {
        let mut solution: Vec<Option<BlockTrajectory>> = vec![None; self.blocks.len()];
        for (leaf, &k) in self.leaves.iter().enumerate() {
            solution[k] = Some(BlockTrajectory {
                states: candidate[leaf].states.clone(),
                inputs: candidate[leaf].inputs.clone(),
            });
        }

        for &k in &self.dependent {
            match self.reconstruct(k, horizon, inits, dests, &solution)? {
                Some(trajectory) => solution[k] = Some(trajectory),
                None => return Ok(None),
            }
        }

        Ok(Some(solution.into_iter().flatten().collect()))
    }

    /// Rebuild one dependent block's trajectory under the fixed predecessor
    /// trajectories, trying every external-input sequence until the block
    /// hits its destination or the sequences are exhausted.
    ///
    /// The input assignment at step `t` merges every predecessor's decoded
    /// state and decoded chosen input at `t`, then overlays the block's own
    /// external inputs from the enumerated sequence.
    fn reconstruct(
        &self,
        k: usize,
        horizon: usize,
        inits: &[usize],
        dests: &[usize],
        solution: &[Option<BlockTrajectory>],
    ) -> NetworkResult<Option<BlockTrajectory>> {
        let block = &self.blocks[k];
        let exterior = &self.block_inputs[k].exterior;
        let exterior_dim = 1usize << exterior.len();

        for external_seq in PositionSequences::new(exterior_dim, horizon) {
            let mut state = inits[k];
            let mut trajectory = BlockTrajectory {
                states: vec![state],
                inputs: vec![],
            };

            for t in 0..horizon {
                let mut assignment: HashMap<String, u8> = HashMap::new();
                for &pred in self.predecessors(k) {
                    let Some(pred_trajectory) = solution[pred].as_ref() else {
                        return Err(NetworkError::InconsistentPartition(format!(
                            "predecessor block {pred} of block {k} has no trajectory yet"
                        )));
                    };
                    let pred_block = &self.blocks[pred];
                    assignment.extend(pred_block.decode_state(pred_trajectory.states[t])?);
                    assignment.extend(pred_block.decode_input(pred_trajectory.inputs[t])?);
                }
                if exterior_dim > 1 {
                    let bits = LogicalVector::new(external_seq[t], exterior_dim)?.to_list();
                    for (name, bit) in exterior.iter().zip(bits) {
                        assignment.insert(name.clone(), bit);
                    }
                }

                let input = block.encode_input(&assignment)?;
                let next = block.next_state(state, input);
                trajectory.states.push(next);
                trajectory.inputs.push(input);
                state = next;
            }

            if state == dests[k] {
                return Ok(Some(trajectory));
            }
        }

        Ok(None)
    }

    fn check_position(&self, pos: usize) -> NetworkResult<()> {
        if pos == 0 || pos > self.state_dim() {
            return Err(NetworkError::InvalidInitialState(format!(
                "position {pos} out of range 1..={}",
                self.state_dim()
            )));
        }
        Ok(())
    }
}
