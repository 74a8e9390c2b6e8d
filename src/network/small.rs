use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use log::debug;

use crate::{
    eval::{evaluate, EvalError},
    lexer::{tokenize, Token},
    vector::LogicalVector,
};

use super::{NetworkError, NetworkResult};

/// A state trajectory paired with the input choices realizing it.
///
/// `states` starts at the initial state; `inputs[t]` is the ascending set of
/// input positions that all map `states[t]` to `states[t + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub states: Vec<usize>,
    pub inputs: Vec<Vec<usize>>,
}

/// A Boolean control network over a single block of state variables.
///
/// Update expressions are evaluated simultaneously: within one step, every
/// expression reads the same pre-image state. The transition structure is
/// tabulated once at construction into the algebraic state-space
/// representation `L`, a dense table mapping every `(state, input)` position
/// pair to the next state position.
#[derive(Debug, Clone)]
pub struct SmallBcn {
    variables: Vec<String>,
    input_variables: Vec<String>,
    tokens: Vec<Vec<Token>>,
    states: Vec<u8>,
    assr: Vec<usize>,
}

impl SmallBcn {
    /// Build the network from an ordered mapping of state variables to their
    /// update expressions. Identifiers that are not state variables become
    /// input variables, in order of first occurrence. `init_states` defaults
    /// to all zeros.
    pub fn new(d: &IndexMap<String, String>, init_states: Option<&[u8]>) -> NetworkResult<Self> {
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

        let init = match init_states {
            Some(init) => {
                if init.len() != variables.len() {
                    return Err(NetworkError::InvalidInitialState(format!(
                        "the number of states and variables must be the same, got {} and {}",
                        init.len(),
                        variables.len()
                    )));
                }
                if let Some(&bit) = init.iter().find(|&&bit| bit > 1) {
                    return Err(NetworkError::InvalidInitialState(format!(
                        "state should be 0 or 1, got {bit}"
                    )));
                }
                init.to_vec()
            }
            None => vec![0; variables.len()],
        };

        let mut bcn = Self {
            variables,
            input_variables,
            tokens,
            states: vec![],
            assr: vec![],
        };
        bcn.generate_assr()?;
        bcn.states = init;

        Ok(bcn)
    }

    /// Tabulate `(state, input) -> next state` by stepping the network over
    /// every assignment.
    fn generate_assr(&mut self) -> NetworkResult<()> {
        let n_dim = self.state_dim();
        let m_dim = self.input_dim();
        let mut assr = vec![0; n_dim * m_dim];

        for input in 1..=m_dim {
            let inputs = self.decode_input(input)?;
            for state in 1..=n_dim {
                self.set_states_i(state)?;
                let next = self.step(&inputs)?;
                assr[(input - 1) * n_dim + (state - 1)] = next;
            }
        }

        self.assr = assr;
        Ok(())
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// `2^n`, the number of network states.
    pub fn state_dim(&self) -> usize {
        1 << self.variables.len()
    }

    /// `2^m`, the number of input assignments. 1 for autonomous networks.
    pub fn input_dim(&self) -> usize {
        1 << self.input_variables.len()
    }

    /// The transition table, laid out as `L[(u - 1) * N + (s - 1)]`.
    pub fn assr(&self) -> &[usize] {
        &self.assr
    }

    /// Transition table lookup. `state` and `input` are 1-based positions.
    pub fn next_state(&self, state: usize, input: usize) -> usize {
        self.assr[(input - 1) * self.state_dim() + (state - 1)]
    }

    /// All states reachable from `state` in one step, each paired with the
    /// ascending list of input positions realizing the transition. Entries
    /// appear in order of the smallest realizing input.
    pub fn one_step_states(&self, state: usize) -> IndexMap<usize, Vec<usize>> {
        let mut res: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for input in 1..=self.input_dim() {
            res.entry(self.next_state(state, input)).or_default().push(input);
        }
        res
    }

    /// Decode an input position into the assignment of the input variables.
    pub fn decode_input(&self, input: usize) -> NetworkResult<IndexMap<String, u8>> {
        if self.input_variables.is_empty() {
            return Ok(IndexMap::new());
        }

        let bits = LogicalVector::new(input, self.input_dim())?.to_list();
        Ok(self.input_variables.iter().cloned().zip(bits).collect())
    }

    /// Encode an assignment of the input variables into an input position.
    /// Names beyond the input variables are ignored.
    pub fn encode_input(&self, inputs: &HashMap<String, u8>) -> NetworkResult<usize> {
        if self.input_variables.is_empty() {
            return Ok(1);
        }

        let mut bits = Vec::with_capacity(self.input_variables.len());
        for name in &self.input_variables {
            let Some(&bit) = inputs.get(name) else {
                return Err(EvalError::UnboundInput(name.clone()).into());
            };
            bits.push(bit);
        }

        Ok(LogicalVector::from_states(&bits)?.pos())
    }

    /// Decode a state position into the assignment of the variables.
    pub fn decode_state(&self, state: usize) -> NetworkResult<IndexMap<String, u8>> {
        let bits = LogicalVector::new(state, self.state_dim())?.to_list();
        Ok(self.variables.iter().cloned().zip(bits).collect())
    }

    /// Set the named state cache. Names beyond the variables are ignored; a
    /// missing variable is an error.
    pub fn set_states(&mut self, states: &HashMap<String, u8>) -> NetworkResult<()> {
        let mut next = Vec::with_capacity(self.variables.len());
        for var in &self.variables {
            let Some(&bit) = states.get(var) else {
                return Err(NetworkError::InvalidInitialState(format!(
                    "state missed key '{var}'"
                )));
            };
            if bit > 1 {
                return Err(NetworkError::InvalidInitialState(format!(
                    "state should be 0 or 1, got {bit}"
                )));
            }
            next.push(bit);
        }

        self.states = next;
        Ok(())
    }

    /// Set the named state cache from a state position.
    pub fn set_states_i(&mut self, state: usize) -> NetworkResult<()> {
        self.states = LogicalVector::new(state, self.state_dim())?.to_list();
        Ok(())
    }

    /// Current state of every variable, in variable order.
    pub fn state_list(&self) -> &[u8] {
        &self.states
    }

    /// Current state as a name → bit mapping.
    pub fn state_map(&self) -> IndexMap<String, u8> {
        self.variables
            .iter()
            .cloned()
            .zip(self.states.iter().copied())
            .collect()
    }

    /// Evaluate every update expression against the current state and the
    /// given inputs, advance the network, and return the new state position.
    pub fn step(&mut self, inputs: &IndexMap<String, u8>) -> NetworkResult<usize> {
        let mut env: HashMap<String, u8> = self
            .variables
            .iter()
            .cloned()
            .zip(self.states.iter().copied())
            .collect();
        env.extend(inputs.iter().map(|(name, &bit)| (name.clone(), bit)));

        let mut next = Vec::with_capacity(self.variables.len());
        for stream in &self.tokens {
            next.push(evaluate(stream, &env)?);
        }

        self.states = next;
        Ok(LogicalVector::from_states(&self.states)?.pos())
    }

    /// Shortest control from `init` to `dest` via BFS with visited-set
    /// pruning. Returns the optimal step count and a single witness; use
    /// [`SmallBcn::optimal_time_control_sync`] to collect every witness.
    pub fn optimal_time_control(&self, init: usize, dest: usize) -> NetworkResult<(usize, Witness)> {
        self.check_position(init)?;
        self.check_position(dest)?;

        let mut visited = HashSet::from([init]);
        let mut queue = VecDeque::from([(
            init,
            Witness {
                states: vec![init],
                inputs: vec![],
            },
        )]);

        while let Some((state, witness)) = queue.pop_front() {
            for (next, inputs) in self.one_step_states(state) {
                if next == dest {
                    let mut found = witness;
                    found.states.push(next);
                    found.inputs.push(inputs);
                    return Ok((found.inputs.len(), found));
                }
                if visited.insert(next) {
                    let mut child = witness.clone();
                    child.states.push(next);
                    child.inputs.push(inputs);
                    queue.push_back((next, child));
                }
            }
        }

        Err(NetworkError::Unreachable {
            init,
            dest,
            t_max: self.state_dim(),
        })
    }

    /// Shortest control from `init` to `dest` via level-synchronized BFS.
    /// Returns the optimal step count together with every witness of exactly
    /// that length, in discovery order. Gives up past the `t_max` horizon.
    pub fn optimal_time_control_sync(
        &self,
        init: usize,
        dest: usize,
        t_max: usize,
    ) -> NetworkResult<(usize, Vec<Witness>)> {
        self.check_position(init)?;
        self.check_position(dest)?;

        let mut queue = VecDeque::from([(
            init,
            Witness {
                states: vec![init],
                inputs: vec![],
            },
        )]);

        for horizon in 1..=t_max {
            while queue.front().map(|(_, w)| w.states.len()) == Some(horizon) {
                let Some((state, witness)) = queue.pop_front() else {
                    break;
                };
                for (next, inputs) in self.one_step_states(state) {
                    let mut child = witness.clone();
                    child.states.push(next);
                    child.inputs.push(inputs);
                    queue.push_back((next, child));
                }
            }

            let found: Vec<Witness> = queue
                .iter()
                .filter(|(state, _)| *state == dest)
                .map(|(_, witness)| witness.clone())
                .collect();
            if !found.is_empty() {
                debug!("found {} witnesses at horizon {horizon}", found.len());
                return Ok((horizon, found));
            }
        }

        Err(NetworkError::Unreachable { init, dest, t_max })
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

#[cfg(test)]
mod tests {
    use super::*;

    fn three_variables() -> IndexMap<String, String> {
        IndexMap::from([
            ("x1".to_string(), "x2 | x3".to_string()),
            ("x2".to_string(), "x1 & u1".to_string()),
            ("x3".to_string(), "(u1 | x2) & (!x1)".to_string()),
        ])
    }

    #[test]
    fn test_new() {
        let d = IndexMap::from([
            ("x1".to_string(), "x2 & x3 ^ u1".to_string()),
            ("x2".to_string(), "x1 | x3".to_string()),
            ("x3".to_string(), "x1 & u2".to_string()),
        ]);

        assert!(SmallBcn::new(&d, Some(&[1])).is_err());
        assert!(SmallBcn::new(&d, Some(&[1, 0, 2])).is_err());

        let bcn = SmallBcn::new(&d, Some(&[1, 0, 1])).unwrap();
        assert_eq!(bcn.variables(), ["x1", "x2", "x3"]);
        assert_eq!(bcn.input_variables(), ["u1", "u2"]);
        assert_eq!(bcn.state_list(), [1, 0, 1]);
    }

    #[test]
    fn test_new_rejects_malformed_expression() {
        let d = IndexMap::from([("x1".to_string(), "x1 &".to_string())]);
        assert!(matches!(
            SmallBcn::new(&d, None),
            Err(NetworkError::Eval(_))
        ));
    }

    #[test]
    fn test_generate_assr() {
        let bcn = SmallBcn::new(&three_variables(), None).unwrap();
        assert_eq!(
            bcn.assr(),
            [2, 2, 2, 6, 3, 3, 3, 7, 4, 4, 4, 8, 3, 3, 4, 8]
        );
    }

    #[test]
    fn test_one_step_states() {
        let bcn = SmallBcn::new(&three_variables(), None).unwrap();
        let states: Vec<(usize, Vec<usize>)> = bcn.one_step_states(8).into_iter().collect();
        assert_eq!(states, vec![(7, vec![1]), (8, vec![2])]);

        // both inputs share the image of state 5, so they are grouped
        let states: Vec<(usize, Vec<usize>)> = bcn.one_step_states(5).into_iter().collect();
        assert_eq!(states, vec![(3, vec![1, 2])]);
    }

    #[test]
    fn test_step() {
        let d = IndexMap::from([
            ("x1".to_string(), "x2 & x3 ^ u1".to_string()),
            ("x2".to_string(), "x1 | x3".to_string()),
            ("x3".to_string(), "x1 & u2".to_string()),
        ]);
        let mut bcn = SmallBcn::new(&d, Some(&[1, 0, 1])).unwrap();

        let inputs = IndexMap::from([("u1".to_string(), 1), ("u2".to_string(), 0)]);
        bcn.step(&inputs).unwrap();
        assert_eq!(bcn.state_list(), [1, 1, 0]);
    }

    #[test]
    fn test_step_rejects_missing_input() {
        let d = IndexMap::from([("x1".to_string(), "x1 & u1".to_string())]);
        let mut bcn = SmallBcn::new(&d, None).unwrap();
        assert!(matches!(
            bcn.step(&IndexMap::new()),
            Err(NetworkError::Eval(EvalError::UnboundInput(_)))
        ));
    }

    #[test]
    fn test_set_states() {
        let mut bcn = SmallBcn::new(&three_variables(), None).unwrap();

        let states = HashMap::from([
            ("x2".to_string(), 1),
            ("x3".to_string(), 1),
            ("x1".to_string(), 0),
            ("x4".to_string(), 0),
        ]);
        bcn.set_states(&states).unwrap();
        assert_eq!(bcn.state_list(), [0, 1, 1]);

        let missing = HashMap::from([("x1".to_string(), 1), ("x2".to_string(), 1)]);
        assert!(bcn.set_states(&missing).is_err());

        bcn.set_states_i(5).unwrap();
        assert_eq!(bcn.state_list(), [0, 1, 1]);
        assert_eq!(
            bcn.state_map(),
            IndexMap::from([
                ("x1".to_string(), 0),
                ("x2".to_string(), 1),
                ("x3".to_string(), 1),
            ])
        );
    }

    #[test]
    fn test_encode_decode_input() {
        let bcn = SmallBcn::new(&three_variables(), None).unwrap();

        assert_eq!(
            bcn.decode_input(1).unwrap(),
            IndexMap::from([("u1".to_string(), 1)])
        );
        assert_eq!(
            bcn.encode_input(&HashMap::from([("u1".to_string(), 0)])).unwrap(),
            2
        );
        assert!(matches!(
            bcn.encode_input(&HashMap::new()),
            Err(NetworkError::Eval(EvalError::UnboundInput(_)))
        ));
    }

    #[test]
    fn test_next_state_matches_step() {
        let mut bcn = SmallBcn::new(&three_variables(), None).unwrap();
        for state in 1..=bcn.state_dim() {
            for input in 1..=bcn.input_dim() {
                let inputs = bcn.decode_input(input).unwrap();
                bcn.set_states_i(state).unwrap();
                assert_eq!(bcn.step(&inputs).unwrap(), bcn.next_state(state, input));
            }
        }
    }

    #[test]
    fn test_optimal_time_control() {
        let bcn = SmallBcn::new(&three_variables(), None).unwrap();

        // 8 -> 7 under input 1, then 7 -> 3 under input 1
        let (t, witness) = bcn.optimal_time_control(8, 3).unwrap();
        assert_eq!(t, 2);
        assert_eq!(witness.states, vec![8, 7, 3]);
        assert_eq!(witness.inputs, vec![vec![1], vec![1]]);
    }

    #[test]
    fn test_both_variants_agree() {
        let bcn = SmallBcn::new(&three_variables(), None).unwrap();
        let t_max = bcn.state_dim();

        for dest in [2, 3, 4, 6, 7, 8] {
            let (t_pruned, witness) = bcn.optimal_time_control(8, dest).unwrap();
            let (t_sync, witnesses) = bcn.optimal_time_control_sync(8, dest, t_max).unwrap();
            assert_eq!(t_pruned, t_sync);
            assert!(witnesses.contains(&witness));
        }
    }

    #[test]
    fn test_sync_witnesses_replay() {
        let bcn = SmallBcn::new(&three_variables(), None).unwrap();
        let (t, witnesses) = bcn.optimal_time_control_sync(8, 4, bcn.state_dim()).unwrap();

        for witness in &witnesses {
            assert_eq!(witness.states.len(), t + 1);
            assert_eq!(witness.inputs.len(), t);
            assert_eq!(witness.states[0], 8);
            assert_eq!(witness.states[t], 4);
            for step in 0..t {
                for &input in &witness.inputs[step] {
                    assert_eq!(
                        bcn.next_state(witness.states[step], input),
                        witness.states[step + 1]
                    );
                }
            }
        }
    }

    #[test]
    fn test_unreachable() {
        // x3' requires !x1 while x2' requires x1, so the all-ones state has
        // no pre-image and can never be entered
        let bcn = SmallBcn::new(&three_variables(), None).unwrap();
        assert!(matches!(
            bcn.optimal_time_control(8, 1),
            Err(NetworkError::Unreachable { .. })
        ));
        assert!(matches!(
            bcn.optimal_time_control_sync(8, 1, 6),
            Err(NetworkError::Unreachable { t_max: 6, .. })
        ));
    }

    #[test]
    fn test_autonomous_network() {
        let d = IndexMap::from([("x1".to_string(), "x1".to_string())]);
        let bcn = SmallBcn::new(&d, None).unwrap();

        assert_eq!(bcn.input_dim(), 1);
        assert_eq!(bcn.assr(), [1, 2]);
        assert_eq!(bcn.decode_input(1).unwrap(), IndexMap::new());
        assert_eq!(bcn.encode_input(&HashMap::new()).unwrap(), 1);
        assert!(matches!(
            bcn.optimal_time_control(2, 1),
            Err(NetworkError::Unreachable { .. })
        ));
    }
}
