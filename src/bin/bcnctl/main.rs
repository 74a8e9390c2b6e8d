//! # bcnctl
//!
//! Driver for the optimal time control of Boolean control networks: loads a
//! network description, solves for the shortest control sequence between the
//! given states, prints the per-step schedule, and replays it against the
//! live network as a check.

mod cli;

use cli::*;

use std::{error::Error, fs};

use indexmap::IndexMap;
use log::{error, info};
use serde::Deserialize;

use bcn::{
    network::{BlockTrajectory, LargeBcn, NetworkResult, SmallBcn, Witness},
    vector::LogicalVector,
};

/// On-disk description of a network and a control problem.
#[derive(Debug, Deserialize)]
struct NetworkFile {
    /// Ordered mapping from state variable to update expression.
    network: IndexMap<String, String>,
    /// Initial state, one bit per variable.
    init: Vec<u8>,
    /// Destination state, one bit per variable.
    dest: Vec<u8>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into())?;

    let content = fs::read_to_string(&args.file)?;
    let file: NetworkFile = serde_json::from_str(&content)?;

    let init = LogicalVector::from_states(&file.init)?.pos();
    let dest = LogicalVector::from_states(&file.dest)?.pos();

    match args.mode {
        Mode::Large => run_large(&file, init, dest, args.t_max),
        Mode::Small => run_small(&file, init, dest, args.t_max),
    }
}

fn run_large(
    file: &NetworkFile,
    init: usize,
    dest: usize,
    t_max: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let bcn = match LargeBcn::new(&file.network) {
        Ok(bcn) => bcn,
        Err(load_error) => {
            error!("{load_error}");
            std::process::exit(-1);
        }
    };

    info!(
        "partitioned {} variables into {} blocks ({} leaves)",
        bcn.variables().len(),
        bcn.blocks().len(),
        bcn.leaves().len()
    );

    let t_max = t_max.unwrap_or_else(|| bcn.state_dim());
    let (t, solution) = match bcn.optimal_time_control(init, dest, t_max) {
        Ok(result) => result,
        Err(search_error) => {
            error!("{search_error}");
            std::process::exit(-1);
        }
    };

    println!("T* = {t}");
    print_schedule(&bcn, &solution, t)?;
    replay(&bcn, &solution)?;

    Ok(())
}

fn run_small(
    file: &NetworkFile,
    init: usize,
    dest: usize,
    t_max: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let bcn = match SmallBcn::new(&file.network, None) {
        Ok(bcn) => bcn,
        Err(load_error) => {
            error!("{load_error}");
            std::process::exit(-1);
        }
    };

    let t_max = t_max.unwrap_or_else(|| bcn.state_dim());
    let (t, witnesses) = match bcn.optimal_time_control_sync(init, dest, t_max) {
        Ok(result) => result,
        Err(search_error) => {
            error!("{search_error}");
            std::process::exit(-1);
        }
    };

    println!("T* = {t} ({} witnesses)", witnesses.len());
    if let Some(Witness { states, inputs }) = witnesses.first() {
        for step in 0..t {
            let controls = bcn.decode_input(inputs[step][0])?;
            println!(
                "t = {step}: state {:?}, controls {controls:?}",
                bcn.decode_state(states[step])?
            );
        }
        println!("t = {t}: state {:?}", bcn.decode_state(states[t])?);
    }

    Ok(())
}

/// Print the per-step global state assignment and the control assignment
/// restricted to the network-level external inputs.
fn print_schedule(bcn: &LargeBcn, solution: &[BlockTrajectory], t: usize) -> NetworkResult<()> {
    for step in 0..=t {
        let mut states: IndexMap<String, u8> = IndexMap::new();
        let mut inputs: IndexMap<String, u8> = IndexMap::new();
        for (block, trajectory) in bcn.blocks().iter().zip(solution) {
            states.extend(block.decode_state(trajectory.states[step])?);
            if step < t {
                inputs.extend(block.decode_input(trajectory.inputs[step])?);
            }
        }

        let controls: IndexMap<&String, u8> = inputs
            .iter()
            .filter(|(name, _)| bcn.input_variables().iter().any(|v| &v == name))
            .map(|(name, &bit)| (name, bit))
            .collect();
        if step < t {
            println!("t = {step}: states {states:?}, controls {controls:?}");
        } else {
            println!("t = {step}: states {states:?}");
        }
    }

    Ok(())
}

/// Replay every block's schedule against a live copy of the block and
/// confirm the returned trajectory.
fn replay(bcn: &LargeBcn, solution: &[BlockTrajectory]) -> NetworkResult<()> {
    for (block, trajectory) in bcn.blocks().iter().zip(solution) {
        let mut sim = block.clone();
        sim.set_states_i(trajectory.states[0])?;

        for (step, &input) in trajectory.inputs.iter().enumerate() {
            let inputs = sim.decode_input(input)?;
            let next = sim.step(&inputs)?;
            if next != trajectory.states[step + 1] {
                error!(
                    "replay diverged at step {step}: expected state {}, got {next}",
                    trajectory.states[step + 1]
                );
                std::process::exit(-1);
            }
        }
    }

    info!("replay confirmed the returned trajectories");
    Ok(())
}
