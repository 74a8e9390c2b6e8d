//! Decomposition of a network into strongly connected blocks.

use std::collections::{HashMap, HashSet};

use log::debug;
use petgraph::{
    algo::{tarjan_scc, toposort},
    graph::{DiGraph, NodeIndex},
    Direction,
};

use crate::lexer::Token;

use super::{NetworkError, NetworkResult};

/// The block structure of a variable dependency graph: strongly connected
/// components condensed into a DAG, topologically ordered.
#[derive(Debug, Clone)]
pub(crate) struct Partition {
    /// Variable indices per block.
    pub sccs: Vec<Vec<usize>>,
    /// Blocks without predecessors, in topological order.
    pub leaves: Vec<usize>,
    /// Blocks with at least one predecessor, in topological order.
    pub dependent: Vec<usize>,
    /// Predecessor blocks of every dependent block.
    pub pred_list: HashMap<usize, Vec<usize>>,
    /// Position of every block in the topological order, indexed by block.
    pub topo_index: Vec<usize>,
}

/// Compute the block structure from the tokenized update expressions. The
/// dependency graph has an edge `y -> x` whenever state variable `y` occurs
/// in the expression defining `x`; self-edges are kept in the graph but are
/// irrelevant to the condensation.
pub(crate) fn partition(variables: &[String], tokens: &[Vec<Token>]) -> NetworkResult<Partition> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..variables.len()).map(|i| graph.add_node(i)).collect();
    let index_of: HashMap<&str, usize> = variables
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();

    for (target, stream) in tokens.iter().enumerate() {
        for name in stream.iter().filter_map(Token::variable) {
            if let Some(&source) = index_of.get(name) {
                graph.add_edge(nodes[source], nodes[target], ());
            }
        }
    }

    let sccs: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .map(|component| component.into_iter().map(|node| graph[node]).collect())
        .collect();

    let mut block_of = vec![0; variables.len()];
    for (block, scc) in sccs.iter().enumerate() {
        for &var in scc {
            block_of[var] = block;
        }
    }

    let mut condensation: DiGraph<usize, ()> = DiGraph::new();
    let block_nodes: Vec<NodeIndex> = (0..sccs.len()).map(|i| condensation.add_node(i)).collect();
    let mut seen = HashSet::new();
    for edge in graph.edge_indices() {
        let Some((source, target)) = graph.edge_endpoints(edge) else {
            continue;
        };
        let (from, to) = (block_of[graph[source]], block_of[graph[target]]);
        if from != to && seen.insert((from, to)) {
            condensation.add_edge(block_nodes[from], block_nodes[to], ());
        }
    }

    let topo = toposort(&condensation, None).map_err(|_| {
        NetworkError::InconsistentPartition("condensation graph contains a cycle".to_string())
    })?;

    let mut leaves = vec![];
    let mut dependent = vec![];
    let mut pred_list = HashMap::new();
    let mut topo_index = vec![0; sccs.len()];
    for (position, node) in topo.iter().enumerate() {
        let block = condensation[*node];
        topo_index[block] = position;

        let preds: Vec<usize> = condensation
            .neighbors_directed(*node, Direction::Incoming)
            .map(|pred| condensation[pred])
            .collect();
        if preds.is_empty() {
            leaves.push(block);
        } else {
            dependent.push(block);
            pred_list.insert(block, preds);
        }
    }

    debug!(
        "partitioned {} variables into {} blocks ({} leaves)",
        variables.len(),
        sccs.len(),
        leaves.len()
    );

    Ok(Partition {
        sccs,
        leaves,
        dependent,
        pred_list,
        topo_index,
    })
}
