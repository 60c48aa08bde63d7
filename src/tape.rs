// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    adjoint::Adjoint,
    error::{Error, Result},
    scalar::Scalar,
};
use std::cell::RefCell;

/// Index of a node recorded on a tape.
///
/// The id carries the identity of the owning tape's arena, so an id presented
/// to the wrong tape is rejected instead of silently reading another node.
/// Note: Offset is non-zero to optimize `std::mem::size_of<Option<NodeId>>()`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    tape_id: u32,
    index: std::num::NonZeroU32,
}

/// Configuration for id_arena.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub(crate) struct TapeArenaBehavior;

impl id_arena::ArenaBehavior for TapeArenaBehavior {
    type Id = NodeId;

    #[inline]
    fn new_id(tape_id: u32, idx: usize) -> Self::Id {
        Self::Id {
            tape_id,
            index: std::num::NonZeroU32::new((idx + 1) as u32).expect("Too many nodes"),
        }
    }

    #[inline]
    fn index(id: Self::Id) -> usize {
        u32::from(id.index) as usize - 1
    }

    #[inline]
    fn arena_id(id: Self::Id) -> u32 {
        id.tape_id
    }
}

/// A recorded elementary operation: the running adjoint of its result and the
/// partial derivative of the result with respect to each tracked operand.
struct Node<N> {
    adjoint: N,
    dependencies: Vec<(NodeId, N)>,
}

/// Append-only record of the adjoint scalars created during one evaluation,
/// in creation order.
///
/// Creation order is a topological order of the computation DAG, because an
/// operand referenced by a new node must already have been recorded. Reverse
/// traversal therefore visits every node after all of its descendants and the
/// chain rule collapses to a single backward linear scan.
///
/// A tape is single-threaded. Multiple tapes may coexist (nested
/// differentiation relies on it), but a node belongs to exactly one tape for
/// its whole lifetime.
pub struct Tape<N> {
    nodes: RefCell<id_arena::Arena<Node<N>, TapeArenaBehavior>>,
}

impl<N: Scalar> Default for Tape<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Scalar> Tape<N> {
    /// Create a new, empty tape.
    pub fn new() -> Self {
        Tape {
            nodes: RefCell::new(id_arena::Arena::new()),
        }
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().len() == 0
    }

    /// Record a differential input and return the scalar tracking it.
    /// Inputs have an empty dependency list.
    pub fn lift(&self, value: N) -> Adjoint<'_, N> {
        let id = self.register(Vec::new());
        Adjoint::tracked(value, self, id)
    }

    /// Append a node with the given dependencies. O(1) amortized.
    pub(crate) fn register(&self, dependencies: Vec<(NodeId, N)>) -> NodeId {
        self.nodes.borrow_mut().alloc(Node {
            adjoint: N::zero(),
            dependencies,
        })
    }

    /// Overwrite the adjoint of one node. Drivers use this to select the
    /// output direction before backpropagating.
    pub fn seed(&self, id: NodeId, adjoint: N) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes
            .get_mut(id)
            .ok_or_else(|| Error::tape_mismatch(func_name!()))?;
        node.adjoint = adjoint;
        Ok(())
    }

    /// The adjoint currently accumulated for one node.
    pub fn adjoint(&self, id: NodeId) -> Result<N> {
        self.nodes
            .borrow()
            .get(id)
            .map(|node| node.adjoint.clone())
            .ok_or_else(|| Error::tape_mismatch(func_name!()))
    }

    /// Walk the record in reverse creation order, accumulating
    /// `parent.adjoint += partial * node.adjoint` for every dependency, in
    /// the order the dependencies were supplied.
    ///
    /// Arithmetic on the partials goes through `N`, so when `N` is itself an
    /// AD scalar this pass is transparently differentiated by the outer mode.
    pub fn backpropagate(&self) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let ids: Vec<NodeId> = nodes.iter().map(|(id, _)| id).collect();
        for id in ids.into_iter().rev() {
            let (adjoint, dependencies) = {
                let node = nodes
                    .get(id)
                    .ok_or_else(|| Error::tape_mismatch(func_name!()))?;
                (node.adjoint.clone(), node.dependencies.clone())
            };
            for (parent, partial) in dependencies {
                let contribution = partial * adjoint.clone();
                let node = nodes
                    .get_mut(parent)
                    .ok_or_else(|| Error::tape_mismatch(func_name!()))?;
                node.adjoint = node.adjoint.clone() + contribution;
            }
        }
        Ok(())
    }

    /// Zero every recorded adjoint. The record itself and the dependency
    /// structure are unchanged, so the tape can be seeded again.
    pub fn reset(&self) {
        for (_, node) in self.nodes.borrow_mut().iter_mut() {
            node.adjoint = N::zero();
        }
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{} @ {}", self.index, self.tape_id)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl<N: Scalar> std::fmt::Debug for Tape<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (id, node) in self.nodes.borrow().iter() {
            let parents: Vec<NodeId> = node.dependencies.iter().map(|(p, _)| *p).collect();
            write!(f, "{:?} <- {:?}; ", id, parents)?;
        }
        Ok(())
    }
}
