//! Natural-loop detection over the IR control-flow graph. Produces the
//! top-level loops of a function, each exposing its header, its latch (the
//! single back-edge block), and its exiting block (the single block whose
//! branch can leave the loop). Loops with more than one latch or exit leave
//! the corresponding field unset and are skipped by passes that need it.

use hashbrown::{HashMap, HashSet};

use crate::middle::ir::{BlockId, Function};

#[derive(Debug)]
pub struct Loop {
    pub header: BlockId,
    /// The block with the back edge to the header, when there is exactly one
    pub latch: Option<BlockId>,
    /// The block with the loop-exit branch, when there is exactly one
    pub exiting: Option<BlockId>,
    /// All blocks of the natural loop, header included
    pub blocks: HashSet<BlockId>,
}

impl Loop {
    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }
}

/// Finds the top-level loops of a function. Nested loops are not returned.
pub fn top_level_loops(function: &Function) -> Vec<Loop> {
    let Some(entry) = function.block_ids().next() else {
        return Vec::new();
    };

    let mut predecessors: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
    for block in function.block_ids() {
        for successor in function.successors(block) {
            predecessors.entry(successor).or_default().push(block);
        }
    }

    // Depth-first search from the entry; an edge into a block still on the
    // visit stack is a back edge and identifies a loop header.
    let mut back_edges: Vec<(BlockId, BlockId)> = Vec::new();
    let mut visited: HashSet<BlockId> = HashSet::from([entry]);
    let mut on_stack: HashSet<BlockId> = HashSet::from([entry]);
    let mut stack = vec![(entry, 0usize)];

    while let Some((block, successor_index)) = stack.last_mut() {
        let block = *block;
        let successors = function.successors(block);

        if *successor_index < successors.len() {
            let next = successors[*successor_index];
            *successor_index += 1;

            if on_stack.contains(&next) {
                back_edges.push((block, next));
            } else if visited.insert(next) {
                on_stack.insert(next);
                stack.push((next, 0));
            }
        } else {
            on_stack.remove(&block);
            stack.pop();
        }
    }

    // Group back edges by header, preserving discovery order
    let mut headers: Vec<(BlockId, Vec<BlockId>)> = Vec::new();
    for (latch, header) in back_edges {
        match headers.iter_mut().find(|(h, _)| *h == header) {
            Some((_, latches)) => latches.push(latch),
            None => headers.push((header, vec![latch])),
        }
    }

    let mut loops: Vec<Loop> = headers
        .into_iter()
        .map(|(header, latches)| {
            // The natural loop body is every block that reaches a latch
            // without passing through the header
            let mut blocks = HashSet::from([header]);
            let mut worklist = Vec::new();
            for &latch in &latches {
                if blocks.insert(latch) {
                    worklist.push(latch);
                }
            }
            while let Some(block) = worklist.pop() {
                for &predecessor in predecessors.get(&block).map(Vec::as_slice).unwrap_or(&[]) {
                    if blocks.insert(predecessor) {
                        worklist.push(predecessor);
                    }
                }
            }

            let exits: Vec<BlockId> = blocks
                .iter()
                .copied()
                .filter(|&block| {
                    function
                        .successors(block)
                        .iter()
                        .any(|successor| !blocks.contains(successor))
                })
                .collect();

            Loop {
                header,
                latch: match latches.as_slice() {
                    [latch] => Some(*latch),
                    _ => None,
                },
                exiting: match exits.as_slice() {
                    [exit] => Some(*exit),
                    _ => None,
                },
                blocks,
            }
        })
        .collect();

    // Drop loops nested inside another loop's body
    let nested: Vec<BlockId> = loops
        .iter()
        .filter(|candidate| {
            loops
                .iter()
                .any(|outer| outer.header != candidate.header && outer.contains(candidate.header))
        })
        .map(|l| l.header)
        .collect();
    loops.retain(|l| !nested.contains(&l.header));

    loops
}
