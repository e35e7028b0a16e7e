pub mod peephole;
pub mod unroll;

use crate::middle::ir::Module;

/// Runs the full pass pipeline over every function: loop unrolling first,
/// then the local redundancy cleanups.
pub fn optimize_module(module: &mut Module, unroll_factor: u32) {
    for function in &mut module.functions {
        unroll::unroll_loops(function, unroll_factor);
        peephole::remove_redundant_operations(function);
    }
}
