//! Constant-factor loop unrolling. The pass rewrites a counted loop's bound
//! and step constants and replicates its latch body, so that one iteration
//! of the rewritten loop performs `unroll_factor` iterations of the
//! original. It performs no legality analysis: callers must only hand it
//! canonical counted loops with a constant trip end and a constant step, and
//! trip counts that are exact multiples of the factor.

use colored::Colorize;

use crate::middle::{
    ir::{BinaryOperator, BlockId, Function, Instruction, Value},
    loops::{top_level_loops, Loop},
};

/// Unrolls every top-level loop of `function` by `unroll_factor`. A factor
/// of 0 is a no-op; a loop without a latch is diagnosed and skipped.
pub fn unroll_loops(function: &mut Function, unroll_factor: u32) {
    if unroll_factor == 0 {
        return;
    }

    for l in top_level_loops(function) {
        let Some(latch) = l.latch else {
            eprintln!(
                "{} {}: loop with header {} has no latch, skipping",
                "[Opt]".yellow(),
                function.name,
                l.header
            );
            continue;
        };

        adjust_loop_control(function, &l, latch, unroll_factor);
        clone_loop_body(function, latch, unroll_factor);
    }
}

/// Divides the exiting compare's constant operands by the factor and scales
/// the latch's step constant by it. A missing exiting block, compare, or
/// constant leaves the bound untouched; a latch without an add/sub with a
/// constant right operand leaves the step untouched.
fn adjust_loop_control(function: &mut Function, l: &Loop, latch: BlockId, factor: u32) {
    if let Some(exiting) = l.exiting {
        let instructions = function.block(exiting).instructions.clone();

        for id in instructions {
            if let Instruction::Compare { lhs, rhs, .. } = function.instruction_mut(id) {
                for operand in [lhs, rhs] {
                    if let Value::Constant(constant) = operand {
                        // Truncating division: `i < N` executed N/(s*u) times
                        constant.value /= factor as i64;
                    }
                }
                break;
            }
        }
    }

    // The step is the last add/sub with a constant right operand. The opcode
    // is kept, so `sub i, 1` becomes `sub i, u` and still steps downward.
    let instructions = function.block(latch).instructions.clone();
    for id in instructions.into_iter().rev() {
        if let Instruction::Binary {
            operator: BinaryOperator::Add | BinaryOperator::Sub,
            rhs: Value::Constant(step),
            ..
        } = function.instruction_mut(id)
        {
            step.value *= factor as i64;
            break;
        }
    }
}

/// Splices `factor - 1` replicas of the latch body prefix, up to and
/// including the first store, in front of the latch terminator. Replicas are
/// cloned from the already-rewritten instructions and share their operands
/// with the originals; nothing is remapped.
fn clone_loop_body(function: &mut Function, latch: BlockId, factor: u32) {
    for _ in 1..factor {
        let body = function.block(latch).instructions.clone();
        let mut scratch = Vec::new();

        for id in body {
            if function.instruction(id).is_terminator() {
                break;
            }

            let is_store = matches!(function.instruction(id), Instruction::Store { .. });
            scratch.push(function.clone_instruction(id));

            if is_store {
                break;
            }
        }

        for id in scratch {
            function.insert_before_terminator(latch, id);
        }
    }
}
