//! Block-local redundancy elimination: a load from a pointer that was
//! already loaded with no intervening store to it is replaced by the earlier
//! load, and a binary operation whose operands were both seen as operands of
//! an earlier binary operation in the block is replaced by that one. The
//! binop rule keys on the operand values alone, not the opcode; it is a
//! coarse heuristic, not a full common-subexpression elimination. Neither
//! pass looks across block boundaries or through aliases.

use hashbrown::HashMap;

use crate::middle::ir::{Function, InstId, Instruction, Value};

/// Runs both cleanups in pipeline order: loads first, then binary
/// operations.
pub fn remove_redundant_operations(function: &mut Function) {
    remove_redundant_loads(function);
    remove_redundant_binary_ops(function);
}

/// Erases loads whose pointer was already loaded in the same block with no
/// store to that exact pointer in between, rewriting uses to the surviving
/// load. Writes other than stores invalidate nothing.
pub fn remove_redundant_loads(function: &mut Function) {
    for block in function.block_ids() {
        let mut last_load: HashMap<Value, InstId> = HashMap::new();
        let mut index = 0;

        while index < function.block(block).instructions.len() {
            let id = function.block(block).instructions[index];

            match function.instruction(id).clone() {
                Instruction::Load { pointer } => {
                    if let Some(&previous) = last_load.get(&pointer) {
                        function.replace_all_uses_with(id, Value::Inst(previous));
                        function.erase_from_block(block, id);
                        continue;
                    }
                    last_load.insert(pointer, id);
                }
                Instruction::Store { pointer, .. } => {
                    last_load.remove(&pointer);
                }
                _ => {}
            }

            index += 1;
        }
    }
}

/// Erases binary operations whose operands have both already appeared as
/// operands of an earlier binary operation in the block, rewriting uses to
/// the operation recorded for the left operand. A store removes the stored
/// pointer from the tracking map.
pub fn remove_redundant_binary_ops(function: &mut Function) {
    for block in function.block_ids() {
        let mut last_binop: HashMap<Value, InstId> = HashMap::new();
        let mut index = 0;

        while index < function.block(block).instructions.len() {
            let id = function.block(block).instructions[index];

            match function.instruction(id).clone() {
                Instruction::Binary { lhs, rhs, .. } => {
                    if last_binop.contains_key(&lhs) && last_binop.contains_key(&rhs) {
                        let replacement = last_binop[&lhs];
                        function.replace_all_uses_with(id, Value::Inst(replacement));
                        function.erase_from_block(block, id);
                        continue;
                    }
                    last_binop.insert(lhs, id);
                    last_binop.insert(rhs, id);
                }
                Instruction::Store { pointer, .. } => {
                    last_binop.remove(&pointer);
                }
                _ => {}
            }

            index += 1;
        }
    }
}
