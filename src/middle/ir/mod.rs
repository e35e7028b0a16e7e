//! IR (Intermediate Representation). A module owns functions; a function
//! owns an ordered list of basic blocks, each an ordered list of
//! instructions ending in a terminator. Instructions live in a per-function
//! arena and are referenced by id, so optimization passes can clone, erase,
//! and rewrite them in place while blocks only reorder ids.

pub mod pretty_print;

#[derive(Debug, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}

#[derive(Debug)]
pub struct Function {
    pub name: String,
    blocks: Vec<Block>,
    /// Instruction arena indexed by `InstId`. Erasing an instruction removes
    /// it from its block; the arena slot is simply left behind.
    instructions: Vec<Instruction>,
}

#[derive(Debug, Default)]
pub struct Block {
    pub instructions: Vec<InstId>,
}

/// Identifies a basic block within its function
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

/// Identifies an instruction within its function's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca {
        ty: Type,
    },
    Load {
        pointer: Value,
    },
    Store {
        pointer: Value,
        value: Value,
    },
    Binary {
        operator: BinaryOperator,
        lhs: Value,
        rhs: Value,
    },
    Compare {
        predicate: Predicate,
        lhs: Value,
        rhs: Value,
    },
    Jump {
        target: BlockId,
    },
    Branch {
        condition: Value,
        positive: BlockId,
        negative: BlockId,
    },
    Return {
        value: Option<Value>,
    },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Jump { .. } | Self::Branch { .. } | Self::Return { .. }
        )
    }

    /// Whether the instruction produces an SSA value other instructions can
    /// reference.
    pub fn has_result(&self) -> bool {
        matches!(
            self,
            Self::Alloca { .. } | Self::Load { .. } | Self::Binary { .. } | Self::Compare { .. }
        )
    }

    /// Visits every value operand mutably.
    pub fn for_each_operand_mut(&mut self, mut visit: impl FnMut(&mut Value)) {
        match self {
            Self::Alloca { .. } | Self::Jump { .. } => {}
            Self::Load { pointer } => visit(pointer),
            Self::Store { pointer, value } => {
                visit(pointer);
                visit(value);
            }
            Self::Binary { lhs, rhs, .. } | Self::Compare { lhs, rhs, .. } => {
                visit(lhs);
                visit(rhs);
            }
            Self::Branch { condition, .. } => visit(condition),
            Self::Return { value } => {
                if let Some(value) = value {
                    visit(value);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Slt, // signed <
    Sgt, // signed >
    Sle, // signed <=
    Sge, // signed >=
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    I32,
    F32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Constant(ConstantInt),
    /// Result of an earlier instruction
    Inst(InstId),
    /// Function argument by position
    Argument(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstantInt {
    pub bits: u8,
    pub value: i64,
}

impl ConstantInt {
    pub fn new(bits: u8, value: i64) -> Self {
        Self { bits, value }
    }
}

impl Value {
    pub fn const_int(bits: u8, value: i64) -> Self {
        Self::Constant(ConstantInt::new(bits, value))
    }

    pub fn as_constant(&self) -> Option<ConstantInt> {
        match self {
            Self::Constant(constant) => Some(*constant),
            _ => None,
        }
    }
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn add_block(&mut self) -> BlockId {
        self.blocks.push(Block::default());
        BlockId(self.blocks.len() as u32 - 1)
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0 as usize]
    }

    pub fn instruction(&self, id: InstId) -> &Instruction {
        &self.instructions[id.0 as usize]
    }

    pub fn instruction_mut(&mut self, id: InstId) -> &mut Instruction {
        &mut self.instructions[id.0 as usize]
    }

    /// Appends an instruction to the end of a block, returning its id.
    pub fn push_instruction(&mut self, block: BlockId, instruction: Instruction) -> InstId {
        let id = self.new_instruction(instruction);
        self.block_mut(block).instructions.push(id);
        id
    }

    /// Allocates an instruction in the arena without placing it in a block.
    pub fn new_instruction(&mut self, instruction: Instruction) -> InstId {
        self.instructions.push(instruction);
        InstId(self.instructions.len() as u32 - 1)
    }

    /// Clones an instruction into a fresh arena slot. Operands are shared
    /// with the original; no remapping is performed.
    pub fn clone_instruction(&mut self, id: InstId) -> InstId {
        let clone = self.instruction(id).clone();
        self.new_instruction(clone)
    }

    /// The block's terminator, if its last instruction is one.
    pub fn terminator(&self, block: BlockId) -> Option<&Instruction> {
        let id = self.block(block).instructions.last()?;
        let last = self.instruction(*id);
        last.is_terminator().then_some(last)
    }

    /// Inserts an already-allocated instruction in front of the block's
    /// terminator (or at the end if the block has none yet).
    pub fn insert_before_terminator(&mut self, block: BlockId, id: InstId) {
        let has_terminator = self.terminator(block).is_some();
        let instructions = &mut self.block_mut(block).instructions;

        if has_terminator {
            let at = instructions.len() - 1;
            instructions.insert(at, id);
        } else {
            instructions.push(id);
        }
    }

    /// Removes an instruction from a block. The arena slot stays allocated
    /// but is no longer reachable through the block.
    pub fn erase_from_block(&mut self, block: BlockId, id: InstId) {
        self.block_mut(block).instructions.retain(|other| *other != id);
    }

    /// Replaces every use of `old`'s result with `replacement` across the
    /// whole function.
    pub fn replace_all_uses_with(&mut self, old: InstId, replacement: Value) {
        for instruction in &mut self.instructions {
            instruction.for_each_operand_mut(|operand| {
                if *operand == Value::Inst(old) {
                    *operand = replacement;
                }
            });
        }
    }

    /// Successor blocks named by the block's terminator.
    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        match self.terminator(block) {
            Some(Instruction::Jump { target }) => vec![*target],
            Some(Instruction::Branch {
                positive, negative, ..
            }) => vec![*positive, *negative],
            _ => Vec::new(),
        }
    }
}
