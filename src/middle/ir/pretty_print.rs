use colored::Colorize;

use crate::middle::ir::{
    BinaryOperator, BlockId, ConstantInt, Function, Instruction, Predicate, Type, Value,
};

pub fn pretty_print_function(function: &Function) {
    println!("{} {}() {{", "fn".magenta(), function.name.blue());

    for block in function.block_ids() {
        println!("{}", format!("{block}:").bright_red());

        for &id in &function.block(block).instructions {
            let instruction = function.instruction(id);

            if instruction.has_result() {
                println!("    {} = {instruction}", format!("%{}", id.0).yellow());
            } else {
                println!("    {instruction}");
            }
        }
    }

    println!("}}");
}

impl core::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Alloca { ty } => write!(f, "{} {ty}", "alloca".cyan()),
            Instruction::Load { pointer } => write!(f, "{} {pointer}", "load".cyan()),
            Instruction::Store { pointer, value } => {
                write!(f, "{} {value}, {pointer}", "store".cyan())
            }
            Instruction::Binary { operator, lhs, rhs } => {
                write!(f, "{} {lhs}, {rhs}", operator.to_string().cyan())
            }
            Instruction::Compare {
                predicate,
                lhs,
                rhs,
            } => {
                write!(f, "{} {predicate} {lhs}, {rhs}", "cmp".cyan())
            }
            Instruction::Jump { target } => {
                write!(f, "{} {}", "jmp".cyan(), target.to_string().blue())
            }
            Instruction::Branch {
                condition,
                positive,
                negative,
            } => {
                write!(
                    f,
                    "{} {condition} {} {}",
                    "br".cyan(),
                    positive.to_string().blue(),
                    negative.to_string().blue()
                )
            }
            Instruction::Return { value: Some(value) } => write!(f, "{} {value}", "ret".cyan()),
            Instruction::Return { value: _ } => write!(f, "{}", "ret".cyan()),
        }
    }
}

impl core::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".label_{}", self.0)
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Constant(constant) => write!(f, "{}", constant.to_string().purple()),
            Value::Inst(id) => write!(f, "{}", format!("%{}", id.0).yellow()),
            Value::Argument(index) => write!(f, "{}", format!("arg{index}").yellow()),
        }
    }
}

impl core::fmt::Display for ConstantInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl core::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Sub => write!(f, "sub"),
            Self::Mul => write!(f, "mul"),
            Self::Div => write!(f, "div"),
        }
    }
}

impl core::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slt => write!(f, "slt"),
            Self::Sgt => write!(f, "sgt"),
            Self::Sle => write!(f, "sle"),
            Self::Sge => write!(f, "sge"),
            Self::Eq => write!(f, "eq"),
            Self::Ne => write!(f, "ne"),
        }
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::I32 => write!(f, "i32"),
            Self::F32 => write!(f, "f32"),
        }
    }
}
