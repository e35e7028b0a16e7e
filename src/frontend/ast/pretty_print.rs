use colored::Colorize;
use itertools::Itertools;

use super::{
    ArithOperator, AssignStatement, CompareOperator, Condition, Expression, ExpressionKind,
    FunctionDefinition, Program, Statement,
};

pub fn pretty_print_program(program: &Program) {
    for function in &program.functions {
        pretty_print_function(function);
    }
}

pub fn pretty_print_function(function: &FunctionDefinition) {
    println!("{{");
    println!("  Function Name: {}", function.name.blue());
    println!("  Return Type: {}", function.return_type);

    println!("  Arguments");
    if function.parameters.is_empty() {
        println!("    NONE");
    }
    for parameter in &function.parameters {
        println!("    {} {}", parameter.ty, parameter.name);
    }

    println!("  Codes");
    println!("  {{");
    for statement in &function.body {
        print_statement(statement, 2);
    }
    println!("  }}");
    println!("}}");
}

fn print_statement(statement: &Statement, depth: usize) {
    let pad = "  ".repeat(depth);

    match statement {
        Statement::Assignment(assignment) => {
            println!("{pad}{} {}", "[Assign]".magenta(), format_assignment(assignment));
        }
        Statement::Return(value) => {
            println!("{pad}{} {value}", "[Return]".magenta());
        }
        Statement::Call(call) => {
            println!("{pad}{} {}", "[Call]".magenta(), call.call);
        }
        Statement::If(if_statement) => {
            println!("{pad}{}", "[If Statement]".magenta());
            println!("{pad}{} {}", "[Condition]".magenta(), if_statement.condition);

            println!("{pad}{}", "[Taken Block]".magenta());
            println!("{pad}{{");
            for nested in &if_statement.taken {
                print_statement(nested, depth + 1);
            }
            println!("{pad}}}");

            if !if_statement.not_taken.is_empty() {
                println!("{pad}{}", "[Not Taken Block]".magenta());
                println!("{pad}{{");
                for nested in &if_statement.not_taken {
                    print_statement(nested, depth + 1);
                }
                println!("{pad}}}");
            }
        }
        Statement::For(for_statement) => {
            println!("{pad}{}", "[For Statement]".magenta());
            println!(
                "{pad}{} {}",
                "[Start]".magenta(),
                format_assignment(&for_statement.init)
            );
            println!("{pad}{} {}", "[End]".magenta(), for_statement.condition);
            println!(
                "{pad}{} {}",
                "[Step]".magenta(),
                format_assignment(&for_statement.step)
            );

            println!("{pad}{}", "[Block]".magenta());
            println!("{pad}{{");
            for nested in &for_statement.body {
                print_statement(nested, depth + 1);
            }
            println!("{pad}}}");
        }
    }
}

fn format_assignment(assignment: &AssignStatement) -> String {
    match &assignment.value {
        Some(value) => format!("{} = {value}", assignment.target),
        None => format!("{} =", assignment.target),
    }
}

impl core::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExpressionKind::Literal(literal) => {
                if literal.is_placeholder() {
                    // A declaration without an initializer has nothing to show
                    Ok(())
                } else {
                    write!(f, "{}", literal.text)
                }
            }
            ExpressionKind::Identifier(name) => write!(f, "{name}"),
            ExpressionKind::Index { name, index } => write!(f, "{name}[{index}]"),
            ExpressionKind::Call { name, arguments } => {
                write!(
                    f,
                    "{name}({})",
                    arguments.iter().map(|a| a.to_string()).join(", ")
                )
            }
            ExpressionKind::Arith { operator, lhs, rhs } => {
                write!(f, "({lhs} {operator} {rhs})")
            }
            ExpressionKind::Array { count, elements } => {
                write!(
                    f,
                    "[{}] {{{}}}",
                    count.text,
                    elements.iter().map(|e| e.to_string()).join(", ")
                )
            }
        }
    }
}

impl core::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.lhs, self.operator, self.rhs)
    }
}

impl core::fmt::Display for ArithOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Subtract => write!(f, "-"),
            Self::Multiply => write!(f, "*"),
            Self::Divide => write!(f, "/"),
        }
    }
}

impl core::fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LessThan => write!(f, "<"),
            Self::GreaterThan => write!(f, ">"),
            Self::LessThanOrEqualTo => write!(f, "<="),
            Self::GreaterThanOrEqualTo => write!(f, ">="),
            Self::Equals => write!(f, "=="),
            Self::NotEquals => write!(f, "!="),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::{parser::Parser, SourceFile};

    #[test]
    fn expressions_render_infix() {
        let source = SourceFile::in_memory("int g(){ int a = 2 + 3 * 4; return a; }");
        let program = Parser::parse_program(&source).unwrap();

        let crate::frontend::ast::Statement::Assignment(assignment) =
            &program.functions[0].body[0]
        else {
            panic!("expected an assignment");
        };
        assert_eq!(
            assignment.value.as_ref().unwrap().to_string(),
            "(2 + (3 * 4))"
        );
    }

    #[test]
    fn placeholders_render_empty() {
        let source = SourceFile::in_memory("int g(){ int a; return 0; }");
        let program = Parser::parse_program(&source).unwrap();

        let crate::frontend::ast::Statement::Assignment(assignment) =
            &program.functions[0].body[0]
        else {
            panic!("expected an assignment");
        };
        assert_eq!(assignment.value.as_ref().unwrap().to_string(), "");
    }
}
