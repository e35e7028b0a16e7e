//! Integration tests for the rill front-end and optimizer.
//!
//! The front-end tests parse complete programs and walk the resulting AST,
//! checking the structural invariants the parser promises: every identifier
//! resolves, arithmetic and conditions are type-consistent, calls match
//! their signatures, and array literals are well-formed. The optimizer tests
//! build IR the way the lowering collaborator would and run the passes over
//! whole modules.

use hashbrown::HashMap;

use rill::frontend::{
    ast::{Expression, ExpressionKind, Program, SemanticType, Statement},
    parser::Parser,
    symbol::FunctionTable,
    SourceFile,
};
use rill::middle::{
    ir::{
        BinaryOperator, ConstantInt, Function, Instruction, Module, Predicate, Type, Value,
    },
    optimization::optimize_module,
};
use rill::SyntaxError;

fn parse_ok(source: &str) -> Program {
    let source = SourceFile::in_memory(source);
    Parser::parse_program(&source).expect("parse should succeed")
}

fn parse_err(source: &str) -> SyntaxError {
    let source = SourceFile::in_memory(source);
    Parser::parse_program(&source).expect_err("parse should fail")
}

/// Checks that every identifier in an expression resolves in the current
/// scope stack, that arithmetic operands share a scalar type, and that calls
/// match their declared signatures.
fn check_expression(
    expression: &Expression,
    scopes: &[HashMap<String, SemanticType>],
    signatures: &FunctionTable,
) {
    match &expression.kind {
        ExpressionKind::Literal(_) => {}
        ExpressionKind::Identifier(name) => {
            assert!(
                scopes.iter().rev().any(|frame| frame.contains_key(name)),
                "identifier {name} does not resolve at its point of use"
            );
        }
        ExpressionKind::Index { name, index } => {
            assert!(
                scopes.iter().rev().any(|frame| frame.contains_key(name)),
                "array {name} does not resolve at its point of use"
            );
            assert_eq!(index.ty, SemanticType::Int, "index expressions are int");
            check_expression(index, scopes, signatures);
        }
        ExpressionKind::Call { name, arguments } => {
            let signature = signatures
                .get(name)
                .unwrap_or_else(|| panic!("call target {name} is not declared"));
            assert_eq!(arguments.len(), signature.parameter_types.len());
            for (argument, parameter_type) in arguments.iter().zip(&signature.parameter_types) {
                assert_eq!(argument.ty, *parameter_type);
                check_expression(argument, scopes, signatures);
            }
        }
        ExpressionKind::Arith { lhs, rhs, .. } => {
            assert_eq!(lhs.ty, rhs.ty, "arith operands share a type");
            assert!(
                matches!(lhs.ty, SemanticType::Int | SemanticType::Float),
                "arith operands are scalar"
            );
            check_expression(lhs, scopes, signatures);
            check_expression(rhs, scopes, signatures);
        }
        ExpressionKind::Array { count, elements } => {
            if !elements.is_empty() {
                let declared: usize = count.text.parse().expect("literal array count");
                assert_eq!(elements.len(), declared);
            }
            for element in elements {
                check_expression(element, scopes, signatures);
            }
        }
    }
}

fn check_statements(
    statements: &[Statement],
    scopes: &mut Vec<HashMap<String, SemanticType>>,
    signatures: &FunctionTable,
) {
    for statement in statements {
        match statement {
            Statement::Assignment(assignment) => {
                check_expression(&assignment.target, scopes, signatures);
                if let Some(value) = &assignment.value {
                    check_expression(value, scopes, signatures);
                }
            }
            Statement::Return(value) => check_expression(value, scopes, signatures),
            Statement::Call(call) => check_expression(&call.call, scopes, signatures),
            Statement::If(if_statement) => {
                let condition = &if_statement.condition;
                assert_eq!(condition.lhs.ty, condition.rhs.ty);
                assert!(matches!(
                    condition.operand_type,
                    SemanticType::Int | SemanticType::Float
                ));
                check_expression(&condition.lhs, scopes, signatures);
                check_expression(&condition.rhs, scopes, signatures);

                scopes.push(if_statement.taken_locals.clone());
                check_statements(&if_statement.taken, scopes, signatures);
                scopes.pop();

                scopes.push(if_statement.not_taken_locals.clone());
                check_statements(&if_statement.not_taken, scopes, signatures);
                scopes.pop();
            }
            Statement::For(for_statement) => {
                scopes.push(for_statement.locals.clone());

                check_expression(&for_statement.init.target, scopes, signatures);
                if let Some(value) = &for_statement.init.value {
                    check_expression(value, scopes, signatures);
                }
                check_expression(&for_statement.condition.lhs, scopes, signatures);
                check_expression(&for_statement.condition.rhs, scopes, signatures);
                check_expression(&for_statement.step.target, scopes, signatures);
                if let Some(value) = &for_statement.step.value {
                    check_expression(value, scopes, signatures);
                }
                check_statements(&for_statement.body, scopes, signatures);

                scopes.pop();
            }
        }
    }
}

fn check_program_invariants(program: &Program) {
    for function in &program.functions {
        let mut scopes = vec![function.locals.clone()];
        check_statements(&function.body, &mut scopes, &program.signatures);
    }
}

// ============================================
// Front-end scenarios
// ============================================

#[test]
fn parses_a_function_with_arithmetic_and_calls() {
    let program = parse_ok(
        "int double(int x){ return x + x }\n\
         int quadruple(int x){ return double(double(x)) }\n\
         void main(){ printVarInt(quadruple(4)) }",
    );

    assert_eq!(program.functions.len(), 3);
    check_program_invariants(&program);
}

#[test]
fn parses_nested_control_flow() {
    let program = parse_ok(
        "int sum(int n){\n\
           int total = 0\n\
           for (int i = 0; i < n; i = i + 1) {\n\
             if (i < 10) {\n\
               total = total + i\n\
             } else {\n\
               total = total + 10\n\
             }\n\
           }\n\
           return total\n\
         }",
    );

    check_program_invariants(&program);
}

#[test]
fn parses_array_programs() {
    let program = parse_ok(
        "float average(){\n\
           array<float> xs[4] = {1.0, 2.0, 3.0, 4.0}\n\
           float total = 0.0\n\
           for (int i = 0; i < 4; i = i + 1) {\n\
             total = total + xs[i]\n\
           }\n\
           return total / 4.0\n\
         }",
    );

    check_program_invariants(&program);
}

#[test]
fn preallocation_and_element_stores() {
    let program = parse_ok(
        "void fill(){\n\
           array<int> xs[8] = {}\n\
           for (int i = 0; i < 8; i = i + 1) {\n\
             xs[i] = i * i\n\
           }\n\
           printVarInt(xs[3])\n\
         }",
    );

    check_program_invariants(&program);
}

#[test]
fn rejects_bad_array_sizes_and_initializers() {
    assert!(parse_err("int f(){ array<int> a[1] = {} return 0 }")
        .to_string()
        .contains("larger than 1"));
    assert!(parse_err("int f(){ array<int> a[3] = {1,2} return 0 }")
        .to_string()
        .contains("#initials == #elements"));
}

#[test]
fn rejects_semantic_errors_with_lines() {
    let redefinition = parse_err("int f(){\n int x = 1\n int x = 2\n return x\n}");
    assert_eq!(redefinition.line(), 3);

    let undefined = parse_err("int f(){ return missing }");
    assert!(matches!(undefined, SyntaxError::UndefinedVariable { .. }));

    let mismatch = parse_err("int f(){ int x = 2.5 return x }");
    assert!(matches!(mismatch, SyntaxError::TypeMismatch { .. }));
}

#[test]
fn parser_output_is_deterministic() {
    let source = "int f(int x){ return x + 1 }\n\
                  void g(){ printVarInt(f(1)) }";

    let first = parse_ok(source);
    let second = parse_ok(source);
    assert_eq!(first.functions, second.functions);
    assert_eq!(first.signatures, second.signatures);
}

// ============================================
// Optimizer scenarios
// ============================================

/// Builds the canonical lowering of `for (i = 0; i < bound; i += step)` with
/// a single store-through-induction-variable body.
fn counted_loop_module(bound: i64, step: i64) -> (Module, LoopHandles) {
    let mut function = Function::new("loop");
    let entry = function.add_block();
    let header = function.add_block();
    let latch = function.add_block();
    let exit = function.add_block();

    let slot = function.push_instruction(entry, Instruction::Alloca { ty: Type::I32 });
    function.push_instruction(
        entry,
        Instruction::Store {
            pointer: Value::Inst(slot),
            value: Value::const_int(32, 0),
        },
    );
    function.push_instruction(entry, Instruction::Jump { target: header });

    let current = function.push_instruction(
        header,
        Instruction::Load {
            pointer: Value::Inst(slot),
        },
    );
    let compare = function.push_instruction(
        header,
        Instruction::Compare {
            predicate: Predicate::Slt,
            lhs: Value::Inst(current),
            rhs: Value::const_int(32, bound),
        },
    );
    function.push_instruction(
        header,
        Instruction::Branch {
            condition: Value::Inst(compare),
            positive: latch,
            negative: exit,
        },
    );

    let value = function.push_instruction(
        latch,
        Instruction::Load {
            pointer: Value::Inst(slot),
        },
    );
    let stepped = function.push_instruction(
        latch,
        Instruction::Binary {
            operator: BinaryOperator::Add,
            lhs: Value::Inst(value),
            rhs: Value::const_int(32, step),
        },
    );
    function.push_instruction(
        latch,
        Instruction::Store {
            pointer: Value::Inst(slot),
            value: Value::Inst(stepped),
        },
    );
    function.push_instruction(latch, Instruction::Jump { target: header });

    function.push_instruction(exit, Instruction::Return { value: None });

    let handles = LoopHandles {
        latch,
        compare,
        stepped,
    };

    (
        Module {
            functions: vec![function],
        },
        handles,
    )
}

struct LoopHandles {
    latch: rill::middle::ir::BlockId,
    compare: rill::middle::ir::InstId,
    stepped: rill::middle::ir::InstId,
}

#[test]
fn unrolling_then_cleaning_a_counted_loop() {
    let (mut module, handles) = counted_loop_module(10, 1);

    optimize_module(&mut module, 2);
    let function = &module.functions[0];

    // Bound halved, step doubled
    assert!(matches!(
        function.instruction(handles.compare),
        Instruction::Compare {
            rhs: Value::Constant(ConstantInt { value: 5, .. }),
            ..
        }
    ));
    assert!(matches!(
        function.instruction(handles.stepped),
        Instruction::Binary {
            operator: BinaryOperator::Add,
            rhs: Value::Constant(ConstantInt { value: 2, .. }),
            ..
        }
    ));

    // Unrolling leaves load ; add ; store ; load' ; add' ; store' ; jmp.
    // The store invalidates the load cache, so the replica's load survives
    // the peephole pass, but its add reuses already-seen operands and is
    // folded away by the binop pass.
    let latch_instructions: Vec<&Instruction> = function
        .block(handles.latch)
        .instructions
        .iter()
        .map(|&id| function.instruction(id))
        .collect();

    assert_eq!(latch_instructions.len(), 6);
    assert!(matches!(latch_instructions[0], Instruction::Load { .. }));
    assert!(matches!(latch_instructions[1], Instruction::Binary { .. }));
    assert!(matches!(latch_instructions[2], Instruction::Store { .. }));
    assert!(matches!(latch_instructions[3], Instruction::Load { .. }));
    assert!(matches!(latch_instructions[4], Instruction::Store { .. }));
    assert!(latch_instructions[5].is_terminator());
}

#[test]
fn unroll_factor_zero_changes_nothing() {
    let (mut module, handles) = counted_loop_module(10, 1);
    let before = module.functions[0].block(handles.latch).instructions.len();

    for function in &mut module.functions {
        rill::middle::optimization::unroll::unroll_loops(function, 0);
    }

    let function = &module.functions[0];
    assert_eq!(function.block(handles.latch).instructions.len(), before);
    assert!(matches!(
        function.instruction(handles.compare),
        Instruction::Compare {
            rhs: Value::Constant(ConstantInt { value: 10, .. }),
            ..
        }
    ));
}

#[test]
fn redundant_loads_and_binops_are_cleaned_per_block() {
    let mut function = Function::new("f");
    let entry = function.add_block();

    let slot = function.push_instruction(entry, Instruction::Alloca { ty: Type::I32 });
    let first = function.push_instruction(
        entry,
        Instruction::Load {
            pointer: Value::Inst(slot),
        },
    );
    let second = function.push_instruction(
        entry,
        Instruction::Load {
            pointer: Value::Inst(slot),
        },
    );
    let sum = function.push_instruction(
        entry,
        Instruction::Binary {
            operator: BinaryOperator::Add,
            lhs: Value::Inst(first),
            rhs: Value::Inst(second),
        },
    );
    function.push_instruction(
        entry,
        Instruction::Return {
            value: Some(Value::Inst(sum)),
        },
    );

    let mut module = Module {
        functions: vec![function],
    };
    optimize_module(&mut module, 0);
    let function = &module.functions[0];

    // One load survives and the sum references it on both sides
    let instructions = &function.block(entry).instructions;
    assert!(instructions.contains(&first));
    assert!(!instructions.contains(&second));
    assert_eq!(
        *function.instruction(sum),
        Instruction::Binary {
            operator: BinaryOperator::Add,
            lhs: Value::Inst(first),
            rhs: Value::Inst(first),
        }
    );
}
