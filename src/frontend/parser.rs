use hashbrown::HashMap;

use crate::frontend::{
    ast::{
        ArithOperator, AssignStatement, CallKind, CallStatement, CompareOperator, Condition,
        Expression, ExpressionKind, ForStatement, FunctionDefinition, IfStatement, Literal,
        LiteralKind, Parameter, Program, SemanticType, Statement,
    },
    error::{Result, SyntaxError},
    lexer::{Keyword, Lexer, Token, TokenKind},
    symbol::{FunctionSignature, FunctionTable, ScopeStack},
    SourceFile,
};

#[derive(Debug)]
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    scopes: ScopeStack,
    functions: FunctionTable,
    /// Expected-type context for the expression currently being parsed.
    /// `None` means unconstrained; the first strictly-checked sub-expression
    /// pins the context to its type.
    expected: Option<SemanticType>,
}

impl<'source> Parser<'source> {
    pub fn parse_program(source: &'source SourceFile) -> Result<Program> {
        let mut parser = Self {
            lexer: Lexer::new(source),
            scopes: ScopeStack::new(),
            functions: FunctionTable::with_builtins(),
            expected: None,
        };

        let mut functions = Vec::new();
        while parser.lexer.peek()?.kind != TokenKind::Eof {
            functions.push(parser.parse_function_definition()?);
        }

        Ok(Program {
            functions,
            signatures: parser.functions,
        })
    }

    fn token_text(&self, token: Token) -> String {
        self.lexer.source().value_of_span(token.span).to_owned()
    }

    fn unexpected(&self, token: Token, expecting: &str) -> SyntaxError {
        if token.kind == TokenKind::Eof {
            SyntaxError::UnexpectedEof {
                expected: expecting.to_owned(),
                line: token.line,
            }
        } else {
            SyntaxError::UnexpectedToken {
                expected: expecting.to_owned(),
                found: format!("{:?} (`{}`)", token.kind, self.token_text(token)),
                line: token.line,
            }
        }
    }

    fn expect_token(&mut self, kind: TokenKind) -> Result<Token> {
        let token = self.lexer.next()?;

        if token.kind != kind {
            return Err(self.unexpected(token, &format!("{kind:?}")));
        }

        Ok(token)
    }

    fn peek_kind(&mut self) -> Result<TokenKind> {
        Ok(self.lexer.peek()?.kind)
    }

    /// Consumes the next token if it is of the given kind.
    fn eat(&mut self, kind: TokenKind) -> Result<bool> {
        if self.peek_kind()? == kind {
            self.lexer.next()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Checks a just-parsed literal, identifier use, index result, or call
    /// result against the current expected-type context. An unconstrained
    /// context is pinned to the found type instead.
    fn strict_type_check(&mut self, found: SemanticType, line: usize) -> Result<()> {
        match self.expected {
            None => {
                self.expected = Some(found);
                Ok(())
            }
            Some(expected) if expected == found => Ok(()),
            Some(expected) => Err(SyntaxError::TypeMismatch {
                expected,
                found,
                line,
            }),
        }
    }

    /// type ident '(' [ param { ',' param } ] ')' '{' { stmt } '}'
    fn parse_function_definition(&mut self) -> Result<FunctionDefinition> {
        let type_token = self.lexer.next()?;
        let return_type = match type_token.kind {
            TokenKind::Keyword(Keyword::Int) => SemanticType::Int,
            TokenKind::Keyword(Keyword::Float) => SemanticType::Float,
            TokenKind::Keyword(Keyword::Void) => SemanticType::Void,
            _ => {
                return Err(SyntaxError::UnsupportedReturnType {
                    line: type_token.line,
                })
            }
        };

        let name_token = self.lexer.next()?;
        if name_token.kind != TokenKind::Identifier {
            return Err(SyntaxError::MalformedFunction {
                line: name_token.line,
            });
        }
        let name = self.token_text(name_token);

        if self.peek_kind()? != TokenKind::OpenParen {
            return Err(SyntaxError::MalformedFunction {
                line: name_token.line,
            });
        }
        self.lexer.next()?;

        self.scopes.push_frame();

        let mut parameters = Vec::new();
        if self.peek_kind()? != TokenKind::CloseParen {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect_token(TokenKind::CloseParen)?;

        // Record the signature before the body is parsed so self-recursive
        // calls resolve
        if self.functions.contains(&name) {
            return Err(SyntaxError::Redefinition {
                name,
                line: name_token.line,
            });
        }
        self.functions.insert(
            name.clone(),
            FunctionSignature {
                return_type,
                parameter_types: parameters.iter().map(|p| p.ty).collect(),
                is_built_in: false,
            },
        );

        self.expect_token(TokenKind::OpenBrace)?;
        let body = self.parse_block_statements(return_type)?;
        self.expect_token(TokenKind::CloseBrace)?;

        let locals = self.scopes.pop_frame();

        Ok(FunctionDefinition {
            return_type,
            name,
            parameters,
            body,
            locals,
        })
    }

    /// type ident
    fn parse_parameter(&mut self) -> Result<Parameter> {
        let type_token = self.lexer.next()?;
        let ty = match type_token.kind {
            TokenKind::Keyword(Keyword::Int) => SemanticType::Int,
            TokenKind::Keyword(Keyword::Float) => SemanticType::Float,
            _ => return Err(self.unexpected(type_token, "parameter type")),
        };

        let name_token = self.expect_token(TokenKind::Identifier)?;
        let name = self.token_text(name_token);

        if self.scopes.lookup(&name).is_some() {
            return Err(SyntaxError::Redefinition {
                name,
                line: name_token.line,
            });
        }
        self.scopes.insert(name.clone(), ty);

        Ok(Parameter { name, ty })
    }

    /// Statements until the closing brace of the enclosing block. A statement
    /// may carry an optional trailing semicolon; otherwise the next
    /// statement's first token (or the closing brace) terminates it.
    fn parse_block_statements(&mut self, return_type: SemanticType) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();

        while self.peek_kind()? != TokenKind::CloseBrace {
            statements.push(self.parse_statement(return_type)?);
            self.eat(TokenKind::Semicolon)?;
        }

        Ok(statements)
    }

    fn parse_statement(&mut self, return_type: SemanticType) -> Result<Statement> {
        self.expected = None;

        let peeked = self.lexer.peek()?;
        match peeked.kind {
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(return_type),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(return_type),
            TokenKind::Keyword(Keyword::Return) => {
                self.lexer.next()?;
                self.expected = Some(return_type);
                let value = self.parse_expression()?;
                Ok(Statement::Return(value))
            }
            TokenKind::Identifier if self.functions.contains(&self.token_text(peeked)) => {
                let name_token = self.lexer.next()?;
                let name = self.token_text(name_token);
                let signature = self
                    .functions
                    .get(&name)
                    .cloned()
                    .expect("signature was just looked up");

                let kind = if signature.is_built_in {
                    CallKind::BuiltIn
                } else {
                    CallKind::Normal
                };
                let call = self.parse_call(name, signature, name_token.line)?;

                Ok(Statement::Call(CallStatement { call, kind }))
            }
            kind if kind.is_type_keyword() || kind == TokenKind::Identifier => {
                Ok(Statement::Assignment(self.parse_assignment_statement()?))
            }
            _ => Err(self.unexpected(peeked, "statement")),
        }
    }

    /// type ident ( '=' expr | '[' int-lit ']' '=' array-lit | ε )
    /// | ident [ '[' expr ']' ] '=' expr
    fn parse_assignment_statement(&mut self) -> Result<AssignStatement> {
        if self.peek_kind()?.is_type_keyword() {
            self.parse_declaration()
        } else {
            self.parse_reassignment()
        }
    }

    fn parse_declaration(&mut self) -> Result<AssignStatement> {
        let type_token = self.lexer.next()?;

        let (scalar, declared_array) = match type_token.kind {
            TokenKind::Keyword(Keyword::Int) => (SemanticType::Int, false),
            TokenKind::Keyword(Keyword::Float) => (SemanticType::Float, false),
            TokenKind::Keyword(Keyword::Array) => {
                self.expect_token(TokenKind::LessThan)?;
                let element_token = self.lexer.next()?;
                let element = match element_token.kind {
                    TokenKind::Keyword(Keyword::Int) => SemanticType::Int,
                    TokenKind::Keyword(Keyword::Float) => SemanticType::Float,
                    _ => return Err(self.unexpected(element_token, "array element type")),
                };
                self.expect_token(TokenKind::GreaterThan)?;
                (element, true)
            }
            TokenKind::Keyword(Keyword::Void) => {
                let name_token = self.expect_token(TokenKind::Identifier)?;
                return Err(SyntaxError::VoidVariable {
                    name: self.token_text(name_token),
                    line: name_token.line,
                });
            }
            _ => return Err(self.unexpected(type_token, "type keyword")),
        };

        let name_token = self.expect_token(TokenKind::Identifier)?;
        let name = self.token_text(name_token);

        if self.scopes.lookup(&name).is_some() {
            return Err(SyntaxError::Redefinition {
                name,
                line: name_token.line,
            });
        }

        let is_array = declared_array || self.peek_kind()? == TokenKind::OpenBracket;
        if declared_array && self.peek_kind()? != TokenKind::OpenBracket {
            let peeked = self.lexer.peek()?;
            return Err(self.unexpected(peeked, "array dimension"));
        }

        let declared = if is_array {
            match scalar {
                SemanticType::Int => SemanticType::IntArray,
                _ => SemanticType::FloatArray,
            }
        } else {
            scalar
        };

        // Record the name before the initializer is parsed, so both a
        // redeclaration and a self-referencing initializer fail
        self.scopes.insert(name.clone(), declared);

        let value = if is_array {
            Some(self.parse_array_literal(scalar)?)
        } else if self.eat(TokenKind::Equals)? {
            self.expected = Some(scalar);
            Some(self.parse_expression()?)
        } else {
            // Type-only placeholder: the declaration reserves the name
            // without specifying a value
            let kind = match scalar {
                SemanticType::Int => LiteralKind::Integer,
                _ => LiteralKind::Float,
            };
            Some(Expression {
                ty: scalar,
                kind: ExpressionKind::Literal(Literal::placeholder(kind)),
            })
        };

        Ok(AssignStatement {
            target: Expression {
                ty: declared,
                kind: ExpressionKind::Identifier(name),
            },
            value,
        })
    }

    fn parse_reassignment(&mut self) -> Result<AssignStatement> {
        let name_token = self.expect_token(TokenKind::Identifier)?;
        let name = self.token_text(name_token);

        let Some(declared) = self.scopes.lookup(&name) else {
            return Err(SyntaxError::UndefinedVariable {
                name,
                line: name_token.line,
            });
        };

        let (target, value_type) = if self.peek_kind()? == TokenKind::OpenBracket {
            let element = declared.element_type().ok_or(SyntaxError::NotAnArray {
                name: name.clone(),
                line: name_token.line,
            })?;
            let index = self.parse_index_expression()?;

            (
                Expression {
                    ty: element,
                    kind: ExpressionKind::Index {
                        name,
                        index: Box::new(index),
                    },
                },
                element,
            )
        } else {
            // Assigning through an array name targets its elements
            let value_type = declared.element_type().unwrap_or(declared);

            (
                Expression {
                    ty: declared,
                    kind: ExpressionKind::Identifier(name),
                },
                value_type,
            )
        };

        self.expect_token(TokenKind::Equals)?;
        self.expected = Some(value_type);
        let value = self.parse_expression()?;

        Ok(AssignStatement {
            target,
            value: Some(value),
        })
    }

    /// '[' int-lit ']' '=' '{' [ expr { ',' expr } ] '}'
    ///
    /// The element count must be an integer literal larger than 1; a
    /// non-empty brace list must supply exactly that many elements, while an
    /// empty list pre-allocates without initializing.
    fn parse_array_literal(&mut self, element_type: SemanticType) -> Result<Expression> {
        let open_bracket = self.expect_token(TokenKind::OpenBracket)?;
        let line = open_bracket.line;

        let saved = self.expected.replace(SemanticType::Int);
        let count_expression = self.parse_expression()?;
        self.expected = saved;

        let ExpressionKind::Literal(count) = count_expression.kind else {
            return Err(SyntaxError::ArrayLengthNotLiteral { line });
        };
        if count.kind != LiteralKind::Integer {
            return Err(SyntaxError::ArrayLengthNotLiteral { line });
        }
        let declared_count = count
            .text
            .parse::<i64>()
            .map_err(|_| SyntaxError::ArrayLengthNotLiteral { line })?;
        if declared_count <= 1 {
            return Err(SyntaxError::ArrayLengthTooSmall { line });
        }

        self.expect_token(TokenKind::CloseBracket)?;
        self.expect_token(TokenKind::Equals)?;
        self.expect_token(TokenKind::OpenBrace)?;

        let mut elements = Vec::new();
        if self.peek_kind()? != TokenKind::CloseBrace {
            loop {
                let saved = self.expected.replace(element_type);
                elements.push(self.parse_expression()?);
                self.expected = saved;

                if !self.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        let close_brace = self.expect_token(TokenKind::CloseBrace)?;

        if !elements.is_empty() && elements.len() as i64 != declared_count {
            return Err(SyntaxError::ArrayInitializerMismatch {
                expected: declared_count as usize,
                found: elements.len(),
                line: close_brace.line,
            });
        }

        let ty = match element_type {
            SemanticType::Int => SemanticType::IntArray,
            _ => SemanticType::FloatArray,
        };

        Ok(Expression {
            ty,
            kind: ExpressionKind::Array { count, elements },
        })
    }

    /// '[' expr ']' with the expected-type context forced to int for the
    /// index expression.
    fn parse_index_expression(&mut self) -> Result<Expression> {
        self.expect_token(TokenKind::OpenBracket)?;

        let saved = self.expected.replace(SemanticType::Int);
        let index = self.parse_expression()?;
        self.expected = saved;

        self.expect_token(TokenKind::CloseBracket)?;

        Ok(index)
    }

    /// 'if' '(' cond ')' '{' { stmt } '}' [ 'else' '{' { stmt } '}' ]
    fn parse_if_statement(&mut self, return_type: SemanticType) -> Result<Statement> {
        self.expect_token(TokenKind::Keyword(Keyword::If))?;
        self.expect_token(TokenKind::OpenParen)?;
        let condition = self.parse_condition()?;
        self.expect_token(TokenKind::CloseParen)?;

        self.expect_token(TokenKind::OpenBrace)?;
        self.scopes.push_frame();
        let taken = self.parse_block_statements(return_type)?;
        self.expect_token(TokenKind::CloseBrace)?;
        let taken_locals = self.scopes.pop_frame();

        let mut not_taken = Vec::new();
        let mut not_taken_locals = HashMap::new();
        if self.eat(TokenKind::Keyword(Keyword::Else))? {
            self.expect_token(TokenKind::OpenBrace)?;
            self.scopes.push_frame();
            not_taken = self.parse_block_statements(return_type)?;
            self.expect_token(TokenKind::CloseBrace)?;
            not_taken_locals = self.scopes.pop_frame();
        }

        Ok(Statement::If(IfStatement {
            condition,
            taken,
            not_taken,
            taken_locals,
            not_taken_locals,
        }))
    }

    /// 'for' '(' assn ';' cond ';' assn ')' '{' { stmt } '}'
    ///
    /// The init, condition, step, and body all share one scope frame, so a
    /// variable declared in the init clause is visible throughout.
    fn parse_for_statement(&mut self, return_type: SemanticType) -> Result<Statement> {
        self.expect_token(TokenKind::Keyword(Keyword::For))?;
        self.expect_token(TokenKind::OpenParen)?;
        self.scopes.push_frame();

        let init = self.parse_assignment_statement()?;
        self.expect_token(TokenKind::Semicolon)?;

        // The init clause's type context carries into the condition
        let condition = self.parse_condition()?;
        self.expect_token(TokenKind::Semicolon)?;

        let step = self.parse_assignment_statement()?;
        self.expect_token(TokenKind::CloseParen)?;

        self.expect_token(TokenKind::OpenBrace)?;
        let body = self.parse_block_statements(return_type)?;
        self.expect_token(TokenKind::CloseBrace)?;

        let locals = self.scopes.pop_frame();

        Ok(Statement::For(ForStatement {
            init,
            condition,
            step,
            body,
            locals,
        }))
    }

    /// expr relop expr
    fn parse_condition(&mut self) -> Result<Condition> {
        let lhs = self.parse_expression()?;

        let operator_token = self.lexer.next()?;
        let operator = match operator_token.kind {
            TokenKind::LessThan => CompareOperator::LessThan,
            TokenKind::GreaterThan => CompareOperator::GreaterThan,
            TokenKind::LessThanOrEqualTo => CompareOperator::LessThanOrEqualTo,
            TokenKind::GreaterThanOrEqualTo => CompareOperator::GreaterThanOrEqualTo,
            TokenKind::DoubleEquals => CompareOperator::Equals,
            TokenKind::NotEquals => CompareOperator::NotEquals,
            _ => return Err(self.unexpected(operator_token, "comparison operator")),
        };

        let rhs = self.parse_expression()?;

        if lhs.ty != rhs.ty {
            return Err(SyntaxError::TypeMismatch {
                expected: lhs.ty,
                found: rhs.ty,
                line: operator_token.line,
            });
        }
        if !lhs.ty.is_scalar() {
            return Err(SyntaxError::InvalidConditionOperand {
                found: lhs.ty,
                line: operator_token.line,
            });
        }

        let operand_type = lhs.ty;

        Ok(Condition {
            lhs,
            rhs,
            operator,
            operand_type,
        })
    }

    /// expr := term { ('+'|'-') term }
    ///
    /// The right-hand side needs care so that `a + b * c` binds the product
    /// tighter than the sum: after reading the first factor of the right
    /// side, parsing continues at term level whenever a `*` or `/` follows.
    fn parse_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_term(None)?;

        while self.peek_kind()?.is_term_operator() {
            let operator_token = self.lexer.next()?;
            let operator = if operator_token.kind == TokenKind::Plus {
                ArithOperator::Add
            } else {
                ArithOperator::Subtract
            };

            let right = if self.peek_kind()? == TokenKind::OpenParen {
                self.parse_term(None)?
            } else {
                let pending = self.parse_factor()?;
                if self.peek_kind()?.is_factor_operator() {
                    self.parse_term(Some(pending))?
                } else {
                    pending
                }
            };

            left = self.new_arith(operator, left, right, operator_token.line)?;
        }

        Ok(left)
    }

    /// term := factor { ('*'|'/') factor }
    fn parse_term(&mut self, pending_left: Option<Expression>) -> Result<Expression> {
        let mut left = match pending_left {
            Some(expression) => expression,
            None => self.parse_factor()?,
        };

        while self.peek_kind()?.is_factor_operator() {
            let operator_token = self.lexer.next()?;
            let operator = if operator_token.kind == TokenKind::Asterisk {
                ArithOperator::Multiply
            } else {
                ArithOperator::Divide
            };

            let right = self.parse_factor()?;
            left = self.new_arith(operator, left, right, operator_token.line)?;
        }

        Ok(left)
    }

    fn new_arith(
        &self,
        operator: ArithOperator,
        lhs: Expression,
        rhs: Expression,
        line: usize,
    ) -> Result<Expression> {
        if lhs.ty != rhs.ty {
            return Err(SyntaxError::TypeMismatch {
                expected: lhs.ty,
                found: rhs.ty,
                line,
            });
        }

        Ok(Expression {
            ty: lhs.ty,
            kind: ExpressionKind::Arith {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        })
    }

    /// factor := int-lit | float-lit | ident | ident '[' expr ']'
    ///         | ident '(' args ')' | '(' expr ')' | ('+'|'-') factor
    fn parse_factor(&mut self) -> Result<Expression> {
        let token = self.lexer.next()?;

        match token.kind {
            TokenKind::Plus => self.parse_factor(),
            TokenKind::Minus => {
                // Unary minus lowers to `0 - factor` in the expected scalar
                // type
                let (ty, kind, text) = match self.expected {
                    Some(SemanticType::Int) => (SemanticType::Int, LiteralKind::Integer, "0"),
                    Some(SemanticType::Float) => (SemanticType::Float, LiteralKind::Float, "0.0"),
                    _ => return Err(SyntaxError::InvalidUnaryOperand { line: token.line }),
                };

                let zero = Expression {
                    ty,
                    kind: ExpressionKind::Literal(Literal {
                        kind,
                        text: text.to_owned(),
                    }),
                };
                let right = self.parse_factor()?;

                self.new_arith(ArithOperator::Subtract, zero, right, token.line)
            }
            TokenKind::OpenParen => {
                let expression = self.parse_expression()?;
                self.expect_token(TokenKind::CloseParen)?;
                Ok(expression)
            }
            TokenKind::IntegerLiteral => {
                self.strict_type_check(SemanticType::Int, token.line)?;
                Ok(Expression {
                    ty: SemanticType::Int,
                    kind: ExpressionKind::Literal(Literal {
                        kind: LiteralKind::Integer,
                        text: self.token_text(token),
                    }),
                })
            }
            TokenKind::FloatLiteral => {
                self.strict_type_check(SemanticType::Float, token.line)?;
                Ok(Expression {
                    ty: SemanticType::Float,
                    kind: ExpressionKind::Literal(Literal {
                        kind: LiteralKind::Float,
                        text: self.token_text(token),
                    }),
                })
            }
            TokenKind::Identifier => {
                let name = self.token_text(token);

                if let Some(signature) = self.functions.get(&name).cloned() {
                    self.strict_type_check(signature.return_type, token.line)?;
                    return self.parse_call(name, signature, token.line);
                }

                if self.peek_kind()? == TokenKind::OpenBracket {
                    let Some(declared) = self.scopes.lookup(&name) else {
                        return Err(SyntaxError::UndefinedVariable {
                            name,
                            line: token.line,
                        });
                    };
                    // An index result carries its element type without being
                    // checked against the outer context; a mismatch surfaces
                    // at the enclosing arith or condition node instead
                    let element = declared.element_type().ok_or(SyntaxError::NotAnArray {
                        name: name.clone(),
                        line: token.line,
                    })?;

                    let index = self.parse_index_expression()?;

                    return Ok(Expression {
                        ty: element,
                        kind: ExpressionKind::Index {
                            name,
                            index: Box::new(index),
                        },
                    });
                }

                let Some(declared) = self.scopes.lookup(&name) else {
                    return Err(SyntaxError::UndefinedVariable {
                        name,
                        line: token.line,
                    });
                };
                self.strict_type_check(declared, token.line)?;

                Ok(Expression {
                    ty: declared,
                    kind: ExpressionKind::Identifier(name),
                })
            }
            _ => Err(self.unexpected(token, "expression")),
        }
    }

    /// '(' [ expr { ',' expr } ] ')' after a function name. Argument i is
    /// parsed with the expected-type context set to the callee's i-th
    /// declared parameter type.
    fn parse_call(
        &mut self,
        name: String,
        signature: FunctionSignature,
        line: usize,
    ) -> Result<Expression> {
        self.expect_token(TokenKind::OpenParen)?;

        let mut arguments = Vec::new();
        if self.peek_kind()? != TokenKind::CloseParen {
            loop {
                let Some(&parameter_type) = signature.parameter_types.get(arguments.len()) else {
                    return Err(SyntaxError::ArgumentCountMismatch {
                        name,
                        expected: signature.parameter_types.len(),
                        found: arguments.len() + 1,
                        line,
                    });
                };

                let saved = self.expected.replace(parameter_type);
                arguments.push(self.parse_expression()?);
                self.expected = saved;

                if !self.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect_token(TokenKind::CloseParen)?;

        if arguments.len() != signature.parameter_types.len() {
            return Err(SyntaxError::ArgumentCountMismatch {
                name,
                expected: signature.parameter_types.len(),
                found: arguments.len(),
                line,
            });
        }

        Ok(Expression {
            ty: signature.return_type,
            kind: ExpressionKind::Call { name, arguments },
        })
    }
}
