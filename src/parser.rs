use std::mem;

use crate::{
    ast::{
        Expression,
        tokens::{Position, TemplatePart, Token},
    },
    lexer::Lexer,
    registry::FunctionRegistry,
    value::Value,
};

/// Errors raised while turning source text into an expression tree.
///
/// Parse failures are fatal: unlike evaluation errors, they are returned as
/// `Err` rather than carried in a result pair.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A character the lexer has no rule for
    UnexpectedCharacter { character: char, position: Position },

    /// A string or template literal with no closing quote
    UnterminatedString { position: Position },

    /// A numeric literal that does not fit the value types
    InvalidNumber { text: String, position: Position },

    /// A token that breaks the grammar at this point
    UnexpectedToken {
        found: String,
        expected: String,
        position: Position,
    },

    /// A call to a name the registry has no evaluator for
    UnknownFunction { name: String, position: Position },

    /// An evaluator's parse-time validator rejected the node
    Validation(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedCharacter {
                character,
                position,
            } => {
                write!(f, "Unexpected character '{}' at {}", character, position)
            }
            ParseError::UnterminatedString { position } => {
                write!(f, "Unterminated string at {}", position)
            }
            ParseError::InvalidNumber { text, position } => {
                write!(f, "Invalid number '{}' at {}", text, position)
            }
            ParseError::UnexpectedToken {
                found,
                expected,
                position,
            } => {
                write!(f, "Expected {}, got {} at {}", expected, found, position)
            }
            ParseError::UnknownFunction { name, position } => {
                write!(
                    f,
                    "{} does not have an evaluator, it is not a built-in or custom function ({})",
                    name, position
                )
            }
            ParseError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse an expression against the shared standard registry.
pub fn parse(text: &str) -> Result<Expression, ParseError> {
    parse_with(text, crate::registry::standard_functions())
}

/// Parse an expression against a caller-supplied registry.
///
/// Two registries can give the same text different meanings; the returned
/// tree keeps its evaluators alive independently of the registry.
pub fn parse_with(text: &str, registry: &FunctionRegistry) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(Lexer::new(text), registry)?;
    parser.parse()
}

pub struct Parser<'r> {
    lexer: Lexer,
    current_token: Token,
    registry: &'r FunctionRegistry,
}

impl<'r> Parser<'r> {
    pub fn new(mut lexer: Lexer, registry: &'r FunctionRegistry) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            registry,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if mem::discriminant(&self.current_token) != mem::discriminant(&expected) {
            return Err(ParseError::UnexpectedToken {
                found: format!("{:?}", self.current_token),
                expected: format!("{:?}", expected),
                position: self.lexer.position(),
            });
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    /// Build a node for a registered name and run its validator.
    fn make_expression(
        &self,
        name: &str,
        children: Vec<Expression>,
    ) -> Result<Expression, ParseError> {
        let evaluator =
            self.registry
                .lookup(name)
                .ok_or_else(|| ParseError::UnknownFunction {
                    name: name.to_string(),
                    position: self.lexer.position(),
                })?;
        let expr = Expression::new(evaluator, children);
        expr.validate().map_err(ParseError::Validation)?;
        Ok(expr)
    }

    /// Parse primary expressions (atoms): literals, names, calls, '('
    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            // Literals
            Token::Integer(n) => {
                self.advance()?;
                Ok(Expression::constant(Value::Integer(n)))
            }
            Token::Float(n) => {
                self.advance()?;
                Ok(Expression::constant(Value::Float(n)))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expression::constant(Value::String(s)))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Expression::constant(Value::Boolean(b)))
            }
            Token::Null => {
                self.advance()?;
                Ok(Expression::constant(Value::Null))
            }

            // `Hi ${name}` desugars to concat('Hi ', name)
            Token::Template(parts) => {
                self.advance()?;
                let mut children = Vec::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => {
                            children.push(Expression::constant(Value::String(text)));
                        }
                        TemplatePart::Expression(source) => {
                            children.push(parse_with(&source, self.registry)?);
                        }
                    }
                }
                if children.is_empty() {
                    return Ok(Expression::constant(Value::String(String::new())));
                }
                self.make_expression("concat", children)
            }

            // A bare name is a call, a registered constant, or an accessor
            Token::Identifier(name) => {
                self.advance()?;
                if self.check(&Token::LParen) {
                    self.advance()?;
                    let args = self.parse_arguments()?;
                    return self.make_expression(&name, args);
                }
                if let Some(value) = self.registry.constant(&name) {
                    return Ok(Expression::constant(value));
                }
                self.make_expression(
                    "Accessor",
                    vec![Expression::constant(Value::String(name))],
                )
            }

            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            // [1, 2, 3] desugars to createArray(1, 2, 3)
            Token::LBracket => {
                self.advance()?;
                let mut elements = Vec::new();
                while !self.check(&Token::RBracket) {
                    elements.push(self.parse_expression()?);
                    if !self.check(&Token::RBracket) {
                        self.expect(Token::Comma)?;
                    }
                }
                self.expect(Token::RBracket)?;
                self.make_expression("createArray", elements)
            }

            token => Err(ParseError::UnexpectedToken {
                found: format!("{:?}", token),
                expected: "an expression".to_string(),
                position: self.lexer.position(),
            }),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);
            if !self.check(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// Parse `.name` and `[index]` accessor chains
    fn parse_access(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&Token::Dot) {
                self.advance()?; // consume '.'

                let name = match &self.current_token {
                    Token::Identifier(n) => n.clone(),
                    other => {
                        return Err(ParseError::UnexpectedToken {
                            found: format!("{:?}", other),
                            expected: "an identifier after '.'".to_string(),
                            position: self.lexer.position(),
                        });
                    }
                };
                self.advance()?;

                expr = self.make_expression(
                    "Accessor",
                    vec![Expression::constant(Value::String(name)), expr],
                )?;
            } else if self.check(&Token::LBracket) {
                self.advance()?; // consume '['
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;

                expr = self.make_expression("Element", vec![expr, index])?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if self.check(&Token::Bang) {
            self.advance()?;
            let operand = self.parse_unary()?;
            return self.make_expression("!", vec![operand]);
        }
        if self.check(&Token::Minus) {
            self.advance()?;
            let operand = self.parse_unary()?;
            // Fold literal negation, otherwise 0 - operand
            return match operand.constant_value() {
                Some(Value::Integer(n)) => Ok(Expression::constant(Value::Integer(-n))),
                Some(Value::Float(n)) => Ok(Expression::constant(Value::Float(-n))),
                _ => self.make_expression(
                    "-",
                    vec![Expression::constant(Value::Integer(0)), operand],
                ),
            };
        }
        self.parse_access()
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Star => "*",
                Token::Slash => "/",
                Token::Percent => "%",
                _ => break,
            };

            self.advance()?;
            let right = self.parse_unary()?;
            left = self.make_expression(op, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => "+",
                Token::Minus => "-",
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = self.make_expression(op, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current_token {
                Token::Lt => "<",
                Token::LtEq => "<=",
                Token::Gt => ">",
                Token::GtEq => ">=",
                _ => break,
            };

            self.advance()?;
            let right = self.parse_additive()?;
            left = self.make_expression(op, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match &self.current_token {
                Token::EqEq => "==",
                Token::NotEq => "!=",
                _ => break,
            };

            self.advance()?;
            let right = self.parse_relational()?;
            left = self.make_expression(op, vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check(&Token::AmpAmp) {
            self.advance()?;
            let right = self.parse_equality()?;
            left = self.make_expression("&&", vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::PipePipe) {
            self.advance()?;
            let right = self.parse_and()?;
            left = self.make_expression("||", vec![left, right])?;
        }
        Ok(left)
    }

    fn parse_coalesce(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_or()?;

        while self.check(&Token::QuestionQuestion) {
            self.advance()?;
            let right = self.parse_or()?;
            left = self.make_expression("coalesce", vec![left, right])?;
        }
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_coalesce()
    }

    pub fn parse(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof)?;
        Ok(expr)
    }
}
