use crate::ast::tokens::{Position, TemplatePart, Token};
use crate::parser::ParseError;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Offset of the next unread character, for error reporting.
    pub fn position(&self) -> Position {
        Position::new(self.position)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_escape(&mut self) -> Result<char, ParseError> {
        self.advance(); // Consume backslash
        let resolved = match self.current_char() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('`') => '`',
            Some('$') => '$',
            Some('\\') => '\\',
            Some(ch) => {
                return Err(ParseError::UnexpectedCharacter {
                    character: ch,
                    position: self.position(),
                });
            }
            None => {
                return Err(ParseError::UnterminatedString {
                    position: self.position(),
                });
            }
        };
        self.advance();
        Ok(resolved)
    }

    fn read_string(&mut self, quote: char) -> Result<String, ParseError> {
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => result.push(self.read_escape()?),
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::UnterminatedString {
            position: self.position(),
        })
    }

    /// Read a backtick template into literal and `${...}` expression parts.
    ///
    /// The embedded expression text is captured verbatim and parsed
    /// separately; braces inside nested strings do not terminate it.
    fn read_template(&mut self) -> Result<Token, ParseError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        self.advance(); // Consume opening backtick

        while let Some(ch) = self.current_char() {
            match ch {
                '`' => {
                    self.advance();
                    if !literal.is_empty() {
                        parts.push(TemplatePart::Literal(literal));
                    }
                    return Ok(Token::Template(parts));
                }
                '\\' => literal.push(self.read_escape()?),
                '$' if self.peek_char(1) == Some('{') => {
                    if !literal.is_empty() {
                        parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                    }
                    self.advance(); // $
                    self.advance(); // {
                    let mut source = String::new();
                    let mut depth = 1usize;
                    let mut in_quote: Option<char> = None;
                    while let Some(inner) = self.current_char() {
                        match in_quote {
                            Some(q) => {
                                if inner == q {
                                    in_quote = None;
                                }
                            }
                            None => match inner {
                                '\'' | '"' => in_quote = Some(inner),
                                '{' => depth += 1,
                                '}' => {
                                    depth -= 1;
                                    if depth == 0 {
                                        break;
                                    }
                                }
                                _ => {}
                            },
                        }
                        source.push(inner);
                        self.advance();
                    }
                    if self.current_char() != Some('}') {
                        return Err(ParseError::UnterminatedString {
                            position: self.position(),
                        });
                    }
                    self.advance(); // }
                    parts.push(TemplatePart::Expression(source));
                }
                _ => {
                    literal.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::UnterminatedString {
            position: self.position(),
        })
    }

    fn read_number(&mut self) -> Result<Token, ParseError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if is_float {
            match number.parse::<f64>() {
                Ok(n) => Ok(Token::Float(n)),
                Err(_) => Err(ParseError::InvalidNumber {
                    text: number,
                    position: Position::new(start),
                }),
            }
        } else {
            match number.parse::<i64>() {
                Ok(n) => Ok(Token::Integer(n)),
                Err(_) => Err(ParseError::InvalidNumber {
                    text: number,
                    position: Position::new(start),
                }),
            }
        }
    }

    /// Two-character operator, or an error naming the lone first character.
    fn read_pair(&mut self, second: char, token: Token) -> Result<Token, ParseError> {
        if self.peek_char(1) == Some(second) {
            self.advance();
            self.advance();
            Ok(token)
        } else {
            let position = self.position();
            Err(ParseError::UnexpectedCharacter {
                character: self.current_char().unwrap_or(' '),
                position,
            })
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        match self.current_char() {
            None => Ok(Token::Eof),
            Some('.') => {
                self.advance();
                Ok(Token::Dot)
            }
            Some(',') => {
                self.advance();
                Ok(Token::Comma)
            }
            Some('+') => {
                self.advance();
                Ok(Token::Plus)
            }
            Some('-') => {
                self.advance();
                Ok(Token::Minus)
            }
            Some('*') => {
                self.advance();
                Ok(Token::Star)
            }
            Some('/') => {
                self.advance();
                Ok(Token::Slash)
            }
            Some('%') => {
                self.advance();
                Ok(Token::Percent)
            }
            Some('&') => self.read_pair('&', Token::AmpAmp),
            Some('|') => self.read_pair('|', Token::PipePipe),
            Some('?') => self.read_pair('?', Token::QuestionQuestion),
            Some('=') => self.read_pair('=', Token::EqEq),
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::GtEq)
                } else {
                    self.advance();
                    Ok(Token::Gt)
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::LtEq)
                } else {
                    self.advance();
                    Ok(Token::Lt)
                }
            }
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::NotEq)
                } else {
                    self.advance();
                    Ok(Token::Bang)
                }
            }
            Some('(') => {
                self.advance();
                Ok(Token::LParen)
            }
            Some(')') => {
                self.advance();
                Ok(Token::RParen)
            }
            Some('[') => {
                self.advance();
                Ok(Token::LBracket)
            }
            Some(']') => {
                self.advance();
                Ok(Token::RBracket)
            }
            Some('"') => Ok(Token::String(self.read_string('"')?)),
            Some('\'') => Ok(Token::String(self.read_string('\'')?)),
            Some('`') => self.read_template(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                match ident.as_str() {
                    "true" => Ok(Token::Boolean(true)),
                    "false" => Ok(Token::Boolean(false)),
                    "null" => Ok(Token::Null),
                    _ => Ok(Token::Identifier(ident)),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) => Err(ParseError::UnexpectedCharacter {
                character: ch,
                position: self.position(),
            }),
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("true false null user");
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(true)));
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(false)));
    assert_eq!(lexer.next_token(), Ok(Token::Null));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("user".to_string())));
}

#[test]
fn test_operators() {
    let mut lexer = Lexer::new("a && b || !c ?? d");
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("a".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::AmpAmp));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("b".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::PipePipe));
    assert_eq!(lexer.next_token(), Ok(Token::Bang));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("c".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::QuestionQuestion));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("d".to_string())));
}

#[test]
fn test_template() {
    let mut lexer = Lexer::new("`Hi ${user.name}!`");
    assert_eq!(
        lexer.next_token(),
        Ok(Token::Template(vec![
            TemplatePart::Literal("Hi ".to_string()),
            TemplatePart::Expression("user.name".to_string()),
            TemplatePart::Literal("!".to_string()),
        ]))
    );
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}
