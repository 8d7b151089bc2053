/// A byte offset into the source text, carried by tokens and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
}

impl Position {
    pub fn new(offset: usize) -> Self {
        Position { offset }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position {}", self.offset)
    }
}

/// One piece of a backtick template string.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text between interpolations
    Literal(String),

    /// Source text of an embedded `${...}` expression, parsed separately
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 314
    /// ```
    Integer(i64),

    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 0.5
    /// ```
    Float(f64),

    /// String literal enclosed in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'item #1'
    /// ```
    String(String),

    /// Backtick template string with `${...}` interpolations
    ///
    /// # Examples
    /// ```text
    /// `Hello ${user.name}`
    /// ```
    Template(Vec<TemplatePart>),

    /// Boolean values
    ///
    /// # Examples
    /// ```text
    /// true
    /// false
    /// ```
    Boolean(bool),

    /// Null value
    Null,

    // Identifiers
    /// Function name or the first segment of a memory path
    ///
    /// Must start with letter or underscore, followed by letters, digits,
    /// or underscores.
    ///
    /// # Examples
    /// ```text
    /// user
    /// formatDateTime
    /// _internal
    /// ```
    Identifier(String),

    // Comparison
    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    // Arithmetic
    /// Addition or string concatenation
    Plus,

    /// Subtraction
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    // Logical
    /// Logical AND, short-circuiting
    ///
    /// # Examples
    /// ```text
    /// user.age > 18 && user.verified
    /// ```
    AmpAmp,

    /// Logical OR, short-circuiting
    ///
    /// # Examples
    /// ```text
    /// role == "admin" || role == "mod"
    /// ```
    PipePipe,

    /// Logical NOT
    Bang,

    /// Null coalescing
    ///
    /// # Examples
    /// ```text
    /// nickname ?? name ?? "anonymous"
    /// ```
    QuestionQuestion,

    // Delimiters
    /// Left parenthesis for grouping or function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Left bracket for index accessors
    LBracket,

    /// Right bracket
    RBracket,

    /// Dot for property access
    Dot,

    /// Comma for separating arguments
    Comma,

    /// End of input
    Eof,
}
