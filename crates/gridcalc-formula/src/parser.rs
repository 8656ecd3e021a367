//! Formula parser
//!
//! A recursive descent parser for arithmetic formulas with operator precedence.

use crate::ast::{BinaryOperator, FormulaExpr};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::BuiltinFunction;
use gridcalc_core::{CellAddress, CellRange};

/// Deepest nesting of parentheses, signs and chained operators a formula may use
pub const MAX_NESTING: usize = 256;

/// Which formula shapes the parser accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grammar {
    /// Full arithmetic expressions with precedence, parentheses and nesting
    #[default]
    Expression,
    /// Exactly one of: a bare cell reference, a SUM/AVERAGE call over plain
    /// references or literals, or one binary operation between two operands
    SingleOperation,
}

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use gridcalc_formula::parse_formula;
///
/// let ast = parse_formula("=A1+B1").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=(A1+2)*-B3/4").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    parse_formula_with(formula, Grammar::Expression)
}

/// Parse a formula string, restricted to the given grammar
pub fn parse_formula_with(formula: &str, grammar: Grammar) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();
    if formula.is_empty() {
        return Err(FormulaError::Empty);
    }

    let body = formula
        .strip_prefix('=')
        .ok_or(FormulaError::MissingEquals)?;

    let mut parser = FormulaParser::new(body);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    match parser.current_token() {
        Token::Eof => {}
        Token::RightParen => return Err(FormulaError::UnexpectedToken("')'".into())),
        other => return Err(FormulaError::UnexpectedToken(other.describe())),
    }

    if grammar == Grammar::SingleOperation {
        check_single_operation(&expr)?;
    }

    Ok(expr)
}

/// Reject anything beyond the three legacy formula shapes
fn check_single_operation(expr: &FormulaExpr) -> FormulaResult<()> {
    fn is_operand(expr: &FormulaExpr) -> bool {
        match expr {
            FormulaExpr::CellRef(_) | FormulaExpr::Number(_) => true,
            FormulaExpr::Negate(inner) => matches!(**inner, FormulaExpr::Number(_)),
            _ => false,
        }
    }

    let ok = match expr {
        FormulaExpr::CellRef(_) => true,
        FormulaExpr::Function { args, .. } => match args.as_slice() {
            [FormulaExpr::RangeRef(_)] => true,
            args => args.iter().all(is_operand),
        },
        FormulaExpr::BinaryOp { left, right, .. } => is_operand(left) && is_operand(right),
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(FormulaError::UnsupportedShape)
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String), // Function name
    CellRef(String),    // Cell reference like A1

    Plus,
    Minus,
    Star,
    Slash,
    Colon,
    Comma,
    LeftParen,
    RightParen,

    /// Anything the scanner cannot place
    Invalid(String),

    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Identifier(name) => format!("name '{}'", name),
            Token::CellRef(r) => format!("reference {}", r),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Colon => "':'".into(),
            Token::Comma => "','".into(),
            Token::LeftParen => "'('".into(),
            Token::RightParen => "')'".into(),
            Token::Invalid(text) => format!("'{}'", text),
            Token::Eof => "end of formula".into(),
        }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            depth: 0,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current_token = self.scan_token();
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return self.scan_identifier_or_ref();
        }

        self.advance();
        Token::Invalid(c.to_string())
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(num) if num.is_finite() => Token::Number(num),
            _ => Token::Invalid(num_str.to_string()),
        }
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // Letters then digits is a reference, unless it is called like a function
        if Self::is_cell_reference(text) && !self.next_non_space_is('(') {
            return Token::CellRef(text.to_ascii_uppercase());
        }

        Token::Identifier(text.to_string())
    }

    fn is_cell_reference(text: &str) -> bool {
        let split = text
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(text.len());
        let (letters, digits) = text.split_at(split);
        !letters.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn next_non_space_is(&self, expected: char) -> bool {
        self.input[self.pos..].trim_start().starts_with(expected)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> Token {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token();
        token
    }

    fn expect_close_paren(&mut self) -> FormulaResult<()> {
        match self.current_token() {
            Token::RightParen => {
                self.consume();
                Ok(())
            }
            Token::Eof => Err(FormulaError::MissingParen),
            other => Err(FormulaError::UnexpectedToken(other.describe())),
        }
    }

    /// Go one level deeper; every call is paired with `ascend` on success
    fn descend(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FormulaError::TooDeep(MAX_NESTING));
        }
        Ok(())
    }

    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -, +
    // 4. Range: :
    // 5. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.descend()?;
        let expr = self.parse_additive()?;
        self.ascend(1);
        Ok(expr)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;
        // Each chained operator nests the tree built so far one level deeper
        let mut chained = 0;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            self.descend()?;
            chained += 1;
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.ascend(chained);
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;
        let mut chained = 0;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            self.descend()?;
            chained += 1;
            let right = self.parse_unary()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.ascend(chained);
        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token() {
            Token::Minus => {
                self.consume();
                self.descend()?;
                let operand = self.parse_unary()?;
                self.ascend(1);
                Ok(FormulaExpr::Negate(Box::new(operand)))
            }
            // Prefix plus (no-op)
            Token::Plus => {
                self.consume();
                self.descend()?;
                let operand = self.parse_unary()?;
                self.ascend(1);
                Ok(operand)
            }
            _ => self.parse_range(),
        }
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !matches!(self.current_token(), Token::Colon) {
            return Ok(left);
        }
        self.consume();

        let start = match left {
            FormulaExpr::CellRef(addr) => addr,
            _ => return Err(FormulaError::UnexpectedToken("':'".into())),
        };
        let end = match self.consume() {
            Token::CellRef(ref_str) => Self::parse_cell_address(&ref_str)?,
            Token::Eof => return Err(FormulaError::UnexpectedEnd),
            other => return Err(FormulaError::UnexpectedToken(other.describe())),
        };

        Ok(FormulaExpr::RangeRef(CellRange::new(start, end)))
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume() {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect_close_paren()?;
                Ok(expr)
            }

            Token::CellRef(ref_str) => {
                Self::parse_cell_address(&ref_str).map(FormulaExpr::CellRef)
            }

            Token::Identifier(name) => {
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(&name)
                } else {
                    Err(FormulaError::UnexpectedToken(format!("name '{}'", name)))
                }
            }

            Token::Eof => Err(FormulaError::UnexpectedEnd),

            other => Err(FormulaError::UnexpectedToken(other.describe())),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<FormulaExpr> {
        let func = BuiltinFunction::from_name(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_ascii_uppercase()))?;

        // Opening paren
        self.consume();

        let mut args = Vec::new();

        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect_close_paren()?;

        Ok(FormulaExpr::Function { func, args })
    }

    fn parse_cell_address(ref_str: &str) -> FormulaResult<CellAddress> {
        CellAddress::parse(ref_str).map_err(|_| FormulaError::InvalidReference(ref_str.to_string()))
    }
}
