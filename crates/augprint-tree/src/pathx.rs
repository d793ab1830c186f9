//! Parser for the path expression subset used by `match` and `set`.
//!
//! ```text
//! path      := ('/' | '//')? step (('/' | '//') step)*
//! step      := ('seq::*' | '*' | '.' | '..' | label) ('[' expr ']')*
//! expr      := and ('or' and)*
//! and       := compare ('and' compare)*
//! compare   := primary (('=' | '!=') primary)?
//! primary   := '(' expr ')' | string | number | call | path
//! call      := ('position' | 'last' | 'label') '()' | 'count(' path ')'
//! ```
//!
//! Labels escape metacharacters with a backslash. Strings are delimited by `'`
//! or `"` and understand `\\`, `\n`, `\t` and an escaped delimiter.

use crate::error::TreeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Label(String),
    /// `*`
    Any,
    /// `seq::*`: children with numeric labels.
    Seq,
    /// `.`
    SelfNode,
    /// `..`
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NameTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Position,
    Last,
    Label,
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare {
        left: Box<Expr>,
        right: Box<Expr>,
        negated: bool,
    },
    Path(LocationPath),
    Literal(String),
    Number(i64),
    Call(Func, Vec<Expr>),
}

const LABEL_STOP: &[char] = &['/', '[', ']', '=', '(', ')', '!', ',', '|', '\'', '"'];

/// Characters escaped when rendering a label into a path.
const LABEL_ESCAPE: &[char] = &['/', '[', ']', '=', '(', ')', '!', ',', '|', '\\'];

/// Escapes a node label for use as a path step.
pub fn escape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if LABEL_ESCAPE.contains(&c) || c.is_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Parses an absolute path expression.
pub fn parse(expr: &str) -> Result<LocationPath, TreeError> {
    let mut parser = Parser::new(expr);
    parser.skip_ws();
    let path = parser.location_path()?;
    parser.skip_ws();
    if parser.peek().is_some() {
        return Err(parser.error("unexpected trailing input"));
    }
    if !path.absolute {
        return Err(parser.error("expected an absolute path"));
    }
    Ok(path)
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> TreeError {
        TreeError::Path {
            expr: self.src.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, text: &str) -> bool {
        let len = text.chars().count();
        let matches = self
            .chars
            .get(self.pos..self.pos + len)
            .is_some_and(|window| window.iter().copied().eq(text.chars()));
        if matches {
            self.pos += len;
        }
        matches
    }

    fn expect(&mut self, text: &str) -> Result<(), TreeError> {
        if self.eat(text) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{text}`")))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Consumes `word` when it stands alone (followed by whitespace or `(`).
    fn keyword(&mut self, word: &str) -> bool {
        let len = word.chars().count();
        let follows = self.peek_at(len);
        let boundary = follows.is_some_and(|c| c.is_whitespace() || c == '(');
        if boundary && self.eat(word) {
            return true;
        }
        false
    }

    fn location_path(&mut self) -> Result<LocationPath, TreeError> {
        let mut steps = Vec::new();
        let (absolute, mut axis) = if self.eat("//") {
            (true, Axis::Descendant)
        } else if self.eat("/") {
            if !self.at_step_start() {
                return Ok(LocationPath {
                    absolute: true,
                    steps,
                });
            }
            (true, Axis::Child)
        } else {
            (false, Axis::Child)
        };

        loop {
            steps.push(self.step(axis)?);
            if self.eat("//") {
                axis = Axis::Descendant;
            } else if self.eat("/") {
                axis = Axis::Child;
            } else {
                break;
            }
        }
        Ok(LocationPath { absolute, steps })
    }

    fn at_step_start(&self) -> bool {
        match self.peek() {
            Some(c) => c == '\\' || c == '*' || !(LABEL_STOP.contains(&c) || c.is_whitespace()),
            None => false,
        }
    }

    fn step(&mut self, axis: Axis) -> Result<Step, TreeError> {
        let test = if self.eat("seq::*") {
            NameTest::Seq
        } else if self.eat("*") {
            NameTest::Any
        } else {
            match self.label()?.as_str() {
                "" => return Err(self.error("expected a path step")),
                "." => NameTest::SelfNode,
                ".." => NameTest::Parent,
                label => NameTest::Label(label.to_string()),
            }
        };

        let mut predicates = Vec::new();
        while self.eat("[") {
            self.skip_ws();
            predicates.push(self.expr()?);
            self.skip_ws();
            self.expect("]")?;
        }
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn label(&mut self) -> Result<String, TreeError> {
        let mut label = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                match self.bump() {
                    Some(escaped) => label.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else if LABEL_STOP.contains(&c) || c.is_whitespace() {
                break;
            } else {
                label.push(c);
                self.pos += 1;
            }
        }
        Ok(label)
    }

    fn expr(&mut self) -> Result<Expr, TreeError> {
        let mut left = self.and_expr()?;
        loop {
            self.skip_ws();
            if !self.keyword("or") {
                return Ok(left);
            }
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
    }

    fn and_expr(&mut self) -> Result<Expr, TreeError> {
        let mut left = self.compare()?;
        loop {
            self.skip_ws();
            if !self.keyword("and") {
                return Ok(left);
            }
            let right = self.compare()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
    }

    fn compare(&mut self) -> Result<Expr, TreeError> {
        let left = self.primary()?;
        self.skip_ws();
        let negated = if self.eat("!=") {
            true
        } else if self.eat("=") {
            false
        } else {
            return Ok(left);
        };
        let right = self.primary()?;
        Ok(Expr::Compare {
            left: Box::new(left),
            right: Box::new(right),
            negated,
        })
    }

    fn primary(&mut self) -> Result<Expr, TreeError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.expr()?;
                self.skip_ws();
                self.expect(")")?;
                Ok(inner)
            }
            Some(delimiter @ ('\'' | '"')) => {
                self.pos += 1;
                self.string(delimiter).map(Expr::Literal)
            }
            Some(c) if c.is_ascii_digit() => self.number_or_path(),
            Some(_) => {
                if let Some(call) = self.call()? {
                    return Ok(call);
                }
                self.location_path().map(Expr::Path)
            }
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn number_or_path(&mut self) -> Result<Expr, TreeError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let rest_is_label = self.at_step_start() || self.peek() == Some('/');
        if rest_is_label {
            self.pos = start;
            return self.location_path().map(Expr::Path);
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse()
            .map(Expr::Number)
            .map_err(|_| self.error("number out of range"))
    }

    fn call(&mut self) -> Result<Option<Expr>, TreeError> {
        let start = self.pos;
        let name = self.label()?;
        let func = match name.as_str() {
            "position" => Func::Position,
            "last" => Func::Last,
            "label" => Func::Label,
            "count" => Func::Count,
            _ => {
                self.pos = start;
                return Ok(None);
            }
        };
        self.skip_ws();
        if !self.eat("(") {
            self.pos = start;
            return Ok(None);
        }
        self.skip_ws();
        let mut args = Vec::new();
        if func == Func::Count {
            args.push(Expr::Path(self.location_path()?));
            self.skip_ws();
        }
        self.expect(")")?;
        Ok(Some(Expr::Call(func, args)))
    }

    fn string(&mut self, delimiter: char) -> Result<String, TreeError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("dangling escape in string")),
                },
                Some(c) if c == delimiter => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}
