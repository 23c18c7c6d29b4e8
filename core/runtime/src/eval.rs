//! A small expression language for poking at runtime values.
//!
//! ```text
//! 42  3.5  "text"  :sym  true  nil  undefined  self  @ivar
//! [1, 2, 3]  {name: "x", "key" => 1}
//! point.x  list[0]  hash["key"]  list.length  greet("you")  obj.method(1)
//! raise ArgumentError, "bad"
//! ```

use crate::{ObjectData, RuntimeObject};
use log::trace;
use spyglass_inspector::{Exception, HostObject, Number, Value};
use thiserror::Error;

/// Deepest nesting of brackets, calls and member chains a parse accepts.
pub const MAX_NESTING: usize = 128;

/// Name resolution for one evaluation.
pub trait Scope {
    /// Resolves a bare identifier.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// The value of `self`.
    fn self_value(&self) -> Value;

    /// The interned symbol `name`.
    fn symbol(&self, name: &str) -> Value;
}

/// Malformed expression text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    /// A character that starts no token.
    #[error("unexpected character `{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    /// A string literal without its closing quote.
    #[error("unterminated string meets end of file")]
    UnterminatedString,
    /// A token that does not fit the grammar here.
    #[error("unexpected `{0}'")]
    UnexpectedToken(String),
    /// The expression stopped early.
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// The expression nests deeper than [`MAX_NESTING`].
    #[error("expression nested too deeply (more than {0} levels)")]
    TooDeep(usize),
}

impl From<SyntaxError> for Exception {
    fn from(error: SyntaxError) -> Self {
        let message = error.to_string();
        Self::new("SyntaxError", message.clone())
            .with_value(RuntimeObject::error("SyntaxError", message).into_value())
    }
}

/// Parses and evaluates `source` against `scope`.
pub fn evaluate(source: &str, scope: &dyn Scope) -> Result<Value, Exception> {
    trace!("evaluating {source:?}");
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
    };
    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(SyntaxError::UnexpectedToken(token.to_string()).into());
    }
    Interpreter { scope }.eval(&expr)
}

/// Builds the exception raised as `class_name` with `message`.
pub fn raise(class_name: &str, message: impl Into<String>) -> Exception {
    let message = message.into();
    Exception::new(class_name, message.clone())
        .with_value(RuntimeObject::error(class_name, message).into_value())
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Integer(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Ident(String),
    Ivar(String),
    Punct(&'static str),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Symbol(s) => write!(f, ":{s}"),
            Self::Ident(s) | Self::Ivar(s) => f.write_str(s),
            Self::Punct(p) => f.write_str(p),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '?' | '!')
}

fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let take_ident = |start: usize| {
        let mut end = start;
        while end < chars.len() && is_ident_char(chars[end]) {
            end += 1;
        }
        (chars[start..end].iter().collect::<String>(), end)
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '-' if c != '-' || chars.get(i + 1).is_some_and(char::is_ascii_digit) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                    i += 1;
                }
                let is_float = chars.get(i) == Some(&'.')
                    && chars.get(i + 1).is_some_and(char::is_ascii_digit);
                if is_float {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                let token = if is_float {
                    text.parse().map(Token::Float).ok()
                } else {
                    text.parse().map(Token::Integer).ok()
                };
                tokens.push(token.ok_or(SyntaxError::UnexpectedChar(c, start))?);
            }
            '"' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(SyntaxError::UnterminatedString),
                        Some('"') => break,
                        Some('\\') => {
                            i += 1;
                            match chars.get(i) {
                                Some('n') => text.push('\n'),
                                Some('t') => text.push('\t'),
                                Some(other) => text.push(*other),
                                None => return Err(SyntaxError::UnterminatedString),
                            }
                        }
                        Some(other) => text.push(*other),
                    }
                    i += 1;
                }
                i += 1;
                tokens.push(Token::Str(text));
            }
            ':' if chars.get(i + 1).copied().is_some_and(is_ident_start) => {
                let (name, end) = take_ident(i + 1);
                tokens.push(Token::Symbol(name));
                i = end;
            }
            '@' if chars.get(i + 1).copied().is_some_and(is_ident_start) => {
                let (name, end) = take_ident(i + 1);
                tokens.push(Token::Ivar(format!("@{name}")));
                i = end;
            }
            c if is_ident_start(c) => {
                let (name, end) = take_ident(i);
                tokens.push(Token::Ident(name));
                i = end;
            }
            '=' if chars.get(i + 1) == Some(&'>') => {
                tokens.push(Token::Punct("=>"));
                i += 2;
            }
            '[' => push_punct(&mut tokens, &mut i, "["),
            ']' => push_punct(&mut tokens, &mut i, "]"),
            '{' => push_punct(&mut tokens, &mut i, "{"),
            '}' => push_punct(&mut tokens, &mut i, "}"),
            '(' => push_punct(&mut tokens, &mut i, "("),
            ')' => push_punct(&mut tokens, &mut i, ")"),
            ',' => push_punct(&mut tokens, &mut i, ","),
            '.' => push_punct(&mut tokens, &mut i, "."),
            ':' => push_punct(&mut tokens, &mut i, ":"),
            other => return Err(SyntaxError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

fn push_punct(tokens: &mut Vec<Token>, i: &mut usize, punct: &'static str) {
    tokens.push(Token::Punct(punct));
    *i += 1;
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Symbol(String),
    Array(Vec<Expr>),
    Hash(Vec<(Expr, Expr)>),
    Ident(String),
    Ivar(String),
    SelfRef,
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    MethodCall(Box<Expr>, String, Vec<Expr>),
    Raise(String, Option<Box<Expr>>),
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Result<Token, SyntaxError> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or(SyntaxError::UnexpectedEnd)?;
        self.position += 1;
        Ok(token)
    }

    fn eat(&mut self, punct: &'static str) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.position += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, punct: &'static str) -> Result<(), SyntaxError> {
        if self.eat(punct) {
            return Ok(());
        }
        match self.peek() {
            Some(token) => Err(SyntaxError::UnexpectedToken(token.to_string())),
            None => Err(SyntaxError::UnexpectedEnd),
        }
    }

    fn enter(&mut self) -> Result<(), SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        let outer = self.depth;
        self.enter()?;
        let expr = if self.peek() == Some(&Token::Ident("raise".to_owned())) {
            self.position += 1;
            self.raise()
        } else {
            self.postfix()
        };
        self.depth = outer;
        expr
    }

    fn raise(&mut self) -> Result<Expr, SyntaxError> {
        if let Some(Token::Ident(name)) = self.peek()
            && name.starts_with(|c: char| c.is_ascii_uppercase())
        {
            let class = name.clone();
            self.position += 1;
            let message = if self.eat(",") {
                Some(Box::new(self.postfix()?))
            } else {
                None
            };
            return Ok(Expr::Raise(class, message));
        }
        let message = self.postfix()?;
        Ok(Expr::Raise("RuntimeError".to_owned(), Some(Box::new(message))))
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let outer = self.depth;
        let expr = self.chain();
        self.depth = outer;
        expr
    }

    /// A primary followed by member, index and call suffixes. Every suffix
    /// counts as one level of nesting.
    fn chain(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                self.enter()?;
                let name = match self.next()? {
                    Token::Ident(name) => name,
                    other => return Err(SyntaxError::UnexpectedToken(other.to_string())),
                };
                expr = if self.eat("(") {
                    Expr::MethodCall(Box::new(expr), name, self.list(")")?)
                } else {
                    Expr::Member(Box::new(expr), name)
                };
            } else if self.eat("[") {
                self.enter()?;
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat("(") {
                self.enter()?;
                expr = Expr::Call(Box::new(expr), self.list(")")?);
            } else {
                return Ok(expr);
            }
        }
    }

    fn list(&mut self, close: &'static str) -> Result<Vec<Expr>, SyntaxError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        Ok(match self.next()? {
            Token::Integer(i) => Expr::Literal(Value::from(i)),
            Token::Float(x) => Expr::Literal(Value::from(x)),
            Token::Str(s) => Expr::Literal(Value::from(s)),
            Token::Symbol(name) => Expr::Symbol(name),
            Token::Ivar(name) => Expr::Ivar(name),
            Token::Ident(name) => match name.as_str() {
                "true" => Expr::Literal(Value::from(true)),
                "false" => Expr::Literal(Value::from(false)),
                "nil" => Expr::Literal(Value::Nil),
                "undefined" => Expr::Literal(Value::Undefined),
                "self" => Expr::SelfRef,
                _ => Expr::Ident(name),
            },
            Token::Punct("[") => Expr::Array(self.list("]")?),
            Token::Punct("{") => self.hash()?,
            Token::Punct("(") => {
                let inner = self.expression()?;
                self.expect(")")?;
                inner
            }
            other => return Err(SyntaxError::UnexpectedToken(other.to_string())),
        })
    }

    fn hash(&mut self) -> Result<Expr, SyntaxError> {
        let mut entries = Vec::new();
        if self.eat("}") {
            return Ok(Expr::Hash(entries));
        }
        loop {
            let key = match self.next()? {
                Token::Ident(name) if self.eat(":") => Expr::Literal(Value::from(name)),
                _ => {
                    self.position -= 1;
                    let key = self.postfix()?;
                    self.expect("=>")?;
                    key
                }
            };
            let value = self.expression()?;
            entries.push((key, value));
            if self.eat("}") {
                return Ok(Expr::Hash(entries));
            }
            self.expect(",")?;
        }
    }
}

struct Interpreter<'s> {
    scope: &'s dyn Scope,
}

impl Interpreter<'_> {
    fn eval(&self, expr: &Expr) -> Result<Value, Exception> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Symbol(name) => Ok(self.scope.symbol(name)),
            Expr::Array(items) => {
                let elements = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?;
                Ok(RuntimeObject::array(elements).into_value())
            }
            Expr::Hash(entries) => {
                let entries = entries
                    .iter()
                    .map(|(key, value)| Ok((self.eval(key)?, self.eval(value)?)))
                    .collect::<Result<_, Exception>>()?;
                Ok(RuntimeObject::hash(entries).into_value())
            }
            Expr::Ident(name) => self.scope.lookup(name).ok_or_else(|| {
                if name.starts_with(|c: char| c.is_ascii_uppercase()) {
                    raise("NameError", format!("uninitialized constant {name}"))
                } else {
                    raise(
                        "NameError",
                        format!("undefined local variable or method `{name}' for main"),
                    )
                }
            }),
            Expr::Ivar(name) => Ok(self
                .scope
                .self_value()
                .as_object()
                .and_then(RuntimeObject::downcast)
                .and_then(|object| object.slot(name))
                .unwrap_or(Value::Nil)),
            Expr::SelfRef => Ok(self.scope.self_value()),
            Expr::Member(receiver, name) => {
                let receiver = self.eval(receiver)?;
                member(&receiver, name)
            }
            Expr::Index(receiver, index) => {
                let receiver = self.eval(receiver)?;
                let index = self.eval(index)?;
                index_into(&receiver, &index)
            }
            Expr::Call(callee, arguments) => {
                let callee = self.eval(callee)?;
                let arguments = self.arguments(arguments)?;
                call(&callee, &self.scope.self_value(), &arguments)
            }
            Expr::MethodCall(receiver, name, arguments) => {
                let receiver = self.eval(receiver)?;
                let method = member(&receiver, name)?;
                let arguments = self.arguments(arguments)?;
                call(&method, &receiver, &arguments)
            }
            Expr::Raise(class, message) => {
                let message = match message {
                    Some(message) => self.eval(message)?.to_string(),
                    None => class.clone(),
                };
                Err(raise(class, message))
            }
        }
    }

    fn arguments(&self, arguments: &[Expr]) -> Result<Vec<Value>, Exception> {
        arguments.iter().map(|argument| self.eval(argument)).collect()
    }
}

fn index_into(receiver: &Value, index: &Value) -> Result<Value, Exception> {
    let object = receiver
        .as_object()
        .and_then(RuntimeObject::downcast)
        .ok_or_else(|| undefined_method("[]", receiver))?;
    match (object.data(), index) {
        (ObjectData::Array(elements), Value::Number(Number::Integer(i))) => {
            let elements = elements.borrow();
            let position = if *i < 0 {
                usize::try_from(i.unsigned_abs())
                    .ok()
                    .and_then(|back| elements.len().checked_sub(back))
            } else {
                usize::try_from(*i).ok()
            };
            Ok(position
                .and_then(|p| elements.get(p).cloned())
                .unwrap_or(Value::Nil))
        }
        (ObjectData::Array(_), _) => Err(raise(
            "TypeError",
            format!("no implicit conversion of {index} into Integer"),
        )),
        (ObjectData::Hash(_), key) => {
            let key = match key {
                Value::Symbol(symbol) => Value::from(symbol.name()),
                other => other.clone(),
            };
            Ok(object.get(&key).unwrap_or(Value::Nil))
        }
        _ => Err(undefined_method("[]", receiver)),
    }
}

fn undefined_method(name: &str, receiver: &Value) -> Exception {
    raise(
        "NoMethodError",
        format!("undefined method `{name}' for {receiver}"),
    )
}

fn count(n: usize) -> Value {
    Value::from(i64::try_from(n).unwrap_or(i64::MAX))
}

fn member(receiver: &Value, name: &str) -> Result<Value, Exception> {
    if let Value::String(s) = receiver {
        return match name {
            "length" | "size" => Ok(count(s.chars().count())),
            "upcase" => Ok(Value::from(s.to_uppercase())),
            "downcase" => Ok(Value::from(s.to_lowercase())),
            _ => Err(undefined_method(name, receiver)),
        };
    }

    let object = receiver
        .as_object()
        .and_then(RuntimeObject::downcast)
        .ok_or_else(|| undefined_method(name, receiver))?;

    match (object.data(), name) {
        (ObjectData::Array(elements), "length" | "size") => {
            return Ok(count(elements.borrow().len()));
        }
        (ObjectData::Array(elements), "first") => {
            return Ok(elements.borrow().first().cloned().unwrap_or(Value::Nil));
        }
        (ObjectData::Array(elements), "last") => {
            return Ok(elements.borrow().last().cloned().unwrap_or(Value::Nil));
        }
        (ObjectData::Hash(entries), "length" | "size") => {
            return Ok(count(entries.borrow().len()));
        }
        (ObjectData::Hash(_), key) => {
            if let Some(value) = object.get(&Value::from(key)) {
                return Ok(value);
            }
        }
        (ObjectData::Binding(_), local) => {
            if let Some(value) = object.local(local) {
                return Ok(value);
            }
        }
        _ => {}
    }

    if object.attribute_names().any(|attribute| attribute == name) {
        return object.read_attribute(name);
    }
    object
        .slot(&format!("@{name}"))
        .or_else(|| object.slot(name))
        .ok_or_else(|| undefined_method(name, receiver))
}

fn call(callee: &Value, receiver: &Value, arguments: &[Value]) -> Result<Value, Exception> {
    let callable = callee
        .as_object()
        .and_then(|object| object.callable())
        .ok_or_else(|| undefined_method("call", callee))?;
    callable.call(receiver, arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spyglass_inspector::Symbol;
    use test_case::test_case;

    struct Globals(Vec<(&'static str, Value)>);

    impl Scope for Globals {
        fn lookup(&self, name: &str) -> Option<Value> {
            self.0
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone())
        }

        fn self_value(&self) -> Value {
            Value::Nil
        }

        fn symbol(&self, name: &str) -> Value {
            Value::Symbol(Symbol::new(1, name))
        }
    }

    fn eval(source: &str) -> Result<Value, Exception> {
        let point = RuntimeObject::plain("Point")
            .with_slot("@x", Value::from(3))
            .into_value();
        let list = RuntimeObject::array(vec![Value::from(1), Value::from(2)]).into_value();
        evaluate(source, &Globals(vec![("point", point), ("list", list)]))
    }

    #[test_case("42", Value::from(42) ; "integer")]
    #[test_case("-7", Value::from(-7) ; "negative integer")]
    #[test_case("2.5", Value::from(2.5) ; "float")]
    #[test_case(r#""a\nb""#, Value::from("a\nb") ; "string with escape")]
    #[test_case("nil", Value::Nil ; "nil")]
    #[test_case("undefined", Value::Undefined ; "undefined")]
    #[test_case("point.x", Value::from(3) ; "slot member")]
    #[test_case("list[1]", Value::from(2) ; "index")]
    #[test_case("list[-1]", Value::from(2) ; "negative index")]
    #[test_case("list[5]", Value::Nil ; "index past the end")]
    #[test_case("list.length", Value::from(2) ; "array length")]
    #[test_case(r#"{a: 1, "b" => 2}["b"]"#, Value::from(2) ; "hash literal lookup")]
    fn evaluates(source: &str, expected: Value) {
        assert_eq!(eval(source).expect("evaluates"), expected);
    }

    #[test]
    fn arrays_are_fresh_objects() {
        let value = eval("[1, [2, 3]]").expect("evaluates");
        let object = value.as_object().expect("object");
        assert_eq!(object.elements().len(), 2);
    }

    #[test_case("raise ZeroDivisionError, \"divided by 0\"", "ZeroDivisionError", "divided by 0" ; "class and message")]
    #[test_case("raise \"boom\"", "RuntimeError", "boom" ; "message only")]
    #[test_case("missing", "NameError", "undefined local variable or method `missing' for main" ; "unknown local")]
    #[test_case("Missing", "NameError", "uninitialized constant Missing" ; "unknown constant")]
    #[test_case("point.z", "NoMethodError", "undefined method `z' for #<Point>" ; "unknown member")]
    #[test_case("[1,", "SyntaxError", "unexpected end of input" ; "truncated input")]
    fn raises(source: &str, class_name: &str, message: &str) {
        let exception = eval(source).expect_err("raises");
        assert_eq!(exception.class_name, class_name);
        assert_eq!(exception.message, message);
        assert!(exception.value.as_object().is_some());
    }

    #[test_case(&"[".repeat(200_000) ; "open brackets")]
    #[test_case(&format!("point{}", ".x".repeat(200_000)) ; "member chain")]
    #[test_case(&format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000)) ; "parentheses")]
    fn deep_nesting_is_a_syntax_error(source: &str) {
        let exception = eval(source).expect_err("too deep");
        assert_eq!(exception.class_name, "SyntaxError");
        assert_eq!(
            exception.message,
            format!("expression nested too deeply (more than {MAX_NESTING} levels)")
        );
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let source = format!("{}1{}", "[".repeat(60), "]".repeat(60));
        assert!(eval(&source).is_ok());
    }
}
