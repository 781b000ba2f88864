use crate::error::{DocIndexError, Result};

/// Value of the JavaScript array literal subset used by search shards
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    List(Vec<Value>),
    Str(String),
    Int(i64),
}

impl Value {
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }
}

struct Scanner<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Scanner<'a> {
    fn error(&self, message: impl Into<String>) -> DocIndexError {
        DocIndexError::Syntax {
            offset: self.position,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.position += rest.len() - rest.trim_start().len();
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(found) if found == expected => {
                self.position += found.len_utf8();
                Ok(())
            }
            Some(found) => Err(self.error(format!("expected '{expected}', found '{found}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.list(),
            Some(quote @ ('\'' | '"')) => self.string(quote).map(Value::Str),
            Some(c) if c == '-' || c.is_ascii_digit() => self.integer(),
            Some(found) => Err(self.error(format!("unexpected '{found}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn list(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.position += 1;
                return Ok(Value::List(items));
            }
            items.push(self.value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.position += 1,
                Some(']') => {}
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String> {
        let start = self.position;
        self.position += quote.len_utf8();
        let mut value = String::new();
        let mut chars = self.rest().char_indices();

        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    self.position += offset + c.len_utf8();
                    return Ok(value);
                }
                c => value.push(c),
            }
        }

        self.position = start;
        Err(self.error("unterminated string"))
    }

    fn integer(&mut self) -> Result<Value> {
        let rest = self.rest();
        let length = rest
            .char_indices()
            .find(|&(index, c)| !(c.is_ascii_digit() || (index == 0 && c == '-')))
            .map_or(rest.len(), |(index, _)| index);
        let value = rest[..length]
            .parse()
            .map_err(|_| self.error(format!("invalid integer '{}'", &rest[..length])))?;
        self.position += length;
        Ok(Value::Int(value))
    }
}

/// Parse `var name = [...];`, or a bare array literal
pub(crate) fn parse_assignment(text: &str) -> Result<Value> {
    let mut scanner = Scanner { text, position: 0 };
    scanner.skip_whitespace();

    if scanner.rest().starts_with("var ") {
        let equals = scanner
            .rest()
            .find('=')
            .ok_or_else(|| scanner.error("expected '=' after variable name"))?;
        scanner.position += equals + 1;
    }

    let value = scanner.value()?;
    scanner.skip_whitespace();
    if scanner.peek() == Some(';') {
        scanner.position += 1;
        scanner.skip_whitespace();
    }
    if scanner.peek().is_some() {
        return Err(scanner.error("trailing content"));
    }

    Ok(value)
}
