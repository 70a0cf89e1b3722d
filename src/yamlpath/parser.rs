//! YAMLPath query string parser.

use super::ast::{Comparison, Condition, Filter, Literal, PathSegment, Pattern, YamlPath};
use super::error::YamlPathError;

/// Parser for YAMLPath query strings.
pub struct Parser {
    input: Vec<char>,
    position: usize,
}

impl Parser {
    /// Creates a new parser for the given query string.
    pub fn new(query: &str) -> Self {
        Self {
            input: query.chars().collect(),
            position: 0,
        }
    }

    /// Parses the query string into a YamlPath.
    pub fn parse(query: &str) -> Result<YamlPath, YamlPathError> {
        let mut parser = Parser::new(query);
        let path = parser.parse_path()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(path),
            Some(ch) => Err(YamlPathError::UnexpectedToken {
                position: parser.position,
                found: ch.to_string(),
                expected: "'.' or '['".to_string(),
            }),
        }
    }

    fn parse_path(&mut self) -> Result<YamlPath, YamlPathError> {
        let mut segments = Vec::new();

        self.skip_whitespace();

        // Expect root ($)
        if self.peek() != Some('$') {
            return Err(YamlPathError::InvalidSyntax {
                message: "YAMLPath must start with '$'".to_string(),
            });
        }
        self.next();
        segments.push(PathSegment::Root);

        // Parse remaining segments
        while !self.is_eof() {
            self.skip_whitespace();
            match self.peek() {
                Some('.') => {
                    self.next();
                    if self.peek() == Some('.') {
                        segments.push(self.parse_recursive_descent()?);
                    } else if self.peek() == Some('*') {
                        self.next();
                        segments.push(PathSegment::Wildcard);
                    } else {
                        let name = self.parse_identifier()?;
                        segments.push(PathSegment::Child(name));
                    }
                }
                Some('[') => {
                    segments.push(self.parse_bracket_expression()?);
                }
                _ => break,
            }
        }

        Ok(YamlPath::new(segments))
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    /// Consumes characters while `accept` holds and returns them.
    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let start = self.position;
        while self.peek().is_some_and(&accept) {
            self.position += 1;
        }
        self.input[start..self.position].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Checks if we've reached the end of input.
    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes `keyword` if the input continues with it.
    fn eat(&mut self, keyword: &str) -> bool {
        let len = keyword.chars().count();
        let matches = self
            .input
            .get(self.position..self.position + len)
            .map(|slice| slice.iter().copied().eq(keyword.chars()))
            .unwrap_or(false);
        if matches {
            self.position += len;
        }
        matches
    }

    /// Expects a specific character and advances, or returns an error.
    fn expect(&mut self, expected: char) -> Result<(), YamlPathError> {
        self.skip_whitespace();
        let pos = self.position;
        match self.next() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(YamlPathError::UnexpectedToken {
                position: pos,
                found: ch.to_string(),
                expected: format!("'{}'", expected),
            }),
            None => Err(YamlPathError::UnexpectedEnd {
                expected: format!("'{}'", expected),
            }),
        }
    }

    /// Reads a dotted child name: letters, digits, `_` and `-`.
    fn parse_identifier(&mut self) -> Result<String, YamlPathError> {
        self.skip_whitespace();
        let name = self.take_while(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-');
        if name.is_empty() {
            return Err(match self.peek() {
                Some(ch) => YamlPathError::UnexpectedToken {
                    position: self.position,
                    found: ch.to_string(),
                    expected: "name".to_string(),
                },
                None => YamlPathError::UnexpectedEnd {
                    expected: "name".to_string(),
                },
            });
        }
        Ok(name)
    }

    /// Parses recursive descent (..)
    fn parse_recursive_descent(&mut self) -> Result<PathSegment, YamlPathError> {
        self.expect('.')?;
        if self.peek() == Some('[') {
            Ok(PathSegment::DescendantOrSelf)
        } else if self.peek() == Some('*') {
            self.next();
            Ok(PathSegment::RecursiveDescent(None))
        } else {
            let name = self.parse_identifier()?;
            Ok(PathSegment::RecursiveDescent(Some(name)))
        }
    }

    /// Parses bracket expression: [index], [start:end], ['key'], [*], [?(...)]
    fn parse_bracket_expression(&mut self) -> Result<PathSegment, YamlPathError> {
        self.expect('[')?;
        self.skip_whitespace();

        let segment = match self.peek() {
            Some('*') => {
                self.next();
                self.expect(']')?;
                PathSegment::Wildcard
            }
            Some('?') => {
                let filter = self.parse_filter()?;
                self.expect(']')?;
                PathSegment::Filter(filter)
            }
            Some('\'') | Some('"') => {
                let mut properties = self.parse_bracket_string()?;
                self.expect(']')?;
                if properties.len() == 1 {
                    PathSegment::Child(properties.remove(0))
                } else {
                    PathSegment::MultiProperty(properties)
                }
            }
            Some('-') | Some('0'..='9') => {
                // A ':' before the closing bracket means a slice
                let looks_like_slice = self.input[self.position..]
                    .iter()
                    .take_while(|ch| **ch != ']')
                    .any(|ch| *ch == ':');

                if looks_like_slice {
                    self.parse_slice()?
                } else {
                    let idx = self.parse_bracket_number()?;
                    self.expect(']')?;
                    PathSegment::Index(idx)
                }
            }
            Some(':') => self.parse_slice()?,
            Some(ch) => {
                return Err(YamlPathError::UnexpectedToken {
                    position: self.position,
                    found: ch.to_string(),
                    expected: "index, slice, quoted name, '*' or filter".to_string(),
                })
            }
            None => {
                return Err(YamlPathError::UnexpectedEnd {
                    expected: "bracket expression".to_string(),
                })
            }
        };

        Ok(segment)
    }

    /// Parses a filter: ?(@.a.b), ?(@.a == 'x'), ?(@.a =~ /re/)
    fn parse_filter(&mut self) -> Result<Filter, YamlPathError> {
        self.expect('?')?;
        self.expect('(')?;
        self.expect('@')?;

        let mut path = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('.') => {
                    self.next();
                    path.push(self.parse_identifier()?);
                }
                Some('[') => {
                    self.next();
                    self.skip_whitespace();
                    let mut names = self.parse_bracket_string()?;
                    if names.len() != 1 {
                        return Err(YamlPathError::InvalidSyntax {
                            message: "Filter paths take exactly one key per bracket".to_string(),
                        });
                    }
                    self.expect(']')?;
                    path.push(names.remove(0));
                }
                _ => break,
            }
        }

        self.skip_whitespace();
        let condition = if self.peek() == Some(')') {
            None
        } else {
            Some(self.parse_condition()?)
        };
        self.expect(')')?;

        Ok(Filter { path, condition })
    }

    fn parse_condition(&mut self) -> Result<Condition, YamlPathError> {
        let position = self.position;
        if self.eat("=~") {
            self.skip_whitespace();
            return Ok(Condition::Matches(self.parse_regex()?));
        }
        let comparison = if self.eat("==") {
            Comparison::Eq
        } else if self.eat("!=") {
            Comparison::Ne
        } else if self.eat("<=") {
            Comparison::Le
        } else if self.eat(">=") {
            Comparison::Ge
        } else if self.eat("<") {
            Comparison::Lt
        } else if self.eat(">") {
            Comparison::Gt
        } else {
            return Err(YamlPathError::UnexpectedToken {
                position,
                found: self.peek().map(|c| c.to_string()).unwrap_or_default(),
                expected: "comparison operator".to_string(),
            });
        };
        self.skip_whitespace();
        Ok(Condition::Compare(comparison, self.parse_literal()?))
    }

    fn parse_literal(&mut self) -> Result<Literal, YamlPathError> {
        match self.peek() {
            Some('\'') | Some('"') => self.parse_quoted().map(Literal::String),
            Some('-') | Some('0'..='9') => {
                let sign = if self.eat("-") { "-" } else { "" };
                let text = format!(
                    "{sign}{}",
                    self.take_while(|ch| ch.is_ascii_digit() || ch == '.')
                );
                text.parse::<f64>()
                    .map(Literal::Number)
                    .map_err(|_| YamlPathError::InvalidSyntax {
                        message: format!("Invalid number: {}", text),
                    })
            }
            _ if self.eat("true") => Ok(Literal::Bool(true)),
            _ if self.eat("false") => Ok(Literal::Bool(false)),
            _ if self.eat("null") => Ok(Literal::Null),
            Some(ch) => Err(YamlPathError::UnexpectedToken {
                position: self.position,
                found: ch.to_string(),
                expected: "literal".to_string(),
            }),
            None => Err(YamlPathError::UnexpectedEnd {
                expected: "literal".to_string(),
            }),
        }
    }

    /// Parses /pattern/ with an optional `i` flag.
    fn parse_regex(&mut self) -> Result<Pattern, YamlPathError> {
        self.expect('/')?;
        let mut pattern = String::new();
        loop {
            match self.next() {
                Some('/') => break,
                Some('\\') if self.peek() == Some('/') => {
                    self.next();
                    pattern.push('/');
                }
                Some(ch) => pattern.push(ch),
                None => {
                    return Err(YamlPathError::UnexpectedEnd {
                        expected: "closing '/'".to_string(),
                    })
                }
            }
        }
        if self.peek() == Some('i') {
            self.next();
            pattern.insert_str(0, "(?i)");
        }
        Pattern::new(&pattern).map_err(|e| YamlPathError::InvalidRegex {
            pattern,
            message: e.to_string(),
        })
    }

    /// Parses one or more comma separated quoted names: `'a'` or `'a', "b"`.
    fn parse_bracket_string(&mut self) -> Result<Vec<String>, YamlPathError> {
        let mut properties = vec![self.parse_quoted()?];
        self.skip_whitespace();
        while self.eat(",") {
            properties.push(self.parse_quoted()?);
            self.skip_whitespace();
        }
        Ok(properties)
    }

    /// Reads a single or double quoted string, unescaping `\n`, `\t`, `\r`,
    /// backslashes and both quote characters.
    fn parse_quoted(&mut self) -> Result<String, YamlPathError> {
        self.skip_whitespace();
        let quote = match self.next() {
            Some(ch @ ('\'' | '"')) => ch,
            Some(ch) => {
                return Err(YamlPathError::UnexpectedToken {
                    position: self.position - 1,
                    found: ch.to_string(),
                    expected: "quoted string".to_string(),
                })
            }
            None => {
                return Err(YamlPathError::UnexpectedEnd {
                    expected: "quoted string".to_string(),
                })
            }
        };

        let mut value = String::new();
        loop {
            let ch = self.next().ok_or_else(|| YamlPathError::UnexpectedEnd {
                expected: format!("closing quote {quote}"),
            })?;
            if ch == quote {
                return Ok(value);
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            let unescaped = match self.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some(other @ ('\\' | '\'' | '"')) => other,
                _ => {
                    return Err(YamlPathError::InvalidSyntax {
                        message: "Invalid escape sequence".to_string(),
                    })
                }
            };
            value.push(unescaped);
        }
    }

    /// Reads an optionally negative integer.
    fn parse_bracket_number(&mut self) -> Result<isize, YamlPathError> {
        self.skip_whitespace();
        let start = self.position;
        let negative = self.eat("-");
        let digits = self.take_while(|ch| ch.is_ascii_digit());
        if digits.is_empty() {
            return Err(YamlPathError::InvalidSyntax {
                message: format!("Expected number at position {start}"),
            });
        }
        let magnitude: isize = digits.parse().map_err(|_| YamlPathError::InvalidSyntax {
            message: format!("Number out of range: {digits}"),
        })?;
        Ok(if negative { -magnitude } else { magnitude })
    }

    /// Parses a slice body after `[`: `start:end`, `start:`, `:end` or `:`.
    fn parse_slice(&mut self) -> Result<PathSegment, YamlPathError> {
        let bound = |parser: &mut Self, terminator: char| {
            parser.skip_whitespace();
            if parser.peek() == Some(terminator) {
                Ok(None)
            } else {
                parser.parse_bracket_number().map(Some)
            }
        };

        let start = bound(self, ':')?;
        self.expect(':')?;
        let end = bound(self, ']')?;
        self.expect(']')?;

        match (start, end) {
            (Some(s), Some(e)) if s >= 0 && e >= 0 && s > e => Err(YamlPathError::InvalidSyntax {
                message: format!("Invalid slice: start ({s}) > end ({e})"),
            }),
            _ => Ok(PathSegment::Slice(start, end)),
        }
    }
}
