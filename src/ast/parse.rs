//! Hand-written scanner for path expressions.
//!
//! The input is treated as free text with expressions framed by `{` and
//! `}`; the public façade brackets user input before handing it here. The
//! scanner keeps byte positions (`pos`/`start`/`width`) and decodes one
//! rune at a time, so multi-byte code points pass through untouched.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{FilterNode, Node, ParamEntry};
use crate::error::ParseError;

const LEFT_DELIM: &str = "{";
const RIGHT_DELIM: &str = "}";

static DICT_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^['"](.*)['"]$"#).expect("dict key pattern"));
static SLICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d*)(:-?\d*)?(:-?\d*)?$").expect("slice pattern"));
static FILTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^!<>=]+)([!<>=]+)(.+?)$").expect("filter pattern"));

/// Parse delimiter-framed text into the outer node list. Characters
/// outside `{…}` become [`Node::Text`] entries.
pub(crate) fn parse(text: &str) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser::new(text);
    parser.parse_text()?;
    Ok(parser.root)
}

/// Parse a bare expression by framing it in delimiters, returning the
/// expression's own node list.
pub(crate) fn parse_action(text: &str) -> Result<Vec<Node>, ParseError> {
    let root = parse(&format!("{LEFT_DELIM}{text}{RIGHT_DELIM}"))?;
    match root.into_iter().next() {
        Some(Node::List(list)) => Ok(list),
        // A braced input always starts with its action list.
        _ => Err(ParseError::UnclosedAction),
    }
}

struct Parser {
    input: String,
    root: Vec<Node>,
    pos: usize,
    start: usize,
    width: usize,
}

impl Parser {
    fn new(input: &str) -> Parser {
        Parser {
            input: input.to_string(),
            root: Vec::new(),
            pos: 0,
            start: 0,
            width: 0,
        }
    }

    /// Return the next rune, or `None` at end of input.
    fn next(&mut self) -> Option<char> {
        let rest = &self.input[self.pos..];
        match rest.chars().next() {
            Some(r) => {
                self.width = r.len_utf8();
                self.pos += self.width;
                Some(r)
            }
            None => {
                self.width = 0;
                None
            }
        }
    }

    /// Return but do not consume the next rune.
    fn peek(&mut self) -> Option<char> {
        let r = self.next();
        self.backup();
        r
    }

    /// Step back one rune. Valid once per call of `next`.
    fn backup(&mut self) {
        self.pos -= self.width;
    }

    /// Return the text scanned since the last call, advancing the mark.
    fn consume_text(&mut self) -> String {
        let value = self.input[self.start..self.pos].to_string();
        self.start = self.pos;
        value
    }

    fn has_prefix(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    /// The byte immediately before the rune just consumed; used for the
    /// quote-escape checks, where the quote itself is one byte wide.
    fn prev_byte(&self) -> u8 {
        self.input.as_bytes()[self.pos - 2]
    }

    fn parse_text(&mut self) -> Result<(), ParseError> {
        loop {
            if self.has_prefix(LEFT_DELIM) {
                if self.pos > self.start {
                    let text = self.consume_text();
                    self.root.push(Node::Text(text));
                }
                self.parse_left_delim()?;
                continue;
            }
            if self.next().is_none() {
                break;
            }
        }
        if self.pos > self.start {
            let text = self.consume_text();
            self.root.push(Node::Text(text));
        }
        Ok(())
    }

    fn parse_left_delim(&mut self) -> Result<(), ParseError> {
        self.pos += LEFT_DELIM.len();
        self.consume_text();
        let mut action = Vec::new();
        self.parse_inside_action(&mut action)?;
        self.root.push(Node::List(action));
        Ok(())
    }

    fn parse_inside_action(&mut self, cur: &mut Vec<Node>) -> Result<(), ParseError> {
        loop {
            if self.has_prefix(RIGHT_DELIM) {
                self.pos += RIGHT_DELIM.len();
                self.consume_text();
                return Ok(());
            }
            if self.has_prefix("[?(") {
                self.parse_filter(cur)?;
                continue;
            }
            if self.has_prefix("..") {
                self.parse_recursive(cur)?;
                continue;
            }

            match self.next() {
                None | Some('\r' | '\n') => return Err(ParseError::UnclosedAction),
                Some(' ') => {
                    self.consume_text();
                }
                // Positioning markers for the current object; they emit nothing.
                Some('@' | '$') => {
                    self.consume_text();
                }
                Some('[') => self.parse_array(cur)?,
                Some(r @ ('"' | '\'')) => self.parse_quote(cur, r)?,
                Some('.') => self.parse_field(cur)?,
                Some(r) if r == '+' || r == '-' || r.is_numeric() => {
                    self.backup();
                    self.parse_number(cur)?;
                }
                Some(r) if is_alphanumeric(r) => {
                    self.backup();
                    self.parse_identifier(cur)?;
                }
                Some(r) => return Err(ParseError::UnrecognizedCharacter(r)),
            }
        }
    }

    fn parse_identifier(&mut self, cur: &mut Vec<Node>) -> Result<(), ParseError> {
        loop {
            let r = self.next();
            if is_terminator(r) {
                self.backup();
                break;
            }
        }
        let value = self.consume_text();
        match value.as_str() {
            "true" => cur.push(Node::Bool(true)),
            "false" => cur.push(Node::Bool(false)),
            _ => cur.push(Node::Ident(value)),
        }
        Ok(())
    }

    fn parse_recursive(&mut self, cur: &mut Vec<Node>) -> Result<(), ParseError> {
        if matches!(cur.last(), Some(Node::Recursive)) {
            return Err(ParseError::MultipleRecursive);
        }
        self.pos += "..".len();
        self.consume_text();
        cur.push(Node::Recursive);
        // A name or wildcard straight after `..` belongs to it as a field.
        if self
            .peek()
            .is_some_and(|r| is_alphanumeric(r) || r == '*')
        {
            return self.parse_field(cur);
        }
        Ok(())
    }

    fn parse_number(&mut self, cur: &mut Vec<Node>) -> Result<(), ParseError> {
        if matches!(self.peek(), Some('+' | '-')) {
            self.next();
        }
        loop {
            match self.next() {
                Some(r) if r == '.' || r.is_numeric() => {}
                _ => {
                    self.backup();
                    break;
                }
            }
        }
        let value = self.consume_text();
        if let Ok(i) = value.parse::<i64>() {
            cur.push(Node::Int(i));
            return Ok(());
        }
        if let Ok(f) = value.parse::<f64>() {
            cur.push(Node::Float(f));
            return Ok(());
        }
        Err(ParseError::InvalidNumber(value))
    }

    /// Scan forward to the next unescaped occurrence of `r`.
    fn find_next_rune(&mut self, r: char) -> Result<(), ParseError> {
        let mut escape = false;
        loop {
            match self.next() {
                Some(c) if c == r && !escape => return Ok(()),
                Some('\\') if !escape => escape = true,
                None => return Err(ParseError::UnmatchedQuote(r)),
                Some(_) => escape = false,
            }
        }
    }

    fn parse_array(&mut self, cur: &mut Vec<Node>) -> Result<(), ParseError> {
        loop {
            match self.next() {
                None | Some('\n') => return Err(ParseError::UnterminatedArray),
                Some(r @ ('"' | '\'')) => self.find_next_rune(r)?,
                Some(']') => break,
                Some(_) => {}
            }
        }
        let text = self.consume_text();
        // Both brackets are single bytes.
        let text = &text[1..text.len() - 1];
        if text == "*" {
            cur.push(Node::Wildcard);
            return Ok(());
        }

        let pieces = split_by_comma(text);
        if pieces.len() > 1 {
            let mut union = Vec::new();
            for piece in &pieces {
                union.push(parse_action(&format!("[{}]", piece.trim_matches(' ')))?);
            }
            cur.push(Node::Union(union));
            return Ok(());
        }

        let text = text.trim();
        if let Some(caps) = DICT_KEY_RE.captures(text) {
            cur.push(Node::Field(caps[1].to_string()));
            return Ok(());
        }

        let Some(caps) = SLICE_RE.captures(text) else {
            return Err(ParseError::InvalidArrayIndex(text.to_string()));
        };
        let groups: [&str; 3] = [1, 2, 3].map(|i| caps.get(i).map_or("", |m| m.as_str()));
        let bad_index = || ParseError::InvalidArrayIndex(text.to_string());

        if groups[1].is_empty() && groups[2].is_empty() {
            let entry = if groups[0].is_empty() {
                ParamEntry::unknown()
            } else {
                ParamEntry::known(groups[0].parse().map_err(|_| bad_index())?)
            };
            cur.push(Node::Element(entry));
            return Ok(());
        }

        let mut params = [ParamEntry::unknown(); 3];
        for (i, group) in groups.into_iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            let group = if i > 0 { &group[1..] } else { group };
            if group.is_empty() {
                continue;
            }
            params[i] = ParamEntry::known(group.parse().map_err(|_| bad_index())?);
        }
        cur.push(Node::Slice(params));
        Ok(())
    }

    fn parse_filter(&mut self, cur: &mut Vec<Node>) -> Result<(), ParseError> {
        self.pos += "[?(".len();
        self.consume_text();
        // At most one balanced pair of quotes may appear; `)` inside it is
        // not the closer.
        let mut begin = false;
        let mut end = false;
        let mut pair = '"';
        loop {
            match self.next() {
                None | Some('\n') => return Err(ParseError::UnterminatedFilter),
                Some(r @ ('"' | '\'')) => {
                    if !begin {
                        begin = true;
                        pair = r;
                        continue;
                    }
                    if self.prev_byte() != b'\\' && r == pair {
                        end = true;
                    }
                }
                Some(')') => {
                    if begin == end {
                        break;
                    }
                }
                Some(_) => {}
            }
        }
        if self.next() != Some(']') {
            return Err(ParseError::ExpectedFilterClose);
        }
        let text = self.consume_text();
        let text = &text[..text.len() - 2];

        match FILTER_RE.captures(text) {
            None => {
                let left = parse_action(text)?;
                cur.push(Node::Filter(Box::new(FilterNode {
                    left,
                    right: Vec::new(),
                    op: "exists".to_string(),
                })));
            }
            Some(caps) => {
                let left = parse_action(&caps[1])?;
                let right = parse_action(&caps[3])?;
                cur.push(Node::Filter(Box::new(FilterNode {
                    left,
                    right,
                    op: caps[2].to_string(),
                })));
            }
        }
        Ok(())
    }

    fn parse_quote(&mut self, cur: &mut Vec<Node>, end: char) -> Result<(), ParseError> {
        loop {
            match self.next() {
                None | Some('\n') => return Err(ParseError::UnterminatedString),
                Some(r) if r == end => {
                    if self.prev_byte() != b'\\' {
                        break;
                    }
                }
                Some(_) => {}
            }
        }
        let value = self.consume_text();
        let unquoted = unquote_extend(&value)?;
        cur.push(Node::Text(unquoted));
        Ok(())
    }

    fn parse_field(&mut self, cur: &mut Vec<Node>) -> Result<(), ParseError> {
        self.consume_text();
        while self.advance() {}
        let value = self.consume_text();
        if value == "*" {
            cur.push(Node::Wildcard);
        } else {
            cur.push(Node::Field(value.replace('\\', "")));
        }
        Ok(())
    }

    /// Scan one rune of a field name; a backslash escapes the rune after it.
    fn advance(&mut self) -> bool {
        let r = self.next();
        if r == Some('\\') {
            self.next();
            return true;
        }
        if is_terminator(r) {
            self.backup();
            return false;
        }
        true
    }
}

/// Split on commas that sit outside quoted runs. An unbalanced quote makes
/// the whole split void.
fn split_by_comma(text: &str) -> Vec<String> {
    let runes: Vec<char> = text.chars().collect();
    let mut result = Vec::new();
    let mut base = 0;
    let mut i = 0;
    while i < runes.len() {
        if runes[i] == ',' {
            result.push(runes[base..i].iter().collect());
            base = i + 1;
        } else if runes[i] == '\'' || runes[i] == '"' {
            match find_rune(&runes[i + 1..], runes[i]) {
                Some(next) => i += next + 1,
                None => return Vec::new(),
            }
        }
        i += 1;
    }
    result.push(runes[base..].iter().collect());
    result
}

fn find_rune(runes: &[char], target: char) -> Option<usize> {
    let mut escape = false;
    for (i, &r) in runes.iter().enumerate() {
        if r == target && !escape {
            return Some(i);
        } else if r == '\\' && !escape {
            escape = true;
        } else {
            escape = false;
        }
    }
    None
}

/// Whether the rune may end an identifier or field name.
fn is_terminator(r: Option<char>) -> bool {
    match r {
        None => true,
        Some(r) => matches!(
            r,
            ' ' | '\t' | '\r' | '\n' | '.' | ',' | '[' | ']' | '$' | '@' | '{' | '}'
        ),
    }
}

fn is_alphanumeric(r: char) -> bool {
    r == '_' || r.is_alphanumeric()
}

/// Strip matching quotes (single or double) and process escapes. Like the
/// standard unquoting but single-quoted strings are full strings, not
/// single runes.
fn unquote_extend(s: &str) -> Result<String, ParseError> {
    let bad = || ParseError::InvalidQuotedString(s.to_string());
    let bytes = s.as_bytes();
    if s.len() < 2 {
        return Err(bad());
    }
    let quote = bytes[0];
    if quote != bytes[s.len() - 1] || (quote != b'"' && quote != b'\'') {
        return Err(bad());
    }
    let inner = &s[1..s.len() - 1];
    if !inner.contains('\\') && !inner.contains(quote as char) {
        return Ok(inner.to_string());
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            if c == quote as char {
                return Err(bad());
            }
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('x') => out.push(hex_escape(&mut chars, 2).ok_or_else(bad)?),
            Some('u') => out.push(hex_escape(&mut chars, 4).ok_or_else(bad)?),
            _ => return Err(bad()),
        }
    }
    Ok(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, len: usize) -> Option<char> {
    let mut value = 0;
    for _ in 0..len {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}
