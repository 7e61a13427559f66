use std::iter::Peekable;
use std::str::Chars;

use sc_core::{Command, ParseError, ParseErrorKind, ParseLimits, Property};

/// Receives each command as soon as its closing `]` is read.
///
/// Returning an error stops the parse; no later command is delivered.
pub trait TagSink {
    type Error: From<ParseError>;

    fn accept(&mut self, command: Command) -> Result<(), Self::Error>;
}

impl TagSink for Vec<Command> {
    type Error = ParseError;

    fn accept(&mut self, command: Command) -> Result<(), ParseError> {
        self.push(command);
        Ok(())
    }
}

pub fn parse_tag_document(source: &str) -> Result<Vec<Command>, ParseError> {
    parse_tag_document_with(source, &ParseLimits::default())
}

pub fn parse_tag_document_with(
    source: &str,
    limits: &ParseLimits,
) -> Result<Vec<Command>, ParseError> {
    let mut commands = Vec::new();
    parse_tag_document_into(source, limits, &mut commands)?;
    Ok(commands)
}

pub fn parse_tag_document_into<S>(
    source: &str,
    limits: &ParseLimits,
    sink: &mut S,
) -> Result<(), S::Error>
where
    S: TagSink + ?Sized,
{
    let mut parser = TagParser::new(limits);
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(command) = parser.feed(ch, &mut chars)? {
            sink.accept(command)?;
        }
        if ch == '\n' {
            parser.line += 1;
        }
    }

    if parser.state != State::Init {
        return Err(parser.error(ParseErrorKind::UnexpectedEof).into());
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    TagName,
    PropName,
    PropValueQuote,
    PropValueBody,
}

struct TagParser<'a> {
    limits: &'a ParseLimits,
    state: State,
    line: usize,
    tag_line: usize,
    tag_name: String,
    prop_name: String,
    prop_value: String,
    properties: Vec<Property>,
    emitted: usize,
}

impl<'a> TagParser<'a> {
    fn new(limits: &'a ParseLimits) -> Self {
        Self {
            limits,
            state: State::Init,
            line: 1,
            tag_line: 1,
            tag_name: String::new(),
            prop_name: String::new(),
            prop_value: String::new(),
            properties: Vec::new(),
            emitted: 0,
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.line)
    }

    fn feed(
        &mut self,
        ch: char,
        rest: &mut Peekable<Chars<'_>>,
    ) -> Result<Option<Command>, ParseError> {
        match self.state {
            State::Init => self.feed_init(ch),
            State::TagName => self.feed_tag_name(ch),
            State::PropName => self.feed_prop_name(ch),
            State::PropValueQuote => {
                // Anything before the opening quote is skipped, not rejected.
                if ch == '"' {
                    self.prop_value.clear();
                    self.state = State::PropValueBody;
                }
                Ok(None)
            }
            State::PropValueBody => self.feed_prop_value(ch, rest),
        }
    }

    fn feed_init(&mut self, ch: char) -> Result<Option<Command>, ParseError> {
        match ch {
            '[' => {
                self.tag_name.clear();
                self.properties.clear();
                self.tag_line = self.line;
                self.state = State::TagName;
                Ok(None)
            }
            _ if is_blank(ch) => Ok(None),
            _ => Err(self.error(ParseErrorKind::InvalidCharacter)),
        }
    }

    fn feed_tag_name(&mut self, ch: char) -> Result<Option<Command>, ParseError> {
        if is_blank(ch) {
            if !self.tag_name.is_empty() {
                self.prop_name.clear();
                self.state = State::PropName;
            }
            return Ok(None);
        }

        if ch == ']' {
            if self.tag_name.is_empty() {
                return Err(self.error(ParseErrorKind::InvalidCharacter));
            }
            return self.emit().map(Some);
        }

        if self.tag_name.len() + ch.len_utf8() > self.limits.max_tag_name_len {
            return Err(self.error(ParseErrorKind::TagNameTooLong));
        }
        self.tag_name.push(ch);
        Ok(None)
    }

    fn feed_prop_name(&mut self, ch: char) -> Result<Option<Command>, ParseError> {
        if self.prop_name.is_empty() {
            if is_blank(ch) {
                return Ok(None);
            }
            if ch == ']' {
                return self.emit().map(Some);
            }
        }

        if ch == '=' && !self.prop_name.is_empty() {
            self.state = State::PropValueQuote;
            return Ok(None);
        }

        if !is_name_char(ch) {
            return Err(self.error(ParseErrorKind::InvalidCharacter));
        }
        if self.prop_name.is_empty() && self.properties.len() >= self.limits.max_properties {
            return Err(self.error(ParseErrorKind::TooManyProperties));
        }
        if self.prop_name.len() + 1 > self.limits.max_property_name_len {
            return Err(self.error(ParseErrorKind::PropertyNameTooLong));
        }
        self.prop_name.push(ch);
        Ok(None)
    }

    fn feed_prop_value(
        &mut self,
        ch: char,
        rest: &mut Peekable<Chars<'_>>,
    ) -> Result<Option<Command>, ParseError> {
        let literal = match ch {
            '\\' => match rest.peek().copied() {
                Some('"') => {
                    rest.next();
                    '"'
                }
                Some('n') => {
                    rest.next();
                    '\n'
                }
                Some('\\') => {
                    rest.next();
                    '\\'
                }
                _ => '\\',
            },
            '"' => {
                let name = std::mem::take(&mut self.prop_name);
                let value = std::mem::take(&mut self.prop_value);
                self.properties.push(Property { name, value });
                self.state = State::PropName;
                return Ok(None);
            }
            _ => ch,
        };

        if self.prop_value.len() + literal.len_utf8() > self.limits.max_property_value_len {
            return Err(self.error(ParseErrorKind::PropertyValueTooLong));
        }
        self.prop_value.push(literal);
        Ok(None)
    }

    fn emit(&mut self) -> Result<Command, ParseError> {
        if self.emitted >= self.limits.max_commands {
            return Err(self.error(ParseErrorKind::TooManyCommands));
        }
        self.emitted += 1;
        self.state = State::Init;
        Ok(Command {
            tag_name: std::mem::take(&mut self.tag_name),
            properties: std::mem::take(&mut self.properties),
            line: self.tag_line,
        })
    }
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}
