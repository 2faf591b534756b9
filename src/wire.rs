//! Codec for the bridge channel.
//!
//! One message per connection: `{"callsign":"...","pdc":"..."}` followed by a
//! newline. Values only escape backslash, double quote and newline (`\n`);
//! carriage returns are dropped. This is not JSON: there are no numbers,
//! nesting or unicode escapes, and a backslash before any character other than
//! `n` yields that character.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

use crate::types::BridgeMessage;

const CALLSIGN_KEY: &str = "callsign";
const PDC_KEY: &str = "pdc";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("expected {expected} at byte {position}")]
    Syntax { position: usize, expected: &'static str },

    #[error("unterminated string starting at byte {position}")]
    Unterminated { position: usize },

    #[error("missing \"{0}\" field")]
    MissingField(&'static str),

    #[error("callsign is empty")]
    EmptyCallsign,
}

/// Frame a message for the channel, including the trailing newline
pub fn encode(message: &BridgeMessage) -> String {
    let mut payload = String::with_capacity(message.callsign.len() + message.pdc.len() + 32);

    payload.push_str("{\"");
    payload.push_str(CALLSIGN_KEY);
    payload.push_str("\":\"");
    escape_into(&mut payload, &message.callsign);
    payload.push_str("\",\"");
    payload.push_str(PDC_KEY);
    payload.push_str("\":\"");
    escape_into(&mut payload, &message.pdc);
    payload.push_str("\"}\n");

    payload
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\r' => {}
            '\n' => out.push_str("\\n"),
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

/// Decode one received payload
pub fn decode(bytes: &[u8]) -> Result<BridgeMessage, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::NotUtf8)?;
    let mut scanner = Scanner::new(text);

    let mut callsign = None;
    let mut pdc = None;

    scanner.expect('{', "'{'")?;
    loop {
        let key = scanner.string()?;
        scanner.expect(':', "':'")?;
        let value = scanner.string()?;

        // First occurrence wins
        match key.as_str() {
            CALLSIGN_KEY => {
                callsign.get_or_insert(value);
            }
            PDC_KEY => {
                pdc.get_or_insert(value);
            }
            _ => {}
        }

        if scanner.eat(',') {
            continue;
        }
        scanner.expect('}', "',' or '}'")?;
        break;
    }
    scanner.finish()?;

    let callsign = callsign.ok_or(DecodeError::MissingField(CALLSIGN_KEY))?;
    let pdc = pdc.ok_or(DecodeError::MissingField(PDC_KEY))?;
    if callsign.trim().is_empty() {
        return Err(DecodeError::EmptyCallsign);
    }

    Ok(BridgeMessage { callsign, pdc })
}

struct Scanner<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, chars: text.char_indices().peekable() }
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map_or(self.text.len(), |(index, _)| *index)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, wanted: char) -> bool {
        self.skip_whitespace();
        self.chars.next_if(|(_, c)| *c == wanted).is_some()
    }

    fn expect(&mut self, wanted: char, expected: &'static str) -> Result<(), DecodeError> {
        if self.eat(wanted) {
            Ok(())
        } else {
            Err(DecodeError::Syntax { position: self.position(), expected })
        }
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        self.skip_whitespace();
        let start = self.position();
        if self.chars.next_if(|(_, c)| *c == '"').is_none() {
            return Err(DecodeError::Syntax { position: start, expected: "'\"'" });
        }

        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '"' => return Ok(value),
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                _ => value.push(c),
            }
        }

        Err(DecodeError::Unterminated { position: start })
    }

    /// Only whitespace (the newline hint) may follow the closing brace
    fn finish(&mut self) -> Result<(), DecodeError> {
        self.skip_whitespace();
        match self.chars.peek() {
            None => Ok(()),
            Some((position, _)) => Err(DecodeError::Syntax {
                position: *position,
                expected: "end of message",
            }),
        }
    }
}
