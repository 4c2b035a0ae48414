// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/script/parser.rs
//!
//! Scenario script parser
//!
//! A scenario declares bindings and a timeline of key events, one
//! statement per line:
//!
//! ```text
//! # comment
//! bind down "ctrl shift k" as save ordered
//! at 0 down Control ctrl
//! at 20 down K ctrl shift
//! at 40 down " "
//! tick 600
//! ```
//!
//! # Architecture
//! Each line is parsed with nom combinators into raw words, then the
//! words are interpreted (flags, modifiers) with line numbers attached
//! for error reporting.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::{char, digit1, space1},
    combinator::{map, map_res},
    multi::many0,
    sequence::{delimited, preceded},
    IResult, Parser,
};

use crate::config::BindingOptions;
use crate::core::types::{EventType, KeyEvent};
use crate::script::ScriptError;

/// One parsed line
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// `bind <event> "<combo>" as <name> [flag]*`
    Bind {
        name: String,
        event_type: EventType,
        combo: String,
        options: BindingOptions,
    },
    /// `at <ms> <event> <key> [modifier]*`
    Press {
        at_ms: u64,
        event_type: EventType,
        event: KeyEvent,
    },
    /// `tick <ms>`
    Tick { at_ms: u64 },
}

/// Statement with the line it came from (1-based)
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub number: usize,
    pub statement: Statement,
}

/// Parses a complete scenario
///
/// Blank lines and `#` comments are skipped. Event times must never
/// decrease.
pub fn parse_script(content: &str) -> Result<Vec<Line>, ScriptError> {
    let mut lines = Vec::new();
    let mut last_ms = 0;

    for (index, raw) in content.lines().enumerate() {
        let number = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let statement = parse_statement(trimmed, number)?;

        if let Statement::Press { at_ms, .. } | Statement::Tick { at_ms } = &statement {
            if *at_ms < last_ms {
                return Err(ScriptError::OutOfOrder {
                    line: number,
                    at_ms: *at_ms,
                    previous_ms: last_ms,
                });
            }
            last_ms = *at_ms;
        }

        lines.push(Line { number, statement });
    }

    Ok(lines)
}

/// Parses one non-empty, non-comment line
pub fn parse_statement(input: &str, line: usize) -> Result<Statement, ScriptError> {
    let syntax = |message: String| ScriptError::InvalidSyntax { line, message };

    let (rest, statement) = alt((bind_line, at_line, tick_line))
        .parse(input)
        .map_err(|e| syntax(format!("{:?}", e)))?;

    if !rest.trim().is_empty() {
        return Err(syntax(format!("unexpected trailing input '{}'", rest.trim())));
    }

    match statement {
        RawStatement::Bind {
            event_type,
            combo,
            name,
            flags,
        } => {
            let mut options = BindingOptions::new();
            for flag in flags {
                options = apply_flag(options, flag).ok_or_else(|| ScriptError::UnknownFlag {
                    line,
                    flag: flag.to_string(),
                })?;
            }
            Ok(Statement::Bind {
                name: name.to_string(),
                event_type,
                combo: combo.to_string(),
                options,
            })
        }
        RawStatement::Press {
            at_ms,
            event_type,
            key,
            modifiers,
        } => {
            let mut event = KeyEvent::new(key);
            for modifier in modifiers {
                event = match modifier {
                    "ctrl" => event.with_ctrl(),
                    "alt" => event.with_alt(),
                    "shift" => event.with_shift(),
                    "meta" => event.with_meta(),
                    other => {
                        return Err(ScriptError::UnknownFlag {
                            line,
                            flag: other.to_string(),
                        })
                    }
                };
            }
            Ok(Statement::Press {
                at_ms,
                event_type,
                event,
            })
        }
        RawStatement::Tick { at_ms } => Ok(Statement::Tick { at_ms }),
    }
}

fn apply_flag(options: BindingOptions, flag: &str) -> Option<BindingOptions> {
    let options = match flag {
        "ordered" => options.ordered(true),
        "unordered" => options.ordered(false),
        "repeatable" => options.repeatable(true),
        "exclusive" => options.exclusive(true),
        "shared" => options.exclusive(false),
        "capture" => options.use_capture(true),
        "ctrl" => options.ctrl(),
        "alt" => options.alt(),
        "shift" => options.shift(),
        "meta" => options.meta(),
        _ => return None,
    };
    Some(options)
}

/// Line shape before flags and modifiers are interpreted
enum RawStatement<'a> {
    Bind {
        event_type: EventType,
        combo: &'a str,
        name: &'a str,
        flags: Vec<&'a str>,
    },
    Press {
        at_ms: u64,
        event_type: EventType,
        key: &'a str,
        modifiers: Vec<&'a str>,
    },
    Tick {
        at_ms: u64,
    },
}

/// Parse event type (keydown, keyup, down, up)
///
/// `keydown`/`keyup` are tried before their short forms.
pub fn event_type(input: &str) -> IResult<&str, EventType> {
    map(
        alt((tag("keydown"), tag("keyup"), tag("down"), tag("up"))),
        |s: &str| match s {
            "keydown" | "down" => EventType::KeyDown,
            _ => EventType::KeyUp,
        },
    )
    .parse(input)
}

/// Parse a double-quoted string, which may contain spaces
pub fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till1(|c: char| c == '"'), char('"')).parse(input)
}

/// Parse a key name: quoted (`" "`) or a bare word
pub fn key_name(input: &str) -> IResult<&str, &str> {
    alt((quoted, word)).parse(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace()).parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-').parse(input)
}

fn millis(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |digits: &str| digits.parse::<u64>()).parse(input)
}

fn trailing_words(input: &str) -> IResult<&str, Vec<&str>> {
    many0(preceded(space1, word)).parse(input)
}

fn bind_line(input: &str) -> IResult<&str, RawStatement<'_>> {
    let (input, _) = (tag("bind"), space1).parse(input)?;
    let (input, event_type) = event_type(input)?;
    let (input, combo) = preceded(space1, quoted).parse(input)?;
    let (input, name) = preceded((space1, tag("as"), space1), identifier).parse(input)?;
    let (input, flags) = trailing_words(input)?;

    Ok((
        input,
        RawStatement::Bind {
            event_type,
            combo,
            name,
            flags,
        },
    ))
}

fn at_line(input: &str) -> IResult<&str, RawStatement<'_>> {
    let (input, _) = (tag("at"), space1).parse(input)?;
    let (input, at_ms) = millis(input)?;
    let (input, event_type) = preceded(space1, event_type).parse(input)?;
    let (input, key) = preceded(space1, key_name).parse(input)?;
    let (input, modifiers) = trailing_words(input)?;

    Ok((
        input,
        RawStatement::Press {
            at_ms,
            event_type,
            key,
            modifiers,
        },
    ))
}

fn tick_line(input: &str) -> IResult<&str, RawStatement<'_>> {
    let (input, _) = (tag("tick"), space1).parse(input)?;
    let (input, at_ms) = millis(input)?;

    Ok((input, RawStatement::Tick { at_ms }))
}
