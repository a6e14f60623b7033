//! Compact text notation for whole programs.
//!
//! A program is a list of sections separated by `;`. Each section names a
//! subroutine followed by `:` and whitespace-separated commands:
//!
//! ```text
//! F1: F R g:2 1; F2: L r:F
//! ```
//!
//! `F` moves forward, `L` and `R` turn, and the digits `1` to `3` call the
//! matching subroutine. A `color:` prefix makes the command conditional,
//! using a full color name or one of the short forms `g` (green), `r` or `b`.

use algorun_core::{Color, CommandKind, Subroutine};
use thiserror::Error;

/// One command in command-source label form, bound to its subroutine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ProgramLine {
    pub(crate) subroutine: Subroutine,
    pub(crate) kind: String,
    pub(crate) condition: Option<String>,
}

/// Errors raised while reading program notation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ProgramParseError {
    #[error("program section `{section}` does not start with `F1:`, `F2:` or `F3:`")]
    MissingSubroutine { section: String },
    #[error("unknown subroutine `{name}`")]
    UnknownSubroutine { name: String },
    #[error("{subroutine} appears in more than one section")]
    DuplicateSubroutine { subroutine: Subroutine },
    #[error("unknown command `{token}`")]
    UnknownCommand { token: String },
    #[error("unknown color `{color}` in `{token}`")]
    UnknownColor { token: String, color: String },
}

/// Parses `notation` into commands in queue order.
pub(crate) fn parse(notation: &str) -> Result<Vec<ProgramLine>, ProgramParseError> {
    let mut lines = Vec::new();
    let mut seen = Vec::new();

    for section in notation.split(';').map(str::trim) {
        if section.is_empty() {
            continue;
        }
        let Some((name, body)) = section.split_once(':') else {
            return Err(ProgramParseError::MissingSubroutine {
                section: section.to_owned(),
            });
        };
        let subroutine = Subroutine::from_label(name).ok_or_else(|| {
            ProgramParseError::UnknownSubroutine {
                name: name.trim().to_owned(),
            }
        })?;
        if seen.contains(&subroutine) {
            return Err(ProgramParseError::DuplicateSubroutine { subroutine });
        }
        seen.push(subroutine);

        for token in body.split_whitespace() {
            let (condition, operation) = parse_token(token)?;
            lines.push(ProgramLine {
                subroutine,
                kind: operation.label().to_owned(),
                condition: condition.map(|color| color.label().to_owned()),
            });
        }
    }

    Ok(lines)
}

fn parse_token(token: &str) -> Result<(Option<Color>, CommandKind), ProgramParseError> {
    let (color, operation) = match token.split_once(':') {
        Some((color, operation)) => (Some(color), operation),
        None => (None, token),
    };

    let condition = color
        .map(|label| {
            parse_color(label).ok_or_else(|| ProgramParseError::UnknownColor {
                token: token.to_owned(),
                color: label.to_owned(),
            })
        })
        .transpose()?;

    let kind = match operation {
        "F" | "f" => CommandKind::MoveForward,
        "L" | "l" => CommandKind::TurnLeft,
        "R" | "r" => CommandKind::TurnRight,
        "1" => CommandKind::Call(Subroutine::F1),
        "2" => CommandKind::Call(Subroutine::F2),
        "3" => CommandKind::Call(Subroutine::F3),
        _ => {
            return Err(ProgramParseError::UnknownCommand {
                token: token.to_owned(),
            })
        }
    };

    Ok((condition, kind))
}

fn parse_color(label: &str) -> Option<Color> {
    match label {
        "g" => Some(Color::Green),
        "r" => Some(Color::Red),
        "b" => Some(Color::Blue),
        _ => Color::from_label(label),
    }
}
