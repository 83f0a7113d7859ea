// (C) 2025 - Enzo Lombardi

//! Command parser - the compact command grammar.
//!
//! `parse` is a pure function from the raw buffer text (sentinel
//! included) to a [`ParsedCommand`]. Unknown tokens yield `None`;
//! nothing here mutates state.
//!
//! Grammar, after the leading sentinel:
//! - `NN` digits: preset N for the active pattern
//! - `fN` / `FN`: load / save favorite slot N; `fl` lists favorites
//! - `pN`, `pNAME` (optional `.M` preset suffix); lone `p` lists
//! - `tN`, `tNAME`; lone `t` lists; `tr` picks a random theme
//! - `*` random preset, `**` random everything
//! - `?` presets of the active pattern, `??` full catalogue
//! - `r` randomize, `s` save config, `x` reset pattern
//! - `h` history, `\` undo, `.` repeat (reserved)
//! - `!` (+seconds) shuffle presets, `!!` shuffle everything
//! - `/TERM` searches patterns and themes
//! - `A+B+C` runs parts in order; unparsable parts are dropped

use super::buffer::SENTINEL;

/// A pattern or theme selector: 1-based index or case-insensitive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Index(u32),
    Name(String),
}

impl Target {
    fn parse(text: &str) -> Target {
        match text.parse::<u32>() {
            Ok(n) => Target::Index(n),
            Err(_) => Target::Name(text.to_string()),
        }
    }

    fn canonical(&self) -> String {
        match self {
            Target::Index(n) => n.to_string(),
            Target::Name(name) => name.clone(),
        }
    }
}

/// Enumerated one-shot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKind {
    ListPresets,
    CatalogAll,
    ListPatterns,
    ListThemes,
    ListFavorites,
    RandomPreset,
    RandomAll,
    RandomTheme,
    Randomize,
    SaveConfig,
    ResetPattern,
    Shuffle,
    ShuffleAll,
    Search,
    History,
    Undo,
    Repeat,
}

impl SpecialKind {
    fn token(self) -> &'static str {
        match self {
            SpecialKind::ListPresets => "?",
            SpecialKind::CatalogAll => "??",
            SpecialKind::ListPatterns => "p",
            SpecialKind::ListThemes => "t",
            SpecialKind::ListFavorites => "fl",
            SpecialKind::RandomPreset => "*",
            SpecialKind::RandomAll => "**",
            SpecialKind::RandomTheme => "tr",
            SpecialKind::Randomize => "r",
            SpecialKind::SaveConfig => "s",
            SpecialKind::ResetPattern => "x",
            SpecialKind::Shuffle => "!",
            SpecialKind::ShuffleAll => "!!",
            SpecialKind::Search => "/",
            SpecialKind::History => "h",
            SpecialKind::Undo => "\\",
            SpecialKind::Repeat => ".",
        }
    }
}

/// A parsed command; each variant keeps the raw text it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Preset {
        number: u32,
        raw: String,
    },
    FavoriteLoad {
        slot: u32,
        raw: String,
    },
    FavoriteSave {
        slot: u32,
        raw: String,
    },
    Pattern {
        target: Target,
        preset: Option<u32>,
        raw: String,
    },
    Theme {
        target: Target,
        raw: String,
    },
    Special {
        kind: SpecialKind,
        arg: Option<String>,
        raw: String,
    },
    Combination {
        parts: Vec<ParsedCommand>,
        raw: String,
    },
}

impl ParsedCommand {
    /// Format back to grammar text (no sentinel); re-parses to the same
    /// variant.
    pub fn canonical(&self) -> String {
        match self {
            ParsedCommand::Preset { number, .. } => number.to_string(),
            ParsedCommand::FavoriteLoad { slot, .. } => format!("f{}", slot),
            ParsedCommand::FavoriteSave { slot, .. } => format!("F{}", slot),
            ParsedCommand::Pattern { target, preset, .. } => match preset {
                Some(p) => format!("p{}.{}", target.canonical(), p),
                None => format!("p{}", target.canonical()),
            },
            ParsedCommand::Theme { target, .. } => format!("t{}", target.canonical()),
            ParsedCommand::Special { kind, arg, .. } => match arg {
                Some(arg) => format!("{}{}", kind.token(), arg),
                None => kind.token().to_string(),
            },
            ParsedCommand::Combination { parts, .. } => parts
                .iter()
                .map(ParsedCommand::canonical)
                .collect::<Vec<_>>()
                .join("+"),
        }
    }
}

/// Parse raw command-buffer text. `None` for empty input, a lone
/// sentinel, or an unknown token.
pub fn parse(input: &str) -> Option<ParsedCommand> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let body = trimmed.strip_prefix(SENTINEL).unwrap_or(trimmed);
    if body.is_empty() {
        return None;
    }

    // Search consumes everything after the slash, '+' included.
    if let Some(term) = body.strip_prefix('/') {
        if term.is_empty() {
            return None;
        }
        return Some(ParsedCommand::Special {
            kind: SpecialKind::Search,
            arg: Some(term.to_string()),
            raw: trimmed.to_string(),
        });
    }

    if body.contains('+') {
        let parts: Vec<ParsedCommand> = body
            .split('+')
            .map(str::trim)
            .filter_map(parse_one)
            .collect();
        if parts.is_empty() {
            return None;
        }
        return Some(ParsedCommand::Combination {
            parts,
            raw: trimmed.to_string(),
        });
    }

    parse_one(body).map(|cmd| with_raw(cmd, trimmed))
}

fn with_raw(cmd: ParsedCommand, raw: &str) -> ParsedCommand {
    match cmd {
        ParsedCommand::Preset { number, .. } => ParsedCommand::Preset {
            number,
            raw: raw.to_string(),
        },
        ParsedCommand::FavoriteLoad { slot, .. } => ParsedCommand::FavoriteLoad {
            slot,
            raw: raw.to_string(),
        },
        ParsedCommand::FavoriteSave { slot, .. } => ParsedCommand::FavoriteSave {
            slot,
            raw: raw.to_string(),
        },
        ParsedCommand::Pattern { target, preset, .. } => ParsedCommand::Pattern {
            target,
            preset,
            raw: raw.to_string(),
        },
        ParsedCommand::Theme { target, .. } => ParsedCommand::Theme {
            target,
            raw: raw.to_string(),
        },
        ParsedCommand::Special { kind, arg, .. } => ParsedCommand::Special {
            kind,
            arg,
            raw: raw.to_string(),
        },
        combination @ ParsedCommand::Combination { .. } => combination,
    }
}

fn special(kind: SpecialKind, arg: Option<String>, raw: &str) -> Option<ParsedCommand> {
    Some(ParsedCommand::Special {
        kind,
        arg,
        raw: raw.to_string(),
    })
}

/// Parse a single command token (no sentinel, no combination).
fn parse_one(body: &str) -> Option<ParsedCommand> {
    if body.is_empty() {
        return None;
    }

    if body.chars().all(|c| c.is_ascii_digit()) {
        return Some(ParsedCommand::Preset {
            number: body.parse().ok()?,
            raw: body.to_string(),
        });
    }

    match body {
        "fl" => return special(SpecialKind::ListFavorites, None, body),
        "p" => return special(SpecialKind::ListPatterns, None, body),
        "t" => return special(SpecialKind::ListThemes, None, body),
        "tr" => return special(SpecialKind::RandomTheme, None, body),
        "*" => return special(SpecialKind::RandomPreset, None, body),
        "**" => return special(SpecialKind::RandomAll, None, body),
        "?" => return special(SpecialKind::ListPresets, None, body),
        "??" => return special(SpecialKind::CatalogAll, None, body),
        "r" => return special(SpecialKind::Randomize, None, body),
        "s" => return special(SpecialKind::SaveConfig, None, body),
        "x" => return special(SpecialKind::ResetPattern, None, body),
        "h" => return special(SpecialKind::History, None, body),
        "\\" => return special(SpecialKind::Undo, None, body),
        "." => return special(SpecialKind::Repeat, None, body),
        "!!" => return special(SpecialKind::ShuffleAll, None, body),
        "!" => return special(SpecialKind::Shuffle, None, body),
        _ => {}
    }

    if let Some(arg) = body.strip_prefix('!') {
        if arg.chars().all(|c| c.is_ascii_digit()) {
            return special(SpecialKind::Shuffle, Some(arg.to_string()), body);
        }
        return None;
    }

    if let Some(slot) = body.strip_prefix('F') {
        return Some(ParsedCommand::FavoriteSave {
            slot: slot.parse().ok()?,
            raw: body.to_string(),
        });
    }

    if let Some(slot) = body.strip_prefix('f') {
        if slot.chars().all(|c| c.is_ascii_digit()) && !slot.is_empty() {
            return Some(ParsedCommand::FavoriteLoad {
                slot: slot.parse().ok()?,
                raw: body.to_string(),
            });
        }
        return None;
    }

    if let Some(rest) = body.strip_prefix('p') {
        // Optional `.M` preset suffix on the target
        let (target_text, preset) = match rest.rsplit_once('.') {
            Some((head, tail)) if !head.is_empty() => match tail.parse::<u32>() {
                Ok(p) => (head, Some(p)),
                Err(_) => (rest, None),
            },
            _ => (rest, None),
        };
        return Some(ParsedCommand::Pattern {
            target: Target::parse(target_text),
            preset,
            raw: body.to_string(),
        });
    }

    if let Some(rest) = body.strip_prefix('t') {
        return Some(ParsedCommand::Theme {
            target: Target::parse(rest),
            raw: body.to_string(),
        });
    }

    None
}
