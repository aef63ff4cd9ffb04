//! Group/block classification parser.
//!
//! # Responsibility
//! - Parse `"group <N|n/a>[ (free text)], <letter>-block"` strings.
//! - Validate standalone group tokens and block labels used as list filters.
//!
//! # Invariants
//! - A numeric group is always within `1..=18`.
//! - A block letter is always one of `s`, `p`, `d`, `f`, `g`.
//! - Parsing is case-insensitive; rendering is lowercase.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static GROUP_CLAUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^group (n/a|[0-9]{1,2})(?:\s*\([^()]*\))?$").expect("valid group regex")
});
static BLOCK_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([spdfg])-block$").expect("valid block regex"));

const GROUP_MIN: u8 = 1;
const GROUP_MAX: u8 = 18;
const NOT_APPLICABLE: &str = "n/a";

/// Periodic table group: a column number or "n/a" for the f-block series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Number(u8),
    NotApplicable,
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

/// Electron block letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    S,
    P,
    D,
    F,
    G,
}

impl Block {
    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            's' => Some(Self::S),
            'p' => Some(Self::P),
            'd' => Some(Self::D),
            'f' => Some(Self::F),
            'g' => Some(Self::G),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::S => 's',
            Self::P => 'p',
            Self::D => 'd',
            Self::F => 'f',
            Self::G => 'g',
        }
    }

    /// Lowercase label such as `s-block`, the form used by list filters.
    pub fn label(self) -> String {
        format!("{}-block", self.letter())
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-block", self.letter())
    }
}

/// Parsed group/block classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupBlock {
    pub group: Group,
    pub block: Block,
}

impl Display for GroupBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "group {}, {}", self.group, self.block)
    }
}

impl FromStr for GroupBlock {
    type Err = GroupBlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_group_block(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupBlockError {
    /// Input is not `<group clause>, <block clause>`.
    Malformed(String),
    /// Group token is neither `n/a` nor a number in `1..=18`.
    InvalidGroupNumber(String),
    /// Block clause is not `<s|p|d|f|g>-block`.
    InvalidBlock(String),
}

impl Display for GroupBlockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(f, "malformed group block: `{value}`"),
            Self::InvalidGroupNumber(value) => {
                write!(f, "invalid group number `{value}`; expected 1-18 or n/a")
            }
            Self::InvalidBlock(value) => {
                write!(f, "invalid block `{value}`; expected s|p|d|f|g-block")
            }
        }
    }
}

impl Error for GroupBlockError {}

/// Parses a group/block classification string.
pub fn parse_group_block(raw: &str) -> Result<GroupBlock, GroupBlockError> {
    let parts: Vec<&str> = raw.split(',').collect();
    let [group_clause, block_clause] = parts.as_slice() else {
        return Err(GroupBlockError::Malformed(raw.to_string()));
    };

    let captures = GROUP_CLAUSE_RE
        .captures(group_clause.trim())
        .ok_or_else(|| GroupBlockError::Malformed(raw.to_string()))?;
    let group = parse_group_token(&captures[1])?;
    let block = parse_block_label(block_clause)?;

    Ok(GroupBlock { group, block })
}

/// Validates a standalone group token (`1`..`18` or `n/a`).
pub fn parse_group_token(raw: &str) -> Result<Group, GroupBlockError> {
    let token = raw.trim();
    if token.eq_ignore_ascii_case(NOT_APPLICABLE) {
        return Ok(Group::NotApplicable);
    }

    match token.parse::<u8>() {
        Ok(number) if (GROUP_MIN..=GROUP_MAX).contains(&number) => Ok(Group::Number(number)),
        _ => Err(GroupBlockError::InvalidGroupNumber(token.to_string())),
    }
}

/// Validates a standalone block label such as `p-block`.
pub fn parse_block_label(raw: &str) -> Result<Block, GroupBlockError> {
    let label = raw.trim();
    BLOCK_LABEL_RE
        .captures(label)
        .and_then(|caps| caps[1].chars().next())
        .and_then(Block::from_letter)
        .ok_or_else(|| GroupBlockError::InvalidBlock(label.to_string()))
}
