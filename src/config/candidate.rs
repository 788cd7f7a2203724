//! Ordered candidate lists, evaluated first-match-wins.

use owo_colors::OwoColorize;
use std::fmt;

/// Where a candidate value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Command line option.
    Option(&'static str),
    /// Environment variable.
    Environment(&'static str),
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Option(flag) => write!(f, "Option ({flag})"),
            Self::Environment(var) => write!(f, "Environment ({var})"),
            Self::Default => f.write_str("Default"),
        }
    }
}

/// One possible value for a setting. Lower levels take precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: Source,
    pub level: u8,
    pub value: Option<String>,
}

impl Candidate {
    pub fn new(source: Source, level: u8, value: Option<String>) -> Self {
        Self {
            source,
            level,
            value,
        }
    }

    fn is_set(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// A named setting and its candidates, in precedence order.
#[derive(Debug, Clone)]
pub struct Setting {
    pub name: &'static str,
    pub candidates: Vec<Candidate>,
}

impl Setting {
    pub fn new(name: &'static str, candidates: Vec<Candidate>) -> Self {
        Self { name, candidates }
    }

    /// First candidate with a non-empty value.
    pub fn chosen(&self) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.is_set())
    }

    pub fn value(&self) -> Option<&str> {
        self.chosen().and_then(|c| c.value.as_deref())
    }

    /// Precedence level of the chosen value; unset settings never win.
    pub fn level(&self) -> u8 {
        self.chosen().map_or(u8::MAX, |c| c.level)
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.name.bold(), or_unset(self.value()))?;
        for candidate in &self.candidates {
            writeln!(
                f,
                " - {}: {}",
                candidate.source,
                or_unset(candidate.value.as_deref())
            )?;
        }
        Ok(())
    }
}

fn or_unset(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "(unset)".dimmed().to_string(),
    }
}
