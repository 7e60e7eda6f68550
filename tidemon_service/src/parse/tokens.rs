//! Line classification for the hourly pages.
//!
//! Each flattened line is tested against a fixed, ordered list of
//! predicates; the first one that accepts the line decides its class.

use std::sync::LazyLock;

use regex::Regex;

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("valid clock regex"));

static DIRECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,3}$").expect("valid direction regex"));

static SPEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*km/h").expect("valid speed regex"));

static TEMPERATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(?:[.,]\d+)?\s*°").expect("valid temperature regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// `14:00` alone on its line; marks an hour boundary.
    Clock,
    /// One to three capital letters (`N`, `SW`, `WSW`).
    Direction,
    /// A number followed by `km/h`.
    Speed,
    /// A number followed by the degree sign.
    Temperature,
    /// Anything else that is not blank, e.g. `Céu limpo`.
    Text,
}

pub fn is_clock(line: &str) -> bool {
    CLOCK_RE.is_match(line)
}

pub fn is_direction(line: &str) -> bool {
    DIRECTION_RE.is_match(line)
}

pub fn is_speed(line: &str) -> bool {
    SPEED_RE.is_match(line)
}

pub fn is_temperature(line: &str) -> bool {
    TEMPERATURE_RE.is_match(line)
}

pub fn is_text(line: &str) -> bool {
    !line.trim().is_empty()
}

/// Predicates in the order they are tried.
pub const PRIORITY: [(TokenClass, fn(&str) -> bool); 5] = [
    (TokenClass::Clock, is_clock),
    (TokenClass::Direction, is_direction),
    (TokenClass::Speed, is_speed),
    (TokenClass::Temperature, is_temperature),
    (TokenClass::Text, is_text),
];

/// Class of a single trimmed line, or `None` for a blank one.
pub fn classify(line: &str) -> Option<TokenClass> {
    PRIORITY
        .iter()
        .find(|(_, accepts)| accepts(line))
        .map(|(class, _)| *class)
}

/// First line of each interesting class inside a lookahead window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowPick<'a> {
    pub direction: Option<&'a str>,
    pub speed: Option<&'a str>,
    pub temperature: Option<&'a str>,
}

/// Picks the first direction, speed and temperature line in `window`.
pub fn pick_window<'a>(window: &[&'a str]) -> WindowPick<'a> {
    let mut pick = WindowPick::default();
    for &line in window {
        match classify(line) {
            Some(TokenClass::Direction) if pick.direction.is_none() => pick.direction = Some(line),
            Some(TokenClass::Speed) if pick.speed.is_none() => pick.speed = Some(line),
            Some(TokenClass::Temperature) if pick.temperature.is_none() => pick.temperature = Some(line),
            _ => {}
        }
    }
    pick
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
