use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;


/// Separates the left and right banks when no vowel or star is pressed.
pub const SEPARATOR: char = '-';
/// The star key. Also the substitution slot in decorator templates.
pub const STAR: &str = "*";
/// Joins the strokes of a multi-stroke outline.
pub const STROKE_SEPARATOR: &str = "/";

/// Permitted letters of each field, in steno key order.
pub const STARTER_KEYS: &str = "STKPWHR";
pub const VOWELS1_KEYS: &str = "AO";
pub const VOWELS2_KEYS: &str = "EU";
pub const F_KEYS: &str = "F";
pub const ENDER_KEYS: &str = "RPBLGTSDZ";

// Each group takes the longest run of its own keys, left to right, and the
// whole stroke must be consumed.
static PARTS_MATCHER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(S?T?K?P?W?H?R?)(A?O?)-?(\*?)(E?U?)(F?)(R?P?B?L?G?T?S?D?Z?)$")
        .expect("stroke grammar pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stroke '{0}' does not fit the phrasing grammar")]
pub struct NoMatch(pub String);

/// A stroke split into its six positional fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StrokeParts {
    pub starter: String,
    pub vowels1: String,
    pub star: String,
    pub vowels2: String,
    pub f: String,
    pub ender: String,
}

/// Splits `stroke` into its six fields.
///
/// The separator is accepted between the left vowels and the star and carries
/// no meaning. A stroke with no keys at all is rejected.
pub fn decompose(stroke: &str) -> Result<StrokeParts, NoMatch> {
    let no_match = || NoMatch(stroke.to_string());

    let caps = PARTS_MATCHER.captures(stroke).ok_or_else(no_match)?;
    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();

    let parts = StrokeParts {
        starter: field(1),
        vowels1: field(2),
        star: field(3),
        vowels2: field(4),
        f: field(5),
        ender: field(6),
    };

    if parts.is_empty() {
        return Err(no_match());
    }
    Ok(parts)
}

impl StrokeParts {
    pub fn is_empty(&self) -> bool {
        self.starter.is_empty()
            && self.has_empty_middle()
            && self.f.is_empty()
            && self.ender.is_empty()
    }

    fn has_empty_middle(&self) -> bool {
        self.vowels1.is_empty() && self.star.is_empty() && self.vowels2.is_empty()
    }

    /// Key into the middle base table: `vowels1 + star`.
    pub fn base_key(&self) -> String {
        format!("{}{}", self.vowels1, self.star)
    }

    /// Key into the decorator table: `star + vowels2 + f`.
    pub fn decorator_key(&self) -> String {
        format!("{}{}{}", self.star, self.vowels2, self.f)
    }

    /// Key into the middle exception table: `vowels1 + star + vowels2 + f`.
    pub fn middle_key(&self) -> String {
        format!("{}{}{}{}", self.vowels1, self.star, self.vowels2, self.f)
    }

    /// Number of keys pressed, separator excluded.
    pub fn key_count(&self) -> usize {
        [
            &self.starter,
            &self.vowels1,
            &self.star,
            &self.vowels2,
            &self.f,
            &self.ender,
        ]
        .iter()
        .map(|s| s.len())
        .sum()
    }

    /// Canonical stroke text.
    ///
    /// The separator is written only when nothing sits between the banks and
    /// the right bank is pressed, so `decompose(parts.to_stroke())` gives
    /// back `parts`.
    pub fn to_stroke(&self) -> String {
        let mut out = String::with_capacity(self.key_count() + 1);
        out.push_str(&self.starter);
        out.push_str(&self.vowels1);
        out.push_str(&self.star);
        out.push_str(&self.vowels2);
        if self.has_empty_middle() && !(self.f.is_empty() && self.ender.is_empty()) {
            out.push(SEPARATOR);
        }
        out.push_str(&self.f);
        out.push_str(&self.ender);
        out
    }
}

impl fmt::Display for StrokeParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_stroke())
    }
}

/// Every ordered subset of `keys`, the empty run included.
///
/// These are exactly the values a single grammar field can take.
pub fn field_values(keys: &str) -> Vec<String> {
    let letters: Vec<char> = keys.chars().collect();
    (0..1usize << letters.len())
        .map(|mask| {
            letters
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, c)| *c)
                .collect()
        })
        .collect()
}

/// Every `(star, vowels2, f)` combination the grammar can produce.
pub fn right_middle_values() -> Vec<(String, String, String)> {
    let mut out = Vec::new();
    for star in ["", STAR] {
        for vowels2 in field_values(VOWELS2_KEYS) {
            for f in field_values(F_KEYS) {
                out.push((star.to_string(), vowels2.clone(), f));
            }
        }
    }
    out
}
