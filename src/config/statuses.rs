//! Retryable HTTP status set.
//!
//! Parsed from a comma-separated list such as `429,5xx`, where an integer
//! adds a single status and `Nxx` adds the whole `N00..=N99` class.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Statuses that consume a retry instead of ending the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RetryStatusSet {
    codes: BTreeSet<u16>,
}

impl RetryStatusSet {
    /// An empty set: only transport errors are retried.
    pub fn empty() -> Self {
        Self {
            codes: BTreeSet::new(),
        }
    }

    pub fn contains(&self, status: u16) -> bool {
        self.codes.contains(&status)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn insert_class(&mut self, class: u16) {
        self.codes.extend(class * 100..=class * 100 + 99);
    }
}

impl Default for RetryStatusSet {
    /// 429 plus every 5xx status.
    fn default() -> Self {
        let mut set = Self::empty();
        set.codes.insert(429);
        set.insert_class(5);
        set
    }
}

impl FromStr for RetryStatusSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::empty();

        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let lower = token.to_ascii_lowercase();
            if let Some(class) = lower.strip_suffix("xx") {
                match class.parse::<u16>() {
                    Ok(c) if (1..=5).contains(&c) => set.insert_class(c),
                    _ => return Err(format!("invalid status class '{}'", token)),
                }
                continue;
            }

            match token.parse::<u16>() {
                Ok(code) if (100..=599).contains(&code) => {
                    set.codes.insert(code);
                }
                _ => return Err(format!("invalid status code '{}'", token)),
            }
        }

        Ok(set)
    }
}

impl TryFrom<String> for RetryStatusSet {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RetryStatusSet> for String {
    fn from(set: RetryStatusSet) -> Self {
        set.to_string()
    }
}

impl fmt::Display for RetryStatusSet {
    /// Renders full classes back as `Nxx` so the output parses to the same set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let mut class_done = BTreeSet::new();

        for &code in &self.codes {
            let class = code / 100;
            if class_done.contains(&class) {
                continue;
            }
            let full = (class * 100..=class * 100 + 99).all(|c| self.codes.contains(&c));
            if full {
                class_done.insert(class);
                parts.push(format!("{}xx", class));
            } else {
                parts.push(code.to_string());
            }
        }

        write!(f, "{}", parts.join(","))
    }
}
