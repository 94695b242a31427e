//! Instance eligibility.
//!
//! # Responsibilities
//! - Parse tag constraints from settings (`{ key, value, must_match }` or `tag==v` / `tag!=v`)
//! - Decide per instance whether it may contribute to the configuration
//!
//! # Design Decisions
//! - Each instance is judged alone; no cross-instance state
//! - Exclusion is not an error: callers log it at debug level

pub mod filter;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use filter::{check_instance, Eligibility, Exclusion};

/// The only constraint key understood.
pub const TAG_KEY: &str = "tag";

/// A tag predicate applied to every instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConstraintRepr")]
pub struct Constraint {
    pub key: String,
    pub value: String,
    pub must_match: bool,
}

impl Constraint {
    pub fn must_have(value: impl Into<String>) -> Self {
        Self { key: TAG_KEY.to_string(), value: value.into(), must_match: true }
    }

    pub fn must_not_have(value: impl Into<String>) -> Self {
        Self { key: TAG_KEY.to_string(), value: value.into(), must_match: false }
    }

    /// True when `tags` satisfies this constraint.
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        let present = tags.iter().any(|tag| tag.as_ref() == self.value);
        present == self.must_match
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.must_match { "==" } else { "!=" };
        write!(f, "{}{}{}", self.key, op, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid constraint {0:?}: expected <key>==<value> or <key>!=<value>")]
pub struct ConstraintParseError(pub String);

impl FromStr for Constraint {
    type Err = ConstraintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value, must_match) = if let Some((key, value)) = s.split_once("==") {
            (key, value, true)
        } else if let Some((key, value)) = s.split_once("!=") {
            (key, value, false)
        } else {
            return Err(ConstraintParseError(s.to_string()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ConstraintParseError(s.to_string()));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
            must_match,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConstraintRepr {
    Compact(String),
    Full {
        key: String,
        value: String,
        #[serde(default = "default_must_match")]
        must_match: bool,
    },
}

fn default_must_match() -> bool {
    true
}

impl TryFrom<ConstraintRepr> for Constraint {
    type Error = ConstraintParseError;

    fn try_from(repr: ConstraintRepr) -> Result<Self, Self::Error> {
        match repr {
            ConstraintRepr::Compact(s) => s.parse(),
            ConstraintRepr::Full { key, value, must_match } => Ok(Self { key, value, must_match }),
        }
    }
}
