//! Asset categories.
//!
//! The text-asset world is partitioned into exactly five fixed categories.
//! Their order here is also the search order for name lookups.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the five fixed asset categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Items,
    Skills,
    Characters,
    Talents,
    Others,
}

impl Category {
    /// All categories in canonical (lookup) order.
    pub const ALL: [Category; 5] = [
        Self::Items,
        Self::Skills,
        Self::Characters,
        Self::Talents,
        Self::Others,
    ];

    /// Parse a category key as stored in persisted data.
    pub fn from_key(s: &str) -> Result<Self, CoreError> {
        match s {
            "items" => Ok(Self::Items),
            "skills" => Ok(Self::Skills),
            "characters" => Ok(Self::Characters),
            "talents" => Ok(Self::Talents),
            "others" => Ok(Self::Others),
            _ => Err(CoreError::Validation(format!(
                "Invalid category '{s}'. Must be one of: items, skills, characters, talents, others"
            ))),
        }
    }

    /// Key used in persisted data and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Skills => "skills",
            Self::Characters => "characters",
            Self::Talents => "talents",
            Self::Others => "others",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Items => "Items",
            Self::Skills => "Skills",
            Self::Characters => "Characters",
            Self::Talents => "Talents",
            Self::Others => "Others",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}
