use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How far a community has been vetted by the directory maintainers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    #[default]
    New,
    Established,
    Verified,
    Endorsed,
}

impl TrustLevel {
    pub const ALL: [TrustLevel; 4] = [
        TrustLevel::New,
        TrustLevel::Established,
        TrustLevel::Verified,
        TrustLevel::Endorsed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrustLevel::New => "new",
            TrustLevel::Established => "established",
            TrustLevel::Verified => "verified",
            TrustLevel::Endorsed => "endorsed",
        }
    }

    /// Capitalized form used in popups and detail cards.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TrustLevel::New => "New",
            TrustLevel::Established => "Established",
            TrustLevel::Verified => "Verified",
            TrustLevel::Endorsed => "Endorsed",
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrustLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Validation(format!("unknown trust level: {s}")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Leader,
}

impl MemberRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Leader => "leader",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(MemberRole::Member),
            "leader" => Ok(MemberRole::Leader),
            other => Err(Error::Validation(format!("unknown member role: {other}"))),
        }
    }
}
