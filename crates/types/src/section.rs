use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four logical groupings of a loan application's data.
///
/// The declaration order is the display order of the editing tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    #[default]
    BasicInfo,
    Guarantors,
    NextOfKin,
    Collateral,
}

impl Section {
    /// Every section in tab order.
    pub const ALL: [Section; 4] = [Section::BasicInfo, Section::Guarantors, Section::NextOfKin, Section::Collateral];

    /// Sections holding a repeatable list of entries.
    pub const REPEATABLE: [Section; 3] = [Section::Guarantors, Section::NextOfKin, Section::Collateral];

    /// Stable identifier used on the command line and in logs.
    pub fn slug(&self) -> &'static str {
        match self {
            Section::BasicInfo => "basic-info",
            Section::Guarantors => "guarantors",
            Section::NextOfKin => "next-of-kin",
            Section::Collateral => "collateral",
        }
    }

    /// Human-readable label used in notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Section::BasicInfo => "Basic info",
            Section::Guarantors => "Guarantors",
            Section::NextOfKin => "Next of kin",
            Section::Collateral => "Collateral",
        }
    }

    pub fn is_repeatable(&self) -> bool {
        !matches!(self, Section::BasicInfo)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section '{0}'; expected one of basic-info, guarantors, next-of-kin, collateral")]
pub struct ParseSectionError(pub String);

impl FromStr for Section {
    type Err = ParseSectionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "basic-info" | "basic" => Ok(Section::BasicInfo),
            "guarantors" | "guarantor" => Ok(Section::Guarantors),
            "next-of-kin" | "nextofkin" | "kin" => Ok(Section::NextOfKin),
            "collateral" | "collaterals" => Ok(Section::Collateral),
            _ => Err(ParseSectionError(raw.to_string())),
        }
    }
}
