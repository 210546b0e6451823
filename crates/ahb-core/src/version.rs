//! Format version tags (`FV<YY><MM>`)

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by all format version tags
pub const FORMAT_VERSION_PREFIX: &str = "FV";

/// A release identifier such as `FV2504` (April 2025)
///
/// Ordering is chronological: by year, then by month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormatVersion {
    year: u16,
    month: u8,
}

impl FormatVersion {
    /// Parse a tag of the form `FV` followed by exactly four digits
    pub fn parse(tag: &str) -> Result<Self> {
        let invalid = || Error::InvalidFormatVersion(tag.to_string());

        let digits = tag.strip_prefix(FORMAT_VERSION_PREFIX).ok_or_else(invalid)?;
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: u16 = digits[..2].parse().map_err(|_| invalid())?;
        let month: u8 = digits[2..].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self {
            year: 2000 + year,
            month,
        })
    }

    /// Four-digit year
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Month, 1-12
    pub fn month(&self) -> u8 {
        self.month
    }

    /// First day of the release month
    pub fn release_month(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), 1)
    }

    /// Cheap check used while listing directories: `FV` prefix and six characters.
    /// Names passing this check are then parsed strictly.
    pub fn looks_like_tag(name: &str) -> bool {
        name.starts_with(FORMAT_VERSION_PREFIX) && name.len() == 6
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:02}{:02}",
            FORMAT_VERSION_PREFIX,
            self.year % 100,
            self.month
        )
    }
}

impl FromStr for FormatVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FormatVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FormatVersion> for String {
    fn from(value: FormatVersion) -> Self {
        value.to_string()
    }
}
