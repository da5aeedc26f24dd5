use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of country feeds the app knows about.
///
/// A code outside this set cannot be represented, so an unknown code in the
/// config file is rejected at startup rather than at fetch time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    #[default]
    Jp,
    Us,
    Gb,
    Fr,
    De,
    Kr,
    Cn,
}

impl Country {
    /// Tab order.
    pub const ALL: [Country; 7] = [
        Country::Jp,
        Country::Us,
        Country::Gb,
        Country::Fr,
        Country::De,
        Country::Kr,
        Country::Cn,
    ];

    /// Two-letter code used in the feed URL.
    pub fn code(self) -> &'static str {
        match self {
            Country::Jp => "jp",
            Country::Us => "us",
            Country::Gb => "gb",
            Country::Fr => "fr",
            Country::De => "de",
            Country::Kr => "kr",
            Country::Cn => "cn",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Country::Jp => "Japan",
            Country::Us => "United States",
            Country::Gb => "United Kingdom",
            Country::Fr => "France",
            Country::De => "Germany",
            Country::Kr => "South Korea",
            Country::Cn => "China",
        }
    }

    /// Position of this country in [`Country::ALL`].
    pub fn index(self) -> usize {
        Country::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported country code: {0:?}")]
pub struct UnknownCountry(pub String);

impl FromStr for Country {
    type Err = UnknownCountry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Country::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or(UnknownCountry(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_from_str() {
        for c in Country::ALL {
            assert_eq!(c.code().parse::<Country>().unwrap(), c);
        }
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("GB".parse::<Country>().unwrap(), Country::Gb);
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!("xx".parse::<Country>().is_err());
    }

    #[test]
    fn index_matches_tab_order() {
        assert_eq!(Country::Jp.index(), 0);
        assert_eq!(Country::Cn.index(), 6);
    }
}
