use std::{fmt, ops::RangeInclusive, str::FromStr};

use crate::services::portal_markup::{GcsPortalMarkup, PortalMarkup};

pub const SEARCHABLE_YEARS: RangeInclusive<u16> = 2000..=2025;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum County {
    Buffalo,
}

impl County {
    pub const ALL: [County; 1] = [County::Buffalo];

    /// Name as the parcel service spells it in its `CONAME` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            County::Buffalo => "BUFFALO",
        }
    }

    /// Markup reader for this county's permit portal. New counties whose
    /// portal renders differently plug in their own [`PortalMarkup`].
    pub fn markup(&self) -> &'static dyn PortalMarkup {
        match self {
            County::Buffalo => &GcsPortalMarkup,
        }
    }
}

impl fmt::Display for County {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for County {
    type Err = PermitQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        County::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PermitQueryError::UnknownCounty(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PermitQueryError {
    #[error("No permit scraper exists for county {0:?}")]
    UnknownCounty(String),
    #[error("Year {0} is outside the searchable range 2000-2025")]
    YearOutOfRange(u16),
}

/// A validated `(county, year)` search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermitQuery {
    county: County,
    year: u16,
}

impl PermitQuery {
    pub fn new(county: County, year: u16) -> Result<Self, PermitQueryError> {
        if !SEARCHABLE_YEARS.contains(&year) {
            return Err(PermitQueryError::YearOutOfRange(year));
        }
        Ok(PermitQuery { county, year })
    }

    pub fn parse(county: &str, year: u16) -> Result<Self, PermitQueryError> {
        PermitQuery::new(county.parse()?, year)
    }

    pub fn county(&self) -> County {
        self.county
    }

    pub fn year(&self) -> u16 {
        self.year
    }
}
