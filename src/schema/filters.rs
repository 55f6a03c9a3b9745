use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    MostVotes,
    LeastVotes,
    #[serde(rename = "authorAZ")]
    AuthorAZ,
    #[serde(rename = "authorZA")]
    AuthorZA,
}

impl SortBy {
    pub const ALL: [SortBy; 6] = [
        SortBy::Newest,
        SortBy::Oldest,
        SortBy::MostVotes,
        SortBy::LeastVotes,
        SortBy::AuthorAZ,
        SortBy::AuthorZA,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Oldest => "oldest",
            SortBy::MostVotes => "mostVotes",
            SortBy::LeastVotes => "leastVotes",
            SortBy::AuthorAZ => "authorAZ",
            SortBy::AuthorZA => "authorZA",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortBy::ALL
            .into_iter()
            .find(|sort| sort.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown sort order '{s}' (expected one of: {})",
                    SortBy::ALL.map(|x| x.as_str()).join(", ")
                )
            })
    }
}

/// What the user asked to see. Empty text and `None` dates mean "no constraint".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub author: String,
    pub content: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_by: SortBy,
}

impl FilterCriteria {
    pub fn is_default(&self) -> bool {
        *self == FilterCriteria::default()
    }

    pub fn has_date_bounds(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_names_round_trip_through_display() {
        for sort in SortBy::ALL {
            assert_eq!(sort.to_string().parse::<SortBy>(), Ok(sort));
        }
        assert_eq!("MOSTVOTES".parse::<SortBy>(), Ok(SortBy::MostVotes));
        assert!("popular".parse::<SortBy>().is_err());
    }

    #[test]
    fn serde_names_match_display() {
        assert_eq!(
            serde_json::to_string(&SortBy::AuthorAZ).unwrap(),
            "\"authorAZ\""
        );
        assert_eq!(
            serde_json::to_string(&SortBy::LeastVotes).unwrap(),
            "\"leastVotes\""
        );
    }

    #[test]
    fn defaults_sort_newest_with_no_constraints() {
        let criteria = FilterCriteria::default();
        assert_eq!(criteria.sort_by, SortBy::Newest);
        assert!(criteria.author.is_empty() && criteria.content.is_empty());
        assert!(!criteria.has_date_bounds());
        assert!(criteria.is_default());
    }
}
