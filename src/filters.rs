//! Filtered, sorted views over the store's quote list.
//!
//! Projection never touches the source list. Sorting is stable, so quotes
//! that compare equal keep the order the service returned them in.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use icu_collator::{Collator, CollatorOptions};
use log::{log, Level};

use crate::{
    schema::{
        api::Quote,
        filters::{FilterCriteria, SortBy},
    },
    store::QuoteStore,
};

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Root-locale collation: accents sort next to their base letter and case
/// only breaks ties.
fn author_collator() -> Option<Collator> {
    match Collator::try_new(&Default::default(), CollatorOptions::new()) {
        Ok(collator) => Some(collator),
        Err(e) => {
            log!(Level::Warn, "Author collation unavailable, using case-folded order: {e}");
            None
        }
    }
}

fn author_order(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(collator) => collator.compare(a, b),
        None => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

struct Bounds {
    author: String,
    content: String,
    from: Option<DateTime<Utc>>,
    /// Exclusive: start of the day after the end date.
    until: Option<DateTime<Utc>>,
    dated: bool,
}

impl Bounds {
    fn new(criteria: &FilterCriteria) -> Self {
        Self {
            author: criteria.author.to_lowercase(),
            content: criteria.content.to_lowercase(),
            from: criteria.start_date.and_then(start_of_day),
            until: criteria
                .end_date
                .and_then(|d| d.succ_opt())
                .and_then(start_of_day),
            dated: criteria.has_date_bounds(),
        }
    }

    fn admits(&self, quote: &Quote, created: Option<DateTime<Utc>>) -> bool {
        if !self.author.is_empty() && !quote.author.to_lowercase().contains(&self.author) {
            return false;
        }
        if !self.content.is_empty() && !quote.content.to_lowercase().contains(&self.content) {
            return false;
        }
        if !self.dated {
            return true;
        }
        let Some(created) = created else {
            return false;
        };
        self.from.map_or(true, |from| created >= from)
            && self.until.map_or(true, |until| created < until)
    }
}

fn compare(
    sort: SortBy,
    collator: Option<&Collator>,
    (a, a_created): &(&Quote, Option<DateTime<Utc>>),
    (b, b_created): &(&Quote, Option<DateTime<Utc>>),
) -> Ordering {
    match sort {
        SortBy::Newest => b_created.cmp(a_created),
        SortBy::Oldest => a_created.cmp(b_created),
        SortBy::MostVotes => b.vote_count.cmp(&a.vote_count),
        SortBy::LeastVotes => a.vote_count.cmp(&b.vote_count),
        SortBy::AuthorAZ => author_order(collator, &a.author, &b.author),
        SortBy::AuthorZA => author_order(collator, &b.author, &a.author),
    }
}

/// All active criteria must hold; the result is ordered by `criteria.sort_by`.
pub fn project(quotes: &[Quote], criteria: &FilterCriteria) -> Vec<Quote> {
    let bounds = Bounds::new(criteria);
    let mut view: Vec<(&Quote, Option<DateTime<Utc>>)> = quotes
        .iter()
        .map(|q| (q, q.created_at_utc()))
        .filter(|(q, created)| bounds.admits(q, *created))
        .collect();
    let collator = match criteria.sort_by {
        SortBy::AuthorAZ | SortBy::AuthorZA => author_collator(),
        _ => None,
    };
    view.sort_by(|a, b| compare(criteria.sort_by, collator.as_ref(), a, b));
    view.into_iter().map(|(q, _)| q.clone()).collect()
}

/// Current criteria plus the last projection, recomputed only when the
/// criteria or the store's revision change.
#[derive(Debug, Default)]
pub struct QuoteFilters {
    criteria: FilterCriteria,
    cache: Option<(u64, FilterCriteria, Vec<Quote>)>,
}

impl QuoteFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criteria(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            cache: None,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn update(&mut self, edit: impl FnOnce(&mut FilterCriteria)) {
        edit(&mut self.criteria);
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.criteria.author = author.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.criteria.content = content.into();
    }

    pub fn set_dates(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.criteria.start_date = start;
        self.criteria.end_date = end;
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.criteria.sort_by = sort_by;
    }

    pub fn reset(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    pub fn view(&mut self, store: &QuoteStore) -> &[Quote] {
        let revision = store.revision();
        let fresh = matches!(
            &self.cache,
            Some((rev, criteria, _)) if *rev == revision && *criteria == self.criteria
        );
        if !fresh {
            let view = project(&store.quotes(), &self.criteria);
            self.cache = Some((revision, self.criteria.clone(), view));
        }
        match &self.cache {
            Some((_, _, quotes)) => quotes,
            None => &[],
        }
    }
}
