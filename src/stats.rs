//! Vote statistics over a quote list.

use std::collections::HashMap;

use crate::{schema::api::Quote, utils::preview};

pub const PREVIEW_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorVotes {
    pub author: String,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorQuotes {
    pub author: String,
    pub quotes: usize,
}

/// Headline numbers for a list of quotes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteSummary {
    pub total: usize,
    pub unique_authors: usize,
    pub most_quoted: Option<AuthorQuotes>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteVotes {
    pub id: i32,
    pub label: String,
    pub votes: u32,
}

/// Vote totals per author, in the order authors first appear.
pub fn votes_by_author(quotes: &[Quote]) -> Vec<AuthorVotes> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<AuthorVotes> = Vec::new();
    for quote in quotes {
        let author = match quote.author.trim() {
            "" => "Unknown",
            name => name,
        };
        let slot = *index.entry(author).or_insert_with(|| {
            totals.push(AuthorVotes {
                author: author.to_string(),
                votes: 0,
            });
            totals.len() - 1
        });
        totals[slot].votes += u64::from(quote.vote_count);
    }
    totals
}

/// Quote counts per author as written, in the order authors first appear.
pub fn quotes_by_author(quotes: &[Quote]) -> Vec<AuthorQuotes> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<AuthorQuotes> = Vec::new();
    for quote in quotes {
        let slot = *index.entry(quote.author.as_str()).or_insert_with(|| {
            counts.push(AuthorQuotes {
                author: quote.author.clone(),
                quotes: 0,
            });
            counts.len() - 1
        });
        counts[slot].quotes += 1;
    }
    counts
}

/// Ties for most quoted go to the author seen first.
pub fn summary(quotes: &[Quote]) -> QuoteSummary {
    let counts = quotes_by_author(quotes);
    let mut most_quoted: Option<&AuthorQuotes> = None;
    for row in &counts {
        if most_quoted.map_or(true, |best| row.quotes > best.quotes) {
            most_quoted = Some(row);
        }
    }
    QuoteSummary {
        total: quotes.len(),
        unique_authors: counts.len(),
        most_quoted: most_quoted.cloned(),
    }
}

/// Quotes that have at least one vote, most votes first.
pub fn voted_quotes(quotes: &[Quote]) -> Vec<QuoteVotes> {
    let mut voted: Vec<QuoteVotes> = quotes
        .iter()
        .filter(|q| q.vote_count > 0)
        .map(|q| QuoteVotes {
            id: q.id,
            label: preview(&q.content, PREVIEW_CHARS),
            votes: q.vote_count,
        })
        .collect();
    voted.sort_by(|a, b| b.votes.cmp(&a.votes));
    voted
}

pub fn total_votes(quotes: &[Quote]) -> u64 {
    quotes.iter().map(|q| u64::from(q.vote_count)).sum()
}
