//! Fuzzy word search over the indexed corpus.
//!
//! A match is any stored word within a maximum Levenshtein distance of the
//! term. The threshold is a filter, not a score: results keep the store's
//! `(document_id, page_number, x_min, y_min)` scan order.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::SearchHit;
use crate::repository::search_log::DieselSearchRepository;

/// Fuzzy search engine. Every match is also appended to the search_result
/// history table.
pub struct SearchService {
    repo: DieselSearchRepository,
}

impl SearchService {
    pub fn new(repo: DieselSearchRepository) -> Self {
        Self { repo }
    }

    /// Find all word occurrences within `max_distance` edits of `term`.
    ///
    /// Fails with [`Error::Validation`] on an empty term before touching the
    /// store. Zero matches is a normal empty result. Logging a match into the
    /// history table is best-effort per row.
    pub async fn search(&self, term: &str, max_distance: u32) -> Result<Vec<SearchHit>> {
        if term.is_empty() {
            return Err(Error::Validation("search term is empty".to_string()));
        }

        let corpus = self.repo.load_corpus().await?;
        let matches: Vec<SearchHit> = corpus
            .into_iter()
            .filter(|hit| within_distance(&hit.word, term, max_distance))
            .collect();

        tracing::debug!(term, max_distance, matches = matches.len(), "search complete");

        for hit in &matches {
            let match_time = Utc::now().to_rfc3339();
            match self.repo.append(term, hit, &match_time).await {
                Ok(()) => {}
                Err(e @ Error::RowWrite { .. }) => {
                    tracing::warn!(word = %hit.word, error = %e, "failed to log search result");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(matches)
    }
}

/// Distance filter with the cheap length lower bound applied first.
fn within_distance(word: &str, term: &str, max_distance: u32) -> bool {
    let len_a = word.chars().count();
    let len_b = term.chars().count();
    if len_a.abs_diff(len_b) > max_distance as usize {
        return false;
    }
    edit_distance(word, term) <= max_distance
}

/// Classic Levenshtein distance: dynamic-programming matrix with unit cost
/// for insert, delete, and substitute. Case-sensitive.
pub fn edit_distance(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len() as u32;
    }
    if b.is_empty() {
        return a.len() as u32;
    }

    // two rolling rows of the (|a|+1) x (|b|+1) matrix
    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut curr = vec![0u32; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i as u32 + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitute = prev[j] + u32::from(ca != cb);
            let delete = prev[j + 1] + 1;
            let insert = curr[j] + 1;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_equal_strings_is_zero() {
        assert_eq!(edit_distance("invoice", "invoice"), 0);
        assert_eq!(edit_distance("", ""), 0);
    }

    #[test]
    fn distance_against_empty_is_length() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abcd", ""), 4);
    }

    #[test]
    fn classic_cases() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("invoise", "invoice"), 1);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(edit_distance("Invoice", "invoice"), 1);
    }

    #[test]
    fn multibyte_characters_count_as_single_edits() {
        assert_eq!(edit_distance("café", "cafe"), 1);
        assert_eq!(edit_distance("naïve", "naive"), 1);
    }

    #[test]
    fn length_bound_short_circuits() {
        assert!(!within_distance("a", "abcdefgh", 2));
        assert!(within_distance("invoise", "invoice", 2));
    }
}
