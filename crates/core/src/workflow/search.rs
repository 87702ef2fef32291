use tracing::{debug, warn};

use crate::backend::{BackendError, SearchCandidate};
use crate::connector::Connector;
use crate::correlation::CorrelationToken;

/// Most candidates shown in one chat list.
pub const MAX_DISPLAYED_RESULTS: usize = 15;

/// A candidate ready to render: its label and the token behind its button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCandidate {
    pub label: String,
    pub token: CorrelationToken,
    /// Encoded `token`.
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    NoResults,
    Candidates(Vec<RenderedCandidate>),
}

/// Join command arguments into a single search string.
pub fn join_terms<S: AsRef<str>>(raw_terms: &[S]) -> String {
    raw_terms
        .iter()
        .map(AsRef::as_ref)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"{title} ({year})"`, or just the title when the year is unknown.
pub fn display_label(candidate: &SearchCandidate) -> String {
    match candidate.year {
        Some(year) if year > 0 => format!("{} ({})", candidate.title, year),
        _ => candidate.title.clone(),
    }
}

/// Search `connector` and turn the actionable hits into rendered candidates.
pub async fn run_search<S: AsRef<str>>(
    connector: &Connector,
    raw_terms: &[S],
) -> Result<SearchOutcome, BackendError> {
    let terms = join_terms(raw_terms);
    let results = connector.client().search(&terms).await?;
    debug!(
        connector = connector.name(),
        terms = %terms,
        count = results.len(),
        "Search returned"
    );

    let candidates: Vec<RenderedCandidate> = results
        .iter()
        .filter_map(|candidate| render(connector, candidate))
        .take(MAX_DISPLAYED_RESULTS)
        .collect();

    if candidates.is_empty() {
        return Ok(SearchOutcome::NoResults);
    }
    Ok(SearchOutcome::Candidates(candidates))
}

fn render(connector: &Connector, candidate: &SearchCandidate) -> Option<RenderedCandidate> {
    let item_id = candidate.item_id?;
    // Telegram rejects the whole keyboard if one button has no text.
    if candidate.title.trim().is_empty() {
        debug!(connector = connector.name(), %item_id, "Skipping untitled candidate");
        return None;
    }
    let token = CorrelationToken::new(item_id, connector.name());
    let payload = match token.encode() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(connector = connector.name(), error = %e, "Skipping candidate");
            return None;
        }
    };

    Some(RenderedCandidate {
        label: display_label(candidate),
        token,
        payload,
    })
}
