//! Unit worker: one identifier in, at most one record out

use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::{Absent, Fetcher};
use crate::record::Record;

/// Fetches one identifier and extracts it if content came back
///
/// Returns the absence reason instead of a record when the fetch produced
/// nothing; a partially filled record is never returned for a missing page.
pub async fn process(fetcher: &Fetcher, extractor: &Extractor, id: u64) -> Result<Record, Absent> {
    let markup = fetcher.fetch(id).await.map_err(|absent| {
        tracing::trace!("Identifier {} absent: {}", id, absent);
        absent
    })?;

    let record = extractor.extract(&markup, &fetcher.url_for(id));
    tracing::trace!("Identifier {} extracted", id);
    Ok(record)
}
