//! Paginated collection fetcher
//!
//! Issues the requests for a collection, decodes each page, and follows the
//! paginator until the collection is exhausted or the ceiling is reached.
//!
//! # Overview
//!
//! - `CollectionFetcher::fetch_collection` - JSON pages, follows `@iot.nextLink`
//! - `CollectionFetcher::fetch_first_page` - JSON, first page only
//! - `CollectionFetcher::fetch_csv` - `$resultFormat=CSV`, paged with `$skip`/`$top`
//! - `CollectionFetcher::fetch_entity` - a single entity by URL
//!
//! Any failure abandons everything accumulated so far.

mod types;

pub use types::{CsvOutcome, FetchConfig, FetchOutcome, FetchStats};

use crate::decode::{decode_entity, CsvDecoder, CsvTable, JsonCollectionDecoder, PageDecoder};
use crate::error::Result;
use crate::http::{RawResponse, Transport};
use crate::pagination::{
    NextLinkPaginator, NextPage, PaginationState, Paginator, SinglePagePaginator,
    SkipTopPaginator,
};
use crate::types::{Entity, QueryParams};
use tracing::{debug, info};

/// Fetches SensorThings collections over a [`Transport`]
pub struct CollectionFetcher<T> {
    /// Transport used for every request
    transport: T,
    /// Statistics over every fetch made by this fetcher
    stats: FetchStats,
}

impl<T: Transport> CollectionFetcher<T> {
    /// Create a new fetcher
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            stats: FetchStats::default(),
        }
    }

    /// Get statistics accumulated over all fetches
    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = FetchStats::default();
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch a JSON collection, following `@iot.nextLink` until it is absent
    /// or `config.ceiling` entities have been accumulated.
    pub async fn fetch_collection(
        &mut self,
        url: &str,
        query: &[(String, String)],
        config: &FetchConfig,
    ) -> Result<FetchOutcome> {
        self.fetch_json(url, query, config, &NextLinkPaginator::new())
            .await
    }

    /// Fetch only the first page of a JSON collection
    pub async fn fetch_first_page(
        &mut self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<FetchOutcome> {
        self.fetch_json(url, query, &FetchConfig::default(), &SinglePagePaginator)
            .await
    }

    /// Fetch a `$resultFormat=CSV` collection.
    ///
    /// CSV bodies carry no next link, so pages are requested with
    /// `$top=config.csv_page_size` and an advancing `$skip`. When `columns`
    /// is given, every page's header row must list exactly those columns.
    pub async fn fetch_csv(
        &mut self,
        url: &str,
        query: &[(String, String)],
        columns: Option<&[String]>,
        config: &FetchConfig,
    ) -> Result<CsvOutcome> {
        let decoder = match columns {
            Some(columns) => CsvDecoder::with_columns(columns.iter().cloned()),
            None => CsvDecoder::new(),
        };
        let paginator = SkipTopPaginator::new(config.csv_page_size);

        let mut table = CsvTable::default();
        let state = self
            .run(url, query, config, &decoder, &paginator, |page_url, page| {
                table.append(page_url, page)
            })
            .await?;

        Ok(CsvOutcome {
            table,
            stats: FetchStats::from(&state),
        })
    }

    /// Fetch a single entity, e.g. `.../Datastreams(46)`
    pub async fn fetch_entity(&mut self, url: &str, query: &[(String, String)]) -> Result<Entity> {
        let response = self.get(url, query).await?;
        self.stats.add(FetchStats {
            pages: 1,
            records: 1,
            bytes: response.len() as u64,
        });
        decode_entity(&response.url, &response.body)
    }

    /// GET through the transport, rejecting non-2xx responses
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        self.transport.get(url, query).await?.error_for_status()
    }

    async fn fetch_json(
        &mut self,
        url: &str,
        query: &[(String, String)],
        config: &FetchConfig,
        paginator: &dyn Paginator,
    ) -> Result<FetchOutcome> {
        let mut entities = Vec::new();
        let mut total_count = None;

        let state = self
            .run(
                url,
                query,
                config,
                &JsonCollectionDecoder::new(),
                paginator,
                |_, page| {
                    if total_count.is_none() {
                        total_count = page.count;
                    }
                    entities.extend(page.value);
                    Ok(())
                },
            )
            .await?;

        Ok(FetchOutcome {
            entities,
            total_count,
            stats: FetchStats::from(&state),
        })
    }

    /// The pagination loop shared by every collection fetch
    async fn run<D, F>(
        &mut self,
        url: &str,
        query: &[(String, String)],
        config: &FetchConfig,
        decoder: &D,
        paginator: &dyn Paginator,
        mut on_page: F,
    ) -> Result<PaginationState>
    where
        D: PageDecoder,
        F: FnMut(&str, D::Page) -> Result<()>,
    {
        let mut state = PaginationState::new();
        if config.ceiling_reached(0) {
            debug!("Ceiling of 0 entities, not requesting {}", url);
            return Ok(state);
        }

        let mut current_url = url.to_string();
        let mut params: QueryParams = query.to_vec();
        params.extend(paginator.initial_params(&state));

        loop {
            let response = self.get(&current_url, &params).await?;
            let page = decoder.decode(&response.url, &response.body)?;
            let summary = decoder.summarize(&page).with_bytes(response.len());

            info!(
                "Downloaded {} entities: {}",
                summary.records, response.url
            );
            on_page(&response.url, page)?;

            let next = paginator.process_page(&summary, &mut state);

            if config.ceiling_reached(state.total_fetched) {
                if next.is_continue() {
                    debug!(
                        "Ceiling of {:?} reached after {} entities, not following further pages",
                        config.ceiling, state.total_fetched
                    );
                }
                break;
            }

            match next {
                NextPage::Done => break,
                NextPage::Continue {
                    url: Some(next_url),
                    query_params,
                } => {
                    current_url = next_url;
                    params = query_params;
                }
                NextPage::Continue {
                    url: None,
                    query_params,
                } => {
                    params = query.to_vec();
                    params.extend(query_params);
                }
            }
        }

        let stats = FetchStats::from(&state);
        self.stats.add(stats);
        debug!(
            "Fetched {} records in {} pages ({} bytes)",
            stats.records, stats.pages, stats.bytes
        );

        Ok(state)
    }
}

#[cfg(test)]
mod tests;
