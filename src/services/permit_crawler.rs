use std::{fmt, time::Duration};

use reqwest::{Client, RequestBuilder};
use scraper::Html;

use crate::{
    configuration::PortalSettings,
    domain::{
        county::PermitQuery,
        permit::{EnrichedPermit, PermitRecord},
        portal_page::{ResultPage, SessionState},
    },
};

use super::{
    parcel_enricher::ParcelEnricher,
    portal_markup::{PortalMarkup, Postback, SearchCriteria},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStep {
    Init,
    Search,
    Page(u32),
}

impl fmt::Display for CrawlStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlStep::Init => f.write_str("initial GET"),
            CrawlStep::Search => f.write_str("search POST"),
            CrawlStep::Page(n) => write!(f, "page {} POST", n),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("Failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Permit portal {step} failed: {source}")]
    Transport {
        step: CrawlStep,
        #[source]
        source: reqwest::Error,
    },
    #[error("Portal still advertised a next page after {max_pages} pages")]
    PaginationLimitExceeded { max_pages: usize },
    #[error("Crawl did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

/// Records gathered from every result page, in page order.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawledPermits {
    pub records: Vec<PermitRecord>,
    pub pages_crawled: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PermitReport {
    pub query: PermitQuery,
    pub permits: Vec<EnrichedPermit>,
    pub pages_crawled: usize,
}

impl PermitReport {
    pub fn is_empty(&self) -> bool {
        self.permits.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.permits.iter().filter(|p| p.parcel.is_resolved()).count()
    }
}

enum CrawlState {
    Init,
    Searched(SessionState),
    Paginating {
        state: SessionState,
        target: String,
        page: u32,
    },
    Done,
}

/// Replays the portal's search postbacks for one `(county, year)` and hands
/// the rows to the parcel enricher.
pub struct PermitCrawler {
    settings: PortalSettings,
    enricher: ParcelEnricher,
}

impl PermitCrawler {
    pub fn new(settings: PortalSettings, enricher: ParcelEnricher) -> Self {
        PermitCrawler { settings, enricher }
    }

    /// Crawl and enrich, dropping everything if `deadline` passes first.
    pub async fn fetch_permits_within(
        &self,
        query: &PermitQuery,
        deadline: Duration,
    ) -> Result<PermitReport, CrawlError> {
        tokio::time::timeout(deadline, self.fetch_permits(query))
            .await
            .map_err(|_| CrawlError::DeadlineExceeded(deadline))?
    }

    pub async fn fetch_permits(&self, query: &PermitQuery) -> Result<PermitReport, CrawlError> {
        let crawled = self.crawl(query).await?;

        if crawled.records.is_empty() {
            log::info!(
                "No permits found for {} {}",
                query.county(),
                query.year()
            );
            return Ok(PermitReport {
                query: *query,
                permits: vec![],
                pages_crawled: crawled.pages_crawled,
            });
        }

        let permits = self
            .enricher
            .enrich_all(crawled.records, query.county())
            .await;

        let report = PermitReport {
            query: *query,
            permits,
            pages_crawled: crawled.pages_crawled,
        };
        log::info!(
            "{} of {} parcels resolved for {} {}",
            report.resolved_count(),
            report.permits.len(),
            query.county(),
            query.year()
        );

        Ok(report)
    }

    pub async fn crawl(&self, query: &PermitQuery) -> Result<CrawledPermits, CrawlError> {
        let markup = query.county().markup();
        let client = self.session_client()?;
        let criteria = SearchCriteria {
            department: self.settings.department.clone(),
            application_type: self.settings.application_type.clone(),
            year: query.year(),
        };

        let mut records = vec![];
        let mut pages_crawled = 0;
        let mut crawl_state = CrawlState::Init;

        loop {
            crawl_state = match crawl_state {
                CrawlState::Init => {
                    log::info!(
                        "Opening permit search for {} {}",
                        query.county(),
                        query.year()
                    );
                    let body = self
                        .send(client.get(&self.settings.search_url), CrawlStep::Init)
                        .await?;
                    CrawlState::Searched(read_session_state(markup, &body))
                }
                CrawlState::Searched(state) => {
                    let form = markup.postback_form(&state, &criteria, Postback::Search);
                    let body = self
                        .send(
                            client.post(&self.settings.search_url).form(&form),
                            CrawlStep::Search,
                        )
                        .await?;
                    let (state, page) = read_result_page(markup, &body);
                    pages_crawled += 1;
                    self.advance(state, page, &mut records, pages_crawled)?
                }
                CrawlState::Paginating {
                    state,
                    target,
                    page,
                } => {
                    tokio::time::sleep(self.settings.page_delay()).await;
                    let form = markup.postback_form(&state, &criteria, Postback::Page(&target));
                    let body = self
                        .send(
                            client.post(&self.settings.search_url).form(&form),
                            CrawlStep::Page(page),
                        )
                        .await?;
                    let (state, page) = read_result_page(markup, &body);
                    pages_crawled += 1;
                    self.advance(state, page, &mut records, pages_crawled)?
                }
                CrawlState::Done => break,
            };
        }

        log::info!(
            "Crawled {} permits over {} pages for {} {}",
            records.len(),
            pages_crawled,
            query.county(),
            query.year()
        );

        Ok(CrawledPermits {
            records,
            pages_crawled,
        })
    }

    fn advance(
        &self,
        state: SessionState,
        page: ResultPage,
        records: &mut Vec<PermitRecord>,
        pages_crawled: usize,
    ) -> Result<CrawlState, CrawlError> {
        let ResultPage { records: rows, cursor } = page;
        log::info!(
            "Result page {} had {} rows",
            cursor.current_page_number,
            rows.len()
        );
        records.extend(rows);

        let (Some(target), Some(next_page)) = (
            cursor.next_postback_target,
            cursor.current_page_number.checked_add(1),
        ) else {
            return Ok(CrawlState::Done);
        };
        if pages_crawled >= self.settings.max_pages {
            log::error!(
                "Stopping crawl: page {} still links to a next page",
                cursor.current_page_number
            );
            return Err(CrawlError::PaginationLimitExceeded {
                max_pages: self.settings.max_pages,
            });
        }

        Ok(CrawlState::Paginating {
            state,
            target,
            page: next_page,
        })
    }

    /// One cookie jar per crawl, so the portal's session cookie follows
    /// every postback and never leaks into another crawl.
    fn session_client(&self) -> Result<Client, CrawlError> {
        Client::builder()
            .cookie_store(true)
            .timeout(self.settings.timeout())
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(CrawlError::Client)
    }

    async fn send(&self, request: RequestBuilder, step: CrawlStep) -> Result<String, CrawlError> {
        let transport = move |source| CrawlError::Transport { step, source };

        let response = request
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(transport)?;

        response.text().await.map_err(transport)
    }
}

fn read_session_state(markup: &dyn PortalMarkup, body: &str) -> SessionState {
    let document = Html::parse_document(body);
    markup.session_state(&document)
}

/// Fresh tokens and results from the same response.
fn read_result_page(markup: &dyn PortalMarkup, body: &str) -> (SessionState, ResultPage) {
    let document = Html::parse_document(body);
    (markup.session_state(&document), markup.result_page(&document))
}
