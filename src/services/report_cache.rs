use std::{collections::HashMap, sync::Mutex};

use crate::domain::county::PermitQuery;

use super::PermitReport;

const CACHE_RESET_LEN: usize = 16;

/// Last report fetched per `(county, year)`, so an export reuses the table
/// the user was shown instead of crawling the portal again.
#[derive(Default)]
pub struct ReportCache {
    reports: Mutex<HashMap<PermitQuery, PermitReport>>,
}

impl ReportCache {
    pub fn get(&self, query: &PermitQuery) -> Option<PermitReport> {
        match self.reports.lock() {
            Ok(reports) => reports.get(query).cloned(),
            Err(e) => {
                log::error!("Report cache lock poisoned: {:?}", e);
                None
            }
        }
    }

    pub fn insert(&self, report: PermitReport) {
        let Ok(mut reports) = self.reports.lock() else {
            log::error!("Report cache lock poisoned, dropping report");
            return;
        };
        if reports.len() >= CACHE_RESET_LEN && !reports.contains_key(&report.query) {
            reports.clear();
        }
        reports.insert(report.query, report);
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::county::{County, PermitQuery};

    use super::*;

    fn report(year: u16) -> PermitReport {
        PermitReport {
            query: PermitQuery::new(County::Buffalo, year).unwrap(),
            permits: vec![],
            pages_crawled: 1,
        }
    }

    #[test]
    fn latest_report_replaces_earlier_one() {
        let cache = ReportCache::default();
        let query = PermitQuery::new(County::Buffalo, 2024).unwrap();

        cache.insert(report(2024));
        let mut newer = report(2024);
        newer.pages_crawled = 3;
        cache.insert(newer);

        assert_eq!(cache.get(&query).map(|r| r.pages_crawled), Some(3));
        assert!(cache.get(&PermitQuery::new(County::Buffalo, 2023).unwrap()).is_none());
    }

    #[test]
    fn cache_resets_once_full() {
        let cache = ReportCache::default();
        for year in 2000..2000 + CACHE_RESET_LEN as u16 {
            cache.insert(report(year));
        }
        cache.insert(report(2020));

        assert!(cache.get(&PermitQuery::new(County::Buffalo, 2000).unwrap()).is_none());
        assert!(cache.get(&PermitQuery::new(County::Buffalo, 2020).unwrap()).is_some());
    }
}
