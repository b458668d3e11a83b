use actix_web::{get, http::header, web, HttpResponse};
use askama::Template;
use serde::Deserialize;

use crate::{
    configuration::ApplicationSettings,
    domain::{
        county::PermitQuery,
        permit::{export_csv, EnrichedPermit},
    },
    services::{PermitCrawler, PermitReport, ReportCache},
};

#[derive(Deserialize)]
struct PermitSearchQuery {
    county: String,
    year: u16,
}

struct PermitRow {
    permit_type: String,
    parcel_number: String,
    owner: String,
    property_address: String,
    latitude: String,
    longitude: String,
    mailing_address: String,
    map_link: String,
}

impl From<&EnrichedPermit> for PermitRow {
    fn from(permit: &EnrichedPermit) -> Self {
        PermitRow {
            permit_type: permit.record.permit_type.clone(),
            parcel_number: permit.record.parcel_number.clone(),
            owner: permit.record.owner.clone(),
            property_address: permit.record.property_address.clone(),
            latitude: permit.latitude().map(|v| v.to_string()).unwrap_or_default(),
            longitude: permit.longitude().map(|v| v.to_string()).unwrap_or_default(),
            mailing_address: permit.mailing_address().unwrap_or_default().to_string(),
            map_link: permit.map_link(),
        }
    }
}

#[derive(Template)]
#[template(path = "permits.html")]
struct PermitsTemplate {
    county: String,
    year: u16,
    rows: Vec<PermitRow>,
    resolved: usize,
}

fn permit_query(query: &PermitSearchQuery) -> Result<PermitQuery, HttpResponse> {
    PermitQuery::parse(&query.county, query.year)
        .map_err(|e| HttpResponse::BadRequest().body(e.to_string()))
}

async fn run_search(
    crawler: &PermitCrawler,
    settings: &ApplicationSettings,
    cache: &ReportCache,
    permit_query: &PermitQuery,
) -> Result<PermitReport, HttpResponse> {
    let report = crawler
        .fetch_permits_within(permit_query, settings.crawl_deadline())
        .await
        .map_err(|e| {
            log::error!(
                "Permit crawl for {} {} failed: {}",
                permit_query.county(),
                permit_query.year(),
                e
            );
            HttpResponse::ServiceUnavailable()
                .body(format!("Permit portal unavailable, try again later. ({})", e))
        })?;

    cache.insert(report.clone());
    Ok(report)
}

#[get("/permits")]
async fn permits(
    crawler: web::Data<PermitCrawler>,
    settings: web::Data<ApplicationSettings>,
    cache: web::Data<ReportCache>,
    query: web::Query<PermitSearchQuery>,
) -> HttpResponse {
    let permit_query = match permit_query(&query) {
        Ok(permit_query) => permit_query,
        Err(response) => return response,
    };
    let report = match run_search(&crawler, &settings, &cache, &permit_query).await {
        Ok(report) => report,
        Err(response) => return response,
    };

    let template = PermitsTemplate {
        county: report.query.county().to_string(),
        year: report.query.year(),
        resolved: report.resolved_count(),
        rows: report.permits.iter().map(PermitRow::from).collect(),
    };

    match template.render() {
        Ok(body) => HttpResponse::Ok().content_type("text/html").body(body),
        Err(e) => {
            log::error!("Failed to render permits page: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Exports the table last shown for this search. Only crawls when nothing
/// is cached, e.g. when the export link is opened directly.
#[get("/permits/export")]
async fn export(
    crawler: web::Data<PermitCrawler>,
    settings: web::Data<ApplicationSettings>,
    cache: web::Data<ReportCache>,
    query: web::Query<PermitSearchQuery>,
) -> HttpResponse {
    let permit_query = match permit_query(&query) {
        Ok(permit_query) => permit_query,
        Err(response) => return response,
    };
    let report = match cache.get(&permit_query) {
        Some(report) => report,
        None => match run_search(&crawler, &settings, &cache, &permit_query).await {
            Ok(report) => report,
            Err(response) => return response,
        },
    };

    let filename = format!(
        "{}_permits_{}.csv",
        report.query.county(),
        report.query.year()
    );

    HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(export_csv(&report.permits))
}
