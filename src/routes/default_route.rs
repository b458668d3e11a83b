use actix_web::{get, HttpResponse};
use askama::Template;

use crate::domain::county::{County, SEARCHABLE_YEARS};

const DEFAULT_YEAR: u16 = 2024;

#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate {
    counties: Vec<&'static str>,
    min_year: u16,
    max_year: u16,
    default_year: u16,
}

#[get("/")]
async fn default() -> HttpResponse {
    let template = SearchTemplate {
        counties: County::ALL.iter().map(|c| c.as_str()).collect(),
        min_year: *SEARCHABLE_YEARS.start(),
        max_year: *SEARCHABLE_YEARS.end(),
        default_year: DEFAULT_YEAR,
    };

    match template.render() {
        Ok(body) => HttpResponse::Ok().content_type("text/html").body(body),
        Err(e) => {
            log::error!("Failed to render search page: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
