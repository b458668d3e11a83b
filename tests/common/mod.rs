#![allow(dead_code)]

use std::collections::HashMap;

use permits::configuration::{ParcelApiSettings, PortalSettings};
use wiremock::{Match, MockServer, Request};

pub const SEARCH_PATH: &str = "/GCSWebPortal/Search.aspx";
pub const PARCEL_PATH: &str = "/parcels/query";
pub const GRID_ID: &str = "ctl00_cphMainApp_GridViewPermitResults";
pub const PAGER_TARGET: &str = "ctl00$cphMainApp$GridViewPermitResults";

pub fn portal_settings(server: &MockServer, max_pages: usize) -> PortalSettings {
    PortalSettings {
        search_url: format!("{}{}", server.uri(), SEARCH_PATH),
        timeout_secs: 5,
        max_pages,
        page_delay_ms: 0,
        department: "ZONING DEPARTMENT".to_string(),
        application_type: "UDC Administration".to_string(),
        user_agent: "permits-test".to_string(),
    }
}

pub fn parcel_settings(server: &MockServer) -> ParcelApiSettings {
    ParcelApiSettings {
        query_url: format!("{}{}", server.uri(), PARCEL_PATH),
        timeout_secs: 5,
        concurrency: 3,
    }
}

pub fn hidden_fields(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="{0}" />
<input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="gen-{0}" />
<input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="ev-{0}" />"#,
        token
    )
}

/// The empty search form served on the first GET.
pub fn search_form(token: &str) -> String {
    format!(
        "<html><body><form method=\"post\">{}</form></body></html>",
        hidden_fields(token)
    )
}

/// `(permit type, parcel, owner, address)`
pub type Row<'a> = (&'a str, &'a str, &'a str, &'a str);

/// A results page rendered the way the GCS grid view renders it.
pub fn results_page(token: &str, rows: &[Row<'_>], current: u32, total_pages: u32) -> String {
    let body_rows: String = rows
        .iter()
        .map(|(permit_type, parcel, owner, address)| {
            format!(
                "<tr><td>{}</td><td>P-0001</td><td>01/02/2024</td><td>Issued</td><td>{}</td><td>T. Alma</td><td>{}</td><td>{}</td></tr>",
                permit_type, parcel, owner, address
            )
        })
        .collect();

    let pager = if total_pages > 1 {
        let cells: String = (1..=total_pages)
            .map(|p| {
                if p == current {
                    format!("<td><span>{}</span></td>", p)
                } else {
                    format!(
                        "<td><a href=\"javascript:__doPostBack('{}','Page${}')\">{}</a></td>",
                        PAGER_TARGET, p, p
                    )
                }
            })
            .collect();
        format!(
            "<tr><td colspan=\"8\"><table><tr>{}</tr></table></td></tr>",
            cells
        )
    } else {
        String::new()
    };

    format!(
        r#"<html><body><form method="post">{}
<table id="{}">
<tr><th>Permit Type</th><th>Permit #</th><th>Issued</th><th>Status</th><th>Parcel</th><th>Municipality</th><th>Owner</th><th>Address</th></tr>
{}{}
</table></form></body></html>"#,
        hidden_fields(token),
        GRID_ID,
        body_rows,
        pager
    )
}

/// Matches a form-encoded body by its decoded fields.
pub struct FormFields {
    present: Vec<(String, String)>,
    absent: Vec<String>,
}

impl FormFields {
    pub fn new() -> Self {
        FormFields {
            present: vec![],
            absent: vec![],
        }
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.present.push((name.to_string(), value.to_string()));
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.absent.push(name.to_string());
        self
    }

    /// Tokens a postback must echo after the portal rendered `token`.
    pub fn echoing(self, token: &str) -> Self {
        self.with("__VIEWSTATE", token)
            .with("__VIEWSTATEGENERATOR", &format!("gen-{}", token))
            .with("__EVENTVALIDATION", &format!("ev-{}", token))
            .with("__EVENTARGUMENT", "")
            .with(
                "ctl00$cphMainApp$PermitSearchCriteria1$DropDownListDepartment",
                "ZONING DEPARTMENT",
            )
            .with(
                "ctl00$cphMainApp$PermitSearchCriteria1$DropDownListAppType",
                "UDC Administration",
            )
    }
}

impl Match for FormFields {
    fn matches(&self, request: &Request) -> bool {
        let fields: HashMap<String, String> = url::form_urlencoded::parse(&request.body)
            .into_owned()
            .collect();

        self.present
            .iter()
            .all(|(name, value)| fields.get(name) == Some(value))
            && self.absent.iter().all(|name| !fields.contains_key(name))
    }
}
