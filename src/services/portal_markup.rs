use scraper::Html;

use crate::domain::portal_page::{ResultPage, SessionState};

use super::{
    form_state::{extract_session_state, EVENT_VALIDATION, VIEW_STATE, VIEW_STATE_GENERATOR},
    result_table::parse_result_table,
};

const EVENT_TARGET: &str = "__EVENTTARGET";
const EVENT_ARGUMENT: &str = "__EVENTARGUMENT";

/// Search inputs sent with every postback.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub department: String,
    pub application_type: String,
    pub year: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Postback<'a> {
    /// The search button was pressed.
    Search,
    /// A pager link was followed.
    Page(&'a str),
}

/// How one family of permit portals lays out its form and results.
pub trait PortalMarkup: Send + Sync {
    fn session_state(&self, document: &Html) -> SessionState;

    fn result_page(&self, document: &Html) -> ResultPage;

    fn postback_form(
        &self,
        state: &SessionState,
        criteria: &SearchCriteria,
        postback: Postback<'_>,
    ) -> Vec<(&'static str, String)>;
}

/// GCS web portal, as served for Buffalo county.
pub struct GcsPortalMarkup;

impl GcsPortalMarkup {
    pub const RESULTS_GRID_ID: &'static str = "ctl00_cphMainApp_GridViewPermitResults";
    const DEPARTMENT_FIELD: &'static str =
        "ctl00$cphMainApp$PermitSearchCriteria1$DropDownListDepartment";
    const APPLICATION_TYPE_FIELD: &'static str =
        "ctl00$cphMainApp$PermitSearchCriteria1$DropDownListAppType";
    const YEAR_FIELD: &'static str = "ctl00$cphMainApp$PermitSearchCriteria1$TextBoxYear";
    const SEARCH_BUTTON_FIELD: &'static str = "ButtonPermitSearch";
}

impl PortalMarkup for GcsPortalMarkup {
    fn session_state(&self, document: &Html) -> SessionState {
        extract_session_state(document)
    }

    fn result_page(&self, document: &Html) -> ResultPage {
        parse_result_table(document, Self::RESULTS_GRID_ID)
    }

    fn postback_form(
        &self,
        state: &SessionState,
        criteria: &SearchCriteria,
        postback: Postback<'_>,
    ) -> Vec<(&'static str, String)> {
        let event_target = match postback {
            Postback::Search => String::new(),
            Postback::Page(target) => target.to_string(),
        };

        let mut form = vec![
            (EVENT_TARGET, event_target),
            (EVENT_ARGUMENT, String::new()),
            (VIEW_STATE, state.view_state.clone()),
            (VIEW_STATE_GENERATOR, state.view_state_generator.clone()),
            (EVENT_VALIDATION, state.event_validation.clone()),
            (Self::DEPARTMENT_FIELD, criteria.department.clone()),
            (Self::APPLICATION_TYPE_FIELD, criteria.application_type.clone()),
            (Self::YEAR_FIELD, criteria.year.to_string()),
        ];
        if postback == Postback::Search {
            form.push((Self::SEARCH_BUTTON_FIELD, "Search".to_string()));
        }

        form
    }
}
