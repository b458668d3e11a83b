use super::permit::PermitRecord;

/// Hidden postback tokens rendered by the portal. Echoed back verbatim and
/// replaced wholesale after every response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub view_state: String,
    pub event_validation: String,
    pub view_state_generator: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    pub current_page_number: u32,
    pub next_postback_target: Option<String>,
}

impl PaginationCursor {
    /// Cursor for a page with no results table: page 1, nothing after it.
    pub fn last_page() -> Self {
        PaginationCursor {
            current_page_number: 1,
            next_postback_target: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_postback_target.is_some()
    }
}

/// One anchor of the results pager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerLink {
    pub label: String,
    pub postback_target: Option<String>,
}

impl PagerLink {
    pub fn page_number(&self) -> Option<u32> {
        self.label.trim().parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub records: Vec<PermitRecord>,
    pub cursor: PaginationCursor,
}

impl ResultPage {
    pub fn empty() -> Self {
        ResultPage {
            records: vec![],
            cursor: PaginationCursor::last_page(),
        }
    }
}
