use scraper::{ElementRef, Html, Selector};

use crate::domain::{
    permit::PermitRecord,
    portal_page::{PagerLink, PaginationCursor, ResultPage},
};

const MIN_CELLS: usize = 8;
const PERMIT_TYPE_COLUMN: usize = 0;
const PARCEL_NUMBER_COLUMN: usize = 4;
const OWNER_COLUMN: usize = 6;
const PROPERTY_ADDRESS_COLUMN: usize = 7;

const POSTBACK_CALL: &str = "__doPostBack(";

/// Parses the permit grid identified by `table_id` and its pager. A document
/// without the grid is a page with no results and nothing after it.
pub fn parse_result_table(document: &Html, table_id: &str) -> ResultPage {
    let Ok(table_selector) = Selector::parse(&format!(r#"table[id="{}"]"#, table_id)) else {
        return ResultPage::empty();
    };
    let Some(table) = document.select(&table_selector).next() else {
        return ResultPage::empty();
    };

    let records = grid_rows(table)
        .skip(1)
        .filter_map(permit_from_row)
        .collect();

    ResultPage {
        records,
        cursor: pagination_cursor(document, table_id),
    }
}

/// Rows that belong to the grid itself, not to the table nested in its pager.
fn grid_rows(table: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    child_elements(table).flat_map(|child| match child.value().name() {
        "tr" => vec![child],
        "thead" | "tbody" | "tfoot" => child_elements(child)
            .filter(|row| row.value().name() == "tr")
            .collect(),
        _ => vec![],
    })
}

fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

fn permit_from_row(row: ElementRef<'_>) -> Option<PermitRecord> {
    let cells: Vec<String> = child_elements(row)
        .filter(|cell| cell.value().name() == "td")
        .map(cell_text)
        .collect();

    if cells.len() < MIN_CELLS {
        return None;
    }

    Some(PermitRecord {
        permit_type: cells[PERMIT_TYPE_COLUMN].clone(),
        parcel_number: cells[PARCEL_NUMBER_COLUMN].clone(),
        owner: cells[OWNER_COLUMN].clone(),
        property_address: cells[PROPERTY_ADDRESS_COLUMN].clone(),
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn pagination_cursor(document: &Html, table_id: &str) -> PaginationCursor {
    let current_page_number = current_page_number(document, table_id).unwrap_or(1);

    // An indicator at u32::MAX has no following page.
    let next_postback_target = current_page_number
        .checked_add(1)
        .and_then(|next| {
            pager_links(document, table_id)
                .into_iter()
                .find(|link| link.page_number() == Some(next))
        })
        .and_then(|link| link.postback_target);

    PaginationCursor {
        current_page_number,
        next_postback_target,
    }
}

fn current_page_number(document: &Html, table_id: &str) -> Option<u32> {
    let selector = Selector::parse(&format!(
        r#"table[id="{}"] tr td table tr td span"#,
        table_id
    ))
    .ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|span| cell_text(span).parse().ok())
}

/// Pager anchors in document order.
pub fn pager_links(document: &Html, table_id: &str) -> Vec<PagerLink> {
    let Ok(selector) = Selector::parse(&format!(
        r#"table[id="{}"] tr td table tr td a"#,
        table_id
    )) else {
        return vec![];
    };

    document
        .select(&selector)
        .map(|a| PagerLink {
            label: cell_text(a),
            postback_target: a.value().attr("href").and_then(postback_target),
        })
        .collect()
}

/// First quoted argument of a `javascript:__doPostBack('target','arg')` href.
pub fn postback_target(href: &str) -> Option<String> {
    let (_, args) = href.split_once(POSTBACK_CALL)?;
    let args = args.trim_start();
    let quote = args.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &args[quote.len_utf8()..];
    let end = rest.find(quote)?;

    match &rest[..end] {
        "" => None,
        target => Some(target.to_string()),
    }
}
