use scraper::{Html, Selector};

use crate::domain::portal_page::SessionState;

pub const VIEW_STATE: &str = "__VIEWSTATE";
pub const EVENT_VALIDATION: &str = "__EVENTVALIDATION";
pub const VIEW_STATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";

/// Reads the three hidden postback fields. A missing field comes back as an
/// empty string; the portal decides whether the next request is acceptable.
pub fn extract_session_state(document: &Html) -> SessionState {
    SessionState {
        view_state: hidden_value(document, VIEW_STATE),
        event_validation: hidden_value(document, EVENT_VALIDATION),
        view_state_generator: hidden_value(document, VIEW_STATE_GENERATOR),
    }
}

fn hidden_value(document: &Html, field: &str) -> String {
    // The id wins over a same-named input elsewhere in the form.
    ["id", "name"]
        .into_iter()
        .find_map(|attr| first_input(document, attr, field))
        .unwrap_or_default()
}

fn first_input(document: &Html, attr: &str, field: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"input[{}="{}"]"#, attr, field)).ok()?;
    let input = document.select(&selector).next()?;
    Some(input.value().attr("value").unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::extract_session_state;

    #[test]
    fn reads_all_hidden_fields() {
        let document = Html::parse_document(
            r#"<html><body><form>
                <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="dDwtMTA4" />
                <input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="CA0B0334" />
                <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="/wEdAAk=" />
            </form></body></html>"#,
        );

        let state = extract_session_state(&document);

        assert_eq!(state.view_state, "dDwtMTA4");
        assert_eq!(state.view_state_generator, "CA0B0334");
        assert_eq!(state.event_validation, "/wEdAAk=");
    }

    #[test]
    fn missing_fields_are_empty() {
        let document = Html::parse_document(
            r#"<html><body><input id="__VIEWSTATE" value="abc" /><input id="__EVENTVALIDATION" /></body></html>"#,
        );

        let state = extract_session_state(&document);

        assert_eq!(state.view_state, "abc");
        assert_eq!(state.event_validation, "");
        assert_eq!(state.view_state_generator, "");
    }

    #[test]
    fn falls_back_to_name_attribute() {
        let document =
            Html::parse_document(r#"<input type="hidden" name="__VIEWSTATEGENERATOR" value="X1" />"#);

        assert_eq!(extract_session_state(&document).view_state_generator, "X1");
    }

    #[test]
    fn id_match_wins_over_earlier_name_match() {
        let document = Html::parse_document(
            r#"<html><body><form>
                <input type="hidden" name="__VIEWSTATE" value="stale" />
                <input type="hidden" id="__VIEWSTATE" value="current" />
            </form></body></html>"#,
        );

        assert_eq!(extract_session_state(&document).view_state, "current");
    }
}
