use once_cell::sync::Lazy;
use regex::Regex;

static DASH_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([a-z\d])").unwrap());

pub fn dash_case_to_camel_case(input: &str) -> String {
    DASH_CASE
        .replace_all(input, |captures: &regex::Captures| captures[1].to_uppercase())
        .into_owned()
}

/// Registration name of a directive: `[foo-bar]`, `foo-bar` and `.foo-bar` all become `fooBar`.
pub fn directive_name_from_selector(selector: &str) -> String {
    let selector = selector.trim();
    let bare = selector
        .strip_prefix('[')
        .and_then(|selector| selector.strip_suffix(']'))
        .or_else(|| selector.strip_prefix('.'))
        .unwrap_or(selector);

    dash_case_to_camel_case(bare.trim())
}

/// Legacy `restrict` value matching the selector kind.
pub fn restrict_from_selector(selector: &str) -> &'static str {
    let selector = selector.trim();
    if selector.starts_with('[') {
        "A"
    } else if selector.starts_with('.') {
        "C"
    } else {
        "E"
    }
}
