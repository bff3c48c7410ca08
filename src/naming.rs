//! Name parsing shared by every asset kind

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::config::VERSION_GROUP;

/// Version number of `base_name`.
///
/// Patterns are tried in order and the first one with any match decides.
/// Within that pattern the last match wins, so
/// `rvb300_match_30mlCamZv03_v006` is version 6, not 3.
pub fn extract_version(base_name: &str, patterns: &[Regex]) -> Option<u32> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures_iter(base_name)
            .filter_map(|caps| caps.name(VERSION_GROUP))
            .last()
            .and_then(|m| m.as_str().parse().ok())
    })
}

static VERSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_.]v[0-9]+").expect("valid regex"));

static TEMPLATE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z]+)\}").expect("valid regex"));

static TEMPLATE_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}([a-zA-Z_.-]+)\{").expect("valid regex"));

/// `base_name` with every `_v<digits>` / `.v<digits>` token removed.
pub fn core_name(base_name: &str) -> String {
    VERSION_TOKEN.replace_all(base_name, "").into_owned()
}

/// Token names (`{shot}`) and the first delimiter between two tokens.
fn parse_name_template(template: &str) -> (Vec<&str>, Option<&str>) {
    let tokens = TEMPLATE_FIELD
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    let delimiter = TEMPLATE_DELIMITER
        .captures(template)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    (tokens, delimiter)
}

/// Match a `{shot}_{task}` template against `core_name`.
///
/// The name is split on the first delimiter found between two tokens. A
/// token/value count mismatch is not an error: it logs a warning and yields
/// `None`.
pub fn fields_from_name(core_name: &str, template: &str) -> Option<BTreeMap<String, String>> {
    if template.is_empty() {
        return None;
    }
    let (tokens, delimiter) = parse_name_template(template);
    let values: Vec<&str> = match delimiter {
        Some(delimiter) => core_name.split(delimiter).collect(),
        None => vec![core_name],
    };

    if tokens.len() != values.len() {
        warn!("Template {} does not match the name {}", template, core_name);
        return None;
    }

    Some(
        tokens
            .into_iter()
            .map(str::to_string)
            .zip(values.into_iter().map(str::to_string))
            .collect(),
    )
}
