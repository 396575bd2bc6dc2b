//! Header maps.

use indexmap::IndexMap;

/// Ordered header map. Names keep the case they were inserted with;
/// lookups through [`get_header`] ignore case.
pub type Headers = IndexMap<String, String>;

/// Case-insensitive header lookup.
pub fn get_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Combine executor defaults with per-call overrides into a new map.
///
/// An override replaces a default with the same name regardless of case.
/// Neither input is modified.
pub fn merge_headers(defaults: &Headers, overrides: &Headers) -> Headers {
    let mut merged = Headers::with_capacity(defaults.len() + overrides.len());

    for (name, value) in defaults {
        let overridden = overrides.keys().any(|key| key.eq_ignore_ascii_case(name));
        if !overridden {
            merged.insert(name.clone(), value.clone());
        }
    }

    for (name, value) in overrides {
        merged.insert(name.clone(), value.clone());
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_get_header_ignores_case() {
        let h = headers(&[("Content-Type", "application/json")]);
        assert_eq!(get_header(&h, "content-type"), Some("application/json"));
        assert_eq!(get_header(&h, "CONTENT-TYPE"), Some("application/json"));
        assert_eq!(get_header(&h, "accept"), None);
    }

    #[test]
    fn test_merge_overrides_win_case_insensitively() {
        let defaults = headers(&[("Accept", "text/html"), ("X-Client", "httpmaker")]);
        let overrides = headers(&[("accept", "application/json"), ("Authorization", "Bearer t")]);

        let merged = merge_headers(&defaults, &overrides);

        assert_eq!(
            merged,
            headers(&[
                ("X-Client", "httpmaker"),
                ("accept", "application/json"),
                ("Authorization", "Bearer t"),
            ])
        );
        assert_eq!(get_header(&merged, "ACCEPT"), Some("application/json"));
    }

    #[test]
    fn test_merge_does_not_touch_inputs() {
        let defaults = headers(&[("Accept", "text/html")]);
        let overrides = headers(&[("X-Trace", "1")]);
        let defaults_before = defaults.clone();
        let overrides_before = overrides.clone();

        let first = merge_headers(&defaults, &overrides);
        let second = merge_headers(&defaults, &Headers::new());

        assert_eq!(defaults, defaults_before);
        assert_eq!(overrides, overrides_before);
        assert_eq!(first.len(), 2);
        assert_eq!(second, defaults);
    }
}
