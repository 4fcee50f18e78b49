//! Path segment and query string encoding

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but unreserved characters is escaped
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Escape one path segment (database or layout name)
pub(crate) fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Ordered `key=value` pairs joined with `&`
#[derive(Debug, Default)]
pub(crate) struct QueryString {
    pairs: Vec<String>,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.pairs.push(format!(
            "{}={}",
            utf8_percent_encode(key, COMPONENT),
            utf8_percent_encode(value, COMPONENT)
        ));
    }

    /// None when no pairs were pushed
    pub fn finish(self) -> Option<String> {
        if self.pairs.is_empty() {
            None
        } else {
            Some(self.pairs.join("&"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_escapes_spaces_and_slashes() {
        assert_eq!(segment("Fruit List/2"), "Fruit%20List%2F2");
        assert_eq!(segment("plain_name-1.x"), "plain_name-1.x");
    }

    #[test]
    fn test_query_string_order_and_escape() {
        let mut qs = QueryString::new();
        qs.push("_limit", "10");
        qs.push("portal", "[\"Orders\"]");
        assert_eq!(
            qs.finish().as_deref(),
            Some("_limit=10&portal=%5B%22Orders%22%5D")
        );
    }

    #[test]
    fn test_empty_query_string() {
        assert_eq!(QueryString::new().finish(), None);
    }
}
