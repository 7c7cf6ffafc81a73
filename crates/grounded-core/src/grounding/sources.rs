//! Source de-duplication.

use grounded_types::Source;
use std::collections::HashSet;
use url::Url;

/// Drop repeated sources, keeping the first occurrence and the original order.
pub fn deduplicate_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::with_capacity(sources.len());
    sources.into_iter().filter(|s| seen.insert(dedup_key(s))).collect()
}

/// Identity used for de-duplication.
///
/// Untitled-uri sources (file store passages) fall back to their title.
fn dedup_key(source: &Source) -> String {
    let uri = source.uri.trim();
    if uri.is_empty() {
        return format!("title:{}", source.title.trim().to_lowercase());
    }
    normalize_uri(uri)
}

/// Canonical form of a URI: lowercase scheme and host, default port dropped,
/// fragment dropped, trailing slash removed, query pairs sorted.
///
/// Unparseable values are compared as trimmed lowercase strings.
pub fn normalize_uri(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.trim().to_lowercase();
    };

    url.set_fragment(None);

    let trimmed_path = url.path().trim_end_matches('/').to_string();
    if trimmed_path.len() < url.path().len() && !trimmed_path.is_empty() {
        url.set_path(&trimmed_path);
    }

    let mut pairs: Vec<(String, String)> =
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    let mut normalized = url.to_string();
    // Root path serializes as a bare "/"
    if url.query().is_none() && url.path() == "/" && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_first_occurrence_and_order() {
        let input = vec![
            Source::new("A", "https://a.gov.tr/x"),
            Source::new("B", "https://b.com"),
            Source::new("A again", "https://a.gov.tr/x"),
        ];
        let out = deduplicate_sources(input);
        let titles: Vec<&str> = out.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_normalization_variants_collapse() {
        let input = vec![
            Source::new("1", "https://Mevzuat.GOV.tr/kanun/"),
            Source::new("2", "https://mevzuat.gov.tr/kanun#madde-5"),
            Source::new("3", "https://mevzuat.gov.tr:443/kanun"),
        ];
        assert_eq!(deduplicate_sources(input).len(), 1);
    }

    #[test]
    fn test_query_order_is_ignored() {
        assert_eq!(
            normalize_uri("https://x.com/s?b=2&a=1"),
            normalize_uri("https://x.com/s?a=1&b=2")
        );
    }

    #[test]
    fn test_distinct_paths_survive() {
        let input = vec![
            Source::new("1", "https://x.com/a"),
            Source::new("2", "https://x.com/b"),
        ];
        assert_eq!(deduplicate_sources(input).len(), 2);
    }

    #[test]
    fn test_unparseable_and_empty_uris() {
        let input = vec![
            Source::new("doc.pdf", ""),
            Source::new("DOC.pdf", ""),
            Source::new("other.pdf", ""),
            Source::new("x", "not a url"),
            Source::new("y", " NOT A URL "),
        ];
        let out = deduplicate_sources(input);
        let titles: Vec<&str> = out.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["doc.pdf", "other.pdf", "x"]);
    }

    #[test]
    fn test_deduplication_is_idempotent() {
        let input = vec![
            Source::new("1", "https://X.com/"),
            Source::new("2", "https://x.com"),
            Source::new("3", "https://x.com/a?b=2&a=1#frag"),
            Source::new("4", "https://x.com/a?a=1&b=2"),
            Source::new("doc.pdf", ""),
            Source::new("Doc.PDF", ""),
            Source::new("5", "not a url"),
        ];
        let once = deduplicate_sources(input);
        let twice = deduplicate_sources(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 4);
    }

    #[test]
    fn test_normalize_uri_is_idempotent() {
        let uris = [
            "https://X.com/",
            "https://x.com",
            "http://Example.com:80/path/",
            "https://mevzuat.gov.tr:443/kanun#madde-5",
            "https://x.com/s?b=2&a=1",
            "https://x.com/s?q=a%20b",
            "https://x.com/?",
            "HTTPS://x.com/A/b/",
            " not a url ",
            "mailto:info@adalet.gov.tr",
        ];
        for uri in uris {
            let once = normalize_uri(uri);
            assert_eq!(normalize_uri(&once), once, "{}", uri);
        }
        assert_eq!(normalize_uri("https://X.com/"), "https://x.com");
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate_sources(Vec::new()).is_empty());
    }
}
