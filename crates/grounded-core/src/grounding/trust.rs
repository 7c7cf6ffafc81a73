//! Domain trust classification.

use grounded_types::Source;
use url::Url;

/// Classifies sources against an allow-list of official domains.
#[derive(Debug, Clone)]
pub struct DomainTrustClassifier {
    domains: Vec<String>,
}

impl DomainTrustClassifier {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_end_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// A host is trusted when it equals a listed domain or is a subdomain of
    /// one. `evil-mevzuat.gov.tr` does not match `mevzuat.gov.tr`.
    pub fn is_trusted_uri(&self, uri: &str) -> bool {
        let Ok(url) = Url::parse(uri.trim()) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.trim_end_matches('.').to_lowercase();
        self.domains
            .iter()
            .any(|d| host == *d || host.strip_suffix(d.as_str()).is_some_and(|p| p.ends_with('.')))
    }

    /// Annotate every source with its trust flag. Order is preserved.
    pub fn classify(&self, sources: Vec<Source>) -> Vec<Source> {
        sources
            .into_iter()
            .map(|mut s| {
                s.is_trusted = Some(self.is_trusted_uri(&s.uri));
                s
            })
            .collect()
    }
}
