//! Object identifier resolution.
//!
//! Identifiers come in two forms. Exact identifiers are parsed into an
//! [`ObjectName`]. Identifiers containing the wildcard marker `*` are
//! patterns: they are compiled as regular expressions that must match a whole
//! identifier, and resolved by a linear scan of the live registry snapshot.
//! The first match in snapshot order wins. That order is whatever the registry
//! reports, so with several matches any one of them may come back.

use mxr_core::{is_pattern, ObjectName};
use regex::Regex;
use tracing::debug;

use crate::connection::RegistryConnection;
use crate::error::{QueryError, Result};

// ============================================================================
// Pattern Matching
// ============================================================================

/// Compiled pattern identifier.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Compiles `pattern` so that it must match an entire identifier.
    ///
    /// # Errors
    ///
    /// `QueryError::InvalidPattern` if the text is not a valid expression.
    pub fn compile(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            QueryError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.regex.is_match(identifier)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Returns the first identifier of `snapshot` matching `pattern`.
pub fn first_match<I, S>(snapshot: I, pattern: &NamePattern) -> Option<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    snapshot
        .into_iter()
        .find(|identifier| pattern.matches(identifier.as_ref()))
}

// ============================================================================
// Object Resolver
// ============================================================================

/// Resolves identifiers against the registry behind a connection.
pub struct ObjectResolver<'c> {
    connection: &'c mut RegistryConnection,
}

impl<'c> ObjectResolver<'c> {
    pub fn new(connection: &'c mut RegistryConnection) -> Self {
        Self { connection }
    }

    pub fn connection(&mut self) -> &mut RegistryConnection {
        &mut *self.connection
    }

    /// Parses an exact identifier.
    ///
    /// # Errors
    ///
    /// A parse error when the text is not a well-formed object name.
    pub fn try_resolve_exact(identifier: &str) -> Result<ObjectName> {
        Ok(ObjectName::parse(identifier)?)
    }

    /// Parses an exact identifier, reporting a malformed one.
    pub fn resolve_exact(&self, identifier: &str) -> Option<ObjectName> {
        match Self::try_resolve_exact(identifier) {
            Ok(name) => Some(name),
            Err(e) => {
                self.connection.diagnostics().report(&e);
                None
            }
        }
    }

    /// Queries the registry for every registered identifier.
    ///
    /// # Errors
    ///
    /// `NotConnected` without a session, or the transport's error.
    pub async fn try_list_all(&mut self) -> Result<Vec<String>> {
        let session = self.connection.session()?;
        session.query_names().await
    }

    /// Queries the registry for every registered identifier.
    ///
    /// Listing is best effort: a failure is reported and yields an empty list.
    pub async fn list_all(&mut self) -> Vec<String> {
        match self.try_list_all().await {
            Ok(names) => {
                debug!(count = names.len(), "Listed registered objects");
                names
            }
            Err(e) => {
                self.connection.diagnostics().report(&e);
                Vec::new()
            }
        }
    }

    /// Returns the first registered identifier matching `pattern`.
    ///
    /// No match yields `None`, which callers treat as "nothing to query"
    /// rather than an error.
    pub async fn find_first_matching(&mut self, pattern: &str) -> Option<String> {
        let pattern = match NamePattern::compile(pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                self.connection.diagnostics().report(&e);
                return None;
            }
        };

        let snapshot = self.list_all().await;
        let found = first_match(snapshot, &pattern);

        match &found {
            Some(name) => debug!(pattern = %pattern.as_str(), object = %name, "Pattern resolved"),
            None => self
                .connection
                .diagnostics()
                .notice(&format!("No registered object matches '{}'", pattern.as_str())),
        }
        found
    }

    /// Resolves a user-supplied identifier to the identifier to query.
    ///
    /// Patterns go through [`Self::find_first_matching`]; anything else is
    /// returned unchanged and parsed later by the query itself.
    pub async fn resolve(&mut self, identifier: &str) -> Option<String> {
        if is_pattern(identifier) {
            self.find_first_matching(identifier).await
        } else {
            Some(identifier.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{connection, FakeRegistry, RecordingReporter};
    use serde_json::json;

    fn snapshot() -> Vec<&'static str> {
        vec!["pkg:type=Cache", "pkg:type=Pool,name=a", "pkg:type=Pool,name=b", "other:type=Cache"]
    }

    #[test]
    fn test_first_match_single() {
        let pattern = NamePattern::compile("pkg:type=Pool,name=a.*").unwrap();
        assert_eq!(first_match(snapshot(), &pattern), Some("pkg:type=Pool,name=a"));
    }

    #[test]
    fn test_first_match_none() {
        let pattern = NamePattern::compile("nothing:.*").unwrap();
        assert_eq!(first_match(snapshot(), &pattern), None);
    }

    #[test]
    fn test_first_match_multiple_returns_a_match() {
        let pattern = NamePattern::compile(".*type=Cache.*").unwrap();
        let found = first_match(snapshot(), &pattern).unwrap();
        assert!(pattern.matches(found));
    }

    #[test]
    fn test_pattern_must_match_whole_identifier() {
        let pattern = NamePattern::compile("pkg:type=Pool.*").unwrap();
        assert!(pattern.matches("pkg:type=Pool,name=a"));
        assert!(!pattern.matches("xpkg:type=Pool"));

        let prefix_only = NamePattern::compile("pkg:type=C*").unwrap();
        assert!(!prefix_only.matches("pkg:type=Cache"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = NamePattern::compile("pkg:type=(*");
        assert!(matches!(result, Err(QueryError::InvalidPattern { .. })));
    }

    #[test]
    fn test_try_resolve_exact() {
        let name = ObjectResolver::try_resolve_exact("pkg:type=Pool").unwrap();
        assert_eq!(name.key_property("type"), Some("Pool"));

        let err = ObjectResolver::try_resolve_exact("not-a-name").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_resolve_exact_reports_parse_error() {
        let registry = FakeRegistry::default();
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        let resolver = ObjectResolver::new(&mut conn);

        assert!(resolver.resolve_exact("pkg").is_none());
        assert_eq!(reporter.kinds(), vec![ErrorKind::Parse]);
    }

    #[tokio::test]
    async fn test_list_all_requeries_registry() {
        let registry = FakeRegistry::default().with_object("pkg:type=Cache", &[]);
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;
        let mut resolver = ObjectResolver::new(&mut conn);

        assert_eq!(resolver.list_all().await, vec!["pkg:type=Cache".to_string()]);

        let registry = registry.with_object("pkg:type=Pool", &[("size", "int", json!(42))]);
        assert_eq!(resolver.list_all().await.len(), 2);
        assert_eq!(registry.connects(), 1);
    }

    #[tokio::test]
    async fn test_list_all_degrades_without_connection() {
        let registry = FakeRegistry::default().with_object("pkg:type=Cache", &[]);
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        let mut resolver = ObjectResolver::new(&mut conn);

        assert!(resolver.list_all().await.is_empty());
        assert_eq!(reporter.kinds(), vec![ErrorKind::Connect]);
    }

    #[tokio::test]
    async fn test_list_all_degrades_on_transport_failure() {
        let registry = FakeRegistry::default().with_object("pkg:type=Cache", &[]);
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;
        registry.drop_requests();
        let mut resolver = ObjectResolver::new(&mut conn);

        assert!(resolver.list_all().await.is_empty());
        assert_eq!(reporter.kinds(), vec![ErrorKind::Transport]);
    }

    #[tokio::test]
    async fn test_find_first_matching_against_registry() {
        let registry = FakeRegistry::default()
            .with_object("pkg:type=A", &[])
            .with_object("pkg:type=B", &[])
            .with_object("pkg:type=C", &[]);
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;
        let mut resolver = ObjectResolver::new(&mut conn);

        assert_eq!(
            resolver.find_first_matching("pkg:type=B*").await,
            Some("pkg:type=B".to_string())
        );
        assert_eq!(resolver.find_first_matching("pkg:type=Z.*").await, None);

        let any = resolver.find_first_matching("pkg:.*").await.unwrap();
        assert!(NamePattern::compile("pkg:.*").unwrap().matches(&any));

        // No match is not an error
        assert!(reporter.kinds().is_empty());
        assert_eq!(reporter.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_find_first_matching_invalid_pattern_reported() {
        let registry = FakeRegistry::default().with_object("pkg:type=A", &[]);
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;
        let mut resolver = ObjectResolver::new(&mut conn);

        assert_eq!(resolver.find_first_matching("pkg:type=[*").await, None);
        assert_eq!(reporter.kinds(), vec![ErrorKind::Parse]);
    }

    #[tokio::test]
    async fn test_resolve_passes_exact_identifiers_through() {
        let registry = FakeRegistry::default();
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        let mut resolver = ObjectResolver::new(&mut conn);

        // No registry round trip for exact names
        assert_eq!(
            resolver.resolve("pkg:type=Pool").await,
            Some("pkg:type=Pool".to_string())
        );
        assert!(reporter.kinds().is_empty());
    }
}
