//! Structured object names.
//!
//! Registered objects are identified by a name of the form
//! `domain:key=value[,key=value...]`, for example
//! `com.example.pool:type=PooledDataSource,name=main`.
//!
//! An [`ObjectName`] is always well-formed. Identifiers that contain the
//! wildcard marker are not object names at all; they are patterns matched
//! against the registry snapshot (see [`is_pattern`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker that turns an identifier into a pattern.
pub const WILDCARD_MARKER: char = '*';

/// Characters that may not appear in keys or unquoted values.
const RESERVED: [char; 6] = [':', '=', ',', '*', '?', '"'];

/// Returns true if the identifier is a pattern rather than an exact name.
pub fn is_pattern(identifier: &str) -> bool {
    identifier.contains(WILDCARD_MARKER)
}

/// A parsed, well-formed object name.
///
/// Key properties keep the order they were written in, so the string form
/// of a parsed name is identical to its input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectName {
    domain: String,
    properties: Vec<(String, String)>,
}

impl ObjectName {
    /// Parses a textual object name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedObjectName` when the domain separator is
    /// missing, the key property list is empty, a key repeats, or a key or
    /// value is empty or contains reserved characters.
    pub fn parse(text: &str) -> DomainResult<Self> {
        let (domain, list) = text
            .split_once(':')
            .ok_or_else(|| DomainError::object_name(text, "missing ':' after domain"))?;

        if domain.contains(['*', '?']) {
            return Err(DomainError::object_name(text, "domain contains wildcard characters"));
        }
        if domain.contains('\n') {
            return Err(DomainError::object_name(text, "domain contains a newline"));
        }
        if list.is_empty() {
            return Err(DomainError::object_name(text, "key property list is empty"));
        }

        let properties = parse_properties(text, list)?;

        Ok(Self {
            domain: domain.to_string(),
            properties,
        })
    }

    /// Domain part; may be empty (the registry's default domain).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Value of a key property, if present. Quoted values keep their quotes.
    pub fn key_property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Key properties in written order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn parse_properties(name: &str, list: &str) -> DomainResult<Vec<(String, String)>> {
    let mut properties: Vec<(String, String)> = Vec::new();
    let mut rest = list;

    loop {
        let (key, after_key) = rest
            .split_once('=')
            .ok_or_else(|| DomainError::object_name(name, "key property must have the form key=value"))?;
        validate_key(name, key)?;

        let (value, remainder) = if after_key.starts_with('"') {
            split_quoted(name, after_key)?
        } else {
            let (value, remainder) = match after_key.split_once(',') {
                Some((value, remainder)) => (value, Some(remainder)),
                None => (after_key, None),
            };
            validate_unquoted(name, key, value)?;
            (value, remainder)
        };

        if properties.iter().any(|(k, _)| k == key) {
            return Err(DomainError::object_name(name, format!("duplicate key '{key}'")));
        }
        properties.push((key.to_string(), value.to_string()));

        match remainder {
            Some(next) => rest = next,
            None => return Ok(properties),
        }
    }
}

fn validate_key(name: &str, key: &str) -> DomainResult<()> {
    if key.is_empty() {
        return Err(DomainError::object_name(name, "empty key"));
    }
    if key.contains(RESERVED) || key.contains('\n') {
        return Err(DomainError::object_name(name, format!("invalid character in key '{key}'")));
    }
    Ok(())
}

fn validate_unquoted(name: &str, key: &str, value: &str) -> DomainResult<()> {
    if value.is_empty() {
        return Err(DomainError::object_name(name, format!("empty value for key '{key}'")));
    }
    if value.contains(RESERVED) || value.contains('\n') {
        return Err(DomainError::object_name(
            name,
            format!("invalid character in value of key '{key}'"),
        ));
    }
    Ok(())
}

/// Splits a quoted value (starting at its opening quote) from the rest of
/// the property list.
fn split_quoted<'a>(name: &str, text: &'a str) -> DomainResult<(&'a str, Option<&'a str>)> {
    let mut escaped = false;

    for (idx, c) in text.char_indices().skip(1) {
        if escaped {
            if !matches!(c, '"' | '\\' | 'n' | '*' | '?') {
                return Err(DomainError::object_name(name, format!("invalid escape '\\{c}' in quoted value")));
            }
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '\n' => return Err(DomainError::object_name(name, "newline in quoted value")),
            '*' | '?' => {
                return Err(DomainError::object_name(name, "unescaped wildcard in quoted value"));
            }
            '"' => {
                let end = idx + c.len_utf8();
                let value = &text[..end];
                let after = &text[end..];
                return if after.is_empty() {
                    Ok((value, None))
                } else if let Some(next) = after.strip_prefix(',') {
                    Ok((value, Some(next)))
                } else {
                    Err(DomainError::object_name(name, "unexpected text after quoted value"))
                };
            }
            _ => {}
        }
    }

    Err(DomainError::object_name(name, "unterminated quoted value"))
}

impl FromStr for ObjectName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectName> for String {
    fn from(name: ObjectName) -> Self {
        name.to_string()
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (idx, (key, value)) in self.properties.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let name = ObjectName::parse("pkg:type=Cache").unwrap();
        assert_eq!(name.domain(), "pkg");
        assert_eq!(name.key_property("type"), Some("Cache"));
        assert_eq!(name.key_property("name"), None);
    }

    #[test]
    fn test_display_preserves_input_order() {
        let text = "com.mchange.v2.c3p0:type=PooledDataSource,identityToken=z8kflt,name=main";
        let name = ObjectName::parse(text).unwrap();
        assert_eq!(name.to_string(), text);

        let keys: Vec<&str> = name.properties().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["type", "identityToken", "name"]);
    }

    #[test]
    fn test_parse_allows_default_domain() {
        let name = ObjectName::parse(":type=Anonymous").unwrap();
        assert_eq!(name.domain(), "");
    }

    #[test]
    fn test_parse_quoted_value() {
        let name = ObjectName::parse(r#"app:type=Route,path="/api/v1,beta:x""#).unwrap();
        assert_eq!(name.key_property("path"), Some(r#""/api/v1,beta:x""#));

        let escaped = ObjectName::parse(r#"app:type=Route,path="say \"hi\" \*""#).unwrap();
        assert!(escaped.key_property("path").is_some());
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        for text in [
            "no-separator",
            "pkg:",
            "pkg:type",
            "pkg:type=",
            "pkg:=Cache",
            "pkg:type=Cache,",
            "pkg:type=Cache,type=Pool",
            "pkg:type=Ca:che",
            "pk*g:type=Cache",
            "pkg:type=Pool.*",
            "pkg:type=?",
            r#"pkg:type="open"#,
            r#"pkg:type="a"b"#,
            r#"pkg:type="bad \x escape""#,
            r#"pkg:type="star*""#,
        ] {
            let result = ObjectName::parse(text);
            assert!(
                matches!(result, Err(DomainError::MalformedObjectName { .. })),
                "expected failure for {text:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_is_pattern() {
        assert!(is_pattern("pkg:type=Pool.*"));
        assert!(is_pattern("*:*"));
        assert!(!is_pattern("pkg:type=Pool"));
    }

    #[test]
    fn test_serde_uses_string_form() {
        let name = ObjectName::parse("pkg:type=Pool,name=a").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"pkg:type=Pool,name=a\"");

        let bad: Result<ObjectName, _> = serde_json::from_str("\"not a name\"");
        assert!(bad.is_err());
    }
}
