//! Namespace resolution over a root element's declarations.
//!
//! Root attributes fall into two groups: `xmlns:p="..."` declarations give a
//! prefix its target namespace, and any other `p:name="..."` attribute is
//! recorded against prefix `p` as a declared attribute. The XML Schema
//! instance namespace may carry a `schemaLocation` list of
//! `namespace url` pairs, which decides where each namespace's views are
//! loaded from.

use indexmap::IndexMap;

use crate::error::NamespaceError;
use crate::vocabulary::{SCHEMA_LOCATION, XMLNS_PREFIX, XSI_NAMESPACE, is_template_namespace};

/// One declared prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    /// What the prefix means. `None` when the prefix was only seen on an
    /// attribute and never declared.
    pub target_namespace: Option<String>,
    /// Where views in this namespace are loaded from.
    pub url: Option<String>,
    /// Non-xmlns attributes written with this prefix, by local name.
    pub declared_attributes: IndexMap<String, String>,
}

impl Namespace {
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_template(&self) -> bool {
        self.target_namespace().is_some_and(is_template_namespace)
    }

    fn targets(&self, namespace: &str) -> bool {
        self.target_namespace()
            .is_some_and(|t| t.eq_ignore_ascii_case(namespace))
    }
}

/// Prefix to [`Namespace`] table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    entries: IndexMap<String, Namespace>,
}

impl NamespaceTable {
    /// Builds the table from qualified attribute names and values.
    ///
    /// # Errors
    ///
    /// `NamespaceError::OddSchemaLocation` if `xsi:schemaLocation` does not
    /// split into whole pairs.
    pub fn resolve<I, K, V>(attributes: I) -> Result<Self, NamespaceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries: IndexMap<String, Namespace> = IndexMap::new();

        for (name, value) in attributes {
            let Some((prefix, suffix)) = name.as_ref().split_once(':') else {
                continue;
            };
            let value = value.as_ref().to_string();

            if prefix.eq_ignore_ascii_case(XMLNS_PREFIX) {
                entries.entry(suffix.to_string()).or_default().target_namespace = Some(value);
            } else {
                entries
                    .entry(prefix.to_string())
                    .or_default()
                    .declared_attributes
                    .insert(suffix.to_string(), value);
            }
        }

        let mut table = Self { entries };
        table.apply_schema_locations()?;

        for ns in table.entries.values_mut() {
            if ns.url.is_none() {
                ns.url = ns.target_namespace.clone();
            }
        }

        log::trace!("Resolved {} namespace(s)", table.entries.len());
        Ok(table)
    }

    fn apply_schema_locations(&mut self) -> Result<(), NamespaceError> {
        let Some(locations) = self
            .find_by_target(XSI_NAMESPACE)
            .and_then(|xsi| xsi.declared_attributes.get(SCHEMA_LOCATION))
            .cloned()
        else {
            return Ok(());
        };

        let tokens: Vec<&str> = locations.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            return Err(NamespaceError::OddSchemaLocation {
                count: tokens.len(),
            });
        }

        for pair in tokens.chunks_exact(2) {
            let (namespace, url) = (pair[0], pair[1]);
            match self.entries.values_mut().find(|ns| ns.targets(namespace)) {
                Some(ns) => ns.url = Some(url.to_string()),
                None => log::debug!("schemaLocation names undeclared namespace '{}'", namespace),
            }
        }
        Ok(())
    }

    pub fn get(&self, prefix: &str) -> Option<&Namespace> {
        self.entries.get(prefix)
    }

    /// First namespace whose target matches, ignoring ASCII case.
    pub fn find_by_target(&self, target: &str) -> Option<&Namespace> {
        self.entries.values().find(|ns| ns.targets(target))
    }

    /// The view's default attributes: everything declared against the
    /// template namespace. Empty when the document never declares it.
    pub fn template_attributes(&self) -> IndexMap<String, String> {
        self.entries
            .values()
            .find(|ns| ns.is_template())
            .map(|ns| ns.declared_attributes.clone())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Namespace)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(attrs: &[(&str, &str)]) -> Result<NamespaceTable, NamespaceError> {
        NamespaceTable::resolve(attrs.iter().copied())
    }

    #[test]
    fn test_schema_location_sets_urls() {
        let table = resolve(&[
            ("xmlns:a", "NS1"),
            ("xmlns:b", "NS2"),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", "NS1 urlA\n   NS2 urlB"),
        ])
        .unwrap();

        assert_eq!(table.get("a").unwrap().url(), Some("urlA"));
        assert_eq!(table.get("b").unwrap().url(), Some("urlB"));
        assert_eq!(table.get("a").unwrap().target_namespace(), Some("NS1"));
    }

    #[test]
    fn test_url_falls_back_to_target() {
        let table = resolve(&[("xmlns:a", "NS1"), ("xmlns:b", "NS2")]).unwrap();
        assert_eq!(table.get("a").unwrap().url(), Some("NS1"));
        assert_eq!(table.get("b").unwrap().url(), Some("NS2"));
    }

    #[test]
    fn test_schema_location_matches_case_insensitively() {
        let table = resolve(&[
            ("xmlns:a", "ns1"),
            ("xmlns:xsi", "HTTP://WWW.W3.ORG/2001/XMLSCHEMA-INSTANCE"),
            ("xsi:schemaLocation", "NS1 urlA"),
        ])
        .unwrap();
        assert_eq!(table.get("a").unwrap().url(), Some("urlA"));
    }

    #[test]
    fn test_odd_schema_location_is_an_error() {
        let err = resolve(&[
            ("xmlns:a", "NS1"),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", "NS1 urlA NS2"),
        ])
        .unwrap_err();
        assert!(matches!(err, NamespaceError::OddSchemaLocation { count: 3 }));
    }

    #[test]
    fn test_unprefixed_attributes_are_ignored() {
        let table = resolve(&[("class", "x"), ("xmlns:a", "NS1")]).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_template_attributes() {
        let table = resolve(&[
            ("xmlns:xview", "XView"),
            ("xview:title", "Untitled"),
            ("xview:size", "10"),
            ("xmlns:ui", "components"),
            ("ui:ignored", "1"),
        ])
        .unwrap();

        let defaults = table.template_attributes();
        let names: Vec<&str> = defaults.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["title", "size"]);
        assert_eq!(defaults["title"], "Untitled");
        assert!(table.get("xview").unwrap().is_template());
    }

    #[test]
    fn test_no_template_namespace_means_no_defaults() {
        let table = resolve(&[("xmlns:ui", "components"), ("ui:x", "1")]).unwrap();
        assert!(table.template_attributes().is_empty());
    }

    #[test]
    fn test_attribute_before_declaration_creates_inferred_namespace() {
        let table = resolve(&[("p:title", "T")]).unwrap();
        let ns = table.get("p").unwrap();
        assert_eq!(ns.target_namespace(), None);
        assert_eq!(ns.url(), None);
        assert_eq!(ns.declared_attributes["title"], "T");

        let table = resolve(&[("p:title", "T"), ("xmlns:p", "NS")]).unwrap();
        let ns = table.get("p").unwrap();
        assert_eq!(ns.target_namespace(), Some("NS"));
        assert_eq!(ns.declared_attributes["title"], "T");
    }
}
