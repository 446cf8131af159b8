//! Conversion from a roxmltree document into the owned node tree.

use crate::error::DocumentError;
use crate::namespace::NamespaceTable;
use crate::node::{Attribute, Element, Node, QName};

/// A parsed view document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
    root_attributes: Vec<(String, String)>,
}

impl Document {
    /// Parses `text` and builds the owned tree.
    ///
    /// Comments, processing instructions and whitespace-only text are dropped.
    /// Element and attribute names keep the prefixes they were written with,
    /// and namespace declarations stay in each element's attribute list.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let doc = roxmltree::Document::parse(text)?;
        let root = convert_element(doc.root_element(), text);

        let root_attributes: Vec<(String, String)> = root
            .attributes
            .iter()
            .map(|attr| (attr.name.to_string(), attr.value.clone()))
            .collect();
        log::trace!(
            "Parsed document <{}> with {} root attribute(s)",
            root.name,
            root_attributes.len()
        );
        Ok(Self {
            root,
            root_attributes,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// The root element's declarations and attributes in written form,
    /// with namespace declarations as `xmlns:prefix`.
    pub fn root_attributes(&self) -> &[(String, String)] {
        &self.root_attributes
    }

    /// Runs the namespace resolver over the root attributes.
    pub fn namespaces(&self) -> Result<NamespaceTable, DocumentError> {
        let attrs = self
            .root_attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()));
        Ok(NamespaceTable::resolve(attrs)?)
    }
}

fn convert_element(node: roxmltree::Node<'_, '_>, text: &str) -> Element {
    let tag = StartTag::scan(&text[node.range().start..]);
    let mut element = Element::new(QName::parse(tag.name));

    // roxmltree reports attributes in document order, minus the declarations
    let mut values = node.attributes();
    for written in tag.attributes {
        let name = QName::parse(written);
        let attr = Attribute::new(name, "");
        let value = if attr.is_namespace_declaration() {
            let prefix = attr.name.prefix().map(|_| attr.name.local.as_str());
            node.lookup_namespace_uri(prefix).unwrap_or_default().to_string()
        } else {
            match values.next() {
                Some(value) => value.value().to_string(),
                None => break,
            }
        };
        element.attributes.push(Attribute { value, ..attr });
    }

    for child in node.children() {
        if child.is_element() {
            element.children.push(Node::Element(convert_element(child, text)));
        } else if child.is_text()
            && let Some(text) = child.text()
            && !text.trim().is_empty()
        {
            element.children.push(Node::Text(text.to_string()));
        }
    }
    element
}

/// Names in a start tag as written in the source.
#[derive(Debug, PartialEq, Eq)]
struct StartTag<'a> {
    name: &'a str,
    attributes: Vec<&'a str>,
}

impl<'a> StartTag<'a> {
    /// Scans the start tag at the beginning of `source`, which the XML parser
    /// has already accepted as well-formed.
    fn scan(source: &'a str) -> Self {
        let source = source.strip_prefix('<').unwrap_or(source);
        let name_end = source.find(is_name_end).unwrap_or(source.len());
        let name = &source[..name_end];

        let mut attributes = Vec::new();
        let mut rest = &source[name_end..];
        loop {
            rest = rest.trim_start();
            if rest.is_empty() || rest.starts_with('/') || rest.starts_with('>') {
                break;
            }

            let end = rest.find(|c: char| c == '=' || c.is_whitespace()).unwrap_or(rest.len());
            attributes.push(&rest[..end]);

            rest = rest[end..].trim_start();
            rest = rest.strip_prefix('=').unwrap_or(rest).trim_start();
            let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
                break;
            };
            rest = &rest[1..];
            match rest.find(quote) {
                Some(close) => rest = &rest[close + 1..],
                None => break,
            }
        }

        Self { name, attributes }
    }
}

fn is_name_end(c: char) -> bool {
    c.is_whitespace() || c == '/' || c == '>'
}
