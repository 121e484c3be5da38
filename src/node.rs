//! Owned view of an inbound DBGP XML message.

use crate::error::Result;

/// An element of a parsed message: local name, attributes, direct text and
/// child elements. Namespace prefixes are dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    /// Parse a complete XML document and return its root element.
    pub fn parse(xml: &str) -> Result<Node> {
        let document = roxmltree::Document::parse(xml)?;
        Ok(Node::from_element(document.root_element()))
    }

    fn from_element(element: roxmltree::Node<'_, '_>) -> Node {
        let attributes = element
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();
        let mut text = String::new();
        let mut children = Vec::new();
        for child in element.children() {
            if child.is_element() {
                children.push(Node::from_element(child));
            } else if child.is_text() {
                if let Some(chunk) = child.text() {
                    text.push_str(chunk);
                }
            }
        }
        Node {
            name: element.tag_name().name().to_string(),
            attributes,
            text,
            children,
        }
    }

    /// Local tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct text content (CDATA included).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Integer attribute, or `-1` when it is missing or malformed.
    pub fn int_attribute(&self, name: &str) -> i64 {
        self.attribute(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(-1)
    }

    /// `true` only for the DBGP boolean `"1"`.
    pub fn bool_attribute(&self, name: &str) -> bool {
        self.attribute(name) == Some("1")
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Build a node by hand; used for synthesized messages and tests.
    pub fn new(name: impl Into<String>) -> Node {
        Node {
            name: name.into(),
            ..Node::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Node {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Node {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Node) -> Node {
        self.children.push(child);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_namespaces_and_collects_text() {
        let xml = r#"<?xml version="1.0" encoding="iso-8859-1"?>
<response xmlns="urn:debugger_protocol_v1" xmlns:xdebug="https://xdebug.org/dbgp/xdebug" command="eval" transaction_id="7"><property name="$a" type="string" size="3" encoding="base64"><![CDATA[Zm9v]]></property></response>"#;
        let node = Node::parse(xml).unwrap();
        assert_eq!(node.name(), "response");
        assert_eq!(node.attribute("command"), Some("eval"));
        assert_eq!(node.int_attribute("transaction_id"), 7);
        let property = node.child("property").unwrap();
        assert_eq!(property.text(), "Zm9v");
        assert_eq!(property.attribute("name"), Some("$a"));
    }

    #[test]
    fn malformed_numbers_become_sentinel() {
        let node = Node::new("stack").with_attribute("lineno", "twelve");
        assert_eq!(node.int_attribute("lineno"), -1);
        assert_eq!(node.int_attribute("level"), -1);
    }

    #[test]
    fn rejects_broken_xml() {
        assert!(Node::parse("<response").is_err());
    }
}
