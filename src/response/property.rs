//! Inspected variables.

use strum::{Display, EnumString};

use crate::charset::{Charset, latin1_bytes};
use crate::error::{DbgpError, Result};
use crate::node::Node;
use crate::protocol::decode_base64;

/// How a property's value is carried in the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Encoding {
    Base64,
    None,
}

/// One variable or value in the engine's memory, possibly with children.
///
/// The engine caps values at `max_data` bytes and reports the real length in
/// `size`. Reading a capped value fails with
/// [`DbgpError::UnsufficientValue`] instead of returning a short string.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    node: Node,
}

impl Property {
    /// Wrap a `<property>` element.
    pub fn from_node(node: Node) -> Self {
        Self { node }
    }

    /// The underlying element.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Short name, e.g. `$x` or `roles`. Read from the `<name>` child when
    /// the engine sends names as elements.
    pub fn name(&self) -> String {
        self.text_field("name")
    }

    /// Name that addresses this property in `property_get`.
    pub fn full_name(&self) -> String {
        self.text_field("fullname")
    }

    /// Language type, e.g. `int` or `array`.
    pub fn type_name(&self) -> Option<&str> {
        self.node.attribute("type")
    }

    /// Class of an object value.
    pub fn class_name(&self) -> Option<&str> {
        self.node.attribute("classname")
    }

    /// Space separated modifiers such as `public static`.
    pub fn facet(&self) -> Option<&str> {
        self.node.attribute("facet")
    }

    /// Whether the property is a constant.
    pub fn is_constant(&self) -> bool {
        self.node.bool_attribute("constant")
    }

    /// Whether the property has children, even if none were sent.
    pub fn has_children(&self) -> bool {
        self.node.bool_attribute("children")
    }

    /// Number of children on the engine, `-1` if unknown.
    pub fn num_children(&self) -> i64 {
        self.node.int_attribute("numchildren")
    }

    /// Page of children included, `-1` if unknown.
    pub fn page(&self) -> i64 {
        self.node.int_attribute("page")
    }

    /// Children per page.
    pub fn page_size(&self) -> i64 {
        self.node.int_attribute("pagesize")
    }

    /// Declared value length in bytes, `-1` if unknown.
    pub fn size(&self) -> i64 {
        self.node.int_attribute("size")
    }

    /// Engine key for fetching this property again.
    pub fn key(&self) -> Option<&str> {
        self.node.attribute("key")
    }

    /// Memory address, when the engine reports one.
    pub fn address(&self) -> Option<&str> {
        self.node.attribute("address")
    }

    /// Encoding of the value text; plain when absent.
    pub fn encoding(&self) -> Encoding {
        self.value_node()
            .attribute("encoding")
            .and_then(|e| e.parse().ok())
            .unwrap_or(Encoding::None)
    }

    /// Children included in this message.
    pub fn children(&self) -> Vec<Property> {
        self.node
            .children_named("property")
            .cloned()
            .map(Property::from_node)
            .collect()
    }

    /// Raw value bytes.
    pub fn value(&self) -> Result<Vec<u8>> {
        let text = self.value_node().text();
        let bytes = match self.encoding() {
            Encoding::Base64 => decode_base64(text)?,
            Encoding::None => latin1_bytes(text),
        };
        self.check_size(bytes.len())?;
        Ok(bytes)
    }

    /// Value as text, decoding base64 payloads with the project charset.
    pub fn string_value(&self, charset: Charset) -> Result<String> {
        match self.encoding() {
            Encoding::Base64 => Ok(charset.decode(&self.value()?)),
            Encoding::None => {
                let text = self.value_node().text();
                self.check_size(latin1_bytes(text).len())?;
                Ok(text.to_string())
            }
        }
    }

    fn check_size(&self, actual: usize) -> Result<()> {
        let declared = self.size();
        if declared > 0 && (actual as i64) < declared {
            return Err(DbgpError::UnsufficientValue { declared, actual });
        }
        Ok(())
    }

    // extended_properties moves the value into a <value> child
    fn value_node(&self) -> &Node {
        self.node.child("value").unwrap_or(&self.node)
    }

    // with extended_properties names arrive as base64 <name>/<fullname> children
    fn text_field(&self, field: &str) -> String {
        if let Some(value) = self.node.attribute(field) {
            return value.to_string();
        }
        match self.node.child(field) {
            Some(child) if child.attribute("encoding") == Some("base64") => decode_base64(child.text())
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default(),
            Some(child) => child.text().to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(size: &str, encoding: &str, text: &str) -> Property {
        Property::from_node(
            Node::new("property")
                .with_attribute("name", "$s")
                .with_attribute("type", "string")
                .with_attribute("size", size)
                .with_attribute("encoding", encoding)
                .with_text(text),
        )
    }

    #[test]
    fn truncated_base64_value_is_insufficient() {
        // "hello" is 5 bytes
        let prop = property("10", "base64", "aGVsbG8=");
        assert!(matches!(
            prop.value(),
            Err(DbgpError::UnsufficientValue {
                declared: 10,
                actual: 5
            })
        ));
        assert!(prop.string_value(Charset::UTF_8).is_err());
    }

    #[test]
    fn complete_base64_value() {
        let prop = property("5", "base64", "aGVsbG8=");
        assert_eq!(prop.value().unwrap(), b"hello");
        assert_eq!(prop.string_value(Charset::UTF_8).unwrap(), "hello");
    }

    #[test]
    fn plain_value_checked_against_latin1_length() {
        assert!(property("4", "none", "abc").string_value(Charset::UTF_8).is_err());
        assert_eq!(property("3", "none", "abc").string_value(Charset::UTF_8).unwrap(), "abc");
        assert_eq!(property("2", "none", "abc").string_value(Charset::UTF_8).unwrap(), "abc");
        // one char, one Latin-1 byte
        assert_eq!(property("1", "none", "\u{e9}").string_value(Charset::UTF_8).unwrap(), "\u{e9}");
    }

    #[test]
    fn base64_decoded_with_project_charset() {
        // 0xe9 alone
        let prop = property("1", "base64", "6Q==");
        assert_eq!(prop.string_value(Charset::LATIN_1).unwrap(), "\u{e9}");
    }

    #[test]
    fn missing_size_means_unchecked() {
        let prop = Property::from_node(Node::new("property").with_text("xyz"));
        assert_eq!(prop.size(), -1);
        assert_eq!(prop.encoding(), Encoding::None);
        assert_eq!(prop.string_value(Charset::UTF_8).unwrap(), "xyz");
    }

    #[test]
    fn nested_children_and_extended_names() {
        let node = Node::new("property")
            .with_attribute("name", "$arr")
            .with_attribute("type", "array")
            .with_attribute("children", "1")
            .with_attribute("numchildren", "2")
            .with_child(Node::new("property").with_attribute("name", "0"))
            .with_child(
                Node::new("property")
                    .with_child(Node::new("name").with_attribute("encoding", "base64").with_text("a2V5"))
                    .with_child(
                        Node::new("value")
                            .with_attribute("encoding", "base64")
                            .with_text("dg=="),
                    ),
            );
        let prop = Property::from_node(node);
        assert!(prop.has_children());
        assert_eq!(prop.num_children(), 2);
        let children = prop.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].name(), "key");
        assert_eq!(children[1].string_value(Charset::UTF_8).unwrap(), "v");
    }
}
