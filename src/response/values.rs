//! Domain values decoded out of responses and handed to the model.

use strum::{Display, EnumString};

use crate::command::{State, Types};
use crate::node::Node;

/// Engine execution state reported by `status` and continuation commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Starting,
    Stopping,
    Stopped,
    Running,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// One frame of the remote call stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    pub level: i64,
    pub kind: String,
    pub file: String,
    /// 0-based; `-1` when the engine sent no usable line.
    pub line: i64,
    pub function: String,
}

impl Stack {
    pub fn from_node(node: &Node) -> Self {
        Self {
            level: node.int_attribute("level"),
            kind: node.attribute("type").unwrap_or("file").to_string(),
            file: node.attribute("filename").unwrap_or_default().to_string(),
            line: wire_line(node.int_attribute("lineno")),
            function: node.attribute("where").unwrap_or_default().to_string(),
        }
    }
}

/// A variable scope (locals, superglobals, constants...).
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub name: String,
    pub id: i64,
}

impl Context {
    pub fn from_node(node: &Node) -> Self {
        Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            id: node.int_attribute("id"),
        }
    }
}

/// A breakpoint as the engine reports it back.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointInfo {
    pub id: String,
    pub types: Option<Types>,
    pub state: Option<State>,
    pub resolved: bool,
    pub file: Option<String>,
    /// 0-based; `-1` when absent.
    pub line: i64,
    pub function: Option<String>,
    pub exception: Option<String>,
    pub hit_count: i64,
}

impl BreakpointInfo {
    pub fn from_node(node: &Node) -> Self {
        let owned = |name: &str| node.attribute(name).map(str::to_string);
        Self {
            id: node.attribute("id").unwrap_or_default().to_string(),
            types: node.attribute("type").and_then(|t| t.parse().ok()),
            state: node.attribute("state").and_then(|s| s.parse().ok()),
            resolved: node.attribute("resolved") == Some("resolved"),
            file: owned("filename"),
            line: wire_line(node.int_attribute("lineno")),
            function: owned("function"),
            exception: owned("exception"),
            hit_count: node.int_attribute("hit_count"),
        }
    }
}

/// One `typemap_get` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMapEntry {
    pub name: String,
    pub common_type: String,
}

impl TypeMapEntry {
    pub fn from_node(node: &Node) -> Self {
        Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            common_type: node.attribute("type").unwrap_or_default().to_string(),
        }
    }
}

/// What the engine announced in its `init` packet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    pub app_id: String,
    pub ide_key: Option<String>,
    pub session: Option<String>,
    pub thread: Option<String>,
    pub language: String,
    pub protocol_version: String,
    pub file_uri: String,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
}

/// `<error code="..."><message>...</message></error>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub code: i64,
    pub message: String,
}

impl ErrorInfo {
    pub fn from_node(node: &Node) -> Self {
        Self {
            code: node.int_attribute("code"),
            message: node
                .child("message")
                .map(|m| m.text().trim().to_string())
                .unwrap_or_default(),
        }
    }
}

fn wire_line(lineno: i64) -> i64 {
    if lineno < 1 { -1 } else { lineno - 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_lines_are_zero_based() {
        let node = Node::new("stack")
            .with_attribute("level", "0")
            .with_attribute("filename", "file:///a.php")
            .with_attribute("lineno", "12")
            .with_attribute("where", "{main}");
        let frame = Stack::from_node(&node);
        assert_eq!(frame.line, 11);
        assert_eq!(frame.function, "{main}");

        let broken = Node::new("stack").with_attribute("lineno", "x");
        assert_eq!(Stack::from_node(&broken).line, -1);
    }

    #[test]
    fn breakpoint_info_from_engine() {
        let node = Node::new("breakpoint")
            .with_attribute("id", "170001")
            .with_attribute("type", "line")
            .with_attribute("state", "enabled")
            .with_attribute("resolved", "resolved")
            .with_attribute("lineno", "5");
        let info = BreakpointInfo::from_node(&node);
        assert_eq!(info.types, Some(Types::Line));
        assert_eq!(info.state, Some(State::Enabled));
        assert!(info.resolved);
        assert_eq!(info.line, 4);
        assert_eq!(info.hit_count, -1);
    }
}
