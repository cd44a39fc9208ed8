use std::collections::HashMap;

use yaml_rust2::parser::{Event, EventReceiver, Parser};
use yaml_rust2::scanner::TScalarStyle;

use crate::types::SettingsError;

/// Generic tree produced by the settings document parser.
///
/// Every scalar carries the text the author wrote, after YAML quoting and
/// escapes are undone. `42`, `0x1F` and `1.10` stay exactly as written; only a
/// plain null (`~`, `null` or a missing value) becomes the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Any leaf value
    Scalar(String),
    /// Key/value pairs in document order, keys unique
    Mapping(Vec<(String, Node)>),
    /// Ordered list of values
    Sequence(Vec<Node>),
}

impl Node {
    /// Look up `key` when this node is a mapping
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Text of a scalar node
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "scalar",
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
        }
    }
}

/// Parse raw document bytes into a [`Node`] tree.
///
/// Syntax errors, invalid UTF-8, empty input, several documents, duplicate
/// keys, unknown aliases and non-scalar mapping keys all fail with
/// [`SettingsError::MalformedDocument`].
pub fn parse_document(bytes: &[u8]) -> Result<Node, SettingsError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SettingsError::MalformedDocument(e.to_string()))?;

    let mut builder = TreeBuilder::default();
    Parser::new(text.chars())
        .load(&mut builder, true)
        .map_err(|e| SettingsError::MalformedDocument(e.to_string()))?;

    builder.finish()
}

enum Frame {
    Sequence {
        anchor: usize,
        items: Vec<Node>,
    },
    Mapping {
        anchor: usize,
        entries: Vec<(String, Node)>,
        key: Option<String>,
    },
}

/// Assembles parser events into a [`Node`], keeping the first error seen
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    root: Option<Node>,
    error: Option<String>,
}

impl TreeBuilder {
    fn finish(self) -> Result<Node, SettingsError> {
        if let Some(error) = self.error {
            return Err(SettingsError::MalformedDocument(error));
        }
        self.root
            .ok_or_else(|| SettingsError::MalformedDocument("empty document".to_string()))
    }

    fn handle(&mut self, event: Event) -> Result<(), String> {
        match event {
            Event::Scalar(value, style, anchor, _) => {
                let is_null = matches!(style, TScalarStyle::Plain)
                    && matches!(value.as_str(), "" | "~" | "null" | "Null" | "NULL");
                let text = if is_null { String::new() } else { value };
                self.complete(Node::Scalar(text), anchor)
            }
            Event::SequenceStart(anchor, ..) => {
                self.stack.push(Frame::Sequence {
                    anchor,
                    items: Vec::new(),
                });
                Ok(())
            }
            Event::MappingStart(anchor, ..) => {
                self.stack.push(Frame::Mapping {
                    anchor,
                    entries: Vec::new(),
                    key: None,
                });
                Ok(())
            }
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Sequence { anchor, items }) => {
                    self.complete(Node::Sequence(items), anchor)
                }
                Some(Frame::Mapping { anchor, entries, .. }) => {
                    self.complete(Node::Mapping(entries), anchor)
                }
                None => Err("unbalanced collection end".to_string()),
            },
            Event::Alias(id) => match self.anchors.get(&id) {
                Some(node) => self.complete(node.clone(), 0),
                None => Err("alias refers to an unknown anchor".to_string()),
            },
            _ => Ok(()),
        }
    }

    fn complete(&mut self, node: Node, anchor: usize) -> Result<(), String> {
        if anchor != 0 {
            self.anchors.insert(anchor, node.clone());
        }

        match self.stack.last_mut() {
            None if self.root.is_some() => Err("expected a single document".to_string()),
            None => {
                self.root = Some(node);
                Ok(())
            }
            Some(Frame::Sequence { items, .. }) => {
                items.push(node);
                Ok(())
            }
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(k) => {
                    entries.push((k, node));
                    Ok(())
                }
                None => match node {
                    Node::Scalar(k) if entries.iter().any(|(existing, _)| *existing == k) => {
                        Err(format!("duplicate key {:?}", k))
                    }
                    Node::Scalar(k) => {
                        *key = Some(k);
                        Ok(())
                    }
                    other => Err(format!(
                        "mapping key must be a scalar, found a {}",
                        other.shape()
                    )),
                },
            },
        }
    }
}

impl EventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.handle(event) {
            self.error = Some(e);
        }
    }
}
