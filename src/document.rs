//! Coverage document tree built from Cobertura XML.
//!
//! The tree mirrors the shape downstream merge code expects from a
//! JSON-ish XML conversion, with a fixed coercion policy:
//!
//! - the root element is a single object stored under its tag name
//! - every element below the root is an array, even when it occurs once
//! - attributes are plain string values keyed by their raw name
//! - text content lives under [`TEXT_KEY`], never merged into the parent
//! - declaration, processing instructions, doctype and comments are dropped

use crate::error::ResolveError;
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Key holding an element's text content.
pub const TEXT_KEY: &str = "$t";

/// Malformed markup.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("{source} (at byte {position})")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("second root element <{0}>")]
    MultipleRoots(String),

    #[error("text outside the root element")]
    TextOutsideRoot,

    #[error("document has no root element")]
    NoRoot,
}

/// Parsed tree of one coverage file.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageDocument {
    root_name: String,
    root: Map<String, Value>,
}

impl CoverageDocument {
    /// Read and parse a coverage file.
    pub fn read(path: &Path) -> Result<Self, ResolveError> {
        let content = fs::read_to_string(path).map_err(|source| ResolveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ResolveError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse XML text under the coercion policy.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<(String, Map<String, Value>)> = None;

        loop {
            let event = reader.read_event().map_err(|source| XmlError::Syntax {
                position: reader.buffer_position() as u64,
                source,
            })?;
            let syntax = |source: quick_xml::Error| XmlError::Syntax {
                position: reader.buffer_position() as u64,
                source,
            };

            match event {
                Event::Start(e) => stack.push(Frame::open(&e).map_err(syntax)?),
                Event::Empty(e) => {
                    let frame = Frame::open(&e).map_err(syntax)?;
                    close(frame, &mut stack, &mut root)?;
                }
                Event::End(e) => {
                    let frame = stack.pop().ok_or_else(|| {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        syntax(quick_xml::Error::IllFormed(IllFormedError::UnmatchedEndTag(
                            name,
                        )))
                    })?;
                    close(frame, &mut stack, &mut root)?;
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|err| syntax(err.into()))?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    push_text(&mut stack, &text)?;
                }
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(frame) = stack.pop() {
            return Err(XmlError::Unclosed(frame.name));
        }
        let (root_name, root) = root.ok_or(XmlError::NoRoot)?;
        Ok(Self { root_name, root })
    }

    /// Tag name of the root element, e.g. "coverage".
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Attributes and children of the root element.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// The whole tree as a JSON value: `{ <root_name>: { ... } }`.
    pub fn to_value(&self) -> Value {
        let mut top = Map::new();
        top.insert(self.root_name.clone(), Value::Object(self.root.clone()));
        Value::Object(top)
    }

    /// Consume the document into the same value as [`Self::to_value`].
    pub fn into_value(self) -> Value {
        let mut top = Map::new();
        top.insert(self.root_name, Value::Object(self.root));
        Value::Object(top)
    }
}

impl Serialize for CoverageDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.root_name, &self.root)?;
        map.end()
    }
}

/// An element being built.
struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, quick_xml::Error> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned();
            fields.insert(key, Value::String(value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            fields,
            text: String::new(),
        })
    }

    /// A bare element still gets an (empty) text node.
    fn finish(mut self) -> (String, Map<String, Value>) {
        if !self.text.is_empty() || self.fields.is_empty() {
            self.fields.insert(TEXT_KEY.to_string(), Value::String(self.text));
        }
        (self.name, self.fields)
    }
}

/// Attach a finished element to its parent, or make it the root.
fn close(
    frame: Frame,
    stack: &mut [Frame],
    root: &mut Option<(String, Map<String, Value>)>,
) -> Result<(), XmlError> {
    let (name, fields) = frame.finish();
    let Some(parent) = stack.last_mut() else {
        if root.is_some() {
            return Err(XmlError::MultipleRoots(name));
        }
        *root = Some((name, fields));
        return Ok(());
    };

    // Below the root every element is a sequence. A same-named attribute
    // is replaced by the sequence.
    match parent.fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(Value::Object(fields)),
        _ => {
            parent
                .fields
                .insert(name, Value::Array(vec![Value::Object(fields)]));
        }
    }
    Ok(())
}

fn push_text(stack: &mut [Frame], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(frame) => {
            frame.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError::TextOutsideRoot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd">
<!-- generated -->
<coverage line-rate="0.5" branch-rate="0" version="1.9" timestamp="1">
  <sources>
    <source>/src</source>
  </sources>
  <packages>
    <package name="main" line-rate="0.5">
      <classes>
        <class name="a.ts" filename="a.ts">
          <methods/>
          <lines>
            <line number="1" hits="1"/>
            <line number="2" hits="0"/>
          </lines>
        </class>
      </classes>
    </package>
  </packages>
</coverage>
"#;

    #[test]
    fn root_is_single_object() {
        let doc = CoverageDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.root_name(), "coverage");
        assert_eq!(doc.root()["line-rate"], json!("0.5"));
        assert!(doc.to_value()["coverage"].is_object());
    }

    #[test]
    fn single_child_is_sequence() {
        let doc = CoverageDocument::parse(SAMPLE).unwrap();
        let sources = doc.root()["sources"].as_array().unwrap();
        assert_eq!(sources.len(), 1);
        let source = sources[0]["source"].as_array().unwrap();
        assert_eq!(source, &vec![json!({ "$t": "/src" })]);
    }

    #[test]
    fn repeated_children_keep_order() {
        let doc = CoverageDocument::parse(SAMPLE).unwrap();
        let value = doc.to_value();
        let lines = &value["coverage"]["packages"][0]["package"][0]["classes"][0]["class"][0]
            ["lines"][0]["line"];
        assert_eq!(
            lines,
            &json!([
                { "number": "1", "hits": "1" },
                { "number": "2", "hits": "0" }
            ])
        );
    }

    #[test]
    fn empty_element_gets_empty_text_node() {
        let doc = CoverageDocument::parse(SAMPLE).unwrap();
        let value = doc.to_value();
        assert_eq!(
            value["coverage"]["packages"][0]["package"][0]["classes"][0]["class"][0]["methods"],
            json!([{ "$t": "" }])
        );
    }

    #[test]
    fn text_always_gets_own_node() {
        let xml = r#"<r><a x="1">  hi &amp; bye </a><b><![CDATA[<raw>]]></b></r>"#;
        let doc = CoverageDocument::parse(xml).unwrap();
        assert_eq!(doc.root()["a"], json!([{ "x": "1", "$t": "hi & bye" }]));
        assert_eq!(doc.root()["b"], json!([{ "$t": "<raw>" }]));
    }

    #[test]
    fn root_text_is_a_node_too() {
        let doc = CoverageDocument::parse("<coverage>total</coverage>").unwrap();
        assert_eq!(doc.to_value(), json!({ "coverage": { "$t": "total" } }));
    }

    #[test]
    fn nested_element_named_like_root_is_sequence() {
        let doc = CoverageDocument::parse("<coverage><coverage/></coverage>").unwrap();
        assert_eq!(doc.root()["coverage"], json!([{ "$t": "" }]));
    }

    #[test]
    fn attribute_names_keep_raw_name() {
        let doc = CoverageDocument::parse(r#"<coverage xmlns:x="urn:x" x:flag="y"/>"#).unwrap();
        assert_eq!(doc.root()["x:flag"], json!("y"));
        assert_eq!(doc.root()["xmlns:x"], json!("urn:x"));
    }

    #[test]
    fn serializes_like_to_value() {
        let doc = CoverageDocument::parse(SAMPLE).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), doc.to_value());
        assert_eq!(doc.clone().into_value(), doc.to_value());
    }

    #[test]
    fn bare_elements_get_empty_text_node() {
        let doc = CoverageDocument::parse("<coverage><source></source><methods/></coverage>")
            .unwrap();
        assert_eq!(doc.root()["source"], json!([{ "$t": "" }]));
        assert_eq!(doc.root()["methods"], json!([{ "$t": "" }]));
    }

    #[test]
    fn elements_with_attributes_get_no_text_node() {
        let doc = CoverageDocument::parse(r#"<coverage><line n="1"/></coverage>"#).unwrap();
        assert_eq!(doc.root()["line"], json!([{ "n": "1" }]));
    }

    #[test]
    fn keys_keep_document_order() {
        let xml = r#"<coverage version="1" line-rate="0"><sources/><packages/><a/></coverage>"#;
        let doc = CoverageDocument::parse(xml).unwrap();
        let keys: Vec<_> = doc.root().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["version", "line-rate", "sources", "packages", "a"]);

        let text = serde_json::to_string(&doc).unwrap();
        let sources = text.find("\"sources\"").unwrap();
        let packages = text.find("\"packages\"").unwrap();
        assert!(sources < packages, "reordered: {text}");
    }

    #[test]
    fn stray_end_tag_is_a_syntax_error() {
        let err = CoverageDocument::parse("</a>").unwrap_err();
        assert!(matches!(err, XmlError::Syntax { .. }), "got {err:?}");
    }

    #[test]
    fn mismatched_end_tag_fails() {
        let err = CoverageDocument::parse("<coverage><a></b></coverage>").unwrap_err();
        assert!(matches!(err, XmlError::Syntax { .. }), "got {err:?}");
    }

    #[test]
    fn unclosed_element_fails() {
        assert!(CoverageDocument::parse("<coverage><packages>").is_err());
    }

    #[test]
    fn multiple_roots_fail() {
        let err = CoverageDocument::parse("<a/><b/>").unwrap_err();
        assert!(matches!(err, XmlError::MultipleRoots(ref n) if n == "b"), "got {err:?}");
    }

    #[test]
    fn text_outside_root_fails() {
        let err = CoverageDocument::parse("not xml at all").unwrap_err();
        assert!(matches!(err, XmlError::TextOutsideRoot), "got {err:?}");
    }

    #[test]
    fn empty_input_has_no_root() {
        let err = CoverageDocument::parse("<?xml version=\"1.0\"?>\n").unwrap_err();
        assert!(matches!(err, XmlError::NoRoot), "got {err:?}");
    }

    #[test]
    fn read_reports_missing_file() {
        let err = CoverageDocument::read(Path::new("/nonexistent/cov.xml")).unwrap_err();
        assert!(matches!(err, ResolveError::Read { .. }), "got {err:?}");
        assert!(err.to_string().contains("/nonexistent/cov.xml"));
    }
}
