//! Arena-to-HTML serialization via quick-xml.

use super::{Document, NodeData, NodeId, is_void_tag};
use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

type HtmlWriter = Writer<Cursor<Vec<u8>>>;

/// Serialize a document back to an HTML string.
///
/// Text nodes are written verbatim (they were stored undecoded at parse
/// time, and resolved/minified CSS or JS must not be entity-escaped).
/// Attribute values are escaped by the writer. Childless void elements
/// come out as empty-element tags; everything else gets an explicit
/// closing tag so `<script>` stays parseable.
pub fn serialize(doc: &Document) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    for &child in doc.children(doc.root()) {
        write_node(doc, child, &mut writer)?;
    }
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

fn write_node(doc: &Document, id: NodeId, writer: &mut HtmlWriter) -> Result<()> {
    match doc.data(id) {
        NodeData::Document => {}
        NodeData::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?;
        }
        NodeData::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
        }
        NodeData::Doctype(doctype) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?;
        }
        NodeData::Element(elem) => {
            let mut start = BytesStart::new(elem.name.as_str());
            for (key, value) in elem.attrs() {
                start.push_attribute((key, value));
            }

            if doc.children(id).is_empty() && is_void_tag(&elem.name) {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for &child in doc.children(id) {
                    write_node(doc, child, writer)?;
                }
                writer.write_event(Event::End(BytesEnd::new(elem.name.as_str())))?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
