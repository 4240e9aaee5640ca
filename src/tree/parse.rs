//! HTML-to-arena parsing via quick-xml.
//!
//! Rendered pages are machine-generated and well-formed enough for an XML
//! reader with checks disabled, but two HTML-isms need recovery handling:
//! void elements written without a closing tag (`<meta charset="utf-8">`)
//! and the stray end tags that follow from them.

use super::{Document, ElementData, NodeId, is_void_tag};
use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::Event;

#[inline]
fn create_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    // enable_all_checks(false) does not cover this flag; without it the
    // reader errors on stray end tags before close_element can drop them
    reader.config_mut().allow_unmatched_ends = true;
    reader
}

/// Parse rendered HTML into a [`Document`].
///
/// Text content is stored exactly as it appears in the input (entities are
/// not decoded), so serialization round-trips byte-for-byte and inline
/// CSS/JS is never entity-mangled.
pub fn parse_html(content: &[u8]) -> Result<Document> {
    let mut doc = Document::new();
    let mut reader = create_reader(content);

    // Open-element stack; index 0 is the document root.
    let mut stack: Vec<NodeId> = vec![doc.root()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                let id = create_element(&mut doc, &reader, &elem)?;
                append(&mut doc, &stack, id);
                let name = doc.tag_name(id).unwrap_or_default();
                // Void elements never take children even in `<meta ...>` form
                if !is_void_tag(name) {
                    stack.push(id);
                }
            }
            Ok(Event::Empty(elem)) => {
                let id = create_element(&mut doc, &reader, &elem)?;
                append(&mut doc, &stack, id);
            }
            Ok(Event::End(elem)) => {
                let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
                close_element(&mut doc, &mut stack, &name);
            }
            Ok(Event::Text(text)) => {
                let content = reader.decoder().decode(text.as_ref())?.into_owned();
                let id = doc.create_text(content);
                append(&mut doc, &stack, id);
            }
            Ok(Event::CData(cdata)) => {
                let content = reader.decoder().decode(cdata.as_ref())?.into_owned();
                let id = doc.create_text(content);
                append(&mut doc, &stack, id);
            }
            Ok(Event::GeneralRef(entity)) => {
                // Re-materialize the reference verbatim as text
                let name = reader.decoder().decode(entity.as_ref())?;
                let id = doc.create_text(format!("&{name};"));
                append(&mut doc, &stack, id);
            }
            Ok(Event::Comment(comment)) => {
                let content = reader.decoder().decode(comment.as_ref())?.into_owned();
                let id = doc.create_comment(content);
                append(&mut doc, &stack, id);
            }
            Ok(Event::DocType(doctype)) => {
                let content = reader.decoder().decode(doctype.as_ref())?.into_owned();
                let id = doc.create_doctype(content);
                append(&mut doc, &stack, id);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // processing instructions, XML decls
            Err(e) => anyhow::bail!(
                "HTML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    Ok(doc)
}

fn create_element(
    doc: &mut Document,
    reader: &Reader<&[u8]>,
    elem: &quick_xml::events::BytesStart<'_>,
) -> Result<NodeId> {
    let name = reader.decoder().decode(elem.name().as_ref())?.into_owned();
    let mut data = ElementData::new(name);
    // html_attributes: rendered HTML may carry valueless marker attributes
    for attr in elem.html_attributes().flatten() {
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value()?.into_owned();
        data.set_attr(&key, value);
    }
    Ok(doc.create_element(data))
}

#[inline]
fn append(doc: &mut Document, stack: &[NodeId], id: NodeId) {
    let parent = *stack.last().expect("stack always holds the root");
    doc.append_child(parent, id);
}

/// Pop the open-element stack for an end tag, unwinding past elements left
/// open by non-void-aware markup. Unmatched end tags are dropped.
fn close_element(doc: &Document, stack: &mut Vec<NodeId>, name: &str) {
    // Index 0 is the root and never pops
    let matched = stack
        .iter()
        .skip(1)
        .rposition(|&id| doc.tag_name(id) == Some(name));
    match matched {
        Some(i) => stack.truncate(i + 1),
        None => tracing::debug!(tag = name, "dropping unmatched end tag"),
    }
}

// ============================================================================
// Tests
// ============================================================================
