//! SOAP response translation.
//!
//! # Data Flow
//! ```text
//! raw bytes
//!     → parse_document (quick-xml events → XmlElement tree, local names)
//!     → Envelope/Body (Fault → TranslateError::Fault)
//!     → GetCursOnDateResponse/GetCursOnDateResult
//!     → ValuteData records → JSON array
//! ```
//!
//! # Mapping
//! - child element → field of the same name
//! - repeated siblings → array, nested elements → object
//! - leaf text is trimmed; a valid JSON number literal becomes a number,
//!   anything else a string, an empty leaf `null`
//! - attributes and the embedded `xs:schema` are not mapped

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Reasons a response could not be translated.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("response is not well-formed XML: {0}")]
    Xml(String),

    #[error("expected element <{0}> not found")]
    MissingElement(&'static str),

    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },
}

impl From<quick_xml::Error> for TranslateError {
    fn from(e: quick_xml::Error) -> Self {
        TranslateError::Xml(e.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for TranslateError {
    fn from(e: quick_xml::encoding::EncodingError) -> Self {
        TranslateError::Xml(e.to_string())
    }
}

/// Element tree with namespace prefixes stripped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(start: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Self::default()
        }
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First element named `name` in depth-first order, self included.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Parse a whole XML document into its root element.
pub fn parse_document(xml: &[u8]) -> Result<XmlElement, TranslateError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(TranslateError::Xml("content after root element".into()));
                }
                stack.push(XmlElement::new(&e));
            }
            Event::Empty(e) => attach(&mut stack, &mut root, XmlElement::new(&e))?,
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| TranslateError::Xml("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = e.decode()?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_text(&mut stack, &text)?;
            }
            Event::GeneralRef(e) => {
                let resolved = match e.resolve_char_ref()? {
                    Some(ch) => ch.to_string(),
                    None => {
                        let name = e.decode()?;
                        resolve_predefined_entity(&name)
                            .ok_or_else(|| {
                                TranslateError::Xml(format!("unknown entity &{name};"))
                            })?
                            .to_string()
                    }
                };
                push_text(&mut stack, &resolved)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(TranslateError::Xml("unexpected end of document".into()));
    }
    root.ok_or_else(|| TranslateError::Xml("document has no root element".into()))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), TranslateError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(TranslateError::Xml("multiple root elements".into())),
    }
    Ok(())
}

fn push_text(stack: &mut [XmlElement], text: &str) -> Result<(), TranslateError> {
    match stack.last_mut() {
        Some(current) => current.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => return Err(TranslateError::Xml("text outside root element".into())),
    }
    Ok(())
}

/// Translate a `GetCursOnDate` SOAP response into a JSON array of rate records.
pub fn translate(xml: &[u8]) -> Result<Value, TranslateError> {
    let envelope = parse_document(xml)?;
    if envelope.name != "Envelope" {
        return Err(TranslateError::MissingElement("Envelope"));
    }
    let body = envelope
        .child("Body")
        .ok_or(TranslateError::MissingElement("Body"))?;

    if let Some(fault) = body.child("Fault") {
        return Err(fault_error(fault));
    }

    let result = body
        .child("GetCursOnDateResponse")
        .ok_or(TranslateError::MissingElement("GetCursOnDateResponse"))?
        .child("GetCursOnDateResult")
        .ok_or(TranslateError::MissingElement("GetCursOnDateResult"))?;

    // The result is a serialized DataSet: an inline xs:schema followed by a
    // diffgram. Only the diffgram data table is mapped.
    let records: Vec<Value> = result
        .children
        .iter()
        .filter(|c| c.name != "schema")
        .find_map(|c| c.find("ValuteData"))
        .map(|table| table.children.iter().map(record_to_json).collect())
        .unwrap_or_default();

    Ok(Value::Array(records))
}

/// Extract `faultcode`/`faultstring` from a SOAP 1.1 Fault element.
pub fn fault_error(fault: &XmlElement) -> TranslateError {
    let text = |name: &str| {
        fault
            .child(name)
            .map(|e| e.text.trim().to_string())
            .unwrap_or_default()
    };
    TranslateError::Fault {
        code: text("faultcode"),
        message: text("faultstring"),
    }
}

/// Look for a SOAP Fault in an arbitrary payload, e.g. a 500 response body.
pub fn find_fault(xml: &[u8]) -> Option<TranslateError> {
    let envelope = parse_document(xml).ok()?;
    envelope
        .child("Body")
        .and_then(|body| body.child("Fault"))
        .map(fault_error)
}

/// Map one record element to a JSON object. A record is always an object,
/// even when it has no fields.
fn record_to_json(record: &XmlElement) -> Value {
    Value::Object(children_to_map(record))
}

fn element_to_json(element: &XmlElement) -> Value {
    if element.is_leaf() {
        leaf_value(element.text.trim())
    } else {
        Value::Object(children_to_map(element))
    }
}

fn children_to_map(element: &XmlElement) -> Map<String, Value> {
    let mut map = Map::new();
    for child in &element.children {
        let value = element_to_json(child);
        match map.get_mut(&child.name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(child.name.clone(), value);
            }
        }
    }
    map
}

fn leaf_value(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<Number>(text) {
        // An integer too wide for i64/u64 would be rounded through f64.
        Ok(number) if number.is_f64() && is_integer_literal(text) => {
            Value::String(text.to_string())
        }
        Ok(number) => Value::Number(number),
        Err(_) => Value::String(text.to_string()),
    }
}

fn is_integer_literal(text: &str) -> bool {
    !text.contains(['.', 'e', 'E'])
}
