use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core::{Element, FacturaeError};

/// Parse an XML document into an [`Element`] tree.
///
/// Element names lose their namespace prefix (`fe:Facturae` becomes
/// `Facturae`); attribute names are kept as written. Text is trimmed and
/// unescaped, CDATA is kept verbatim.
///
/// ```
/// use facturae::xml::parse_element;
///
/// let root = parse_element(
///     r#"<fe:Facturae xmlns:fe="urn:x"><FileHeader><SchemaVersion> 3.2.2 </SchemaVersion></FileHeader></fe:Facturae>"#,
/// ).unwrap();
/// assert_eq!(root.tag(), "Facturae");
/// assert_eq!(root.text_at("FileHeader/SchemaVersion"), Some("3.2.2"));
/// assert_eq!(root.attribute("xmlns:fe"), Some("urn:x"));
/// ```
pub fn parse_element(xml: &str) -> Result<Element, FacturaeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(multiple_roots());
                }
                stack.push(start_element(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let elem = start_element(e)?;
                attach(&mut stack, &mut root, elem)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| FacturaeError::Xml(format!("invalid text: {e}")))?;
                if let Some(current) = stack.last_mut() {
                    current.append_text(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                let text = std::str::from_utf8(e)
                    .map_err(|e| FacturaeError::Xml(format!("CDATA is not UTF-8: {e}")))?;
                if let Some(current) = stack.last_mut() {
                    current.append_text(text);
                }
            }
            Ok(Event::End(_)) => {
                let elem = stack
                    .pop()
                    .ok_or_else(|| FacturaeError::Xml("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, elem)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FacturaeError::Xml(format!(
                    "XML parse error at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FacturaeError::Xml(format!(
            "unexpected end of document inside <{}>",
            open.tag()
        )));
    }
    root.ok_or_else(|| FacturaeError::Xml("document has no root element".into()))
}

fn start_element(e: &BytesStart<'_>) -> Result<Element, FacturaeError> {
    let name = std::str::from_utf8(e.local_name().as_ref())
        .map_err(|e| FacturaeError::Xml(format!("element name is not UTF-8: {e}")))?
        .to_string();

    let mut elem = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| FacturaeError::Xml(format!("invalid attribute: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| FacturaeError::Xml(format!("attribute name is not UTF-8: {e}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| FacturaeError::Xml(format!("invalid value of attribute {key}: {e}")))?;
        elem = elem.with_attribute(key, value.into_owned());
    }
    Ok(elem)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    elem: Element,
) -> Result<(), FacturaeError> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(elem),
        None if root.is_none() => *root = Some(elem),
        None => return Err(multiple_roots()),
    }
    Ok(())
}

fn multiple_roots() -> FacturaeError {
    FacturaeError::Xml("document has more than one root element".into())
}
