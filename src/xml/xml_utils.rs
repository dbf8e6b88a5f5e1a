use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use crate::core::{Element, FacturaeError};

fn xml_io(e: std::io::Error) -> FacturaeError {
    FacturaeError::Xml(format!("XML write error: {e}"))
}

pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, FacturaeError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, FacturaeError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| FacturaeError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FacturaeError> {
        self.writer
            .write_event(Event::Start(start(name, attrs)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, FacturaeError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn empty_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FacturaeError> {
        self.writer
            .write_event(Event::Empty(start(name, attrs)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text(&mut self, text: &str) -> Result<&mut Self, FacturaeError> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FacturaeError> {
        self.start_element_with_attrs(name, attrs)?;
        self.text(text)?;
        self.end_element(name)
    }

    /// Write `elem` and its subtree, naming the top element `name`.
    pub fn element(&mut self, name: &str, elem: &Element) -> Result<&mut Self, FacturaeError> {
        let attrs: Vec<(&str, &str)> = elem
            .attributes()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        match (elem.text(), elem.children()) {
            (None, []) => self.empty_element_with_attrs(name, &attrs),
            (Some(text), []) => self.text_element_with_attrs(name, text, &attrs),
            (text, children) => {
                self.start_element_with_attrs(name, &attrs)?;
                if let Some(text) = text {
                    self.text(text)?;
                }
                for child in children {
                    self.element(child.tag(), child)?;
                }
                self.end_element(name)
            }
        }
    }
}

fn start<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut elem = BytesStart::new(name);
    for (k, v) in attrs {
        elem.push_attribute((*k, *v));
    }
    elem
}

impl Element {
    /// Serialize the tree as an indented XML document.
    ///
    /// Element names are written as stored, i.e. without namespace prefix.
    pub fn to_xml(&self) -> Result<String, FacturaeError> {
        let mut w = XmlWriter::new()?;
        w.element(self.tag(), self)?;
        w.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_element;

    #[test]
    fn writes_declaration_and_indent() {
        let xml = Element::new("InvoiceTotals")
            .with_child(Element::leaf("InvoiceTotal", "121.00"))
            .to_xml()
            .unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("\n  <InvoiceTotal>121.00</InvoiceTotal>"));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let elem = Element::new("Party")
            .with_attribute("note", "a \"b\"")
            .with_child(Element::leaf("CorporateName", "Smith & Co <SL>"))
            .with_child(Element::new("TradeName"));
        let back = parse_element(&elem.to_xml().unwrap()).unwrap();
        assert_eq!(back, elem);
    }
}
