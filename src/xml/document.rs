use tracing::debug;

use super::reader::parse_element;
use super::summary::FacturaeSummary;
use super::xml_utils::XmlWriter;
use crate::core::{Element, FacturaeError, InvoiceValidator, SchemaVersion, ValidationOptions};

/// A parsed Facturae file (`fe:Facturae` root).
///
/// ```
/// use facturae::core::ValidationOptions;
/// use facturae::xml::FacturaeDocument;
///
/// let doc = FacturaeDocument::from_xml(r#"<fe:Facturae xmlns:fe="urn:x">
///   <FileHeader><SchemaVersion>3.2.1</SchemaVersion></FileHeader>
///   <Invoices/>
/// </fe:Facturae>"#).unwrap();
///
/// assert_eq!(doc.schema_version().unwrap().code(), "3.2.1");
/// assert_eq!(doc.invoices().count(), 0);
/// assert!(doc.validate(&ValidationOptions::default()).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FacturaeDocument {
    root: Element,
}

impl FacturaeDocument {
    pub fn from_xml(xml: &str) -> Result<Self, FacturaeError> {
        Self::from_element(parse_element(xml)?)
    }

    /// Wrap an already-built tree. The root must be `Facturae`.
    pub fn from_element(root: Element) -> Result<Self, FacturaeError> {
        if root.tag() != "Facturae" {
            return Err(FacturaeError::Xml(format!(
                "root element is <{}>, expected <Facturae>",
                root.tag()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// `FileHeader/SchemaVersion`, which must be one of the supported versions.
    pub fn schema_version(&self) -> Result<SchemaVersion, FacturaeError> {
        let declared = self
            .root
            .text_at("FileHeader/SchemaVersion")
            .map(str::trim)
            .ok_or_else(|| FacturaeError::VersionNotFound("no FileHeader/SchemaVersion".into()))?;
        SchemaVersion::from_code(declared)
            .ok_or_else(|| FacturaeError::VersionNotFound(format!("unsupported version {declared}")))
    }

    /// The `Invoices/Invoice` elements in document order.
    pub fn invoices(&self) -> impl Iterator<Item = &Element> + '_ {
        self.root
            .find("Invoices")
            .into_iter()
            .flat_map(|invoices| invoices.find_all("Invoice"))
    }

    /// Run the accountant validation over every invoice, stopping at the
    /// first failure.
    pub fn validate(&self, options: &ValidationOptions) -> Result<(), FacturaeError> {
        let validator = InvoiceValidator::new(options);
        for (index, invoice) in self.invoices().enumerate() {
            debug!(invoice = index + 1, "validating invoice");
            validator.validate(invoice)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> Result<FacturaeSummary, FacturaeError> {
        FacturaeSummary::from_root(&self.root, self.schema_version()?)
    }

    /// Serialize back to XML with the root written as `fe:Facturae`.
    ///
    /// A missing `xmlns:fe` declaration is added for the declared schema
    /// version (3.2.2 when the version is unknown).
    pub fn to_xml(&self) -> Result<String, FacturaeError> {
        let mut attrs: Vec<(&str, &str)> = self
            .root
            .attributes()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if self.root.attribute("xmlns:fe").is_none() {
            let version = self.schema_version().unwrap_or(SchemaVersion::DEFAULT);
            attrs.insert(0, ("xmlns:fe", version.namespace()));
        }

        let mut w = XmlWriter::new()?;
        w.start_element_with_attrs("fe:Facturae", &attrs)?;
        for child in self.root.children() {
            w.element(child.tag(), child)?;
        }
        w.end_element("fe:Facturae")?;
        w.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_other_roots() {
        let err = FacturaeDocument::from_xml("<Invoice/>").unwrap_err();
        assert_eq!(err.to_string(), "XML error: root element is <Invoice>, expected <Facturae>");
    }

    #[test]
    fn unsupported_version() {
        let doc = FacturaeDocument::from_xml(
            "<Facturae><FileHeader><SchemaVersion>3.1</SchemaVersion></FileHeader></Facturae>",
        )
        .unwrap();
        assert!(matches!(doc.schema_version(), Err(FacturaeError::VersionNotFound(_))));
        assert!(matches!(doc.summary(), Err(FacturaeError::VersionNotFound(_))));
    }

    #[test]
    fn namespace_added_on_write() {
        let doc = FacturaeDocument::from_element(
            Element::new("Facturae").with_child(
                Element::new("FileHeader").with_child(Element::leaf("SchemaVersion", "3.2.1")),
            ),
        )
        .unwrap();
        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(
            r#"<fe:Facturae xmlns:fe="http://www.facturae.es/Facturae/2014/v3.2.1/Facturae">"#
        ));
        assert_eq!(FacturaeDocument::from_xml(&xml).unwrap().schema_version().unwrap(), SchemaVersion::V3_2_1);
    }
}
