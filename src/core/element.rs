use serde::{Deserialize, Serialize};

/// Immutable, navigable view of one XML element.
///
/// This is the tree the accountant rules read from. Tags are stored
/// without namespace prefix (`fe:Facturae` becomes `Facturae`), so lookups
/// use the plain Facturae element names.
///
/// ```
/// use facturae::core::Element;
///
/// let totals = Element::new("InvoiceTotals")
///     .with_child(Element::leaf("InvoiceTotal", "121.00"));
/// let invoice = Element::new("Invoice").with_child(totals);
///
/// assert_eq!(invoice.text_at("InvoiceTotals/InvoiceTotal"), Some("121.00"));
/// assert!(invoice.find("TaxesWithheld").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    tag: String,
    text: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    /// Create an element with no text, attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Create a text-only element, e.g. `<GrossAmount>12.21</GrossAmount>`.
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(tag).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a child in place.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append character data, concatenating with any text already present.
    pub fn append_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Element text, `None` when the element has no (or only empty) text.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All children with the given tag, in document order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Follow a slash-separated path of child tags, taking the first match
    /// at each step (`"InvoiceTotals/InvoiceTotal"`).
    pub fn find_path(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, tag| node.find(tag))
    }

    /// Text of the element at `path`, if both exist.
    pub fn text_at(&self, path: &str) -> Option<&str> {
        self.find_path(path).and_then(Element::text)
    }

    /// Whether a child element exists at `path`.
    pub fn has(&self, path: &str) -> bool {
        self.find_path(path).is_some()
    }

    /// Mutable child lookup, creating the child when absent.
    pub(crate) fn child_mut_or_insert(&mut self, tag: &str) -> &mut Element {
        let index = match self.children.iter().position(|c| c.tag == tag) {
            Some(i) => i,
            None => {
                self.children.push(Element::new(tag));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Set the text at `path`, creating intermediate elements as needed.
    pub(crate) fn set_text_at(&mut self, path: &str, text: impl Into<String>) {
        let node = path
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self, |node, tag| node.child_mut_or_insert(tag));
        node.text = Some(text.into());
    }
}
