//! Namespace-aware XML document tree.
//!
//! Elements live in an arena owned by the [`XmlDocument`] and are addressed
//! by [`ElementId`] handles. A handle is only meaningful for the document
//! that issued it; passing it to another document is an error.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{SamlError, SamlResult};

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> SamlResult<()> {
    writer
        .write_event(event)
        .map_err(|e| SamlError::XmlSerialize(e.to_string()))
}

/// Namespace bound to the reserved `xml` prefix.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

static NEXT_DOCUMENT: AtomicU64 = AtomicU64::new(1);

/// Handle to an element inside an [`XmlDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    document: u64,
    index: usize,
}

/// A namespace-qualified element.
#[derive(Debug, Clone)]
pub struct Element {
    namespace: Option<String>,
    prefix: Option<String>,
    local_name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
}

impl Element {
    /// Returns the namespace URI, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns the qualified name as written.
    #[must_use]
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}:{}", self.local_name)),
            None => Cow::Borrowed(&self.local_name),
        }
    }

    /// Returns the attributes in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

/// An XML document built element by element.
#[derive(Debug)]
pub struct XmlDocument {
    id: u64,
    elements: Vec<Element>,
    root: Option<ElementId>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if `name` is a valid NCName (a name without a colon).
///
/// Only ASCII name characters are checked strictly; non-ASCII letters are
/// accepted.
fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let start_ok = |c: char| c.is_alphabetic() || c == '_';
    start_ok(first) && chars.all(|c| start_ok(c) || c.is_alphanumeric() || matches!(c, '-' | '.'))
}

/// Checks that every character is an XML 1.0 `Char`.
fn check_chars(what: &str, value: &str) -> SamlResult<()> {
    let is_char = |c: char| {
        matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
    };
    match value.chars().find(|&c| !is_char(c)) {
        Some(c) => Err(SamlError::XmlStructure(format!(
            "{what} contains a character not allowed in XML: U+{:04X}",
            u32::from(c)
        ))),
        None => Ok(()),
    }
}

impl XmlDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed),
            elements: Vec::new(),
            root: None,
        }
    }

    fn check(&self, id: ElementId) -> SamlResult<usize> {
        if id.document != self.id || id.index >= self.elements.len() {
            return Err(SamlError::XmlStructure(
                "element handle belongs to another document".to_string(),
            ));
        }
        Ok(id.index)
    }

    /// Creates a detached element.
    ///
    /// `qualified_name` is `prefix:local` or `local`. A prefix requires a
    /// namespace; an unprefixed name with a namespace becomes the default
    /// namespace of the element. Empty text is treated as no text.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::XmlStructure`] for malformed names, a prefix
    /// without a namespace, the reserved `xmlns` prefix, the `xml` prefix
    /// bound to a foreign namespace, or text and namespace values holding
    /// characters XML does not allow.
    pub fn create_element_ns(
        &mut self,
        namespace: Option<&str>,
        qualified_name: &str,
        text: Option<&str>,
    ) -> SamlResult<ElementId> {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        let (prefix, local_name) = match qualified_name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qualified_name),
        };

        if !is_ncname(local_name) || prefix.is_some_and(|p| !is_ncname(p)) {
            return Err(SamlError::XmlStructure(format!(
                "invalid qualified name: {qualified_name:?}"
            )));
        }
        match (prefix, namespace) {
            (Some("xmlns"), _) => {
                return Err(SamlError::XmlStructure(
                    "the xmlns prefix cannot be used for elements".to_string(),
                ));
            }
            (Some("xml"), ns) if ns != Some(XML_NS) => {
                return Err(SamlError::XmlStructure(
                    "the xml prefix is bound to the XML namespace".to_string(),
                ));
            }
            (Some(prefix), None) => {
                return Err(SamlError::XmlStructure(format!(
                    "prefix {prefix:?} used without a namespace"
                )));
            }
            _ => {}
        }
        if let Some(ns) = namespace {
            check_chars("namespace", ns)?;
        }
        if let Some(text) = text {
            check_chars("text", text)?;
        }

        let id = ElementId {
            document: self.id,
            index: self.elements.len(),
        };
        self.elements.push(Element {
            namespace: namespace.map(str::to_string),
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            attributes: Vec::new(),
            text: text.filter(|t| !t.is_empty()).map(str::to_string),
            children: Vec::new(),
            parent: None,
        });
        Ok(id)
    }

    /// Sets an unqualified attribute, replacing an existing value in place.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::XmlStructure`] for a foreign handle, a name that
    /// is not an NCName (namespace declarations are managed by the document),
    /// or a value holding characters XML does not allow.
    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> SamlResult<()> {
        let index = self.check(element)?;
        if !is_ncname(name) || name == "xmlns" {
            return Err(SamlError::XmlStructure(format!("invalid attribute name: {name:?}")));
        }
        check_chars("attribute value", value)?;

        let attributes = &mut self.elements[index].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::XmlStructure`] for foreign handles, a child that
    /// already has a parent or is the root, or an append that would create a
    /// cycle.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> SamlResult<()> {
        let parent_index = self.check(parent)?;
        let child_index = self.check(child)?;

        if self.elements[child_index].parent.is_some() || self.root == Some(child) {
            return Err(SamlError::XmlStructure(format!(
                "element <{}> is already attached",
                self.elements[child_index].qualified_name()
            )));
        }

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(SamlError::XmlStructure(
                    "an element cannot be appended to itself or its descendant".to_string(),
                ));
            }
            cursor = self.elements[current.index].parent;
        }

        self.elements[child_index].parent = Some(parent);
        self.elements[parent_index].children.push(child);
        Ok(())
    }

    /// Makes a detached element the document element.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::XmlStructure`] if a root is already set or the
    /// element has a parent.
    pub fn set_root(&mut self, element: ElementId) -> SamlResult<()> {
        let index = self.check(element)?;
        if self.root.is_some() {
            return Err(SamlError::XmlStructure("document already has a root element".to_string()));
        }
        if self.elements[index].parent.is_some() {
            return Err(SamlError::XmlStructure(
                "an attached element cannot become the root".to_string(),
            ));
        }
        self.root = Some(element);
        Ok(())
    }

    /// Returns the document element.
    #[must_use]
    pub const fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Returns an element by handle.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.check(id).ok().map(|index| &self.elements[index])
    }

    /// Returns the children of an element.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.element(id).map_or(&[], |element| element.children.as_slice())
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the text content of an element.
    #[must_use]
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.element(id)?.text.as_deref()
    }

    /// Finds the first child with the given namespace and local name.
    #[must_use]
    pub fn find_child(&self, parent: ElementId, namespace: &str, local_name: &str) -> Option<ElementId> {
        self.children(parent).iter().copied().find(|child| {
            self.element(*child).is_some_and(|element| {
                element.namespace() == Some(namespace) && element.local_name == local_name
            })
        })
    }

    /// Serializes the document.
    ///
    /// The output starts with an XML declaration, indents nested elements by
    /// two spaces and ends with a newline. Namespace declarations appear on
    /// the first element where a prefix comes into scope; attributes keep
    /// their insertion order; elements without text or children are
    /// self-closing.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::XmlStructure`] if no root is set, or
    /// [`SamlError::XmlSerialize`] if the writer fails.
    pub fn serialize(&self) -> SamlResult<String> {
        let root = self
            .root
            .ok_or_else(|| SamlError::XmlStructure("document has no root element".to_string()))?;

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut scope = Vec::new();
        self.write_element(&mut writer, root, &mut scope)?;

        let mut xml = String::from_utf8(writer.into_inner())
            .map_err(|e| SamlError::XmlSerialize(e.to_string()))?;
        xml.push('\n');
        Ok(xml)
    }

    /// Writes one element and its subtree. `scope` holds the in-scope
    /// `(prefix, namespace)` bindings, innermost last; the default namespace
    /// uses an empty prefix.
    fn write_element(
        &self,
        writer: &mut Writer<Vec<u8>>,
        id: ElementId,
        scope: &mut Vec<(String, String)>,
    ) -> SamlResult<()> {
        let element = &self.elements[id.index];
        let name = element.qualified_name();
        let mut start = BytesStart::new(name.as_ref());

        let scope_len = scope.len();
        let prefix = element.prefix.as_deref().unwrap_or("");
        let namespace = element.namespace.as_deref().unwrap_or("");
        let bound = scope
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map_or("", |(_, ns)| ns.as_str());
        if bound != namespace && prefix != "xml" {
            let attribute = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{prefix}")
            };
            start.push_attribute((attribute.as_str(), namespace));
            scope.push((prefix.to_string(), namespace.to_string()));
        }

        for (key, value) in &element.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if element.children.is_empty() && element.text.is_none() {
            write(writer, Event::Empty(start))?;
        } else {
            write(writer, Event::Start(start))?;
            if let Some(text) = &element.text {
                write(writer, Event::Text(BytesText::new(text)))?;
            }
            for child in &element.children {
                self.write_element(writer, *child, scope)?;
            }
            write(writer, Event::End(BytesEnd::new(name.as_ref())))?;
        }

        scope.truncate(scope_len);
        Ok(())
    }
}
