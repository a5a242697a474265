/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are written out without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "plaintext", "script", "style", "xmp",
];

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Handle to a node in its document's arena. The generation changes when a
/// slot is freed, so handles to removed nodes stop resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    /// Doctype name, e.g. `html`.
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(tag: &str, attributes: Vec<Attribute>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: String) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Flips `class` in the class list and returns whether it is now present.
    pub fn toggle_class(&mut self, class: &str) -> bool {
        let mut classes: Vec<String> = self.classes().map(str::to_string).collect();
        let present = if classes.iter().any(|c| c == class) {
            classes.retain(|c| c != class);
            false
        } else {
            classes.push(class.to_string());
            true
        };
        self.set_attribute("class", classes.join(" "));
        present
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.tag)
    }

    pub fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS.contains(&self.tag.as_str())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn can_have_children(&self) -> bool {
        match &self.kind {
            NodeKind::Document => true,
            NodeKind::Element(e) => !e.is_void(),
            _ => false,
        }
    }
}
