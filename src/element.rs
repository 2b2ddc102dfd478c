use std::collections::BTreeMap;

/// One token of a parsed template.
///
/// The element sequence is ordered: the position of an element determines
/// which literal text follows which tag, and which open/close pairs enclose
/// which ranges. Renders deep-copy the sequence before touching it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag identifier. Empty for pure literal text, `/`-prefixed for a
    /// closing block tag.
    pub name: String,
    /// Optional quoted argument: the include source when this element is an
    /// unexpanded include tag, otherwise unused.
    pub path: Option<String>,
    /// Literal text immediately following this tag, up to the next tag.
    pub trailing: String,
    /// Inline `key:"value"` arguments carried by the tag, if any.
    pub vars: Option<BTreeMap<String, String>>,
}

impl Element {
    /// A literal-only element carrying no tag.
    pub(crate) fn literal<T: Into<String>>(trailing: T) -> Self {
        Self {
            trailing: trailing.into(),
            ..Self::default()
        }
    }

    /// Whether this element is a closing block tag (`{{/name}}`).
    pub fn is_closer(&self) -> bool {
        self.name.starts_with('/')
    }
}

/// Mapping from tag name to the ordered positions where that name occurs in
/// the element sequence. Closing tags and literal elements are not indexed.
pub type FieldIndex = BTreeMap<String, Vec<usize>>;

/// One entry per partial expansion, recorded for introspection of the
/// inclusion chain. Transitively-included partials appear with their
/// prefixes composed (`outer + inner`).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partial {
    /// The include tag's name in the enclosing template.
    pub name: String,
    /// Logical path the partial was loaded from.
    pub path: String,
    /// Prefix applied to every tag inside the expansion, e.g. `button-`.
    pub prefix: String,
}

/// Immutable parse result for one `(path, section)` pair.
///
/// Created once, read many times. Never mutated after insertion into a
/// [`TemplateCache`](crate::TemplateCache); renders copy `elements` first.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTemplate {
    /// Seed data applied to every template instance built on this snapshot.
    pub default_data: BTreeMap<String, String>,
    pub elements: Vec<Element>,
    pub field_index: FieldIndex,
    pub partials: Vec<Partial>,
}

impl ParsedTemplate {
    /// An empty snapshot, used for absent or blank sources.
    pub(crate) fn empty() -> Self {
        Self::default()
    }
}
