use std::sync::Arc;

use crate::cache::TemplateCache;
use crate::data::{Bindable, DataStore};
use crate::element::{Element, FieldIndex, ParsedTemplate, Partial};
use crate::error::TrellisResult;
use crate::loader::TemplateLoader;
use crate::parser::{ParseOptions, parse};
use crate::render;

/// One render context over a parsed template.
///
/// A `Template` pairs a shared immutable [`ParsedTemplate`] snapshot with a
/// private [`DataStore`], seeded from the snapshot's default data. Renders
/// never mutate the snapshot, so any number of `Template` instances may be
/// built over one cache entry.
///
/// # Example
///
/// ```
/// use trellis::{MemoryLoader, Template, TemplateCache};
///
/// let mut loader = MemoryLoader::new();
/// loader.insert("greeting.html", "Hi {{name}}, {{promo}}sale on now {{/promo}}bye.");
///
/// let cache = TemplateCache::new();
/// let mut tmpl = Template::new("greeting.html", &loader, Some(&cache)).unwrap();
/// tmpl.set("name", "Sam");
/// assert_eq!(tmpl.render(), "Hi Sam, bye.");
///
/// tmpl.show("promo");
/// assert_eq!(tmpl.render(), "Hi Sam, sale on now bye.");
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    path: String,
    section: String,
    parsed: Arc<ParsedTemplate>,
    data: DataStore,
}

impl Template {
    /// Parses (or fetches from `cache`) the template at `path`.
    pub fn new<P: AsRef<str>>(
        path: P,
        loader: &dyn TemplateLoader,
        cache: Option<&TemplateCache>,
    ) -> TrellisResult<Self> {
        Self::with_section(path, "", loader, cache)
    }

    /// Parses only the `{{section}} ... {{/section}}` sub-range of the file.
    /// When the section cannot be located the whole file is used.
    pub fn with_section<P: AsRef<str>, S: AsRef<str>>(
        path: P,
        section: S,
        loader: &dyn TemplateLoader,
        cache: Option<&TemplateCache>,
    ) -> TrellisResult<Self> {
        Self::with_options(path, section, loader, cache, ParseOptions::default())
    }

    pub fn with_options<P: AsRef<str>, S: AsRef<str>>(
        path: P,
        section: S,
        loader: &dyn TemplateLoader,
        cache: Option<&TemplateCache>,
        options: ParseOptions,
    ) -> TrellisResult<Self> {
        let path = path.as_ref();
        let section = section.as_ref();
        let parsed = parse(path, section, loader, cache, options)?;
        let data = DataStore::from_map(parsed.default_data.clone());
        Ok(Self {
            path: path.to_string(),
            section: section.to_string(),
            parsed,
            data,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// The shared parsed snapshot this instance renders from.
    pub fn parsed(&self) -> &ParsedTemplate {
        &self.parsed
    }

    pub fn elements(&self) -> &[Element] {
        &self.parsed.elements
    }

    pub fn field_index(&self) -> &FieldIndex {
        &self.parsed.field_index
    }

    /// Manifest of every partial expanded into this template, transitive
    /// entries with composed prefixes. Introspection only.
    pub fn partials(&self) -> &[Partial] {
        &self.parsed.partials
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    /// Value bound for `key`, if any.
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.data.get(key)
    }

    pub fn set<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.data.set(key, value);
        self
    }

    /// Marks the block named `name` visible for the next render.
    pub fn show<K: AsRef<str>>(&mut self, name: K) -> &mut Self {
        self.data.set_flag(name, true);
        self
    }

    pub fn flag<K: AsRef<str>>(&self, key: K) -> bool {
        self.data.flag(key)
    }

    /// Flattens a structured value into the data store. See
    /// [`DataStore::bind`].
    pub fn bind<B: Bindable + ?Sized>(&mut self, value: &B, root: &str) -> &mut Self {
        self.data.bind(value, root);
        self
    }

    /// Renders with hidden blocks removed and unresolved tags dropped.
    pub fn render(&self) -> String {
        render::render(&self.parsed.elements, &self.data, true)
    }

    /// Renders against a caller-supplied data store. With `hide_elements`
    /// clear, unresolved tags are re-emitted for a later pass instead of
    /// being dropped.
    pub fn render_with(&self, data: &DataStore, hide_elements: bool) -> String {
        render::render(&self.parsed.elements, data, hide_elements)
    }

    /// Literal content of the block named `name`, independent of a render
    /// pass.
    ///
    /// Walks the unmodified element sequence from the first occurrence of
    /// `name` to the first textual `/name` closer, concatenating literal
    /// text. A nested non-closing tag is included recursively when its flag
    /// is set in the data store, and skipped entirely otherwise. Returns an
    /// empty string when the block does not occur.
    pub fn content<K: AsRef<str>>(&self, name: K) -> String {
        block_content(&self.parsed.elements, &self.data, name.as_ref())
    }

    /// A prefixed sub-view over this template's data store, for binding
    /// child-scoped keys such as the tags of an expanded partial. Keys set
    /// through the view land in this template's store as `"<id>-key"`.
    pub fn child<I: AsRef<str>>(&mut self, id: I) -> ChildView<'_> {
        ChildView::new(id.as_ref(), &mut self.data, &self.parsed.field_index)
    }
}

fn block_content(elements: &[Element], data: &DataStore, name: &str) -> String {
    let Some(index) = elements.iter().position(|e| e.name == name) else {
        return String::new();
    };
    let mut html = elements[index].trailing.clone();
    let closer = format!("/{name}");
    for part in &elements[index + 1..] {
        if part.name == closer {
            break;
        }
        if part.name.contains('/') {
            // Some other block's closer: its trailing text belongs to the
            // enclosing range.
            html.push_str(&part.trailing);
        } else if data.flag(&part.name) {
            html.push_str(&block_content(elements, data, &part.name));
        }
    }
    html
}

/// Read/write proxy over a parent [`DataStore`] that prefixes every key
/// with `"<id>-"`. Owns no storage of its own.
#[derive(Debug)]
pub struct ChildView<'a> {
    prefix: String,
    data: &'a mut DataStore,
    field_index: FieldIndex,
}

impl<'a> ChildView<'a> {
    fn new(id: &str, data: &'a mut DataStore, parent_index: &FieldIndex) -> Self {
        let prefix = format!("{id}-");
        // Local view of the parent's field index: entries under this
        // prefix, with the prefix stripped.
        let field_index = parent_index
            .iter()
            .filter_map(|(name, positions)| {
                name.strip_prefix(&prefix)
                    .map(|local| (local.to_string(), positions.clone()))
            })
            .collect();
        Self {
            prefix,
            data,
            field_index,
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.data.get(self.scoped(key.as_ref()))
    }

    pub fn set<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        let key = self.scoped(key.as_ref());
        self.data.set(key, value);
        self
    }

    pub fn flag<K: AsRef<str>>(&self, key: K) -> bool {
        self.data.flag(self.scoped(key.as_ref()))
    }

    pub fn set_flag<K: AsRef<str>>(&mut self, key: K, value: bool) -> &mut Self {
        let key = self.scoped(key.as_ref());
        self.data.set_flag(key, value);
        self
    }

    pub fn show<K: AsRef<str>>(&mut self, name: K) -> &mut Self {
        self.set_flag(name, true)
    }

    /// Field index filtered to this view's prefix, names localized.
    pub fn field_index(&self) -> &FieldIndex {
        &self.field_index
    }
}
