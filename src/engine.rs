use crate::cache::TemplateCache;
use crate::error::TrellisResult;
use crate::loader::TemplateLoader;
use crate::parser::ParseOptions;
use crate::template::Template;

/// Bundles a loader with an owned parse cache.
///
/// Every template handed out by one engine shares the same cache, so a
/// `(path, section)` pair is loaded from the collaborator and parsed at
/// most once per engine lifetime. Construct one engine per scope that
/// should share parse results; there is no process-wide cache.
///
/// # Example
///
/// ```
/// use trellis::{MemoryLoader, TrellisEngine};
///
/// let mut loader = MemoryLoader::new();
/// loader.insert("hello.html", "Hello, {{name}}!");
///
/// let engine = TrellisEngine::new(loader);
/// let mut tmpl = engine.template("hello.html").unwrap();
/// tmpl.set("name", "World");
/// assert_eq!(tmpl.render(), "Hello, World!");
/// ```
#[derive(Debug)]
pub struct TrellisEngine<L: TemplateLoader> {
    loader: L,
    cache: TemplateCache,
    options: ParseOptions,
}

impl<L: TemplateLoader> TrellisEngine<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cache: TemplateCache::new(),
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(loader: L, options: ParseOptions) -> Self {
        Self {
            loader,
            cache: TemplateCache::new(),
            options,
        }
    }

    /// A template instance over the whole file at `path`.
    pub fn template<P: AsRef<str>>(&self, path: P) -> TrellisResult<Template> {
        Template::with_options(path, "", &self.loader, Some(&self.cache), self.options)
    }

    /// A template instance over one `{{section}} ... {{/section}}` of the
    /// file at `path`.
    pub fn section<P: AsRef<str>, S: AsRef<str>>(
        &self,
        path: P,
        section: S,
    ) -> TrellisResult<Template> {
        Template::with_options(path, section, &self.loader, Some(&self.cache), self.options)
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}
