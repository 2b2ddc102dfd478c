
use fixtures::CountingLoader;
use pretty_assertions::assert_eq;
use trellis::{
    BindValue, Bindable, DataStore, FsLoader, MemoryLoader, Template, TemplateCache,
    TrellisEngine,
};

#[test]
#[ntest::timeout(100)]
fn tag_free_template_renders_verbatim() {
    let source = "<html>\n  <body>plain, no tags at all</body>\n</html>\n";
    let mut loader = MemoryLoader::new();
    loader.insert("plain.html", source);

    let engine = TrellisEngine::new(loader);
    let tmpl = engine.template("plain.html").unwrap();
    assert_eq!(tmpl.render(), source);
}

#[test]
#[ntest::timeout(100)]
fn basic_substitution_and_block_visibility() {
    let mut loader = MemoryLoader::new();
    loader.insert("greet.html", "Hi {{name}}, {{show}}shown text {{/show}}end.");

    let engine = TrellisEngine::new(loader);
    let mut tmpl = engine.template("greet.html").unwrap();
    tmpl.set("name", "Sam");
    assert_eq!(tmpl.render(), "Hi Sam, end.");

    tmpl.show("show");
    assert_eq!(tmpl.render(), "Hi Sam, shown text end.");
}

#[test]
#[ntest::timeout(100)]
fn hidden_block_appears_exactly_once_when_shown() {
    let mut loader = MemoryLoader::new();
    loader.insert("page.html", "a{{b}}X{{/b}}c");

    let engine = TrellisEngine::new(loader);
    let mut tmpl = engine.template("page.html").unwrap();
    assert_eq!(tmpl.render(), "ac");
    tmpl.show("b");
    assert_eq!(tmpl.render().matches('X').count(), 1);
}

#[test]
#[ntest::timeout(100)]
fn cache_prevents_second_load_and_returns_identical_elements() {
    let mut loader = CountingLoader::new();
    loader.insert("page.html", "Hello {{name}}, welcome to {{place}}.");

    let cache = TemplateCache::new();
    let first = Template::new("page.html", &loader, Some(&cache)).unwrap();
    let second = Template::new("page.html", &loader, Some(&cache)).unwrap();

    assert_eq!(loader.loads("page.html"), 1, "cache hit must not reload");
    assert_eq!(first.elements(), second.elements());
    assert_eq!(first.parsed(), second.parsed());
}

#[test]
#[ntest::timeout(100)]
fn section_and_whole_file_cache_independently() {
    let mut loader = CountingLoader::new();
    loader.insert(
        "page.html",
        "top {{menu}}<li>{{label}}</li>{{/menu}} bottom",
    );

    let cache = TemplateCache::new();
    let whole = Template::new("page.html", &loader, Some(&cache)).unwrap();
    let menu = Template::with_section("page.html", "menu", &loader, Some(&cache)).unwrap();

    // Different keys, so the file is read once per (path, section) miss.
    assert_eq!(loader.loads("page.html"), 2);
    assert_eq!(cache.len(), 2);
    assert_ne!(whole.elements(), menu.elements());

    let mut menu = menu;
    menu.set("label", "Home");
    assert_eq!(menu.render(), "<li>Home</li>");
}

#[test]
#[ntest::timeout(100)]
fn partial_variables_are_rescoped_and_never_collide() {
    let mut loader = MemoryLoader::new();
    loader.insert("outer.html", "{{a}}outer {{/a}}{{p \"part.html\"}}");
    loader.insert("part.html", "{{a}}inner {{/a}}");

    let engine = TrellisEngine::new(loader);
    let mut tmpl = engine.template("outer.html").unwrap();

    // Only the outer block shown: the partial's same-named block stays
    // hidden because its key is p-a, not a.
    tmpl.show("a");
    assert_eq!(tmpl.render(), "outer ");

    let mut tmpl = engine.template("outer.html").unwrap();
    tmpl.child("p").show("a");
    assert_eq!(tmpl.render(), "inner ");
}

#[test]
#[ntest::timeout(100)]
fn render_is_idempotent_and_cache_entry_is_untouched() {
    let mut loader = MemoryLoader::new();
    loader.insert("page.html", "Hi {{name}}, {{promo}}sale {{/promo}}bye.");

    let engine = TrellisEngine::new(loader);
    let mut tmpl = engine.template("page.html").unwrap();
    tmpl.set("name", "Sam");

    let snapshot_before = tmpl.parsed().clone();
    let first = tmpl.render();
    let second = tmpl.render();
    assert_eq!(first, second);
    assert_eq!(first, "Hi Sam, bye.");
    assert_eq!(tmpl.parsed(), &snapshot_before);

    // A fresh instance over the same cache entry sees the same sequence.
    let again = engine.template("page.html").unwrap();
    assert_eq!(again.elements(), snapshot_before.elements.as_slice());
}

#[test]
#[ntest::timeout(100)]
fn partial_with_override_data_pre_renders() {
    let mut loader = MemoryLoader::new();
    loader.insert("outer.html", r#"{{card "cards/item" title:"Hello"}}"#);
    loader.insert("cards/item", "<b>{{title}}</b>");

    let engine = TrellisEngine::new(loader);
    let tmpl = engine.template("outer.html").unwrap();
    assert_eq!(tmpl.render(), "<b>Hello</b>");
}

#[test]
#[ntest::timeout(100)]
fn nested_partials_compose_prefixes_end_to_end() {
    let mut loader = MemoryLoader::new();
    loader.insert("page.html", r#"{{list "list.html"}}"#);
    loader.insert("list.html", r#"<ul>{{row "row.html"}}</ul>"#);
    loader.insert("row.html", "<li>{{text}}</li>");

    let engine = TrellisEngine::new(loader);
    let mut tmpl = engine.template("page.html").unwrap();
    tmpl.set("list-row-text", "first");
    assert_eq!(tmpl.render(), "<ul><li>first</li></ul>");

    let prefixes: Vec<&str> = tmpl.partials().iter().map(|p| p.prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["list-", "list-row-"]);
}

#[test]
#[ntest::timeout(100)]
fn missing_source_renders_empty() {
    let engine = TrellisEngine::new(MemoryLoader::new());
    let tmpl = engine.template("not-there.html").unwrap();
    assert_eq!(tmpl.render(), "");
}

#[test]
#[ntest::timeout(100)]
fn unknown_variable_renders_empty_not_error() {
    let mut loader = MemoryLoader::new();
    loader.insert("page.html", "[{{nothing}}]");
    let engine = TrellisEngine::new(loader);
    assert_eq!(engine.template("page.html").unwrap().render(), "[]");
}

#[test]
#[ntest::timeout(100)]
fn block_content_accessor_reads_without_rendering() {
    let mut loader = MemoryLoader::new();
    loader.insert(
        "page.html",
        "{{menu}}<li>one</li>{{sub}}<li>two</li>{{/sub}}{{/menu}}",
    );
    let engine = TrellisEngine::new(loader);
    let mut tmpl = engine.template("page.html").unwrap();

    assert_eq!(tmpl.content("menu"), "<li>one</li>");
    tmpl.show("sub");
    assert_eq!(tmpl.content("menu"), "<li>one</li><li>two</li>");
}

#[test]
#[ntest::timeout(100)]
fn bind_feeds_render() {
    struct Order {
        id: u32,
        paid: bool,
    }

    impl Bindable for Order {
        fn fields(&self) -> Vec<(&'static str, BindValue<'_>)> {
            vec![("Id", BindValue::text(self.id)), ("Paid", self.paid.into())]
        }
    }

    let mut loader = MemoryLoader::new();
    loader.insert(
        "order.html",
        "Order #{{order.id}} {{order.paid}}PAID {{/order.paid}}",
    );

    let engine = TrellisEngine::new(loader);
    let mut tmpl = engine.template("order.html").unwrap();
    tmpl.bind(&Order { id: 7, paid: true }, "order");
    assert_eq!(tmpl.render(), "Order #7 PAID ");

    let mut tmpl = engine.template("order.html").unwrap();
    tmpl.bind(&Order { id: 8, paid: false }, "order");
    assert_eq!(tmpl.render(), "Order #8 ");
}

#[test]
#[ntest::timeout(100)]
fn render_with_external_data_store() {
    let mut loader = MemoryLoader::new();
    loader.insert("page.html", "{{greeting}}, {{name}}!");

    let engine = TrellisEngine::new(loader);
    let tmpl = engine.template("page.html").unwrap();

    let mut data = DataStore::new();
    data.set("greeting", "Hello").set("name", "World");
    assert_eq!(tmpl.render_with(&data, true), "Hello, World!");
}

#[test]
#[ntest::timeout(1000)]
fn fs_loader_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("ui")).unwrap();
    std::fs::write(
        dir.path().join("page.html"),
        r#"<main>{{button "/ui/button.html" label:"Go"}}</main>"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("ui/button.html"), "<button>{{label}}</button>").unwrap();

    let engine = TrellisEngine::new(FsLoader::new(dir.path()));
    let tmpl = engine.template("/page.html").unwrap();
    assert_eq!(tmpl.render(), "<main><button>Go</button></main>");
}
