use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::{TemplateCache, cache_key};
use crate::data::DataStore;
use crate::element::{Element, FieldIndex, ParsedTemplate, Partial};
use crate::error::TrellisResult;
use crate::loader::TemplateLoader;
use crate::render::render;

/// Maximum distance from a section's opening `{{` to the first `}` before
/// the section search gives up. Guards against unterminated tags, not
/// against nesting.
const SECTION_TAG_GUARD: usize = 256;

/// Knobs for a single parse.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Expand `{{name "path"}}` includes at parse time (the default). With
    /// this off, include tags survive tokenization carrying their `path`
    /// and `vars` for resolution by the consuming application.
    pub expand_partials: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            expand_partials: true,
        }
    }
}

/// Parses `(path, section)` through the cache.
///
/// A hit returns the cached snapshot verbatim. On a miss the raw text is
/// loaded, the section extracted if one was requested, partials resolved to
/// a fixed point, and the tokenized result stored first-writer-wins (when a
/// cache was supplied). An absent or blank source yields an empty snapshot
/// and is deliberately not an error — nor is it cached.
///
/// Cyclic partial includes are not detected and will recurse without bound;
/// templates must not include themselves, directly or transitively.
pub(crate) fn parse(
    path: &str,
    section: &str,
    loader: &dyn TemplateLoader,
    cache: Option<&TemplateCache>,
    options: ParseOptions,
) -> TrellisResult<Arc<ParsedTemplate>> {
    let key = cache_key(path, section);
    if let Some(cache) = cache {
        if let Some(hit) = cache.get(&key) {
            trace!(path, section, "template cache hit");
            return Ok(hit);
        }
    }

    let Some(raw) = loader.load(path)? else {
        debug!(path, "template source absent, parsing as empty");
        return Ok(Arc::new(ParsedTemplate::empty()));
    };
    if raw.trim().is_empty() {
        return Ok(Arc::new(ParsedTemplate::empty()));
    }

    let mut html = if section.is_empty() {
        raw
    } else {
        extract_section(&raw, section).to_string()
    };

    let mut partials = Vec::new();
    if options.expand_partials {
        while let Some(expanded) = expand_first_partial(&html, loader, cache, options, &mut partials)? {
            html = expanded;
        }
    }

    let (elements, field_index) = tokenize(&html);
    debug!(
        path,
        section,
        elements = elements.len(),
        partials = partials.len(),
        "parsed template"
    );

    let parsed = Arc::new(ParsedTemplate {
        default_data: BTreeMap::new(),
        elements,
        field_index,
        partials,
    });
    match cache {
        Some(cache) => Ok(cache.insert(key, parsed)),
        None => Ok(parsed),
    }
}

/// Extracts the body between `{{section}}` and `{{/section}}`, or returns
/// the whole text when the section cannot be located.
fn extract_section<'a>(html: &'a str, section: &str) -> &'a str {
    let Some(e0) = html.find(&format!("{{{{{section}")) else {
        trace!(section, "section not found, using full text");
        return html;
    };
    // Bounded scan for the open tag's first closing brace; a runaway tag
    // means the section is treated as not found.
    let Some(brace) = html[e0..].find('}').map(|p| p + e0) else {
        return html;
    };
    if brace - e0 > SECTION_TAG_GUARD {
        return html;
    }
    let Some(e1) = html[brace..]
        .find(&format!("{{{{/{section}}}}}"))
        .map(|p| p + brace)
    else {
        return html;
    };
    let e2 = e0 + 4 + section.len();
    if e1 > e2 {
        html.get(e2..e1).unwrap_or(html)
    } else {
        html
    }
}

/// Finds the first fragment that denotes a partial include, expands it, and
/// returns the spliced text; `None` once no fragment classifies as one.
///
/// A fragment is a partial iff it carries a `}}` terminator, a double quote
/// before that terminator, and any colon in the header occurs after the
/// quote — which distinguishes `{{button "path"}}` from a plain tag with an
/// inline argument map like `{{row key:"v"}}`.
fn expand_first_partial(
    html: &str,
    loader: &dyn TemplateLoader,
    cache: Option<&TemplateCache>,
    options: ParseOptions,
    partials: &mut Vec<Partial>,
) -> TrellisResult<Option<String>> {
    let frags: Vec<&str> = html.split("{{").collect();
    for (x, frag) in frags.iter().enumerate().skip(1) {
        if frag.trim().is_empty() {
            continue;
        }
        let Some(i) = frag.find("}}") else { continue };
        let Some(u) = frag.find('"') else { continue };
        if i == 0 || u == 0 || u + 2 >= i {
            continue;
        }
        if frag[..i].find(':').is_some_and(|c| c < u) {
            continue;
        }
        let Some(u2) = frag[u + 1..].find('"').map(|p| p + u + 1) else {
            continue;
        };
        if u2 >= i {
            continue;
        }

        let name = frag[..u].trim();
        let include_path = &frag[u + 1..u2];
        trace!(name, path = include_path, "expanding partial include");

        // Pre-render the partial with visibility deferred so its own block
        // tags survive for the enclosing template's render pass.
        let inner = parse(include_path, "", loader, cache, options)?;
        let mut inner_data = DataStore::from_map(inner.default_data.clone());
        if u2 + 1 < i {
            let args = frag[u2 + 1..i].trim().trim_start_matches(',').trim_start();
            if args.contains(':') {
                if let Some(overrides) = parse_arg_list(args) {
                    for (key, value) in overrides {
                        inner_data.set(key, value);
                    }
                }
            }
        }
        let prefix = format!("{name}-");
        let rendered = prefix_tags(&render(&inner.elements, &inner_data, false), &prefix);

        partials.push(Partial {
            name: name.to_string(),
            path: include_path.to_string(),
            prefix: prefix.clone(),
        });
        for p in &inner.partials {
            partials.push(Partial {
                name: p.name.clone(),
                path: p.path.clone(),
                prefix: format!("{prefix}{}", p.prefix),
            });
        }

        // Splice the rewritten text in place of the include tag; the caller
        // restarts tokenization from scratch on the result.
        let mut rebuilt = String::with_capacity(html.len() + rendered.len());
        for (j, other) in frags.iter().enumerate() {
            if j == 0 {
                rebuilt.push_str(other);
            } else if j == x {
                rebuilt.push_str(&rendered);
                rebuilt.push_str(&frag[i + 2..]);
            } else {
                rebuilt.push_str("{{");
                rebuilt.push_str(other);
            }
        }
        return Ok(Some(rebuilt));
    }
    Ok(None)
}

/// Prepends `prefix` to every tag name in `html`, covering both the opening
/// (`{{name`) and closing (`{{/name`) spellings.
fn prefix_tags(html: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(y) = rest.find("{{") {
        out.push_str(&rest[..y]);
        if rest[y + 2..].starts_with('/') {
            out.push_str("{{/");
            rest = &rest[y + 3..];
        } else {
            out.push_str("{{");
            rest = &rest[y + 2..];
        }
        out.push_str(prefix);
    }
    out.push_str(rest);
    out
}

/// Splits `html` on `{{` and classifies each fragment into an element.
///
/// Fragment 0 is always literal-only. Whitespace-only fragments are
/// dropped. A fragment without a `}}` terminator is literal text with an
/// empty name.
fn tokenize(html: &str) -> (Vec<Element>, FieldIndex) {
    let mut elements: Vec<Element> = Vec::new();
    let mut field_index = FieldIndex::new();
    for (x, frag) in html.split("{{").enumerate() {
        if x == 0 {
            elements.push(Element::literal(frag));
            continue;
        }
        if frag.trim().is_empty() {
            continue;
        }
        let element = match frag.find("}}") {
            Some(i) if i > 0 => {
                let header = frag[..i].trim();
                let (name, remainder) = match header.find(' ') {
                    Some(sp) => (&header[..sp], header[sp + 1..].trim_start()),
                    None => (header, ""),
                };
                let (path, vars) = parse_tag_arguments(remainder);
                Element {
                    name: name.to_string(),
                    path,
                    trailing: frag[i + 2..].to_string(),
                    vars,
                }
            }
            _ => Element::literal(frag),
        };
        if !element.name.is_empty() && !element.name.starts_with('/') {
            field_index
                .entry(element.name.clone())
                .or_default()
                .push(elements.len());
        }
        elements.push(element);
    }
    (elements, field_index)
}

/// Classifies everything after the tag name: a quoted argument preceding
/// any colon is a literal include path (optionally followed by an argument
/// list); otherwise the remainder is tried as a `key:"value", ...` map.
fn parse_tag_arguments(remainder: &str) -> (Option<String>, Option<BTreeMap<String, String>>) {
    if remainder.is_empty() {
        return (None, None);
    }
    let quote = remainder.find('"');
    let colon = remainder.find(':');
    if let Some(q) = quote {
        if colon.is_none_or(|c| q < c) {
            let Some(q2) = remainder[q + 1..].find('"').map(|p| p + q + 1) else {
                // Unterminated quote: malformed, swallowed.
                return (None, None);
            };
            let path = remainder[q + 1..q2].to_string();
            let rest = remainder[q2 + 1..]
                .trim_start_matches(|c: char| c == ' ' || c == ',')
                .trim();
            let vars = if rest.is_empty() {
                None
            } else {
                parse_arg_list(rest)
            };
            return (Some(path), vars);
        }
    }
    (None, parse_arg_list(remainder))
}

/// Parses an inline `key:"value", key2:"v2"` list. Keys are colon-free and
/// unquoted, values are double-quoted with no escape processing. Any
/// deviation aborts the whole map; the caller swallows the failure.
fn parse_arg_list(input: &str) -> Option<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    let mut rest = input.trim();
    while !rest.is_empty() {
        let colon = rest.find(':')?;
        let key = rest[..colon].trim();
        if key.is_empty() || key.contains('"') {
            return None;
        }
        rest = rest[colon + 1..].trim_start();
        if !rest.starts_with('"') {
            return None;
        }
        let end = rest[1..].find('"')? + 1;
        map.insert(key.to_string(), rest[1..end].to_string());
        rest = rest[end + 1..].trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
            if rest.is_empty() {
                // Trailing comma with nothing after it.
                return None;
            }
        } else if !rest.is_empty() {
            return None;
        }
    }
    if map.is_empty() { None } else { Some(map) }
}
