use std::collections::BTreeSet;

use crate::data::DataStore;
use crate::element::Element;

/// A paired open/close tag range, recorded before any removal so positions
/// refer to the copied sequence as parsed.
struct Block {
    name: String,
    start: usize,
    end: usize,
    show: bool,
}

/// Renders an element sequence against `data`.
///
/// With `hide_elements` set, hidden block ranges are physically removed and
/// unresolved tags are dropped from the output. With it clear (partial
/// pre-render mode) unresolved tags are re-emitted as bare `{{name}}`
/// markers so block tags survive, renamed, for the enclosing template's own
/// visibility pass.
///
/// The input slice is deep-copied first; a cached sequence is never mutated
/// by rendering.
pub(crate) fn render(elements: &[Element], data: &DataStore, hide_elements: bool) -> String {
    if elements.is_empty() {
        return String::new();
    }
    let mut elems = elements.to_vec();

    // Pair every open tag with the first forward textual match of "/name".
    // Deliberately not nesting-aware: identical names nested inside
    // themselves mis-pair, and distinct same-named sibling blocks each pair
    // with the first closer found ahead of them.
    let mut blocks: Vec<Block> = Vec::new();
    for x in 0..elems.len() {
        let name = &elems[x].name;
        if name.is_empty() || name.starts_with('/') {
            continue;
        }
        let closer = format!("/{name}");
        if let Some(y) = (x + 1..elems.len()).find(|&y| elems[y].name == closer) {
            blocks.push(Block {
                name: name.clone(),
                start: x,
                end: y,
                show: data.flag(name),
            });
        }
    }

    if hide_elements {
        // Union of positions inside hidden ranges: open tag inclusive,
        // close tag exclusive, so the closer survives for any outer pairing.
        let mut remove: BTreeSet<usize> = BTreeSet::new();
        for block in blocks.iter().filter(|b| !b.show) {
            remove.extend(block.start..block.end);
        }
        if !remove.is_empty() {
            let mut position = 0;
            elems.retain(|_| {
                let keep = !remove.contains(&position);
                position += 1;
                keep
            });
        }
    }

    let mut out = String::new();
    for elem in &elems {
        let name = &elem.name;
        let substitutable = !name.is_empty()
            && !name.contains('/')
            && !blocks.iter().any(|b| b.name == *name)
            && data.contains(name);
        if substitutable {
            if let Some(value) = data.get(name) {
                out.push_str(value);
            }
        } else if !hide_elements && !name.is_empty() {
            // Pre-render mode: keep the tag spelling for a later pass.
            out.push_str("{{");
            out.push_str(name);
            out.push_str("}}");
        }
        out.push_str(&elem.trailing);
    }
    out
}
