//! Document outline (bookmarks)
//!
//! The outline is read once into an explicit tree: an item either stands
//! alone ([`OutlineNode::Leaf`]) or owns nested items
//! ([`OutlineNode::Group`]). The flattened form, a list of [`TocEntry`]
//! with 1-based levels and page numbers, is what page remapping operates
//! on; [`Outline::from_toc`] rebuilds the tree.
//!
//! Individual items that cannot be read or written are dropped with a
//! warning; they never fail the surrounding operation.

use crate::error::PdfError;
use crate::page::{catalog_id, page_ids, resolve, resolve_dict};
use crate::page_map::PageIndexMap;
use crate::text::{encode_text_string, object_text};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Maximum nesting depth read from a document
const MAX_OUTLINE_DEPTH: usize = 64;

/// Maximum depth followed through the `/Names /Dests` tree
const MAX_NAME_TREE_DEPTH: usize = 32;

/// Title used for items that carry none
const UNTITLED: &str = "Untitled";

/// Target of an outline item
#[derive(Debug, Clone)]
pub struct Destination {
    /// 0-based page index
    pub page: usize,
    /// Trailing destination data after the page, e.g. `/XYZ 0 792 0`
    pub view: Vec<Object>,
}

#[derive(Debug, Clone)]
pub struct OutlineItem {
    pub title: String,
    pub target: Option<Destination>,
}

#[derive(Debug, Clone)]
pub enum OutlineNode {
    Leaf(OutlineItem),
    Group {
        item: OutlineItem,
        children: Vec<OutlineNode>,
    },
}

impl OutlineNode {
    pub fn item(&self) -> &OutlineItem {
        match self {
            OutlineNode::Leaf(item) => item,
            OutlineNode::Group { item, .. } => item,
        }
    }

    pub fn children(&self) -> &[OutlineNode] {
        match self {
            OutlineNode::Leaf(_) => &[],
            OutlineNode::Group { children, .. } => children,
        }
    }

    fn from_parts(item: OutlineItem, children: Vec<OutlineNode>) -> Self {
        if children.is_empty() {
            OutlineNode::Leaf(item)
        } else {
            OutlineNode::Group { item, children }
        }
    }
}

/// One row of the flattened outline
#[derive(Debug, Clone)]
pub struct TocEntry {
    /// Nesting level, 1 for top-level items
    pub level: usize,
    pub title: String,
    /// 1-based target page, `None` when the item has no destination
    pub page: Option<usize>,
    /// Trailing destination data, copied through unchanged
    pub view: Vec<Object>,
}

impl TocEntry {
    pub fn new(level: usize, title: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            title: title.into(),
            page: Some(page),
            view: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Outline {
    pub nodes: Vec<OutlineNode>,
}

impl Outline {
    pub fn new(nodes: Vec<OutlineNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of items at all levels
    pub fn len(&self) -> usize {
        fn count(nodes: &[OutlineNode]) -> usize {
            nodes.iter().map(|n| 1 + count(n.children())).sum()
        }
        count(&self.nodes)
    }

    /// Depth-first flattening with 1-based levels and page numbers
    pub fn to_toc(&self) -> Vec<TocEntry> {
        fn walk(nodes: &[OutlineNode], level: usize, out: &mut Vec<TocEntry>) {
            for node in nodes {
                let item = node.item();
                out.push(TocEntry {
                    level,
                    title: item.title.clone(),
                    page: item.target.as_ref().map(|t| t.page + 1),
                    view: item
                        .target
                        .as_ref()
                        .map(|t| t.view.clone())
                        .unwrap_or_default(),
                });
                walk(node.children(), level + 1, out);
            }
        }

        let mut entries = Vec::with_capacity(self.len());
        walk(&self.nodes, 1, &mut entries);
        entries
    }

    /// Rebuild a tree from flattened entries.
    ///
    /// A level may rise by at most one per entry; deeper jumps (for example
    /// after the parent entry was dropped) are clamped so the entry attaches
    /// to the closest open ancestor.
    pub fn from_toc(entries: &[TocEntry]) -> Self {
        let mut roots = Vec::new();
        let mut stack: Vec<(OutlineItem, Vec<OutlineNode>)> = Vec::new();

        fn close(stack: &mut Vec<(OutlineItem, Vec<OutlineNode>)>, roots: &mut Vec<OutlineNode>) {
            if let Some((item, children)) = stack.pop() {
                let node = OutlineNode::from_parts(item, children);
                match stack.last_mut() {
                    Some((_, siblings)) => siblings.push(node),
                    None => roots.push(node),
                }
            }
        }

        for entry in entries {
            let level = entry.level.clamp(1, stack.len() + 1);
            while stack.len() >= level {
                close(&mut stack, &mut roots);
            }
            let target = entry.page.and_then(|page| {
                page.checked_sub(1).map(|page| Destination {
                    page,
                    view: entry.view.clone(),
                })
            });
            stack.push((
                OutlineItem {
                    title: entry.title.clone(),
                    target,
                },
                Vec::new(),
            ));
        }
        while !stack.is_empty() {
            close(&mut stack, &mut roots);
        }

        Self { nodes: roots }
    }

    /// Rewrite every target through `map`, dropping unmapped items
    pub fn remap(&self, map: &PageIndexMap) -> Outline {
        Outline::from_toc(&remap_toc(&self.to_toc(), map))
    }
}

/// Rewrite target pages of flattened entries.
///
/// An entry pointing at page `p` (1-based) becomes `map[p - 1] + 1`;
/// level, title and view data are preserved. Entries whose page has no
/// mapping, or that have no page at all, are dropped.
pub fn remap_toc(entries: &[TocEntry], map: &PageIndexMap) -> Vec<TocEntry> {
    entries
        .iter()
        .filter_map(|entry| {
            let original = entry.page?.checked_sub(1)?;
            match map.get(original) {
                Some(new) => Some(TocEntry {
                    level: entry.level,
                    title: entry.title.clone(),
                    page: Some(new + 1),
                    view: entry.view.clone(),
                }),
                None => {
                    warn!(
                        "Dropping outline entry '{}': page {} has no mapping",
                        entry.title,
                        original + 1
                    );
                    None
                }
            }
        })
        .collect()
}

struct ReadContext<'a> {
    doc: &'a Document,
    page_index: HashMap<ObjectId, usize>,
    catalog: Option<&'a Dictionary>,
    visited: HashSet<ObjectId>,
}

/// Read the document outline.
///
/// A missing or unreadable `/Outlines` entry yields an empty outline.
pub fn read_outline(doc: &Document) -> Outline {
    let catalog = catalog_id(doc)
        .ok()
        .and_then(|id| doc.get_dictionary(id).ok());

    let first = catalog
        .and_then(|c| c.get(b"Outlines").ok())
        .and_then(|obj| resolve_dict(doc, obj))
        .and_then(|root| root.get(b"First").ok())
        .and_then(|obj| obj.as_reference().ok());

    let Some(first) = first else {
        return Outline::default();
    };

    let mut ctx = ReadContext {
        doc,
        page_index: page_ids(doc)
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect(),
        catalog,
        visited: HashSet::new(),
    };

    Outline::new(read_siblings(&mut ctx, first, 0))
}

fn read_siblings(ctx: &mut ReadContext<'_>, first: ObjectId, depth: usize) -> Vec<OutlineNode> {
    let doc = ctx.doc;
    let mut nodes = Vec::new();
    let mut next = Some(first);

    while let Some(id) = next {
        if !ctx.visited.insert(id) {
            warn!("Outline item {:?} visited twice, stopping traversal", id);
            break;
        }
        let dict = match doc.get_dictionary(id) {
            Ok(dict) => dict,
            Err(e) => {
                warn!("Outline item {:?} is not a dictionary: {}", id, e);
                break;
            }
        };

        let children = match dict.get(b"First").and_then(|obj| obj.as_reference()) {
            Ok(child) if depth + 1 < MAX_OUTLINE_DEPTH => read_siblings(ctx, child, depth + 1),
            Ok(_) => {
                warn!("Outline nested deeper than {} levels, truncating", MAX_OUTLINE_DEPTH);
                Vec::new()
            }
            Err(_) => Vec::new(),
        };

        let title = dict
            .get(b"Title")
            .ok()
            .and_then(|obj| object_text(resolve(doc, obj)))
            .unwrap_or_else(|| UNTITLED.to_string());
        let target = item_destination(ctx, dict);
        if target.is_none() {
            debug!("Outline item '{}' has no resolvable destination", title);
        }

        nodes.push(OutlineNode::from_parts(OutlineItem { title, target }, children));
        next = dict.get(b"Next").and_then(|obj| obj.as_reference()).ok();
    }

    nodes
}

fn item_destination(ctx: &ReadContext<'_>, item: &Dictionary) -> Option<Destination> {
    if let Ok(dest) = item.get(b"Dest") {
        return resolve_destination(ctx, dest, true);
    }

    let action = resolve_dict(ctx.doc, item.get(b"A").ok()?)?;
    match action.get(b"S") {
        Ok(Object::Name(kind)) if kind.as_slice() == b"GoTo" => {
            resolve_destination(ctx, action.get(b"D").ok()?, true)
        }
        _ => None,
    }
}

fn resolve_destination(
    ctx: &ReadContext<'_>,
    dest: &Object,
    follow_names: bool,
) -> Option<Destination> {
    match resolve(ctx.doc, dest) {
        Object::Array(array) => {
            let page = match array.first()? {
                Object::Reference(id) => *ctx.page_index.get(id)?,
                Object::Integer(n) => usize::try_from(*n).ok()?,
                _ => return None,
            };
            Some(Destination {
                page,
                view: array[1..].to_vec(),
            })
        }
        Object::Dictionary(dict) => resolve_destination(ctx, dict.get(b"D").ok()?, false),
        Object::String(name, _) | Object::Name(name) if follow_names => {
            let target = lookup_named_destination(ctx, name)?;
            resolve_destination(ctx, target, false)
        }
        _ => None,
    }
}

fn lookup_named_destination<'a>(ctx: &ReadContext<'a>, name: &[u8]) -> Option<&'a Object> {
    let catalog = ctx.catalog?;

    if let Some(dests) = catalog
        .get(b"Dests")
        .ok()
        .and_then(|obj| resolve_dict(ctx.doc, obj))
    {
        if let Ok(found) = dests.get(name) {
            return Some(found);
        }
    }

    let tree = catalog
        .get(b"Names")
        .ok()
        .and_then(|obj| resolve_dict(ctx.doc, obj))?
        .get(b"Dests")
        .ok()
        .and_then(|obj| resolve_dict(ctx.doc, obj))?;
    search_name_tree(ctx.doc, tree, name, 0)
}

fn search_name_tree<'a>(
    doc: &'a Document,
    node: &'a Dictionary,
    name: &[u8],
    depth: usize,
) -> Option<&'a Object> {
    if depth > MAX_NAME_TREE_DEPTH {
        return None;
    }

    if let Ok(Object::Array(pairs)) = node.get(b"Names").map(|obj| resolve(doc, obj)) {
        for pair in pairs.chunks_exact(2) {
            if let Object::String(key, _) = resolve(doc, &pair[0]) {
                if key.as_slice() == name {
                    return Some(&pair[1]);
                }
            }
        }
    }

    if let Ok(Object::Array(kids)) = node.get(b"Kids").map(|obj| resolve(doc, obj)) {
        for kid in kids {
            if let Some(kid) = resolve_dict(doc, kid) {
                if let Some(found) = search_name_tree(doc, kid, name, depth + 1) {
                    return Some(found);
                }
            }
        }
    }

    None
}

/// Write `outline` as the document's `/Outlines` tree.
///
/// `pages` lists the page object ids of the document in order; targets
/// index into it. Items whose target page is out of range are written
/// without a destination. An empty outline removes `/Outlines` from the
/// catalog. Returns the id of the outline root, if one was written.
pub fn write_outline(
    doc: &mut Document,
    outline: &Outline,
    pages: &[ObjectId],
) -> Result<Option<ObjectId>, PdfError> {
    let catalog_id = catalog_id(doc)?;

    if outline.is_empty() {
        if let Ok(catalog) = doc.get_dictionary_mut(catalog_id) {
            catalog.remove(b"Outlines");
        }
        return Ok(None);
    }

    let root_id = doc.new_object_id();
    let (first, last, count) = write_siblings(doc, &outline.nodes, root_id, pages);

    let mut root = Dictionary::new();
    root.set("Type", Object::Name(b"Outlines".to_vec()));
    root.set("First", Object::Reference(first));
    root.set("Last", Object::Reference(last));
    root.set("Count", Object::Integer(count as i64));
    doc.objects.insert(root_id, Object::Dictionary(root));

    let catalog = doc
        .get_dictionary_mut(catalog_id)
        .map_err(|_| PdfError::Malformed("Catalog not found".into()))?;
    catalog.set("Outlines", Object::Reference(root_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    Ok(Some(root_id))
}

/// Write one level of siblings; returns (first, last, visible descendants)
fn write_siblings(
    doc: &mut Document,
    nodes: &[OutlineNode],
    parent: ObjectId,
    pages: &[ObjectId],
) -> (ObjectId, ObjectId, usize) {
    let ids: Vec<ObjectId> = nodes.iter().map(|_| doc.new_object_id()).collect();
    let mut total = 0;

    for (i, node) in nodes.iter().enumerate() {
        let item = node.item();
        let mut dict = Dictionary::new();
        dict.set("Title", encode_text_string(&item.title));
        dict.set("Parent", Object::Reference(parent));
        if i > 0 {
            dict.set("Prev", Object::Reference(ids[i - 1]));
        }
        if i + 1 < ids.len() {
            dict.set("Next", Object::Reference(ids[i + 1]));
        }

        if let Some(target) = &item.target {
            match pages.get(target.page) {
                Some(&page_id) => {
                    let mut dest = vec![Object::Reference(page_id)];
                    if target.view.is_empty() {
                        dest.push(Object::Name(b"Fit".to_vec()));
                    } else {
                        dest.extend(target.view.iter().cloned());
                    }
                    dict.set("Dest", Object::Array(dest));
                }
                None => warn!(
                    "Outline item '{}' targets page {} of {}, writing it without a destination",
                    item.title,
                    target.page + 1,
                    pages.len()
                ),
            }
        }

        let children = node.children();
        if !children.is_empty() {
            let (first, last, count) = write_siblings(doc, children, ids[i], pages);
            dict.set("First", Object::Reference(first));
            dict.set("Last", Object::Reference(last));
            dict.set("Count", Object::Integer(count as i64));
            total += count;
        }

        doc.objects.insert(ids[i], Object::Dictionary(dict));
        total += 1;
    }

    (ids[0], ids[ids.len() - 1], total)
}
