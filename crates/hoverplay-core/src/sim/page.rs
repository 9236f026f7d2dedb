use std::collections::{BTreeMap, HashMap, HashSet};

use hoverplay_protocols::{
    ListenerKind, MouseButton, NodeId, Page, PageError, PointerEvent, Rect, ScrollRequest,
    Viewport,
};
use parking_lot::Mutex;
use url::Url;

use super::document::{DocumentSpec, ElementSpec};

const BODY: NodeId = NodeId(1);

/// Playback state of a simulated media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaState {
    pub paused: bool,
    pub current_time: f64,
    pub volume: f64,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            paused: true,
            current_time: 0.0,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct InlineStyle {
    name: String,
    value: String,
    important: bool,
}

#[derive(Debug, Default)]
struct SimNode {
    /// `None` for shadow roots.
    tag: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    styles: Vec<InlineStyle>,
    text: String,
    rect: Rect,
    shadow: Option<NodeId>,
    media: MediaState,
}

impl SimNode {
    fn element(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Default::default()
        }
    }

    fn sync_style_attribute(&mut self) {
        if self.styles.is_empty() {
            if let Some(style) = self.attributes.get_mut("style") {
                style.clear();
            }
            return;
        }
        let rendered = self
            .styles
            .iter()
            .map(|s| {
                if s.important {
                    format!("{}: {} !important;", s.name, s.value)
                } else {
                    format!("{}: {};", s.name, s.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        self.attributes.insert("style".to_string(), rendered);
    }

    fn parse_style_attribute(&mut self, value: &str) {
        self.styles = value
            .split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let value = value.trim();
                let (value, important) = match value.strip_suffix("!important") {
                    Some(v) => (v.trim(), true),
                    None => (value, false),
                };
                Some(InlineStyle {
                    name: name.trim().to_string(),
                    value: value.to_string(),
                    important,
                })
            })
            .collect();
    }
}

struct Document {
    nodes: HashMap<NodeId, SimNode>,
    next_id: u64,
    location: String,
    top_frame: bool,
    focus: bool,
    viewport: Viewport,
    /// Composed path of the hovered element, outermost first.
    hovered: Vec<NodeId>,
    listeners: HashSet<ListenerKind>,
    observing: bool,
    scroll_requests: Vec<ScrollRequest>,
    selection_clears: usize,
}

impl Document {
    fn new(location: &str) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(BODY, SimNode::element("body"));
        Self {
            nodes,
            next_id: BODY.0 + 1,
            location: location.to_string(),
            top_frame: true,
            focus: true,
            viewport: Viewport::default(),
            hovered: Vec::new(),
            listeners: HashSet::new(),
            observing: false,
            scroll_requests: Vec::new(),
            selection_clears: 0,
        }
    }

    fn allocate(&mut self, node: SimNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(&child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != child);
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn path(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.nodes.contains_key(&node).then_some(node);
        while let Some(id) = current {
            path.push(id);
            current = self.parent(id);
        }
        path
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.path(node).last() == Some(&BODY)
    }

    fn is_shadow_root(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.tag.is_none())
    }

    /// The outermost shadow host containing `node`, or `node` itself.
    fn retarget(&self, node: NodeId) -> NodeId {
        let path = self.path(node);
        path.iter()
            .rposition(|n| self.is_shadow_root(*n))
            .and_then(|i| path.get(i + 1).copied())
            .unwrap_or(node)
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).and_then(|n| n.tag.as_deref())
    }

    /// Light-DOM elements under the body in document order.
    fn light_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![BODY];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn resolve_href(&self, raw: &str) -> Option<String> {
        let resolved = match Url::parse(&self.location) {
            Ok(base) => base.join(raw),
            Err(_) => Url::parse(raw),
        };
        resolved.ok().map(String::from)
    }

    fn href(&self, node: NodeId) -> Option<String> {
        let raw = self.nodes.get(&node)?.attributes.get("href")?;
        self.resolve_href(raw)
    }

    fn build(&mut self, parent: NodeId, spec: &ElementSpec) {
        let mut node = SimNode::element(&spec.tag);
        node.rect = spec.rect;
        for (name, value) in &spec.attributes {
            if name == "style" {
                node.parse_style_attribute(value);
            }
            node.attributes.insert(name.clone(), value.clone());
        }
        let id = match spec.id {
            Some(raw) => {
                self.nodes.insert(NodeId(raw), node);
                NodeId(raw)
            }
            None => self.allocate(node),
        };
        self.append(parent, id);
        for child in &spec.children {
            self.build(id, child);
        }
    }
}

/// An in-memory [`Page`].
pub struct SimPage {
    doc: Mutex<Document>,
}

impl SimPage {
    /// An empty document at `location`, top frame, focused.
    pub fn new(location: &str) -> Self {
        Self {
            doc: Mutex::new(Document::new(location)),
        }
    }

    pub fn from_spec(spec: &DocumentSpec) -> Result<Self, PageError> {
        let mut ids = HashSet::new();
        let mut stack: Vec<&ElementSpec> = spec.body.iter().collect();
        while let Some(element) = stack.pop() {
            if let Some(id) = element.id {
                if id <= BODY.0 {
                    return Err(PageError::InvalidDocument(format!(
                        "element id {} is reserved",
                        id
                    )));
                }
                if !ids.insert(id) {
                    return Err(PageError::InvalidDocument(format!(
                        "duplicate element id {}",
                        id
                    )));
                }
            }
            stack.extend(element.children.iter());
        }

        let mut doc = Document::new(&spec.location);
        doc.next_id = ids.iter().max().map_or(BODY.0 + 1, |max| max + 1);
        doc.top_frame = spec.top_frame;
        doc.focus = spec.focus;
        doc.viewport = spec.viewport;
        for element in &spec.body {
            doc.build(BODY, element);
        }
        Ok(Self {
            doc: Mutex::new(doc),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, PageError> {
        let spec: DocumentSpec =
            serde_json::from_str(json).map_err(|e| PageError::InvalidDocument(e.to_string()))?;
        Self::from_spec(&spec)
    }

    /// Create an element and append it to `parent`.
    pub fn add_element(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut doc = self.doc.lock();
        let mut node = SimNode::element(tag);
        for (name, value) in attributes {
            if *name == "style" {
                node.parse_style_attribute(value);
            }
            node.attributes.insert(name.to_string(), value.to_string());
        }
        let id = doc.allocate(node);
        doc.append(parent, id);
        id
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            n.rect = rect;
        }
    }

    pub fn set_location(&self, location: &str) {
        self.doc.lock().location = location.to_string();
    }

    pub fn set_focus(&self, focus: bool) {
        self.doc.lock().focus = focus;
    }

    pub fn set_top_frame(&self, top_frame: bool) {
        self.doc.lock().top_frame = top_frame;
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.doc.lock().viewport = viewport;
    }

    /// Move the pointer over `target`: it and all its ancestors match `:hover`.
    pub fn hover(&self, target: NodeId) {
        let mut doc = self.doc.lock();
        let mut path = doc.path(target);
        path.reverse();
        doc.hovered = path;
    }

    pub fn unhover(&self) {
        self.doc.lock().hovered.clear();
    }

    /// A pointer event over `target` at a client position, with the
    /// composed path and the target retargeted out of closed shadow roots.
    pub fn pointer_event(&self, target: NodeId, client_x: f64, client_y: f64) -> PointerEvent {
        let doc = self.doc.lock();
        PointerEvent {
            target: doc.retarget(target),
            path: doc.path(target),
            page_x: client_x + doc.viewport.scroll_x,
            page_y: client_y + doc.viewport.scroll_y,
            client_x,
            client_y,
            button: MouseButton::Primary,
            shift_key: false,
        }
    }

    /// Composed ancestors of `node`, innermost first, `node` included.
    pub fn path_of(&self, node: NodeId) -> Vec<NodeId> {
        self.doc.lock().path(node)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.doc
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn shadow_root_of(&self, host: NodeId) -> Option<NodeId> {
        self.doc.lock().nodes.get(&host).and_then(|n| n.shadow)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.doc
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn media_state(&self, node: NodeId) -> MediaState {
        self.doc
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.media)
            .unwrap_or_default()
    }

    pub fn listener_enabled(&self, kind: ListenerKind) -> bool {
        self.doc.lock().listeners.contains(&kind)
    }

    pub fn is_observing(&self) -> bool {
        self.doc.lock().observing
    }

    pub fn scroll_requests(&self) -> Vec<ScrollRequest> {
        self.doc.lock().scroll_requests.clone()
    }

    pub fn selection_clears(&self) -> usize {
        self.doc.lock().selection_clears
    }

    /// Connected elements with the given tag, shadow trees included, in id order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let doc = self.doc.lock();
        let mut found: Vec<NodeId> = doc
            .nodes
            .iter()
            .filter(|(id, n)| n.tag.as_deref() == Some(tag) && doc.is_connected(**id))
            .map(|(id, _)| *id)
            .collect();
        found.sort();
        found
    }
}

impl Page for SimPage {
    fn location(&self) -> String {
        self.doc.lock().location.clone()
    }

    fn hostname(&self) -> String {
        Url::parse(&self.doc.lock().location)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    fn is_top_frame(&self) -> bool {
        self.doc.lock().top_frame
    }

    fn has_focus(&self) -> bool {
        self.doc.lock().focus
    }

    fn viewport(&self) -> Viewport {
        self.doc.lock().viewport
    }

    fn scroll_to(&self, request: ScrollRequest) {
        let mut doc = self.doc.lock();
        doc.viewport.scroll_x = request.left;
        doc.viewport.scroll_y = request.top;
        doc.scroll_requests.push(request);
    }

    fn local_name(&self, node: NodeId) -> Option<String> {
        self.doc.lock().tag(node).map(str::to_string)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.doc
            .lock()
            .nodes
            .get(&node)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn href(&self, node: NodeId) -> Option<String> {
        self.doc.lock().href(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.lock().parent(node)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.doc.lock().is_connected(node)
    }

    fn is_hovered(&self, node: NodeId) -> bool {
        self.doc.lock().hovered.contains(&node)
    }

    fn hovered_chain(&self) -> Vec<NodeId> {
        let doc = self.doc.lock();
        let mut chain = Vec::new();
        for id in &doc.hovered {
            if doc.is_shadow_root(*id) {
                break;
            }
            chain.push(*id);
        }
        chain
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.doc
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.rect)
            .unwrap_or_default()
    }

    fn find_link(&self, href_fragments: &[&str]) -> Option<NodeId> {
        let doc = self.doc.lock();
        doc.light_elements().into_iter().find(|id| {
            doc.tag(*id) == Some("a")
                && doc.nodes.get(id).and_then(|n| n.attributes.get("href")).is_some_and(
                    |href| href_fragments.iter().any(|fragment| href.contains(fragment)),
                )
        })
    }

    fn anchors_with_href(&self, href: &str) -> Vec<NodeId> {
        let doc = self.doc.lock();
        doc.light_elements()
            .into_iter()
            .filter(|id| doc.tag(*id) == Some("a") && doc.href(*id).as_deref() == Some(href))
            .collect()
    }

    fn body(&self) -> NodeId {
        BODY
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.doc.lock().allocate(SimNode::element(tag))
    }

    fn attach_shadow(&self, host: NodeId) -> NodeId {
        let mut doc = self.doc.lock();
        let root = doc.allocate(SimNode {
            parent: Some(host),
            ..Default::default()
        });
        if let Some(h) = doc.nodes.get_mut(&host) {
            h.shadow = Some(root);
        }
        root
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        self.doc.lock().append(parent, child);
    }

    fn replace_node(&self, old: NodeId, new: NodeId) {
        let mut doc = self.doc.lock();
        let Some(parent) = doc.parent(old) else {
            return;
        };
        doc.detach(new);
        if let Some(p) = doc.nodes.get_mut(&parent) {
            if let Some(slot) = p.children.iter_mut().find(|c| **c == old) {
                *slot = new;
            }
        }
        if let Some(n) = doc.nodes.get_mut(&new) {
            n.parent = Some(parent);
        }
        if let Some(o) = doc.nodes.get_mut(&old) {
            o.parent = None;
        }
    }

    fn remove_node(&self, node: NodeId) {
        self.doc.lock().detach(node);
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            if name == "style" {
                n.parse_style_attribute(value);
            }
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            if name == "style" {
                n.styles.clear();
            }
            n.attributes.remove(name);
        }
    }

    fn set_text_content(&self, node: NodeId, text: &str) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            n.text = text.to_string();
        }
    }

    fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        self.doc.lock().nodes.get(&node).and_then(|n| {
            n.styles
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.value.clone())
        })
    }

    fn set_style_property(&self, node: NodeId, name: &str, value: &str, important: bool) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            match n.styles.iter_mut().find(|s| s.name == name) {
                Some(style) => {
                    style.value = value.to_string();
                    style.important = important;
                }
                None => n.styles.push(InlineStyle {
                    name: name.to_string(),
                    value: value.to_string(),
                    important,
                }),
            }
            n.sync_style_attribute();
        }
    }

    fn remove_style_property(&self, node: NodeId, name: &str) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            n.styles.retain(|s| s.name != name);
            n.sync_style_attribute();
        }
    }

    fn style_len(&self, node: NodeId) -> usize {
        self.doc
            .lock()
            .nodes
            .get(&node)
            .map_or(0, |n| n.styles.len())
    }

    fn media_play(&self, node: NodeId) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            n.media.paused = false;
        }
    }

    fn media_pause(&self, node: NodeId) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            n.media.paused = true;
        }
    }

    fn media_paused(&self, node: NodeId) -> bool {
        self.doc
            .lock()
            .nodes
            .get(&node)
            .is_none_or(|n| n.media.paused)
    }

    fn media_set_current_time(&self, node: NodeId, seconds: f64) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            n.media.current_time = seconds;
        }
    }

    fn media_set_volume(&self, node: NodeId, volume: f64) {
        if let Some(n) = self.doc.lock().nodes.get_mut(&node) {
            n.media.volume = volume;
        }
    }

    fn clear_selection(&self) {
        self.doc.lock().selection_clears += 1;
    }

    fn set_listener(&self, kind: ListenerKind, enabled: bool) {
        let mut doc = self.doc.lock();
        if enabled {
            doc.listeners.insert(kind);
        } else {
            doc.listeners.remove(&kind);
        }
    }

    fn observe_mutations(&self, enabled: bool) {
        self.doc.lock().observing = enabled;
    }
}
