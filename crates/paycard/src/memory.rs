//! Headless document
//!
//! [`MemoryDocument`] renders HTML by scanning it for form controls instead
//! of building a real DOM. It is what the test-suite drives, and it is usable
//! by any host that wants to run the engine without a browser.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{
    Document, FieldAccessor, FieldEvent, FieldHandle, FieldKind, FocusedElement, Listener,
    ListenerId,
};
use crate::error::{Result, WidgetError};

static TAG_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(r#"<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
});

static ATTR_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+)))?"#)
});

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|err| tracing::error!(pattern, error = %err, "invalid markup pattern"))
        .ok()
}

struct FieldState {
    value: String,
    checked: bool,
    attributes: BTreeMap<String, String>,
    listeners: Vec<(ListenerId, FieldEvent, Listener)>,
    connected: bool,
}

/// An in-memory form control
pub struct MemoryField {
    name: String,
    kind: FieldKind,
    state: RefCell<FieldState>,
    next_listener: Cell<u64>,
}

impl MemoryField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Rc<Self> {
        Self::with_attributes(name, kind, BTreeMap::new())
    }

    pub fn with_attributes(
        name: impl Into<String>,
        kind: FieldKind,
        attributes: BTreeMap<String, String>,
    ) -> Rc<Self> {
        let value = attributes.get("value").cloned().unwrap_or_default();
        let checked = attributes.contains_key("checked");
        Rc::new(Self {
            name: name.into(),
            kind,
            state: RefCell::new(FieldState {
                value,
                checked,
                attributes,
                listeners: Vec::new(),
                connected: true,
            }),
            next_listener: Cell::new(1),
        })
    }

    /// Fire every listener registered for `event`
    pub fn dispatch(&self, event: FieldEvent) {
        // Listeners may write back into this field, so call them unborrowed
        let listeners: Vec<Listener> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Replace the raw value as a keystroke would, then fire `input`
    pub fn type_text(&self, text: &str) {
        self.set_value(text);
        self.dispatch(FieldEvent::Input);
    }

    pub fn blur(&self) {
        self.dispatch(FieldEvent::Blur);
    }

    pub fn click(&self) {
        self.dispatch(FieldEvent::Click);
    }

    /// Tick or untick a checkbox; fires `input` then `change`
    pub fn toggle(&self, checked: bool) {
        self.set_checked(checked);
        self.dispatch(FieldEvent::Input);
        self.dispatch(FieldEvent::Change);
    }

    /// Pick a select option; fires `change`
    pub fn select(&self, value: &str) {
        self.set_value(value);
        self.dispatch(FieldEvent::Change);
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Detach from the page. Listeners stay registered, as with a removed
    /// DOM node.
    pub fn disconnect(&self) {
        self.state.borrow_mut().connected = false;
    }
}

impl FieldAccessor for MemoryField {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn value(&self) -> String {
        self.state.borrow().value.clone()
    }

    fn set_value(&self, value: &str) {
        self.state.borrow_mut().value = value.to_string();
    }

    fn checked(&self) -> bool {
        self.state.borrow().checked
    }

    fn set_checked(&self, checked: bool) {
        self.state.borrow_mut().checked = checked;
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.state.borrow().attributes.get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&self, name: &str) {
        self.state.borrow_mut().attributes.remove(name);
    }

    fn add_listener(&self, event: FieldEvent, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.state.borrow_mut().listeners.push((id, event, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(lid, _, _)| *lid != id);
        state.listeners.len() != before
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }
}

/// Where a field sits relative to `data-form-type` containers
#[derive(Debug, Clone, Default)]
struct Placement {
    form_type: Option<String>,
    sibling_provider: Option<String>,
}

#[derive(Default)]
struct Container {
    form_type: Option<String>,
    closed: bool,
    sibling_provider: Option<String>,
}

#[derive(Default)]
struct Scan {
    fields: Vec<Rc<MemoryField>>,
    buttons: Vec<Rc<MemoryField>>,
    placements: HashMap<String, Placement>,
}

/// Scan markup for inputs, selects and buttons
fn scan(html: &str) -> Scan {
    let (Some(tag_re), Some(attr_re)) = (TAG_REGEX.as_ref(), ATTR_REGEX.as_ref()) else {
        return Scan::default();
    };

    let mut scan = Scan::default();
    let mut containers: Vec<Container> = Vec::new();
    let mut open_divs: Vec<usize> = Vec::new();
    let mut field_containers: Vec<(String, Option<usize>)> = Vec::new();
    let mut current_select: Option<Rc<MemoryField>> = None;

    for caps in tag_re.captures_iter(html) {
        let closing = !caps[1].is_empty();
        let tag = caps[2].to_ascii_lowercase();
        let attrs: BTreeMap<String, String> = attr_re
            .captures_iter(&caps[3])
            .map(|a| {
                let value = a
                    .get(2)
                    .or_else(|| a.get(3))
                    .or_else(|| a.get(4))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (a[1].to_string(), value)
            })
            .collect();

        match (tag.as_str(), closing) {
            ("div", false) => {
                containers.push(Container {
                    form_type: attrs.get("data-form-type").cloned(),
                    ..Container::default()
                });
                open_divs.push(containers.len() - 1);
            }
            ("div", true) => {
                if let Some(idx) = open_divs.pop() {
                    containers[idx].closed = true;
                }
            }
            ("select", true) => current_select = None,
            ("option", false) => {
                if let Some(select) = &current_select {
                    let value = attrs.get("value").cloned().unwrap_or_default();
                    if attrs.contains_key("selected") || select.value().is_empty() {
                        select.set_value(&value);
                    }
                }
            }
            ("input" | "select" | "button", false) => {
                let kind = FieldKind::from_tag(&tag, attrs.get("type").map(String::as_str));
                let name = attrs.get("name").cloned().unwrap_or_default();
                let provider = attrs.get("data-provider").cloned();
                let field = MemoryField::with_attributes(name.clone(), kind, attrs);

                if kind == FieldKind::Button {
                    if let Some(provider) = provider {
                        for container in containers.iter_mut() {
                            if container.closed
                                && container.form_type.is_some()
                                && container.sibling_provider.is_none()
                            {
                                container.sibling_provider = Some(provider.clone());
                            }
                        }
                        scan.buttons.push(field);
                    }
                    continue;
                }

                let container = open_divs
                    .iter()
                    .rev()
                    .copied()
                    .find(|idx| containers[*idx].form_type.is_some());
                field_containers.push((name, container));
                if kind == FieldKind::Select {
                    current_select = Some(field.clone());
                }
                scan.fields.push(field);
            }
            _ => {}
        }
    }

    for (name, container) in field_containers {
        let placement = container
            .map(|idx| Placement {
                form_type: containers[idx].form_type.clone(),
                sibling_provider: containers[idx].sibling_provider.clone(),
            })
            .unwrap_or_default();
        scan.placements.insert(name, placement);
    }

    scan
}

#[derive(Default)]
struct DocumentState {
    containers: HashMap<String, String>,
    fields: Vec<Rc<MemoryField>>,
    buttons: Vec<Rc<MemoryField>>,
    placements: HashMap<String, Placement>,
    focused: FocusedElement,
    loading: bool,
    slots: HashMap<String, String>,
    navigations: Vec<String>,
}

/// A page with named containers, held entirely in memory
#[derive(Default)]
pub struct MemoryDocument {
    state: RefCell<DocumentState>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty container the widget can mount into
    pub fn with_container(self, id: &str) -> Self {
        self.state
            .borrow_mut()
            .containers
            .insert(id.to_string(), String::new());
        self
    }

    /// Current markup of a container
    pub fn html(&self, container_id: &str) -> Option<String> {
        self.state.borrow().containers.get(container_id).cloned()
    }

    pub fn field(&self, name: &str) -> Option<Rc<MemoryField>> {
        self.state
            .borrow()
            .fields
            .iter()
            .find(|f| f.name == name)
            .cloned()
    }

    /// First rendered button for `provider`
    pub fn button(&self, provider: &str) -> Option<Rc<MemoryField>> {
        self.state
            .borrow()
            .buttons
            .iter()
            .find(|b| b.attribute("data-provider").as_deref() == Some(provider))
            .cloned()
    }

    /// Focus a rendered input, as a user clicking into it would
    pub fn focus_field(&self, name: &str) {
        let mut state = self.state.borrow_mut();
        let Some(field) = state.fields.iter().find(|f| f.name == name).cloned() else {
            state.focused = FocusedElement::Other;
            return;
        };
        let placement = state.placements.get(name).cloned().unwrap_or_default();
        state.focused = FocusedElement::Input {
            name: name.to_string(),
            input_type: field.attribute("type").unwrap_or_else(|| "text".to_string()),
            form_type: placement.form_type,
            sibling_provider: placement.sibling_provider,
        };
    }

    /// Focus the button for `provider`
    pub fn focus_button(&self, provider: &str) {
        self.state.borrow_mut().focused = FocusedElement::Button {
            provider: Some(provider.to_string()),
        };
    }

    pub fn clear_focus(&self) {
        self.state.borrow_mut().focused = FocusedElement::Other;
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn slot_text(&self, slot: &str) -> Option<String> {
        self.state.borrow().slots.get(slot).cloned()
    }

    /// URLs passed to `navigate`, oldest first
    pub fn navigations(&self) -> Vec<String> {
        self.state.borrow().navigations.clone()
    }

    fn detach_all(state: &mut DocumentState) {
        for field in state.fields.drain(..).chain(state.buttons.drain(..)) {
            field.disconnect();
        }
        state.placements.clear();
        state.slots.clear();
        state.focused = FocusedElement::Other;
    }
}

impl Document for MemoryDocument {
    fn render(&self, container_id: &str, html: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.containers.contains_key(container_id) {
            return Err(WidgetError::Document(format!(
                "container `{}` not found",
                container_id
            )));
        }
        Self::detach_all(&mut state);

        let scan = scan(html);
        state.fields = scan.fields;
        state.buttons = scan.buttons;
        state.placements = scan.placements;
        state
            .containers
            .insert(container_id.to_string(), html.to_string());
        Ok(())
    }

    fn clear(&self, container_id: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(html) = state.containers.get_mut(container_id) {
            html.clear();
            Self::detach_all(&mut state);
        }
    }

    fn fields(&self) -> Vec<FieldHandle> {
        self.state
            .borrow()
            .fields
            .iter()
            .map(|f| f.clone() as FieldHandle)
            .collect()
    }

    fn provider_buttons(&self) -> Vec<FieldHandle> {
        self.state
            .borrow()
            .buttons
            .iter()
            .map(|b| b.clone() as FieldHandle)
            .collect()
    }

    fn focused(&self) -> FocusedElement {
        self.state.borrow().focused.clone()
    }

    fn set_loading(&self, loading: bool) {
        self.state.borrow_mut().loading = loading;
    }

    fn set_slot_text(&self, slot: &str, text: &str) {
        self.state
            .borrow_mut()
            .slots
            .insert(slot.to_string(), text.to_string());
    }

    fn navigate(&self, url: &str) {
        self.state.borrow_mut().navigations.push(url.to_string());
    }
}
