//! Host page model: containers, form fields and their change events.
//!
//! A [`Container`] is the markup block the editor enhances. It carries
//! configuration attributes, the reference-mapping payload and the target
//! [`TextField`] whose value is submitted with the form.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::editor::EditorBuffer;

/// Attribute marking the field a container enhances.
pub const TARGET_MARKER: &str = "data-context-aware-editor-target";

/// Attribute naming the module that owns a container.
pub const MODULE_ATTRIBUTE: &str = "data-module";

/// Scroll position of an element, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffset {
    pub top: f64,
    pub left: f64,
}

impl ScrollOffset {
    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// Rendered size of an element, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Notification delivered to a field's subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    /// The value changed as if typed into the field.
    Input { value: String },
}

/// A multi-line form field.
#[derive(Debug)]
pub struct TextField {
    pub id: Option<String>,
    pub name: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub hidden: bool,
    pub aria_hidden: bool,
    pub scroll: ScrollOffset,
    pub size: Size,
    pub buffer: EditorBuffer,
    listeners: Vec<Sender<FieldEvent>>,
}

impl TextField {
    pub fn new(value: &str) -> Self {
        Self {
            id: None,
            name: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            hidden: false,
            aria_hidden: false,
            scroll: ScrollOffset::default(),
            size: Size::default(),
            buffer: EditorBuffer::from_text(value),
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Mark this field as the one its container should enhance.
    #[must_use]
    pub fn as_target(self) -> Self {
        self.with_attribute(TARGET_MARKER, "")
    }

    #[must_use]
    pub fn with_buffer(mut self, buffer: EditorBuffer) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn value(&self) -> String {
        self.buffer.text()
    }

    /// Assign the value directly. Subscribers are not notified.
    pub fn set_value(&mut self, value: &str) {
        self.buffer.set_text(value);
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Receive this field's change notifications.
    pub fn subscribe(&mut self) -> Receiver<FieldEvent> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    /// Notify subscribers that the value changed. Subscribers whose receiver
    /// is gone are dropped.
    pub fn dispatch_input(&mut self) {
        let event = FieldEvent::Input {
            value: self.value(),
        };
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Copy of this field for display: same attributes, value and
    /// dimensions, a fresh undo history and no subscribers.
    pub fn clone_for_display(&self) -> Self {
        let mut buffer = EditorBuffer::from_text(&self.value())
            .with_delete_command(self.buffer.supports_delete_command());
        buffer.set_selection(self.buffer.selection());
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            classes: self.classes.clone(),
            attributes: self.attributes.clone(),
            hidden: self.hidden,
            aria_hidden: self.aria_hidden,
            scroll: self.scroll,
            size: self.size,
            buffer,
            listeners: Vec::new(),
        }
    }
}

/// A field shared between its container and the editor enhancing it.
pub type SharedField = Rc<RefCell<TextField>>;

/// A block of host markup that may hold an enhanceable field.
///
/// The container keeps its field for its whole life. An editor enhancing it
/// holds a second handle to the same field, so the submitted value stays
/// readable here while the editor runs and after it is gone.
#[derive(Debug, Default)]
pub struct Container {
    pub attributes: BTreeMap<String, String>,
    /// Text of the container's reference-mapping payload element, if any.
    pub context: Option<String>,
    field: Option<SharedField>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, payload: impl Into<String>) -> Self {
        self.context = Some(payload.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: TextField) -> Self {
        self.field = Some(Rc::new(RefCell::new(field)));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Whether an editor currently holds this container's field.
    pub fn is_enhanced(&self) -> bool {
        self.field
            .as_ref()
            .is_some_and(|field| Rc::strong_count(field) > 1)
    }

    /// The field, if it is marked as the enhancement target.
    pub fn target(&self) -> Option<Ref<'_, TextField>> {
        let field = self.field()?;
        field.has_attribute(TARGET_MARKER).then_some(field)
    }

    pub fn target_mut(&mut self) -> Option<RefMut<'_, TextField>> {
        let field = self.field.as_ref()?.borrow_mut();
        field.has_attribute(TARGET_MARKER).then_some(field)
    }

    /// Any field held, target or not.
    pub fn field(&self) -> Option<Ref<'_, TextField>> {
        self.field.as_ref().map(|field| field.borrow())
    }

    /// A second handle to the target field for an editor to own.
    pub(crate) fn share_target(&self) -> Option<SharedField> {
        self.target()?;
        self.field.clone()
    }
}
