//! Dual-buffer synchronization for one enhanced container.
//!
//! The container's field stays in the form as the hidden raw buffer holding
//! `((id))` tokens; the container and the editor share it. A display copy
//! becomes the visible buffer the user edits with labels in place of ids.
//! Every input on the visible buffer is mapped back onto the raw one, and the
//! highlight overlay is redrawn.

use std::cell::{Ref, RefMut};

use crate::config::ContainerConfig;
use crate::editor::navigation::{self, Outcome};
use crate::editor::{DeleteStrategy, KeyInput};
use crate::error::{EditorError, Result};
use crate::highlight::Overlay;
use crate::host::{
    Container, MODULE_ATTRIBUTE, ScrollOffset, SharedField, Size, TARGET_MARKER, TextField,
};
use crate::reference::MappingSet;
use crate::transform::{to_human_readable, to_raw_references};

/// Class always present on the wrapper around the visible field.
pub const WRAPPER_CLASS: &str = "app-context-aware-editor--wrapper";

/// Class added to the visible field.
pub const VISIBLE_FIELD_CLASS: &str = "app-context-aware-editor__visible-textarea";

/// `data-module` value of containers picked up by [`ContextEditor::initialize_page`].
pub const MODULE_NAME: &str = "context-aware-editor";

/// Input delivered to an enhanced editor by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Key(KeyInput),
    /// The pointer put the caret at `offset`.
    Click { offset: usize },
    DoubleClick { offset: usize },
    /// Text typed or pasted over the current selection.
    Input(String),
    Scroll(ScrollOffset),
    Resize(Size),
    Undo,
    Redo,
}

/// Element grouping the toolbar slot and the editing area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    pub classes: Vec<String>,
    pub toolbar_visible: bool,
}

impl Wrapper {
    fn new(config: &ContainerConfig) -> Self {
        let mut classes = vec![WRAPPER_CLASS.to_string()];
        classes.extend(config.wrapper_classes.iter().cloned());
        Self {
            classes,
            toolbar_visible: config.toolbar_enabled,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// The container's field while an editor holds it: hidden, with its id
/// handed to the visible field. Dropping it puts the field back as it was.
#[derive(Debug)]
struct RawField {
    field: SharedField,
    id: Option<String>,
    module: Option<String>,
}

impl RawField {
    fn attach(field: SharedField) -> Self {
        let (id, module) = {
            let mut raw = field.borrow_mut();
            raw.hidden = true;
            raw.aria_hidden = true;
            (raw.id.take(), raw.attributes.remove(MODULE_ATTRIBUTE))
        };
        Self { field, id, module }
    }
}

impl Drop for RawField {
    fn drop(&mut self) {
        let Ok(mut raw) = self.field.try_borrow_mut() else {
            tracing::warn!("Raw field still borrowed at release; left hidden");
            return;
        };
        raw.hidden = false;
        raw.aria_hidden = false;
        raw.id = self.id.take();
        if let Some(module) = self.module.take() {
            raw.attributes.insert(MODULE_ATTRIBUTE.to_string(), module);
        }
    }
}

/// A field enhanced with reference highlighting and atomic tokens.
///
/// Dropping the editor releases the raw field back to its container with
/// its latest value; [`Self::teardown`] does the same explicitly.
#[derive(Debug)]
pub struct ContextEditor {
    raw: RawField,
    visible: TextField,
    wrapper: Wrapper,
    overlay: Overlay,
    mappings: MappingSet,
    strategy: DeleteStrategy,
    pending_caret: Option<usize>,
    config: ContainerConfig,
}

impl ContextEditor {
    /// Enhance `container`'s target field.
    ///
    /// Returns `None` and leaves the container as it was when it is already
    /// enhanced or holds no marked field.
    pub fn initialize(container: &mut Container) -> Option<Self> {
        match Self::try_initialize(container) {
            Ok(editor) => Some(editor),
            Err(EditorError::AlreadyInitialized) => {
                tracing::debug!("Skipping container that is already enhanced");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "Context-aware editor not initialized");
                None
            }
        }
    }

    /// Enhance every container that can be enhanced.
    pub fn initialize_all(containers: &mut [Container]) -> Vec<Self> {
        containers.iter_mut().filter_map(Self::initialize).collect()
    }

    /// Enhance the containers whose `data-module` names this editor.
    pub fn initialize_page(containers: &mut [Container]) -> Vec<Self> {
        containers
            .iter_mut()
            .filter(|c| c.attribute(MODULE_ATTRIBUTE) == Some(MODULE_NAME))
            .filter_map(Self::initialize)
            .collect()
    }

    fn try_initialize(container: &mut Container) -> Result<Self> {
        if container.is_enhanced() {
            return Err(EditorError::AlreadyInitialized);
        }
        let _scope = crate::perf::scope("sync.initialize");
        let config = ContainerConfig::from_container(container);
        let mappings = MappingSet::parse(container.context.as_deref().unwrap_or_default());
        let shared = container.share_target().ok_or(EditorError::MissingTarget {
            marker: TARGET_MARKER,
        })?;

        let mut visible = shared.borrow().clone_for_display();
        visible.attributes.remove(TARGET_MARKER);
        visible.name = None;
        visible.classes.push(VISIBLE_FIELD_CLASS.to_string());

        let raw = RawField::attach(shared);
        let raw_value = raw.field.borrow().value();
        visible.set_value(&to_human_readable(&raw_value, &mappings.forward));

        let mut overlay = Overlay::new();
        overlay.update(&visible.value(), visible.scroll, &mappings.forward);
        overlay.sync_size(visible.size);

        let strategy = DeleteStrategy::detect(&visible.buffer);
        crate::perf::log_event(
            "sync.initialize",
            format!("references={} strategy={strategy:?}", mappings.forward.len()),
        );

        Ok(Self {
            raw,
            visible,
            wrapper: Wrapper::new(&config),
            overlay,
            mappings,
            strategy,
            pending_caret: None,
            config,
        })
    }

    pub fn raw(&self) -> Ref<'_, TextField> {
        self.raw.field.borrow()
    }

    /// The raw field, e.g. to subscribe to its change notifications.
    pub fn raw_mut(&mut self) -> RefMut<'_, TextField> {
        self.raw.field.borrow_mut()
    }

    pub const fn visible(&self) -> &TextField {
        &self.visible
    }

    /// The visible field, for collaborators that edit it directly. Call
    /// [`Self::sync_now`] after changing it.
    pub const fn visible_mut(&mut self) -> &mut TextField {
        &mut self.visible
    }

    pub const fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub const fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }

    pub const fn mappings(&self) -> &MappingSet {
        &self.mappings
    }

    /// Container settings, including those a host toolbar reads
    /// (`allow_headings`, `i18n`).
    pub const fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub const fn delete_strategy(&self) -> DeleteStrategy {
        self.strategy
    }

    /// Whether a click correction is waiting for [`Self::run_deferred`].
    pub const fn has_deferred(&self) -> bool {
        self.pending_caret.is_some()
    }

    /// Route one host event through the controller and the surface.
    ///
    /// Returns [`Outcome::Handled`] when the editor replaced the surface's
    /// default behavior.
    pub fn handle(&mut self, event: EditorEvent) -> Outcome {
        let outcome = match event {
            EditorEvent::Key(input) => {
                let outcome = navigation::handle_key(
                    &mut self.visible.buffer,
                    input,
                    &self.mappings.forward,
                    &self.strategy,
                );
                if outcome == Outcome::Default {
                    self.visible.buffer.apply_default_key(input);
                }
                outcome
            }
            EditorEvent::Click { offset } => {
                self.visible.buffer.set_caret(offset);
                self.pending_caret =
                    navigation::handle_click(&self.visible.buffer, &self.mappings.forward);
                Outcome::Default
            }
            EditorEvent::DoubleClick { offset } => {
                self.visible.buffer.set_caret(offset);
                let outcome =
                    navigation::handle_double_click(&mut self.visible.buffer, &self.mappings.forward);
                if outcome == Outcome::Default {
                    self.visible.buffer.select_word_at(offset);
                }
                outcome
            }
            EditorEvent::Input(text) => {
                self.visible.buffer.insert_text(&text);
                Outcome::Default
            }
            EditorEvent::Scroll(offset) => {
                self.visible.scroll = offset;
                self.overlay.sync_scroll(offset);
                Outcome::Default
            }
            EditorEvent::Resize(size) => {
                self.visible.size = size;
                self.overlay.sync_size(size);
                Outcome::Default
            }
            EditorEvent::Undo => {
                self.visible.buffer.undo();
                Outcome::Default
            }
            EditorEvent::Redo => {
                self.visible.buffer.redo();
                Outcome::Default
            }
        };

        if !self.visible.buffer.take_input_events().is_empty() {
            self.sync_visible_to_raw();
        }
        outcome
    }

    /// Apply work queued for the end of the host's event turn.
    pub fn run_deferred(&mut self) {
        if let Some(pos) = self.pending_caret.take() {
            self.visible.buffer.set_caret(pos);
            crate::perf::log_event("nav.click_correct", format!("to={pos}"));
        }
    }

    /// Re-sync after the visible field was changed from outside the event flow.
    pub fn sync_now(&mut self) {
        self.visible.buffer.take_input_events();
        self.sync_visible_to_raw();
    }

    fn sync_visible_to_raw(&mut self) {
        let _scope = crate::perf::scope("sync.visible_to_raw");
        let visible = self.visible.value();
        let raw = to_raw_references(&visible, &self.mappings.reverse);
        {
            let mut field = self.raw.field.borrow_mut();
            field.set_value(&raw);
            field.dispatch_input();
        }
        self.overlay
            .update(&visible, self.visible.scroll, &self.mappings.forward);
    }

    /// Remove the enhancement. The raw field, still held by its container,
    /// becomes visible again with its id restored and its latest value.
    pub fn teardown(self) {
        drop(self);
        tracing::debug!("Context-aware editor torn down");
    }
}
