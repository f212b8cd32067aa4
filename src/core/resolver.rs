/// Label resolution: an ordered chain of structural checks that turn a
/// focused scene node into the text a screen reader should speak.
///
/// Strategies run strictly in order and the first non-placeholder hit
/// wins. Earlier strategies make narrower structural assumptions; the
/// last one searches whole subtrees.
use rustc_hash::{FxHashMap, FxHashSet};

use super::config::ResolverConfig;
use super::filter::PlaceholderFilter;
use super::messages::{keys, Translator};
use crate::schema::scene::{AccessError, FocusContext, NodeId, SceneAccessor};

/// Narratable facets of one node, checked once per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCapabilities {
    /// Exactly one text value is attached to the node itself.
    pub has_direct_text: bool,
    /// Named like an options list container.
    pub is_indexed_list: bool,
    /// Has both an icon child and a label child.
    pub is_icon_label_widget: bool,
    /// Named like a key-remapping panel.
    pub is_remap_panel: bool,
}

/// Per-request view over the scene with capability caching and the
/// shared placeholder filter.
pub struct NodeView<'a> {
    scene: &'a dyn SceneAccessor,
    config: &'a ResolverConfig,
    filter: &'a PlaceholderFilter,
    translator: &'a dyn Translator,
    capabilities: FxHashMap<NodeId, NodeCapabilities>,
}

impl<'a> NodeView<'a> {
    pub fn new(
        scene: &'a dyn SceneAccessor,
        config: &'a ResolverConfig,
        filter: &'a PlaceholderFilter,
        translator: &'a dyn Translator,
    ) -> Self {
        Self {
            scene,
            config,
            filter,
            translator,
            capabilities: FxHashMap::default(),
        }
    }

    pub fn scene(&self) -> &'a dyn SceneAccessor {
        self.scene
    }

    pub fn config(&self) -> &'a ResolverConfig {
        self.config
    }

    pub fn filter(&self) -> &'a PlaceholderFilter {
        self.filter
    }

    pub fn translator(&self) -> &'a dyn Translator {
        self.translator
    }

    pub fn capabilities(&mut self, node: NodeId) -> Result<NodeCapabilities, AccessError> {
        if let Some(caps) = self.capabilities.get(&node) {
            return Ok(*caps);
        }

        let name = self.scene.name(node)?;
        let has_direct_text = self.scene.attached_texts(node)?.len() == 1;
        let is_indexed_list = self.config.list_containers.iter().any(|c| *c == name);
        let is_remap_panel = self.config.remap_containers.iter().any(|c| *c == name);

        let mut has_icon = false;
        let mut has_label = false;
        for child in self.scene.children(node)? {
            let child_name = self.scene.name(child)?;
            has_icon |= self.config.icon_fields.iter().any(|f| *f == child_name);
            has_label |= child_name == self.config.icon_label_field;
        }

        let caps = NodeCapabilities {
            has_direct_text,
            is_indexed_list,
            is_icon_label_widget: has_icon && has_label,
            is_remap_panel,
        };
        self.capabilities.insert(node, caps);
        Ok(caps)
    }

    /// `node` followed by its parents, at most `max_ancestor_depth` nodes.
    pub fn ancestors(&self, node: NodeId) -> Result<Vec<NodeId>, AccessError> {
        let mut chain = vec![node];
        let mut current = node;
        while chain.len() < self.config.max_ancestor_depth {
            match self.scene.parent(current)? {
                Some(parent) => {
                    chain.push(parent);
                    current = parent;
                }
                None => break,
            }
        }
        Ok(chain)
    }

    /// The node's single attached text, if it has exactly one and it is
    /// not a placeholder.
    pub fn direct_text(&mut self, node: NodeId) -> Result<Option<String>, AccessError> {
        if !self.capabilities(node)?.has_direct_text {
            return Ok(None);
        }
        let texts = self.scene.attached_texts(node)?;
        Ok(texts.first().and_then(|t| self.filter.accept(t)))
    }

    /// First acceptable text attached directly to `node`, in attach order.
    pub fn any_text(&self, node: NodeId) -> Result<Option<String>, AccessError> {
        Ok(self
            .scene
            .attached_texts(node)?
            .iter()
            .find_map(|t| self.filter.accept(t)))
    }

    pub fn active_children(&self, node: NodeId) -> Result<Vec<NodeId>, AccessError> {
        let mut active = Vec::new();
        for child in self.scene.children(node)? {
            if self.scene.is_active(child)? {
                active.push(child);
            }
        }
        Ok(active)
    }

    pub fn child_named(&self, node: NodeId, name: &str) -> Result<Option<NodeId>, AccessError> {
        for child in self.scene.children(node)? {
            if self.scene.name(child)? == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Breadth-first search below `node` (excluding it) for a node named
    /// `name`.
    pub fn descendant_named(
        &self,
        node: NodeId,
        name: &str,
    ) -> Result<Option<NodeId>, AccessError> {
        let mut queue = std::collections::VecDeque::from(self.scene.children(node)?);
        let mut seen = FxHashSet::default();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if self.scene.name(current)? == name {
                return Ok(Some(current));
            }
            queue.extend(self.scene.children(current)?);
        }
        Ok(None)
    }

    /// Text of the first field in `fields` found under `node`.
    pub fn field_text(
        &self,
        node: NodeId,
        fields: &[String],
    ) -> Result<Option<String>, AccessError> {
        for field in fields {
            if let Some(found) = self.descendant_named(node, field)? {
                if let Some(text) = self.any_text(found)? {
                    return Ok(Some(text));
                }
            }
        }
        Ok(None)
    }

    /// First acceptable text anywhere in the active subtree rooted at
    /// `node`, depth-first in sibling order.
    pub fn subtree_text(&self, node: NodeId) -> Result<Option<String>, AccessError> {
        let mut stack = vec![node];
        let mut seen = FxHashSet::default();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) || !self.scene.is_active(current)? {
                continue;
            }
            if let Some(text) = self.any_text(current)? {
                return Ok(Some(text));
            }
            let children = self.scene.children(current)?;
            stack.extend(children.into_iter().rev());
        }
        Ok(None)
    }

    /// `"<label>: <value>"` when a value exists, otherwise just the label.
    pub fn combine(&self, label: String, value: Option<String>) -> String {
        match value {
            Some(value) => self
                .translator
                .translate(keys::LABEL_COMBINED, &[&label, &value]),
            None => label,
        }
    }
}

/// One step in the label chain. `Ok(None)` passes to the next strategy.
pub trait LabelStrategy {
    fn name(&self) -> &'static str;

    fn resolve(
        &self,
        view: &mut NodeView<'_>,
        focus: &FocusContext,
    ) -> Result<Option<String>, AccessError>;
}

/// Reads a row of a key-remapping panel. Hosts supply their own.
pub trait RemapReader {
    fn try_read(
        &self,
        scene: &dyn SceneAccessor,
        translator: &dyn Translator,
        panel: NodeId,
        index: usize,
    ) -> Result<Option<String>, AccessError>;
}

/// Walks up from the focused node to the first node carrying exactly
/// one text value.
#[derive(Debug, Default)]
pub struct AncestorDirectText;

impl LabelStrategy for AncestorDirectText {
    fn name(&self) -> &'static str {
        "ancestor_direct_text"
    }

    fn resolve(
        &self,
        view: &mut NodeView<'_>,
        focus: &FocusContext,
    ) -> Result<Option<String>, AccessError> {
        for node in view.ancestors(focus.node)? {
            if let Some(text) = view.direct_text(node)? {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}

/// Indexes into an options list: `<container> … Content/<option i>`.
#[derive(Debug, Default)]
pub struct IndexedListEntry;

impl IndexedListEntry {
    fn read_option(
        view: &NodeView<'_>,
        option: NodeId,
    ) -> Result<Option<String>, AccessError> {
        let config = view.config();
        let label = match view.field_text(option, &config.label_fields)? {
            Some(label) => Some(label),
            None => Self::unlabelled_text(view, option)?,
        };
        let Some(label) = label else {
            return Ok(None);
        };
        let value = view.field_text(option, &config.value_fields)?;
        Ok(Some(view.combine(label, value)))
    }

    // An option without a recognised label field: first text outside the
    // value fields.
    fn unlabelled_text(
        view: &NodeView<'_>,
        option: NodeId,
    ) -> Result<Option<String>, AccessError> {
        let config = view.config();
        let scene = view.scene();
        let mut stack = vec![option];
        while let Some(current) = stack.pop() {
            if !scene.is_active(current)? {
                continue;
            }
            let name = scene.name(current)?;
            if config.value_fields.iter().any(|f| *f == name) {
                continue;
            }
            if let Some(text) = view.any_text(current)? {
                return Ok(Some(text));
            }
            stack.extend(scene.children(current)?.into_iter().rev());
        }
        Ok(None)
    }
}

impl LabelStrategy for IndexedListEntry {
    fn name(&self) -> &'static str {
        "indexed_list"
    }

    fn resolve(
        &self,
        view: &mut NodeView<'_>,
        focus: &FocusContext,
    ) -> Result<Option<String>, AccessError> {
        for node in view.ancestors(focus.node)? {
            if !view.capabilities(node)?.is_indexed_list {
                continue;
            }
            let content_name = &view.config().content_node;
            let Some(content) = view.descendant_named(node, content_name)? else {
                continue;
            };
            let options = view.active_children(content)?;
            let Some(&option) = options.get(focus.index) else {
                tracing::debug!(
                    index = focus.index,
                    options = options.len(),
                    "list index out of range"
                );
                continue;
            };
            if let Some(text) = Self::read_option(view, option)? {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}

/// Icon+text widgets, directly or wrapped one level deeper.
#[derive(Debug, Default)]
pub struct IconLabelWidget;

impl IconLabelWidget {
    fn label_of(view: &NodeView<'_>, widget: NodeId) -> Result<Option<String>, AccessError> {
        match view.child_named(widget, &view.config().icon_label_field)? {
            Some(label) => view.any_text(label),
            None => Ok(None),
        }
    }
}

impl LabelStrategy for IconLabelWidget {
    fn name(&self) -> &'static str {
        "icon_label_widget"
    }

    fn resolve(
        &self,
        view: &mut NodeView<'_>,
        focus: &FocusContext,
    ) -> Result<Option<String>, AccessError> {
        for node in view.ancestors(focus.node)? {
            if view.capabilities(node)?.is_icon_label_widget {
                if let Some(text) = Self::label_of(view, node)? {
                    return Ok(Some(text));
                }
            }
            for child in view.scene().children(node)? {
                if view.capabilities(child)?.is_icon_label_widget {
                    if let Some(text) = Self::label_of(view, child)? {
                        return Ok(Some(text));
                    }
                }
            }
        }
        Ok(None)
    }
}

/// Hands key-remapping panels to the host's reader.
pub struct RemapPanel {
    reader: Box<dyn RemapReader>,
}

impl RemapPanel {
    pub fn new(reader: Box<dyn RemapReader>) -> Self {
        Self { reader }
    }
}

impl LabelStrategy for RemapPanel {
    fn name(&self) -> &'static str {
        "remap_panel"
    }

    fn resolve(
        &self,
        view: &mut NodeView<'_>,
        focus: &FocusContext,
    ) -> Result<Option<String>, AccessError> {
        for node in view.ancestors(focus.node)? {
            if !view.capabilities(node)?.is_remap_panel {
                continue;
            }
            let text = self
                .reader
                .try_read(view.scene(), view.translator(), node, focus.index)?;
            if let Some(text) = view.filter().accept_opt(text) {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}

/// Last resort: any text anywhere under any ancestor.
#[derive(Debug, Default)]
pub struct SubtreeText;

impl LabelStrategy for SubtreeText {
    fn name(&self) -> &'static str {
        "subtree_text"
    }

    fn resolve(
        &self,
        view: &mut NodeView<'_>,
        focus: &FocusContext,
    ) -> Result<Option<String>, AccessError> {
        for node in view.ancestors(focus.node)? {
            if let Some(text) = view.subtree_text(node)? {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}

/// Reads `"<action>: <key>, <key>"` rows from a remapping panel laid out
/// as `Content/<row i>/{action_field, key_field*}`.
#[derive(Debug, Clone)]
pub struct KeyBindingReader {
    pub content_node: String,
    pub action_field: String,
    pub key_field: String,
}

impl Default for KeyBindingReader {
    fn default() -> Self {
        Self {
            content_node: "Content".to_string(),
            action_field: "action_text".to_string(),
            key_field: "key_text".to_string(),
        }
    }
}

impl RemapReader for KeyBindingReader {
    fn try_read(
        &self,
        scene: &dyn SceneAccessor,
        translator: &dyn Translator,
        panel: NodeId,
        index: usize,
    ) -> Result<Option<String>, AccessError> {
        let mut content = None;
        let mut stack = scene.children(panel)?;
        while let Some(node) = stack.pop() {
            if scene.name(node)? == self.content_node {
                content = Some(node);
                break;
            }
            stack.extend(scene.children(node)?);
        }
        let Some(content) = content else {
            return Ok(None);
        };

        let mut rows = Vec::new();
        for child in scene.children(content)? {
            if scene.is_active(child)? {
                rows.push(child);
            }
        }
        let Some(&row) = rows.get(index) else {
            return Ok(None);
        };

        let mut action = None;
        let mut bound = Vec::new();
        for field in scene.children(row)? {
            let name = scene.name(field)?;
            let Some(text) = scene.attached_texts(field)?.into_iter().next() else {
                continue;
            };
            if name == self.action_field {
                action = Some(text);
            } else if name == self.key_field && !text.trim().is_empty() {
                bound.push(text);
            }
        }

        Ok(action.map(|action| {
            if bound.is_empty() {
                action
            } else {
                let separator = translator.translate(keys::LABEL_LIST_SEPARATOR, &[]);
                let bindings = bound.join(&separator);
                translator.translate(keys::LABEL_COMBINED, &[&action, &bindings])
            }
        }))
    }
}

/// The label strategy chain.
pub struct TextResolver {
    config: ResolverConfig,
    filter: PlaceholderFilter,
    strategies: Vec<Box<dyn LabelStrategy>>,
}

impl TextResolver {
    /// The standard chain without a remapping reader.
    pub fn new(config: ResolverConfig) -> Self {
        let strategies: Vec<Box<dyn LabelStrategy>> = vec![
            Box::new(AncestorDirectText),
            Box::new(IndexedListEntry),
            Box::new(IconLabelWidget),
            Box::new(SubtreeText),
        ];
        Self::with_strategies(config, strategies)
    }

    /// The standard chain with `reader` slotted in after the generic
    /// checks and before the subtree fallback.
    pub fn with_remap_reader(config: ResolverConfig, reader: Box<dyn RemapReader>) -> Self {
        let strategies: Vec<Box<dyn LabelStrategy>> = vec![
            Box::new(AncestorDirectText),
            Box::new(IndexedListEntry),
            Box::new(IconLabelWidget),
            Box::new(RemapPanel::new(reader)),
            Box::new(SubtreeText),
        ];
        Self::with_strategies(config, strategies)
    }

    pub fn with_strategies(
        config: ResolverConfig,
        strategies: Vec<Box<dyn LabelStrategy>>,
    ) -> Self {
        let filter = PlaceholderFilter::new(&config.placeholders);
        Self {
            config,
            filter,
            strategies,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn filter(&self) -> &PlaceholderFilter {
        &self.filter
    }

    /// Resolve the label for `focus`, or `None` when nothing matched.
    ///
    /// A strategy whose collaborator call fails is logged and skipped.
    pub fn resolve_label(
        &self,
        scene: &dyn SceneAccessor,
        translator: &dyn Translator,
        focus: &FocusContext,
    ) -> Option<String> {
        let mut view = NodeView::new(scene, &self.config, &self.filter, translator);
        for strategy in &self.strategies {
            match strategy.resolve(&mut view, focus) {
                Ok(Some(text)) => {
                    if let Some(text) = self.filter.accept(&text) {
                        tracing::debug!(strategy = strategy.name(), node = %focus.node, "label resolved");
                        return Some(text);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), node = %focus.node, error = %e, "label strategy failed");
                }
            }
        }
        tracing::debug!(node = %focus.node, index = focus.index, "no label");
        None
    }
}
