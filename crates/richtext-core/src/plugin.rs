use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::Editor;
use crate::error::{EditorError, Result};
use crate::node::{Align, ElementKind, MarkKind, MarkValue};
use crate::normalize::{
    EnsureBlocksHaveContent, EnsureNonEmptyDocument, MergeAdjacentTextLeaves, NormalizeBlockAttrs,
    NormalizePass, RemoveEmptyLeaves, WrapStrayLeaves,
};
use crate::path::Path;

pub type CommandHandler = Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<()> + Send + Sync>;
pub type QueryHandler = Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub args_example: Option<Value>,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            args_example: None,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn args_example(mut self, args_example: Value) -> Self {
        self.args_example = Some(args_example);
        self
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: QueryHandler,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

/// A bundle of commands, queries and normalize passes registered together.
pub trait EditorPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<&'static str>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

impl PluginRegistry {
    pub fn new(plugins: impl IntoIterator<Item = Box<dyn EditorPlugin>>) -> Result<Self> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    /// Normalization, text insertion and history.
    pub fn core() -> Self {
        let mut registry = Self::default();
        for plugin in core_plugins() {
            registry.insert(plugin);
        }
        registry
    }

    /// Everything in [`PluginRegistry::core`] plus marks, blocks, alignment
    /// and checklists.
    pub fn richtext() -> Self {
        let mut registry = Self::core();
        for plugin in richtext_plugins() {
            registry.insert(plugin);
        }
        registry
    }

    /// Fails without registering anything if the plugin reuses a command or
    /// query id.
    pub fn register_plugin(&mut self, plugin: Box<dyn EditorPlugin>) -> Result<()> {
        let id = plugin.id();
        if self.plugins.contains(&id) {
            return Err(EditorError::structural(format!("Duplicate plugin id: {id}")));
        }
        for cmd in plugin.commands() {
            if self.commands.contains_key(&cmd.id) {
                return Err(EditorError::structural(format!(
                    "Duplicate command id: {}",
                    cmd.id
                )));
            }
        }
        for query in plugin.queries() {
            if self.queries.contains_key(&query.id) {
                return Err(EditorError::structural(format!(
                    "Duplicate query id: {}",
                    query.id
                )));
            }
        }
        self.insert(plugin);
        Ok(())
    }

    fn insert(&mut self, plugin: Box<dyn EditorPlugin>) {
        self.plugins.push(plugin.id());
        self.normalize_passes.extend(plugin.normalize_passes());
        for cmd in plugin.commands() {
            self.commands.insert(cmd.id.clone(), cmd);
        }
        for query in plugin.queries() {
            self.queries.insert(query.id.clone(), query);
        }
    }

    pub fn plugin_ids(&self) -> &[&'static str] {
        &self.plugins
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.normalize_passes
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn queries(&self) -> &HashMap<String, QuerySpec> {
        &self.queries
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }
}

fn core_plugins() -> Vec<Box<dyn EditorPlugin>> {
    vec![
        Box::new(CoreNormalizePlugin),
        Box::new(TextPlugin),
        Box::new(HistoryPlugin),
    ]
}

fn richtext_plugins() -> Vec<Box<dyn EditorPlugin>> {
    vec![
        Box::new(MarksPlugin),
        Box::new(BlocksPlugin),
        Box::new(AlignPlugin),
        Box::new(ChecklistPlugin),
    ]
}

fn parse_args<T: DeserializeOwned>(id: &str, args: Option<Value>) -> Result<T> {
    serde_json::from_value(args.unwrap_or(Value::Null))
        .map_err(|err| EditorError::invalid_args(id, err.to_string()))
}

fn to_value(id: &str, value: impl serde::Serialize) -> Result<Value> {
    serde_json::to_value(value).map_err(|err| EditorError::invalid_args(id, err.to_string()))
}

struct CoreNormalizePlugin;

impl EditorPlugin for CoreNormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(WrapStrayLeaves),
            Box::new(EnsureBlocksHaveContent),
            Box::new(NormalizeBlockAttrs),
            Box::new(RemoveEmptyLeaves),
            Box::new(MergeAdjacentTextLeaves),
        ]
    }
}

#[derive(Deserialize)]
struct TextArgs {
    text: String,
}

struct TextPlugin;

impl EditorPlugin for TextPlugin {
    fn id(&self) -> &'static str {
        "core.text"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("text.insert", "Insert text", |editor, args| {
                let args: TextArgs = parse_args("text.insert", args)?;
                editor.insert_text(&args.text)
            })
            .description("Insert text at the caret, carrying any held marks.")
            .keywords(["type", "text", "insert"])
            .args_example(serde_json::json!({ "text": "hello" })),
        ]
    }
}

struct HistoryPlugin;

impl EditorPlugin for HistoryPlugin {
    fn id(&self) -> &'static str {
        "core.history"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("history.undo", "Undo", |editor, _args| {
                editor.undo().map(|_| ())
            })
            .keywords(["undo", "history"]),
            CommandSpec::new("history.redo", "Redo", |editor, _args| {
                editor.redo().map(|_| ())
            })
            .keywords(["redo", "history"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("history.can_undo", |editor, _args| {
                Ok(Value::Bool(editor.can_undo()))
            }),
            QuerySpec::new("history.can_redo", |editor, _args| {
                Ok(Value::Bool(editor.can_redo()))
            }),
        ]
    }
}

#[derive(Deserialize)]
struct MarkArgs {
    mark: MarkKind,
}

#[derive(Deserialize)]
struct SetMarkArgs {
    mark: MarkKind,
    value: MarkValue,
}

struct MarksPlugin;

impl EditorPlugin for MarksPlugin {
    fn id(&self) -> &'static str {
        "marks"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("marks.toggle", "Toggle mark", |editor, args| {
                let args: MarkArgs = parse_args("marks.toggle", args)?;
                editor.toggle_mark(args.mark)
            })
            .description("Toggle a boolean mark on the selection or for the next typed text.")
            .keywords(["bold", "italic", "underline", "strikethrough", "superscript", "mark"])
            .args_example(serde_json::json!({ "mark": "bold" })),
            CommandSpec::new("marks.set", "Set mark", |editor, args| {
                let args: SetMarkArgs = parse_args("marks.set", args)?;
                editor.set_mark(args.mark, args.value)
            })
            .description("Set a mark value such as font family, size, color or highlight.")
            .keywords(["font", "size", "color", "highlight", "mark"])
            .args_example(serde_json::json!({ "mark": "fontFamily", "value": "Georgia" })),
            CommandSpec::new("marks.unset", "Remove mark", |editor, args| {
                let args: MarkArgs = parse_args("marks.unset", args)?;
                editor.unset_mark(args.mark)
            })
            .keywords(["clear", "remove", "mark"])
            .args_example(serde_json::json!({ "mark": "color" })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("marks.is_active", |editor, args| {
                let args: MarkArgs = parse_args("marks.is_active", args)?;
                Ok(Value::Bool(editor.is_mark_active(args.mark)))
            }),
            QuerySpec::new("marks.get_active", |editor, _args| {
                to_value("marks.get_active", editor.active_marks())
            }),
        ]
    }
}

#[derive(Deserialize)]
struct BlockArgs {
    kind: ElementKind,
}

struct BlocksPlugin;

impl EditorPlugin for BlocksPlugin {
    fn id(&self) -> &'static str {
        "blocks"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.toggle", "Toggle block type", |editor, args| {
                let args: BlockArgs = parse_args("block.toggle", args)?;
                editor.toggle_block(args.kind)
            })
            .description("Switch the selected blocks to a block type or list, or back to paragraphs.")
            .keywords(["paragraph", "list", "bulleted", "numbered", "block"])
            .args_example(serde_json::json!({ "kind": "bulleted-list" })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.is_active", |editor, args| {
            let args: BlockArgs = parse_args("block.is_active", args)?;
            Ok(Value::Bool(editor.is_block_active(args.kind)))
        })]
    }
}

#[derive(Deserialize)]
struct AlignArgs {
    align: Align,
}

struct AlignPlugin;

impl EditorPlugin for AlignPlugin {
    fn id(&self) -> &'static str {
        "align"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.set_align", "Set block alignment", |editor, args| {
                let args: AlignArgs = parse_args("block.set_align", args)?;
                editor.set_alignment(args.align)
            })
            .description("Set text alignment for the selected paragraphs.")
            .keywords(["align", "alignment", "left", "center", "right", "justify"])
            .args_example(serde_json::json!({ "align": "center" })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.align", |editor, _args| {
            to_value("block.align", editor.active_alignment())
        })]
    }
}

#[derive(Deserialize)]
struct CheckedArgs {
    path: Path,
    checked: bool,
}

#[derive(Deserialize, Default)]
struct PathArgs {
    #[serde(default)]
    path: Option<Path>,
}

struct ChecklistPlugin;

impl EditorPlugin for ChecklistPlugin {
    fn id(&self) -> &'static str {
        "checklist"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("checklist.toggle", "Toggle checklist", |editor, _args| {
                editor.toggle_checklist()
            })
            .description("Turn the selected blocks into checklist items, or back into paragraphs.")
            .keywords(["todo", "task", "checkbox", "checklist"]),
            CommandSpec::new("checklist.set_checked", "Set checked", |editor, args| {
                let args: CheckedArgs = parse_args("checklist.set_checked", args)?;
                editor.set_checklist_checked(&args.path, args.checked)
            })
            .description("Check or uncheck the checklist item at a path.")
            .keywords(["todo", "checkbox", "checked"])
            .args_example(serde_json::json!({ "path": [0], "checked": true })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("checklist.is_checked", |editor, args| {
            let args: PathArgs = match args {
                Some(args) => parse_args("checklist.is_checked", Some(args))?,
                None => PathArgs::default(),
            };
            let checked = match args.path {
                Some(path) => Some(editor.checklist_checked(&path)?),
                None => editor.active_checklist_checked(),
            };
            to_value("checklist.is_checked", checked)
        })]
    }
}
