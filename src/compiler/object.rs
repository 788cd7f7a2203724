//! Live object tree produced by the reference compiler.

use super::{Diagnostic, Reloadable};

/// Types implemented by the runtime itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    ShellRoot,
    PanelWindow,
    FloatingWindow,
    Variants,
    Item,
    Text,
    Timer,
    Process,
    PersistentProperties,
}

impl Builtin {
    pub const ALL: [Self; 9] = [
        Self::ShellRoot,
        Self::PanelWindow,
        Self::FloatingWindow,
        Self::Variants,
        Self::Item,
        Self::Text,
        Self::Timer,
        Self::Process,
        Self::PersistentProperties,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ShellRoot => "ShellRoot",
            Self::PanelWindow => "PanelWindow",
            Self::FloatingWindow => "FloatingWindow",
            Self::Variants => "Variants",
            Self::Item => "Item",
            Self::Text => "Text",
            Self::Timer => "Timer",
            Self::Process => "Process",
            Self::PersistentProperties => "PersistentProperties",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }
}

/// One instantiated object.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub builtin: Builtin,
    /// Declared type name (a builtin or a component name).
    pub type_name: String,
    pub id: Option<String>,
    pub props: toml::Table,
    pub children: Vec<Object>,
}

impl Object {
    pub fn new(builtin: Builtin) -> Self {
        Self {
            builtin,
            type_name: builtin.name().to_string(),
            id: None,
            props: toml::Table::new(),
            children: Vec::new(),
        }
    }

    /// Depth-first search by id.
    pub fn find(&self, id: &str) -> Option<&Object> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Visit this object and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Object)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Object)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }
}

/// Global shell settings declared on the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellSettings {
    /// Reload when a watched file changes.
    pub watch_files: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self { watch_files: true }
    }
}

impl ShellSettings {
    /// Read the `settings` table of the root object.
    pub fn from_props(props: &toml::Table) -> Result<Self, Diagnostic> {
        let mut settings = Self::default();
        let Some(value) = props.get("settings") else {
            return Ok(settings);
        };
        let Some(table) = value.as_table() else {
            return Err(Diagnostic::new("`settings` must be a table"));
        };

        for (key, value) in table {
            match key.as_str() {
                "watch_files" => {
                    settings.watch_files = value
                        .as_bool()
                        .ok_or_else(|| Diagnostic::new("`settings.watch_files` must be a boolean"))?;
                }
                other => return Err(Diagnostic::new(format!("unknown setting `{other}`"))),
            }
        }
        Ok(settings)
    }
}

/// The root of a generation's object graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellRoot {
    object: Object,
    settings: ShellSettings,
    /// Number of predecessors this root's lineage was handed.
    reloads: u32,
}

impl ShellRoot {
    /// Accept an object as root. Returns the found type name otherwise.
    pub fn try_from_object(object: Object) -> Result<Self, String> {
        if object.builtin != Builtin::ShellRoot {
            return Err(object.type_name);
        }
        Ok(Self {
            object,
            settings: ShellSettings::default(),
            reloads: 0,
        })
    }

    pub fn object_mut(&mut self) -> &mut Object {
        &mut self.object
    }

    pub(super) fn apply_settings(&mut self) -> Result<(), Diagnostic> {
        self.settings = ShellSettings::from_props(&self.object.props)?;
        Ok(())
    }
}

// ============================================================================
// Inspection (tests only)
// ============================================================================

#[cfg(test)]
impl Object {
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Object> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    pub fn prop(&self, key: &str) -> Option<&toml::Value> {
        self.props.get(key)
    }

    pub fn set_prop(&mut self, key: &str, value: impl Into<toml::Value>) {
        self.props.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
impl ShellRoot {
    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn settings(&self) -> ShellSettings {
        self.settings
    }

    pub fn reloads(&self) -> u32 {
        self.reloads
    }

    pub fn find(&self, id: &str) -> Option<&Object> {
        self.object.find(id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Object> {
        self.object.find_mut(id)
    }
}

impl Reloadable for ShellRoot {
    fn on_reload(&mut self, previous: Option<&Self>) {
        let Some(previous) = previous else {
            return;
        };

        self.reloads = previous.reloads + 1;

        let mut carried = 0usize;
        self.object.walk_mut(&mut |object| {
            if object.builtin != Builtin::PersistentProperties {
                return;
            }
            let Some(old) = object
                .id
                .as_deref()
                .and_then(|id| previous.object.find(id))
                .filter(|old| old.builtin == Builtin::PersistentProperties)
            else {
                return;
            };

            for (key, value) in object.props.iter_mut() {
                if let Some(old_value) = old.props.get(key) {
                    *value = old_value.clone();
                    carried += 1;
                }
            }
        });

        crate::debug!("reload"; "carried {} persistent properties forward", carried);
    }

    fn watch_files(&self) -> bool {
        self.settings.watch_files
    }
}
