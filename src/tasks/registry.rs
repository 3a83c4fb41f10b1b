//! Layered task registry.
//!
//! Three layers hold descriptors: system, app, and user. When names
//! collide the system layer wins over the app layer, which wins over the
//! user layer. A caller's task named like a built-in is therefore never
//! reachable; [`TaskRegistry::shadowed`] reports such tasks so the engine
//! can warn about them.

use super::TaskDescriptor;
use crate::report::ReportKind;

/// A registry layer, ordered by ascending precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    /// Caller-supplied tasks.
    User,
    /// Built-in report and release tasks.
    App,
    /// Built-in housekeeping tasks (`clear_cache`, `exit`).
    System,
}

/// Menu order: app tasks first, then user tasks, then system tasks.
const MENU_ORDER: [Layer; 3] = [Layer::App, Layer::User, Layer::System];

/// Lookup order: highest precedence first.
const PRECEDENCE: [Layer; 3] = [Layer::System, Layer::App, Layer::User];

/// Holds task descriptors per layer.
#[derive(Debug, Default, Clone)]
pub struct TaskRegistry {
    system: Vec<TaskDescriptor>,
    app: Vec<TaskDescriptor>,
    user: Vec<TaskDescriptor>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn layer(&self, layer: Layer) -> &Vec<TaskDescriptor> {
        match layer {
            Layer::System => &self.system,
            Layer::App => &self.app,
            Layer::User => &self.user,
        }
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut Vec<TaskDescriptor> {
        match layer {
            Layer::System => &mut self.system,
            Layer::App => &mut self.app,
            Layer::User => &mut self.user,
        }
    }

    /// Adds descriptors to a layer, replacing same-named ones in that layer.
    pub fn register(&mut self, layer: Layer, descriptors: impl IntoIterator<Item = TaskDescriptor>) {
        let tasks = self.layer_mut(layer);
        for descriptor in descriptors {
            match tasks.iter_mut().find(|task| task.name() == descriptor.name()) {
                Some(existing) => *existing = descriptor,
                None => tasks.push(descriptor),
            }
        }
    }

    /// Every reachable task, one per name, in menu order.
    ///
    /// A name keeps the menu position where it first appeared while the
    /// descriptor comes from the highest-precedence layer defining it.
    #[must_use]
    pub fn resolve_all(&self) -> Vec<&TaskDescriptor> {
        let mut resolved: Vec<(Layer, &TaskDescriptor)> = Vec::new();
        for layer in MENU_ORDER {
            for task in self.layer(layer) {
                match resolved.iter_mut().find(|(_, seen)| seen.name() == task.name()) {
                    Some(slot) if layer > slot.0 => *slot = (layer, task),
                    Some(_) => {}
                    None => resolved.push((layer, task)),
                }
            }
        }
        resolved.into_iter().map(|(_, task)| task).collect()
    }

    /// The reachable descriptor for `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&TaskDescriptor> {
        PRECEDENCE
            .into_iter()
            .find_map(|layer| self.layer(layer).iter().find(|task| task.name() == name))
    }

    /// Names in `layer` hidden by a same-named task in a higher layer.
    #[must_use]
    pub fn shadowed(&self, layer: Layer) -> Vec<&str> {
        self.layer(layer)
            .iter()
            .filter(|task| {
                PRECEDENCE
                    .into_iter()
                    .filter(|other| *other > layer)
                    .any(|other| self.layer(other).iter().any(|t| t.name() == task.name()))
            })
            .map(TaskDescriptor::name)
            .collect()
    }

    /// Sets the report kind of every descriptor named `name`, in any layer.
    ///
    /// Returns whether a descriptor was found.
    pub fn override_report_kind(&mut self, name: &str, kind: ReportKind) -> bool {
        let mut found = false;
        for layer in PRECEDENCE {
            for task in self.layer_mut(layer).iter_mut().filter(|task| task.name() == name) {
                task.set_report_kind(kind);
                found = true;
            }
        }
        found
    }
}
