// File: src/controller.rs
// Purpose: Controllers, their action tables and the controller registry

use crate::context::ActionContext;
use crate::filters::{Filter, FilterChain, Scope};
use crate::layout::{LayoutChain, LayoutName};
use crate::resolver::normalize_action;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type HandlerFn = dyn Fn(&mut ActionContext) -> anyhow::Result<()> + Send + Sync;

/// A callable action
#[derive(Clone)]
pub struct Handler {
    name: String,
    func: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut ActionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Does nothing; the implicit render produces the response
    pub fn noop(name: impl Into<String>) -> Self {
        Self::new(name, |_ctx: &mut ActionContext| Ok(()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, ctx: &mut ActionContext) -> anyhow::Result<()> {
        (self.func)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}

/// Handlers keyed by action, by format and action, and by format, method
/// and action
///
/// Actions are stored normalized, methods and formats lowercase.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    by_action: HashMap<String, Handler>,
    by_format: HashMap<(String, String), Handler>,
    by_format_method: HashMap<(String, String, String), Handler>,
}

impl ActionTable {
    pub fn insert(&mut self, action: &str, handler: Handler) {
        self.by_action.insert(normalize_action(action), handler);
    }

    pub fn insert_for_format(&mut self, format: &str, action: &str, handler: Handler) {
        self.by_format
            .insert((format.to_ascii_lowercase(), normalize_action(action)), handler);
    }

    pub fn insert_for_format_method(
        &mut self,
        format: &str,
        method: &str,
        action: &str,
        handler: Handler,
    ) {
        self.by_format_method.insert(
            (
                format.to_ascii_lowercase(),
                method.to_ascii_lowercase(),
                normalize_action(action),
            ),
            handler,
        );
    }

    pub fn get(&self, action: &str) -> Option<&Handler> {
        self.by_action.get(action)
    }

    pub fn get_for_format(&self, format: &str, action: &str) -> Option<&Handler> {
        self.by_format.get(&(format.to_string(), action.to_string()))
    }

    pub fn get_for_format_method(&self, format: &str, method: &str, action: &str) -> Option<&Handler> {
        self.by_format_method
            .get(&(format.to_string(), method.to_string(), action.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_action.len() + self.by_format.len() + self.by_format_method.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The inheritable part of a controller
///
/// A child built with [`ControllerBuilder::inherit`] starts from a copy;
/// later changes to either side stay local.
#[derive(Debug, Clone, Default)]
pub struct ControllerConfig {
    pub before_filters: FilterChain,
    pub after_filters: FilterChain,
    pub layouts: LayoutChain,
    pub handlers: HashMap<String, Handler>,
}

/// Actions, filters and layouts for one controller name
#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    actions: ActionTable,
    config: ControllerConfig,
}

impl Controller {
    pub fn builder(name: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    /// Convention handler such as `show_get_action`
    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.config.handlers.get(name)
    }

    pub fn before_filters(&self) -> &FilterChain {
        &self.config.before_filters
    }

    pub fn after_filters(&self) -> &FilterChain {
        &self.config.after_filters
    }

    pub fn layouts(&self) -> &LayoutChain {
        &self.config.layouts
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

/// Builds a [`Controller`]
///
/// ```
/// use railyard::{ActionContext, Controller, Scope};
///
/// let blog = Controller::builder("blog")
///     .action("show", |ctx: &mut ActionContext| {
///         ctx.render_text("post")?;
///         Ok(())
///     })
///     .before_filter_scoped(|_ctx: &mut ActionContext| true, Scope::except(["index"]))
///     .layout("application")
///     .build();
///
/// assert!(blog.actions().get("show").is_some());
/// ```
#[derive(Debug)]
pub struct ControllerBuilder {
    name: String,
    actions: ActionTable,
    config: ControllerConfig,
}

impl ControllerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: ActionTable::default(),
            config: ControllerConfig::default(),
        }
    }

    /// Start from a copy of `parent`'s filters, layouts and handlers
    pub fn inherit(mut self, parent: &ControllerConfig) -> Self {
        self.config = parent.clone();
        self
    }

    /// `actions[action]`
    pub fn action<F>(mut self, action: &str, func: F) -> Self
    where
        F: Fn(&mut ActionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.actions.insert(action, Handler::new(action, func));
        self
    }

    /// `actions[format][action]`
    pub fn format_action<F>(mut self, format: &str, action: &str, func: F) -> Self
    where
        F: Fn(&mut ActionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.actions
            .insert_for_format(format, action, Handler::new(action, func));
        self
    }

    /// `actions[format][method][action]`
    pub fn format_method_action<F>(mut self, format: &str, method: &str, action: &str, func: F) -> Self
    where
        F: Fn(&mut ActionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.actions
            .insert_for_format_method(format, method, action, Handler::new(action, func));
        self
    }

    /// Named handler found by convention, e.g. `update_put_action`
    pub fn handler<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&mut ActionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.config
            .handlers
            .insert(name.to_string(), Handler::new(name, func));
        self
    }

    pub fn before_filter(self, filter: impl Filter + 'static) -> Self {
        self.before_filter_scoped(filter, Scope::all())
    }

    pub fn before_filter_scoped(mut self, filter: impl Filter + 'static, scope: Scope) -> Self {
        self.config.before_filters.append(filter, scope);
        self
    }

    pub fn prepend_before_filter(mut self, filter: impl Filter + 'static, scope: Scope) -> Self {
        self.config.before_filters.prepend(filter, scope);
        self
    }

    pub fn after_filter(self, filter: impl Filter + 'static) -> Self {
        self.after_filter_scoped(filter, Scope::all())
    }

    pub fn after_filter_scoped(mut self, filter: impl Filter + 'static, scope: Scope) -> Self {
        self.config.after_filters.append(filter, scope);
        self
    }

    pub fn prepend_after_filter(mut self, filter: impl Filter + 'static, scope: Scope) -> Self {
        self.config.after_filters.prepend(filter, scope);
        self
    }

    pub fn layout(self, name: impl Into<LayoutName>) -> Self {
        self.layout_scoped(name, Scope::all())
    }

    pub fn layout_scoped(mut self, name: impl Into<LayoutName>, scope: Scope) -> Self {
        self.config.layouts.append(name, scope);
        self
    }

    pub fn dynamic_layout<F>(self, select: F) -> Self
    where
        F: Fn(&ActionContext) -> Option<String> + Send + Sync + 'static,
    {
        self.layout_scoped(LayoutName::dynamic(select), Scope::all())
    }

    /// Replaces inherited and earlier layouts
    pub fn set_layout(mut self, name: impl Into<LayoutName>, scope: Scope) -> Self {
        self.config.layouts.set(name, scope);
        self
    }

    pub fn build(self) -> Controller {
        Controller {
            name: self.name,
            actions: self.actions,
            config: self.config,
        }
    }
}

/// Controllers by name
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `controller`, replacing one with the same name
    pub fn register(&mut self, controller: Controller) {
        self.controllers
            .insert(controller.name().to_string(), Arc::new(controller));
    }

    pub fn with(mut self, controller: Controller) -> Self {
        self.register(controller);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Controller>> {
        self.controllers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.controllers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_ctx: &mut ActionContext) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn test_action_keys_are_normalized() {
        let controller = Controller::builder("blog")
            .action("showAll", noop)
            .format_action("JSON", "show", noop)
            .format_method_action("json", "PUT", "update", noop)
            .build();

        assert!(controller.actions().get("show_all").is_some());
        assert!(controller.actions().get_for_format("json", "show").is_some());
        assert!(controller
            .actions()
            .get_for_format_method("json", "put", "update")
            .is_some());
        assert_eq!(controller.actions().len(), 3);
    }

    #[test]
    fn test_inherit_copies_parent_config() {
        let parent = Controller::builder("application")
            .before_filter(|_ctx: &mut ActionContext| true)
            .layout("application")
            .handler("ping_action", noop)
            .build();

        let child = Controller::builder("blog")
            .inherit(parent.config())
            .after_filter(|_ctx: &mut ActionContext| true)
            .set_layout("blog", Scope::all())
            .build();

        assert_eq!(child.before_filters().len(), 1);
        assert_eq!(child.after_filters().len(), 1);
        assert_eq!(child.layouts().len(), 1);
        assert!(child.handler("ping_action").is_some());

        assert!(parent.after_filters().is_empty());
        assert_eq!(parent.layouts().len(), 1);
    }

    #[test]
    fn test_registry() {
        let registry = ControllerRegistry::new()
            .with(Controller::builder("store").build())
            .with(Controller::builder("blog").build());

        assert_eq!(registry.names(), vec!["blog", "store"]);
        assert!(registry.get("blog").is_some());
        assert!(registry.get("admin").is_none());
    }
}
