// File: src/layout.rs
// Purpose: Layout selection and wrapping of rendered content

use crate::context::ActionContext;
use crate::filters::Scope;
use crate::templating::TemplateError;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Produces a layout name from the current request
pub type LayoutFn = dyn Fn(&ActionContext) -> Option<String> + Send + Sync;

#[derive(Clone)]
pub enum LayoutName {
    Static(String),
    /// Evaluated per request; `None` means no layout
    Dynamic(Arc<LayoutFn>),
}

impl LayoutName {
    pub fn dynamic<F>(select: F) -> Self
    where
        F: Fn(&ActionContext) -> Option<String> + Send + Sync + 'static,
    {
        LayoutName::Dynamic(Arc::new(select))
    }

    fn resolve(&self, ctx: &ActionContext) -> Option<String> {
        match self {
            LayoutName::Static(name) => Some(name.clone()),
            LayoutName::Dynamic(select) => select(ctx),
        }
    }
}

impl From<&str> for LayoutName {
    fn from(name: &str) -> Self {
        LayoutName::Static(name.to_string())
    }
}

impl From<String> for LayoutName {
    fn from(name: String) -> Self {
        LayoutName::Static(name)
    }
}

impl fmt::Debug for LayoutName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutName::Static(name) => f.debug_tuple("Static").field(name).finish(),
            LayoutName::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutEntry {
    pub name: LayoutName,
    pub scope: Scope,
}

/// Ordered layout declarations; the first entry whose scope passes wins
#[derive(Debug, Clone, Default)]
pub struct LayoutChain {
    entries: Vec<LayoutEntry>,
}

impl LayoutChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<LayoutName>, scope: Scope) {
        self.entries.push(LayoutEntry {
            name: name.into(),
            scope,
        });
    }

    pub fn prepend(&mut self, name: impl Into<LayoutName>, scope: Scope) {
        self.entries.insert(
            0,
            LayoutEntry {
                name: name.into(),
                scope,
            },
        );
    }

    /// Replaces every declared layout
    pub fn set(&mut self, name: impl Into<LayoutName>, scope: Scope) {
        self.entries.clear();
        self.append(name, scope);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layout for this request, ignoring any render override
    pub fn select(&self, ctx: &ActionContext) -> Option<String> {
        self.entries
            .iter()
            .find(|entry| entry.scope.applies_to(&ctx.action))
            .and_then(|entry| entry.name.resolve(ctx))
    }

    /// Wraps `ctx.content` in the selected layout
    ///
    /// A layout without a template leaves the content as it was.
    pub fn render_layout(&self, ctx: &mut ActionContext) -> Result<(), TemplateError> {
        let layout = match ctx.layout_override() {
            Some(chosen) => chosen.map(str::to_string),
            None => self.select(ctx),
        };
        let Some(layout) = layout else {
            return Ok(());
        };

        let mut context = ctx.view_context();
        context.insert("content".to_string(), Value::from(ctx.content.as_str()));

        match ctx.templating().render_layout(&layout, &ctx.format, &context) {
            Ok(body) => {
                debug!(layout = %layout, "Applied layout");
                ctx.content = body;
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!(layout = %layout, format = %ctx.format, "Layout template not found");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
