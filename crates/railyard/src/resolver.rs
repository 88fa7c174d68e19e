// File: src/resolver.rs
// Purpose: Pick the handler for a matched request

use crate::controller::{Controller, Handler};
use crate::templating::{TemplateDescriptor, Templating};
use railyard_router::MatchResult;
use std::fmt;
use tracing::debug;

/// `showAll`, `show-all` and `show.all` all become `show_all`
pub fn normalize_action(action: &str) -> String {
    let mut normalized = String::with_capacity(action.len() + 4);
    let mut prev_lower = false;
    for ch in action.chars() {
        match ch {
            '.' | '-' => {
                normalized.push('_');
                prev_lower = false;
            }
            c if c.is_uppercase() => {
                if prev_lower {
                    normalized.push('_');
                }
                normalized.extend(c.to_lowercase());
                prev_lower = false;
            }
            c => {
                normalized.push(c);
                prev_lower = c.is_lowercase() || c.is_ascii_digit();
            }
        }
    }
    normalized
}

/// Where a handler was found, from most to least specific
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rung {
    FormatMethodAction,
    FormatAction,
    Action,
    ActionMethodFormatHandler,
    ActionMethodHandler,
    ActionFormatHandler,
    ActionHandler,
    Template,
}

impl fmt::Display for Rung {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rung::FormatMethodAction => "actions[format][method][action]",
            Rung::FormatAction => "actions[format][action]",
            Rung::Action => "actions[action]",
            Rung::ActionMethodFormatHandler => "{action}_{method}_{format}_action",
            Rung::ActionMethodHandler => "{action}_{method}_action",
            Rung::ActionFormatHandler => "{action}_{format}_action",
            Rung::ActionHandler => "{action}_action",
            Rung::Template => "template",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedAction {
    pub handler: Handler,
    pub rung: Rung,
    /// Normalized action name
    pub action: String,
}

/// Finds the handler for a match, most specific first:
///
/// 1. `actions[format][method][action]`
/// 2. `actions[format][action]`
/// 3. `actions[action]`
/// 4. handler `{action}_{method}_{format}_action`
/// 5. handler `{action}_{method}_action`
/// 6. handler `{action}_{format}_action`
/// 7. handler `{action}_action`
/// 8. a template for `(controller, action, format)`, served by a no-op handler
pub struct ActionResolver;

impl ActionResolver {
    pub fn resolve(
        route: &MatchResult,
        controller: &Controller,
        templating: &dyn Templating,
    ) -> Option<ResolvedAction> {
        let action = normalize_action(&route.action);
        let method = route.method.to_ascii_lowercase();
        let format = route.format.to_ascii_lowercase();

        let found = Self::lookup(controller, &action, &method, &format).or_else(|| {
            let descriptor = TemplateDescriptor::new(controller.name(), action.as_str(), format.as_str());
            templating
                .exists(&descriptor)
                .then(|| (Handler::noop(action.as_str()), Rung::Template))
        });

        match found {
            Some((handler, rung)) => {
                debug!(controller = controller.name(), action = %action, rung = %rung, "Resolved action");
                Some(ResolvedAction {
                    handler,
                    rung,
                    action,
                })
            }
            None => {
                debug!(controller = controller.name(), action = %action, "No handler for action");
                None
            }
        }
    }

    fn lookup(
        controller: &Controller,
        action: &str,
        method: &str,
        format: &str,
    ) -> Option<(Handler, Rung)> {
        let actions = controller.actions();
        let table = [
            (actions.get_for_format_method(format, method, action), Rung::FormatMethodAction),
            (actions.get_for_format(format, action), Rung::FormatAction),
            (actions.get(action), Rung::Action),
        ];
        if let Some((handler, rung)) = table
            .into_iter()
            .find_map(|(handler, rung)| handler.map(|h| (h.clone(), rung)))
        {
            return Some((handler, rung));
        }

        let named = [
            (format!("{}_{}_{}_action", action, method, format), Rung::ActionMethodFormatHandler),
            (format!("{}_{}_action", action, method), Rung::ActionMethodHandler),
            (format!("{}_{}_action", action, format), Rung::ActionFormatHandler),
            (format!("{}_action", action), Rung::ActionHandler),
        ];
        named
            .iter()
            .find_map(|(name, rung)| controller.handler(name).map(|h| (h.clone(), *rung)))
    }
}
