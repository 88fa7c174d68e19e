// File: src/filters.rs
// Purpose: Before and after filter chains with only/except scoping

use crate::context::ActionContext;
use crate::resolver::normalize_action;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which actions a filter or layout applies to
///
/// `only` is checked first: when given, the action must be listed, so an
/// empty `only` list matches nothing. An action listed in `except` is then
/// excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    only: Option<Vec<String>>,
    except: Vec<String>,
}

impl Scope {
    /// Applies to every action
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            only: Some(actions.into_iter().map(|a| normalize_action(a.as_ref())).collect()),
            except: Vec::new(),
        }
    }

    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            only: None,
            except: actions.into_iter().map(|a| normalize_action(a.as_ref())).collect(),
        }
    }

    pub fn applies_to(&self, action: &str) -> bool {
        let action = normalize_action(action);
        if self.only.as_ref().is_some_and(|only| !only.contains(&action)) {
            return false;
        }
        !self.except.contains(&action)
    }
}

/// A unit of work run around an action
///
/// Before filters halt the request by returning `false`; the response is
/// whatever the filter rendered or redirected to. The return value of an
/// after filter is ignored. Closures taking `&mut ActionContext` and returning
/// `bool` implement this trait.
pub trait Filter: Send + Sync {
    fn call(&self, ctx: &mut ActionContext) -> bool;

    /// Identifier used in logs
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> Filter for F
where
    F: Fn(&mut ActionContext) -> bool + Send + Sync,
{
    fn call(&self, ctx: &mut ActionContext) -> bool {
        self(ctx)
    }
}

#[derive(Clone)]
pub struct FilterEntry {
    pub filter: Arc<dyn Filter>,
    pub scope: Scope,
}

impl fmt::Debug for FilterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEntry")
            .field("filter", &self.filter.name())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Ordered list of filters
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    entries: Vec<FilterEntry>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, filter: impl Filter + 'static, scope: Scope) {
        self.entries.push(FilterEntry {
            filter: Arc::new(filter),
            scope,
        });
    }

    pub fn prepend(&mut self, filter: impl Filter + 'static, scope: Scope) {
        self.entries.insert(
            0,
            FilterEntry {
                filter: Arc::new(filter),
                scope,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// Runs scoped filters in order; the first `false` stops the chain
    pub fn before_filters_pass(&self, ctx: &mut ActionContext) -> bool {
        let action = ctx.action.clone();
        for entry in self.scoped(&action) {
            if !entry.filter.call(ctx) {
                debug!(
                    filter = entry.filter.name(),
                    controller = %ctx.controller,
                    action = %ctx.action,
                    "Before filter halted request"
                );
                return false;
            }
        }
        true
    }

    /// Runs every scoped filter in order
    pub fn apply_after_filters(&self, ctx: &mut ActionContext) {
        let action = ctx.action.clone();
        for entry in self.scoped(&action) {
            entry.filter.call(ctx);
        }
    }

    fn scoped<'a>(&'a self, action: &'a str) -> impl Iterator<Item = &'a FilterEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.scope.applies_to(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Scope::all(), "show", true)]
    #[case(Scope::only(["show", "edit"]), "show", true)]
    #[case(Scope::only(["show"]), "index", false)]
    #[case(Scope::except(["destroy"]), "destroy", false)]
    #[case(Scope::except(["destroy"]), "show", true)]
    #[case(Scope::only(["showAll"]), "show_all", true)]
    #[case(Scope::only(Vec::<String>::new()), "show", false)]
    #[case(Scope::except(Vec::<String>::new()), "show", true)]
    fn test_scope(#[case] scope: Scope, #[case] action: &str, #[case] expected: bool) {
        assert_eq!(scope.applies_to(action), expected);
    }

    #[test]
    fn test_only_and_except_combined() {
        let scope = Scope {
            only: Some(vec!["show".into(), "edit".into()]),
            except: vec!["edit".into()],
        };
        assert!(scope.applies_to("show"));
        assert!(!scope.applies_to("edit"));
    }

    #[test]
    fn test_prepend_puts_filter_first() {
        struct Named(&'static str);
        impl Filter for Named {
            fn call(&self, _ctx: &mut ActionContext) -> bool {
                true
            }
            fn name(&self) -> &str {
                self.0
            }
        }

        let mut chain = FilterChain::new();
        chain.append(Named("second"), Scope::all());
        chain.prepend(Named("first"), Scope::all());

        let names: Vec<_> = chain.entries().iter().map(|e| e.filter.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
