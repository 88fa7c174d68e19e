// File: src/dispatch.rs
// Purpose: Recognize, resolve, filter, run, render and lay out one request

use crate::context::ActionContext;
use crate::controller::ControllerRegistry;
use crate::error::{DispatchError, RenderError};
use crate::request_context::RequestContext;
use crate::resolver::ActionResolver;
use crate::response::Response;
use crate::templating::Templating;
use axum::response::{IntoResponse, Response as HttpResponse};
use railyard_router::Router;
use std::sync::Arc;
use tracing::{debug, error};

/// How a dispatched request ended
#[derive(Debug, Clone)]
pub enum Outcome {
    Rendered(Response),
    /// A before filter stopped the request; the response is what it produced
    Halted(Response),
    /// No route, controller or action matched
    NotFound,
}

impl Outcome {
    /// The response to send; `NotFound` becomes a 404 page
    pub fn response(self) -> Response {
        match self {
            Outcome::Rendered(response) | Outcome::Halted(response) => response,
            Outcome::NotFound => Response::not_found(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Outcome::NotFound)
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> HttpResponse {
        self.response().into_response()
    }
}

/// Runs requests against a router, a set of controllers and a templating
/// collaborator
///
/// Everything held here is immutable after construction; one dispatcher
/// serves concurrent requests.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    controllers: Arc<ControllerRegistry>,
    templating: Arc<dyn Templating>,
}

impl Dispatcher {
    pub fn new(
        router: Arc<Router>,
        controllers: ControllerRegistry,
        templating: Arc<dyn Templating>,
    ) -> Self {
        Self {
            router,
            controllers: Arc::new(controllers),
            templating,
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    pub fn dispatch(&self, mut request: RequestContext) -> Result<Outcome, DispatchError> {
        let route_request = request.route_request();
        let Some(matched) = self.router.recognize(&route_request) else {
            debug!(method = %route_request.method, path = %route_request.path, "No route matched");
            return Ok(Outcome::NotFound);
        };
        request.merge_route_params(&matched);

        let Some(controller) = self.controllers.get(&matched.controller_name) else {
            error!(controller = %matched.controller_name, path = %matched.path, "Unknown controller");
            return Ok(Outcome::NotFound);
        };

        let Some(resolved) = ActionResolver::resolve(&matched, controller, self.templating.as_ref())
        else {
            return Ok(Outcome::NotFound);
        };

        let mut ctx = ActionContext::new(request, matched, Arc::clone(&self.templating))
            .with_router(Arc::clone(&self.router));
        let formats = self.router.formats();

        if !controller.before_filters().before_filters_pass(&mut ctx) {
            return Ok(Outcome::Halted(ctx.into_response(formats)));
        }

        if let Err(err) = resolved.handler.call(&mut ctx) {
            let controller = ctx.controller.clone();
            let action = ctx.action.clone();
            if matches!(err.downcast_ref::<RenderError>(), Some(RenderError::DoubleRender)) {
                error!(controller = %controller, action = %action, "Double render");
                return Err(DispatchError::DoubleRender { controller, action });
            }
            error!(controller = %controller, action = %action, error = %err, "Action failed");
            return Err(DispatchError::Action {
                controller,
                action,
                source: err,
            });
        }

        ctx.render_implicit()?;
        controller.after_filters().apply_after_filters(&mut ctx);
        if !ctx.is_redirect() {
            controller.layouts().render_layout(&mut ctx)?;
        }

        Ok(Outcome::Rendered(ctx.into_response(formats)))
    }
}
