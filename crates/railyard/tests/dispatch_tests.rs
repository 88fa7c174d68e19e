use pretty_assertions::assert_eq;
use railyard::{
    ActionContext, ActionResolver, Controller, ControllerBuilder, ControllerRegistry, DispatchError, Dispatcher,
    Outcome, RenderOptions, RequestContext, Rung, Scope, StatusCode, TemplateStore,
};
use railyard_router::{RouteDef, RouteRequest, RouteSet, Router};
use rstest::rstest;
use std::sync::{Arc, Mutex};

fn router() -> Arc<Router> {
    let mut root = RouteSet::default();
    root.connect(RouteDef::new("/blog->").forward_to("blog"))
        .unwrap()
        .connect(RouteDef::new("/$controller/$action/$id"))
        .unwrap();

    let mut blog = RouteSet::new("blog");
    blog.connect(RouteDef::new("/$id").action("show").requirement("id", r"^\d+$"))
        .unwrap()
        .connect(RouteDef::new("/").action("index"))
        .unwrap();

    Arc::new(
        Router::builder()
            .route_set(root)
            .route_set(blog)
            .build()
            .unwrap(),
    )
}

fn dispatcher(controllers: ControllerRegistry, store: TemplateStore) -> Dispatcher {
    Dispatcher::new(router(), controllers, Arc::new(store))
}

fn body(outcome: Outcome) -> String {
    outcome.response().body().to_string()
}

fn say(text: &'static str) -> impl Fn(&mut ActionContext) -> anyhow::Result<()> + Send + Sync {
    move |ctx: &mut ActionContext| {
        ctx.render_text(text)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Action resolution
// ---------------------------------------------------------------------------

/// Every rung populated for `show`; removing the more specific ones exposes
/// the next rung down.
fn ladder(levels: usize) -> Controller {
    let mut builder = Controller::builder("store");
    let all: Vec<Box<dyn Fn(ControllerBuilder) -> ControllerBuilder>> = vec![
        Box::new(|b: ControllerBuilder| b.format_method_action("html", "get", "show", say("format_method_action"))),
        Box::new(|b: ControllerBuilder| b.format_action("html", "show", say("format_action"))),
        Box::new(|b: ControllerBuilder| b.action("show", say("action"))),
        Box::new(|b: ControllerBuilder| b.handler("show_get_html_action", say("show_get_html_action"))),
        Box::new(|b: ControllerBuilder| b.handler("show_get_action", say("show_get_action"))),
        Box::new(|b: ControllerBuilder| b.handler("show_html_action", say("show_html_action"))),
        Box::new(|b: ControllerBuilder| b.handler("show_action", say("show_action"))),
    ];
    for add in all.into_iter().skip(7 - levels) {
        builder = add(builder);
    }
    builder.build()
}

#[rstest]
#[case(7, Rung::FormatMethodAction, "format_method_action")]
#[case(6, Rung::FormatAction, "format_action")]
#[case(5, Rung::Action, "action")]
#[case(4, Rung::ActionMethodFormatHandler, "show_get_html_action")]
#[case(3, Rung::ActionMethodHandler, "show_get_action")]
#[case(2, Rung::ActionFormatHandler, "show_html_action")]
#[case(1, Rung::ActionHandler, "show_action")]
fn test_resolver_precedence(#[case] levels: usize, #[case] rung: Rung, #[case] output: &str) {
    let store = TemplateStore::default().with_template("store/show.html", "template");
    let matched = router().recognize(&RouteRequest::get("/store/show/1")).unwrap();

    let resolved = ActionResolver::resolve(&matched, &ladder(levels), &store).unwrap();
    assert_eq!(resolved.rung, rung);

    let d = dispatcher(ControllerRegistry::new().with(ladder(levels)), store);
    assert_eq!(body(d.dispatch(RequestContext::get("/store/show/1")).unwrap()), output);
}

#[test]
fn test_template_only_action_renders_template() {
    let store = TemplateStore::default().with_template("store/show.html", "item {id}");
    let matched = router().recognize(&RouteRequest::get("/store/show/9")).unwrap();
    let resolved = ActionResolver::resolve(&matched, &ladder(0), &store).unwrap();
    assert_eq!(resolved.rung, Rung::Template);

    let d = dispatcher(ControllerRegistry::new().with(ladder(0)), store);
    assert_eq!(body(d.dispatch(RequestContext::get("/store/show/9")).unwrap()), "item 9");
}

#[test]
fn test_no_handler_no_template_is_not_found() {
    let d = dispatcher(
        ControllerRegistry::new().with(ladder(0)),
        TemplateStore::default(),
    );
    assert!(d.dispatch(RequestContext::get("/store/show/9")).unwrap().is_not_found());
}

#[test]
fn test_method_and_format_pick_handler() {
    let controller = Controller::builder("store")
        .handler("update_post_action", say("post"))
        .handler("update_action", say("any"))
        .format_action("json", "update", say("json"))
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), TemplateStore::default());

    assert_eq!(body(d.dispatch(RequestContext::post("/store/update/1")).unwrap()), "post");
    assert_eq!(body(d.dispatch(RequestContext::get("/store/update/1")).unwrap()), "any");
    assert_eq!(body(d.dispatch(RequestContext::get("/store/update/1.json")).unwrap()), "json");
}

#[test]
fn test_camel_case_action_is_normalized() {
    let controller = Controller::builder("store").action("list_all", say("all")).build();
    let d = dispatcher(ControllerRegistry::new().with(controller), TemplateStore::default());
    assert_eq!(body(d.dispatch(RequestContext::get("/store/listAll")).unwrap()), "all");
    assert_eq!(body(d.dispatch(RequestContext::get("/store/list-all")).unwrap()), "all");
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[test]
fn test_before_filter_halts_everything() {
    let calls = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let (first, second, action, after) = (calls.clone(), calls.clone(), calls.clone(), calls.clone());

    let controller = Controller::builder("store")
        .before_filter(move |ctx: &mut ActionContext| {
            first.lock().unwrap().push("guard");
            ctx.set_status(StatusCode::FORBIDDEN);
            ctx.content = "denied".to_string();
            false
        })
        .before_filter(move |_ctx: &mut ActionContext| {
            second.lock().unwrap().push("second");
            true
        })
        .action("show", move |_ctx: &mut ActionContext| {
            action.lock().unwrap().push("action");
            Ok(())
        })
        .after_filter(move |_ctx: &mut ActionContext| {
            after.lock().unwrap().push("after");
            true
        })
        .build();

    let d = dispatcher(ControllerRegistry::new().with(controller), TemplateStore::default());
    let outcome = d.dispatch(RequestContext::get("/store/show/1")).unwrap();

    assert!(matches!(outcome, Outcome::Halted(_)));
    let response = outcome.response();
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(response.body(), "denied");
    assert_eq!(*calls.lock().unwrap(), vec!["guard"]);
}

#[test]
fn test_halting_filter_can_redirect() {
    let controller = Controller::builder("store")
        .before_filter(|ctx: &mut ActionContext| {
            if ctx.request.get_cookie("session").is_some() {
                return true;
            }
            let _ = ctx.redirect_to("/login");
            false
        })
        .action("show", say("secret"))
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), TemplateStore::default());

    let response = d.dispatch(RequestContext::get("/store/show/1")).unwrap().response();
    assert!(response.is_redirect());
    assert_eq!(response.get_header("location"), Some("/login"));

    let request = RequestContext::get("/store/show/1").with_header("cookie", "session=1");
    assert_eq!(body(d.dispatch(request).unwrap()), "secret");
}

#[rstest]
#[case("show", "[show]")]
#[case("edit", "<edit>")]
#[case("index", "index")]
fn test_only_and_except_scoping(#[case] action: &str, #[case] expected: &str) {
    let controller = Controller::builder("store")
        .action("show", say("show"))
        .action("edit", say("edit"))
        .action("index", say("index"))
        .after_filter_scoped(
            |ctx: &mut ActionContext| {
                ctx.content = format!("[{}]", ctx.content);
                true
            },
            Scope::only(["show"]),
        )
        .after_filter_scoped(
            |ctx: &mut ActionContext| {
                ctx.content = format!("<{}>", ctx.content);
                true
            },
            Scope::except(["show", "index"]),
        )
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), TemplateStore::default());

    let path = format!("/store/{}/1", action);
    assert_eq!(body(d.dispatch(RequestContext::get(path)).unwrap()), expected);
}

#[test]
fn test_after_filters_run_in_order_on_shared_content() {
    let controller = Controller::builder("store")
        .action("show", say("x"))
        .after_filter(|ctx: &mut ActionContext| {
            ctx.content.push('1');
            true
        })
        .after_filter(|ctx: &mut ActionContext| {
            ctx.content.push('2');
            true
        })
        .prepend_after_filter(
            |ctx: &mut ActionContext| {
                ctx.content.push('0');
                true
            },
            Scope::all(),
        )
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), TemplateStore::default());
    assert_eq!(body(d.dispatch(RequestContext::get("/store/show")).unwrap()), "x012");
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

fn layouts() -> TemplateStore {
    TemplateStore::default()
        .with_layout("application", "html", "<app>{content}</app>")
        .with_layout("admin", "html", "<admin>{content}</admin>")
        .with_layout("dark", "html", "<dark>{content}</dark>")
}

#[test]
fn test_static_and_scoped_layouts() {
    let controller = Controller::builder("store")
        .action("show", say("s"))
        .action("edit", say("e"))
        .layout_scoped("admin", Scope::only(["edit"]))
        .layout("application")
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), layouts());

    assert_eq!(body(d.dispatch(RequestContext::get("/store/show")).unwrap()), "<app>s</app>");
    assert_eq!(body(d.dispatch(RequestContext::get("/store/edit")).unwrap()), "<admin>e</admin>");
}

#[test]
fn test_dynamic_layout() {
    let controller = Controller::builder("store")
        .action("show", say("s"))
        .dynamic_layout(|ctx: &ActionContext| ctx.param("theme").map(str::to_string))
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), layouts());

    let request = RequestContext::get("/store/show").with_query("theme", "dark");
    assert_eq!(body(d.dispatch(request).unwrap()), "<dark>s</dark>");
    assert_eq!(body(d.dispatch(RequestContext::get("/store/show")).unwrap()), "s");
}

#[test]
fn test_render_overrides_layout() {
    let controller = Controller::builder("store")
        .action("show", |ctx: &mut ActionContext| {
            ctx.render(RenderOptions::new().text("s").layout("admin"))?;
            Ok(())
        })
        .action("raw", |ctx: &mut ActionContext| {
            ctx.render(RenderOptions::new().text("r").no_layout())?;
            Ok(())
        })
        .layout("application")
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), layouts());

    assert_eq!(body(d.dispatch(RequestContext::get("/store/show")).unwrap()), "<admin>s</admin>");
    assert_eq!(body(d.dispatch(RequestContext::get("/store/raw")).unwrap()), "r");
}

#[test]
fn test_missing_layout_template_keeps_raw_content() {
    let controller = Controller::builder("store")
        .action("show", say("s"))
        .layout("nowhere")
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), layouts());
    assert_eq!(body(d.dispatch(RequestContext::get("/store/show")).unwrap()), "s");
}

#[test]
fn test_redirect_skips_layout() {
    let controller = Controller::builder("store")
        .action("create", |ctx: &mut ActionContext| {
            ctx.redirect_to("/store/show")?;
            Ok(())
        })
        .layout("application")
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), layouts());

    let response = d.dispatch(RequestContext::post("/store/create")).unwrap().response();
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.body(), "");
}

// ---------------------------------------------------------------------------
// Rendering errors and forwarding
// ---------------------------------------------------------------------------

#[test]
fn test_double_render_is_an_error() {
    let controller = Controller::builder("store")
        .action("show", |ctx: &mut ActionContext| {
            ctx.render_text("one")?;
            ctx.render_text("two")?;
            Ok(())
        })
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), TemplateStore::default());

    let err = d.dispatch(RequestContext::get("/store/show")).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::DoubleRender { ref controller, ref action } if controller == "store" && action == "show"
    ));
}

#[test]
fn test_forwarded_request_reaches_target_controller() {
    let blog = Controller::builder("blog")
        .action("show", |ctx: &mut ActionContext| {
            let id = ctx.param("id").unwrap_or_default().to_string();
            ctx.assign("id", id);
            Ok(())
        })
        .action("index", say("all posts"))
        .layout("application")
        .build();
    let store = layouts().with_template("blog/show.html", "post {id}");
    let d = dispatcher(ControllerRegistry::new().with(blog), store);

    assert_eq!(
        body(d.dispatch(RequestContext::get("/blog/42")).unwrap()),
        "<app>post 42</app>"
    );
    assert_eq!(
        body(d.dispatch(RequestContext::get("/blog")).unwrap()),
        "<app>all posts</app>"
    );
    assert!(d.dispatch(RequestContext::get("/blog/abc")).unwrap().is_not_found());
}

#[test]
fn test_redirect_to_generated_url() {
    let controller = Controller::builder("store")
        .action("update", |ctx: &mut ActionContext| {
            let options = railyard::UrlOptions::new().action("show").id("5");
            ctx.redirect_to_url(&options)?;
            Ok(())
        })
        .build();
    let d = dispatcher(ControllerRegistry::new().with(controller), TemplateStore::default());

    let response = d.dispatch(RequestContext::post("/store/update/5")).unwrap().response();
    assert_eq!(response.get_header("location"), Some("/store/show/5"));
}
