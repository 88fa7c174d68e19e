// File: src/demo.rs
// Purpose: Built-in demo application: a blog, a home page and an admin area

use anyhow::{Context, Result};
use axum::http::header;
use railyard::{
    restful_routes, ActionContext, Controller, ControllerConfig, ControllerRegistry, Dispatcher,
    RenderOptions, RouteDef, RouteSet, Router, Scope, StatusCode, TemplateStore, Value,
};
use std::collections::HashMap;
use std::sync::Arc;

struct Post {
    id: u32,
    title: &'static str,
    body: &'static str,
}

const POSTS: &[Post] = &[
    Post {
        id: 1,
        title: "Hello, Railyard",
        body: "Routes are tracks, controllers are stations.",
    },
    Post {
        id: 2,
        title: "Forwarding",
        body: "The root set hands /blog paths over to the blog routes.",
    },
];

fn find_post(ctx: &ActionContext) -> Option<&'static Post> {
    let id: u32 = ctx.param("id")?.parse().ok()?;
    POSTS.iter().find(|post| post.id == id)
}

fn post_value(post: &Post) -> Value {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), Value::from(post.id as f64));
    fields.insert("title".to_string(), Value::from(post.title));
    fields.insert("body".to_string(), Value::from(post.body));
    Value::from(fields)
}

/// Root routes: the home page, the blog forward and the default route
pub fn router() -> Result<Router> {
    let mut root = RouteSet::default();
    root.draw(|map| {
        map.connect(RouteDef::new("/").controller("home").action("index"))?
            .connect(RouteDef::new("/blog->").forward_to("blog"))?
            .connect(RouteDef::new("/$controller/$action/$id"))?;
        Ok(())
    })
    .context("Invalid root routes")?;

    let mut blog = RouteSet::new("blog");
    blog.add(restful_routes()).context("Invalid blog routes")?;

    Router::builder()
        .route_set(root)
        .route_set(blog)
        .build()
        .context("Failed to build demo router")
}

pub fn templates() -> TemplateStore {
    TemplateStore::default()
        .with_layout(
            "application",
            "html",
            "<!DOCTYPE html>\n<html><head><title>{title}</title></head><body>{content}</body></html>",
        )
        .with_template("home/index.html", "<h1>Railyard</h1><p><a href=\"/blog\">Blog</a></p>")
        .with_template("blog/index.html", "<h1>Posts</h1><ul>{posts}</ul>")
        .with_template(
            "blog/show.html",
            "<article><h1>{post.title}</h1><p>{post.body}</p></article>",
        )
        .with_template("admin/index.html", "<h1>Admin</h1><p>{count} posts</p>")
}

/// Filters and layout every demo controller starts from
fn application() -> ControllerConfig {
    Controller::builder("application")
        .before_filter(|ctx: &mut ActionContext| {
            ctx.assign("title", "Railyard");
            true
        })
        .after_filter(|ctx: &mut ActionContext| {
            ctx.set_header("x-railyard-action", format!("{}#{}", ctx.controller, ctx.action));
            true
        })
        .layout("application")
        .build()
        .config()
        .clone()
}

fn blog() -> Controller {
    Controller::builder("blog")
        .inherit(&application())
        .action("index", |ctx: &mut ActionContext| {
            let items: String = POSTS
                .iter()
                .map(|post| format!("<li><a href=\"/blog/{}\">{}</a></li>", post.id, post.title))
                .collect();
            ctx.assign("posts", items);
            Ok(())
        })
        .action("show", |ctx: &mut ActionContext| {
            match find_post(ctx) {
                Some(post) => {
                    ctx.assign("title", post.title);
                    ctx.assign("post", post_value(post));
                }
                None => {
                    ctx.render(
                        RenderOptions::new()
                            .text("<h1>Post not found</h1>")
                            .status(StatusCode::NOT_FOUND),
                    )?;
                }
            }
            Ok(())
        })
        .format_action("json", "show", |ctx: &mut ActionContext| {
            let Some(post) = find_post(ctx) else {
                ctx.render(
                    RenderOptions::new()
                        .text("{\"error\":\"not found\"}")
                        .status(StatusCode::NOT_FOUND)
                        .no_layout(),
                )?;
                return Ok(());
            };
            let json = serde_json::json!({
                "id": post.id,
                "title": post.title,
                "body": post.body,
            });
            ctx.render(RenderOptions::new().text(json.to_string()).no_layout())?;
            Ok(())
        })
        .handler("update_put_action", |ctx: &mut ActionContext| {
            let Some(post) = find_post(ctx) else {
                ctx.render(
                    RenderOptions::new()
                        .text("<h1>Post not found</h1>")
                        .status(StatusCode::NOT_FOUND),
                )?;
                return Ok(());
            };
            tracing::info!(id = post.id, title = ?ctx.param("title"), "Post updated");
            ctx.redirect_to(format!("/blog/{}", post.id))?;
            Ok(())
        })
        .build()
}

fn home() -> Controller {
    Controller::builder("home").inherit(&application()).build()
}

fn admin() -> Controller {
    Controller::builder("admin")
        .inherit(&application())
        .prepend_before_filter(
            |ctx: &mut ActionContext| {
                if ctx.request.get_cookie("admin").map(String::as_str) == Some("1") {
                    return true;
                }
                ctx.set_header(header::CACHE_CONTROL.as_str(), "no-store");
                let _ = ctx.redirect_to("/");
                false
            },
            Scope::all(),
        )
        .action("index", |ctx: &mut ActionContext| {
            ctx.assign("count", POSTS.len() as f64);
            Ok(())
        })
        .build()
}

pub fn controllers() -> ControllerRegistry {
    ControllerRegistry::new()
        .with(home())
        .with(blog())
        .with(admin())
}

/// The whole demo application with in-memory routes and views
#[cfg(test)]
pub fn dispatcher() -> Result<Dispatcher> {
    Ok(Dispatcher::new(
        Arc::new(router()?),
        controllers(),
        Arc::new(templates()),
    ))
}
