use std::fmt::Write as _;

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::client::TaskRepository;
use crate::models::{parse_date_field, CreateTaskDto, RangeBound, StatusFilter, Task};
use crate::view::{PageController, PageView, ViewController};

#[derive(Deserialize)]
struct FilterForm {
    status: StatusFilter,
}

#[derive(Deserialize)]
struct RangeForm {
    bound: String,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct PageForm {
    page: usize,
}

#[derive(Deserialize)]
struct AddForm {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    due: String,
}

#[derive(Deserialize)]
struct IdForm {
    id: String,
}

pub fn router<R: TaskRepository + 'static>(state: PageController<R>) -> Router {
    Router::new()
        .route("/", get(index::<R>))
        .route("/filter", post(set_filter::<R>))
        .route("/range", post(set_range::<R>))
        .route("/page", post(set_page::<R>))
        .route("/add/open", post(open_add::<R>))
        .route("/add/close", post(close_add::<R>))
        .route("/add", post(add_task::<R>))
        .route("/toggle", post(toggle_task::<R>))
        .route("/delete", post(request_delete::<R>))
        .route("/delete/confirm", post(confirm_delete::<R>))
        .route("/delete/cancel", post(cancel_delete::<R>))
        .with_state(state)
}

async fn index<R: TaskRepository>(State(state): State<PageController<R>>) -> Html<String> {
    let mut view = state.view().await;
    let page = view.project(&state.store().snapshot());
    let notice = view.take_notice();
    Html(render_page(&page, &view, notice.as_deref(), Utc::now()))
}

async fn set_filter<R: TaskRepository>(
    State(state): State<PageController<R>>,
    Form(form): Form<FilterForm>,
) -> Response {
    state.view().await.set_filter(form.status);
    redirect_home()
}

async fn set_range<R: TaskRepository>(
    State(state): State<PageController<R>>,
    Form(form): Form<RangeForm>,
) -> Response {
    let bound = match form.bound.as_str() {
        "start" => RangeBound::Start,
        "end" => RangeBound::End,
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };
    let mut view = state.view().await;
    match parse_date_field(&form.value) {
        Ok(value) => {
            if let Err(err) = view.edit_range(bound, value) {
                view.notify(err.to_string());
            }
        }
        Err(_) => view.notify(format!("Invalid date `{}`", form.value)),
    }
    redirect_home()
}

async fn set_page<R: TaskRepository>(
    State(state): State<PageController<R>>,
    Form(form): Form<PageForm>,
) -> Response {
    match state.view().await.set_page(form.page) {
        Ok(()) => redirect_home(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn open_add<R: TaskRepository>(State(state): State<PageController<R>>) -> Response {
    state.view().await.open_add();
    redirect_home()
}

async fn close_add<R: TaskRepository>(State(state): State<PageController<R>>) -> Response {
    state.view().await.close_add();
    redirect_home()
}

async fn add_task<R: TaskRepository>(
    State(state): State<PageController<R>>,
    Form(form): Form<AddForm>,
) -> Response {
    let title = form.title.trim().to_string();
    let Ok(due) = parse_date_field(&form.due) else {
        let draft = CreateTaskDto {
            title,
            description: form.description,
            due: None,
        };
        state
            .view()
            .await
            .reject_add(draft, format!("Invalid due date `{}`", form.due));
        return redirect_home();
    };
    let dto = CreateTaskDto {
        title,
        description: form.description,
        due,
    };
    if let Err(err) = state.submit_add(dto).await {
        warn!(error = %err, "task creation rejected");
    }
    redirect_home()
}

async fn toggle_task<R: TaskRepository>(
    State(state): State<PageController<R>>,
    Form(form): Form<IdForm>,
) -> Response {
    let Some(task) = state.store().find(&form.id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Err(err) = state.toggle(&task).await {
        warn!(error = %err, id = %task.id, "toggle failed");
    }
    redirect_home()
}

async fn request_delete<R: TaskRepository>(
    State(state): State<PageController<R>>,
    Form(form): Form<IdForm>,
) -> Response {
    let Some(task) = state.store().find(&form.id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    state.view().await.request_delete(task);
    redirect_home()
}

async fn confirm_delete<R: TaskRepository>(State(state): State<PageController<R>>) -> Response {
    if let Err(err) = state.confirm_delete().await {
        warn!(error = %err, "delete failed");
    }
    redirect_home()
}

async fn cancel_delete<R: TaskRepository>(State(state): State<PageController<R>>) -> Response {
    state.view().await.cancel_delete();
    redirect_home()
}

fn redirect_home() -> Response {
    (StatusCode::SEE_OTHER, [(header::LOCATION, "/")]).into_response()
}

fn render_page(
    page: &PageView,
    view: &ViewController,
    notice: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let mut body = String::new();
    body.push_str(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>My Tasks</title>
  <style>
    :root {
      color-scheme: light;
      font-family: "Karla", system-ui, -apple-system, sans-serif;
      background: #f4f5f7;
    }
    body {
      margin: 0;
      padding: 32px;
      display: flex;
      justify-content: center;
    }
    .app {
      width: min(600px, 100%);
    }
    h1 {
      margin: 0 0 16px 0;
      font-size: 32px;
      text-transform: uppercase;
      letter-spacing: -0.05em;
    }
    form {
      display: inline;
    }
    button {
      border: none;
      border-radius: 999px;
      padding: 8px 14px;
      background: #e2e8f0;
      color: #0f172a;
      font-weight: 600;
      cursor: pointer;
    }
    .range, .tabs, .pager {
      display: flex;
      gap: 8px;
      align-items: center;
      flex-wrap: wrap;
      margin-bottom: 16px;
    }
    .tabs button.active {
      background: #111827;
      color: white;
    }
    .error, .notice {
      color: #b91c1c;
    }
    .todo-list {
      display: grid;
      gap: 12px;
      padding: 0;
      list-style: none;
    }
    .todo {
      padding: 16px;
      border-radius: 12px;
      background: #1f2937;
      color: #f8fafc;
    }
    .todo .top {
      display: flex;
      justify-content: space-between;
      margin-bottom: 8px;
    }
    .todo .title.done {
      text-decoration: line-through;
      opacity: 0.6;
    }
    .todo .description {
      color: #94a3b8;
    }
    .status {
      padding: 4px 10px;
      border-radius: 999px;
      background: #2563eb;
    }
    .status.done {
      background: #16a34a;
    }
    .due {
      padding: 4px 10px;
      border-radius: 999px;
      background: #f8fafc;
      color: #0f172a;
    }
    .due.warning {
      background: #f97316;
      color: #f8fafc;
    }
    .due.overdue {
      background: #dc2626;
      color: #f8fafc;
    }
    .new-task {
      width: 100%;
      margin-top: 32px;
      padding: 16px;
      background: #f9a8d4;
    }
    .modal {
      border: 1px solid #e2e8f0;
      border-radius: 16px;
      background: #ffffff;
      padding: 24px;
      margin-top: 24px;
    }
    .modal label {
      display: block;
      margin-top: 12px;
      font-weight: 600;
    }
    .modal input, .modal textarea {
      width: 100%;
      padding: 10px;
      border-radius: 10px;
      border: 1px solid #e2e8f0;
      box-sizing: border-box;
    }
  </style>
</head>
<body>
  <div class="app">
    <h1>My Tasks</h1>
"#,
    );

    render_range(&mut body, page);
    render_tabs(&mut body, page.filter);

    if let Some(error) = &page.error {
        let _ = writeln!(body, r#"    <p class="error">{}</p>"#, html_escape(error));
    }
    if let Some(notice) = notice {
        let _ = writeln!(body, r#"    <p class="notice">{}</p>"#, html_escape(notice));
    }

    body.push_str("    <ul class=\"todo-list\">\n");
    if page.loading {
        body.push_str("      <li>Loading tasks…</li>\n");
    } else if page.tasks.is_empty() {
        body.push_str("      <li>No tasks here.</li>\n");
    } else {
        for task in &page.tasks {
            render_task(&mut body, task, now);
        }
    }
    body.push_str("    </ul>\n");

    render_pager(&mut body, page);

    body.push_str(
        r#"    <form method="post" action="/add/open"><button class="new-task" type="submit">Create a new task</button></form>
"#,
    );

    if view.is_add_open() {
        render_add_form(&mut body, view.add_draft(), view.add_error(), now.date_naive());
    }
    if let Some(task) = view.pending_delete() {
        render_delete_confirm(&mut body, task);
    }

    body.push_str(
        r#"  </div>
</body>
</html>"#,
    );
    body
}

fn render_range(body: &mut String, page: &PageView) {
    body.push_str("    <div class=\"range\">\n      <span>Created:</span>\n");
    for (bound, value) in [("start", page.range.start), ("end", page.range.end)] {
        let value = value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        let _ = writeln!(
            body,
            r#"      <form method="post" action="/range">
        <input type="hidden" name="bound" value="{bound}" />
        <input type="date" name="value" value="{value}" aria-label="{bound} date" />
        <button type="submit">Set</button>
      </form>"#
        );
        if !value.is_empty() {
            let _ = writeln!(
                body,
                r#"      <form method="post" action="/range">
        <input type="hidden" name="bound" value="{bound}" />
        <input type="hidden" name="value" value="" />
        <button type="submit" aria-label="Clear {bound} date">×</button>
      </form>"#
            );
        }
    }
    body.push_str("    </div>\n");
}

fn render_tabs(body: &mut String, current: StatusFilter) {
    body.push_str("    <div class=\"tabs\">\n");
    for filter in StatusFilter::ALL {
        let class = if filter == current { "active" } else { "" };
        let _ = writeln!(
            body,
            r#"      <form method="post" action="/filter"><input type="hidden" name="status" value="{key}" /><button class="{class}" type="submit">{label}</button></form>"#,
            key = filter.key(),
            label = filter.label(),
        );
    }
    body.push_str("    </div>\n");
}

fn render_task(body: &mut String, task: &Task, now: DateTime<Utc>) {
    let status_class = if task.complete { "status done" } else { "status" };
    let title_class = if task.complete { "title done" } else { "title" };
    let toggle_label = if task.complete { "Reopen" } else { "Done" };
    let _ = writeln!(
        body,
        r#"      <li class="todo">
        <div class="top">
          <span class="{status_class}">{status}</span>
          <span class="{due_class}">{due}</span>
        </div>
        <div class="{title_class}">{title}</div>"#,
        status = task.status_label(),
        due_class = task.due_state(now).css_class(),
        due = task.effective_due().format("%d/%m"),
        title = html_escape(&task.title),
    );
    if !task.description.is_empty() {
        let _ = writeln!(
            body,
            r#"        <div class="description">{}</div>"#,
            html_escape(&task.description)
        );
    }
    let _ = writeln!(
        body,
        r#"        <form method="post" action="/toggle"><input type="hidden" name="id" value="{id}" /><button type="submit">{toggle_label}</button></form>
        <form method="post" action="/delete"><input type="hidden" name="id" value="{id}" /><button type="submit">Delete</button></form>
      </li>"#,
        id = html_escape(&task.id),
    );
}

fn render_pager(body: &mut String, page: &PageView) {
    if page.total_pages <= 1 {
        return;
    }
    body.push_str("    <div class=\"pager\">\n");
    if page.has_prev() {
        let _ = writeln!(
            body,
            r#"      <form method="post" action="/page"><input type="hidden" name="page" value="{}" /><button type="submit">Previous</button></form>"#,
            page.page - 1
        );
    }
    let _ = writeln!(
        body,
        "      <span>Page {} of {}</span>",
        page.page, page.total_pages
    );
    if page.has_next() {
        let _ = writeln!(
            body,
            r#"      <form method="post" action="/page"><input type="hidden" name="page" value="{}" /><button type="submit">Next</button></form>"#,
            page.page + 1
        );
    }
    body.push_str("    </div>\n");
}

fn render_add_form(
    body: &mut String,
    draft: Option<&CreateTaskDto>,
    error: Option<&str>,
    today: NaiveDate,
) {
    // a rejected submission comes back with what was typed
    let (title, description, due) = match draft {
        Some(draft) => (
            html_escape(&draft.title),
            html_escape(&draft.description),
            draft.due.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        ),
        None => (String::new(), String::new(), today.format("%Y-%m-%d").to_string()),
    };
    let _ = writeln!(
        body,
        r#"    <div class="modal">
      <h2>Less juggling, more chill. Add your task and relax.</h2>
      <form method="post" action="/add" style="display:block">
        <label for="title">Title*</label>
        <input id="title" type="text" name="title" value="{title}" placeholder="Task name" required />
        <label for="due">Due date*</label>
        <input id="due" type="date" name="due" value="{due}" />
        <label for="description">Task description*</label>
        <textarea id="description" name="description" placeholder="Your message">{description}</textarea>
        <button type="submit">Create task</button>
      </form>
      <form method="post" action="/add/close"><button type="submit">Close</button></form>"#,
    );
    if let Some(error) = error {
        let _ = writeln!(body, r#"      <p class="error">{}</p>"#, html_escape(error));
    }
    body.push_str("    </div>\n");
}

fn render_delete_confirm(body: &mut String, task: &Task) {
    let _ = writeln!(
        body,
        r#"    <div class="modal">
      <h2>Are you sure you want to delete this task?</h2>
      <p>{title}</p>
      <p>This action cannot be undone.</p>
      <form method="post" action="/delete/cancel"><button type="submit">Go back</button></form>
      <form method="post" action="/delete/confirm"><button type="submit">Yes, delete</button></form>
    </div>"#,
        title = html_escape(&task.title),
    );
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
