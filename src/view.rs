//! Page-level state: which status tab is selected, the created-date range,
//! the current page, and the add/delete dialogs.
//!
//! [`ViewController`] never touches the task list itself and never awaits.
//! [`PageController`] pairs it with the store: it reads what a mutation needs
//! from the view, releases the view, awaits the store, and only then locks
//! the view again to record the outcome. Renders and other mutations are
//! never held up by a slow service.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, MutexGuard};

use crate::client::TaskRepository;
use crate::error::{Error, Result};
use crate::models::{CreateTaskDto, DateRange, RangeBound, StatusFilter, Task};
use crate::query::{self, DEFAULT_PER_PAGE};
use crate::store::{Snapshot, TaskStore};

/// Everything needed to render one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub tasks: Vec<Task>,
    pub page: usize,
    pub total_pages: usize,
    pub filter: StatusFilter,
    pub range: DateRange,
    pub loading: bool,
    pub error: Option<String>,
}

impl PageView {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug)]
pub struct ViewController {
    filter: StatusFilter,
    range: DateRange,
    page: usize,
    per_page: usize,
    last_total_pages: Option<usize>,
    add_open: bool,
    add_error: Option<String>,
    add_draft: Option<CreateTaskDto>,
    pending_delete: Option<Task>,
    notice: Option<String>,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl ViewController {
    pub fn new(per_page: usize) -> Self {
        Self {
            filter: StatusFilter::default(),
            range: DateRange::default(),
            page: 1,
            per_page: per_page.max(1),
            last_total_pages: None,
            add_open: false,
            add_error: None,
            add_draft: None,
            pending_delete: None,
            notice: None,
        }
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    /// Sets one side of the date range. A pair with `end < start` is rejected
    /// and the previous range kept.
    pub fn edit_range(&mut self, bound: RangeBound, value: Option<NaiveDate>) -> Result<()> {
        let mut next = self.range;
        match bound {
            RangeBound::Start => next.start = value,
            RangeBound::End => next.end = value,
        }
        if let (Some(start), Some(end)) = (next.start, next.end) {
            if end < start {
                return Err(Error::validation(
                    "End date cannot be earlier than start date",
                ));
            }
        }
        if next != self.range {
            self.range = next;
            self.page = 1;
        }
        Ok(())
    }

    pub fn clear_range_bound(&mut self, bound: RangeBound) {
        // clearing one side can never invert the range
        let _ = self.edit_range(bound, None);
    }

    pub fn set_page(&mut self, page: usize) -> Result<()> {
        if page == 0 {
            return Err(Error::validation("Pages start at 1"));
        }
        self.page = page;
        Ok(())
    }

    /// Derives the visible page. If the number of pages changed since the
    /// last projection the page is reset to 1 first.
    pub fn project(&mut self, snapshot: &Snapshot) -> PageView {
        let by_status = query::filter_by_status(&snapshot.tasks, self.filter);
        let filtered = query::filter_by_date_range(&by_status, &self.range);
        let total_pages = query::calculate_total_pages(&filtered, self.per_page);

        if self.last_total_pages != Some(total_pages) {
            self.last_total_pages = Some(total_pages);
            self.page = 1;
        }

        PageView {
            tasks: query::paginate(&filtered, self.page, self.per_page).to_vec(),
            page: self.page,
            total_pages,
            filter: self.filter,
            range: self.range,
            loading: snapshot.loading,
            error: snapshot.error.clone(),
        }
    }

    pub fn is_add_open(&self) -> bool {
        self.add_open
    }

    pub fn add_error(&self) -> Option<&str> {
        self.add_error.as_deref()
    }

    pub fn open_add(&mut self) {
        self.add_open = true;
    }

    pub fn close_add(&mut self) {
        self.add_open = false;
        self.add_error = None;
        self.add_draft = None;
    }

    /// What the user last submitted, kept while the form shows an error.
    pub fn add_draft(&self) -> Option<&CreateTaskDto> {
        self.add_draft.as_ref()
    }

    /// Keeps the form open and populated with `draft`, showing `message`.
    pub fn reject_add(&mut self, draft: CreateTaskDto, message: impl Into<String>) {
        self.add_open = true;
        self.add_error = Some(message.into());
        self.add_draft = Some(draft);
    }

    pub fn pending_delete(&self) -> Option<&Task> {
        self.pending_delete.as_ref()
    }

    pub fn request_delete(&mut self, task: Task) {
        self.pending_delete = Some(task);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Confirms the pending delete: clears it and hands back the task the
    /// store should remove.
    pub fn take_pending_delete(&mut self) -> Option<Task> {
        self.pending_delete.take()
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    /// A one-shot message from a failed toggle or delete.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}

/// The task store plus the page state of its one user.
pub struct PageController<R> {
    store: Arc<TaskStore<R>>,
    view: Arc<Mutex<ViewController>>,
}

impl<R> Clone for PageController<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            view: Arc::clone(&self.view),
        }
    }
}

impl<R: TaskRepository> PageController<R> {
    pub fn new(store: Arc<TaskStore<R>>, view: ViewController) -> Self {
        Self {
            store,
            view: Arc::new(Mutex::new(view)),
        }
    }

    pub fn store(&self) -> &TaskStore<R> {
        &self.store
    }

    /// Locks the page state. Never hold the guard across a store call.
    pub async fn view(&self) -> MutexGuard<'_, ViewController> {
        self.view.lock().await
    }

    /// Submits the add-task form. On failure the form stays open, populated
    /// with what was entered, and shows the message.
    pub async fn submit_add(&self, dto: CreateTaskDto) -> Result<Task> {
        let draft = dto.clone();
        match self.store.create(dto).await {
            Ok(task) => {
                self.view.lock().await.close_add();
                Ok(task)
            }
            Err(err) => {
                self.view.lock().await.reject_add(draft, err.to_string());
                Err(err)
            }
        }
    }

    pub async fn toggle(&self, task: &Task) -> Result<Task> {
        match self.store.toggle_complete(task).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                self.view.lock().await.notify(err.to_string());
                Err(err)
            }
        }
    }

    /// Removes the task awaiting confirmation. Returns `Ok(false)` when there
    /// was nothing to confirm.
    pub async fn confirm_delete(&self) -> Result<bool> {
        let pending = self.view.lock().await.take_pending_delete();
        let Some(task) = pending else {
            return Ok(false);
        };
        if let Err(err) = self.store.remove(&task.id).await {
            self.view.lock().await.notify(err.to_string());
            return Err(err);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_instant;
    use crate::store::tests::{task, FakeRepo};

    fn date(s: &str) -> Option<NaiveDate> {
        Some(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    fn snapshot(tasks: Vec<Task>) -> Snapshot {
        Snapshot {
            tasks,
            loading: false,
            error: None,
        }
    }

    fn open_tasks(n: usize) -> Vec<Task> {
        (1..=n).map(|i| task(&i.to_string(), &format!("Task {i}"), false)).collect()
    }

    #[test]
    fn projects_first_page_of_in_progress() {
        let mut tasks = open_tasks(45);
        tasks.push(task("done", "Done", true));
        let mut view = ViewController::default();

        let page = view.project(&snapshot(tasks));
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.tasks.len(), 20);
        assert_eq!(page.tasks[0].id, "1");
        assert!(!page.has_prev());
        assert!(page.has_next());
    }

    #[test]
    fn page_navigation_and_stability() {
        let snap = snapshot(open_tasks(45));
        let mut view = ViewController::default();
        view.project(&snap);

        view.set_page(3).unwrap();
        let third = view.project(&snap);
        assert_eq!(third.page, 3);
        assert_eq!(third.tasks.len(), 5);
        assert_eq!(third.tasks[0].id, "41");
        assert_eq!(view.project(&snap), third);

        assert!(view.set_page(0).is_err());
        assert_eq!(view.page(), 3);
    }

    #[test]
    fn changing_filter_resets_page() {
        let snap = snapshot(open_tasks(45));
        let mut view = ViewController::default();
        view.project(&snap);
        view.set_page(2).unwrap();

        view.set_filter(StatusFilter::InProgress);
        assert_eq!(view.page(), 2);
        view.set_filter(StatusFilter::Completed);
        assert_eq!(view.page(), 1);
        assert_eq!(view.project(&snap).total_pages, 0);
    }

    #[test]
    fn changing_range_resets_page() {
        let snap = snapshot(open_tasks(45));
        let mut view = ViewController::default();
        view.project(&snap);
        view.set_page(2).unwrap();

        view.edit_range(RangeBound::Start, date("2024-12-01")).unwrap();
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn total_pages_change_resets_page() {
        let mut view = ViewController::default();
        view.project(&snapshot(open_tasks(45)));
        view.set_page(3).unwrap();

        let page = view.project(&snapshot(open_tasks(30)));
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn inverted_range_edit_is_rejected() {
        let mut view = ViewController::default();
        view.edit_range(RangeBound::Start, date("2025-02-01")).unwrap();
        let err = view.edit_range(RangeBound::End, date("2025-01-15")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(view.range(), DateRange::new(date("2025-02-01"), None));

        view.edit_range(RangeBound::End, date("2025-02-01")).unwrap();
        view.clear_range_bound(RangeBound::Start);
        assert_eq!(view.range(), DateRange::new(None, date("2025-02-01")));
    }

    #[test]
    fn range_applies_after_status() {
        let mut tasks = vec![
            task("jan", "Jan", false),
            task("feb", "Feb", false),
            task("mar", "Mar", true),
        ];
        tasks[0].created = parse_instant("2025-01-01T00:00:00Z").unwrap();
        tasks[1].created = parse_instant("2025-02-15T00:00:00Z").unwrap();
        tasks[2].created = parse_instant("2025-03-10T00:00:00Z").unwrap();

        let mut view = ViewController::default();
        view.edit_range(RangeBound::Start, date("2025-02-01")).unwrap();
        let page = view.project(&snapshot(tasks));
        let ids: Vec<_> = page.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["feb"]);
        assert_eq!(page.total_pages, 1);
    }

    async fn page(tasks: Vec<Task>) -> PageController<FakeRepo> {
        let store = Arc::new(TaskStore::new(FakeRepo::with_tasks(tasks)));
        store.load().await.unwrap();
        PageController::new(store, ViewController::default())
    }

    #[tokio::test]
    async fn confirmed_delete_calls_store_once() {
        let page = page(open_tasks(3)).await;

        let target = page.store().find("1").unwrap();
        page.view().await.request_delete(target);
        assert!(page.confirm_delete().await.unwrap());

        let calls = page.store().repository().calls.lock().clone();
        assert_eq!(calls.iter().filter(|c| c.as_str() == "delete:1").count(), 1);
        assert!(page.store().find("1").is_none());
        assert!(page.view().await.pending_delete().is_none());
    }

    #[tokio::test]
    async fn cancelled_delete_makes_no_call() {
        let page = page(open_tasks(3)).await;

        let target = page.store().find("1").unwrap();
        page.view().await.request_delete(target);
        page.view().await.cancel_delete();
        assert!(!page.confirm_delete().await.unwrap());

        assert_eq!(page.store().repository().calls.lock().as_slice(), ["fetch"]);
        assert_eq!(page.store().tasks().len(), 3);
    }

    #[tokio::test]
    async fn failed_delete_surfaces_notice() {
        let page = page(open_tasks(3)).await;
        page.store().repository().fail_with(500);

        let target = page.store().find("2").unwrap();
        page.view().await.request_delete(target);
        assert!(page.confirm_delete().await.is_err());

        let mut view = page.view().await;
        assert!(view.pending_delete().is_none());
        assert_eq!(view.take_notice().as_deref(), Some("failed (500)"));
        assert_eq!(view.take_notice(), None);
        assert_eq!(page.store().tasks().len(), 3);
    }

    #[tokio::test]
    async fn failed_add_keeps_form_populated() {
        let page = page(open_tasks(1)).await;
        page.view().await.open_add();
        page.store().repository().fail_with(400);
        let dto = CreateTaskDto {
            title: "New Task".into(),
            description: "Test description".into(),
            due: date("2025-05-03"),
        };

        assert!(page.submit_add(dto.clone()).await.is_err());
        {
            let view = page.view().await;
            assert!(view.is_add_open());
            assert_eq!(view.add_error(), Some("failed (400)"));
            assert_eq!(view.add_draft(), Some(&dto));
        }

        *page.store().repository().fail_status.lock() = None;
        let created = page.submit_add(dto).await.unwrap();
        let view = page.view().await;
        assert!(!view.is_add_open());
        assert_eq!(view.add_error(), None);
        assert_eq!(view.add_draft(), None);
        assert_eq!(page.store().tasks()[0].id, created.id);
    }

    #[tokio::test]
    async fn view_stays_available_while_a_mutation_is_in_flight() {
        let page = page(open_tasks(2)).await;
        let gate = page.store().repository().hold();

        let p = page.clone();
        let first = page.store().find("1").unwrap();
        let toggle = tokio::spawn(async move { p.toggle(&first).await });
        tokio::task::yield_now().await;
        assert!(page.store().is_pending("1"));

        // page state is free while the toggle waits on the service
        page.view().await.set_filter(StatusFilter::Completed);
        let second = page.store().find("2").unwrap();
        page.toggle(&second).await.unwrap();
        assert!(page.store().find("2").unwrap().complete);

        gate.send(()).unwrap();
        toggle.await.unwrap().unwrap();
        let snapshot = page.store().snapshot();
        assert_eq!(page.view().await.project(&snapshot).tasks.len(), 2);
    }

    #[tokio::test]
    async fn toggle_moves_task_between_tabs() {
        let page = page(open_tasks(2)).await;

        let first = page.store().find("1").unwrap();
        page.toggle(&first).await.unwrap();
        let snapshot = page.store().snapshot();
        let mut view = page.view().await;
        assert_eq!(view.project(&snapshot).tasks.len(), 1);
        view.set_filter(StatusFilter::Completed);
        assert_eq!(view.project(&snapshot).tasks[0].id, "1");
    }

    #[tokio::test]
    async fn failed_toggle_surfaces_notice() {
        let page = page(open_tasks(2)).await;
        page.store().repository().fail_with(404);

        let first = page.store().find("1").unwrap();
        assert!(page.toggle(&first).await.is_err());
        assert_eq!(page.view().await.take_notice().as_deref(), Some("failed (404)"));
        assert!(!page.store().find("1").unwrap().complete);
    }
}
