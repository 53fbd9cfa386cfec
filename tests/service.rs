//! End-to-end tests for the generic CRUD service
//!
//! Runs the full lifecycle against an in-memory repository whose queryable
//! records the shaped plan and evaluates it over a `Vec` of entities, so no
//! database is needed.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use fetchspec::{
    CrudService, Error, FetchSpecification, Queryable, Repository, Result, ServiceConfig,
    SortDirection,
};

// ==================== In-memory persistence double ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Article {
    id: String,
    title: String,
    status: String,
    secret: String,
}

fn article(id: &str, title: &str, status: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        status: status.to_string(),
        secret: format!("secret-{}", id),
    }
}

/// Recorded query plan, evaluated lazily over the repository contents
#[derive(Debug, Default, Clone)]
struct MemQuery {
    eq: Vec<(String, serde_json::Value)>,
    within: Vec<(String, Vec<serde_json::Value>)>,
    sort: Vec<(String, SortDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Queryable for MemQuery {
    fn select(&mut self, _columns: Vec<String>) {
        // Projection is exercised at the unit level; the in-memory double
        // always hydrates full entities.
    }

    fn join_relation(&mut self, _parent_alias: &str, _relation: &str, _alias: &str) {}

    fn where_eq(&mut self, column: &str, value: serde_json::Value) {
        self.eq.push((column.to_string(), value));
    }

    fn where_in(&mut self, column: &str, values: Vec<serde_json::Value>) {
        self.within.push((column.to_string(), values));
    }

    fn order_by(&mut self, column: &str, direction: SortDirection) {
        self.sort.push((column.to_string(), direction));
    }

    fn limit(&mut self, n: i64) {
        self.limit = Some(n);
    }

    fn offset(&mut self, n: i64) {
        self.offset = Some(n);
    }
}

fn field_of(column: &str) -> &str {
    column.rsplit('.').next().unwrap_or(column)
}

fn field_as_string(entity: &Article, field: &str) -> String {
    let value = serde_json::to_value(entity).expect("entity serializes");
    match value.get(field) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn value_as_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl MemQuery {
    fn matches(&self, entity: &Article) -> bool {
        let eq_ok = self
            .eq
            .iter()
            .all(|(column, value)| field_as_string(entity, field_of(column)) == value_as_string(value));
        let in_ok = self.within.iter().all(|(column, values)| {
            let actual = field_as_string(entity, field_of(column));
            values.iter().any(|v| value_as_string(v) == actual)
        });
        eq_ok && in_ok
    }

    /// Evaluate the plan: filter, sort, count, then apply the page window
    fn eval(&self, items: &[Article]) -> (Vec<Article>, i64) {
        let mut matched: Vec<Article> = items.iter().filter(|e| self.matches(e)).cloned().collect();

        // Later sort keys first so earlier tokens end up higher priority.
        for (column, direction) in self.sort.iter().rev() {
            let field = field_of(column).to_string();
            matched.sort_by(|a, b| {
                let ord = field_as_string(a, &field).cmp(&field_as_string(b, &field));
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let total = matched.len() as i64;
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let mut window: Vec<Article> = matched.into_iter().skip(offset).collect();
        if let Some(limit) = self.limit {
            window.truncate(limit.max(0) as usize);
        }
        (window, total)
    }
}

#[derive(Debug, Default)]
struct MemRepository {
    items: Mutex<Vec<Article>>,
    save_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl MemRepository {
    fn seeded(items: Vec<Article>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    fn snapshot(&self) -> Vec<Article> {
        self.items.lock().unwrap().clone()
    }
}

impl Repository<Article> for MemRepository {
    type Query = MemQuery;

    fn create_query(&self, _alias: &str) -> MemQuery {
        MemQuery::default()
    }

    async fn fetch_many(&self, query: MemQuery) -> Result<Vec<Article>> {
        Ok(query.eval(&self.snapshot()).0)
    }

    async fn fetch_many_and_count(&self, query: MemQuery) -> Result<(Vec<Article>, i64)> {
        Ok(query.eval(&self.snapshot()))
    }

    async fn fetch_one(&self, query: MemQuery) -> Result<Option<Article>> {
        Ok(query.eval(&self.snapshot()).0.into_iter().next())
    }

    async fn save(&self, entity: Article) -> Result<Article> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let mut items = self.items.lock().unwrap();
        match items.iter_mut().find(|e| e.id == entity.id) {
            Some(existing) => *existing = entity.clone(),
            None => items.push(entity.clone()),
        }
        Ok(entity)
    }

    async fn remove(&self, entities: Vec<Article>) -> Result<()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        let mut items = self.items.lock().unwrap();
        items.retain(|e| !entities.iter().any(|r| r.id == e.id));
        Ok(())
    }
}

// ==================== Services under test ====================

#[derive(Debug, Serialize)]
struct ArticleCreate {
    id: String,
    title: String,
    status: String,
    secret: String,
}

#[derive(Debug, Serialize)]
struct ArticleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

struct ArticleService {
    repo: MemRepository,
    config: ServiceConfig,
}

impl ArticleService {
    fn seeded(items: Vec<Article>) -> Self {
        Self {
            repo: MemRepository::seeded(items),
            config: ServiceConfig::builder().alias("article").build(),
        }
    }
}

impl CrudService for ArticleService {
    type Entity = Article;
    type Create = ArticleCreate;
    type Update = ArticleUpdate;
    type Repo = MemRepository;

    fn repository(&self) -> &MemRepository {
        &self.repo
    }

    fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Service whose authorization hook rejects every removal
struct GuardedService {
    inner: ArticleService,
}

impl CrudService for GuardedService {
    type Entity = Article;
    type Create = ArticleCreate;
    type Update = ArticleUpdate;
    type Repo = MemRepository;

    fn repository(&self) -> &MemRepository {
        &self.inner.repo
    }

    fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    fn can_be_removed(&self, _id: &str, _model: &Article) -> bool {
        false
    }
}

/// Service whose post-create hook runs detached and fails
struct FlakyHookService {
    inner: ArticleService,
    hook_ran: Arc<AtomicBool>,
}

impl CrudService for FlakyHookService {
    type Entity = Article;
    type Create = ArticleCreate;
    type Update = ArticleUpdate;
    type Repo = MemRepository;

    fn repository(&self) -> &MemRepository {
        &self.inner.repo
    }

    fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    fn action_after_create(
        &self,
        _model: Article,
        _create: ArticleCreate,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        let hook_ran = self.hook_ran.clone();
        async move {
            hook_ran.store(true, Ordering::SeqCst);
            Err(Error::validation("post-create side effect failed"))
        }
    }
}

fn seed() -> Vec<Article> {
    vec![article("1", "b", "published"), article("2", "a", "draft")]
}

// ==================== find_all ====================

#[tokio::test]
async fn test_find_all_sorts_and_counts() {
    let service = ArticleService::seeded(seed());
    let spec = FetchSpecification::new()
        .with_sort(["title"])
        .with_pagination(10, 1);

    let (items, total) = service.find_all(&spec, None).await.unwrap();

    assert_eq!(total, 2);
    assert_eq!(items[0]["id"], "2");
    assert_eq!(items[1]["id"], "1");
}

#[tokio::test]
async fn test_find_all_descending_sort() {
    let service = ArticleService::seeded(seed());
    let spec = FetchSpecification::new().with_sort(["-title"]);

    let (items, _) = service.find_all(&spec, None).await.unwrap();

    assert_eq!(items[0]["id"], "1");
    assert_eq!(items[1]["id"], "2");
}

#[tokio::test]
async fn test_find_all_pagination_windows_results_but_not_count() {
    let mut entities = seed();
    entities.push(article("3", "c", "published"));
    let service = ArticleService::seeded(entities);

    let spec = FetchSpecification::new()
        .with_sort(["title"])
        .with_pagination(2, 2);

    let (items, total) = service.find_all(&spec, None).await.unwrap();

    assert_eq!(total, 3);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "c");
}

#[tokio::test]
async fn test_find_all_applies_attribute_filters() {
    let service = ArticleService::seeded(seed());
    let spec = FetchSpecification::new().with_filter("status", ["published"]);

    let (items, total) = service.find_all(&spec, None).await.unwrap();

    assert_eq!(total, 1);
    assert_eq!(items[0]["id"], "1");
}

#[tokio::test]
async fn test_find_all_strips_omitted_fields_even_when_selected() {
    let service = ArticleService::seeded(seed());
    let spec = FetchSpecification::new()
        .with_fields(["id", "secret"])
        .with_omit_fields(["secret"]);

    let (items, _) = service.find_all(&spec, None).await.unwrap();

    for item in &items {
        assert!(item.get("secret").is_none());
        assert!(item.get("id").is_some());
    }
}

#[tokio::test]
async fn test_find_all_raw_reports_length_as_count() {
    let mut entities = seed();
    entities.push(article("3", "c", "published"));
    let service = ArticleService::seeded(entities);

    let spec = FetchSpecification::new().with_pagination(2, 1);
    let (items, total) = service.find_all_raw(&spec, None).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(total, 2);
}

// ==================== get_by_id ====================

#[tokio::test]
async fn test_get_by_id_returns_matching_entity() {
    let service = ArticleService::seeded(seed());
    let item = service
        .get_by_id("2", &FetchSpecification::new())
        .await
        .unwrap();

    assert_eq!(item["id"], "2");
    assert_eq!(item["title"], "a");
}

#[tokio::test]
async fn test_get_by_id_strips_omitted_fields() {
    let service = ArticleService::seeded(seed());
    let spec = FetchSpecification::new().with_omit_fields(["secret"]);

    let item = service.get_by_id("1", &spec).await.unwrap();

    assert!(item.get("secret").is_none());
    assert_eq!(item["title"], "b");
}

#[tokio::test]
async fn test_get_by_id_missing_is_not_found_without_mutation() {
    let service = ArticleService::seeded(seed());

    let result = service.get_by_id("999", &FetchSpecification::new()).await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(service.repo.save_calls.load(Ordering::SeqCst), 0);
    assert_eq!(service.repo.remove_calls.load(Ordering::SeqCst), 0);
}

// ==================== create ====================

#[tokio::test]
async fn test_create_persists_and_returns_entity() {
    let service = ArticleService::seeded(Vec::new());

    let created = service
        .create(ArticleCreate {
            id: "10".to_string(),
            title: "fresh".to_string(),
            status: "draft".to_string(),
            secret: "s".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(created.id, "10");
    assert_eq!(service.repo.snapshot().len(), 1);
    assert_eq!(service.repo.save_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_create_succeeds_even_when_post_action_hook_fails() {
    let hook_ran = Arc::new(AtomicBool::new(false));
    let service = FlakyHookService {
        inner: ArticleService::seeded(Vec::new()),
        hook_ran: hook_ran.clone(),
    };

    let created = service
        .create(ArticleCreate {
            id: "11".to_string(),
            title: "t".to_string(),
            status: "draft".to_string(),
            secret: "s".to_string(),
        })
        .await;

    assert!(created.is_ok());

    // The hook runs on a detached task; yield until it has been scheduled.
    for _ in 0..100 {
        if hook_ran.load(Ordering::SeqCst) {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(hook_ran.load(Ordering::SeqCst));
}

// ==================== update ====================

#[tokio::test]
async fn test_update_shallow_merges_and_persists() {
    let service = ArticleService::seeded(seed());

    let updated = service
        .update(
            "1",
            ArticleUpdate {
                title: Some("renamed".to_string()),
                status: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "renamed");
    // Untouched fields survive the merge.
    assert_eq!(updated.status, "published");
    assert_eq!(updated.secret, "secret-1");

    let stored = service.repo.snapshot();
    assert_eq!(
        stored.iter().find(|e| e.id == "1").unwrap().title,
        "renamed"
    );
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let service = ArticleService::seeded(seed());

    let result = service
        .update(
            "999",
            ArticleUpdate {
                title: Some("x".to_string()),
                status: None,
            },
        )
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(service.repo.save_calls.load(Ordering::SeqCst), 0);
}

// ==================== remove / remove_many ====================

#[tokio::test]
async fn test_remove_deletes_matching_entity() {
    let service = ArticleService::seeded(seed());

    service.remove("1").await.unwrap();

    let remaining = service.repo.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "2");
}

#[tokio::test]
async fn test_remove_missing_is_not_found() {
    let service = ArticleService::seeded(seed());
    let result = service.remove("999").await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_remove_rejected_by_hook_is_forbidden_without_mutation() {
    let service = GuardedService {
        inner: ArticleService::seeded(seed()),
    };

    let result = service.remove("1").await;

    assert!(matches!(result, Err(Error::Forbidden(_))));
    assert_eq!(service.inner.repo.snapshot().len(), 2);
    assert_eq!(service.inner.repo.remove_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_remove_many_skips_unknown_ids_silently() {
    let service = ArticleService::seeded(seed());

    service
        .remove_many(&["1".to_string(), "999".to_string()])
        .await
        .unwrap();

    let remaining = service.repo.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "2");
}

#[tokio::test]
async fn test_remove_many_empty_set_issues_no_removal_call() {
    let service = ArticleService::seeded(seed());

    service.remove_many(&[]).await.unwrap();

    assert_eq!(service.repo.remove_calls.load(Ordering::SeqCst), 0);
    assert_eq!(service.repo.snapshot().len(), 2);
}

#[tokio::test]
async fn test_remove_many_no_matches_issues_no_removal_call() {
    let service = ArticleService::seeded(seed());

    service.remove_many(&["998".to_string()]).await.unwrap();

    assert_eq!(service.repo.remove_calls.load(Ordering::SeqCst), 0);
}
