// # Firestore Document Store
//
// This crate provides a `DocumentStore` backed by the Firestore v1 REST API,
// authenticated as a Firebase email/password user.
//
// ## Implementation Status
//
// - ✅ One HTTP request per store call (plus sign-in/refresh when the token is stale)
// - ✅ Full error propagation to the caller (no retries, no backoff)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401, 403, 404, 429, 5xx)
// - ✅ Field-path merges through `updateMask`
// - ✅ Collection queries through `:runQuery`
// - ❌ NO retry logic (callers decide via `Error::is_transient`)
// - ❌ NO caching of documents
// - ❌ NO realtime listeners
//
// ## Security Requirements
//
// - API key and password NEVER appear in logs
// - Store MUST fail fast if credentials are empty
//
// ## API Reference
//
// - Get: GET `/projects/:project/databases/(default)/documents/:path`
// - Set: PATCH `/...documents/:path`
// - Merge: PATCH `/...documents/:path?updateMask.fieldPaths=a.b&...`
// - Delete: DELETE `/...documents/:path`
// - Query: POST `/...documents/:parent:runQuery`

pub mod auth;
pub mod codec;

use async_trait::async_trait;
use huckleberry_core::config::StoreConfig;
use huckleberry_core::document::{
    CollectionPath, Document, DocumentPath, StoredDocument, set_field,
};
use huckleberry_core::traits::{
    DocumentStore, FieldFilter, FilterOp, Query, SortDirection, StoreFactory,
};
use huckleberry_core::{Error, Result, StoreRegistry};
use serde_json::{Value, json};
use std::time::Duration;

pub use auth::FirebaseAuth;

/// Firestore REST API base URL
const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the shared HTTP client
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

/// Map an unsuccessful HTTP status to an error
pub(crate) fn status_error(service: &str, status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: authentication failed or permission denied. Status: {}",
            service, status
        )),
        404 => Error::not_found(format!("{}: {}", service, body)),
        429 => Error::rate_limited(format!(
            "{}: rate limit exceeded. Please retry later. Status: {}",
            service, status
        )),
        500..=599 => Error::http(format!(
            "{} server error (transient): {} - {}",
            service, status, body
        )),
        _ => Error::provider(service, format!("request failed: {} - {}", status, body)),
    }
}

/// Firestore document store
///
/// # Security
///
/// The Debug implementation does NOT expose credentials.
pub struct FirestoreStore {
    project_id: String,
    /// `.../projects/:project/databases/(default)/documents`
    documents_url: String,
    auth: FirebaseAuth,
    client: reqwest::Client,
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("project_id", &self.project_id)
            .field("auth", &self.auth)
            .finish()
    }
}

impl FirestoreStore {
    /// Create a store for `project_id`, signing in with email and password
    ///
    /// No request is made until the first store call.
    pub fn new(
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let project_id = project_id.into();
        let api_key = api_key.into();
        let email = email.into();
        let password = password.into();

        if project_id.is_empty() {
            return Err(Error::config("Firestore project id cannot be empty"));
        }
        if api_key.is_empty() || email.is_empty() || password.is_empty() {
            return Err(Error::config("Firebase credentials cannot be empty"));
        }

        let client = http_client()?;
        Ok(Self {
            documents_url: documents_url(FIRESTORE_API_BASE, &project_id),
            auth: FirebaseAuth::new(client.clone(), api_key, email, password),
            project_id,
            client,
        })
    }

    /// Point the store at another API host (emulator, proxy)
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.documents_url = documents_url(api_base.trim_end_matches('/'), &self.project_id);
        self
    }

    /// The Firebase session used for requests
    pub fn auth(&self) -> &FirebaseAuth {
        &self.auth
    }

    /// Firebase user id of the signed-in account
    pub async fn user_id(&self) -> Result<String> {
        self.auth.user_id().await
    }

    fn document_url(&self, path: &DocumentPath) -> String {
        format!("{}/{}", self.documents_url, path)
    }

    /// Strip the resource prefix from a document name
    fn path_from_name(&self, name: &str) -> Result<DocumentPath> {
        let relative = name
            .split_once("/documents/")
            .map(|(_, rest)| rest)
            .ok_or_else(|| Error::provider("firestore", format!("unexpected document name: {}", name)))?;
        DocumentPath::parse(relative)
    }

    async fn send(&self, request: reqwest::RequestBuilder, action: &str) -> Result<reqwest::Response> {
        let token = self.auth.id_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::http(format!("Firestore {} request failed: {}", action, e)))?;

        if response.status().as_u16() == 401 {
            // Token revoked server-side; the next call signs in again
            self.auth.invalidate().await;
        }
        Ok(response)
    }

    async fn fail(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        status_error("firestore", status, &body)
    }

    async fn write(&self, path: &DocumentPath, body: Value, mask: Option<Vec<String>>) -> Result<()> {
        let mut request = self.client.patch(self.document_url(path)).json(&body);
        if let Some(mask) = mask {
            let params: Vec<(&str, String)> = mask
                .into_iter()
                .map(|field_path| ("updateMask.fieldPaths", field_path))
                .collect();
            request = request.query(&params);
        }

        let response = self.send(request, "write").await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }
}

fn documents_url(api_base: &str, project_id: &str) -> String {
    format!(
        "{}/projects/{}/databases/(default)/documents",
        api_base, project_id
    )
}

fn filter_op_name(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Equal => "EQUAL",
        FilterOp::LessThan => "LESS_THAN",
        FilterOp::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
        FilterOp::GreaterThan => "GREATER_THAN",
        FilterOp::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
    }
}

fn field_filter(filter: &FieldFilter) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": codec::quote_field_path(&filter.field) },
            "op": filter_op_name(filter.op),
            "value": codec::encode_value(&filter.value),
        }
    })
}

/// Build the `structuredQuery` body for a collection query
pub fn structured_query(collection: &CollectionPath, query: &Query) -> Value {
    let mut structured = json!({
        "from": [{ "collectionId": collection.id() }],
    });

    match query.filters.as_slice() {
        [] => {}
        [single] => structured["where"] = field_filter(single),
        many => {
            let filters: Vec<Value> = many.iter().map(field_filter).collect();
            structured["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": filters }
            });
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            SortDirection::Ascending => "ASCENDING",
            SortDirection::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{
            "field": { "fieldPath": codec::quote_field_path(&order.field) },
            "direction": direction,
        }]);
    }

    if let Some(limit) = query.limit {
        structured["limit"] = json!(limit);
    }

    json!({ "structuredQuery": structured })
}

/// Nest dotted field paths into a document body plus the matching mask
pub fn merge_body(fields: &Document) -> (Value, Vec<String>) {
    let mut nested = Document::new();
    let mut mask = Vec::with_capacity(fields.len());
    for (field_path, value) in fields {
        set_field(&mut nested, field_path, value.clone());
        mask.push(codec::quote_field_path(field_path));
    }
    (codec::encode_document(&nested), mask)
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        tracing::debug!(path = %path, "fetching Firestore document");

        let request = self.client.get(self.document_url(path));
        let response = self.send(request, "get").await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }

        let resource: Value = response
            .json()
            .await
            .map_err(|e| Error::provider("firestore", format!("Failed to parse response: {}", e)))?;
        let (_, doc) = codec::decode_document(&resource)?;
        Ok(Some(doc))
    }

    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<()> {
        tracing::debug!(path = %path, fields = doc.len(), "writing Firestore document");
        self.write(path, codec::encode_document(&doc), None).await
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let (body, mask) = merge_body(&fields);
        tracing::debug!(path = %path, mask = ?mask, "merging Firestore document");
        self.write(path, body, Some(mask)).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        tracing::debug!(path = %path, "deleting Firestore document");

        let request = self.client.delete(self.document_url(path));
        let response = self.send(request, "delete").await?;

        if response.status().is_success() || response.status().as_u16() == 404 {
            return Ok(());
        }
        Err(Self::fail(response).await)
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<StoredDocument>> {
        let parent_url = match collection.parent() {
            Some(parent) => self.document_url(&parent),
            None => self.documents_url.clone(),
        };
        let body = structured_query(collection, query);
        tracing::debug!(collection = %collection, "running Firestore query");

        let request = self
            .client
            .post(format!("{}:runQuery", parent_url))
            .json(&body);
        let response = self.send(request, "query").await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }

        let results: Vec<Value> = response
            .json()
            .await
            .map_err(|e| Error::provider("firestore", format!("Failed to parse response: {}", e)))?;

        // Entries without a `document` only carry read metadata
        let mut documents = Vec::new();
        for result in &results {
            if let Some(resource) = result.get("document") {
                let (name, data) = codec::decode_document(resource)?;
                documents.push(StoredDocument {
                    path: self.path_from_name(&name)?,
                    data,
                });
            }
        }

        tracing::debug!(collection = %collection, count = documents.len(), "query returned");
        Ok(documents)
    }

    async fn signed_in_user(&self) -> Result<Option<String>> {
        self.user_id().await.map(Some)
    }

    fn store_name(&self) -> &'static str {
        "firestore"
    }
}

/// Factory for creating Firestore stores
pub struct FirestoreFactory;

impl StoreFactory for FirestoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
        match config {
            StoreConfig::Firestore {
                project_id,
                api_key,
                email,
                password,
            } => Ok(Box::new(FirestoreStore::new(
                project_id.clone(),
                api_key.clone(),
                email.clone(),
                password.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for Firestore store")),
        }
    }
}

/// Register the Firestore store with a registry
///
/// # Example
///
/// ```rust
/// use huckleberry_core::StoreRegistry;
///
/// let registry = StoreRegistry::with_builtin();
/// huckleberry_firestore::register(&registry);
/// assert!(registry.has_store("firestore"));
/// ```
pub fn register(registry: &StoreRegistry) {
    registry.register_store("firestore", Box::new(FirestoreFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn config() -> StoreConfig {
        StoreConfig::Firestore {
            project_id: "tracker".into(),
            api_key: "AIza-secret".into(),
            email: "parent@example.com".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn test_factory_creation() {
        let store = FirestoreFactory.create(&config()).unwrap();
        assert_eq!(store.store_name(), "firestore");
        assert!(FirestoreFactory.create(&StoreConfig::Memory).is_err());
    }

    #[test]
    fn test_empty_credentials_rejected() {
        assert!(FirestoreStore::new("tracker", "", "parent@example.com", "pw").is_err());
        assert!(FirestoreStore::new("", "key", "parent@example.com", "pw").is_err());
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let store = FirestoreStore::new("tracker", "AIza-secret", "parent@example.com", "hunter2")
            .unwrap();
        let debug_str = format!("{:?}", store);
        assert!(!debug_str.contains("AIza-secret"));
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("FirestoreStore"));
    }

    #[test]
    fn test_document_urls() {
        let store = FirestoreStore::new("tracker", "key", "parent@example.com", "pw")
            .unwrap()
            .with_api_base("http://localhost:8080/v1/");
        let path = DocumentPath::parse("feed/c1/intervals/e1").unwrap();

        assert_eq!(
            store.document_url(&path),
            "http://localhost:8080/v1/projects/tracker/databases/(default)/documents/feed/c1/intervals/e1"
        );
        assert_eq!(
            store
                .path_from_name("projects/tracker/databases/(default)/documents/feed/c1/intervals/e1")
                .unwrap(),
            path
        );
    }

    #[test]
    fn test_merge_body_nests_fields_and_builds_mask() {
        let fields = json!({
            "timer.paused": true,
            "prefs.lastBottle": {"bottleAmount": 120.0},
        });
        let (body, mask) = merge_body(fields.as_object().unwrap());

        assert_eq!(mask, vec!["timer.paused", "prefs.lastBottle"]);
        assert_eq!(
            body,
            json!({"fields": {
                "timer": {"mapValue": {"fields": {"paused": {"booleanValue": true}}}},
                "prefs": {"mapValue": {"fields": {
                    "lastBottle": {"mapValue": {"fields": {"bottleAmount": {"doubleValue": 120.0}}}}
                }}}
            }})
        );
    }

    #[test]
    fn test_structured_query() {
        let collection = DocumentPath::root("health", "c1").collection("data");
        let query = Query::new()
            .filter("mode", FilterOp::Equal, "growth")
            .filter("start", FilterOp::GreaterThanOrEqual, 100.0)
            .order_by("start", SortDirection::Descending)
            .limit(1);

        let body = structured_query(&collection, &query);
        let structured = &body["structuredQuery"];
        assert_eq!(structured["from"], json!([{"collectionId": "data"}]));
        assert_eq!(structured["where"]["compositeFilter"]["op"], json!("AND"));
        assert_eq!(
            structured["where"]["compositeFilter"]["filters"][0]["fieldFilter"]["value"],
            json!({"stringValue": "growth"})
        );
        assert_eq!(structured["orderBy"][0]["direction"], json!("DESCENDING"));
        assert_eq!(structured["limit"], json!(1));

        let single = structured_query(&collection, &Query::new().filter("mode", FilterOp::Equal, "growth"));
        assert!(single["structuredQuery"]["where"].get("fieldFilter").is_some());
        assert!(single["structuredQuery"].get("orderBy").is_none());
    }

    #[test]
    fn test_status_mapping() {
        use reqwest::StatusCode;

        assert!(matches!(
            status_error("firestore", StatusCode::FORBIDDEN, ""),
            Error::Authentication(_)
        ));
        assert!(status_error("firestore", StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(status_error("firestore", StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(!status_error("firestore", StatusCode::BAD_REQUEST, "").is_transient());
    }

    #[tokio::test]
    async fn test_signed_in_user_reuses_store_session() {
        let store = FirestoreStore::new("tracker", "key", "parent@example.com", "pw").unwrap();
        store.auth().seed_session("uid-7").await;

        let store: Arc<dyn DocumentStore> = Arc::new(store);
        assert_eq!(store.signed_in_user().await.unwrap().as_deref(), Some("uid-7"));
    }

    #[test]
    fn test_register() {
        let registry = StoreRegistry::new();
        register(&registry);
        assert!(registry.has_store("firestore"));
        assert!(registry.create_store(&config()).is_ok());
    }
}
