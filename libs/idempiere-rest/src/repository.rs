//! Generic paginated repository over one ERP entity endpoint.
//!
//! An [`EntityRepository`] owns an endpoint path (`models/c_bpartner`),
//! a transform from raw backend records to application records, and
//! optionally a [`FilterSchema`] for the UI filter integration.
//!
//! Failure policy: the UI-facing operations absorb transport errors so
//! list pages degrade to "no rows" instead of crashing a screen. List
//! queries return an empty page, record lookups `None`, deletes `false`,
//! and the error is logged. Callers that need the error itself use
//! [`EntityRepository::try_query`] and friends.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};

use filter_state::{adapter, ActiveFilter, FilterSchema};
use odata_query::ast::{self, CompareOp, MethodOp, Scalar};
use odata_query::{QueryBuilder, QueryConfig, QueryParams, SortDir};

use crate::client::RestClient;
use crate::envelope::{PageEnvelope, PaginatedResponse};
use crate::error::ClientError;

/// 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

/// Typed access to one entity endpoint, parameterized by the raw record
/// shape `R` the backend sends and the application record `T` it maps to.
pub struct EntityRepository<R, T> {
    client: Arc<dyn RestClient>,
    endpoint: String,
    schema: FilterSchema,
    map_record: Arc<dyn Fn(R) -> T + Send + Sync>,
}

impl<R, T> EntityRepository<R, T>
where
    R: DeserializeOwned,
{
    pub fn new(
        client: Arc<dyn RestClient>,
        endpoint: impl Into<String>,
        map_record: impl Fn(R) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            schema: FilterSchema::new(),
            map_record: Arc::new(map_record),
        }
    }

    /// Attach the filter schema consulted by
    /// [`EntityRepository::query_filtered`].
    #[must_use]
    pub fn with_schema(mut self, schema: FilterSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a query, absorbing failure into an empty page.
    pub async fn query(&self, config: &QueryConfig) -> PaginatedResponse<T> {
        match self.try_query(config).await {
            Ok(page) => page,
            Err(err) => {
                error!(entity = %self.endpoint, error = %err, "list query failed, returning empty page");
                PaginatedResponse::empty()
            }
        }
    }

    /// Run a query, keeping the error.
    pub async fn try_query(&self, config: &QueryConfig) -> Result<PaginatedResponse<T>, ClientError> {
        self.try_query_params(&config.to_params()).await
    }

    /// Run a query from already-rendered parameters.
    pub async fn try_query_params(
        &self,
        params: &QueryParams,
    ) -> Result<PaginatedResponse<T>, ClientError> {
        let envelope = self.fetch_envelope(params).await?;
        Ok(envelope.into_page(|record| (self.map_record)(record)))
    }

    /// One page of every record, in the server's natural order.
    pub async fn get_all(&self, pagination: Pagination) -> PaginatedResponse<T> {
        let config = QueryBuilder::new()
            .paginate(pagination.page, pagination.page_size)
            .into_config();
        self.query(&config).await
    }

    /// `None` when the record is absent or the request fails.
    pub async fn get_by_id(&self, id: i64) -> Option<T> {
        let path = format!("{}/{id}", self.endpoint);
        match self.client.get(&path, &[]).await {
            Ok(raw) => self.decode_record(raw),
            Err(err) if err.is_not_found() => {
                debug!(entity = %self.endpoint, id, "record not found");
                None
            }
            Err(err) => {
                error!(entity = %self.endpoint, id, error = %err, "record fetch failed");
                None
            }
        }
    }

    /// Create a record from a raw payload; `None` on failure.
    pub async fn create(&self, payload: &Value) -> Option<T> {
        match self.client.post(&self.endpoint, payload).await {
            Ok(raw) => self.decode_record(raw),
            Err(err) => {
                error!(entity = %self.endpoint, error = %err, "create failed");
                None
            }
        }
    }

    /// Update a record from a raw payload; `None` on failure.
    pub async fn update(&self, id: i64, payload: &Value) -> Option<T> {
        let path = format!("{}/{id}", self.endpoint);
        match self.client.put(&path, payload).await {
            Ok(raw) => self.decode_record(raw),
            Err(err) => {
                error!(entity = %self.endpoint, id, error = %err, "update failed");
                None
            }
        }
    }

    /// Soft delete: deactivates the record instead of removing the row.
    pub async fn delete(&self, id: i64) -> bool {
        let path = format!("{}/{id}", self.endpoint);
        match self.client.put(&path, &json!({ "IsActive": false })).await {
            Ok(_) => true,
            Err(err) => {
                error!(entity = %self.endpoint, id, error = %err, "soft delete failed");
                false
            }
        }
    }

    /// Physically delete the row.
    pub async fn hard_delete(&self, id: i64) -> bool {
        let path = format!("{}/{id}", self.endpoint);
        match self.client.delete(&path).await {
            Ok(_) => true,
            Err(err) => {
                error!(entity = %self.endpoint, id, error = %err, "delete failed");
                false
            }
        }
    }

    /// Substring search on one column, `Name` unless told otherwise.
    pub async fn search(&self, term: &str, field: Option<&str>) -> PaginatedResponse<T> {
        let field = field.unwrap_or("Name");
        let config = QueryBuilder::new()
            .filter(ast::method_filter(MethodOp::Contains, field, term))
            .into_config();
        self.query(&config).await
    }

    /// Single-predicate query; equality unless an operator is given.
    pub async fn filter_by(
        &self,
        field: &str,
        value: impl Into<Scalar>,
        op: Option<CompareOp>,
    ) -> PaginatedResponse<T> {
        let config = QueryBuilder::new()
            .filter(ast::filter(field, op.unwrap_or(CompareOp::Eq), value))
            .into_config();
        self.query(&config).await
    }

    /// One page sorted on a single column.
    pub async fn sort_by(&self, field: &str, dir: SortDir) -> PaginatedResponse<T> {
        let config = QueryBuilder::new().order_by(field, dir).into_config();
        self.query(&config).await
    }

    async fn fetch_envelope(&self, params: &QueryParams) -> Result<PageEnvelope<R>, ClientError> {
        let raw = self.client.get(&self.endpoint, params.as_slice()).await?;
        Ok(serde_json::from_value(raw)?)
    }

    fn decode_record(&self, raw: Value) -> Option<T> {
        match serde_json::from_value::<R>(raw) {
            Ok(record) => Some((self.map_record)(record)),
            Err(err) => {
                error!(entity = %self.endpoint, error = %err, "record decode failed");
                None
            }
        }
    }
}

impl<T> EntityRepository<Value, T> {
    /// Page query driven by UI filter state.
    ///
    /// Filters the schema marks server-capable are rendered into `$filter`
    /// and sent on the wire; client-side ones are applied to the returned
    /// page. Totals keep the server's counts, so a client-side filter can
    /// leave a page shorter than `page_size`.
    pub async fn query_filtered(
        &self,
        filters: &[ActiveFilter],
        pagination: Pagination,
    ) -> PaginatedResponse<T> {
        let mut params = QueryBuilder::new()
            .paginate(pagination.page, pagination.page_size)
            .build();
        if let Some(filter) = adapter::build_odata_filter(filters, &self.schema) {
            params.append("$filter", filter);
        }

        let mut envelope = match self.fetch_envelope(&params).await {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(entity = %self.endpoint, error = %err, "list query failed, returning empty page");
                return PaginatedResponse::empty();
            }
        };

        let local = adapter::client_side_filters(filters, &self.schema);
        if !local.is_empty() {
            envelope
                .records
                .retain(|record| local.iter().all(|f| adapter::matches_record(f, record)));
        }
        envelope.into_page(|record| (self.map_record)(record))
    }
}
