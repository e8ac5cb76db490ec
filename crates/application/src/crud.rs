//! Generic CRUD client
//!
//! `CrudClient` exposes a uniform collection API over one remote resource
//! type, delegating every call to the dispatcher. The resource shapes are
//! compile-time generic parameters; there is no runtime dispatch.

use std::fmt::Display;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use relay_domain::{MessageResponse, RequestOptions, SearchRequest, SearchRequestResponse};

use crate::dispatcher::{ApiDispatcher, first_value};
use crate::error::{ApiError, ApiResult};

/// Collection facade over a single remote resource.
///
/// `T` is the read shape, `CreateDto` the create payload, `UpdateDto` the
/// update payload. All operations are single-value and inherit their
/// error handling unchanged from [`ApiDispatcher`].
pub struct CrudClient<T, CreateDto, UpdateDto> {
    api: ApiDispatcher,
    _resource: PhantomData<fn() -> (T, CreateDto, UpdateDto)>,
}

impl<T, CreateDto, UpdateDto> Clone for CrudClient<T, CreateDto, UpdateDto> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T, CreateDto, UpdateDto> CrudClient<T, CreateDto, UpdateDto>
where
    T: DeserializeOwned + Send + 'static,
    CreateDto: Serialize,
    UpdateDto: Serialize,
{
    /// Wraps a dispatcher already scoped to this resource's controller.
    #[must_use]
    pub const fn new(api: ApiDispatcher) -> Self {
        Self {
            api,
            _resource: PhantomData,
        }
    }

    /// Fetches the whole collection, optionally narrowed by query params.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's classified error on failure.
    pub async fn find_all(&self, params: Vec<(String, String)>) -> ApiResult<Vec<T>> {
        let options = RequestOptions::new().with_params(params);
        first_value(self.api.get("", options)).await
    }

    /// Fetches one item by id.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's classified error on failure.
    pub async fn find_by_id(&self, id: impl Display + Send) -> ApiResult<T> {
        first_value(self.api.get(&format!("/{id}"), RequestOptions::default())).await
    }

    /// Creates an item from the given payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if the payload cannot be serialized,
    /// or the dispatcher's classified error on failure.
    pub async fn create(&self, dto: &CreateDto) -> ApiResult<T> {
        let body = encode(dto)?;
        first_value(self.api.post("", body, RequestOptions::default())).await
    }

    /// Applies a partial update to one item by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if the payload cannot be serialized,
    /// or the dispatcher's classified error on failure.
    pub async fn update_by_id(&self, id: impl Display + Send, dto: &UpdateDto) -> ApiResult<T> {
        let body = encode(dto)?;
        first_value(
            self.api
                .patch(&format!("/{id}"), body, RequestOptions::default()),
        )
        .await
    }

    /// Deletes one item by id.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's classified error on failure.
    pub async fn delete_by_id(&self, id: impl Display + Send) -> ApiResult<MessageResponse> {
        first_value(
            self.api
                .delete(&format!("/{id}"), RequestOptions::default()),
        )
        .await
    }

    /// Deletes a batch of items by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if the id list cannot be serialized,
    /// or the dispatcher's classified error on failure.
    pub async fn delete_many<I: Serialize + Send + Sync>(
        &self,
        ids: &[I],
    ) -> ApiResult<MessageResponse> {
        let body = json!({ "ids": encode(ids)? });
        first_value(
            self.api
                .post("/delete-many", body, RequestOptions::default()),
        )
        .await
    }

    /// Runs a paginated search with the exact wire shape of `request`.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's classified error on failure.
    pub async fn find_by_pagination(
        &self,
        request: &SearchRequest,
    ) -> ApiResult<SearchRequestResponse<T>> {
        let body = encode(request)?;
        first_value(
            self.api
                .post("/paginated", body, RequestOptions::default()),
        )
        .await
    }
}

fn encode<S: Serialize + ?Sized>(value: &S) -> ApiResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|error| ApiError::Encode(error.to_string()))
}
