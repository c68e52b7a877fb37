//! REST client for the TaskDesk backend, built on `reqwest`.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use taskdesk_proto::admin::{AdminStats, AdminTodo, DashboardStats};
use taskdesk_proto::error::ErrorBody;
use taskdesk_proto::feedback::{FeedbackEntry, FeedbackRequest};
use taskdesk_proto::task::{NewTask, TaskId, TaskRecord, TaskUpdate};
use taskdesk_proto::user::{AuthResponse, LoginRequest, RegisterRequest, User};
use url::Url;

use super::{ApiError, TodoApi};
use crate::admin::AdminResource;
use crate::session::SessionContext;

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Fail with [`ApiError::NoSession`] when logged out.
    Required,
    /// Attach the token when there is one.
    Optional,
    /// Never attach a token.
    None,
}

/// HTTP implementation of [`TodoApi`] plus the account, dashboard,
/// feedback and admin endpoints.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
    session: SessionContext,
}

impl HttpApi {
    /// Creates a client for the backend at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Url`] if `base` cannot carry a path, or
    /// [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(base: Url, timeout: Duration, session: SessionContext) -> Result<Self, ApiError> {
        if base.cannot_be_a_base() {
            return Err(ApiError::Url(base.to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base,
            session,
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, auth: Auth) -> Result<RequestBuilder, ApiError> {
        let builder = self.client.request(method, url);
        match auth {
            Auth::Required => Ok(builder.bearer_auth(self.session.bearer()?)),
            Auth::Optional => Ok(match self.session.token() {
                Some(token) => builder.bearer_auth(token),
                None => builder,
            }),
            Auth::None => Ok(builder),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        auth: Auth,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, url, auth, body).await?;
        response.json::<T>().await.map_err(ApiError::from)
    }

    async fn call_empty(
        &self,
        method: Method,
        url: Url,
        auth: Auth,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<(), ApiError> {
        self.send(method, url, auth, body).await.map(drop)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        auth: Auth,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<Response, ApiError> {
        let path = url.path().to_string();
        let mut builder = self.request(method.clone(), url, auth)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "request failed");
            ApiError::from(e)
        })?;
        let status = response.status();
        tracing::debug!(%method, %path, status = status.as_u16(), "response");
        if status.is_success() {
            return Ok(response);
        }
        let raw = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), &ErrorBody::parse(&raw)))
    }

    // --- account ---

    /// `POST /user/login-user`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["user", "login-user"])?;
        self.call(Method::POST, url, Auth::None, Some(request)).await
    }

    /// `POST /user/register-user`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["user", "register-user"])?;
        self.call(Method::POST, url, Auth::None, Some(request)).await
    }

    // --- dashboard and feedback ---

    /// `GET /dashboard/stats`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let url = self.endpoint(&["dashboard", "stats"])?;
        self.call(Method::GET, url, Auth::Required, None::<&()>).await
    }

    /// `POST /feedback/add-feedback`. Sends the token when logged in.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<(), ApiError> {
        let url = self.endpoint(&["feedback", "add-feedback"])?;
        self.call_empty(Method::POST, url, Auth::Optional, Some(request))
            .await
    }

    // --- admin ---

    /// `GET /admin/stats`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        let url = self.endpoint(&["admin", "stats"])?;
        self.call(Method::GET, url, Auth::Required, None::<&()>).await
    }

    /// `GET /admin/users`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn admin_users(&self) -> Result<Vec<User>, ApiError> {
        let url = self.endpoint(&["admin", "users"])?;
        self.call(Method::GET, url, Auth::Required, None::<&()>).await
    }

    /// `GET /admin/todos`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn admin_todos(&self) -> Result<Vec<AdminTodo>, ApiError> {
        let url = self.endpoint(&["admin", "todos"])?;
        self.call(Method::GET, url, Auth::Required, None::<&()>).await
    }

    /// `GET /admin/feedback`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn admin_feedback(&self) -> Result<Vec<FeedbackEntry>, ApiError> {
        let url = self.endpoint(&["admin", "feedback"])?;
        self.call(Method::GET, url, Auth::Required, None::<&()>).await
    }

    /// `DELETE /admin/{users|todos|feedback}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] on failure.
    pub async fn admin_delete(&self, resource: AdminResource, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["admin", resource.path_segment(), id])?;
        self.call_empty(Method::DELETE, url, Auth::Required, None::<&()>)
            .await
    }
}

impl TodoApi for HttpApi {
    async fn list(&self) -> Result<Vec<TaskRecord>, ApiError> {
        let url = self.endpoint(&["todo"])?;
        self.call(Method::GET, url, Auth::Required, None::<&()>).await
    }

    async fn create(&self, task: &NewTask) -> Result<TaskRecord, ApiError> {
        let url = self.endpoint(&["todo"])?;
        self.call(Method::POST, url, Auth::Required, Some(task)).await
    }

    async fn update(&self, id: &TaskId, update: &TaskUpdate) -> Result<TaskRecord, ApiError> {
        let id = id.to_string();
        let url = self.endpoint(&["todo", id.as_str()])?;
        self.call(Method::PUT, url, Auth::Required, Some(update)).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        let id = id.to_string();
        let url = self.endpoint(&["todo", id.as_str()])?;
        self.call_empty(Method::DELETE, url, Auth::Required, None::<&()>)
            .await
    }

    async fn clear_completed(&self) -> Result<(), ApiError> {
        let mut url = self.endpoint(&["todo"])?;
        url.query_pairs_mut().append_pair("status", "completed");
        self.call_empty(Method::DELETE, url, Auth::Required, None::<&()>)
            .await
    }
}
