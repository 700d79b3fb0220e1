//! Explicit session context passed into every remote call

use crate::model::DataModel;

/// Authentication and model selection for one editor session.
///
/// Every validator receives the context explicitly so the pipeline never
/// reads ambient state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Bearer token of the signed-in user
    pub access_token: Option<String>,
    /// Optional API gateway key
    pub api_key: Option<String>,
    /// Data model of the edited measure
    pub model: DataModel,
}

impl SessionContext {
    pub fn new(model: DataModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: DataModel) -> Self {
        self.model = model;
        self
    }

    /// Attach the `Authorization` and `api-key` headers to a request
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }
}
