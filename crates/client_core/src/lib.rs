use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        ApplyId, ApplyRecord, DesignId, DesignRecord, Policy, PolicyCategory, PolicyDraft,
        PolicyId, Resource,
    },
    error::ApiError,
    protocol::{
        ApplyListPage, ControlResponse, DesignListPage, LimitQuery, PolicyListPage, PolicyQuery,
        ResourceListPage, ResourceQuery,
    },
};
use tracing::debug;
use url::Url;

pub mod config;
pub mod controller;
pub mod detail;
pub mod error;
pub mod filter;
pub mod format;
pub mod status;

pub use config::{load_settings, Settings};
pub use controller::{
    ActionController, ControlPhase, ControlRequest, LayoutApplyControl, PermissionOracle,
    StaticPermission, SubmitOutcome,
};
pub use error::ClientError;
pub use status::{derive_status, ControlAction, DerivedStatus};

/// Base URLs of the services the console talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub layout_design: String,
    pub layout_apply: String,
    pub configuration_manager: String,
    pub policy_manager: String,
}

impl From<&Settings> for Endpoints {
    fn from(settings: &Settings) -> Self {
        Self {
            layout_design: settings.layout_design_base.clone(),
            layout_apply: settings.layout_apply_base.clone(),
            configuration_manager: settings.configuration_manager_base.clone(),
            policy_manager: settings.policy_manager_base.clone(),
        }
    }
}

pub struct LayoutClient {
    http: Client,
    endpoints: Endpoints,
    list_limit: usize,
}

impl LayoutClient {
    pub fn new(endpoints: Endpoints, list_limit: usize) -> Self {
        Self {
            http: Client::new(),
            endpoints,
            list_limit,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Endpoints::from(settings), settings.list_limit)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn list_designs(&self) -> Result<Vec<DesignRecord>, ClientError> {
        let url = endpoint(&self.endpoints.layout_design, &["layout-designs"])?;
        let request = self.http.get(url.clone()).query(&LimitQuery {
            limit: self.list_limit,
        });
        let page: DesignListPage = self.send_json(request, "GET", &url).await?;
        Ok(page.data)
    }

    pub async fn get_design(&self, id: &DesignId) -> Result<DesignRecord, ClientError> {
        let url = endpoint(&self.endpoints.layout_design, &["layout-designs", id.as_str()])?;
        self.send_json(self.http.get(url.clone()), "GET", &url)
            .await
    }

    pub async fn list_applies(&self) -> Result<Vec<ApplyRecord>, ClientError> {
        let url = endpoint(&self.endpoints.layout_apply, &["layout-apply"])?;
        let request = self.http.get(url.clone()).query(&LimitQuery {
            limit: self.list_limit,
        });
        let page: ApplyListPage = self.send_json(request, "GET", &url).await?;
        Ok(page.data)
    }

    pub async fn get_apply(&self, id: &ApplyId) -> Result<ApplyRecord, ClientError> {
        let url = endpoint(&self.endpoints.layout_apply, &["layout-apply", id.as_str()])?;
        self.send_json(self.http.get(url.clone()), "GET", &url)
            .await
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>, ClientError> {
        let url = endpoint(&self.endpoints.configuration_manager, &["resources"])?;
        let request = self
            .http
            .get(url.clone())
            .query(&ResourceQuery { detail: true });
        let page: ResourceListPage = self.send_json(request, "GET", &url).await?;
        Ok(page.resources)
    }

    pub async fn list_policies(
        &self,
        category: Option<PolicyCategory>,
    ) -> Result<Vec<Policy>, ClientError> {
        let url = endpoint(&self.endpoints.policy_manager, &["policies"])?;
        let request = self.http.get(url.clone()).query(&PolicyQuery {
            category: category.map(|category| category.as_str().to_string()),
        });
        let page: PolicyListPage = self.send_json(request, "GET", &url).await?;
        Ok(page.policies)
    }

    pub async fn get_policy(&self, id: &PolicyId) -> Result<Policy, ClientError> {
        let url = endpoint(&self.endpoints.policy_manager, &["policies", id.as_str()])?;
        self.send_json(self.http.get(url.clone()), "GET", &url)
            .await
    }

    pub async fn create_policy(&self, draft: &PolicyDraft) -> Result<Policy, ClientError> {
        let url = endpoint(&self.endpoints.policy_manager, &["policies"])?;
        self.send_json(self.http.post(url.clone()).json(draft), "POST", &url)
            .await
    }

    pub async fn update_policy(
        &self,
        id: &PolicyId,
        draft: &PolicyDraft,
    ) -> Result<Policy, ClientError> {
        let url = endpoint(&self.endpoints.policy_manager, &["policies", id.as_str()])?;
        self.send_json(self.http.put(url.clone()).json(draft), "PUT", &url)
            .await
    }

    pub async fn delete_policy(&self, id: &PolicyId) -> Result<(), ClientError> {
        let url = endpoint(&self.endpoints.policy_manager, &["policies", id.as_str()])?;
        self.send(self.http.request(Method::DELETE, url.clone()), "DELETE", &url)
            .await?;
        Ok(())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        method: &'static str,
        url: &Url,
    ) -> Result<String, ClientError> {
        debug!(method, url = %url, "sending request");
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method,
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Transport {
                method,
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            debug!(method, url = %url, status = status.as_u16(), "request rejected");
            return Err(ClientError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                api: serde_json::from_str::<ApiError>(&body)
                    .ok()
                    .filter(|api| !api.code.is_empty() || !api.message.is_empty()),
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: &'static str,
        url: &Url,
    ) -> Result<T, ClientError> {
        let body = self.send(request, method, url).await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            method,
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl LayoutApplyControl for LayoutClient {
    async fn control_apply(
        &self,
        request: &ControlRequest,
    ) -> Result<ControlResponse, ClientError> {
        let url = endpoint(
            &self.endpoints.layout_apply,
            &["layout-apply", request.apply_id.as_str()],
        )?;
        let builder = self
            .http
            .put(url.clone())
            .query(request.kind.query());
        let body = self.send(builder, "PUT", &url).await?;
        if body.trim().is_empty() {
            return Ok(ControlResponse::default());
        }
        let body = serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            method: "PUT",
            url: url.to_string(),
            source,
        })?;
        Ok(ControlResponse { body })
    }
}

/// Appends path segments to a base URL, percent-encoding each one.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    let mut url = Url::parse(base).map_err(|err| invalid(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
