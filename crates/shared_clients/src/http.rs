use crate::error::RemoteClientError;
use crate::{RemoteApi, RemoteId};
use async_trait::async_trait;
use common::types::{EntityKind, EntitySpec};
use log::debug;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct CreatedBody {
    id: RemoteId,
}

fn kind_path(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::DataSource => "data-sources",
        EntityKind::Dataset => "datasets",
        EntityKind::Visual => "visuals",
        EntityKind::Filter => "filters",
        EntityKind::RefreshSchedule => "refresh-schedules",
    }
}

/// JSON-over-HTTP client for the dashboarding service.
///
/// Routes are `{base}/{kind}` for create and list, `{base}/{kind}/{id}` for
/// get, update and delete. Ids are percent-encoded as a single path segment.
/// Bodies are the bare entity, without the kind tag.
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    base_url: Url,
    token: Option<String>,
    client: Client,
}

impl HttpRemoteClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, RemoteClientError> {
        let parsed = Url::parse(base_url).map_err(|e| {
            RemoteClientError::configuration(format!("invalid base url '{base_url}': {e}"))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(RemoteClientError::configuration(format!(
                "base url '{base_url}' cannot carry a path"
            )));
        }
        let client = Client::builder().build()?;
        Ok(Self {
            base_url: parsed,
            token,
            client,
        })
    }

    fn url_for(&self, kind: EntityKind, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base urls, so segments are always available
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(kind_path(kind));
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    fn collection_url(&self, kind: EntityKind) -> Url {
        self.url_for(kind, None)
    }

    fn entity_url(&self, kind: EntityKind, id: &str) -> Url {
        self.url_for(kind, Some(id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn error_for(resp: Response, action: &str) -> RemoteClientError {
        let status = resp.status();
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => format!("failed to {action}: {}", body.message),
            Err(_) => format!("failed to {action}"),
        };
        RemoteClientError::from_status(status, message)
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteClient {
    async fn get(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<EntitySpec>, RemoteClientError> {
        let url = self.entity_url(kind, id);
        debug!("GET {url}");
        let resp = self.authorized(self.client.get(url)).send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let body: Value = resp.json().await?;
                Ok(Some(EntitySpec::from_body(kind, body)?))
            }
            _ => Err(Self::error_for(resp, &format!("fetch {kind} '{id}'")).await),
        }
    }

    async fn create(&self, spec: &EntitySpec) -> Result<RemoteId, RemoteClientError> {
        let url = self.collection_url(spec.kind());
        debug!("POST {url}");
        let resp = self
            .authorized(self.client.post(url))
            .json(&spec.to_body()?)
            .send()
            .await?;

        if resp.status().is_success() {
            let created: CreatedBody = resp.json().await?;
            Ok(created.id)
        } else {
            Err(Self::error_for(resp, &format!("create {}", spec.entity_ref())).await)
        }
    }

    async fn update(&self, id: &str, spec: &EntitySpec) -> Result<(), RemoteClientError> {
        let url = self.entity_url(spec.kind(), id);
        debug!("PUT {url}");
        let resp = self
            .authorized(self.client.put(url))
            .json(&spec.to_body()?)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(resp, &format!("update {}", spec.entity_ref())).await)
        }
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), RemoteClientError> {
        let url = self.entity_url(kind, id);
        debug!("DELETE {url}");
        let resp = self.authorized(self.client.delete(url)).send().await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(resp, &format!("delete {kind} '{id}'")).await)
        }
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<EntitySpec>, RemoteClientError> {
        let url = self.collection_url(kind);
        debug!("GET {url}");
        let resp = self.authorized(self.client.get(url)).send().await?;

        if resp.status().is_success() {
            let bodies: Vec<Value> = resp.json().await?;
            bodies
                .into_iter()
                .map(|body| EntitySpec::from_body(kind, body).map_err(Into::into))
                .collect()
        } else {
            Err(Self::error_for(resp, &format!("list {kind} entities")).await)
        }
    }
}
