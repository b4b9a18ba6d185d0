use log::{debug, warn};
use reqwest::Client;
use url::Url;

use crate::client::config::ClientConfig;
use crate::common::error::{PanelError, PanelResult};
use crate::common::models::{
    ConnectReply, ConnectRequest, DeviceAction, ErrorDetail, PortsResponse, StatusResponse,
};

/// A REST request the session wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestCall {
    ListPorts,
    Connect(ConnectRequest),
    Disconnect,
    Action(DeviceAction),
}

/// Completion of a [`RestCall`], fed back into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestOutcome {
    Ports(PanelResult<Vec<String>>),
    Connect(PanelResult<ConnectReply>),
    Disconnect(PanelResult<String>),
    Action(DeviceAction, PanelResult<()>),
}

/// Thin client for the backend's `/api/*` endpoints.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base: Url,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> PanelResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PanelError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base: config.backend_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> PanelResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    pub async fn execute(&self, call: RestCall) -> RestOutcome {
        debug!("[REST] {:?}", call);
        match call {
            RestCall::ListPorts => RestOutcome::Ports(self.list_ports().await),
            RestCall::Connect(request) => RestOutcome::Connect(self.connect(&request).await),
            RestCall::Disconnect => RestOutcome::Disconnect(self.disconnect().await),
            RestCall::Action(action) => RestOutcome::Action(action, self.trigger(action).await),
        }
    }

    /// `GET /api/ports`. Non-2xx and non-JSON bodies are both errors.
    pub async fn list_ports(&self) -> PanelResult<Vec<String>> {
        let response = self
            .http
            .get(self.endpoint("api/ports")?)
            .send()
            .await?
            .error_for_status()?;
        let body: PortsResponse = response.json().await?;
        Ok(body.ports)
    }

    /// `POST /api/connect`. A rejected request is still `Ok`, carrying the server's detail.
    pub async fn connect(&self, request: &ConnectRequest) -> PanelResult<ConnectReply> {
        let response = self
            .http
            .post(self.endpoint("api/connect")?)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            let parsed: StatusResponse = serde_json::from_slice(&body)?;
            Ok(ConnectReply::Accepted {
                status: parsed.status,
            })
        } else {
            let detail = serde_json::from_slice::<ErrorDetail>(&body)
                .ok()
                .and_then(|d| d.message());
            warn!("[REST] connect rejected with {}: {:?}", status, detail);
            Ok(ConnectReply::Rejected {
                code: status.as_u16(),
                detail,
            })
        }
    }

    /// `POST /api/disconnect`, returning the reported status string.
    pub async fn disconnect(&self) -> PanelResult<String> {
        let response = self
            .http
            .post(self.endpoint("api/disconnect")?)
            .send()
            .await?
            .error_for_status()?;
        let body: StatusResponse = response.json().await?;
        Ok(body.status)
    }

    /// Fires a one-shot device action. The response body is not inspected.
    pub async fn trigger(&self, action: DeviceAction) -> PanelResult<()> {
        let mut request = self.http.post(self.endpoint(action.path())?);
        if let Some(body) = action.body() {
            request = request.json(&body);
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}
