//! RESTCONF transport to the controller.
//!
//! [`RestconfClient`] implements both collaborator seams: [`ControlApi`] for
//! renderer RPCs and mounted-device lookups, and [`SessionFactory`] for
//! telemetry reads through the node's `yang-ext:mount` point.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config_file::ControllerConfig;
use crate::envelope::as_list;
use crate::error::{TransportError, TransportResult};
use crate::session::{
    ControlApi, InterfaceLookup, ManagementSession, ReadRequest, RpcResponse, SessionFactory,
    ABSENT_STATUSES, DEVICE_ROOT,
};

const PORT_MAPPING_ROOT: &str = "transportpce-portmapping:network";

/// Datastore selector of a GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    Config,
    Nonconfig,
}

impl Content {
    const fn as_str(&self) -> &'static str {
        match self {
            Content::Config => "config",
            Content::Nonconfig => "nonconfig",
        }
    }
}

/// RESTCONF client bound to one controller.
#[derive(Debug, Clone)]
pub struct RestconfClient {
    client: Client,
    base: Url,
    username: String,
    password: String,
}

impl RestconfClient {
    pub fn new(config: &ControllerConfig) -> TransportResult<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| TransportError::malformed(&config.base_url, format!("invalid base URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::malformed(&config.base_url, "URL cannot be a base"));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::unavailable(&config.base_url, e.to_string()))?;

        Ok(Self {
            client,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL extended by unencoded path segments.
    pub fn url<S: AsRef<str>>(&self, segments: &[S]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }
        url
    }

    /// Segments of a node's device mount point.
    pub fn mount_segments(node_id: &str) -> Vec<String> {
        vec![
            "rests".to_string(),
            "data".to_string(),
            "network-topology:network-topology".to_string(),
            "topology=topology-netconf".to_string(),
            format!("node={}", node_id),
            "yang-ext:mount".to_string(),
        ]
    }

    fn device_url(&self, node_id: &str, tail: &[String]) -> Url {
        let mut segments = Self::mount_segments(node_id);
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    async fn send(
        &self,
        method: Method,
        mut url: Url,
        content: Option<Content>,
        body: Option<&Value>,
    ) -> TransportResult<(u16, Value)> {
        if let Some(content) = content {
            url.query_pairs_mut().append_pair("content", content.as_str());
        }
        let target = url.to_string();
        debug!("{} {}", method, target);

        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| map_error(&target, e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| map_error(&target, e))?;
        Ok((status, parse_body(&target, status, &text)?))
    }

    async fn lookup(&self, node_id: &str, segment: String) -> TransportResult<InterfaceLookup> {
        let url = self.device_url(node_id, &[DEVICE_ROOT.to_string(), segment]);
        let target = url.to_string();
        let (status, body) = self.send(Method::GET, url, Some(Content::Config), None).await?;
        classify_lookup(&target, status, body)
    }

    /// Port mapping document of a node.
    #[instrument(skip(self))]
    pub async fn port_mapping(&self, node_id: &str) -> TransportResult<Value> {
        let url = self.url(&[
            "rests".to_string(),
            "data".to_string(),
            PORT_MAPPING_ROOT.to_string(),
            format!("nodes={}", node_id),
        ]);
        let target = url.to_string();
        let (status, body) = self.send(Method::GET, url, None, None).await?;
        if StatusCode::from_u16(status).map_or(false, |s| s.is_success()) {
            Ok(body)
        } else {
            Err(TransportError::status(target, status))
        }
    }
}

/// Maps a reqwest failure onto the transport taxonomy.
fn map_error(target: &str, err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::malformed(target, err.to_string())
    } else {
        TransportError::unavailable(target, err.to_string())
    }
}

/// Parses a response body; an empty body reads as `null`.
///
/// Error responses often carry HTML or plain text. Outside 2xx such a body
/// is kept as a JSON string so the status still gets classified.
fn parse_body(target: &str, status: u16, text: &str) -> TransportResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(e) if (200..300).contains(&status) => Err(TransportError::malformed(target, e.to_string())),
        Err(e) => {
            debug!("Non-JSON body with status {} from {}: {}", status, target, e);
            Ok(Value::String(text.to_string()))
        }
    }
}

/// Turns a lookup response into presence or absence.
///
/// A found list node comes back as `{"module:list": [entry]}`; the first
/// entry is returned.
fn classify_lookup(target: &str, status: u16, body: Value) -> TransportResult<InterfaceLookup> {
    if ABSENT_STATUSES.contains(&status) {
        return Ok(InterfaceLookup::Absent(status));
    }
    if !(200..300).contains(&status) {
        return Err(TransportError::status(target, status));
    }

    let entry = match &body {
        Value::Object(object) if object.len() == 1 => object
            .values()
            .next()
            .and_then(|list| as_list(list).first())
            .cloned(),
        _ => None,
    };
    entry
        .map(InterfaceLookup::Present)
        .ok_or_else(|| TransportError::malformed(target, "expected a single list node"))
}

#[async_trait]
impl ControlApi for RestconfClient {
    #[instrument(skip(self, input))]
    async fn invoke(&self, operation: &str, input: Value) -> TransportResult<RpcResponse> {
        let url = self.url(&["rests", "operations", operation]);
        let (status, output) = self.send(Method::POST, url, None, Some(&input)).await?;
        Ok(RpcResponse::new(status, output))
    }

    async fn get_interface(&self, node_id: &str, name: &str) -> TransportResult<InterfaceLookup> {
        self.lookup(node_id, format!("interface={}", name)).await
    }

    async fn get_roadm_connection(
        &self,
        node_id: &str,
        name: &str,
    ) -> TransportResult<InterfaceLookup> {
        self.lookup(node_id, format!("roadm-connections={}", name)).await
    }
}

/// Read session over a node's mount point.
///
/// RESTCONF is stateless, so opening and closing only bind and release
/// the node id.
#[derive(Debug)]
pub struct RestconfSession {
    client: RestconfClient,
    node_id: Option<String>,
}

#[async_trait]
impl ManagementSession for RestconfSession {
    async fn read(&mut self, request: &ReadRequest) -> TransportResult<Value> {
        let node_id = self
            .node_id
            .as_deref()
            .ok_or_else(|| TransportError::unavailable("session", "session closed"))?;

        let content = match request {
            ReadRequest::DeviceConfig => Content::Config,
            ReadRequest::CurrentPm(_) | ReadRequest::ActiveAlarms => Content::Nonconfig,
        };
        let url = self.client.device_url(node_id, &request.restconf_segments());
        let target = url.to_string();
        let (status, body) = self.client.send(Method::GET, url, Some(content), None).await?;
        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(TransportError::status(target, status))
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.node_id = None;
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for RestconfClient {
    async fn open(&self, node_id: &str) -> TransportResult<Box<dyn ManagementSession>> {
        Ok(Box::new(RestconfSession {
            client: self.clone(),
            node_id: Some(node_id.to_string()),
        }))
    }
}
