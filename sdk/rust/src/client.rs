use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Endpoint definition as the control API exchanges it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub response_file: String,
    #[serde(default = "yes")]
    pub is_active: bool,
}

fn yes() -> bool {
    true
}

impl Endpoint {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            response_file: String::new(),
            is_active: true,
        }
    }

    pub fn with_response_file(mut self, file: &str) -> Self {
        self.response_file = file.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub ip: String,
    pub port: u16,
    pub endpoints: Vec<Endpoint>,
}

/// Non-2xx answer from the control API.
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "control API returned status {}: {}", self.status, self.body)
    }
}

impl std::error::Error for ApiError {}

pub struct ControlClient {
    client: Client,
    base_url: String,
}

impl ControlClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn status(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self.client.get(format!("{}/api/status", self.base_url)).send().await?;
        json_or_error(resp).await
    }

    pub async fn start(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self.client.post(format!("{}/api/start", self.base_url)).send().await?;
        json_or_error(resp).await
    }

    pub async fn stop(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self.client.post(format!("{}/api/stop", self.base_url)).send().await?;
        json_or_error(resp).await
    }

    pub async fn update_config(&self, update: &ConfigUpdate) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}/api/config", self.base_url))
            .json(update)
            .send()
            .await?;
        json_or_error(resp).await
    }

    pub async fn logs(&self) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
        let resp = self.client.get(format!("{}/api/logs", self.base_url)).send().await?;
        match json_or_error(resp).await? {
            Value::Array(entries) => Ok(entries),
            Value::Null => Ok(Vec::new()),
            other => Err(format!("unexpected logs payload: {other}").into()),
        }
    }

    /// Poll the status until `lifecycle` equals `want`, up to `attempts` times.
    pub async fn wait_for_lifecycle(&self, want: &str, attempts: usize) -> Result<Value, Box<dyn std::error::Error>> {
        for _ in 0..attempts {
            let status = self.status().await?;
            if status["lifecycle"] == want {
                return Ok(status);
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
        Err(format!("lifecycle never reached {want}").into())
    }
}

async fn json_or_error(resp: Response) -> Result<Value, Box<dyn std::error::Error>> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(Box::new(ApiError { status: status.as_u16(), body: text }));
    }
    Ok(serde_json::from_str(&text)?)
}
