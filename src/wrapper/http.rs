use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum HeaderKey {
    Accept,
    ContentType,
    Custom(String),
}

impl HeaderKey {
    fn as_str(&self) -> &str {
        match self {
            HeaderKey::Accept => "Accept",
            HeaderKey::ContentType => "Content-Type",
            HeaderKey::Custom(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_body(self) -> Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(Error::HttpError(format!(
                "status: {}, body: {}",
                self.status, self.body
            )))
        }
    }

    pub fn into_json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        let body = self.into_body()?;
        let json: T = serde_json::from_str(&body)?;
        Ok(json)
    }
}

#[derive(Debug, Clone)]
pub struct Header {
    key: HeaderKey,
    value: String,
}

impl Header {
    pub fn new(key: HeaderKey, value: String) -> Self {
        Self { key, value }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
}

pub struct Client {
    cli: reqwest::Client,
    dft_headers: Vec<Header>,
}

impl Client {
    pub fn new(opts: &ClientOptions) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(opts.accept_invalid_certs);
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            cli: builder.build()?,
            dft_headers: vec![],
        })
    }

    pub fn set_default_headers(&mut self, headers: Vec<Header>) {
        self.dft_headers = headers;
    }

    pub async fn get(&self, url: &str) -> Result<Response> {
        let builder = self.add_headers(self.cli.get(url));
        Self::send(builder).await
    }

    pub async fn post(&self, url: &str, body: String) -> Result<Response> {
        let builder = self.add_headers(self.cli.post(url)).body(body);
        Self::send(builder).await
    }

    pub async fn put(&self, url: &str, body: String) -> Result<Response> {
        let builder = self.add_headers(self.cli.put(url)).body(body);
        Self::send(builder).await
    }

    pub async fn delete(&self, url: &str) -> Result<Response> {
        let builder = self.add_headers(self.cli.delete(url));
        Self::send(builder).await
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        Ok(Response {
            status: response.status().into(),
            body: response.text().await?,
        })
    }

    fn add_headers(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        for header in &self.dft_headers {
            builder = builder.header(header.key.as_str(), header.value.as_str());
        }

        builder
    }
}
