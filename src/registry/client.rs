//! Registry REST client.

use super::error::ApiError;
use super::{PublishedVersion, RegistryClient, RegistryConnector};
use crate::credentials::Identity;
use crate::error::CredentialError;
use crate::host::Hostname;
use crate::module::ModuleSpec;
use crate::net::{self, SendError};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

const ARCHIVES_PATH: &str = "/api/archives";
const MODULE_VERSIONS_PATH: &str = "/api/terraform-module-versions";

#[derive(Debug, Deserialize)]
struct ArchiveDocument {
    data: ArchiveData,
    meta: ArchiveMeta,
}

#[derive(Debug, Deserialize)]
struct ArchiveData {
    #[serde(rename = "signed-id")]
    signed_id: String,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArchiveMeta {
    #[serde(rename = "upload-url")]
    upload_url: String,
    #[serde(default)]
    headers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct VersionDocument {
    data: VersionData,
}

#[derive(Debug, Deserialize)]
struct VersionData {
    id: String,
    #[serde(default)]
    attributes: Option<VersionFields>,
    #[serde(flatten)]
    flat: VersionFields,
}

#[derive(Debug, Default, Deserialize)]
struct VersionFields {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    system: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
}

/// Authenticated client for one registry host
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    http_client: reqwest::Client,
    host: Hostname,
    authorization: HeaderValue,
}

impl HttpRegistryClient {
    /// Create a client sending `identity`'s token as a bearer credential
    pub fn new(http_client: reqwest::Client, identity: &Identity) -> Result<Self, CredentialError> {
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", identity.token.expose())).map_err(|_| {
                CredentialError::ClientConstruction {
                    reason: "access token contains characters not allowed in a header".to_string(),
                }
            })?;
        authorization.set_sensitive(true);

        Ok(Self {
            http_client,
            host: identity.host.clone(),
            authorization,
        })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, ApiError> {
        let response = net::send(request, cancel).await.map_err(|e| match e {
            SendError::Cancelled => ApiError::Cancelled,
            SendError::Transport(e) => ApiError::Transport(e.to_string()),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = net::error_body(response).await;
        log::debug!("Registry responded {status}: {body}");
        Err(ApiError::from_parts(status.as_u16(), &body))
    }

    async fn create_archive(
        &self,
        filename: &str,
        cancel: &CancellationToken,
    ) -> Result<ArchiveDocument, ApiError> {
        let body = json!({
            "data": {
                "type": "archives",
                "attributes": { "filename": filename }
            }
        });
        let request = self
            .http_client
            .post(self.host.url(ARCHIVES_PATH))
            .header(header::AUTHORIZATION, self.authorization.clone())
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .timeout(net::REQUEST_TIMEOUT);

        self.send(request, cancel)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl RegistryClient for HttpRegistryClient {
    fn endpoint(&self) -> &Hostname {
        &self.host
    }

    async fn upload_archive(
        &self,
        filename: &str,
        size_hint: u64,
        file: tokio::fs::File,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let archive = self.create_archive(filename, cancel).await?;
        log::debug!(
            "Uploading {} as {}",
            filename,
            archive.data.filename.as_deref().unwrap_or(filename)
        );

        let mut headers = HeaderMap::new();
        for (name, value) in &archive.meta.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => log::warn!("Skipping invalid upload header '{name}'"),
            }
        }

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let request = self
            .http_client
            .put(&archive.meta.upload_url)
            .headers(headers)
            .header(header::CONTENT_LENGTH, size_hint)
            .body(body)
            .timeout(net::UPLOAD_TIMEOUT);

        self.send(request, cancel).await?;
        Ok(archive.data.signed_id)
    }

    async fn create_module_version(
        &self,
        spec: &ModuleSpec,
        archive_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PublishedVersion, ApiError> {
        let body = json!({
            "data": {
                "type": "terraform-module-versions",
                "attributes": {
                    "name": spec.name,
                    "namespace": spec.namespace,
                    "system": spec.system,
                    "version": spec.version,
                    "archive-id": archive_id,
                }
            }
        });
        let request = self
            .http_client
            .post(self.host.url(MODULE_VERSIONS_PATH))
            .header(header::AUTHORIZATION, self.authorization.clone())
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .timeout(net::REQUEST_TIMEOUT);

        let document: VersionDocument = self
            .send(request, cancel)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(published_version(document.data, spec))
    }
}

fn published_version(data: VersionData, spec: &ModuleSpec) -> PublishedVersion {
    let fields = data.attributes.unwrap_or(data.flat);
    PublishedVersion {
        id: data.id,
        namespace: fields.namespace.unwrap_or_else(|| spec.namespace.clone()),
        name: fields.name.unwrap_or_else(|| spec.name.clone()),
        system: fields.system.unwrap_or_else(|| spec.system.clone()),
        version: fields.version.unwrap_or_else(|| spec.version.clone()),
    }
}

/// Builds [`HttpRegistryClient`]s over a shared connection pool
#[derive(Debug, Clone)]
pub struct HttpRegistryConnector {
    http_client: reqwest::Client,
}

impl HttpRegistryConnector {
    /// Create a connector sharing `http_client`
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl RegistryConnector for HttpRegistryConnector {
    type Client = HttpRegistryClient;

    fn connect(&self, identity: &Identity) -> Result<Self::Client, CredentialError> {
        HttpRegistryClient::new(self.http_client.clone(), identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AccessToken, CredentialKind};
    use std::path::PathBuf;

    fn spec() -> ModuleSpec {
        ModuleSpec {
            namespace: "my-example-org".into(),
            name: "moduleB".into(),
            system: "null".into(),
            version: "1.2.3".into(),
            directory: PathBuf::from("."),
        }
    }

    #[test]
    fn test_decode_flat_version_document() {
        let body = r#"{"data":{"id":"mv-1234","name":"moduleB","system":"null","version":"1.2.3","namespace":"my-example-org"}}"#;
        let document: VersionDocument = serde_json::from_str(body).unwrap();
        let version = published_version(document.data, &spec());
        assert_eq!(version.id, "mv-1234");
        assert_eq!(version.name, "moduleB");
        assert_eq!(version.namespace, "my-example-org");
    }

    #[test]
    fn test_decode_json_api_version_document() {
        let body = r#"{"data":{"id":"mv-1","type":"terraform-module-versions","attributes":{"name":"net","system":"aws","version":"2.0.0","namespace":"acme"}}}"#;
        let document: VersionDocument = serde_json::from_str(body).unwrap();
        let version = published_version(document.data, &spec());
        assert_eq!(version.name, "net");
        assert_eq!(version.system, "aws");
        assert_eq!(version.version, "2.0.0");
    }

    #[test]
    fn test_decode_archive_document() {
        let body = r#"{"data": {"signed-id": "123","filename":"slug.tar.gz"}, "meta":{"upload-url": "https://example.com/upload-blob", "headers": {"Content-Type":"application/gzip"}}}"#;
        let document: ArchiveDocument = serde_json::from_str(body).unwrap();
        assert_eq!(document.data.signed_id, "123");
        assert_eq!(document.meta.upload_url, "https://example.com/upload-blob");
        assert_eq!(document.meta.headers["Content-Type"], "application/gzip");
    }

    #[test]
    fn test_connect_rejects_unprintable_token() {
        let identity = Identity {
            host: Hostname::parse("example.com").unwrap(),
            token: AccessToken::new("bad\ntoken"),
            kind: CredentialKind::ExplicitToken,
        };
        let connector = HttpRegistryConnector::new(reqwest::Client::new());
        assert!(matches!(
            connector.connect(&identity),
            Err(CredentialError::ClientConstruction { .. })
        ));
    }
}
