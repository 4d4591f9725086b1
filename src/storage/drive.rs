//! Google Drive v3 implementation of [`RemoteObjectStore`] over blocking HTTP.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use crate::storage::{RemoteError, RemoteObjectStore};

const JSON_MIME: &str = "application/json";

#[derive(Debug, Clone)]
pub struct DriveClient {
    http: Client,
    base_url: Url,
}

impl DriveClient {
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| RemoteError::InvalidResponse(format!("invalid API base `{base_url}`: {err}")))?;
        let http = Client::builder().build()?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|err| RemoteError::InvalidResponse(format!("bad endpoint `{path}`: {err}")))
    }

    fn send(&self, request: RequestBuilder, token: &str) -> Result<Response, RemoteError> {
        let response = request.bearer_auth(token).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(body));
        }
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    id: String,
    #[serde(default)]
    trashed: bool,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileMetadata>,
}

impl RemoteObjectStore for DriveClient {
    fn is_live(&self, token: &str, id: &str) -> Result<bool, RemoteError> {
        let url = self.endpoint(&format!("drive/v3/files/{id}"))?;
        let request = self.http.get(url).query(&[("fields", "id,trashed")]);
        match self.send(request, token) {
            Ok(response) => {
                let meta: FileMetadata = response.json()?;
                Ok(!meta.trashed)
            }
            Err(RemoteError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn find_by_name(&self, token: &str, name: &str) -> Result<Option<String>, RemoteError> {
        let url = self.endpoint("drive/v3/files")?;
        let query = format!("name='{}' and trashed=false", name.replace('\'', "\\'"));
        let request = self.http.get(url).query(&[
            ("q", query.as_str()),
            ("fields", "files(id,name)"),
            ("spaces", "drive"),
            ("pageSize", "1"),
        ]);
        let list: FileList = self.send(request, token)?.json()?;
        Ok(list.files.into_iter().next().map(|file| file.id))
    }

    fn create(&self, token: &str, name: &str, content: &str) -> Result<String, RemoteError> {
        let url = self.endpoint("drive/v3/files")?;
        let request = self
            .http
            .post(url)
            .query(&[("fields", "id")])
            .json(&json!({ "name": name, "mimeType": JSON_MIME }));
        let created: FileMetadata = self.send(request, token)?.json()?;
        if created.id.is_empty() {
            return Err(RemoteError::InvalidResponse(
                "create returned an empty file id".into(),
            ));
        }
        self.overwrite(token, &created.id, content)?;
        Ok(created.id)
    }

    fn read(&self, token: &str, id: &str) -> Result<String, RemoteError> {
        let url = self.endpoint(&format!("drive/v3/files/{id}"))?;
        let request = self.http.get(url).query(&[("alt", "media")]);
        Ok(self.send(request, token)?.text()?)
    }

    fn overwrite(&self, token: &str, id: &str, content: &str) -> Result<(), RemoteError> {
        let url = self.endpoint(&format!("upload/drive/v3/files/{id}"))?;
        let request = self
            .http
            .patch(url)
            .query(&[("uploadType", "media")])
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME))
            .body(content.to_string());
        self.send(request, token)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_onto_base() {
        let client = DriveClient::new("https://www.googleapis.com").unwrap();
        assert_eq!(
            client.endpoint("drive/v3/files/abc").unwrap().as_str(),
            "https://www.googleapis.com/drive/v3/files/abc"
        );
        assert_eq!(
            client.endpoint("upload/drive/v3/files/abc").unwrap().as_str(),
            "https://www.googleapis.com/upload/drive/v3/files/abc"
        );
    }

    #[test]
    fn rejects_invalid_base() {
        assert!(matches!(
            DriveClient::new("not a url"),
            Err(RemoteError::InvalidResponse(_))
        ));
    }

    #[test]
    fn unreachable_host_reports_http_error() {
        let client = DriveClient::new("http://127.0.0.1:9").unwrap();
        let err = client.read("token", "abc").unwrap_err();
        assert!(matches!(err, RemoteError::Http(_)), "unexpected error: {err:?}");
    }
}
