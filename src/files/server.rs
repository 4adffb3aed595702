use std::path::{Path, PathBuf};

use bytes::Bytes;
use sha1::{Digest, Sha1};

use crate::http::connection::Handler;
use crate::http::mime::MediaType;
use crate::http::request::{Method, Request};
use crate::http::response::{MAX_UNCHUNKED_BODY, Response, StatusCode, format_http_date};

/// Served when the request path is `/`.
pub const DEFAULT_TARGET: &str = "/index.html";

/// Used when `error.html` is missing from the template root.
pub const FALLBACK_ERROR_TEMPLATE: &str = "{statusCode} - {serverInfo}";

const ALLOWED_METHODS: &[Method] = &[Method::GET, Method::HEAD, Method::TRACE];

/// Serves files below `root` and error pages from `template_root`.
#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
    template_root: PathBuf,
    server_identity: String,
}

impl FileServer {
    pub fn new(
        root: impl Into<PathBuf>,
        template_root: impl Into<PathBuf>,
        server_identity: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            template_root: template_root.into(),
            server_identity: server_identity.into(),
        }
    }

    async fn serve_file(&self, request: &Request) -> Response {
        let mut path = request.uri.path_string();
        if path == "/" {
            path = DEFAULT_TARGET.to_string();
        }
        let file_path = self.root.join(path.trim_start_matches('/'));

        let content = match tokio::fs::read(&file_path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %file_path.display(), error = %e, "File not served");
                return self
                    .render_error(StatusCode::NotFound, &self.server_identity)
                    .await;
            }
        };

        let media_type = Path::new(&path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(MediaType::from_extension)
            .unwrap_or(MediaType::Binary);

        let mut builder = Response::new(StatusCode::Ok);
        if content.len() <= MAX_UNCHUNKED_BODY {
            builder = builder.with_header("etag", format!("\"{}\"", etag(&content)));
        }
        if let Ok(modified) = tokio::fs::metadata(&file_path)
            .await
            .and_then(|meta| meta.modified())
        {
            builder = builder.with_header("last-modified", format_http_date(modified.into()));
        }

        let mut response = builder.with_body(content, media_type).build();
        if request.method == Method::HEAD {
            // Same headers as GET, no body on the wire.
            response.body = Bytes::new();
            response.chunked = false;
        }
        response
    }

    fn trace(&self, request: &Request) -> Response {
        Response::new(StatusCode::Ok)
            .with_body(request.as_bytes(), MediaType::Http)
            .build()
    }

    async fn render_error(&self, status: StatusCode, server: &str) -> Response {
        let template = tokio::fs::read_to_string(self.template_root.join("error.html"))
            .await
            .unwrap_or_else(|_| FALLBACK_ERROR_TEMPLATE.to_string());

        let body = render_template(&template, status, server);
        Response::new(status)
            .with_body(body, MediaType::Html)
            .build()
    }
}

impl Handler for FileServer {
    fn allowed_methods(&self) -> &[Method] {
        ALLOWED_METHODS
    }

    async fn handle(&self, request: &Request) -> Response {
        match request.method {
            Method::TRACE => self.trace(request),
            _ => self.serve_file(request).await,
        }
    }

    async fn error_response(&self, status: StatusCode, server: &str) -> Response {
        self.render_error(status, server).await
    }
}

/// Fills the `{statusCode}` and `{serverInfo}` placeholders.
pub fn render_template(template: &str, status: StatusCode, server: &str) -> String {
    template
        .replace("{statusCode}", &status.as_u16().to_string())
        .replace("{serverInfo}", server)
}

/// Lowercase hex SHA-1 of the content.
pub fn etag(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
