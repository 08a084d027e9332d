use std::sync::Arc;

use exoclass::{context::AppContext, server};
use tokio::{net::TcpListener, task::JoinHandle};

/// Server bound to an ephemeral localhost port for the duration of a test.
pub struct TestServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(ctx: AppContext) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let app = server::router(Arc::new(ctx));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Reply {
        let url = self.url(path);
        tokio::task::spawn_blocking(move || Reply::from_result(ureq::get(&url).call()))
            .await
            .expect("request task")
    }

    pub async fn post_json(&self, path: &str, body: &str) -> Reply {
        let url = self.url(path);
        let body = body.to_string();
        tokio::task::spawn_blocking(move || {
            Reply::from_result(
                ureq::post(&url)
                    .set("Content-Type", "application/json")
                    .send_string(&body),
            )
        })
        .await
        .expect("request task")
    }

    /// CORS preflight from a browser origin for the given method.
    pub async fn preflight(&self, path: &str, origin: &str, method: &str) -> Reply {
        let url = self.url(path);
        let origin = origin.to_string();
        let method = method.to_string();
        tokio::task::spawn_blocking(move || {
            Reply::from_result(
                ureq::request("OPTIONS", &url)
                    .set("Origin", &origin)
                    .set("Access-Control-Request-Method", &method)
                    .set("Access-Control-Request-Headers", "content-type")
                    .call(),
            )
        })
        .await
        .expect("request task")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Status, selected headers and body of a response.
pub struct Reply {
    pub status: u16,
    pub content_type: Option<String>,
    pub allow_origin: Option<String>,
    pub allow_methods: Option<String>,
    pub body: String,
}

impl Reply {
    fn from_result(result: Result<ureq::Response, ureq::Error>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(err) => panic!("transport error: {err}"),
        };
        let status = response.status();
        let content_type = response.header("content-type").map(str::to_string);
        let allow_origin = response
            .header("access-control-allow-origin")
            .map(str::to_string);
        let allow_methods = response
            .header("access-control-allow-methods")
            .map(str::to_string);
        let body = response.into_string().expect("read body");
        Self {
            status,
            content_type,
            allow_origin,
            allow_methods,
            body,
        }
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}
