use std::{
    collections::HashSet,
    convert::Infallible,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, RwLock,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::{body, Body, Method, Request, Response, Server, StatusCode};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const MOCK_TOKEN: &str = "tok-mock-signup-0001";
pub const MOCK_COOKIE: &str = "_session=abc123";

/// In-memory signup service: a set of available handles plus recordings of
/// what the probe actually sent.
#[derive(Clone)]
pub struct MockSignup {
    inner: Arc<MockSignupInner>,
}

struct MockSignupInner {
    available: RwLock<HashSet<String>>,
    checks_served: AtomicU64,
    last_token: Mutex<Option<String>>,
    last_cookie: Mutex<Option<String>>,
    stall: RwLock<Option<Duration>>,
}

impl MockSignup {
    pub fn new(available: &[&str]) -> Self {
        Self {
            inner: Arc::new(MockSignupInner {
                available: RwLock::new(available.iter().map(|s| s.to_string()).collect()),
                checks_served: AtomicU64::new(0),
                last_token: Mutex::new(None),
                last_cookie: Mutex::new(None),
                stall: RwLock::new(None),
            }),
        }
    }

    /// Makes every signup check sleep before answering.
    pub fn stall_for(&self, delay: Duration) {
        *self.inner.stall.write().expect("mock signup poisoned") = Some(delay);
    }

    pub fn checks_served(&self) -> u64 {
        self.inner.checks_served.load(Ordering::SeqCst)
    }

    pub fn last_token(&self) -> Option<String> {
        self.inner
            .last_token
            .lock()
            .expect("mock signup poisoned")
            .clone()
    }

    pub fn last_cookie(&self) -> Option<String> {
        self.inner
            .last_cookie
            .lock()
            .expect("mock signup poisoned")
            .clone()
    }

    fn is_available(&self, handle: &str) -> bool {
        self.inner
            .available
            .read()
            .expect("mock signup poisoned")
            .contains(handle)
    }

    fn record_check(&self, token: Option<String>, cookie: Option<String>) {
        self.inner.checks_served.fetch_add(1, Ordering::SeqCst);
        *self.inner.last_token.lock().expect("mock signup poisoned") = token;
        *self.inner.last_cookie.lock().expect("mock signup poisoned") = cookie;
    }

    fn stall(&self) -> Option<Duration> {
        *self.inner.stall.read().expect("mock signup poisoned")
    }
}

pub struct MockSignupServer {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockSignupServer {
    pub async fn start(service: MockSignup) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock signup listener")?;
        let addr = listener
            .local_addr()
            .context("failed to read mock listener address")?;
        let std_listener = listener
            .into_std()
            .context("failed to convert mock listener")?;
        std_listener
            .set_nonblocking(true)
            .context("failed to set mock listener non-blocking")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let make_service = make_service_fn(move |_| {
            let service = service.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    serve_request(service.clone(), req)
                }))
            }
        });

        let server = Server::from_tcp(std_listener)
            .context("failed to build mock HTTP server")?
            .serve(make_service);
        let graceful = server.with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });

        let handle = tokio::spawn(async move {
            if let Err(err) = graceful.await {
                eprintln!("mock signup server stopped: {err}");
            }
        });

        Ok(Self {
            url: format!("http://{}", addr),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn session_url(&self) -> String {
        format!("{}/session", self.url)
    }

    pub fn check_url(&self) -> String {
        format!("{}/signup_check/username", self.url)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn serve_request(
    service: MockSignup,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/session") => Ok(session_page()),
        (&Method::POST, "/signup_check/username") => Ok(signup_check(service, req).await),
        _ => {
            let mut response = Response::new(Body::from("not found"));
            *response.status_mut() = StatusCode::NOT_FOUND;
            Ok(response)
        }
    }
}

fn session_page() -> Response<Body> {
    let html = format!(
        r#"<html><body><form action="/join"><input type="hidden" name="authenticity_token" value="{MOCK_TOKEN}" /></form></body></html>"#
    );
    Response::builder()
        .status(StatusCode::OK)
        .header(hyper::header::CONTENT_TYPE, "text/html")
        .header(
            hyper::header::SET_COOKIE,
            format!("{MOCK_COOKIE}; Path=/; HttpOnly"),
        )
        .body(Body::from(html))
        .expect("session response must build")
}

async fn signup_check(service: MockSignup, req: Request<Body>) -> Response<Body> {
    if let Some(delay) = service.stall() {
        tokio::time::sleep(delay).await;
    }

    let cookie = req
        .headers()
        .get(hyper::header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let bytes = match body::to_bytes(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let mut response = Response::new(Body::from(format!("failed to read body: {err}")));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return response;
        }
    };

    let mut value = None;
    let mut token = None;
    for (key, field) in form_urlencoded::parse(&bytes) {
        match key.as_ref() {
            "value" => value = Some(field.into_owned()),
            "authenticity_token" => token = Some(field.into_owned()),
            _ => {}
        }
    }

    service.record_check(token, cookie);

    let Some(handle) = value else {
        let mut response = Response::new(Body::from("missing value field"));
        *response.status_mut() = StatusCode::BAD_REQUEST;
        return response;
    };

    if service.is_available(&handle) {
        Response::new(Body::from("available"))
    } else {
        let mut response = Response::new(Body::from("taken"));
        *response.status_mut() = StatusCode::NOT_FOUND;
        response
    }
}
