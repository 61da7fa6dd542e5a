//! Accepts connections, dispatches parsed requests to the [`CacheEngine`], and serializes
//! replies per the wire grammar in `cache-protocol`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cache_core::CacheEngine;
use cache_protocol::{
    decode_request, encode_get_body, CodecError, Request, DELETE_BOOL_HEADER, GET_MISS_BODY,
    SPACE_USED_HEADER,
};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_io_timeout::TimeoutStream;
use tracing::{debug, info, warn};
use warp::hyper::server::conn::Http;
use warp::http::{Response, StatusCode};
use warp::hyper::Body;
use warp::{Filter, Reply};

use crate::config::ServerConfig;

/// A connection idle for longer than this — no bytes read or written — is dropped, mirroring the
/// `expires_after(30s)` deadline the daemon this protocol descends from sets on its raw socket.
/// Also bounds how long a single request is given to dispatch once fully parsed, as a backstop
/// against a runaway future (the engine's own critical sections never block).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the shared [`CacheEngine`] and the warp filter stack that serves it.
pub struct ServerCore {
    engine: Arc<CacheEngine>,
    addr: SocketAddr,
}

impl ServerCore {
    /// Builds a server from `config`, constructing a fresh engine.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let engine = config.build_engine()?;
        let addr = SocketAddr::new(config.bind, config.port);
        Ok(Self {
            engine: Arc::new(engine),
            addr,
        })
    }

    /// Runs the server until `shutdown` resolves, then stops accepting new connections and
    /// returns once in-flight connections have drained.
    pub async fn run(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let (addr, server) = self.bind(shutdown).await?;
        info!(%addr, "cache-server listening");
        server.await;
        info!("cache-server stopped accepting connections, drained");
        Ok(())
    }

    /// Binds the listener and returns its resolved address alongside the future that drives the
    /// server until `shutdown` resolves. Exposed separately from [`Self::run`] so tests can learn
    /// the address of an ephemeral (`port: 0`) binding before awaiting it.
    ///
    /// Each accepted connection is wrapped in a [`TimeoutStream`] with its read and write
    /// deadlines set to [`REQUEST_TIMEOUT`], so a client that opens a connection and never sends
    /// (or stops sending mid-request) a full request does not hang the daemon indefinitely — a
    /// plain `warp::serve`/hyper pairing has no such deadline by default.
    pub async fn bind(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<(SocketAddr, impl std::future::Future<Output = ()> + Send + 'static)> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let service = warp::service(self.routes());

        let serve = async move {
            tokio::pin!(shutdown);
            let mut connections = JoinSet::new();
            loop {
                tokio::select! {
                    _ = &mut shutdown => break,
                    accepted = listener.accept() => {
                        let (stream, _peer) = match accepted {
                            Ok(pair) => pair,
                            Err(err) => {
                                warn!(%err, "failed to accept connection");
                                continue;
                            }
                        };
                        let mut stream = TimeoutStream::new(stream);
                        stream.set_read_timeout(Some(REQUEST_TIMEOUT));
                        stream.set_write_timeout(Some(REQUEST_TIMEOUT));
                        let service = service.clone();
                        connections.spawn(async move {
                            if let Err(err) = Http::new().serve_connection(Box::pin(stream), service).await {
                                debug!(%err, "connection closed with an error");
                            }
                        });
                    }
                }
            }
            while connections.join_next().await.is_some() {}
        };

        Ok((local_addr, serve))
    }

    fn routes(&self) -> impl Filter<Extract = (warp::reply::Response,), Error = Infallible> + Clone {
        let engine = self.engine.clone();
        warp::method()
            .and(warp::path::full())
            .and(warp::any().map(move || engine.clone()))
            .and_then(handle)
    }
}

async fn handle(
    method: warp::http::Method,
    path: warp::path::FullPath,
    engine: Arc<CacheEngine>,
) -> Result<warp::reply::Response, Infallible> {
    match tokio::time::timeout(REQUEST_TIMEOUT, dispatch_request(method.clone(), path, engine)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            warn!(method = %method, "request exceeded the dispatch timeout");
            Ok(Response::builder()
                .status(StatusCode::REQUEST_TIMEOUT)
                .body(Body::empty())
                .expect("response builder inputs are always valid")
                .into_response())
        }
    }
}

async fn dispatch_request(
    method: warp::http::Method,
    path: warp::path::FullPath,
    engine: Arc<CacheEngine>,
) -> warp::reply::Response {
    match decode_request(method.as_str(), path.as_str()) {
        Ok(request) => dispatch(request, &engine),
        Err(CodecError::UnknownPostRoute(route)) => {
            warn!(route, "POST to unknown route, only /reset exists");
            unknown_post_route(engine.space_used())
        }
        Err(err) => {
            warn!(method = %method, path = path.as_str(), error = %err, "rejected malformed request");
            bad_request(err)
        }
    }
}

fn dispatch(request: Request, engine: &CacheEngine) -> warp::reply::Response {
    match request {
        Request::Set { key, value } => {
            let bytes = cache_protocol::encode_value(&value);
            let size = bytes.len();
            engine.set(&key, &bytes, size);
            plain(StatusCode::OK, engine.space_used(), None, None)
        }
        Request::Get { key } => match engine.get(&key) {
            Some(bytes) => match encode_get_body(&key, &bytes) {
                Ok(json) => json_ok(engine.space_used(), json),
                Err(err) => bad_request(err),
            },
            None => not_found(engine.space_used()),
        },
        Request::Delete { key } => {
            let found = engine.del(&key);
            plain(StatusCode::OK, engine.space_used(), Some(found), None)
        }
        Request::Reset => {
            engine.reset();
            plain(StatusCode::OK, engine.space_used(), None, None)
        }
        Request::Space => plain(StatusCode::OK, engine.space_used(), None, None),
    }
}

fn plain(
    status: StatusCode,
    space_used: usize,
    delete_bool: Option<bool>,
    body: Option<String>,
) -> warp::reply::Response {
    let mut builder = Response::builder()
        .status(status)
        .header(SPACE_USED_HEADER, space_used.to_string());
    if let Some(found) = delete_bool {
        builder = builder.header(DELETE_BOOL_HEADER, if found { "true" } else { "false" });
    }
    builder
        .body(Body::from(body.unwrap_or_default()))
        .expect("response builder inputs are always valid")
        .into_response()
}

fn json_ok(space_used: usize, body: String) -> warp::reply::Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(SPACE_USED_HEADER, space_used.to_string())
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .expect("response builder inputs are always valid")
        .into_response()
}

fn not_found(space_used: usize) -> warp::reply::Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(SPACE_USED_HEADER, space_used.to_string())
        .header("Content-Type", "text/plain")
        .body(Body::from(GET_MISS_BODY))
        .expect("response builder inputs are always valid")
        .into_response()
}

/// A POST to anything other than `/reset`: 404, mirroring the daemon this protocol descends
/// from, which only overrides its default not-found response when the target is `/reset`.
fn unknown_post_route(space_used: usize) -> warp::reply::Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(SPACE_USED_HEADER, space_used.to_string())
        .header("Content-Type", "application/json")
        .body(Body::empty())
        .expect("response builder inputs are always valid")
        .into_response()
}

fn bad_request(err: CodecError) -> warp::reply::Response {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "text/html")
        .body(Body::from(err.to_string()))
        .expect("response builder inputs are always valid")
        .into_response()
}
