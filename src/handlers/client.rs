use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::net::SocketAddr;

pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// 限流用的客户端标识：连接对端 IP，其次 X-Forwarded-For 第一项，最后 "anonymous"
///
/// 可以被伪造，只是尽力而为的区分，不是安全控制。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientId(identify(peer, &parts.headers)))
    }
}

fn identify(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(addr) = peer {
        return addr.ip().to_string();
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}
