/**
 * Audit Trail
 * Best-effort system log entries written next to the tracing output
 */
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::db::models::{LogLevel, NewSystemLog};
use crate::store::SiteStore;

/// Caller address and user agent of the current request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: String,
}

impl ClientInfo {
    pub fn ip_or_unknown(&self) -> &str {
        self.ip.as_deref().unwrap_or("unknown")
    }
}

/// First hop of `X-Forwarded-For`, if present.
fn forwarded_for(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ip = match forwarded_for(parts) {
            Some(ip) => Some(ip),
            None => ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
                .await
                .ok()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        };
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(Self { ip, user_agent })
    }
}

/// Writes audit entries through the store. Failures are logged and dropped
/// so they never change a request's outcome.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn SiteStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn SiteStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        source: &str,
        client: &ClientInfo,
    ) {
        let message = message.into();
        match level {
            LogLevel::Error => tracing::error!(source, "{}", message),
            LogLevel::Warning => tracing::warn!(source, "{}", message),
            LogLevel::Info | LogLevel::Success => tracing::info!(source, "{}", message),
        }

        let entry = NewSystemLog {
            log_level: level,
            message,
            source: source.to_string(),
            user_ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
        };
        if let Err(e) = self.store.append_log(entry).await {
            tracing::warn!(error = %e, source, "failed to write audit entry");
        }
    }

    pub async fn info(&self, message: impl Into<String>, source: &str, client: &ClientInfo) {
        self.record(LogLevel::Info, message, source, client).await;
    }

    pub async fn success(&self, message: impl Into<String>, source: &str, client: &ClientInfo) {
        self.record(LogLevel::Success, message, source, client).await;
    }

    pub async fn warning(&self, message: impl Into<String>, source: &str, client: &ClientInfo) {
        self.record(LogLevel::Warning, message, source, client).await;
    }

    pub async fn error(&self, message: impl Into<String>, source: &str, client: &ClientInfo) {
        self.record(LogLevel::Error, message, source, client).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::LogFilter;
    use crate::store::MemoryStore;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;

    fn client() -> ClientInfo {
        ClientInfo {
            ip: Some("203.0.113.9".to_string()),
            user_agent: "test-agent".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_appends_entry() {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditLog::new(store.clone());
        audit.success("saved", "contact_form", &client()).await;

        let logs = store
            .list_logs(LogFilter {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].log_level, LogLevel::Success);
        assert_eq!(logs[0].user_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(logs[0].user_agent, "test-agent");
    }

    #[tokio::test]
    async fn test_failed_write_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.fail_log_writes(true).await;
        let audit = AuditLog::new(store.clone());
        audit.error("boom", "test", &client()).await;
        store.fail_log_writes(false).await;

        let logs = store
            .list_logs(LogFilter {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_client_info_prefers_forwarded_for() {
        let (mut parts, _) = Request::builder()
            .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
            .header("user-agent", "curl/8")
            .body(())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let info = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.ip.as_deref(), Some("198.51.100.4"));
        assert_eq!(info.user_agent, "curl/8");
    }

    #[tokio::test]
    async fn test_client_info_falls_back_to_peer_address() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let info = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.ip_or_unknown(), "127.0.0.1");
        assert!(info.user_agent.is_empty());
    }

    #[tokio::test]
    async fn test_client_info_reads_mock_connect_info() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts
            .extensions
            .insert(MockConnectInfo(SocketAddr::from(([192, 0, 2, 10], 5555))));

        let info = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.ip.as_deref(), Some("192.0.2.10"));
    }

    #[tokio::test]
    async fn test_client_info_without_peer_is_unknown() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let info = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.ip_or_unknown(), "unknown");
    }
}
