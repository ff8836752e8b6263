/// GET /
pub async fn health_check() -> &'static str {
    "Proxy is running"
}
