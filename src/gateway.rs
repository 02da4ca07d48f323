//! Client for the fund API.
//!
//! One attempt per call: no retries and no backoff. Callers decide when to
//! fetch again.

use crate::error::GatewayError;
use crate::fund::{Fund, FundDetail, Health, MarketSummary};
use crate::holding::PortfolioItem;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read operations of the fund API.
#[async_trait]
pub trait FundsGateway: Send + Sync {
    async fn list_funds(&self) -> Result<Vec<Fund>, GatewayError>;

    async fn fund_detail(&self, id: &str) -> Result<FundDetail, GatewayError>;

    async fn categories(&self) -> Result<Vec<String>, GatewayError>;

    async fn portfolio(&self) -> Result<Vec<PortfolioItem>, GatewayError>;

    async fn market_summary(&self) -> Result<MarketSummary, GatewayError>;

    async fn health(&self) -> Result<Health, GatewayError>;
}

/// Body of an error response. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Turns a raw response into a typed record: non-success statuses become
/// [`GatewayError::RequestFailure`] carrying the body's `error` message.
pub(crate) fn decode_response<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
) -> Result<T, GatewayError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty());
        return Err(GatewayError::RequestFailure {
            status: Some(status),
            message,
        });
    }
    Ok(serde_json::from_slice(body)?)
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    pub fn with_default_timeout(base_url: &str) -> Result<Self, GatewayError> {
        Self::new(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");

        let result = self.fetch(&url).await;
        if let Err(e) = &result {
            tracing::warn!(%url, error = %e, "request failed");
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        decode_response(status, &body)
    }
}

#[async_trait]
impl FundsGateway for HttpGateway {
    async fn list_funds(&self) -> Result<Vec<Fund>, GatewayError> {
        self.get("/api/funds").await
    }

    async fn fund_detail(&self, id: &str) -> Result<FundDetail, GatewayError> {
        let path = format!("/api/funds/{}", encode_path_segment(id));
        self.get(&path).await
    }

    async fn categories(&self) -> Result<Vec<String>, GatewayError> {
        let mut categories: Vec<String> = self.get("/api/funds/categories").await?;
        // the server builds this list from a set, so its order is arbitrary
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn portfolio(&self) -> Result<Vec<PortfolioItem>, GatewayError> {
        let items: Vec<PortfolioItem> = self.get("/api/portfolio").await?;
        Ok(items.into_iter().map(PortfolioItem::normalized).collect())
    }

    async fn market_summary(&self) -> Result<MarketSummary, GatewayError> {
        self.get("/api/market/summary").await
    }

    async fn health(&self) -> Result<Health, GatewayError> {
        self.get("/api/health").await
    }
}

fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn funds() -> Json<serde_json::Value> {
        Json(json!([
            {"id": "A1", "code": "A1", "name": "Alpha", "nav": "12.5", "category": "Equity"},
            {"id": "B2", "code": "B2", "name": "Beta", "nav": 7, "category": "Debt"}
        ]))
    }

    async fn fund_detail(Path(id): Path<String>) -> axum::response::Response {
        if id == "A1" {
            Json(json!({
                "id": "A1",
                "code": "A1",
                "name": "Alpha",
                "nav": "12.5",
                "nav_history": [{"Date": "01-01-2024", "NAV": "12.0"}, {"date": "02-01-2024"}],
                "scheme_info": {"scheme_type": "Open Ended"}
            }))
            .into_response()
        } else {
            (StatusCode::NOT_FOUND, Json(json!({"error": "Fund not found"}))).into_response()
        }
    }

    async fn categories() -> Json<serde_json::Value> {
        Json(json!(["Equity", "Debt", "Equity"]))
    }

    async fn portfolio() -> Json<serde_json::Value> {
        Json(json!([{
            "id": 1,
            "fund_code": "120010",
            "fund_name": "HDFC Mid-Cap Opportunities Fund",
            "units": 1000,
            "nav": 45.67,
            "invested_amount": 45670,
            "current_value": 47850,
            "gain_loss": 0,
            "gain_loss_percent": 0,
            "purchase_date": "2023-01-15"
        }]))
    }

    async fn summary() -> axum::response::Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").into_response()
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/api/funds", get(funds))
            .route("/api/funds/categories", get(categories))
            .route("/api/funds/{id}", get(fund_detail))
            .route("/api/portfolio", get(portfolio))
            .route("/api/market/summary", get(summary));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_list_funds() {
        let gateway = HttpGateway::with_default_timeout(&serve().await).unwrap();
        let funds = gateway.list_funds().await.unwrap();
        assert_eq!(funds.len(), 2);
        assert_eq!(funds[0].nav, 12.5);
        assert_eq!(funds[1].nav, 7.0);
    }

    #[tokio::test]
    async fn test_fund_detail_normalizes_history() {
        let gateway = HttpGateway::with_default_timeout(&serve().await).unwrap();
        let detail = gateway.fund_detail("A1").await.unwrap();
        assert_eq!(detail.nav_history.len(), 2);
        assert_eq!(detail.nav_history[0].date, "01-01-2024");
        assert_eq!(detail.nav_history[0].nav, 12.0);
        assert_eq!(detail.nav_history[1].nav, 0.0);
        assert_eq!(detail.scheme_info["scheme_type"], "Open Ended");
    }

    #[tokio::test]
    async fn test_missing_fund_surfaces_server_message() {
        let gateway = HttpGateway::with_default_timeout(&serve().await).unwrap();
        let err = gateway.fund_detail("ZZ").await.unwrap_err();
        assert_eq!(err.server_message(), Some("Fund not found"));
        assert!(matches!(
            err,
            GatewayError::RequestFailure { status: Some(404), .. }
        ));
    }

    #[tokio::test]
    async fn test_error_without_json_body_falls_back() {
        let gateway = HttpGateway::with_default_timeout(&serve().await).unwrap();
        let err = gateway.market_summary().await.unwrap_err();
        assert_eq!(err.server_message(), None);
        assert_eq!(
            err.describe("Failed to fetch market summary"),
            "Failed to fetch market summary"
        );
    }

    #[tokio::test]
    async fn test_categories_are_sorted_and_unique() {
        let gateway = HttpGateway::with_default_timeout(&serve().await).unwrap();
        assert_eq!(gateway.categories().await.unwrap(), vec!["Debt", "Equity"]);
    }

    #[tokio::test]
    async fn test_portfolio_is_normalized() {
        let gateway = HttpGateway::with_default_timeout(&serve().await).unwrap();
        let items = gateway.portfolio().await.unwrap();
        assert_eq!(items[0].gain_loss, 2180.0);
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let gateway = HttpGateway::with_default_timeout(&serve().await).unwrap();
        let err = gateway.health().await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::RequestFailure { status: Some(404), .. }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_http_error() {
        let gateway = HttpGateway::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            gateway.list_funds().await,
            Err(GatewayError::Http(_))
        ));
    }

    #[test]
    fn test_decode_response() {
        let ok: Vec<String> = decode_response(200, br#"["Equity"]"#).unwrap();
        assert_eq!(ok, vec!["Equity"]);

        let err = decode_response::<Vec<String>>(500, br#"{"error": "MFTool not available"}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "MFTool not available");

        let blank = decode_response::<Vec<String>>(500, br#"{"error": ""}"#).unwrap_err();
        assert_eq!(blank.server_message(), None);

        assert!(matches!(
            decode_response::<Vec<String>>(200, b"not json"),
            Err(GatewayError::Decode(_))
        ));
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("120010"), "120010");
        assert_eq!(encode_path_segment("a b/c"), "a%20b%2Fc");
    }
}
