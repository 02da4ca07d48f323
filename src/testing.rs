//! In-memory fund API used by the view and terminal tests.

use crate::error::GatewayError;
use crate::fund::{Fund, FundDetail, Health, MarketSummary};
use crate::gateway::FundsGateway;
use crate::holding::PortfolioItem;
use async_trait::async_trait;
use serde_json::json;

pub fn fund(name: &str, code: &str, nav: f64, category: &str) -> Fund {
    serde_json::from_value(json!({
        "id": code, "code": code, "name": name, "nav": nav, "category": category
    }))
    .unwrap()
}

pub fn catalog() -> Vec<Fund> {
    vec![
        fund("Alpha", "A1", 12.5, "Equity"),
        fund("Beta", "B2", 7.0, "Debt"),
        fund("Gamma", "G3", 20.0, "Equity"),
        fund("Delta", "D4", 3.0, "Debt"),
        fund("Epsilon", "E5", 9.0, "Hybrid"),
        fund("Zeta", "Z6", 1.0, "Hybrid"),
    ]
}

pub fn holding(id: i64, invested: f64, current: f64) -> PortfolioItem {
    PortfolioItem {
        current_value: current,
        ..PortfolioItem::acquired(
            id,
            format!("C{id}"),
            format!("Fund {id}"),
            1.0,
            invested,
            "2024-01-01".into(),
        )
    }
}

/// Serves [`catalog`], two holdings and a 45 sample history for fund `A1`.
/// Every other fund id is a 404.
#[derive(Debug, Default)]
pub struct StaticGateway {
    pub fail_summary: bool,
}

#[async_trait]
impl FundsGateway for StaticGateway {
    async fn list_funds(&self) -> Result<Vec<Fund>, GatewayError> {
        Ok(catalog())
    }

    async fn fund_detail(&self, id: &str) -> Result<FundDetail, GatewayError> {
        if id != "A1" {
            return Err(GatewayError::RequestFailure {
                status: Some(404),
                message: Some("Fund not found".into()),
            });
        }
        let history: Vec<serde_json::Value> = (0..45)
            .map(|i| json!({"date": format!("d{i}"), "nav": 10 + i}))
            .collect();
        Ok(serde_json::from_value(json!({
            "id": "A1", "code": "A1", "name": "Alpha", "nav": 12.5,
            "amc": "Alpha AMC",
            "nav_history": history,
            "scheme_info": {"scheme_type": "Open Ended"}
        }))
        .unwrap())
    }

    async fn categories(&self) -> Result<Vec<String>, GatewayError> {
        Ok(vec!["Debt".into(), "Equity".into(), "Hybrid".into()])
    }

    async fn portfolio(&self) -> Result<Vec<PortfolioItem>, GatewayError> {
        Ok(vec![holding(1, 45670.0, 47850.0), holding(2, 33945.0, 35600.0)])
    }

    async fn market_summary(&self) -> Result<MarketSummary, GatewayError> {
        if self.fail_summary {
            return Err(GatewayError::RequestFailure {
                status: Some(500),
                message: None,
            });
        }
        Ok(serde_json::from_value(json!({
            "total_funds": 6,
            "top_performing": [{"code": "G3", "name": "Gamma", "nav": 20.0, "category": "Equity"}],
            "last_updated": "2024-03-01T10:00:00",
            "market_status": "Open"
        }))
        .unwrap())
    }

    async fn health(&self) -> Result<Health, GatewayError> {
        Ok(serde_json::from_value(json!({"status": "healthy"})).unwrap())
    }
}
