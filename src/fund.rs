//! Fund records as served by the fund API.
//!
//! Payloads are normalized here, on ingest, so the rest of the crate only ever
//! sees one canonical shape: NAVs are `f64`, display metadata are strings, and
//! NAV history samples are `{date, nav}` regardless of how the server keyed
//! them.

use crate::lenient;
use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    #[serde(default, deserialize_with = "lenient::display")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::display")]
    pub code: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub name: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub nav: f64,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub nav_date: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub expense_ratio: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub fund_size: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub fund_age: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub min_investment: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub exit_load: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub fund_manager: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub isin: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub amc: String,
}

impl Fund {
    /// Label/value pairs of the descriptive metadata, in display order.
    pub fn metadata(&self) -> [(&'static str, &str); 9] {
        [
            ("Category", self.category.as_str()),
            ("AMC", self.amc.as_str()),
            ("Fund Manager", self.fund_manager.as_str()),
            ("Expense Ratio", self.expense_ratio.as_str()),
            ("Fund Size", self.fund_size.as_str()),
            ("Fund Age", self.fund_age.as_str()),
            ("Min Investment", self.min_investment.as_str()),
            ("Exit Load", self.exit_load.as_str()),
            ("ISIN", self.isin.as_str()),
        ]
    }
}

/// One point of a fund's NAV history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavSample {
    pub date: String,
    pub nav: f64,
}

impl NavSample {
    /// Builds a sample from one raw history entry. Entries may use either the
    /// canonical `date`/`nav` keys or the capitalized `Date`/`NAV` ones.
    pub fn from_value(entry: &Value) -> NavSample {
        let date = first_present(entry, &["date", "Date"])
            .map(lenient::value_to_display)
            .unwrap_or_else(lenient::not_available);
        let nav = first_present(entry, &["nav", "NAV"])
            .map(lenient::value_to_f64)
            .unwrap_or(0.0);

        NavSample { date, nav }
    }
}

// null, "", false and numeric 0 count as missing, so a blank canonical key
// falls through to the capitalized one
fn first_present<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| entry.get(*k)).find(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    })
}

/// Normalizes a raw `nav_history` payload. Accepts a bare array of entries or
/// an object wrapping them under `data`; any other shape is an empty history.
pub fn normalize_history(raw: &Value) -> Vec<NavSample> {
    let entries = match raw {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(entries)) => entries.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    entries.iter().map(NavSample::from_value).collect()
}

fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<NavSample>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(normalize_history(&raw))
}

fn deserialize_scheme_info<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), lenient::value_to_display(v)))
            .collect(),
        _ => BTreeMap::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundDetail {
    #[serde(flatten)]
    pub fund: Fund,
    #[serde(default, deserialize_with = "deserialize_history")]
    pub nav_history: Vec<NavSample>,
    #[serde(default, deserialize_with = "deserialize_scheme_info")]
    pub scheme_info: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFund {
    #[serde(default, deserialize_with = "lenient::display")]
    pub code: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub nav: f64,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_funds: u64,
    #[serde(default)]
    pub top_performing: Vec<TopFund>,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub last_updated: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub market_status: String,
}

impl MarketSummary {
    /// `last_updated` rendered in local time. The server sends a naive ISO
    /// timestamp; anything unparseable is shown verbatim.
    pub fn last_updated_display(&self) -> String {
        let parsed = chrono::DateTime::parse_from_rfc3339(&self.last_updated)
            .map(|dt| dt.with_timezone(&Local))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&self.last_updated, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .and_then(|naive| Local.from_local_datetime(&naive).single())
            });

        match parsed {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.last_updated.clone(),
        }
    }
}

/// Response of the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub status: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub timestamp: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub mftool_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fund_from_server_payload() {
        let fund: Fund = serde_json::from_value(json!({
            "id": "120010",
            "name": "HDFC Mid-Cap Opportunities Fund",
            "code": "120010",
            "category": "Equity",
            "nav": "45.67",
            "nav_date": "15-Jan-2024",
            "expense_ratio": 0.75,
            "amc": null
        }))
        .unwrap();

        assert_eq!(fund.code, "120010");
        assert_eq!(fund.nav, 45.67);
        assert_eq!(fund.expense_ratio, "0.75");
        assert_eq!(fund.amc, "N/A");
        assert_eq!(fund.isin, "N/A");
    }

    #[test]
    fn test_fund_with_numeric_id_and_bad_nav() {
        let fund: Fund =
            serde_json::from_value(json!({"id": 42, "code": 42, "name": "X", "nav": "n/a"}))
                .unwrap();
        assert_eq!(fund.id, "42");
        assert_eq!(fund.nav, 0.0);
    }

    #[test]
    fn test_history_accepts_both_key_styles() {
        let history = normalize_history(&json!([
            {"date": "01-01-2024", "nav": "10.5"},
            {"Date": "02-01-2024", "NAV": 11},
            {"date": "03-01-2024"},
            {"date": "", "Date": "04-01-2024", "nav": null, "NAV": "12"}
        ]));

        assert_eq!(
            history,
            vec![
                NavSample { date: "01-01-2024".into(), nav: 10.5 },
                NavSample { date: "02-01-2024".into(), nav: 11.0 },
                NavSample { date: "03-01-2024".into(), nav: 0.0 },
                NavSample { date: "04-01-2024".into(), nav: 12.0 },
            ]
        );
    }

    #[test]
    fn test_history_zero_nav_falls_back_to_capitalized_key() {
        let history = normalize_history(&json!([
            {"date": "05-01-2024", "nav": 0, "NAV": "13.25"},
            {"date": "06-01-2024", "nav": "0", "NAV": "14"},
            {"date": "07-01-2024", "nav": 0}
        ]));

        let navs: Vec<f64> = history.iter().map(|s| s.nav).collect();
        assert_eq!(navs, vec![13.25, 0.0, 0.0]);
    }

    #[test]
    fn test_history_unwraps_data_object() {
        let history = normalize_history(&json!({"data": [{"date": "d", "nav": "1"}]}));
        assert_eq!(history.len(), 1);
        assert!(normalize_history(&json!("garbage")).is_empty());
        assert!(normalize_history(&json!({"rows": []})).is_empty());
    }

    #[test]
    fn test_history_entry_that_is_not_an_object() {
        assert_eq!(
            NavSample::from_value(&json!(3)),
            NavSample { date: "N/A".into(), nav: 0.0 }
        );
    }

    #[test]
    fn test_fund_detail_without_history() {
        let detail: FundDetail =
            serde_json::from_value(json!({"id": "1", "code": "1", "name": "A", "nav": 2}))
                .unwrap();
        assert!(detail.nav_history.is_empty());
        assert!(detail.scheme_info.is_empty());
        assert_eq!(detail.fund.nav, 2.0);
    }

    #[test]
    fn test_fund_detail_scheme_info_is_stringified() {
        let detail: FundDetail = serde_json::from_value(json!({
            "id": "1",
            "code": "1",
            "nav_history": [{"date": "d", "nav": "3"}],
            "scheme_info": {"scheme_type": "Open Ended", "scheme_start_date": {"date": "x"}, "units": 5}
        }))
        .unwrap();
        assert_eq!(detail.nav_history[0].nav, 3.0);
        assert_eq!(detail.scheme_info["scheme_type"], "Open Ended");
        assert_eq!(detail.scheme_info["units"], "5");
        assert_eq!(detail.scheme_info["scheme_start_date"], r#"{"date":"x"}"#);
    }

    #[test]
    fn test_market_summary_last_updated() {
        let summary: MarketSummary = serde_json::from_value(json!({
            "total_funds": 1500,
            "top_performing": [{"code": "1", "name": "A", "nav": "99.5", "category": "Equity"}],
            "last_updated": "2024-03-01T10:15:30.123456",
            "market_status": "Open"
        }))
        .unwrap();
        assert_eq!(summary.total_funds, 1500);
        assert_eq!(summary.top_performing[0].nav, 99.5);
        assert_eq!(summary.last_updated_display(), "2024-03-01 10:15:30");

        let odd = MarketSummary {
            last_updated: "yesterday".into(),
            ..summary
        };
        assert_eq!(odd.last_updated_display(), "yesterday");
    }
}
