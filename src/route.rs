use crate::error::RouteError;
use std::fmt;
use std::str::FromStr;

/// The views of the application, addressed by path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Dashboard,
    Funds,
    FundDetail(String),
    Portfolio,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Funds => "Funds",
            Route::FundDetail(_) => "Fund Detail",
            Route::Portfolio => "Portfolio",
        }
    }

    /// Top-level entries of the navigation bar. The detail view is reached
    /// from the funds list and is highlighted as part of it.
    pub fn nav_entries() -> &'static [Route] {
        &[Route::Dashboard, Route::Funds, Route::Portfolio]
    }

    pub fn nav_index(&self) -> usize {
        match self {
            Route::Dashboard => 0,
            Route::Funds | Route::FundDetail(_) => 1,
            Route::Portfolio => 2,
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Ok(Route::Dashboard),
            ["funds"] => Ok(Route::Funds),
            ["funds", id] => Ok(Route::FundDetail((*id).to_string())),
            ["portfolio"] => Ok(Route::Portfolio),
            _ => Err(RouteError::NotFound(trimmed.to_string())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Dashboard => write!(f, "/"),
            Route::Funds => write!(f, "/funds"),
            Route::FundDetail(id) => write!(f, "/funds/{id}"),
            Route::Portfolio => write!(f, "/portfolio"),
        }
    }
}
