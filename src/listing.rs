//! Search, category filter and column sort over the fund listing.

use crate::fund::Fund;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// `"all"` selects every category; anything else is an exact category.
    pub fn parse(s: &str) -> CategoryFilter {
        if s == "all" {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(s.to_string())
        }
    }

    pub fn matches(&self, fund: &Fund) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => fund.category == *category,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "All Categories",
            CategoryFilter::Only(category) => category,
        }
    }

    /// The next selection when cycling through `all` and then `categories`
    /// in order, wrapping back to `all`.
    pub fn cycle(&self, categories: &[String]) -> CategoryFilter {
        let next_index = match self {
            CategoryFilter::All => 0,
            CategoryFilter::Only(current) => match categories.iter().position(|c| c == current) {
                Some(i) => i + 1,
                None => categories.len(),
            },
        };
        match categories.get(next_index) {
            Some(category) => CategoryFilter::Only(category.clone()),
            None => CategoryFilter::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Code,
    Nav,
    Category,
}

impl SortKey {
    pub fn all() -> &'static [SortKey] {
        &[SortKey::Name, SortKey::Code, SortKey::Category, SortKey::Nav]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Code => "code",
            SortKey::Nav => "nav",
            SortKey::Category => "category",
        }
    }

    fn compare(self, a: &Fund, b: &Fund) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Code => a.code.cmp(&b.code),
            SortKey::Category => a.category.cmp(&b.category),
            SortKey::Nav => a.nav.total_cmp(&b.nav),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "code" => Ok(SortKey::Code),
            "nav" => Ok(SortKey::Nav),
            "category" => Ok(SortKey::Category),
            _ => Err(format!("Unknown sort key: '{s}'")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    /// Selecting the active key flips the direction; a different key starts
    /// ascending.
    pub fn select(self, key: SortKey) -> SortState {
        if key == self.key {
            SortState {
                key,
                direction: self.direction.toggled(),
            }
        } else {
            SortState {
                key,
                direction: SortDirection::Asc,
            }
        }
    }
}

/// Funds whose name or code contains `search` (case-insensitive) and whose
/// category passes `category`, in input order.
pub fn filter_funds<'a>(funds: &'a [Fund], search: &str, category: &CategoryFilter) -> Vec<&'a Fund> {
    let needle = search.to_lowercase();
    funds
        .iter()
        .filter(|fund| {
            let matches_search = fund.name.to_lowercase().contains(&needle)
                || fund.code.to_lowercase().contains(&needle);
            matches_search && category.matches(fund)
        })
        .collect()
}

/// Stable sort of `funds` by `sort`.
pub fn sort_funds(funds: &mut [&Fund], sort: SortState) {
    funds.sort_by(|a, b| {
        let ordering = sort.key.compare(a, b);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// The rows of the funds table for the current selections.
pub fn visible_funds<'a>(
    funds: &'a [Fund],
    search: &str,
    category: &CategoryFilter,
    sort: SortState,
) -> Vec<&'a Fund> {
    let mut visible = filter_funds(funds, search, category);
    sort_funds(&mut visible, sort);
    visible
}
