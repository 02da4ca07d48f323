//! State of each view, independent of how it is drawn.
//!
//! Every view owns what it fetched; nothing is shared between views. Updates
//! consume the current state and return the next one, so the terminal front
//! end only ever swaps whole snapshots.

use crate::error::{GatewayError, StoreError, ValidationError};
use crate::fund::{Fund, FundDetail, MarketSummary, NavSample};
use crate::gateway::FundsGateway;
use crate::history::chart_series;
use crate::holding::{FormField, HoldingForm, PortfolioItem};
use crate::listing::{visible_funds, CategoryFilter, SortKey, SortState};
use crate::portfolio::{Portfolio, PortfolioTotals};
use crate::refresh::{RequestTracker, Ticket};
use crate::route::Route;
use crate::store::PortfolioStore;
use chrono::{DateTime, Local};

/// Number of funds the dashboard lists under "recent funds".
pub const RECENT_FUNDS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadStatus {
    pub loading: bool,
    pub last_updated: Option<DateTime<Local>>,
    pub error: Option<String>,
}

impl LoadStatus {
    fn started(self) -> LoadStatus {
        LoadStatus {
            loading: true,
            ..self
        }
    }

    fn succeeded(self) -> LoadStatus {
        LoadStatus {
            loading: false,
            last_updated: Some(Local::now()),
            error: None,
        }
    }

    fn failed(self, message: String) -> LoadStatus {
        LoadStatus {
            loading: false,
            error: Some(message),
            ..self
        }
    }

    pub fn last_updated_label(&self) -> String {
        self.last_updated
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string())
    }
}

/// Data one fetch brings back for a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Dashboard {
        portfolio: Vec<PortfolioItem>,
        funds: Vec<Fund>,
        summary: MarketSummary,
    },
    Funds(Vec<Fund>),
    FundDetail(FundDetail),
    Portfolio {
        items: Vec<PortfolioItem>,
        funds: Vec<Fund>,
    },
}

/// Fetches everything `route` displays. Views that need several endpoints
/// fail as a whole if any of them fails.
pub async fn load(gateway: &dyn FundsGateway, route: &Route) -> Result<Payload, GatewayError> {
    match route {
        Route::Dashboard => {
            let (portfolio, funds, summary) = futures::try_join!(
                gateway.portfolio(),
                gateway.list_funds(),
                gateway.market_summary()
            )?;
            Ok(Payload::Dashboard {
                portfolio,
                funds,
                summary,
            })
        }
        Route::Funds => Ok(Payload::Funds(gateway.list_funds().await?)),
        Route::FundDetail(id) => Ok(Payload::FundDetail(gateway.fund_detail(id).await?)),
        Route::Portfolio => {
            let (items, funds) = futures::try_join!(gateway.portfolio(), gateway.list_funds())?;
            Ok(Payload::Portfolio { items, funds })
        }
    }
}

fn fallback_message(route: &Route) -> &'static str {
    match route {
        Route::Dashboard => "Failed to fetch dashboard data",
        Route::Funds => "Failed to fetch funds",
        Route::FundDetail(_) => "Failed to fetch fund details",
        Route::Portfolio => "Failed to fetch portfolio data",
    }
}

fn clamp_selection(selected: usize, len: usize) -> usize {
    selected.min(len.saturating_sub(1))
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub status: LoadStatus,
    pub tracker: RequestTracker,
    pub portfolio: Portfolio,
    pub funds: Vec<Fund>,
    pub summary: Option<MarketSummary>,
}

impl DashboardState {
    pub fn totals(&self) -> PortfolioTotals {
        self.portfolio.totals()
    }

    pub fn recent_funds(&self) -> &[Fund] {
        &self.funds[..self.funds.len().min(RECENT_FUNDS)]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FundsAction {
    TypeSearch(char),
    EraseSearch,
    ClearSearch,
    CycleCategory,
    SortBy(SortKey),
    SelectNext,
    SelectPrevious,
    Categories(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct FundsState {
    pub status: LoadStatus,
    pub tracker: RequestTracker,
    pub funds: Vec<Fund>,
    pub categories: Vec<String>,
    pub search: String,
    pub category: CategoryFilter,
    pub sort: SortState,
    pub selected: usize,
}

impl FundsState {
    /// Rows of the table: the fetched funds filtered and sorted by the
    /// current selections.
    pub fn visible(&self) -> Vec<&Fund> {
        visible_funds(&self.funds, &self.search, &self.category, self.sort)
    }

    pub fn selected_fund(&self) -> Option<&Fund> {
        self.visible().get(self.selected).copied()
    }

    pub fn update(self, action: FundsAction) -> FundsState {
        let mut next = match action {
            FundsAction::TypeSearch(c) => {
                let mut search = self.search.clone();
                search.push(c);
                FundsState {
                    search,
                    selected: 0,
                    ..self
                }
            }
            FundsAction::EraseSearch => {
                let mut search = self.search.clone();
                search.pop();
                FundsState {
                    search,
                    selected: 0,
                    ..self
                }
            }
            FundsAction::ClearSearch => FundsState {
                search: String::new(),
                selected: 0,
                ..self
            },
            FundsAction::CycleCategory => FundsState {
                category: self.category.cycle(&self.categories),
                selected: 0,
                ..self
            },
            FundsAction::SortBy(key) => FundsState {
                sort: self.sort.select(key),
                ..self
            },
            FundsAction::SelectNext => FundsState {
                selected: self.selected + 1,
                ..self
            },
            FundsAction::SelectPrevious => FundsState {
                selected: self.selected.saturating_sub(1),
                ..self
            },
            FundsAction::Categories(categories) => FundsState { categories, ..self },
        };
        next.selected = clamp_selection(next.selected, next.visible().len());
        next
    }
}

#[derive(Debug, Clone, Default)]
pub struct FundDetailState {
    pub id: String,
    pub status: LoadStatus,
    pub tracker: RequestTracker,
    pub detail: Option<FundDetail>,
}

impl FundDetailState {
    pub fn series(&self) -> Vec<NavSample> {
        chart_series(self.detail.as_ref().map(|d| d.nav_history.as_slice()))
    }
}

/// A change to the holdings, as requested by the user and later as
/// acknowledged by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(PortfolioItem),
    Update(PortfolioItem),
    Delete(i64),
}

impl Mutation {
    /// Sends the mutation to `store` and returns it as the store
    /// acknowledged it.
    pub async fn apply(self, store: &dyn PortfolioStore) -> Result<Mutation, StoreError> {
        Ok(match self {
            Mutation::Create(item) => Mutation::Create(store.create(item).await?),
            Mutation::Update(item) => Mutation::Update(store.update(item).await?),
            Mutation::Delete(id) => {
                store.delete(id).await?;
                Mutation::Delete(id)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PortfolioMode {
    #[default]
    Browse,
    Form(HoldingForm),
    ConfirmDelete(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortfolioAction {
    SelectNext,
    SelectPrevious,
    OpenAdd,
    OpenEdit,
    RequestDelete,
    Type(char),
    Erase,
    FocusNext,
    FocusPrevious,
    Cancel,
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioState {
    pub status: LoadStatus,
    pub tracker: RequestTracker,
    pub portfolio: Portfolio,
    /// Funds known to the API, used to fill in the name for a typed code.
    pub funds: Vec<Fund>,
    /// Set once the user changed the holdings; later fetches then leave the
    /// holdings alone instead of discarding the local edits.
    pub edited: bool,
    pub selected: usize,
    pub mode: PortfolioMode,
}

impl PortfolioState {
    pub fn selected_item(&self) -> Option<&PortfolioItem> {
        self.portfolio.items.get(self.selected)
    }

    pub fn update(self, action: PortfolioAction) -> PortfolioState {
        let len = self.portfolio.items.len();
        match (action, self.mode.clone()) {
            (PortfolioAction::SelectNext, PortfolioMode::Browse) => PortfolioState {
                selected: clamp_selection(self.selected + 1, len),
                ..self
            },
            (PortfolioAction::SelectPrevious, PortfolioMode::Browse) => PortfolioState {
                selected: self.selected.saturating_sub(1),
                ..self
            },
            (PortfolioAction::OpenAdd, PortfolioMode::Browse) => PortfolioState {
                mode: PortfolioMode::Form(HoldingForm::blank()),
                ..self
            },
            (PortfolioAction::OpenEdit, PortfolioMode::Browse) => {
                match self.selected_item().map(HoldingForm::for_item) {
                    Some(form) => PortfolioState {
                        mode: PortfolioMode::Form(form),
                        ..self
                    },
                    None => self,
                }
            }
            (PortfolioAction::RequestDelete, PortfolioMode::Browse) => {
                match self.selected_item().map(|item| item.id) {
                    Some(id) => PortfolioState {
                        mode: PortfolioMode::ConfirmDelete(id),
                        ..self
                    },
                    None => self,
                }
            }
            (PortfolioAction::Type(c), PortfolioMode::Form(mut form)) => {
                form.push_char(c);
                self.fill_fund_name(&mut form);
                PortfolioState {
                    mode: PortfolioMode::Form(form),
                    ..self
                }
            }
            (PortfolioAction::Erase, PortfolioMode::Form(mut form)) => {
                form.pop_char();
                self.fill_fund_name(&mut form);
                PortfolioState {
                    mode: PortfolioMode::Form(form),
                    ..self
                }
            }
            (PortfolioAction::FocusNext, PortfolioMode::Form(mut form)) => {
                form.focus = form.focus.next();
                PortfolioState {
                    mode: PortfolioMode::Form(form),
                    ..self
                }
            }
            (PortfolioAction::FocusPrevious, PortfolioMode::Form(mut form)) => {
                form.focus = form.focus.previous();
                PortfolioState {
                    mode: PortfolioMode::Form(form),
                    ..self
                }
            }
            (PortfolioAction::Cancel, _) => PortfolioState {
                mode: PortfolioMode::Browse,
                ..self
            },
            _ => self,
        }
    }

    fn fill_fund_name(&self, form: &mut HoldingForm) {
        if form.focus != FormField::FundCode {
            return;
        }
        let known = self.funds.iter().find(|f| f.code == form.fund_code);
        form.autofill_name(known.map(|f| f.name.as_str()));
    }

    /// The change the open dialog asks for: the validated form, or the
    /// confirmed delete. `None` when no dialog is open.
    pub fn pending_mutation(&self, new_id: i64) -> Option<Result<Mutation, ValidationError>> {
        match &self.mode {
            PortfolioMode::Browse => None,
            PortfolioMode::ConfirmDelete(id) => Some(Ok(Mutation::Delete(*id))),
            PortfolioMode::Form(form) => Some(form.submit(new_id).map(|item| {
                if form.editing.is_some() {
                    Mutation::Update(item)
                } else {
                    Mutation::Create(item)
                }
            })),
        }
    }

    /// Applies a mutation the store acknowledged and closes the dialog.
    pub fn acknowledged(mut self, mutation: Mutation) -> PortfolioState {
        match mutation {
            Mutation::Create(item) => {
                self.portfolio.add(item);
                self.selected = self.portfolio.items.len() - 1;
            }
            Mutation::Update(item) => {
                self.portfolio.replace(item);
            }
            Mutation::Delete(id) => {
                self.portfolio.remove(id);
            }
        }
        let len = self.portfolio.items.len();
        PortfolioState {
            edited: true,
            selected: clamp_selection(self.selected, len),
            mode: PortfolioMode::Browse,
            ..self
        }
    }
}

/// The mounted view.
#[derive(Debug, Clone)]
pub enum ViewState {
    Dashboard(DashboardState),
    Funds(FundsState),
    FundDetail(FundDetailState),
    Portfolio(PortfolioState),
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::Dashboard(DashboardState::default())
    }
}

impl ViewState {
    /// Fresh state for the view at `route`, with nothing fetched yet.
    pub fn mount(route: &Route) -> ViewState {
        match route {
            Route::Dashboard => ViewState::Dashboard(DashboardState::default()),
            Route::Funds => ViewState::Funds(FundsState::default()),
            Route::FundDetail(id) => ViewState::FundDetail(FundDetailState {
                id: id.clone(),
                ..FundDetailState::default()
            }),
            Route::Portfolio => ViewState::Portfolio(PortfolioState::default()),
        }
    }

    pub fn route(&self) -> Route {
        match self {
            ViewState::Dashboard(_) => Route::Dashboard,
            ViewState::Funds(_) => Route::Funds,
            ViewState::FundDetail(state) => Route::FundDetail(state.id.clone()),
            ViewState::Portfolio(_) => Route::Portfolio,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        match self {
            ViewState::Dashboard(s) => &s.status,
            ViewState::Funds(s) => &s.status,
            ViewState::FundDetail(s) => &s.status,
            ViewState::Portfolio(s) => &s.status,
        }
    }

    fn parts_mut(&mut self) -> (&mut LoadStatus, &mut RequestTracker) {
        match self {
            ViewState::Dashboard(s) => (&mut s.status, &mut s.tracker),
            ViewState::Funds(s) => (&mut s.status, &mut s.tracker),
            ViewState::FundDetail(s) => (&mut s.status, &mut s.tracker),
            ViewState::Portfolio(s) => (&mut s.status, &mut s.tracker),
        }
    }

    fn tracker(&self) -> &RequestTracker {
        match self {
            ViewState::Dashboard(s) => &s.tracker,
            ViewState::Funds(s) => &s.tracker,
            ViewState::FundDetail(s) => &s.tracker,
            ViewState::Portfolio(s) => &s.tracker,
        }
    }

    /// Marks the view loading and tags the fetch about to start.
    pub fn begin_fetch(mut self) -> (ViewState, Ticket) {
        let (status, tracker) = self.parts_mut();
        let ticket = tracker.issue();
        *status = std::mem::take(status).started();
        (self, ticket)
    }

    /// Applies the outcome of the fetch tagged `ticket`. Outcomes of any
    /// fetch but the latest are dropped.
    pub fn receive(mut self, ticket: Ticket, outcome: Result<Payload, GatewayError>) -> ViewState {
        if !self.tracker().accept(ticket) {
            tracing::debug!(route = %self.route(), ?ticket, "discarding stale response");
            return self;
        }

        let payload = match outcome {
            Ok(payload) => payload,
            Err(e) => {
                let message = e.describe(fallback_message(&self.route()));
                tracing::error!(route = %self.route(), error = %e, "fetch failed");
                let (status, _) = self.parts_mut();
                *status = std::mem::take(status).failed(message);
                return self;
            }
        };

        match (self, payload) {
            (
                ViewState::Dashboard(state),
                Payload::Dashboard {
                    portfolio,
                    funds,
                    summary,
                },
            ) => ViewState::Dashboard(DashboardState {
                status: state.status.succeeded(),
                portfolio: Portfolio::from_items(portfolio),
                funds,
                summary: Some(summary),
                ..state
            }),
            (ViewState::Funds(state), Payload::Funds(funds)) => {
                let mut next = FundsState {
                    status: state.status.succeeded(),
                    funds,
                    ..state
                };
                next.selected = clamp_selection(next.selected, next.visible().len());
                ViewState::Funds(next)
            }
            (ViewState::FundDetail(state), Payload::FundDetail(detail)) => {
                ViewState::FundDetail(FundDetailState {
                    status: state.status.succeeded(),
                    detail: Some(detail),
                    ..state
                })
            }
            (ViewState::Portfolio(state), Payload::Portfolio { items, funds }) => {
                let portfolio = if state.edited {
                    state.portfolio
                } else {
                    Portfolio::from_items(items)
                };
                let selected = clamp_selection(state.selected, portfolio.items.len());
                ViewState::Portfolio(PortfolioState {
                    status: state.status.succeeded(),
                    portfolio,
                    funds,
                    selected,
                    ..state
                })
            }
            (view, payload) => {
                tracing::warn!(route = %view.route(), ?payload, "payload does not belong to view");
                view
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalPortfolioStore;
    use crate::testing::{catalog, fund, StaticGateway};

    async fn mounted(route: Route, gateway: &StaticGateway) -> ViewState {
        let (view, ticket) = ViewState::mount(&route).begin_fetch();
        assert!(view.status().loading);
        let outcome = load(gateway, &route).await;
        view.receive(ticket, outcome)
    }

    #[tokio::test]
    async fn test_dashboard_load() {
        let gateway = StaticGateway::default();
        let ViewState::Dashboard(state) = mounted(Route::Dashboard, &gateway).await else {
            panic!("expected dashboard");
        };
        assert!(!state.status.loading);
        assert!(state.status.last_updated.is_some());
        assert_eq!(state.recent_funds().len(), RECENT_FUNDS);
        assert_eq!(state.totals().gain_loss, 2180.0 + 1655.0);
        assert_eq!(state.summary.map(|s| s.market_status), Some("Open".to_string()));
    }

    #[tokio::test]
    async fn test_dashboard_fails_as_a_whole() {
        let gateway = StaticGateway { fail_summary: true };
        let ViewState::Dashboard(state) = mounted(Route::Dashboard, &gateway).await else {
            panic!("expected dashboard");
        };
        assert!(state.portfolio.is_empty());
        assert!(state.summary.is_none());
        assert_eq!(
            state.status.error.as_deref(),
            Some("Failed to fetch dashboard data")
        );
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let gateway = StaticGateway::default();
        let route = Route::Funds;
        let (view, timed) = ViewState::mount(&route).begin_fetch();
        let (view, manual) = view.begin_fetch();

        let view = view.receive(manual, load(&gateway, &route).await);
        let ViewState::Funds(state) = &view else {
            panic!("expected funds");
        };
        assert_eq!(state.funds.len(), 6);

        // the older timed fetch resolves last and must not overwrite
        let view = view.receive(timed, Ok(Payload::Funds(vec![])));
        let ViewState::Funds(state) = view else {
            panic!("expected funds");
        };
        assert_eq!(state.funds.len(), 6);
    }

    #[tokio::test]
    async fn test_failure_keeps_stale_data() {
        let gateway = StaticGateway::default();
        let view = mounted(Route::Funds, &gateway).await;
        let (view, ticket) = view.begin_fetch();
        let view = view.receive(
            ticket,
            Err(GatewayError::RequestFailure {
                status: Some(500),
                message: Some("MFTool not available".into()),
            }),
        );
        let ViewState::Funds(state) = view else {
            panic!("expected funds");
        };
        assert_eq!(state.funds.len(), 6);
        assert_eq!(state.status.error.as_deref(), Some("MFTool not available"));
        assert!(!state.status.loading);
    }

    #[tokio::test]
    async fn test_funds_search_filter_sort() {
        let gateway = StaticGateway::default();
        let ViewState::Funds(state) = mounted(Route::Funds, &gateway).await else {
            panic!("expected funds");
        };
        let state = state.update(FundsAction::Categories(gateway.categories().await.unwrap()));

        let state = state.update(FundsAction::CycleCategory).update(FundsAction::CycleCategory);
        assert_eq!(state.category, CategoryFilter::Only("Equity".into()));
        let names: Vec<&str> = state.visible().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Gamma"]);

        let state = state.update(FundsAction::SortBy(SortKey::Nav)).update(FundsAction::SortBy(SortKey::Nav));
        let names: Vec<&str> = state.visible().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha"]);

        let state = state
            .update(FundsAction::TypeSearch('a'))
            .update(FundsAction::TypeSearch('L'));
        assert_eq!(state.selected_fund().map(|f| f.code.as_str()), Some("A1"));
    }

    #[tokio::test]
    async fn test_funds_selection_is_clamped() {
        let gateway = StaticGateway::default();
        let ViewState::Funds(mut state) = mounted(Route::Funds, &gateway).await else {
            panic!("expected funds");
        };
        for _ in 0..20 {
            state = state.update(FundsAction::SelectNext);
        }
        assert_eq!(state.selected, 5);

        let state = state.update(FundsAction::TypeSearch('z'));
        assert_eq!(state.selected, 0);
        assert_eq!(state.selected_fund().map(|f| f.name.as_str()), Some("Zeta"));

        let state = state.update(FundsAction::TypeSearch('q'));
        assert!(state.selected_fund().is_none());
        let state = state.update(FundsAction::ClearSearch);
        assert_eq!(state.visible().len(), 6);
    }

    #[tokio::test]
    async fn test_fund_detail_series_and_error() {
        let gateway = StaticGateway::default();
        let ViewState::FundDetail(state) =
            mounted(Route::FundDetail("A1".into()), &gateway).await
        else {
            panic!("expected detail");
        };
        let series = state.series();
        assert_eq!(series.len(), 30);
        assert_eq!(series[0].date, "d15");

        let ViewState::FundDetail(missing) =
            mounted(Route::FundDetail("ZZ".into()), &gateway).await
        else {
            panic!("expected detail");
        };
        assert!(missing.detail.is_none());
        assert!(missing.series().is_empty());
        assert_eq!(missing.status.error.as_deref(), Some("Fund not found"));
    }

    async fn apply(
        state: PortfolioState,
        store: &dyn PortfolioStore,
        new_id: i64,
    ) -> Result<PortfolioState, StoreError> {
        let mutation = state
            .pending_mutation(new_id)
            .expect("dialog open")
            .expect("valid form");
        let ack = mutation.apply(store).await?;
        Ok(state.acknowledged(ack))
    }

    fn type_text(mut state: PortfolioState, text: &str) -> PortfolioState {
        for c in text.chars() {
            state = state.update(PortfolioAction::Type(c));
        }
        state
    }

    #[tokio::test]
    async fn test_portfolio_add_edit_delete() {
        let gateway = StaticGateway::default();
        let store = LocalPortfolioStore::new();
        let ViewState::Portfolio(state) = mounted(Route::Portfolio, &gateway).await else {
            panic!("expected portfolio");
        };
        store.observe(&state.portfolio.items);
        assert_eq!(state.portfolio.items.len(), 2);

        // add: typing a known code fills the name
        let state = state.update(PortfolioAction::OpenAdd);
        let state = type_text(state, "B2");
        let PortfolioMode::Form(form) = &state.mode else {
            panic!("expected form");
        };
        assert_eq!(form.fund_name, "Beta");
        let state = state.update(PortfolioAction::FocusNext).update(PortfolioAction::FocusNext);
        let state = type_text(state, "10");
        let state = state.update(PortfolioAction::FocusNext);
        let state = type_text(state, "100");
        let state = state.update(PortfolioAction::FocusNext);
        let state = type_text(state, "2024-05-01");
        let state = apply(state, &store, 777).await.unwrap();

        assert_eq!(state.mode, PortfolioMode::Browse);
        assert!(state.edited);
        let added = state.portfolio.get(777).unwrap();
        assert_eq!(added.invested_amount, 1000.0);
        assert_eq!(added.current_value, 1000.0);
        assert_eq!(state.selected, 2);

        // edit the first holding's units
        let state = state
            .update(PortfolioAction::SelectPrevious)
            .update(PortfolioAction::SelectPrevious)
            .update(PortfolioAction::OpenEdit);
        let mut state = state;
        if let PortfolioMode::Form(form) = &mut state.mode {
            form.units = "2".into();
        }
        let state = apply(state, &store, 778).await.unwrap();
        assert_eq!(state.portfolio.items.len(), 3);
        assert_eq!(state.portfolio.get(1).map(|i| i.units), Some(2.0));
        assert!(state.portfolio.get(778).is_none());

        // delete needs confirmation
        let state = state.update(PortfolioAction::RequestDelete);
        assert_eq!(state.mode, PortfolioMode::ConfirmDelete(1));
        let cancelled = state.clone().update(PortfolioAction::Cancel);
        assert_eq!(cancelled.portfolio.items.len(), 3);
        let state = apply(state, &store, 779).await.unwrap();
        assert!(state.portfolio.get(1).is_none());
        assert_eq!(state.portfolio.items.len(), 2);
    }

    fn form_of(state: &PortfolioState) -> &HoldingForm {
        match &state.mode {
            PortfolioMode::Form(form) => form,
            other => panic!("expected form, got {other:?}"),
        }
    }

    #[test]
    fn test_prefilled_name_follows_longer_code() {
        let state = PortfolioState {
            funds: vec![
                fund("Short Code Fund", "1", 10.0, "Debt"),
                fund("Real Fund", "12", 11.0, "Equity"),
            ],
            ..PortfolioState::default()
        };
        let state = state.update(PortfolioAction::OpenAdd);

        let state = type_text(state, "1");
        assert_eq!(form_of(&state).fund_name, "Short Code Fund");
        let state = type_text(state, "2");
        assert_eq!(form_of(&state).fund_name, "Real Fund");
        let state = type_text(state, "3");
        assert_eq!(form_of(&state).fund_name, "");
    }

    #[test]
    fn test_prefilled_name_follows_erased_code() {
        let state = PortfolioState {
            funds: catalog(),
            ..PortfolioState::default()
        };
        let state = type_text(state.update(PortfolioAction::OpenAdd), "B2");
        assert_eq!(form_of(&state).fund_name, "Beta");

        let state = state.update(PortfolioAction::Erase);
        assert_eq!(form_of(&state).fund_name, "");
        let state = type_text(state, "9");
        assert_eq!(form_of(&state).fund_code, "B9");
        assert_eq!(form_of(&state).fund_name, "");

        let state = state.update(PortfolioAction::Erase);
        let state = type_text(state, "2");
        assert_eq!(form_of(&state).fund_name, "Beta");
    }

    #[test]
    fn test_typed_name_is_not_overwritten() {
        let state = PortfolioState {
            funds: catalog(),
            ..PortfolioState::default()
        };
        let state = state
            .update(PortfolioAction::OpenAdd)
            .update(PortfolioAction::FocusNext);
        let state = type_text(state, "My Fund").update(PortfolioAction::FocusPrevious);
        let state = type_text(state, "A1");
        assert_eq!(form_of(&state).fund_name, "My Fund");
        let state = state.update(PortfolioAction::Erase);
        assert_eq!(form_of(&state).fund_name, "My Fund");
    }

    #[tokio::test]
    async fn test_invalid_form_stays_open() {
        let state = PortfolioState::default().update(PortfolioAction::OpenAdd);
        let pending = state.pending_mutation(1);
        assert_eq!(pending, Some(Err(ValidationError::FundCodeRequired)));
        assert!(matches!(state.mode, PortfolioMode::Form(_)));
        assert_eq!(PortfolioState::default().pending_mutation(1), None);
    }

    #[tokio::test]
    async fn test_refresh_keeps_local_edits() {
        let gateway = StaticGateway::default();
        let ViewState::Portfolio(state) = mounted(Route::Portfolio, &gateway).await else {
            panic!("expected portfolio");
        };
        let state = state.acknowledged(Mutation::Delete(2));
        assert_eq!(state.portfolio.items.len(), 1);

        let (view, ticket) = ViewState::Portfolio(state).begin_fetch();
        let view = view.receive(ticket, load(&gateway, &Route::Portfolio).await);
        let ViewState::Portfolio(state) = view else {
            panic!("expected portfolio");
        };
        assert_eq!(state.portfolio.items.len(), 1);
        assert_eq!(state.funds.len(), 6);
    }

    #[test]
    fn test_edit_and_delete_need_a_selection() {
        let state = PortfolioState::default();
        assert_eq!(state.clone().update(PortfolioAction::OpenEdit).mode, PortfolioMode::Browse);
        assert_eq!(state.update(PortfolioAction::RequestDelete).mode, PortfolioMode::Browse);
    }

    #[test]
    fn test_mount_routes() {
        for route in [
            Route::Dashboard,
            Route::Funds,
            Route::FundDetail("7".into()),
            Route::Portfolio,
        ] {
            assert_eq!(ViewState::mount(&route).route(), route);
        }
    }
}
