use crate::error::ValidationError;
use crate::lenient;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A recorded position in one fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::display")]
    pub fund_code: String,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub fund_name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub units: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub nav: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub invested_amount: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub current_value: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub gain_loss: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub gain_loss_percent: f64,
    #[serde(default = "lenient::not_available", deserialize_with = "lenient::display")]
    pub purchase_date: String,
}

pub fn gain_loss_percent(gain_loss: f64, invested: f64) -> f64 {
    if invested > 0.0 {
        gain_loss / invested * 100.0
    } else {
        0.0
    }
}

impl PortfolioItem {
    /// A freshly acquired holding. Its current value is the invested amount;
    /// there is no re-pricing against the fund's latest NAV.
    pub fn acquired(
        id: i64,
        fund_code: String,
        fund_name: String,
        units: f64,
        nav: f64,
        purchase_date: String,
    ) -> PortfolioItem {
        let invested_amount = units * nav;
        PortfolioItem {
            id,
            fund_code,
            fund_name,
            units,
            nav,
            invested_amount,
            current_value: invested_amount,
            gain_loss: 0.0,
            gain_loss_percent: 0.0,
            purchase_date,
        }
    }

    /// Re-derives gain/loss from the amounts so a served record always
    /// satisfies `gain_loss = current_value - invested_amount`. Negative
    /// amounts are clamped to zero.
    pub fn normalized(mut self) -> PortfolioItem {
        self.invested_amount = self.invested_amount.max(0.0);
        self.current_value = self.current_value.max(0.0);
        self.gain_loss = self.current_value - self.invested_amount;
        self.gain_loss_percent = gain_loss_percent(self.gain_loss, self.invested_amount);
        self
    }
}

/// New local id for a holding created on this client.
pub fn next_local_id() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FundCode,
    FundName,
    Units,
    Nav,
    PurchaseDate,
}

impl FormField {
    pub fn all() -> &'static [FormField] {
        &[
            FormField::FundCode,
            FormField::FundName,
            FormField::Units,
            FormField::Nav,
            FormField::PurchaseDate,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::FundCode => "Fund Code",
            FormField::FundName => "Fund Name",
            FormField::Units => "Units",
            FormField::Nav => "NAV at Purchase",
            FormField::PurchaseDate => "Purchase Date",
        }
    }

    pub fn next(self) -> FormField {
        let fields = FormField::all();
        let i = fields.iter().position(|&f| f == self).unwrap_or(0);
        fields[(i + 1) % fields.len()]
    }

    pub fn previous(self) -> FormField {
        let fields = FormField::all();
        let i = fields.iter().position(|&f| f == self).unwrap_or(0);
        fields[(i + fields.len() - 1) % fields.len()]
    }

    fn accepts(self, c: char, current: &str) -> bool {
        match self {
            FormField::Units | FormField::Nav => {
                c.is_ascii_digit() || (c == '.' && !current.contains('.'))
            }
            FormField::PurchaseDate => c.is_ascii_digit() || c == '-',
            FormField::FundCode | FormField::FundName => !c.is_control(),
        }
    }
}

/// The add/edit form of the portfolio view. Fields hold raw text until
/// [`HoldingForm::submit`] validates them.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingForm {
    /// `Some(id)` while editing an existing holding.
    pub editing: Option<i64>,
    pub fund_code: String,
    pub fund_name: String,
    pub units: String,
    pub nav: String,
    pub purchase_date: String,
    pub focus: FormField,
    /// Set while `fund_name` holds a name looked up from the fund code
    /// rather than one the user typed.
    pub name_autofilled: bool,
}

impl HoldingForm {
    pub fn blank() -> HoldingForm {
        HoldingForm {
            editing: None,
            fund_code: String::new(),
            fund_name: String::new(),
            units: String::new(),
            nav: String::new(),
            purchase_date: String::new(),
            focus: FormField::FundCode,
            name_autofilled: false,
        }
    }

    pub fn for_item(item: &PortfolioItem) -> HoldingForm {
        HoldingForm {
            editing: Some(item.id),
            fund_code: item.fund_code.clone(),
            fund_name: item.fund_name.clone(),
            units: format!("{}", item.units),
            nav: format!("{}", item.nav),
            purchase_date: item.purchase_date.clone(),
            focus: FormField::FundCode,
            name_autofilled: false,
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::FundCode => &self.fund_code,
            FormField::FundName => &self.fund_name,
            FormField::Units => &self.units,
            FormField::Nav => &self.nav,
            FormField::PurchaseDate => &self.purchase_date,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::FundCode => &mut self.fund_code,
            FormField::FundName => &mut self.fund_name,
            FormField::Units => &mut self.units,
            FormField::Nav => &mut self.nav,
            FormField::PurchaseDate => &mut self.purchase_date,
        }
    }

    /// Types a character into the focused field, ignoring characters the
    /// field cannot hold.
    pub fn push_char(&mut self, c: char) {
        let focus = self.focus;
        if focus.accepts(c, self.value(focus)) {
            self.value_mut(focus).push(c);
            if focus == FormField::FundName {
                self.name_autofilled = false;
            }
        }
    }

    pub fn pop_char(&mut self) {
        let focus = self.focus;
        self.value_mut(focus).pop();
        if focus == FormField::FundName {
            self.name_autofilled = false;
        }
    }

    /// Follows the fund code with the name of the fund it matches, if any.
    /// A name the user typed is left alone.
    pub fn autofill_name(&mut self, known: Option<&str>) {
        if !self.name_autofilled && !self.fund_name.is_empty() {
            return;
        }
        match known {
            Some(name) => {
                self.fund_name = name.to_string();
                self.name_autofilled = true;
            }
            None => {
                self.fund_name.clear();
                self.name_autofilled = false;
            }
        }
    }

    /// Validates the form into a holding. Editing keeps the original id;
    /// adding assigns `new_id`.
    pub fn submit(&self, new_id: i64) -> Result<PortfolioItem, ValidationError> {
        let fund_code = self.fund_code.trim();
        if fund_code.is_empty() {
            return Err(ValidationError::FundCodeRequired);
        }
        let fund_name = self.fund_name.trim();
        if fund_name.is_empty() {
            return Err(ValidationError::FundNameRequired);
        }

        let units_str = self.units.trim();
        if units_str.is_empty() {
            return Err(ValidationError::UnitsRequired);
        }
        let units = units_str
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidUnits(units_str.to_string()))?;
        if !units.is_finite() {
            return Err(ValidationError::InvalidUnits(units_str.to_string()));
        }
        if units <= 0.0 {
            return Err(ValidationError::NonPositiveUnits(units));
        }

        let nav_str = self.nav.trim();
        if nav_str.is_empty() {
            return Err(ValidationError::NavRequired);
        }
        let nav = nav_str
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidNav(nav_str.to_string()))?;
        if !nav.is_finite() {
            return Err(ValidationError::InvalidNav(nav_str.to_string()));
        }
        if nav <= 0.0 {
            return Err(ValidationError::NonPositiveNav(nav));
        }

        let date_str = self.purchase_date.trim();
        if date_str.is_empty() {
            return Err(ValidationError::DateRequired);
        }
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(date_str.to_string()))?;

        Ok(PortfolioItem::acquired(
            self.editing.unwrap_or(new_id),
            fund_code.to_string(),
            fund_name.to_string(),
            units,
            nav,
            date_str.to_string(),
        ))
    }
}
