use crate::format::format_currency;
use crate::holding::PortfolioItem;
use piechart::{Chart, Color};

/// Slice colours of the allocation chart, assigned round-robin by position.
pub const PALETTE: [SliceColor; 8] = [
    SliceColor(0x3b, 0x82, 0xf6),
    SliceColor(0x10, 0xb9, 0x81),
    SliceColor(0xf5, 0x9e, 0x0b),
    SliceColor(0xef, 0x44, 0x44),
    SliceColor(0x8b, 0x5c, 0xf6),
    SliceColor(0x06, 0xb6, 0xd4),
    SliceColor(0x84, 0xcc, 0x16),
    SliceColor(0xf9, 0x73, 0x16),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceColor(pub u8, pub u8, pub u8);

impl SliceColor {
    pub fn for_index(index: usize) -> SliceColor {
        PALETTE[index % PALETTE.len()]
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSlice {
    pub name: String,
    pub value: f64,
    pub color: SliceColor,
}

impl AllocationSlice {
    /// Fraction of `total` this slice represents, 0 for an empty portfolio.
    pub fn share(&self, total: f64) -> f64 {
        if total > 0.0 {
            self.value / total
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioTotals {
    pub current_value: f64,
    pub invested: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Portfolio {
    pub items: Vec<PortfolioItem>,
}

impl Portfolio {
    /// A portfolio of served holdings, each normalized on the way in.
    pub fn from_items(items: Vec<PortfolioItem>) -> Portfolio {
        Portfolio {
            items: items.into_iter().map(PortfolioItem::normalized).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&PortfolioItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn add(&mut self, item: PortfolioItem) {
        self.items.push(item);
    }

    /// Replaces the holding with the same id. Returns false if there is none.
    pub fn replace(&mut self, item: PortfolioItem) -> bool {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => false,
        }
    }

    /// Removes the holding with `id`. Returns false if there is none.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn get_total_value(&self) -> f64 {
        self.items.iter().map(|item| item.current_value).sum()
    }

    pub fn totals(&self) -> PortfolioTotals {
        let mut totals = PortfolioTotals::default();
        for item in &self.items {
            totals.current_value += item.current_value;
            totals.invested += item.invested_amount;
            totals.gain_loss += item.gain_loss;
        }
        totals.gain_loss_percent =
            crate::holding::gain_loss_percent(totals.gain_loss, totals.invested);
        totals
    }

    /// One slice per holding, in holding order.
    pub fn allocation(&self) -> Vec<AllocationSlice> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| AllocationSlice {
                name: item.fund_name.clone(),
                value: item.current_value,
                color: SliceColor::for_index(i),
            })
            .collect()
    }

    // Print the portfolio as a table
    pub fn print(&self, currency: &str) {
        use comfy_table::{
            presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor,
            ContentArrangement, Table,
        };

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(120);

        table.set_header(vec![
            Cell::new("Fund").add_attribute(Attribute::Bold),
            Cell::new("Code").add_attribute(Attribute::Bold),
            Cell::new("Units").add_attribute(Attribute::Bold),
            Cell::new("NAV").add_attribute(Attribute::Bold),
            Cell::new("Invested").add_attribute(Attribute::Bold),
            Cell::new("Current").add_attribute(Attribute::Bold),
            Cell::new("Gain/Loss").add_attribute(Attribute::Bold),
            Cell::new("%").add_attribute(Attribute::Bold),
            Cell::new("Purchased").add_attribute(Attribute::Bold),
        ]);

        let signed = |v: f64| if v >= 0.0 { TColor::Green } else { TColor::Red };

        for item in &self.items {
            table.add_row(vec![
                Cell::new(&item.fund_name),
                Cell::new(&item.fund_code),
                Cell::new(format!("{:.4}", item.units)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.2}", item.nav)).set_alignment(CellAlignment::Right),
                Cell::new(format_currency(item.invested_amount, currency))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format_currency(item.current_value, currency))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format_currency(item.gain_loss, currency))
                    .set_alignment(CellAlignment::Right)
                    .fg(signed(item.gain_loss)),
                Cell::new(format!("{:.2}%", item.gain_loss_percent))
                    .set_alignment(CellAlignment::Right)
                    .fg(signed(item.gain_loss_percent)),
                Cell::new(&item.purchase_date),
            ]);
        }

        let totals = self.totals();
        table.add_row(vec![
            Cell::new("TOTAL").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format_currency(totals.invested, currency))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
            Cell::new(format_currency(totals.current_value, currency))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
            Cell::new(format_currency(totals.gain_loss, currency))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold)
                .fg(signed(totals.gain_loss)),
            Cell::new(format!("{:.2}%", totals.gain_loss_percent))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold)
                .fg(signed(totals.gain_loss_percent)),
            Cell::new(""),
        ]);

        println!("{table}");
    }

    // Print the allocation shares in holding order
    pub fn print_allocation(&self) {
        let total = self.get_total_value();

        println!("====================================");
        for slice in self.allocation() {
            println!(
                "{: >30} | {: >8.2}% | {}",
                slice.name,
                slice.share(total) * 100.0,
                slice.color.hex()
            );
        }
    }

    pub fn draw_pie_chart(&self) {
        // terminal approximations of PALETTE, same order
        let colors = [
            Color::Blue,
            Color::Green,
            Color::Yellow,
            Color::Red,
            Color::Purple,
            Color::Cyan,
            Color::White,
            Color::Black,
        ];

        let data: Vec<piechart::Data> = self
            .allocation()
            .into_iter()
            .enumerate()
            .map(|(i, slice)| piechart::Data {
                label: slice.name,
                value: slice.value as f32,
                color: Some(colors[i % colors.len()].into()),
                fill: '•',
            })
            .collect();

        Chart::new()
            .legend(true)
            .radius(9)
            .aspect_ratio(3)
            .draw(&data);
    }
}
