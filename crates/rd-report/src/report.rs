//! Text rendering of a [`RiskAssessment`].
//!
//! Presentation only: every number shown here was computed by `rd-risk`.

use chrono::NaiveDateTime;
use rd_risk::{
    GroupExposure, IlliquidPosition, LiquidityStats, PortfolioRiskSnapshot, RiskAlert,
    RiskAssessment, RiskSeverity, ShockPnl, TopPosition,
};
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::format::{fixed, horizon, percent, thousands, usd};

/// Width of the section dividers.
pub const REPORT_WIDTH: usize = 80;

/// Rows shown in the illiquid and high-beta tables.
pub const MAX_TABLE_ROWS: usize = 10;

const LABEL_WIDTH: usize = 39;

#[derive(Tabled)]
struct TopPositionRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Sector")]
    sector: String,
    #[tabled(rename = "Value (USD)")]
    value_usd: String,
    #[tabled(rename = "Weight")]
    dollar_weight: String,
    #[tabled(rename = "Side")]
    side: String,
}

impl From<&TopPosition> for TopPositionRow {
    fn from(p: &TopPosition) -> Self {
        Self {
            ticker: p.ticker.clone(),
            name: p.name.clone(),
            country: p.country.clone(),
            sector: p.sector.clone(),
            value_usd: thousands(p.position_value_usd, 2),
            dollar_weight: percent(p.dollar_weight, 2),
            side: p.side.to_string(),
        }
    }
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    key: String,
    #[tabled(rename = "Net (USD)")]
    net: String,
    #[tabled(rename = "Gross (USD)")]
    gross: String,
    #[tabled(rename = "Unrealized P&L")]
    pnl: String,
    #[tabled(rename = "% of GMV")]
    pct: String,
}

impl From<&GroupExposure> for GroupRow {
    fn from(g: &GroupExposure) -> Self {
        Self {
            key: g.key.clone(),
            net: thousands(g.net_exposure_usd, 2),
            gross: thousands(g.gross_exposure_usd, 2),
            pnl: thousands(g.unrealized_pnl_usd, 2),
            pct: percent(g.pct_of_gmv, 2),
        }
    }
}

#[derive(Tabled)]
struct IlliquidRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "ADV")]
    adv: String,
    #[tabled(rename = "Days")]
    days: String,
    #[tabled(rename = "Value (USD)")]
    value_usd: String,
}

impl From<&IlliquidPosition> for IlliquidRow {
    fn from(p: &IlliquidPosition) -> Self {
        Self {
            ticker: p.ticker.clone(),
            name: p.name.clone(),
            country: p.country.clone(),
            shares: thousands(p.shares, 0),
            adv: thousands(p.avg_daily_volume, 0),
            days: horizon(p.days_to_unwind),
            value_usd: thousands(p.position_value_usd, 2),
        }
    }
}

#[derive(Tabled)]
struct ShockRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Beta")]
    beta: String,
    #[tabled(rename = "Value (USD)")]
    value_usd: String,
    #[tabled(rename = "Shock P&L")]
    shock_pnl: String,
    #[tabled(rename = "Side")]
    side: String,
}

impl From<&ShockPnl> for ShockRow {
    fn from(r: &ShockPnl) -> Self {
        Self {
            ticker: r.ticker.clone(),
            name: r.name.clone(),
            beta: fixed(r.beta, 2),
            value_usd: thousands(r.position_value_usd, 2),
            shock_pnl: thousands(r.shock_pnl, 2),
            side: r.side.to_string(),
        }
    }
}

#[derive(Tabled)]
struct HighBetaRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Beta")]
    beta: String,
    #[tabled(rename = "Value (USD)")]
    value_usd: String,
    #[tabled(rename = "Weight")]
    dollar_weight: String,
    #[tabled(rename = "Side")]
    side: String,
}

impl From<&ShockPnl> for HighBetaRow {
    fn from(r: &ShockPnl) -> Self {
        Self {
            ticker: r.ticker.clone(),
            name: r.name.clone(),
            beta: fixed(r.beta, 2),
            value_usd: thousands(r.position_value_usd, 2),
            dollar_weight: percent(r.dollar_weight, 2),
            side: r.side.to_string(),
        }
    }
}

/// Renders a table with the leading `text_columns` left-aligned and the rest
/// right-aligned.
fn render_table<T: Tabled>(rows: &[T], text_columns: usize) -> String {
    if rows.is_empty() {
        return "  (none)".to_string();
    }

    Table::new(rows)
        .with(Style::blank())
        .with(Modify::new(Columns::new(text_columns..)).with(Alignment::right()))
        .to_string()
}

fn line(label: &str, value: impl std::fmt::Display) -> String {
    format!("{:<width$}{}\n", label, value, width = LABEL_WIDTH)
}

fn section_title(title: &str) -> String {
    format!("\n{}\n{}\n", title, "-".repeat(REPORT_WIDTH))
}

/// Renders the daily risk report.
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    generated_at: NaiveDateTime,
}

impl ReportFormatter {
    pub fn new(generated_at: NaiveDateTime) -> Self {
        Self { generated_at }
    }

    /// The full report, sections in reading order.
    pub fn render(&self, assessment: &RiskAssessment) -> String {
        let snap = &assessment.snapshot;
        [
            self.header(),
            Self::summary_section(snap),
            Self::factor_section(snap),
            Self::shock_section(snap),
            Self::concentration_section(snap),
            Self::liquidity_section(&snap.liquidity),
            Self::warnings_section(&assessment.alerts),
            Self::footer(),
        ]
        .concat()
    }

    pub fn header(&self) -> String {
        let rule = "=".repeat(REPORT_WIDTH);
        format!(
            "\n{rule}\nFACTOR NEUTRAL GLOBAL EQUITIES PORTFOLIO - DAILY RISK REPORT\n{rule}\n\
             Report Generated: {}\nReport Date: {}\n{rule}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.generated_at.format("%A, %B %d, %Y"),
        )
    }

    pub fn summary_section(snap: &PortfolioRiskSnapshot) -> String {
        let s = &snap.summary;
        let mut out = section_title("PORTFOLIO SUMMARY");
        out.push_str(&line("Number of Long Positions:", s.long_count));
        out.push_str(&line("Number of Short Positions:", s.short_count));
        out.push_str(&line("Long/Short Ratio:", fixed(s.long_short_ratio, 2)));
        out.push_str(&line("Total Positions:", s.total_positions));
        if s.excluded_positions > 0 {
            out.push_str(&line("Excluded (unresolved currency):", s.excluded_positions));
        }
        out.push('\n');
        out.push_str(&line("Total Gross Market Value (GMV):", usd(s.total_gmv)));
        out.push_str(&line("Total Long Exposure:", usd(s.long_exposure)));
        out.push_str(&line("Total Short Exposure:", usd(s.short_exposure)));
        out.push_str(&line("Net Market Exposure:", usd(s.net_exposure)));
        out.push_str(&line("Net Exposure / GMV:", percent(s.net_to_gmv, 2)));
        out.push('\n');
        out.push_str(&line("Total Unrealized P&L:", usd(s.total_unrealized_pnl)));
        out.push_str(&line("P&L / GMV:", percent(s.pnl_to_gmv, 2)));
        out
    }

    pub fn factor_section(snap: &PortfolioRiskSnapshot) -> String {
        let f = &snap.factors;
        let mut out = section_title("FACTOR EXPOSURES");
        out.push_str(&line("Portfolio Beta:", fixed(f.portfolio_beta, 4)));
        out.push_str(&line("Long Book Beta:", fixed(f.long_beta, 4)));
        out.push_str(&line("Short Book Beta:", fixed(f.short_beta, 4)));
        out
    }

    pub fn shock_section(snap: &PortfolioRiskSnapshot) -> String {
        let shock = &snap.shock;
        let direction = if shock.total_pnl > Decimal::ZERO {
            "GAIN"
        } else {
            "LOSE"
        };

        let mut out = section_title("RISK ANALYSIS");
        out.push_str(&format!(
            "\nMARKET SHOCK SCENARIO ({} Market Move):\n",
            percent(shock.market_move, 0)
        ));
        out.push_str(&line("Expected P&L Impact:", usd(shock.total_pnl)));
        out.push_str(&line("Impact as % of GMV:", percent(shock.pnl_to_gmv, 4)));
        out.push_str(&format!(
            "\n⚠️  Note: For a truly factor neutral portfolio, this should be ~0%\n    \
             Current exposure suggests portfolio will {} in market rally\n",
            direction
        ));

        let worst: Vec<ShockRow> = shock.worst_positions.iter().map(ShockRow::from).collect();
        out.push_str("\nPOSITIONS MOST AT RISK IN MARKET SHOCK:\n");
        out.push_str(&render_table(&worst, 2));
        out.push('\n');

        out.push_str(&format!(
            "\nHIGH BETA POSITIONS (|Beta| > {}):\n",
            shock.high_beta_cutoff.normalize()
        ));
        out.push_str(&line("Number of High Beta Positions:", shock.high_beta_positions.len()));
        if !shock.high_beta_positions.is_empty() {
            let rows: Vec<HighBetaRow> = shock
                .high_beta_positions
                .iter()
                .take(MAX_TABLE_ROWS)
                .map(HighBetaRow::from)
                .collect();
            out.push('\n');
            out.push_str(&render_table(&rows, 2));
            out.push('\n');
        }
        out
    }

    pub fn concentration_section(snap: &PortfolioRiskSnapshot) -> String {
        let c = &snap.concentration;
        let mut out = section_title("CONCENTRATION ANALYSIS");

        let top: Vec<TopPositionRow> = c.top_positions.iter().map(TopPositionRow::from).collect();
        out.push_str(&format!("\nTOP {} POSITIONS BY SIZE:\n", top.len()));
        out.push_str(&render_table(&top, 4));
        out.push('\n');

        for (title, groups) in [
            ("SECTOR EXPOSURE:", &c.by_sector),
            ("COUNTRY EXPOSURE:", &c.by_country),
            ("CURRENCY EXPOSURE:", &c.by_currency),
        ] {
            let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
            out.push_str(&format!("\n{}\n", title));
            out.push_str(&render_table(&rows, 1));
            out.push('\n');
        }
        out
    }

    pub fn liquidity_section(liquidity: &LiquidityStats) -> String {
        let mut out = section_title("LIQUIDITY ANALYSIS");
        out.push_str(&line(
            "Average Days to Unwind:",
            format!("{} days", horizon(liquidity.mean_days)),
        ));
        out.push_str(&line(
            "Median Days to Unwind:",
            format!("{} days", horizon(liquidity.median_days)),
        ));
        out.push_str(&line(
            "Maximum Days to Unwind:",
            format!("{} days", horizon(liquidity.max_days)),
        ));
        out.push('\n');
        out.push_str(&line(
            &format!("Number of Illiquid Positions (>{}d):", liquidity.watch_days.normalize()),
            liquidity.illiquid_positions.len(),
        ));

        if !liquidity.illiquid_positions.is_empty() {
            let rows: Vec<IlliquidRow> = liquidity
                .illiquid_positions
                .iter()
                .take(MAX_TABLE_ROWS)
                .map(IlliquidRow::from)
                .collect();
            out.push_str("\n⚠️  ILLIQUID POSITIONS REQUIRING ATTENTION:\n");
            out.push_str(&render_table(&rows, 3));
            out.push('\n');
        }
        out
    }

    pub fn warnings_section(alerts: &[RiskAlert]) -> String {
        let mut out = section_title("UNINTENDED EXPOSURE WARNINGS");
        if alerts.is_empty() {
            out.push_str("✓ No significant unintended exposures detected\n");
        }
        for alert in alerts {
            let line = match alert.severity {
                RiskSeverity::Critical => format!("⚠️  CRITICAL: {}\n", alert.message),
                RiskSeverity::Warning => format!("⚠️  {}\n", alert.message),
            };
            out.push_str(&line);
        }
        out
    }

    pub fn footer() -> String {
        let rule = "=".repeat(REPORT_WIDTH);
        format!(
            "\n{rule}\nEND OF REPORT\n\n\
             IMPORTANT NOTES:\n\
             - This report should be reviewed daily before market open\n\
             - Factor neutral portfolios should maintain beta ~0 and net exposure ~0\n\
             - Review all flagged warnings and consider rebalancing if necessary\n\
             - Contact Risk Management for questions or concerns\n\n\
             Report Generation: Automated via portfolio-report\n{rule}\n"
        )
    }
}
