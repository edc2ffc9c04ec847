use colored::Colorize;
use groovyswap_sdk::types::MarketDescriptor;
use tabled::{Table, Tabled, settings::Style};

use crate::trading::MarketInfo;

pub(crate) fn render_info(info: &MarketInfo) {
    println!(
        "{}\n",
        format!("{:#^96}", format!(" {}/{} Order Book ", info.base, info.quote))
            .bold()
            .purple()
    );

    if info.book.asks().is_empty() && info.book.bids().is_empty() {
        println!("{}", "No offers".dimmed());
    } else {
        print!("{}", info.book);
    }

    println!();
    println!(
        "{} {} {}",
        "Best ask:".bold(),
        optional(info.best_ask()).red(),
        info.quote
    );
    println!(
        "{} {} {}",
        "Best bid:".bold(),
        optional(info.best_bid()).green(),
        info.quote
    );
    println!("{} {}", "Spread:".bold(), optional(info.spread()));
    println!("{} {} {}", "Total asks:".bold(), info.total_asks(), info.base);
    println!("{} {} {}", "Total bids:".bold(), info.total_bids(), info.quote);
}

pub(crate) fn render_markets(markets: &[MarketDescriptor]) {
    println!("{}\n", format!("{:#^96}", " Open Markets ").bold().purple());

    if markets.is_empty() {
        println!("{}", "No open markets".dimmed());
        return;
    }

    let rows = markets.iter().map(|m| MarketRow {
        tkn0: format!("{:#}", m.tkn0),
        tkn1: format!("{:#}", m.tkn1),
        tick_spacing: m
            .tick_spacing
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "-".to_string()),
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
}

fn optional(value: Option<impl ToString>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "Token 0")]
    tkn0: String,
    #[tabled(rename = "Token 1")]
    tkn1: String,
    #[tabled(rename = "Tick Spacing")]
    tick_spacing: String,
}
