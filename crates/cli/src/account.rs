use alloy::primitives::{Address, U256, utils::format_ether};
use colored::Colorize;
use tabled::{Table, settings::Style};

use crate::trading::Positions;

pub(crate) fn render_balance(address: Address, balance: U256) {
    println!("{}\n", format!("{:#^96}", " GroovySwap CLI ").bold().purple());
    println!("{} {}", "Address:".bold(), address);
    println!("{} {} ETH", "Balance:".bold(), format_ether(balance));
}

pub(crate) fn render_positions(positions: &Positions) {
    println!(
        "{}\n",
        format!("{:#^96}", format!(" {}/{} Positions ", positions.base, positions.quote))
            .bold()
            .purple()
    );
    println!("{} {}", "Owner:".bold(), positions.owner);
    println!(
        "{} {} {}",
        "Base balance:".bold(),
        positions.base_balance,
        positions.base
    );
    println!(
        "{} {} {}",
        "Quote balance:".bold(),
        positions.quote_balance,
        positions.quote
    );
    println!();

    if positions.asks.is_empty() && positions.bids.is_empty() {
        println!("{}", "No resting offers".dimmed());
        return;
    }

    // Asks on top, same layout as the book
    let mut table = Table::new(positions.asks.iter().rev().chain(positions.bids.iter()));
    table.with(Style::sharp());
    println!("{}", table);
}
