use colored::Colorize;
use groovyswap_sdk::types::{PlacedOffer, TakeResult};

use crate::trading::{AddedLiquidity, RemovedLiquidity};

pub(crate) fn render_trade(result: &TakeResult, got: &str, gave: &str) {
    println!("\n{}\n", format!("**** Tx {}", result.tx).bright_blue());
    println!("  {} {} {}", "Got:".bold(), result.got.to_string().green(), got);
    println!("  {} {} {}", "Gave:".bold(), result.gave.to_string().red(), gave);
    println!();
}

pub(crate) fn render_added(added: &AddedLiquidity) {
    for offer in added.ask.iter().chain(added.bid.iter()) {
        render_placed(offer);
    }
}

fn render_placed(offer: &PlacedOffer) {
    println!("\n{}\n", format!("**** Tx {}", offer.tx).bright_blue());
    println!(
        "  {} #{}: wants {}, gives {}, provision {} ETH",
        format!("{} posted", offer.side).cyan(),
        offer.id,
        offer.wants,
        offer.gives,
        offer.provision,
    );
}

pub(crate) fn render_removed(removed: &RemovedLiquidity) {
    for (label, retracted) in [("Ask", &removed.asks), ("Bid", &removed.bids)] {
        for (id, tx) in retracted {
            println!("  {} #{}: {}", format!("{label} retracted").cyan(), id, tx);
        }
    }
    println!("\n{}", "liquidity removed!".bold().green());
}
