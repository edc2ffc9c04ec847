mod account;
pub mod args;
mod book;
pub mod config;
pub mod trading;
mod tx;

use std::{future::Future, time::Duration};

use alloy::{
    network::EthereumWallet,
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::{RetryBackoffLayer, ThrottleLayer},
};
use anyhow::Context;
use args::{Cli, Commands};
use config::Config;
use groovyswap_sdk::{dex::Dex, mangrove::MangroveClient};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);

    let config = Config::from_cli(&cli).context("loading configuration")?;

    let client = if let Some(throttle) = config.rpc_throttle {
        RpcClient::builder()
            .layer(ThrottleLayer::new(throttle))
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&config.rpc_url)
            .await
            .context("connecting to RPC")?
    } else {
        RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&config.rpc_url)
            .await
            .context("connecting to RPC")?
    };
    client.set_poll_interval(Duration::from_millis(100));

    let signer = config.signer.address();
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(config.signer.clone()))
        .connect_client(client)
        .erased();
    debug!(%signer, rpc = %config.rpc_url, "connected");

    let dex = MangroveClient::new(provider, config.deployment, signer)
        .with_offer_gasreq(config.offer_gasreq);

    let cancellation_signal = CancellationToken::new();
    let cancellation_token = cancellation_signal.child_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancellation_signal.cancel();
        }
    });

    let command = with_timeout(config.timeout, execute(&dex, &config, cli.command));
    tokio::select! {
        res = command => res,
        _ = cancellation_token.cancelled() => Err(anyhow::anyhow!("interrupted")),
    }
}

/// Runs the command against the exchange and prints its result.
pub async fn execute<D: Dex>(
    dex: &D,
    config: &Config,
    command: Option<Commands>,
) -> anyhow::Result<()> {
    match command {
        None => {
            let balance = dex
                .native_balance(dex.address())
                .await
                .context("fetching balance")?;
            account::render_balance(dex.address(), balance);
        },
        Some(Commands::Buy(args)) => {
            let (base, quote) = (&args.pair.base, &args.pair.quote);
            let result = trading::market_buy(dex, base, quote, args.limit_price, args.amount)
                .await
                .with_context(|| format!("buying {} {}", args.amount, base))?;
            tx::render_trade(&result, base, quote);
        },
        Some(Commands::Sell(args)) => {
            let (base, quote) = (&args.pair.base, &args.pair.quote);
            let result = trading::market_sell(dex, base, quote, args.limit_price, args.amount)
                .await
                .with_context(|| format!("selling {} {}", args.amount, base))?;
            tx::render_trade(&result, quote, base);
        },
        Some(Commands::Info(pair)) => {
            let info = trading::market_info(dex, &pair.base, &pair.quote)
                .await
                .context("fetching market info")?;
            book::render_info(&info);
        },
        Some(Commands::AddLiquidity(args)) => {
            let (base, quote) = (&args.pair.base, &args.pair.quote);
            let added = match args.one_side {
                Some(side) => {
                    trading::add_one_sided_liquidity(
                        dex,
                        base,
                        quote,
                        args.amount,
                        side,
                        Some(args.slippage),
                    )
                    .await
                },
                None => {
                    trading::add_liquidity(dex, base, quote, args.amount, Some(args.slippage))
                        .await
                },
            }
            .context("adding liquidity")?;
            tx::render_added(&added);
        },
        Some(Commands::RemoveLiquidity(pair)) => {
            let removed = trading::remove_liquidity(dex, &pair.base, &pair.quote)
                .await
                .context("removing liquidity")?;
            tx::render_removed(&removed);
        },
        Some(Commands::Positions(pair)) => {
            let positions =
                trading::positions(dex, &pair.base, &pair.quote, config.admin_address)
                    .await
                    .context("fetching positions")?;
            account::render_positions(&positions);
        },
        Some(Commands::Markets) => {
            let markets = trading::list_markets(dex)
                .await
                .context("fetching open markets")?;
            book::render_markets(&markets);
        },
    }
    Ok(())
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    command: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, command)
            .await
            .map_err(|_| anyhow::anyhow!("command timed out after {}s", timeout.as_secs()))?,
        None => command.await,
    }
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Logs go to stderr, `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use alloy::primitives::Address;
    use fastnum::udec128;
    use groovyswap_sdk::testing::{StubDex, StubMarket, token};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[tokio::test]
    async fn test_retraction_nonces_logged_by_default() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(default_filter(0)))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dex = StubDex::new(Address::repeat_byte(0x5e)).with_nonce(7).with_market(
            StubMarket::new(token("USDC", 6), token("USDT", 6))
                .own_ask(11, udec128!(1.05), udec128!(10))
                .own_bid(21, udec128!(0.95), udec128!(4)),
        );
        trading::remove_liquidity(&dex, "USDC", "USDT").await.unwrap();

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("retracting asks"), "{logs}");
        assert!(logs.contains("retracting bids"), "{logs}");
        assert!(logs.contains("nonce=7"), "{logs}");
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(0), "warn");
        assert_eq!(default_filter(1), "info");
        assert_eq!(default_filter(4), "debug");
    }
}
