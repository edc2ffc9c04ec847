use alloy::primitives::Address;
use clap::{ArgAction, Args, Parser, Subcommand};
use fastnum::UD128;
use groovyswap_sdk::{mangrove::DEFAULT_OFFER_GASREQ, types::OrderSide};

pub(crate) const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub(crate) const DEFAULT_SLIPPAGE: &str = "0.05";

#[derive(Parser, Debug)]
#[command(name = "groovyswap", version, about, long_about = None)]
pub struct Cli {
    /// Command to run [default: show signer balance]
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// RPC endpoint to connect to
    #[arg(long, global = true, env = "LOCAL_URL", default_value_t = DEFAULT_RPC_URL.to_string())]
    pub rpc: String,

    /// Private key of the signer, hex encoded
    #[arg(long, global = true, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Owner of the balances shown by `positions` [default: signer address]
    #[arg(long, global = true, env = "ADMIN_ADDRESS")]
    pub admin_address: Option<Address>,

    /// Mangrove core contract address
    #[arg(long, global = true, env = "MANGROVE_ADDRESS")]
    pub mangrove: Option<Address>,

    /// MgvReader contract address
    #[arg(long, global = true, env = "MGV_READER_ADDRESS")]
    pub reader: Option<Address>,

    /// Gas reserved for the execution of posted offers
    #[arg(long, global = true, default_value_t = DEFAULT_OFFER_GASREQ)]
    pub offer_gasreq: u64,

    /// RPC throttling (req/sec) [default: none]
    #[arg(long, global = true)]
    pub rpc_throttle: Option<u32>,

    /// Abort the command after this many seconds [default: no limit]
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Increase logging verbosity (-v info, -vv debug), overridden by
    /// `RUST_LOG`
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Buy base token with quote token at market
    Buy(TradeArgs),
    /// Sell base token for quote token at market
    Sell(TradeArgs),
    /// Show order book snapshot and spread
    Info(PairArgs),
    /// Post an ask and a bid around the current best prices
    AddLiquidity(AddLiquidityArgs),
    /// Retract all offers of the signer and withdraw their provisions, logging
    /// the pending nonce before each side
    RemoveLiquidity(PairArgs),
    /// Show token balances and resting offers
    Positions(PairArgs),
    /// List open markets
    Markets,
}

#[derive(Args, Debug, Clone)]
pub struct PairArgs {
    /// Base token symbol
    #[arg(short, long)]
    pub base: String,

    /// Quote token symbol
    #[arg(short, long)]
    pub quote: String,
}

#[derive(Args, Debug, Clone)]
pub struct TradeArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    /// Worst acceptable price, in quote token per base token
    #[arg(short, long, value_parser = parse_decimal)]
    pub limit_price: UD128,

    /// Amount of base token to trade
    #[arg(short, long, value_parser = parse_decimal)]
    pub amount: UD128,
}

#[derive(Args, Debug, Clone)]
pub struct AddLiquidityArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    /// Amount wanted by each posted offer
    #[arg(short, long, value_parser = parse_decimal)]
    pub amount: UD128,

    /// Fraction the posted prices are moved away from the best prices
    #[arg(short, long, value_parser = parse_decimal, default_value = DEFAULT_SLIPPAGE)]
    pub slippage: UD128,

    /// Post only one side (`ask` or `bid`) [default: both]
    #[arg(short, long, value_parser = parse_side)]
    pub one_side: Option<OrderSide>,
}

fn parse_decimal(s: &str) -> Result<UD128, String> {
    s.parse::<UD128>()
        .map_err(|err| format!("invalid decimal `{s}`: {err}"))
}

fn parse_side(s: &str) -> Result<OrderSide, String> { s.parse().map_err(|err| format!("{err}")) }

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(["groovyswap"].iter().chain(args))
    }

    #[test]
    fn test_root_command() {
        let cli = parse(&["--private-key", "0x01"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.offer_gasreq, DEFAULT_OFFER_GASREQ);
    }

    #[test]
    fn test_trade_commands() {
        let cli =
            parse(&["buy", "-b", "WETH", "-q", "USDC", "-l", "2500.5", "-a", "0.1"]).unwrap();
        let Some(Commands::Buy(args)) = cli.command else {
            panic!("expected buy, got {:?}", cli.command);
        };
        assert_eq!(args.pair.base, "WETH");
        assert_eq!(args.pair.quote, "USDC");
        assert_eq!(args.limit_price, udec128!(2500.5));
        assert_eq!(args.amount, udec128!(0.1));

        let cli = parse(&[
            "sell",
            "--base",
            "WETH",
            "--quote",
            "USDC",
            "--limit-price",
            "2400",
            "--amount",
            "1",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Sell(_))));

        assert!(parse(&["buy", "-b", "WETH", "-q", "USDC", "-a", "1"]).is_err());
        assert!(parse(&["buy", "-b", "WETH", "-q", "USDC", "-l", "-1", "-a", "1"]).is_err());
    }

    #[test]
    fn test_pair_commands() {
        for command in ["info", "remove-liquidity", "positions"] {
            let cli = parse(&[command, "-b", "USDC", "-q", "USDT"]).unwrap();
            match cli.command {
                Some(Commands::Info(pair))
                | Some(Commands::RemoveLiquidity(pair))
                | Some(Commands::Positions(pair)) => {
                    assert_eq!(pair.base, "USDC");
                    assert_eq!(pair.quote, "USDT");
                },
                other => panic!("unexpected command: {other:?}"),
            }
            assert!(parse(&[command, "-b", "USDC"]).is_err());
        }
        assert!(matches!(parse(&["markets"]).unwrap().command, Some(Commands::Markets)));
    }

    #[test]
    fn test_add_liquidity() {
        let cli = parse(&["add-liquidity", "-b", "USDC", "-q", "USDT", "-a", "100"]).unwrap();
        let Some(Commands::AddLiquidity(args)) = cli.command else {
            panic!("expected add-liquidity, got {:?}", cli.command);
        };
        assert_eq!(args.amount, udec128!(100));
        assert_eq!(args.slippage, udec128!(0.05));
        assert!(args.one_side.is_none());

        let cli = parse(&[
            "add-liquidity", "-b", "USDC", "-q", "USDT", "-a", "100", "-s", "0.1", "-o", "bid",
        ])
        .unwrap();
        let Some(Commands::AddLiquidity(args)) = cli.command else {
            panic!("expected add-liquidity, got {:?}", cli.command);
        };
        assert_eq!(args.slippage, udec128!(0.1));
        assert_eq!(args.one_side, Some(OrderSide::Bid));

        assert!(
            parse(&["add-liquidity", "-b", "USDC", "-q", "USDT", "-a", "100", "-o", "both"])
                .is_err()
        );
    }

    #[test]
    fn test_global_flags() {
        let cli = parse(&[
            "info",
            "-b",
            "USDC",
            "-q",
            "USDT",
            "--rpc",
            "http://node:8545",
            "--mangrove",
            "0x0000000000000000000000000000000000000001",
            "--timeout",
            "30",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.rpc, "http://node:8545");
        assert_eq!(cli.mangrove, Some(Address::with_last_byte(1)));
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.verbose, 2);
    }
}
