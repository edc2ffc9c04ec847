use alloy::{
    primitives::{Address, U256},
    signers::local::PrivateKeySigner,
};
use fastnum::udec128;
use groovyswap_cli::{
    args::{Commands, PairArgs},
    config::Config,
    execute,
};
use groovyswap_sdk::{
    Deployment,
    mangrove::DEFAULT_OFFER_GASREQ,
    testing::{Call, StubDex, StubMarket, token},
    types::TokenRole,
};

const SIGNER: Address = Address::repeat_byte(0x5e);
const ADMIN: Address = Address::repeat_byte(0xad);

// Well-known first development account of anvil/hardhat
const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn config() -> Config {
    Config {
        rpc_url: "http://127.0.0.1:8545".to_string(),
        rpc_throttle: None,
        signer: DEV_KEY.parse::<PrivateKeySigner>().unwrap(),
        admin_address: ADMIN,
        deployment: Deployment::new(Address::with_last_byte(1), Address::with_last_byte(2)),
        offer_gasreq: DEFAULT_OFFER_GASREQ,
        timeout: None,
    }
}

fn usdc_usdt() -> StubMarket {
    StubMarket::new(token("USDC", 6), token("USDT", 6))
        .balances(udec128!(123.45), udec128!(67.8))
        .own_ask(11, udec128!(1.05), udec128!(10))
}

fn pair(base: &str, quote: &str) -> PairArgs {
    PairArgs { base: base.to_string(), quote: quote.to_string() }
}

#[tokio::test]
async fn test_root_command_reads_native_balance() {
    let dex = StubDex::new(SIGNER).with_native_balance(U256::from(10u64).pow(U256::from(18u64)));

    execute(&dex, &config(), None).await.unwrap();
    assert_eq!(dex.calls(), vec![Call::NativeBalance(SIGNER)]);
}

#[tokio::test]
async fn test_positions_use_admin_address() {
    let dex = StubDex::new(SIGNER).with_market(usdc_usdt());

    execute(&dex, &config(), Some(Commands::Positions(pair("USDC", "USDT"))))
        .await
        .unwrap();

    let calls = dex.calls();
    assert!(calls.contains(&Call::BalanceOf(TokenRole::Base, ADMIN)));
    assert!(calls.contains(&Call::BalanceOf(TokenRole::Quote, ADMIN)));
    assert!(!calls.iter().any(|c| matches!(c, Call::BalanceOf(_, owner) if *owner == SIGNER)));
}

#[tokio::test]
async fn test_command_errors_carry_context() {
    let dex = StubDex::new(SIGNER).with_market(usdc_usdt());

    let err = execute(&dex, &config(), Some(Commands::Info(pair("USDT", "USDC"))))
        .await
        .unwrap_err();
    assert_eq!(format!("{err:#}"), "fetching market info: market USDT/USDC not found");
}

#[tokio::test]
async fn test_markets_command() {
    let dex = StubDex::new(SIGNER).with_market(usdc_usdt());

    execute(&dex, &config(), Some(Commands::Markets)).await.unwrap();
    assert_eq!(dex.calls(), vec![Call::OpenMarkets]);
}
