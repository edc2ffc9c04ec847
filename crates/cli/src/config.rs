use std::time::Duration;

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use groovyswap_sdk::Deployment;
use thiserror::Error;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("private key is not set, see `--private-key` or PRIVATE_KEY")]
    MissingPrivateKey,

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("{contract} contract address is not set, see `--{flag}` or {env}")]
    MissingContract { contract: &'static str, flag: &'static str, env: &'static str },
}

/// Settings of a single command run, resolved from arguments and environment.
#[derive(Debug)]
pub struct Config {
    pub rpc_url: String,
    pub rpc_throttle: Option<u32>,
    pub signer: PrivateKeySigner,
    /// Owner of the balances shown by `positions`.
    pub admin_address: Address,
    pub deployment: Deployment,
    pub offer_gasreq: u64,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let signer: PrivateKeySigner = cli
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingPrivateKey)?
            .parse()
            .map_err(|err| ConfigError::InvalidPrivateKey(format!("{err}")))?;

        let mangrove = cli.mangrove.ok_or(ConfigError::MissingContract {
            contract: "Mangrove",
            flag: "mangrove",
            env: "MANGROVE_ADDRESS",
        })?;
        let reader = cli.reader.ok_or(ConfigError::MissingContract {
            contract: "MgvReader",
            flag: "reader",
            env: "MGV_READER_ADDRESS",
        })?;

        Ok(Self {
            rpc_url: cli.rpc.clone(),
            rpc_throttle: cli.rpc_throttle,
            admin_address: cli.admin_address.unwrap_or(signer.address()),
            signer,
            deployment: Deployment::new(mangrove, reader),
            offer_gasreq: cli.offer_gasreq,
            timeout: cli.timeout.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    // Well-known first development account of anvil/hardhat
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(["groovyswap"].iter().chain(args)).unwrap()
    }

    #[test]
    fn test_config_from_cli() {
        let config = Config::from_cli(&cli(&[
            "--private-key",
            DEV_KEY,
            "--mangrove",
            "0x0000000000000000000000000000000000000001",
            "--reader",
            "0x0000000000000000000000000000000000000002",
            "--timeout",
            "5",
        ]))
        .unwrap();

        let signer: Address = DEV_ADDRESS.parse().unwrap();
        assert_eq!(config.signer.address(), signer);
        assert_eq!(config.admin_address, signer);
        assert_eq!(config.deployment.mangrove(), Address::with_last_byte(1));
        assert_eq!(config.deployment.reader(), Address::with_last_byte(2));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_admin_address_override() {
        let config = Config::from_cli(&cli(&[
            "--private-key",
            DEV_KEY,
            "--admin-address",
            "0x00000000000000000000000000000000000000aa",
            "--mangrove",
            "0x0000000000000000000000000000000000000001",
            "--reader",
            "0x0000000000000000000000000000000000000002",
        ]))
        .unwrap();
        assert_eq!(config.admin_address, Address::with_last_byte(0xaa));
    }

    #[test]
    fn test_config_errors() {
        let err = Config::from_cli(&cli(&["--private-key", ""])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPrivateKey));

        let err = Config::from_cli(&cli(&["--private-key", "0xnothex"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrivateKey(_)));

        let err = Config::from_cli(&cli(&[
            "--private-key",
            DEV_KEY,
            "--reader",
            "0x0000000000000000000000000000000000000002",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingContract { contract: "Mangrove", .. }));
    }
}
