use clap::Parser;
use std::path::PathBuf;
use bitcoin::Network as BitcoinNetwork;
use rust_decimal::Decimal;
use crate::error::AppError;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    /// 統合するUTXOと宛先を記述したJSONファイルへのパス
    #[clap(short, long, value_parser)]
    pub input_file: PathBuf,

    /// 署名前raw transaction hexを保存するファイルへのパス
    #[clap(short, long, value_parser)]
    pub output_file: Option<PathBuf>,

    /// 使用するネットワーク ("bitcoin", "testnet", "signet", "regtest")
    #[clap(short, long, value_parser, default_value = "testnet")]
    pub network: String,

    /// 手数料率 (sats/vB)。指定するとJSONの値を上書きする
    #[clap(long)]
    pub fee_rate: Option<Decimal>,

    /// 入力1件あたりのwitnessサイズ推定値 (vB)。指定するとJSONの値を上書きする
    #[clap(long)]
    pub witness_vbytes_per_input: Option<u64>,
}

pub fn parse_network(network_str: &str) -> Result<BitcoinNetwork, AppError> {
    match network_str.to_lowercase().as_str() {
        "bitcoin" | "mainnet" => Ok(BitcoinNetwork::Bitcoin),
        "testnet" => Ok(BitcoinNetwork::Testnet),
        "signet" => Ok(BitcoinNetwork::Signet),
        "regtest" => Ok(BitcoinNetwork::Regtest),
        s => Err(AppError::InputValidation(format!("無効なネットワークが指定されました: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn network_names_are_case_insensitive() {
        assert_eq!(parse_network("MainNet").unwrap(), BitcoinNetwork::Bitcoin);
        assert_eq!(parse_network("testnet").unwrap(), BitcoinNetwork::Testnet);
        assert_eq!(parse_network("Signet").unwrap(), BitcoinNetwork::Signet);
        assert_eq!(parse_network("REGTEST").unwrap(), BitcoinNetwork::Regtest);
    }

    #[test]
    fn unknown_network_is_rejected() {
        assert!(matches!(parse_network("litecoin"), Err(AppError::InputValidation(_))));
    }

    #[test]
    fn overrides_are_parsed() {
        let args = CliArgs::try_parse_from([
            "utxo-consolidation-planner",
            "-i",
            "plan.json",
            "--fee-rate",
            "2.75",
            "--witness-vbytes-per-input",
            "64",
        ])
        .unwrap();

        assert_eq!(args.input_file, PathBuf::from("plan.json"));
        assert_eq!(args.output_file, None);
        assert_eq!(args.network, "testnet");
        assert_eq!(args.fee_rate, Some(dec!(2.75)));
        assert_eq!(args.witness_vbytes_per_input, Some(64));
    }
}
