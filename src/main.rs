use std::fs::{self, File};
use std::io::Write;
use clap::Parser;

mod cli;
mod config;
mod error;
mod fee_model;
mod optimizer;
mod oracle;
mod transaction;
mod types;
mod validator;

use cli::{CliArgs, parse_network};
use config::InputConfig;
use error::AppError;
use fee_model::FeeModel;
use oracle::UnsignedTxSizer;
use types::ConsolidationPlan;

fn main() -> Result<(), AppError> {
    env_logger::init();

    let args = CliArgs::parse();
    log::info!("アプリケーションを開始します。引数: {:?}", args);

    let cli_network = parse_network(&args.network)?;
    log::info!("指定されたネットワーク: {:?}", cli_network);

    let input_file_content = fs::read_to_string(&args.input_file).map_err(|e| {
        log::error!("入力ファイルの読み込みに失敗しました: {:?}", args.input_file);
        AppError::Io(e)
    })?;

    let config: InputConfig = serde_json::from_str(&input_file_content).map_err(|e| {
        log::error!("入力JSONのパースに失敗しました。");
        AppError::JsonParse {
            file_path: args.input_file.clone(),
            source: e,
        }
    })?;
    log::debug!("入力設定ファイルのパース成功: {:?}", config);

    let plan = config.into_plan(cli_network, args.fee_rate, args.witness_vbytes_per_input)?;
    log::info!(
        "UTXO {} 件 (総額 {} sats) を {} 件の出力へ統合します。",
        plan.inputs.len(),
        plan.total_input,
        plan.targets.len()
    );

    let oracle = UnsignedTxSizer;
    let model = FeeModel::new(
        &plan.inputs,
        &plan.targets,
        plan.fee_rate,
        plan.witness_vbytes_per_input,
        &oracle,
    );
    log::info!(
        "手数料率: {} sats/vB, 入力1件あたりのwitness推定: {} vB",
        model.fee_rate().sats_per_vb(),
        plan.witness_vbytes_per_input
    );

    let result = optimizer::optimize(&model, plan.total_input)?;
    validator::validate_balance(&result, plan.total_input, plan.targets.len())?;

    let estimate = model.estimate_size(result.amount_per_output)?;
    log::info!(
        "最終推定サイズ: base {} vB + witness {} vB x {} 入力 = {} vB",
        estimate.base_vbytes,
        estimate.witness_vbytes_per_input,
        plan.inputs.len(),
        estimate.total_vbytes
    );
    let unsigned_tx = transaction::build_consolidation_transaction(
        &plan.inputs,
        &plan.targets,
        &result,
        plan.sequence,
    );
    let consolidation_plan = ConsolidationPlan::new(plan.total_input, &result, &estimate, &unsigned_tx)?;
    log::info!("署名前raw transaction hex: {}", consolidation_plan.unsigned_tx_hex);

    let rendered = serde_json::to_string_pretty(&consolidation_plan).map_err(AppError::JsonWrite)?;
    println!("{}", rendered);

    if let Some(output_path) = &args.output_file {
        let mut output_file = File::create(output_path).map_err(|e| {
            log::error!("出力ファイルの作成に失敗しました: {:?}", output_path);
            AppError::Io(e)
        })?;
        output_file.write_all(consolidation_plan.unsigned_tx_hex.as_bytes()).map_err(|e| {
            log::error!("出力ファイルへの書き込みに失敗しました。");
            AppError::Io(e)
        })?;
        log::info!("署名前raw transactionを {:?} に保存しました。", output_path);
    }

    log::info!("処理が正常に完了しました。");
    Ok(())
}
