use std::str::FromStr;

use bitcoin::{Address, Amount, Network as BitcoinNetwork, OutPoint, Sequence, Txid};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    error::AppError,
    fee_model::DEFAULT_WITNESS_VBYTES_PER_INPUT,
    types::{FeeRate, TargetSet, UnspentInput},
};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    pub utxos: Vec<UtxoInput>,
    pub targets: Vec<String>,
    pub fee_rate_sats_per_vb: Decimal,
    #[serde(default)]
    pub witness_vbytes_per_input: Option<u64>,
    #[serde(default)]
    pub default_sequence: Option<u32>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UtxoInput {
    pub txid: String,
    pub vout: u32,
    pub value_sats: u64,
}

/// 検証済みの計画入力
#[derive(Debug)]
pub struct PlanInputs {
    pub inputs: Vec<UnspentInput>,
    pub total_input: u64,
    pub targets: TargetSet,
    pub fee_rate: FeeRate,
    pub witness_vbytes_per_input: u64,
    pub sequence: Sequence,
}

impl InputConfig {
    pub fn into_plan(
        self,
        network: BitcoinNetwork,
        fee_rate_override: Option<Decimal>,
        witness_override: Option<u64>,
    ) -> Result<PlanInputs, AppError> {
        if self.utxos.is_empty() {
            return Err(AppError::InputValidation("UTXOが1件も指定されていません".to_string()));
        }

        let mut inputs = Vec::with_capacity(self.utxos.len());
        let mut total_input: u64 = 0;
        for utxo in &self.utxos {
            let txid = Txid::from_str(&utxo.txid)
                .map_err(|e| AppError::InputValidation(format!("無効なTXID形式 ({}): {}", utxo.txid, e)))?;
            let input = UnspentInput {
                out_point: OutPoint::new(txid, utxo.vout),
                value: Amount::from_sat(utxo.value_sats),
            };
            total_input = total_input.checked_add(input.value.to_sat()).ok_or_else(|| {
                AppError::InputValidation(format!(
                    "入力総額がオーバーフローしました (txid={}, vout={})",
                    utxo.txid, utxo.vout
                ))
            })?;
            inputs.push(input);
            log::debug!("UTXO追加: txid={}, vout={}, value={}", utxo.txid, utxo.vout, utxo.value_sats);
        }

        let addresses = self
            .targets
            .iter()
            .map(|target| {
                Address::from_str(target)
                    .and_then(|addr| addr.require_network(network))
                    .map_err(|e| {
                        AppError::InputValidation(format!(
                            "宛先アドレス形式エラーまたはネットワーク不整合 ({}): {}",
                            target, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let targets = TargetSet::new(addresses)?;
        for address in targets.addresses() {
            log::debug!("宛先追加: {}", address);
        }

        let witness_vbytes_per_input = witness_override
            .or(self.witness_vbytes_per_input)
            .unwrap_or(DEFAULT_WITNESS_VBYTES_PER_INPUT);
        if witness_vbytes_per_input == 0 {
            return Err(AppError::InputValidation(
                "witnessVbytesPerInput は正の整数である必要があります".to_string(),
            ));
        }

        let fee_rate = FeeRate::with_floor(fee_rate_override.unwrap_or(self.fee_rate_sats_per_vb));
        let sequence = Sequence(self.default_sequence.unwrap_or(Sequence::MAX.0));

        Ok(PlanInputs {
            inputs,
            total_input,
            targets,
            fee_rate,
            witness_vbytes_per_input,
            sequence,
        })
    }
}
