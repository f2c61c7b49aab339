use bitcoin::{Amount, OutPoint};
use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::{
    error::{AppError, SizingError},
    oracle::SizingOracle,
    types::{FeeRate, SizeEstimate, TargetSet, UnspentInput},
};

/// 単一署名 segwit 入力1件あたりの witness サイズの既定値 (vB)
pub const DEFAULT_WITNESS_VBYTES_PER_INPUT: u64 = 28;

/// ある出力額候補に対して必要となる最低手数料の内訳
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRequirement {
    pub size_based_fee: u64,
    pub remainder: u64,
    pub required_fee: u64,
}

pub struct FeeModel<'a> {
    out_points: Vec<OutPoint>,
    targets: &'a TargetSet,
    fee_rate: FeeRate,
    witness_vbytes_per_input: u64,
    oracle: &'a dyn SizingOracle,
}

impl<'a> FeeModel<'a> {
    pub fn new(
        inputs: &[UnspentInput],
        targets: &'a TargetSet,
        fee_rate: FeeRate,
        witness_vbytes_per_input: u64,
        oracle: &'a dyn SizingOracle,
    ) -> Self {
        Self {
            out_points: inputs.iter().map(|input| input.out_point).collect(),
            targets,
            fee_rate,
            witness_vbytes_per_input,
            oracle,
        }
    }

    pub fn output_count(&self) -> usize {
        self.targets.len()
    }

    pub fn fee_rate(&self) -> FeeRate {
        self.fee_rate
    }

    /// 各出力が `amount_per_output` を受け取る場合の署名後サイズを見積もる
    pub fn estimate_size(&self, amount_per_output: u64) -> Result<SizeEstimate, AppError> {
        let outputs = self.targets.outputs_with(Amount::from_sat(amount_per_output));
        let base_vbytes = self.oracle.estimate_base_vbytes(&self.out_points, &outputs)?;

        let witness_vbytes = (self.out_points.len() as u64)
            .checked_mul(self.witness_vbytes_per_input)
            .ok_or_else(|| {
                SizingError::Uninterpretable(format!(
                    "witness サイズがオーバーフローしました ({} 入力)",
                    self.out_points.len()
                ))
            })?;
        let total_vbytes = base_vbytes
            .checked_add(witness_vbytes)
            .ok_or_else(|| {
                SizingError::Uninterpretable(format!(
                    "推定サイズがオーバーフローしました (base {} vB)",
                    base_vbytes
                ))
            })?;

        log::debug!(
            "推定vsize: base {} vB + witness {} vB = {} vB",
            base_vbytes,
            witness_vbytes,
            total_vbytes
        );

        Ok(SizeEstimate {
            base_vbytes,
            witness_vbytes_per_input: self.witness_vbytes_per_input,
            total_vbytes,
        })
    }

    /// vsize と手数料率から最低手数料を求める (切り上げ)
    pub fn size_based_fee(&self, total_vbytes: u64) -> Result<u64, AppError> {
        let fee = Decimal::from(total_vbytes)
            .checked_mul(self.fee_rate.sats_per_vb())
            .map(|fee| fee.ceil())
            .and_then(|fee| fee.to_u64())
            .ok_or_else(|| {
                SizingError::Uninterpretable(format!(
                    "{} vB x {} sats/vB を手数料に変換できません",
                    total_vbytes,
                    self.fee_rate.sats_per_vb()
                ))
            })?;
        Ok(fee)
    }

    /// 出力額候補 `candidate_amount_per_output` に必要な手数料を求める。
    ///
    /// 端数は実際に次に課される手数料 (`fee_guess` とサイズ由来手数料の大きい方)
    /// を差し引いた残額を N で割った余りとして計算する。`fee_guess` がサイズ由来
    /// 手数料以上であれば `(total_input - fee_guess) mod N` と一致する。
    pub fn required_fee(
        &self,
        candidate_amount_per_output: u64,
        total_input: u64,
        fee_guess: u64,
    ) -> Result<FeeRequirement, AppError> {
        let estimate = self.estimate_size(candidate_amount_per_output)?;
        let size_based_fee = self.size_based_fee(estimate.total_vbytes)?;

        let charged = fee_guess.max(size_based_fee);
        let remainder = total_input.saturating_sub(charged) % self.output_count() as u64;
        let required_fee = charged.saturating_add(remainder);

        Ok(FeeRequirement {
            size_based_fee,
            remainder,
            required_fee,
        })
    }
}
