use bitcoin::{consensus::encode, Address, Amount, OutPoint, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, SizingError};

/// 手数料率の下限 (sat/vB)
pub const MIN_FEE_RATE_SATS_PER_VB: Decimal = Decimal::ONE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnspentInput {
    pub out_point: OutPoint,
    pub value: Amount,
}

/// 同額を受け取る宛先アドレスの順序付き集合 (1件以上)
#[derive(Debug, Clone)]
pub struct TargetSet {
    addresses: Vec<Address>,
}

impl TargetSet {
    pub fn new(addresses: Vec<Address>) -> Result<Self, AppError> {
        if addresses.is_empty() {
            return Err(AppError::InputValidation(
                "宛先アドレスが1件も指定されていません".to_string(),
            ));
        }
        Ok(Self { addresses })
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// 各宛先に `amount` を割り当てた出力一覧
    pub fn outputs_with(&self, amount: Amount) -> Vec<(Address, Amount)> {
        self.addresses.iter().map(|address| (address.clone(), amount)).collect()
    }
}

/// sat/vB 単位の手数料率。常に 1.0 以上。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeeRate(Decimal);

impl FeeRate {
    /// 下限 1.0 sat/vB を適用して生成する
    pub fn with_floor(rate: Decimal) -> Self {
        if rate < MIN_FEE_RATE_SATS_PER_VB {
            log::warn!(
                "手数料率 {} sats/vB は下限未満のため {} sats/vB に引き上げます。",
                rate,
                MIN_FEE_RATE_SATS_PER_VB
            );
            Self(MIN_FEE_RATE_SATS_PER_VB)
        } else {
            Self(rate)
        }
    }

    pub fn sats_per_vb(&self) -> Decimal {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    pub base_vbytes: u64,
    pub witness_vbytes_per_input: u64,
    pub total_vbytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationResult {
    pub final_fee: u64,
    pub amount_per_output: u64,
}

/// 標準出力に書き出す計画結果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationPlan {
    pub total_input_sats: u64,
    pub outputs: usize,
    pub amount_per_output_sats: u64,
    pub fee_sats: u64,
    pub estimated_vbytes: u64,
    pub effective_fee_rate: Decimal,
    pub unsigned_tx_hex: String,
}

impl ConsolidationPlan {
    /// 検証済みの結果と署名前トランザクションから出力用の計画をまとめる
    pub fn new(
        total_input: u64,
        result: &OptimizationResult,
        estimate: &SizeEstimate,
        unsigned_tx: &Transaction,
    ) -> Result<Self, AppError> {
        let effective_fee_rate = Decimal::from(result.final_fee)
            .checked_div(Decimal::from(estimate.total_vbytes))
            .ok_or_else(|| {
                SizingError::Uninterpretable(format!(
                    "推定サイズ {} vB から実効手数料率を計算できません",
                    estimate.total_vbytes
                ))
            })?
            .round_dp(3);

        Ok(Self {
            total_input_sats: total_input,
            outputs: unsigned_tx.output.len(),
            amount_per_output_sats: result.amount_per_output,
            fee_sats: result.final_fee,
            estimated_vbytes: estimate.total_vbytes,
            effective_fee_rate,
            unsigned_tx_hex: encode::serialize_hex(unsigned_tx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::Sequence;
    use rust_decimal_macros::dec;

    use crate::{
        oracle::stubs::{sample_inputs, sample_targets},
        transaction::build_consolidation_transaction,
    };

    #[test]
    fn fee_rate_below_floor_is_raised() {
        assert_eq!(FeeRate::with_floor(dec!(0.25)).sats_per_vb(), dec!(1));
        assert_eq!(FeeRate::with_floor(dec!(-3)).sats_per_vb(), dec!(1));
    }

    #[test]
    fn fee_rate_at_or_above_floor_is_kept() {
        assert_eq!(FeeRate::with_floor(dec!(1.0)).sats_per_vb(), dec!(1.0));
        assert_eq!(FeeRate::with_floor(dec!(12.345)).sats_per_vb(), dec!(12.345));
    }

    #[test]
    fn empty_target_set_is_rejected() {
        assert!(matches!(TargetSet::new(Vec::new()), Err(AppError::InputValidation(_))));
    }

    fn odd_remainder_plan() -> (ConsolidationPlan, Transaction) {
        let inputs = sample_inputs(&[40_000, 30_000, 30_000]);
        let targets = sample_targets(3);
        let result = OptimizationResult { final_fee: 769, amount_per_output: 33_077 };
        let estimate = SizeEstimate { base_vbytes: 300, witness_vbytes_per_input: 28, total_vbytes: 384 };
        let tx = build_consolidation_transaction(&inputs, &targets, &result, Sequence::MAX);
        let plan = ConsolidationPlan::new(100_000, &result, &estimate, &tx).unwrap();
        (plan, tx)
    }

    #[test]
    fn plan_serializes_with_camel_case_keys() {
        let (plan, tx) = odd_remainder_plan();

        let json = serde_json::to_value(&plan).unwrap();

        assert_eq!(json["totalInputSats"], 100_000);
        assert_eq!(json["outputs"], 3);
        assert_eq!(json["amountPerOutputSats"], 33_077);
        assert_eq!(json["feeSats"], 769);
        assert_eq!(json["estimatedVbytes"], 384);
        // 769 / 384 = 2.00260...
        assert_eq!(json["effectiveFeeRate"], "2.003");
        assert_eq!(json["unsignedTxHex"], encode::serialize_hex(&tx));
        assert_eq!(json.as_object().unwrap().len(), 7);
    }

    #[test]
    fn plan_hex_encodes_validated_amounts() {
        let (plan, _) = odd_remainder_plan();

        let decoded: Transaction = encode::deserialize_hex(&plan.unsigned_tx_hex).unwrap();

        assert_eq!(decoded.input.len(), 3);
        assert_eq!(decoded.output.len(), 3);
        assert!(decoded.output.iter().all(|out| out.value == Amount::from_sat(33_077)));
        let paid: u64 = decoded.output.iter().map(|out| out.value.to_sat()).sum();
        assert_eq!(paid + plan.fee_sats, plan.total_input_sats);
    }

    #[test]
    fn zero_vbytes_estimate_is_an_error() {
        let inputs = sample_inputs(&[10_000]);
        let targets = sample_targets(1);
        let result = OptimizationResult { final_fee: 100, amount_per_output: 9_900 };
        let estimate = SizeEstimate { base_vbytes: 0, witness_vbytes_per_input: 0, total_vbytes: 0 };
        let tx = build_consolidation_transaction(&inputs, &targets, &result, Sequence::MAX);

        let err = ConsolidationPlan::new(10_000, &result, &estimate, &tx).unwrap_err();

        assert!(matches!(err, AppError::Sizing(SizingError::Uninterpretable(_))));
    }
}
