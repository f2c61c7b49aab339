use bitcoin::{
    absolute::LockTime, transaction::Version, Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};

use crate::types::{OptimizationResult, TargetSet, UnspentInput};

/// 署名前 (script_sig と witness が空) のトランザクションを構築する
pub fn build_unsigned_transaction(
    inputs: &[OutPoint],
    outputs: &[(Address, Amount)],
    sequence: Sequence,
) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs
            .iter()
            .map(|out_point| TxIn {
                previous_output: *out_point,
                script_sig: ScriptBuf::new(),
                sequence,
                witness: Witness::new(),
            })
            .collect(),
        output: outputs
            .iter()
            .map(|(address, value)| TxOut {
                value: *value,
                script_pubkey: address.script_pubkey(),
            })
            .collect(),
    }
}

/// 最適化結果から統合トランザクション (全入力 -> N個の同額出力) を組み立てる
pub fn build_consolidation_transaction(
    inputs: &[UnspentInput],
    targets: &TargetSet,
    result: &OptimizationResult,
    sequence: Sequence,
) -> Transaction {
    let out_points: Vec<OutPoint> = inputs.iter().map(|input| input.out_point).collect();
    let outputs = targets.outputs_with(Amount::from_sat(result.amount_per_output));
    let transaction = build_unsigned_transaction(&out_points, &outputs, sequence);
    log::debug!(
        "統合トランザクション構築: 入力 {} 件, 出力 {} 件 x {} sats",
        transaction.input.len(),
        transaction.output.len(),
        result.amount_per_output
    );
    transaction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::stubs::{sample_inputs, sample_targets};

    #[test]
    fn consolidation_pays_every_target_the_same_amount() {
        let inputs = sample_inputs(&[60_000, 40_000]);
        let targets = sample_targets(3);
        let result = OptimizationResult { final_fee: 769, amount_per_output: 33_077 };

        let tx = build_consolidation_transaction(&inputs, &targets, &result, Sequence::MAX);

        assert_eq!(tx.input.len(), 2);
        assert_eq!(tx.output.len(), 3);
        assert!(tx.output.iter().all(|out| out.value == Amount::from_sat(33_077)));
        assert!(tx.input.iter().all(|txin| txin.witness.is_empty() && txin.script_sig.is_empty()));
        for (out, address) in tx.output.iter().zip(targets.addresses()) {
            assert_eq!(out.script_pubkey, address.script_pubkey());
        }
    }

    #[test]
    fn configured_sequence_is_applied_to_all_inputs() {
        let inputs = sample_inputs(&[1_000, 2_000, 3_000]);
        let targets = sample_targets(1);
        let result = OptimizationResult { final_fee: 500, amount_per_output: 5_500 };

        let tx = build_consolidation_transaction(&inputs, &targets, &result, Sequence::ENABLE_RBF_NO_LOCKTIME);

        assert!(tx.input.iter().all(|txin| txin.sequence == Sequence::ENABLE_RBF_NO_LOCKTIME));
    }
}
