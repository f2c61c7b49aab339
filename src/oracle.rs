use bitcoin::{Address, Amount, OutPoint, Sequence};

use crate::error::SizingError;
use crate::transaction::build_unsigned_transaction;

/// 入力と出力の組から、witness を除いたトランザクションサイズ (vbytes) を返す。
pub trait SizingOracle {
    fn estimate_base_vbytes(
        &self,
        inputs: &[OutPoint],
        outputs: &[(Address, Amount)],
    ) -> Result<u64, SizingError>;
}

/// 署名前トランザクションを実際に組み立ててサイズを測る
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsignedTxSizer;

impl SizingOracle for UnsignedTxSizer {
    fn estimate_base_vbytes(
        &self,
        inputs: &[OutPoint],
        outputs: &[(Address, Amount)],
    ) -> Result<u64, SizingError> {
        if inputs.is_empty() || outputs.is_empty() {
            return Err(SizingError::Oracle(format!(
                "入力 {} 件, 出力 {} 件のトランザクションはサイズを推定できません",
                inputs.len(),
                outputs.len()
            )));
        }
        // witness が空なので base size がそのまま vsize になる
        let tx = build_unsigned_transaction(inputs, outputs, Sequence::MAX);
        let base_size = tx.base_size();
        log::debug!(
            "署名前トランザクションのサイズ: {} vB (入力 {} 件, 出力 {} 件)",
            base_size,
            inputs.len(),
            outputs.len()
        );
        u64::try_from(base_size)
            .map_err(|e| SizingError::Uninterpretable(format!("base size {}: {}", base_size, e)))
    }
}
