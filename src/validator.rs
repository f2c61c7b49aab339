use crate::{error::AppError, types::OptimizationResult};

/// `amount_per_output * N + final_fee == total_input` を厳密に検査する。
/// 不一致は入力ではなく計算側の不具合なので、結果を返さずに中断させる。
pub fn validate_balance(result: &OptimizationResult, total_input: u64, outputs: usize) -> Result<(), AppError> {
    let violation = || AppError::InvariantViolation {
        total_input,
        amount_per_output: result.amount_per_output,
        outputs,
        fee: result.final_fee,
    };

    let distributed = result
        .amount_per_output
        .checked_mul(outputs as u64)
        .ok_or_else(violation)?;
    let balance = distributed.checked_add(result.final_fee).ok_or_else(violation)?;

    if balance != total_input || result.final_fee == 0 || result.amount_per_output == 0 {
        log::error!(
            "残高不変条件違反: {} x {} + {} = {} (入力総額 {})",
            result.amount_per_output,
            outputs,
            result.final_fee,
            balance,
            total_input
        );
        return Err(violation());
    }

    log::debug!("残高検証OK: {} x {} + {} = {}", result.amount_per_output, outputs, result.final_fee, total_input);
    Ok(())
}
