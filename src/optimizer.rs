use crate::{
    error::AppError,
    fee_model::FeeModel,
    types::OptimizationResult,
};

/// 手数料探索の最大試行回数
pub const MAX_FEE_SEARCH_ATTEMPTS: usize = 20;

/// 入力総額 `total_input` を N 個の同額出力と手数料に過不足なく分配する、
/// 最小の手数料と出力1件あたりの金額を求める。
///
/// 手数料の候補は 1 sat から始まり、候補が要求額を下回る限り要求額へ引き上げる。
/// 候補は単調非減少なので、最初に `guess >= required` を満たした値が上昇探索で
/// 到達できる最小の手数料になる。
/// サイズは出力額の関数として毎回オラクルに問い合わせる。
pub fn optimize(model: &FeeModel<'_>, total_input: u64) -> Result<OptimizationResult, AppError> {
    let outputs = model.output_count() as u64;
    let mut guess: u64 = 1;
    let mut required: u64 = guess;
    let mut attempted: u64 = guess;

    for attempt in 1..=MAX_FEE_SEARCH_ATTEMPTS {
        if guess >= total_input {
            return Err(AppError::InsufficientFunds {
                available: total_input,
                required,
                fee: guess,
            });
        }

        let amount_per_output = (total_input - guess) / outputs;
        if amount_per_output == 0 {
            return Err(AppError::InsufficientFunds {
                available: total_input,
                required,
                fee: guess,
            });
        }

        attempted = guess;
        let requirement = model.required_fee(amount_per_output, total_input, guess)?;
        log::debug!(
            "試行 {}: 手数料候補 {} sats, 出力額 {} sats, サイズ由来手数料 {} sats, \
             端数 {} sats, 要求額 {} sats",
            attempt,
            guess,
            amount_per_output,
            requirement.size_based_fee,
            requirement.remainder,
            requirement.required_fee
        );

        if guess >= requirement.required_fee {
            log::info!(
                "手数料探索が {} 回目で収束しました: 手数料 {} sats, 出力額 {} sats x {}",
                attempt,
                guess,
                amount_per_output,
                outputs
            );
            return Ok(OptimizationResult {
                final_fee: guess,
                amount_per_output,
            });
        }

        required = requirement.required_fee;
        if required >= total_input {
            return Err(AppError::InsufficientFunds {
                available: total_input,
                required,
                fee: guess,
            });
        }
        guess = required;
    }

    Err(AppError::NonConvergence {
        attempts: MAX_FEE_SEARCH_ATTEMPTS,
        fee: attempted,
        required,
    })
}
