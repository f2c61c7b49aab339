use std::path::PathBuf;
use thiserror::Error;

/// サイズ推定オラクル由来のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizingError {
    #[error("サイズ推定オラクルの呼び出しに失敗しました: {0}")]
    Oracle(String),

    #[error("サイズ推定結果を解釈できません: {0}")]
    Uninterpretable(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSONパースエラー ファイル: {file_path:?}, 詳細: {source}")]
    JsonParse {
        file_path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON出力エラー: {0}")]
    JsonWrite(#[source] serde_json::Error),

    #[error("入力検証エラー: {0}")]
    InputValidation(String),

    #[error("資金不足: 利用可能な総額 {available} sats, 要求額 {required} sats (試行した手数料 {fee} sats)")]
    InsufficientFunds {
        available: u64,
        required: u64,
        fee: u64,
    },

    #[error("サイズ推定エラー: {0}")]
    Sizing(#[from] SizingError),

    #[error(
        "手数料探索が {attempts} 回の試行で収束しませんでした \
         (最後に試した手数料 {fee} sats, 要求額 {required} sats)"
    )]
    NonConvergence {
        attempts: usize,
        fee: u64,
        required: u64,
    },

    #[error(
        "残高不変条件違反: {amount_per_output} sats x {outputs} + 手数料 {fee} sats \
         != 入力総額 {total_input} sats"
    )]
    InvariantViolation {
        total_input: u64,
        amount_per_output: u64,
        outputs: usize,
        fee: u64,
    },
}
