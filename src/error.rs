//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// prepdeckクレート全体で使用するエラー型
///
/// スプレッドシートの読み込み、設定の検証、ダッシュボードの出力処理中に
/// 発生するすべてのエラーを統一的に扱うために使用されます。
///
/// 日付として解釈できない値、数値でない数量、空のカテゴリ値は
/// エラーではありません（それぞれ`None`、0、フォールバックラベルに変換されます）。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー（ファイル読み込み失敗など）
/// - `Parse`: スプレッドシートのデコードに失敗したエラー（calamine由来）
/// - `Config`: 設定の検証に失敗したエラー
/// - `SecurityViolation`: 入力サイズ・シート寸法の上限を超えたエラー
/// - `Json`: JSON出力時のシリアライズエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use prepdeck::{DashboardBuilder, PrepDeckError};
///
/// fn load(bytes: &[u8]) -> Result<usize, PrepDeckError> {
///     let dashboard = DashboardBuilder::new().build()?;
///     let dataset = dashboard.parse(bytes)?;
///     Ok(dataset.len())
/// }
/// ```
#[derive(Error, Debug)]
pub enum PrepDeckError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// スプレッドシートのデコード中に発生したエラー
    ///
    /// 入力がスプレッドシートのコンテナとして読めない場合（破損、未対応形式、
    /// スプレッドシート以外のバイト列）に発生します。このエラーが返された場合、
    /// 有効なデータセットは置き換えられません。
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `DashboardBuilder::build()`時に無効な設定が検出された場合に発生します。
    ///
    /// ```rust,no_run
    /// use prepdeck::{DashboardBuilder, PrepDeckError};
    ///
    /// match DashboardBuilder::new().with_top_n(0).build() {
    ///     Err(PrepDeckError::Config(msg)) => println!("設定エラー: {}", msg),
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 入力制限に違反したエラー
    ///
    /// 入力サイズ、行数、列数の上限を超えた場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// JSON出力時のシリアライズエラー
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: PrepDeckError = io_err.into();

        match error {
            PrepDeckError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_parse_error_display() {
        let error: PrepDeckError = calamine::Error::Msg("Corrupted file").into();

        let error_msg = error.to_string();
        assert!(error_msg.starts_with("Failed to parse spreadsheet"));
        assert!(error_msg.contains("Corrupted file"));
    }

    #[test]
    fn test_config_error_display() {
        let error = PrepDeckError::Config("top_n must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: top_n must be greater than 0"
        );
    }

    #[test]
    fn test_security_violation_display() {
        let error = PrepDeckError::SecurityViolation("too many rows".to_string());
        assert!(error.to_string().starts_with("Security violation"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: PrepDeckError = json_err.into();
        assert!(matches!(error, PrepDeckError::Json(_)));
    }

    // ?演算子による変換の確認
    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), PrepDeckError> {
            let _file = std::fs::File::open("nonexistent_schedule.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(PrepDeckError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }
}
