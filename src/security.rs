//! Security Module
//!
//! 入力サイズとシート寸法の上限を扱うモジュール。
//! 巨大なファイルや極端に大きなシートによるリソース枯渇への対策を提供します。

use crate::error::PrepDeckError;

/// セキュリティ設定
///
/// ワークブック解析時のリソース制限を定義します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SecurityConfig {
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 256MB (268_435_456 bytes)
    pub max_input_file_size: u64,
    /// シートの最大行数（ヘッダー行を含む）
    /// デフォルト: 1_048_576（Excelの上限）
    pub max_rows: usize,
    /// シートの最大列数
    /// デフォルト: 16_384（Excelの上限）
    pub max_columns: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_file_size: 268_435_456, // 256MB
            max_rows: 1_048_576,
            max_columns: 16_384,
        }
    }
}

impl SecurityConfig {
    /// 設定値の検証
    ///
    /// いずれかの上限が0の場合は`PrepDeckError::Config`を返します。
    pub fn validate(&self) -> Result<(), PrepDeckError> {
        if self.max_input_file_size == 0 {
            return Err(PrepDeckError::Config(
                "max_input_file_size must be greater than 0".to_string(),
            ));
        }
        if self.max_rows == 0 {
            return Err(PrepDeckError::Config(
                "max_rows must be greater than 0".to_string(),
            ));
        }
        if self.max_columns == 0 {
            return Err(PrepDeckError::Config(
                "max_columns must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 入力サイズの検証
    pub fn check_input_size(&self, len: usize) -> Result<(), PrepDeckError> {
        if len as u64 > self.max_input_file_size {
            return Err(PrepDeckError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                len, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// シート寸法の検証
    ///
    /// # 引数
    ///
    /// * `rows` - 使用範囲の行数（ヘッダー行を含む）
    /// * `columns` - 使用範囲の列数
    pub fn check_dimensions(&self, rows: usize, columns: usize) -> Result<(), PrepDeckError> {
        if rows > self.max_rows {
            return Err(PrepDeckError::SecurityViolation(format!(
                "Sheet has too many rows: {} (max: {})",
                rows, self.max_rows
            )));
        }
        if columns > self.max_columns {
            return Err(PrepDeckError::SecurityViolation(format!(
                "Sheet has too many columns: {} (max: {})",
                columns, self.max_columns
            )));
        }
        Ok(())
    }
}
