//! Parser Module
//!
//! calamineを使用したスプレッドシート解析。
//! 最初のシートをヘッダー行付きのフラットなレコード列に変換します。

mod workbook;

pub use workbook::WorkbookParser;
