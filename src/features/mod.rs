/// 機能別モジュール
///
/// 各機能モジュールは、その機能に関連するコード（モデル、リポジトリ、サービス、ビュー状態）
/// を含む自己完結型のユニットです。
pub mod categories;
pub mod receipts;
