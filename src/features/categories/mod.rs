/// カテゴリ機能モジュール
///
/// 許可カテゴリの集合（レジストリ）と一覧用のカテゴリフィルターを提供します。
pub mod models;

pub use models::{CategoryFilter, CategoryRegistry, FilterOption, ALL_CATEGORIES, DEFAULT_CATEGORIES};
