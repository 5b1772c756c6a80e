/// NanoID生成ユーティリティ
pub mod nanoid;

use chrono::{Datelike, NaiveDate};

pub use self::nanoid::{generate_receipt_id, is_valid_nanoid};

/// 金額を表示用にフォーマットする
///
/// 小数点以下は常に2桁、整数部は3桁ごとにカンマ区切り（例: `$1,234.50`）
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (integer_part, fraction_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (i, ch) in integer_part.chars().enumerate() {
        if i > 0 && (integer_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.00 のような表示を避ける
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${sign}{grouped}.{fraction_part}")
}

/// 一覧表示用の短い日付（例: `Mar 1, 2024`）
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// 詳細表示用の長い日付（例: `March 1st, 2024`）
pub fn format_long_date(date: NaiveDate) -> String {
    let day = date.day();
    format!(
        "{} {}{}, {}",
        date.format("%B"),
        day,
        ordinal_suffix(day),
        date.year()
    )
}

/// 英語の序数接尾辞
fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
