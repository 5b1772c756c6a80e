// 領収書一覧の表示状態

use super::models::Receipt;
use crate::features::categories::CategoryFilter;
use crate::shared::utils::{format_currency, format_short_date};
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

/// 表示対象が0件のときのプレースホルダー
pub const EMPTY_PLACEHOLDER: &str = "No receipts found";

/// 日付なしの表示
pub const MISSING_DATE_LABEL: &str = "N/A";

/// 一覧の1行分の表示データ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptRow {
    pub id: String,
    pub merchant: String,
    pub amount: String,
    pub date: String,
    pub category: String,
}

impl From<&Receipt> for ReceiptRow {
    fn from(receipt: &Receipt) -> Self {
        Self {
            id: receipt.id.clone(),
            merchant: receipt.merchant.clone(),
            amount: format_currency(receipt.amount),
            date: receipt
                .date
                .map(format_short_date)
                .unwrap_or_else(|| MISSING_DATE_LABEL.to_string()),
            category: receipt.category.clone(),
        }
    }
}

/// 表示順での比較（日付の降順、日付なしは末尾）
fn display_order(a: &Receipt, b: &Receipt) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// クライアント側で保持する領収書コレクション
#[derive(Debug, Clone, Default)]
pub struct ReceiptList {
    receipts: Vec<Receipt>,
    filter: CategoryFilter,
}

impl ReceiptList {
    /// 読み込み結果（日付の降順）で初期化する
    pub fn new(receipts: Vec<Receipt>) -> Self {
        Self {
            receipts,
            filter: CategoryFilter::All,
        }
    }

    /// 読み込み結果でコレクションを置き換える（フィルターは維持）
    pub fn replace(&mut self, receipts: Vec<Receipt>) {
        debug!("一覧を置き換えます: count={}", receipts.len());
        self.receipts = receipts;
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        debug!("カテゴリフィルターを変更: {filter:?}");
        self.filter = filter;
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// 現在のフィルターに一致する領収書（順序は維持）
    pub fn filtered(&self) -> Vec<&Receipt> {
        self.receipts
            .iter()
            .filter(|r| self.filter.matches(&r.category))
            .collect()
    }

    /// 表示用の行データ
    pub fn rows(&self) -> Vec<ReceiptRow> {
        self.filtered().into_iter().map(ReceiptRow::from).collect()
    }

    /// フィルター後に表示するものがないか
    pub fn is_empty_view(&self) -> bool {
        !self
            .receipts
            .iter()
            .any(|r| self.filter.matches(&r.category))
    }

    /// 空表示のときのプレースホルダー
    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_empty_view().then_some(EMPTY_PLACEHOLDER)
    }

    /// 作成された領収書を表示順の位置に挿入する
    ///
    /// 同じ日付のものより前に入る
    pub fn insert(&mut self, receipt: Receipt) {
        let index = self
            .receipts
            .iter()
            .position(|existing| display_order(existing, &receipt) != Ordering::Less)
            .unwrap_or(self.receipts.len());

        debug!("領収書を一覧に追加: id={}, index={index}", receipt.id);
        self.receipts.insert(index, receipt);
    }

    /// IDが一致する領収書だけを取り除く
    pub fn remove(&mut self, id: &str) -> Option<Receipt> {
        let index = self.receipts.iter().position(|r| r.id == id)?;
        debug!("領収書を一覧から削除: id={id}");
        Some(self.receipts.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Receipt> {
        self.receipts.iter().find(|r| r.id == id)
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}
