// 領収書詳細ダイアログの表示データ

use super::models::Receipt;
use crate::shared::utils::{format_currency, format_long_date};
use serde::Serialize;
use url::Url;

/// 日付なしの表示
pub const MISSING_DATE_TEXT: &str = "No date provided";

/// 添付ファイルの表示方法
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AttachmentView {
    /// インライン画像
    Image { url: String, alt: String },
    /// 外部リンクで開くPDF
    Document {
        url: String,
        title: String,
        link_label: String,
    },
}

impl AttachmentView {
    /// URLの拡張子で表示方法を決める（大文字小文字・クエリ文字列は無視）
    pub fn for_url(url: &str) -> Self {
        if is_pdf_url(url) {
            AttachmentView::Document {
                url: url.to_string(),
                title: "PDF Receipt".to_string(),
                link_label: "View PDF".to_string(),
            }
        } else {
            AttachmentView::Image {
                url: url.to_string(),
                alt: "Receipt".to_string(),
            }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            AttachmentView::Image { url, .. } | AttachmentView::Document { url, .. } => url,
        }
    }
}

fn is_pdf_url(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // 相対パスなど
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.to_lowercase().ends_with(".pdf")
}

/// 1件の領収書の読み取り専用ビュー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptDetail {
    pub id: String,
    pub merchant: String,
    pub amount: String,
    pub date: String,
    pub category: String,
    pub attachment: Option<AttachmentView>,
}

impl ReceiptDetail {
    /// 選択中の領収書から表示データを作る（未選択なら何も表示しない）
    pub fn from_receipt(receipt: Option<&Receipt>) -> Option<Self> {
        let receipt = receipt?;
        Some(Self {
            id: receipt.id.clone(),
            merchant: receipt.merchant.clone(),
            amount: format_currency(receipt.amount),
            date: receipt
                .date
                .map(format_long_date)
                .unwrap_or_else(|| MISSING_DATE_TEXT.to_string()),
            category: receipt.category.clone(),
            attachment: receipt
                .receipt_image_url
                .as_deref()
                .map(AttachmentView::for_url),
        })
    }
}
