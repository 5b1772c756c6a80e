// 領収書機能のデータモデル

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 永続化された領収書
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Receipt {
    pub id: String,                        // レコードストアが割り当てるnanoId
    pub merchant: String,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub receipt_image_url: Option<String>, // 解決済みの取得URL（ストレージパスではない）
    pub created_at: String,                // 作成日時（RFC3339形式、UTC）
}

/// メモリ上の未アップロード添付ファイル
#[derive(Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for PendingFile {
    // バイト列はログに出さない
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.data.len())
            .finish()
    }
}

impl PendingFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// ファイル名からメディアタイプを推定して作成する
    pub fn from_name(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = media_type_for(&name).to_string();
        Self {
            name,
            media_type,
            data,
        }
    }

    /// ファイルサイズ（バイト）
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// 画像ファイルかどうか（プレビュー表示の判定に使う）
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// 元のファイル名の拡張子（小文字）
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
    }
}

/// ファイル名の拡張子からContent-Typeを推定
pub fn media_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// 作成ワークフロー中だけ存在する下書き
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDraft {
    pub merchant: String,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub file: Option<PendingFile>,
}

/// レコードストアに渡す挿入データ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReceipt {
    pub merchant: String,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub receipt_image_url: Option<String>,
}

impl NewReceipt {
    /// 下書きとアップロード済みURLから挿入データを組み立てる
    pub fn from_draft(draft: &ReceiptDraft, receipt_image_url: Option<String>) -> Self {
        Self {
            merchant: draft.merchant.clone(),
            amount: draft.amount,
            date: draft.date,
            category: draft.category.clone(),
            receipt_image_url,
        }
    }
}
