// 領収書機能の設定管理

use super::environment::{get_database_filename, get_environment};
use crate::shared::errors::{AppError, AppResult};
use std::path::PathBuf;

/// 添付ファイルの最大サイズ（MB）のデフォルト値
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 60;

/// 領収書機能の設定
#[derive(Debug, Clone)]
pub struct ReceiptConfig {
    /// 添付ファイルの最大サイズ（バイト）
    pub max_file_size: u64,
    /// 許可カテゴリ（Noneの場合は既定のカテゴリ一覧）
    pub categories: Option<Vec<String>>,
    /// SQLiteデータベースファイルのパス
    pub database_path: PathBuf,
    /// R2未設定時に使うローカルブロブディレクトリ
    pub local_blob_dir: PathBuf,
}

impl ReceiptConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 環境変数
    /// * `RECEIPT_MAX_FILE_SIZE_MB` - 最大ファイルサイズ（MB、既定60）
    /// * `RECEIPT_CATEGORIES` - カンマ区切りのカテゴリ一覧
    /// * `RECEIPT_DATABASE_PATH` - データベースファイルのパス
    /// * `RECEIPT_LOCAL_BLOB_DIR` - ローカルブロブディレクトリ
    pub fn from_env() -> AppResult<Self> {
        let max_file_size =
            parse_max_file_size(std::env::var("RECEIPT_MAX_FILE_SIZE_MB").ok().as_deref())?;

        let categories = std::env::var("RECEIPT_CATEGORIES")
            .ok()
            .map(|raw| parse_category_list(&raw))
            .filter(|list| !list.is_empty());

        let database_path = match std::env::var("RECEIPT_DATABASE_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_data_dir()?.join(get_database_filename(get_environment())),
        };

        let local_blob_dir = match std::env::var("RECEIPT_LOCAL_BLOB_DIR") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_data_dir()?.join("receipt_blobs"),
        };

        log::debug!(
            "領収書設定: max_file_size={max_file_size} bytes, database_path={database_path:?}, local_blob_dir={local_blob_dir:?}"
        );

        Ok(Self {
            max_file_size,
            categories,
            database_path,
            local_blob_dir,
        })
    }

    /// 最大ファイルサイズをMB単位で取得
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size / (1024 * 1024)
    }
}

/// MB単位の最大ファイルサイズ設定をバイト数に変換する
///
/// # 引数
/// * `raw` - `RECEIPT_MAX_FILE_SIZE_MB` の値（未設定ならNone）
///
/// # 戻り値
/// バイト数。数値でない場合やバイト数がu64に収まらない場合は `AppError::Configuration`
pub fn parse_max_file_size(raw: Option<&str>) -> AppResult<u64> {
    let megabytes = match raw {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            AppError::configuration(format!("RECEIPT_MAX_FILE_SIZE_MB が不正です: {raw} ({e})"))
        })?,
        None => DEFAULT_MAX_FILE_SIZE_MB,
    };

    megabytes.checked_mul(1024 * 1024).ok_or_else(|| {
        AppError::configuration(format!(
            "RECEIPT_MAX_FILE_SIZE_MB が大きすぎます: {megabytes}"
        ))
    })
}

/// カンマ区切りのカテゴリ一覧を解析する（空要素は除外）
pub fn parse_category_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// アプリケーションデータディレクトリを取得する
fn default_data_dir() -> AppResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("receipt-tracker"))
        .ok_or_else(|| AppError::configuration("アプリデータディレクトリの取得に失敗しました"))
}
