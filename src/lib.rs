pub mod features;
pub mod shared;

use features::categories::CategoryRegistry;
use features::receipts::{
    BackendGateway, BlobStore, LocalBlobStore, NotificationQueue, R2BlobStore, ReceiptsPage,
    SqliteReceiptStore,
};
use log::{info, warn};
use shared::{open_shared, AppResult, R2Config, ReceiptConfig};
use std::sync::Arc;

/// ブロブストアを選択する（R2設定が揃っていればR2、なければローカルディレクトリ）
pub async fn build_blob_store(config: &ReceiptConfig) -> AppResult<Arc<dyn BlobStore>> {
    match R2Config::from_env() {
        Some(r2_config) => {
            info!("R2ブロブストアを使用します: {:?}", r2_config.get_debug_info());
            let store = R2BlobStore::connect(r2_config).await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!(
                "R2設定が見つからないため、ローカルブロブディレクトリを使用します: {:?}",
                config.local_blob_dir
            );
            let store = LocalBlobStore::new(&config.local_blob_dir)?;
            Ok(Arc::new(store))
        }
    }
}

/// 設定から領収書ページを組み立てる
///
/// # 戻り値
/// ページと、UIシェルが通知を取り出すためのキュー
pub async fn build_receipts_page(
    config: &ReceiptConfig,
) -> AppResult<(ReceiptsPage, NotificationQueue)> {
    info!("領収書ページを初期化しています...");

    let db = open_shared(&config.database_path)?;
    let store = Arc::new(SqliteReceiptStore::new(db));
    let blobs = build_blob_store(config).await?;
    let notifications = NotificationQueue::new();

    let gateway = BackendGateway::new(store, blobs, Arc::new(notifications.clone()));
    let registry = CategoryRegistry::from_config(config.categories.as_deref());
    info!("カテゴリ数: {}", registry.len());

    let page = ReceiptsPage::new(
        Arc::new(gateway),
        registry,
        config.max_file_size,
        Arc::new(notifications.clone()),
    );

    info!("領収書ページの初期化が完了しました");
    Ok((page, notifications))
}
