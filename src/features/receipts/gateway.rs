// 領収書の永続化ゲートウェイ
//
// レコードストアとブロブストアをまとめ、失敗時のユーザー通知・ログ出力・
// アップロード済みファイルの後始末を一箇所で行う。

use super::models::{NewReceipt, Receipt, ReceiptDraft};
use super::notifications::Notifier;
use super::repository::ReceiptStore;
use super::storage::{generate_object_path, BlobStore};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use log::{info, log, warn};
use std::sync::Arc;

/// ユーザー向け通知メッセージ
pub mod messages {
    pub const LOAD_FAILED: &str = "Failed to load receipts";
    pub const UPLOAD_FAILED: &str = "Failed to upload receipt image";
    pub const CREATE_FAILED: &str = "Failed to create receipt";
    pub const CREATED: &str = "Receipt created successfully";
    pub const DELETE_FAILED: &str = "Failed to delete receipt";
    pub const DELETED: &str = "Receipt deleted successfully";
}

/// ビュー状態が依存する永続化操作
///
/// 失敗はすべて実装側で通知・ログ出力済み。呼び出し側は結果を状態更新にだけ使う。
#[async_trait]
pub trait ReceiptGateway: Send + Sync {
    /// 全件を日付の降順で取得
    async fn list_receipts(&self) -> AppResult<Vec<Receipt>>;

    /// 添付ファイルをアップロードしてからレコードを挿入する
    async fn create_receipt(&self, draft: ReceiptDraft) -> AppResult<Receipt>;

    /// IDでレコードを削除する
    async fn delete_receipt(&self, id: &str) -> AppResult<()>;
}

/// レコードストア・ブロブストア・通知先を束ねたゲートウェイ
#[derive(Clone)]
pub struct BackendGateway {
    store: Arc<dyn ReceiptStore>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
}

impl BackendGateway {
    pub fn new(
        store: Arc<dyn ReceiptStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            blobs,
            notifier,
        }
    }

    /// アップロード済みファイルを削除する（失敗はログのみ）
    async fn remove_blob_best_effort(&self, path: &str) {
        match self.blobs.remove(path).await {
            Ok(()) => info!("添付ファイルを削除しました: path={path}"),
            Err(e) => warn!("添付ファイルの削除に失敗しました（無視します）: path={path}, error={e}"),
        }
    }
}

#[async_trait]
impl ReceiptGateway for BackendGateway {
    async fn list_receipts(&self) -> AppResult<Vec<Receipt>> {
        match self.store.list().await {
            Ok(receipts) => {
                info!("領収書一覧を取得しました: count={}", receipts.len());
                Ok(receipts)
            }
            Err(e) => {
                log!(
                    e.severity().log_level(),
                    "領収書一覧の取得に失敗しました: {}",
                    e.details()
                );
                self.notifier.error(messages::LOAD_FAILED);
                Err(e)
            }
        }
    }

    async fn create_receipt(&self, mut draft: ReceiptDraft) -> AppResult<Receipt> {
        let file = draft.file.take();
        let mut row = NewReceipt::from_draft(&draft, None);
        let mut uploaded_path = None;

        // 1. 添付ファイルをアップロードして公開URLを取得
        if let Some(file) = file {
            let path = generate_object_path(&file);
            let content_type = file.media_type.clone();

            if let Err(e) = self.blobs.upload(&path, file.data, &content_type).await {
                log!(
                    e.severity().log_level(),
                    "添付ファイルのアップロードに失敗しました: path={path}, error={}",
                    e.details()
                );
                self.notifier.error(messages::UPLOAD_FAILED);
                return Err(e);
            }

            match self.blobs.public_url(&path).await {
                Ok(url) => row.receipt_image_url = Some(url),
                Err(e) => {
                    log!(
                        e.severity().log_level(),
                        "公開URLの取得に失敗しました: path={path}, error={}",
                        e.details()
                    );
                    self.notifier.error(messages::UPLOAD_FAILED);
                    self.remove_blob_best_effort(&path).await;
                    return Err(e);
                }
            }

            uploaded_path = Some(path);
        }

        // 2. レコードを挿入（失敗時はアップロード済みファイルを削除）
        match self.store.insert(row).await {
            Ok(receipt) => {
                info!(
                    "領収書を作成しました: id={}, has_attachment={}",
                    receipt.id,
                    receipt.receipt_image_url.is_some()
                );
                self.notifier.success(messages::CREATED);
                Ok(receipt)
            }
            Err(e) => {
                log!(
                    e.severity().log_level(),
                    "領収書レコードの作成に失敗しました: {}",
                    e.details()
                );
                self.notifier.error(messages::CREATE_FAILED);
                if let Some(path) = uploaded_path {
                    self.remove_blob_best_effort(&path).await;
                }
                Err(e)
            }
        }
    }

    async fn delete_receipt(&self, id: &str) -> AppResult<()> {
        let removed = match self.store.delete(id).await {
            Ok(removed) => removed,
            Err(e) => {
                log!(
                    e.severity().log_level(),
                    "領収書の削除に失敗しました: id={id}, error={}",
                    e.details()
                );
                self.notifier.error(messages::DELETE_FAILED);
                return Err(e);
            }
        };

        // レコード削除が確定してから添付ファイルを後始末する
        if let Some(url) = removed.receipt_image_url.as_deref() {
            match self.blobs.object_path_from_url(url) {
                Some(path) => self.remove_blob_best_effort(&path).await,
                None => warn!("このストアのURLではないため添付ファイルの削除をスキップします: url={url}"),
            }
        }

        info!("領収書を削除しました: id={id}");
        self.notifier.success(messages::DELETED);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::receipts::models::PendingFile;
    use crate::features::receipts::notifications::{NotificationKind, NotificationQueue};
    use crate::features::receipts::test_support::FakeBackend;
    use chrono::NaiveDate;

    fn draft_with_file(file: Option<PendingFile>) -> ReceiptDraft {
        ReceiptDraft {
            merchant: "Acme".to_string(),
            amount: 19.99,
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            category: "Food".to_string(),
            file,
        }
    }

    fn messages_of(queue: &NotificationQueue) -> Vec<(NotificationKind, String)> {
        queue
            .drain()
            .into_iter()
            .map(|n| (n.kind, n.message))
            .collect()
    }

    #[tokio::test]
    async fn test_create_uploads_then_inserts() {
        let backend = FakeBackend::new();
        let queue = NotificationQueue::new();
        let gateway = backend.gateway(queue.clone());

        let file = PendingFile::from_name("image.png", vec![9; 16]);
        let receipt = gateway
            .create_receipt(draft_with_file(Some(file)))
            .await
            .unwrap();

        let uploads = backend.blobs.uploads();
        assert_eq!(uploads.len(), 1);
        let (path, content_type) = &uploads[0];
        assert!(path.starts_with("receipts/") && path.ends_with(".png"));
        assert_eq!(content_type, "image/png");

        let inserted = backend.store.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].merchant, "Acme");
        assert_eq!(inserted[0].amount, 19.99);
        assert_eq!(inserted[0].category, "Food");
        assert_eq!(
            inserted[0].receipt_image_url.as_deref(),
            Some(format!("https://cdn.test/{path}").as_str())
        );

        assert_eq!(backend.events(), vec!["upload", "insert"]);
        assert!(!receipt.id.is_empty());
        assert_eq!(
            messages_of(&queue),
            vec![(NotificationKind::Success, messages::CREATED.to_string())]
        );
    }

    #[tokio::test]
    async fn test_create_without_file_skips_upload() {
        let backend = FakeBackend::new();
        let gateway = backend.gateway(NotificationQueue::new());

        let receipt = gateway.create_receipt(draft_with_file(None)).await.unwrap();

        assert!(receipt.receipt_image_url.is_none());
        assert_eq!(backend.events(), vec!["insert"]);
    }

    #[tokio::test]
    async fn test_upload_failure_aborts_before_insert() {
        let backend = FakeBackend::new();
        backend.blobs.fail_uploads();
        let queue = NotificationQueue::new();
        let gateway = backend.gateway(queue.clone());

        let file = PendingFile::from_name("image.png", vec![1]);
        let result = gateway.create_receipt(draft_with_file(Some(file))).await;

        assert!(result.is_err());
        assert!(backend.store.inserted().is_empty());
        assert!(backend.blobs.removed().is_empty());
        assert_eq!(
            messages_of(&queue),
            vec![(NotificationKind::Error, messages::UPLOAD_FAILED.to_string())]
        );
    }

    #[tokio::test]
    async fn test_insert_failure_removes_uploaded_blob() {
        let backend = FakeBackend::new();
        backend.store.fail_inserts();
        let queue = NotificationQueue::new();
        let gateway = backend.gateway(queue.clone());

        let file = PendingFile::from_name("scan.pdf", vec![1, 2]);
        let result = gateway.create_receipt(draft_with_file(Some(file))).await;

        assert!(result.is_err());
        let uploaded: Vec<String> = backend.blobs.uploads().into_iter().map(|(p, _)| p).collect();
        assert_eq!(backend.blobs.removed(), uploaded);
        assert_eq!(backend.events(), vec!["upload", "insert", "remove"]);
        assert_eq!(
            messages_of(&queue),
            vec![(NotificationKind::Error, messages::CREATE_FAILED.to_string())]
        );
    }

    #[tokio::test]
    async fn test_rollback_failure_is_not_surfaced() {
        let backend = FakeBackend::new();
        backend.store.fail_inserts();
        backend.blobs.fail_removes();
        let queue = NotificationQueue::new();
        let gateway = backend.gateway(queue.clone());

        let file = PendingFile::from_name("scan.pdf", vec![1, 2]);
        let result = gateway.create_receipt(draft_with_file(Some(file))).await;

        assert!(result.is_err());
        // 削除失敗による追加の通知は出ない
        assert_eq!(queue.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_blob() {
        let backend = FakeBackend::new();
        let queue = NotificationQueue::new();
        let gateway = backend.gateway(queue.clone());

        let file = PendingFile::from_name("image.png", vec![1]);
        let receipt = gateway
            .create_receipt(draft_with_file(Some(file)))
            .await
            .unwrap();
        queue.drain();

        gateway.delete_receipt(&receipt.id).await.unwrap();

        assert!(backend.store.rows().is_empty());
        let uploaded: Vec<String> = backend.blobs.uploads().into_iter().map(|(p, _)| p).collect();
        assert_eq!(backend.blobs.removed(), uploaded);
        assert_eq!(
            messages_of(&queue),
            vec![(NotificationKind::Success, messages::DELETED.to_string())]
        );
    }

    #[tokio::test]
    async fn test_delete_skips_foreign_url() {
        let backend = FakeBackend::new();
        let gateway = backend.gateway(NotificationQueue::new());

        let receipt = backend.store.seed(
            "Legacy",
            None,
            "Other",
            Some("https://elsewhere.example/receipts/old.png"),
        );

        gateway.delete_receipt(&receipt.id).await.unwrap();

        assert!(backend.store.rows().is_empty());
        assert!(backend.blobs.removed().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_notifies() {
        let backend = FakeBackend::new();
        backend.store.fail_deletes();
        let queue = NotificationQueue::new();
        let gateway = backend.gateway(queue.clone());

        let receipt = backend.store.seed("Acme", None, "Food", None);
        let result = gateway.delete_receipt(&receipt.id).await;

        assert!(result.is_err());
        assert_eq!(backend.store.rows().len(), 1);
        assert_eq!(
            messages_of(&queue),
            vec![(NotificationKind::Error, messages::DELETE_FAILED.to_string())]
        );
    }

    #[tokio::test]
    async fn test_list_failure_notifies() {
        let backend = FakeBackend::new();
        backend.store.fail_lists();
        let queue = NotificationQueue::new();
        let gateway = backend.gateway(queue.clone());

        assert!(gateway.list_receipts().await.is_err());
        assert_eq!(
            messages_of(&queue),
            vec![(NotificationKind::Error, messages::LOAD_FAILED.to_string())]
        );
    }
}
