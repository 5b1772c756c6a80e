// テスト用のインメモリバックエンド

use super::gateway::BackendGateway;
use super::models::{NewReceipt, Receipt};
use super::notifications::NotificationQueue;
use super::repository::ReceiptStore;
use super::storage::BlobStore;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::generate_receipt_id;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const FAKE_BASE_URL: &str = "https://cdn.test";

type EventLog = Arc<Mutex<Vec<&'static str>>>;

/// 呼び出しを記録するレコードストア
#[derive(Default)]
pub struct FakeReceiptStore {
    rows: Mutex<Vec<Receipt>>,
    inserted: Mutex<Vec<NewReceipt>>,
    events: EventLog,
    sequence: AtomicUsize,
    fail_list: AtomicBool,
    fail_insert: AtomicBool,
    fail_delete: AtomicBool,
}

impl FakeReceiptStore {
    pub fn fail_lists(&self) {
        self.fail_list.store(true, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<Receipt> {
        self.rows.lock().unwrap().clone()
    }

    pub fn inserted(&self) -> Vec<NewReceipt> {
        self.inserted.lock().unwrap().clone()
    }

    /// 呼び出し記録を残さずに1件追加する
    pub fn seed(
        &self,
        merchant: &str,
        date: Option<NaiveDate>,
        category: &str,
        url: Option<&str>,
    ) -> Receipt {
        let receipt = self.build(NewReceipt {
            merchant: merchant.to_string(),
            amount: 10.0,
            date,
            category: category.to_string(),
            receipt_image_url: url.map(str::to_string),
        });
        self.rows.lock().unwrap().push(receipt.clone());
        receipt
    }

    fn build(&self, row: NewReceipt) -> Receipt {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        Receipt {
            id: generate_receipt_id(),
            merchant: row.merchant,
            amount: row.amount,
            date: row.date,
            category: row.category,
            receipt_image_url: row.receipt_image_url,
            created_at: format!("2024-01-01T00:00:{seq:02}.000000Z"),
        }
    }
}

#[async_trait]
impl ReceiptStore for FakeReceiptStore {
    async fn list(&self) -> AppResult<Vec<Receipt>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(AppError::Database("list failed".to_string()));
        }
        let mut rows = self.rows();
        rows.sort_by(|a, b| {
            b.date
                .is_some()
                .cmp(&a.date.is_some())
                .then(b.date.cmp(&a.date))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    async fn insert(&self, row: NewReceipt) -> AppResult<Receipt> {
        self.events.lock().unwrap().push("insert");
        self.inserted.lock().unwrap().push(row.clone());
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(AppError::Database("insert failed".to_string()));
        }
        let receipt = self.build(row);
        self.rows.lock().unwrap().push(receipt.clone());
        Ok(receipt)
    }

    async fn delete(&self, id: &str) -> AppResult<Receipt> {
        self.events.lock().unwrap().push("delete");
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::Database("delete failed".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let index = rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("Receipt"))?;
        Ok(rows.remove(index))
    }
}

/// 呼び出しを記録するブロブストア
#[derive(Default)]
pub struct FakeBlobStore {
    uploads: Mutex<Vec<(String, String)>>,
    removed: Mutex<Vec<String>>,
    events: EventLog,
    fail_upload: AtomicBool,
    fail_remove: AtomicBool,
}

impl FakeBlobStore {
    pub fn fail_uploads(&self) {
        self.fail_upload.store(true, Ordering::SeqCst);
    }

    pub fn fail_removes(&self) {
        self.fail_remove.store(true, Ordering::SeqCst);
    }

    /// (パス, Content-Type) の一覧
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn upload(&self, path: &str, _data: Vec<u8>, content_type: &str) -> AppResult<()> {
        self.events.lock().unwrap().push("upload");
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(AppError::storage("upload failed"));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), content_type.to_string()));
        Ok(())
    }

    async fn public_url(&self, path: &str) -> AppResult<String> {
        Ok(format!("{FAKE_BASE_URL}/{path}"))
    }

    async fn remove(&self, path: &str) -> AppResult<()> {
        self.events.lock().unwrap().push("remove");
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(AppError::storage("remove failed"));
        }
        self.removed.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn object_path_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(FAKE_BASE_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string)
    }
}

/// 呼び出し順を共有する偽バックエンド一式
pub struct FakeBackend {
    pub store: Arc<FakeReceiptStore>,
    pub blobs: Arc<FakeBlobStore>,
    events: EventLog,
}

impl FakeBackend {
    pub fn new() -> Self {
        let events: EventLog = Arc::default();
        let store = FakeReceiptStore {
            events: Arc::clone(&events),
            ..Default::default()
        };
        let blobs = FakeBlobStore {
            events: Arc::clone(&events),
            ..Default::default()
        };
        Self {
            store: Arc::new(store),
            blobs: Arc::new(blobs),
            events,
        }
    }

    pub fn gateway(&self, queue: NotificationQueue) -> BackendGateway {
        BackendGateway::new(self.store.clone(), self.blobs.clone(), Arc::new(queue))
    }

    /// upload / insert / remove / delete の呼び出し順
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}
