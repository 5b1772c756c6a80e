// 領収書機能モジュール

pub mod detail;
pub mod file_selection;
pub mod form;
pub mod gateway;
pub mod list;
pub mod models;
pub mod notifications;
pub mod page;
pub mod repository;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

// 公開インターフェース

// モデル
pub use models::{media_type_for, NewReceipt, PendingFile, Receipt, ReceiptDraft};

// バックエンド
pub use gateway::{BackendGateway, ReceiptGateway};
pub use repository::{ReceiptStore, SqliteReceiptStore};
pub use storage::{generate_object_path, BlobStore, LocalBlobStore, R2BlobStore};

// 通知
pub use notifications::{Notification, NotificationKind, NotificationQueue, Notifier};

// ビュー状態
pub use detail::{AttachmentView, ReceiptDetail};
pub use file_selection::{FilePreview, FileSelection, ACCEPTED_FILE_TYPES};
pub use form::{Currency, FieldErrors, FormField, FormState, ReceiptForm};
pub use list::{ReceiptList, ReceiptRow};
pub use page::ReceiptsPage;
