use crate::features::receipts::models::{NewReceipt, Receipt};
use crate::shared::database::SharedConnection;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::generate_receipt_id;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::Arc;

const SELECT_COLUMNS: &str =
    "SELECT id, merchant, amount, date, category, receipt_image_url, created_at FROM receipts";

/// 行を領収書に変換する
fn map_receipt(row: &Row<'_>) -> rusqlite::Result<Receipt> {
    Ok(Receipt {
        id: row.get(0)?,
        merchant: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
        category: row.get(4)?,
        receipt_image_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// 領収書を作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `row` - 挿入データ
///
/// # 戻り値
/// IDと作成日時が割り当てられた領収書
pub fn create(conn: &Connection, row: &NewReceipt) -> AppResult<Receipt> {
    let id = generate_receipt_id();
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    conn.execute(
        "INSERT INTO receipts (id, merchant, amount, date, category, receipt_image_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            row.merchant,
            row.amount,
            row.date,
            row.category,
            row.receipt_image_url,
            now
        ],
    )?;

    find_by_id(conn, &id)
}

/// IDで領収書を取得する
pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Receipt> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id],
        map_receipt,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("Receipt"),
        _ => AppError::from(e),
    })
}

/// 領収書一覧を日付の降順で取得する
///
/// 日付なしの領収書は末尾、同じ日付は新しく作成されたものが先
pub fn find_all(conn: &Connection) -> AppResult<Vec<Receipt>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} ORDER BY date IS NULL, date DESC, created_at DESC"
    ))?;

    let receipts = stmt.query_map([], map_receipt)?;

    receipts
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// 領収書を削除する
///
/// # 戻り値
/// 削除された領収書（添付ファイルの後始末に使う）
pub fn delete(conn: &Connection, id: &str) -> AppResult<Receipt> {
    let existing = find_by_id(conn, id)?;

    let affected_rows = conn.execute("DELETE FROM receipts WHERE id = ?1", params![id])?;

    if affected_rows == 0 {
        return Err(AppError::not_found("Receipt"));
    }

    Ok(existing)
}

/// 領収書レコードの保存先
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// 全件を日付の降順で取得
    async fn list(&self) -> AppResult<Vec<Receipt>>;

    /// 1件挿入し、IDが割り当てられたレコードを返す
    async fn insert(&self, row: NewReceipt) -> AppResult<Receipt>;

    /// IDで削除し、削除されたレコードを返す
    async fn delete(&self, id: &str) -> AppResult<Receipt>;
}

/// SQLiteテーブルによるレコードストア
#[derive(Clone)]
pub struct SqliteReceiptStore {
    db: SharedConnection,
}

impl SqliteReceiptStore {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }

    /// ブロッキングスレッドで接続を使う（非同期ランタイムのワーカーを塞がない）
    async fn with_connection<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| AppError::Database(format!("データベースロック取得失敗: {e}")))?;
            f(&conn)
        })
        .await
        .map_err(|e| AppError::Database(format!("データベース処理の実行に失敗: {e}")))?
    }
}

#[async_trait]
impl ReceiptStore for SqliteReceiptStore {
    async fn list(&self) -> AppResult<Vec<Receipt>> {
        self.with_connection(find_all).await
    }

    async fn insert(&self, row: NewReceipt) -> AppResult<Receipt> {
        self.with_connection(move |conn| create(conn, &row)).await
    }

    async fn delete(&self, id: &str) -> AppResult<Receipt> {
        let id = id.to_string();
        self.with_connection(move |conn| delete(conn, &id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::create_tables;
    use crate::shared::utils::is_valid_nanoid;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().expect("テスト用データベースの作成に失敗");
        create_tables(&conn).expect("テーブル作成に失敗");
        conn
    }

    fn new_receipt(merchant: &str, date: Option<(i32, u32, u32)>, category: &str) -> NewReceipt {
        NewReceipt {
            merchant: merchant.to_string(),
            amount: 10.0,
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            category: category.to_string(),
            receipt_image_url: None,
        }
    }

    #[test]
    fn test_create_assigns_id() {
        let conn = create_test_db();

        let mut row = new_receipt("Acme", Some((2024, 3, 1)), "Food");
        row.amount = 19.99;
        row.receipt_image_url = Some("https://cdn.example/receipts/1-a.png".to_string());

        let receipt = create(&conn, &row).unwrap();

        assert!(is_valid_nanoid(&receipt.id));
        assert_eq!(receipt.merchant, "Acme");
        assert_eq!(receipt.amount, 19.99);
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(receipt.category, "Food");
        assert_eq!(
            receipt.receipt_image_url.as_deref(),
            Some("https://cdn.example/receipts/1-a.png")
        );
        assert!(!receipt.created_at.is_empty());
    }

    #[test]
    fn test_find_all_orders_by_date_desc() {
        let conn = create_test_db();

        create(&conn, &new_receipt("Old", Some((2023, 1, 5)), "Food")).unwrap();
        create(&conn, &new_receipt("Undated", None, "Other")).unwrap();
        create(&conn, &new_receipt("New", Some((2024, 6, 1)), "Travel")).unwrap();
        create(&conn, &new_receipt("Mid", Some((2023, 9, 9)), "Food")).unwrap();

        let merchants: Vec<String> = find_all(&conn)
            .unwrap()
            .into_iter()
            .map(|r| r.merchant)
            .collect();

        assert_eq!(merchants, vec!["New", "Mid", "Old", "Undated"]);
    }

    #[test]
    fn test_delete_removes_only_target() {
        let conn = create_test_db();

        let a = create(&conn, &new_receipt("A", Some((2024, 1, 1)), "Food")).unwrap();
        let b = create(&conn, &new_receipt("B", Some((2024, 1, 2)), "Food")).unwrap();

        let deleted = delete(&conn, &a.id).unwrap();
        assert_eq!(deleted.id, a.id);

        let remaining = find_all(&conn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b.id);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let conn = create_test_db();
        let result = delete(&conn, "missing");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sqlite_store_round_trip() {
        let store = SqliteReceiptStore::new(Arc::new(Mutex::new(create_test_db())));

        let created = store
            .insert(new_receipt("Cafe", Some((2024, 2, 2)), "Food"))
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        store.delete(&created.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sqlite_store_concurrent_inserts() {
        let store = SqliteReceiptStore::new(Arc::new(Mutex::new(create_test_db())));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert(new_receipt(&format!("Shop {i}"), Some((2024, 1, i + 1)), "Food"))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 8);
        assert_eq!(listed[0].merchant, "Shop 7");
    }
}
