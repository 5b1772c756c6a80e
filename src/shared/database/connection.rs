use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 複数のコンポーネントで共有するデータベース接続
pub type SharedConnection = Arc<Mutex<Connection>>;

/// データベース接続を初期化し、テーブルを作成する
///
/// # 引数
/// * `database_path` - データベースファイルのパス
///
/// # 処理内容
/// 1. 親ディレクトリの確保
/// 2. データベース接続の開設
/// 3. テーブル作成とマイグレーションの実行
pub fn initialize_database(database_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::configuration(format!("データディレクトリの作成に失敗: {e}"))
            })?;
            log::info!("データディレクトリを作成: {parent:?}");
        }
    }

    let conn = Connection::open(database_path)?;

    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {database_path:?}");

    Ok(conn)
}

/// データベースを初期化して共有接続として返す
pub fn open_shared(database_path: &Path) -> AppResult<SharedConnection> {
    let conn = initialize_database(database_path)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// データベーステーブルを作成する
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    let table_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='receipts'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        create_receipts_table(conn)?;
        log::info!("新規データベースを作成しました（receiptsスキーマ）");
    } else {
        log::info!("既存のデータベースを確認中...");
        migrate_existing_tables(conn)?;
    }

    create_indexes(conn)?;

    Ok(())
}

/// 領収書テーブルを作成する
fn create_receipts_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE receipts (
            id TEXT PRIMARY KEY NOT NULL,
            merchant TEXT NOT NULL,
            amount REAL NOT NULL CHECK(amount >= 0),
            date TEXT,
            category TEXT NOT NULL,
            receipt_image_url TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// 既存テーブルのマイグレーションを実行する
fn migrate_existing_tables(conn: &Connection) -> AppResult<()> {
    if !check_column_exists(conn, "receipts", "receipt_image_url") {
        log::info!("receipt_image_urlカラムを追加します...");
        conn.execute("ALTER TABLE receipts ADD COLUMN receipt_image_url TEXT", [])?;
    }

    // 初期バージョンのテーブルにはcreated_atがない
    if !check_column_exists(conn, "receipts", "created_at") {
        log::info!("created_atカラムを追加します...");
        conn.execute(
            "ALTER TABLE receipts ADD COLUMN created_at TEXT NOT NULL DEFAULT ''",
            [],
        )?;
    }

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_receipts_date ON receipts(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_receipts_category ON receipts(category)",
        [],
    )?;

    Ok(())
}

/// テーブルに指定されたカラムが存在するかチェックする
///
/// # 戻り値
/// カラムが存在する場合はtrue、存在しないかエラーの場合はfalse
fn check_column_exists(conn: &Connection, table_name: &str, column_name: &str) -> bool {
    let query = format!("PRAGMA table_info({table_name})");

    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };

    let Ok(rows) = stmt.query_map([], |row| row.get::<_, String>(1)) else {
        return false;
    };

    for col_name in rows.flatten() {
        if col_name == column_name {
            return true;
        }
    }
    false
}
