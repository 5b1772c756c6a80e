// 領収書添付ファイルのブロブストレージ

use super::models::PendingFile;
use crate::shared::config::R2Config;
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::{Credentials, SharedCredentialsProvider};
use aws_sdk_s3::{Client, Config};
use log::{debug, error, info};
use std::path::{Component, Path, PathBuf};
use url::Url;

/// 添付ファイルを置くバケット内の名前空間
pub const RECEIPTS_PREFIX: &str = "receipts";

/// 添付ファイルの保存先
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// パスにファイルを保存する（同じパスは上書き）
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> AppResult<()>;

    /// 保存済みファイルの公開取得URLを返す
    async fn public_url(&self, path: &str) -> AppResult<String>;

    /// パスのファイルを削除する
    async fn remove(&self, path: &str) -> AppResult<()>;

    /// 公開URLからストレージパスを逆算する（このストアのURLでなければNone）
    fn object_path_from_url(&self, url: &str) -> Option<String>;
}

/// 衝突しにくいオブジェクトパスを生成する
///
/// `receipts/{ミリ秒タイムスタンプ}-{ランダムトークン}.{元の拡張子}`
pub fn generate_object_path(file: &PendingFile) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let token = uuid::Uuid::new_v4().simple().to_string();
    let token = &token[..10];

    match file.extension() {
        Some(ext) => format!("{RECEIPTS_PREFIX}/{timestamp}-{token}.{ext}"),
        None => format!("{RECEIPTS_PREFIX}/{timestamp}-{token}"),
    }
}

/// ベースURL配下のURLからパス部分を取り出す（クエリ・フラグメントは無視）
fn strip_base_url(base: &str, url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let without_query = format!(
        "{}{}",
        &parsed[..url::Position::BeforePath],
        parsed.path()
    );
    let base = base.trim_end_matches('/');
    without_query
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

/// Cloudflare R2（S3互換API）によるブロブストア
#[derive(Clone)]
pub struct R2BlobStore {
    client: Client,
    bucket_name: String,
    config: R2Config,
}

impl R2BlobStore {
    /// R2クライアントを初期化
    pub async fn new(config: R2Config) -> AppResult<Self> {
        info!("R2クライアントを初期化しています...");

        config.validate().map_err(|e| {
            error!("R2設定の検証に失敗しました: {e}");
            AppError::configuration(format!("R2設定の検証に失敗しました: {e}"))
        })?;

        // 認証情報を設定（ログには出力しない）
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        debug!("AWS設定を構築中... エンドポイント: {}", config.endpoint_url);
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url.clone())
            .region(Region::new(config.region.clone()))
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            .load()
            .await;

        let s3_config = Config::from(&aws_config);
        let client = Client::from_conf(s3_config);

        let bucket_name = config.bucket_name.clone();

        info!("R2クライアントの初期化が完了しました。バケット: {bucket_name}");

        Ok(Self {
            client,
            bucket_name,
            config,
        })
    }

    /// クライアントを初期化し、バケットに到達できることを確認する
    ///
    /// # 戻り値
    /// 到達できない場合は `AppError::Configuration`
    pub async fn connect(config: R2Config) -> AppResult<Self> {
        let store = Self::new(config).await?;
        store.test_connection().await.map_err(|e| {
            AppError::configuration(format!(
                "R2バケットに接続できません。設定を確認してください: {}",
                e.details()
            ))
        })?;
        Ok(store)
    }

    /// 接続テスト（バケットの存在確認）
    pub async fn test_connection(&self) -> AppResult<()> {
        info!("R2接続テストを開始します: bucket={}", self.bucket_name);

        let start_time = std::time::Instant::now();

        self.client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "R2接続テスト失敗: bucket={}, error={e}",
                    self.bucket_name
                );
                AppError::storage(format!("R2接続テストに失敗しました: {e}"))
            })?;

        info!(
            "R2接続テスト成功: bucket={}, duration={:?}",
            self.bucket_name,
            start_time.elapsed()
        );
        Ok(())
    }
}

#[async_trait]
impl BlobStore for R2BlobStore {
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> AppResult<()> {
        let file_size = data.len();
        info!("ファイルアップロード開始: key={path}, size={file_size} bytes, content_type={content_type}");

        let start_time = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(path)
            .body(data.into())
            .content_type(content_type)
            .cache_control("max-age=3600")
            .send()
            .await
            .map_err(|e| {
                error!(
                    "ファイルアップロード失敗: key={path}, bucket={}, error={e}",
                    self.bucket_name
                );
                debug!("詳細エラー情報: {e:?}");
                AppError::storage(format!("R2アップロードに失敗しました: {e}"))
            })?;

        info!(
            "ファイルアップロード成功: key={path}, duration={:?}",
            start_time.elapsed()
        );
        Ok(())
    }

    async fn public_url(&self, path: &str) -> AppResult<String> {
        Ok(format!("{}/{path}", self.config.public_base_url()))
    }

    async fn remove(&self, path: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(path)
            .send()
            .await
            .map_err(|e| AppError::storage(format!("R2削除エラー: {e}")))?;

        info!("ファイル削除成功: key={path}");
        Ok(())
    }

    fn object_path_from_url(&self, url: &str) -> Option<String> {
        strip_base_url(&self.config.public_base_url(), url)
    }
}

/// ローカルディレクトリによるブロブストア（開発環境・R2未設定時）
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: Url,
}

impl LocalBlobStore {
    /// ディレクトリを作成してストアを初期化する
    pub fn new(root: impl AsRef<Path>) -> AppResult<Self> {
        let root = root.as_ref();
        if !root.exists() {
            std::fs::create_dir_all(root)?;
            info!("ローカルブロブディレクトリを作成: {root:?}");
        }

        let root = root.canonicalize()?;
        let base_url = Url::from_directory_path(&root).map_err(|_| {
            AppError::configuration(format!("ローカルブロブディレクトリをURLに変換できません: {root:?}"))
        })?;

        Ok(Self { root, base_url })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// ストレージパスをディレクトリ配下のファイルパスに変換する
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path);
        let is_safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if path.is_empty() || !is_safe {
            return Err(AppError::validation(format!("不正なストレージパス: {path}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, path: &str, data: Vec<u8>, _content_type: &str) -> AppResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage(format!("ディレクトリ作成失敗: {e}")))?;
        }

        tokio::fs::write(&target, &data)
            .await
            .map_err(|e| AppError::storage(format!("ファイル書き込み失敗: {e}")))?;

        debug!("ローカル保存成功: path={path}, size={} bytes", data.len());
        Ok(())
    }

    async fn public_url(&self, path: &str) -> AppResult<String> {
        let target = self.resolve(path)?;
        Url::from_file_path(&target)
            .map(String::from)
            .map_err(|_| AppError::storage(format!("URLに変換できません: {target:?}")))
    }

    async fn remove(&self, path: &str) -> AppResult<()> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| AppError::storage(format!("ファイル削除失敗: {e}")))?;

        debug!("ローカル削除成功: path={path}");
        Ok(())
    }

    fn object_path_from_url(&self, url: &str) -> Option<String> {
        strip_base_url(self.base_url.as_str(), url)
    }
}
