/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        let environment = get_environment();
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if environment == Environment::Development {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            log_level,
        }
    }

    /// ログレベル文字列をフィルターに変換する（不明な値はInfo）
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.log_level.to_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. コンパイル時埋め込み環境変数を最優先
/// 2. 実行時環境変数 ENVIRONMENT を確認
/// 3. デバッグビルドの場合は Development
/// 4. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Some(embedded_env) = option_env!("EMBEDDED_ENVIRONMENT") {
        let env = match embedded_env {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: コンパイル時埋め込み値を使用 -> {embedded_env} -> {env:?}");
        return env;
    }

    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # ファイル名の規則
/// - 開発環境: "dev_receipts.db"
/// - プロダクション環境: "receipts.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_receipts.db",
        Environment::Production => "receipts.db",
    }
}

/// 環境に応じた.envファイルを読み込む
pub fn load_environment_variables() {
    if let Some(env) = option_env!("EMBEDDED_ENVIRONMENT") {
        log::info!("コンパイル時埋め込み環境設定を使用: {env}");
        return;
    }

    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            // 環境固有のファイルがない場合は、デフォルトの.envを試行
            if env_file != ".env" && dotenv::dotenv().is_ok() {
                log::warn!("{env_file}が見つからないため、デフォルトの.envファイルを読み込みました");
            } else {
                log::warn!("環境変数ファイルが見つかりません。コンパイル時埋め込み値または直接設定された環境変数を使用します。");
            }
        }
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化（二重初期化は無視）
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let initialized = env_logger::Builder::from_default_env()
        .filter_level(env_config.level_filter())
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if initialized.is_ok() {
        log::info!(
            "ログシステムを初期化しました: level={}, environment={}",
            env_config.log_level,
            env_config.environment
        );
    }
}

/// R2（Cloudflare R2）の設定を管理する構造体
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2のアクセスキーID
    pub access_key_id: String,
    /// R2のシークレットアクセスキー
    pub secret_access_key: String,
    /// R2のバケット名
    pub bucket_name: String,
    /// R2のエンドポイントURL
    pub endpoint_url: String,
    /// R2のリージョン
    pub region: String,
    /// 公開バケットのベースURL（r2.dev またはカスタムドメイン）
    pub public_url: Option<String>,
}

/// コンパイル時埋め込み値を優先し、見つからない場合は実行時環境変数を使用
fn embedded_or_env(embedded: Option<&'static str>, key: &str) -> Option<String> {
    embedded
        .map(|s| {
            log::debug!("コンパイル時埋め込み{key} を使用");
            s.to_string()
        })
        .or_else(|| {
            std::env::var(key).ok().map(|val| {
                log::debug!("実行時{key} が見つかりました");
                val
            })
        })
        .filter(|val| !val.is_empty())
}

impl R2Config {
    /// 環境変数からR2設定を読み込む
    ///
    /// # 戻り値
    /// R2設定、または設定が不完全な場合はNone
    pub fn from_env() -> Option<Self> {
        log::debug!("R2Config::from_env() - 環境変数の読み込みを開始");

        let Some(access_key_id) =
            embedded_or_env(option_env!("EMBEDDED_R2_ACCESS_KEY_ID"), "R2_ACCESS_KEY_ID")
        else {
            log::warn!("R2_ACCESS_KEY_ID が見つかりません（コンパイル時埋め込み値・実行時環境変数ともに）");
            return None;
        };

        let Some(secret_access_key) = embedded_or_env(
            option_env!("EMBEDDED_R2_SECRET_ACCESS_KEY"),
            "R2_SECRET_ACCESS_KEY",
        ) else {
            log::warn!("R2_SECRET_ACCESS_KEY が見つかりません（コンパイル時埋め込み値・実行時環境変数ともに）");
            return None;
        };

        let Some(bucket_name) =
            embedded_or_env(option_env!("EMBEDDED_R2_BUCKET_NAME"), "R2_BUCKET_NAME")
        else {
            log::warn!("R2_BUCKET_NAME が見つかりません（コンパイル時埋め込み値・実行時環境変数ともに）");
            return None;
        };

        let region = embedded_or_env(option_env!("EMBEDDED_R2_REGION"), "R2_REGION")
            .unwrap_or_else(|| {
                log::debug!("R2_REGION が設定されていないため、デフォルト値 'auto' を使用");
                "auto".to_string()
            });

        // エンドポイントURLが設定されていない場合は、アカウントIDから自動構築
        let endpoint_url = embedded_or_env(option_env!("EMBEDDED_R2_ENDPOINT_URL"), "R2_ENDPOINT_URL")
            .or_else(|| {
                embedded_or_env(option_env!("EMBEDDED_R2_ACCOUNT_ID"), "R2_ACCOUNT_ID")
                    .map(|account_id| format!("https://{account_id}.r2.cloudflarestorage.com"))
            });

        let Some(endpoint_url) = endpoint_url else {
            log::warn!("R2_ENDPOINT_URL・R2_ACCOUNT_ID のどちらも設定されていません");
            return None;
        };

        let public_url = embedded_or_env(option_env!("EMBEDDED_R2_PUBLIC_URL"), "R2_PUBLIC_URL");

        log::debug!("R2Config::from_env() - 設定の読み込みが完了しました");
        Some(Self {
            access_key_id,
            secret_access_key,
            bucket_name,
            endpoint_url,
            region,
            public_url,
        })
    }

    /// R2設定が有効かどうかを判定
    pub fn is_valid(&self) -> bool {
        !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
            && !self.bucket_name.is_empty()
            && !self.endpoint_url.is_empty()
    }

    /// 設定を検証する
    pub fn validate(&self) -> Result<(), String> {
        if !self.is_valid() {
            return Err("R2設定が不完全です".to_string());
        }
        if let Some(public_url) = &self.public_url {
            url::Url::parse(public_url).map_err(|e| format!("R2_PUBLIC_URL が不正です: {e}"))?;
        }
        Ok(())
    }

    /// 公開URLのベース（末尾スラッシュなし）
    ///
    /// 公開URLが未設定の場合はエンドポイント直下のバケットパスを使う
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "{}/{}",
                self.endpoint_url.trim_end_matches('/'),
                self.bucket_name
            ),
        }
    }

    /// デバッグ情報を取得（認証情報はマスク）
    pub fn get_debug_info(&self) -> std::collections::HashMap<String, String> {
        let mut info = std::collections::HashMap::new();
        info.insert(
            "access_key_id".to_string(),
            format!(
                "{}****",
                self.access_key_id.chars().take(4).collect::<String>()
            ),
        );
        info.insert("bucket_name".to_string(), self.bucket_name.clone());
        info.insert("endpoint_url".to_string(), self.endpoint_url.clone());
        info.insert("region".to_string(), self.region.clone());
        info.insert("public_base_url".to_string(), self.public_base_url());
        info
    }
}
