/// 実行環境・ログ・R2接続の設定
pub mod environment;

/// 領収書機能の設定
pub mod receipt;

pub use environment::{
    get_database_filename, get_environment, initialize_logging_system,
    load_environment_variables, Environment, EnvironmentConfig, R2Config,
};
pub use receipt::ReceiptConfig;
