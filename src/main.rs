use log::{error, info};
use receipt_tracker_lib::build_receipts_page;
use receipt_tracker_lib::shared::{
    initialize_logging_system, load_environment_variables, AppResult, ReceiptConfig,
};

/// 一覧を読み込み、表示用の行データをJSONで出力する
///
/// 引数にカテゴリを渡すとそのカテゴリだけを出力する（既定は "all"）
async fn run() -> AppResult<()> {
    let config = ReceiptConfig::from_env()?;
    let (mut page, notifications) = build_receipts_page(&config).await?;

    let filter = std::env::args().nth(1).unwrap_or_else(|| "all".to_string());

    // 読み込み失敗は通知キューに残るので、空の一覧として出力を続ける
    if let Err(e) = page.load().await {
        error!("一覧の読み込みに失敗しました: {}", e.details());
    }
    page.set_filter(&filter);

    let output = serde_json::json!({
        "filter": filter,
        "rows": page.rows(),
        "placeholder": page.placeholder(),
        "notifications": notifications.drain(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[tokio::main]
async fn main() {
    load_environment_variables();
    initialize_logging_system();

    info!("receipt-tracker を起動します...");

    if let Err(e) = run().await {
        error!("実行に失敗しました: {}", e.details());
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}
