// 領収書作成フォームのワークフロー

use super::file_selection::FileSelection;
use super::gateway::ReceiptGateway;
use super::models::{PendingFile, Receipt, ReceiptDraft};
use super::notifications::Notifier;
use crate::features::categories::CategoryRegistry;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 入力不足時の通知メッセージ
pub const INCOMPLETE_FORM_MESSAGE: &str = "Please fill in all required fields";

/// フォームの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Empty,
    Editing,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// 入力項目（エラーマップのキー）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Merchant,
    Amount,
    Date,
    Category,
    File,
}

impl FormField {
    pub fn key(&self) -> &'static str {
        match self {
            FormField::Merchant => "merchant",
            FormField::Amount => "amount",
            FormField::Date => "date",
            FormField::Category => "category",
            FormField::File => "file",
        }
    }
}

/// 項目ごとのエラーメッセージ
pub type FieldErrors = BTreeMap<FormField, String>;

/// 通貨セレクタの選択値（表示のみで保存はしない）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Gbp];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

/// 金額入力を解析する（有限かつ正の値のみ）
fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

/// 領収書作成ダイアログの入力状態
pub struct ReceiptForm {
    registry: CategoryRegistry,
    notifier: Arc<dyn Notifier>,
    state: FormState,
    is_open: bool,
    is_submitting: bool,
    merchant: String,
    amount: String,
    date: Option<NaiveDate>,
    category: String,
    currency: Currency,
    file_selection: FileSelection,
    errors: FieldErrors,
}

impl ReceiptForm {
    /// # 引数
    /// * `registry` - カテゴリの検証に使うレジストリ
    /// * `max_file_size` - 添付ファイルの最大サイズ（バイト）
    /// * `notifier` - 入力不足・サイズ超過の通知先
    pub fn new(registry: CategoryRegistry, max_file_size: u64, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            registry,
            notifier,
            state: FormState::Empty,
            is_open: false,
            is_submitting: false,
            merchant: String::new(),
            amount: String::new(),
            date: None,
            category: String::new(),
            currency: Currency::default(),
            file_selection: FileSelection::new(max_file_size),
            errors: FieldErrors::new(),
        }
    }

    /// ダイアログを開き、新しい下書きを始める
    pub fn open(&mut self) {
        self.reset();
        self.is_open = true;
        debug!("作成ダイアログを開きました");
    }

    /// ダイアログを閉じ、下書きを破棄する
    pub fn dismiss(&mut self) {
        if self.is_submitting {
            debug!("送信中のためダイアログを閉じません");
            return;
        }
        self.reset();
        self.is_open = false;
        debug!("作成ダイアログを閉じました");
    }

    pub fn set_merchant(&mut self, merchant: impl Into<String>) {
        self.merchant = merchant.into();
        self.mark_edited();
    }

    /// 金額を入力文字列のまま保持する（解析は検証時）
    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
        self.mark_edited();
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
        self.mark_edited();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
        self.mark_edited();
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
        self.mark_edited();
    }

    /// クリックで選んだファイルを添付する
    ///
    /// # 戻り値
    /// 受け付けた場合はtrue（サイズ超過は警告を通知してfalse）
    pub fn pick_file(&mut self, file: PendingFile) -> bool {
        let result = self.file_selection.pick(file).map(|_| ());
        self.apply_file_result(result)
    }

    /// ドロップされたファイルを添付する
    pub fn drop_files(&mut self, files: Vec<PendingFile>) -> bool {
        let result = self.file_selection.drop_files(files).map(|_| ());
        self.apply_file_result(result)
    }

    pub fn remove_file(&mut self) {
        self.file_selection.remove();
        self.mark_edited();
    }

    pub fn drag_over(&mut self) {
        self.file_selection.drag_over();
    }

    pub fn drag_leave(&mut self) {
        self.file_selection.drag_leave();
    }

    /// 入力内容を検証し、下書きを組み立てる
    ///
    /// すべての項目を個別に検証し、失敗した項目のエラーをまとめて返す
    pub fn validate(&mut self) -> Result<ReceiptDraft, FieldErrors> {
        self.state = FormState::Validating;
        let mut errors = FieldErrors::new();

        let merchant = self.merchant.trim();
        if merchant.is_empty() {
            errors.insert(FormField::Merchant, "Merchant is required".to_string());
        }

        let amount = parse_amount(&self.amount);
        if amount.is_none() {
            errors.insert(FormField::Amount, "Amount must be greater than 0".to_string());
        }

        if self.date.is_none() {
            errors.insert(FormField::Date, "Date is required".to_string());
        }

        if self.category.is_empty() {
            errors.insert(FormField::Category, "Category is required".to_string());
        } else if !self.registry.contains(&self.category) {
            errors.insert(FormField::Category, "Category is not recognized".to_string());
        }

        let file = self.file_selection.selected().cloned();
        if file.is_none() {
            errors.insert(FormField::File, "File is required".to_string());
        }

        // 検証は一時的な状態。結果にかかわらず入力中に戻す
        self.errors = errors.clone();
        self.state = FormState::Editing;
        match (errors.is_empty(), amount, file) {
            (true, Some(amount), Some(file)) => Ok(ReceiptDraft {
                merchant: merchant.to_string(),
                amount,
                date: self.date,
                category: self.category.clone(),
                file: Some(file),
            }),
            _ => Err(errors),
        }
    }

    /// 検証してからゲートウェイで作成する
    ///
    /// # 戻り値
    /// 作成された領収書。検証失敗・送信中・作成失敗の場合はNone（フォーム内容は維持）
    pub async fn submit(&mut self, gateway: &dyn ReceiptGateway) -> Option<Receipt> {
        if self.is_submitting {
            debug!("送信中のため再送信を無視しました");
            return None;
        }

        let draft = match self.validate() {
            Ok(draft) => draft,
            Err(errors) => {
                let fields: Vec<&str> = errors.keys().map(FormField::key).collect();
                warn!("入力内容が不足しています: fields={fields:?}");
                self.notifier.error(INCOMPLETE_FORM_MESSAGE);
                return None;
            }
        };

        self.is_submitting = true;
        self.state = FormState::Submitting;
        debug!("領収書を送信します: merchant={}", draft.merchant);

        let outcome = match gateway.create_receipt(draft).await {
            Ok(receipt) => {
                self.reset();
                self.is_open = false;
                self.state = FormState::Succeeded;
                info!("作成ダイアログの送信が完了しました: id={}", receipt.id);
                Some(receipt)
            }
            Err(e) => {
                // 通知はゲートウェイ側で済んでいる
                self.state = FormState::Failed;
                debug!("送信に失敗しました。入力内容を維持します: {}", e.details());
                self.state = FormState::Editing;
                None
            }
        };

        self.is_submitting = false;
        outcome
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn merchant(&self) -> &str {
        &self.merchant
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn file_selection(&self) -> &FileSelection {
        &self.file_selection
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_for(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    fn apply_file_result(&mut self, result: crate::shared::errors::AppResult<()>) -> bool {
        match result {
            Ok(()) => {
                self.mark_edited();
                true
            }
            Err(e) => {
                self.notifier.warning(e.user_message());
                false
            }
        }
    }

    fn mark_edited(&mut self) {
        if self.state != FormState::Editing {
            debug!("フォーム状態: {:?} -> Editing", self.state);
        }
        self.state = FormState::Editing;
    }

    fn reset(&mut self) {
        self.merchant.clear();
        self.amount.clear();
        self.date = None;
        self.category.clear();
        self.currency = Currency::default();
        self.file_selection.clear();
        self.errors.clear();
        self.state = FormState::Empty;
    }
}
