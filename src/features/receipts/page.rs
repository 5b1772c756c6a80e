// 領収書ページのコントローラー
//
// 一覧・作成フォーム・詳細ダイアログの状態とゲートウェイを束ね、
// UIシェルから呼ばれる操作を提供する。

use super::detail::ReceiptDetail;
use super::form::ReceiptForm;
use super::gateway::ReceiptGateway;
use super::list::{ReceiptList, ReceiptRow};
use super::models::Receipt;
use super::notifications::Notifier;
use crate::features::categories::{CategoryFilter, CategoryRegistry, FilterOption};
use crate::shared::errors::AppResult;
use log::{debug, info};
use std::sync::Arc;

pub struct ReceiptsPage {
    gateway: Arc<dyn ReceiptGateway>,
    registry: CategoryRegistry,
    list: ReceiptList,
    form: ReceiptForm,
    selected: Option<Receipt>,
}

impl ReceiptsPage {
    /// # 引数
    /// * `gateway` - 永続化ゲートウェイ
    /// * `registry` - フィルターとフォームで共有するカテゴリ
    /// * `max_file_size` - 添付ファイルの最大サイズ（バイト）
    /// * `notifier` - フォームが使う通知先
    pub fn new(
        gateway: Arc<dyn ReceiptGateway>,
        registry: CategoryRegistry,
        max_file_size: u64,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let form = ReceiptForm::new(registry.clone(), max_file_size, notifier);
        Self {
            gateway,
            registry,
            list: ReceiptList::default(),
            form,
            selected: None,
        }
    }

    /// 全件を読み込んで一覧を初期化する
    ///
    /// 失敗時は一覧を変更しない（通知はゲートウェイ側）
    pub async fn load(&mut self) -> AppResult<()> {
        let receipts = self.gateway.list_receipts().await?;
        info!("領収書ページを読み込みました: count={}", receipts.len());
        self.list.replace(receipts);
        Ok(())
    }

    pub fn open_add_dialog(&mut self) {
        self.form.open();
    }

    pub fn close_add_dialog(&mut self) {
        self.form.dismiss();
    }

    /// 作成フォームを送信し、成功したら一覧に追加する
    pub async fn submit_form(&mut self) -> Option<Receipt> {
        let created = self.form.submit(self.gateway.as_ref()).await?;
        self.list.insert(created.clone());
        Some(created)
    }

    /// 詳細ダイアログを開く
    pub fn view_receipt(&mut self, id: &str) -> Option<ReceiptDetail> {
        self.selected = self.list.get(id).cloned();
        if self.selected.is_none() {
            debug!("一覧にない領収書は表示できません: id={id}");
        }
        self.detail()
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    /// 選択中の領収書の詳細（未選択ならNone）
    pub fn detail(&self) -> Option<ReceiptDetail> {
        ReceiptDetail::from_receipt(self.selected.as_ref())
    }

    /// 削除が確定した場合のみ一覧から取り除く
    ///
    /// # 戻り値
    /// 削除できた場合はtrue
    pub async fn delete_receipt(&mut self, id: &str) -> bool {
        if self.gateway.delete_receipt(id).await.is_err() {
            return false;
        }

        self.list.remove(id);
        if self.selected.as_ref().is_some_and(|r| r.id == id) {
            self.selected = None;
        }
        true
    }

    /// UIの選択値でカテゴリフィルターを設定する（"all" は全件）
    pub fn set_filter(&mut self, value: &str) {
        self.list.set_filter(CategoryFilter::parse(value));
    }

    pub fn filter_options(&self) -> Vec<FilterOption> {
        self.registry.filter_options()
    }

    pub fn rows(&self) -> Vec<ReceiptRow> {
        self.list.rows()
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.list.placeholder()
    }

    pub fn list(&self) -> &ReceiptList {
        &self.list
    }

    pub fn form(&self) -> &ReceiptForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ReceiptForm {
        &mut self.form
    }
}
