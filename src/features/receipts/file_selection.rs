// 添付ファイルの選択状態（クリック選択・ドラッグ&ドロップ）

use super::models::PendingFile;
use crate::shared::errors::{AppError, AppResult};
use base64::{engine::general_purpose, Engine as _};
use log::{debug, warn};
use serde::Serialize;

/// ファイル選択ダイアログに渡す受け付け形式
pub const ACCEPTED_FILE_TYPES: &str = "image/*,application/pdf";

/// 選択中ファイルのプレビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilePreview {
    /// 画像（`data:` URL でそのまま表示できる）
    Image { data_url: String },
    /// 画像以外（ファイル名と種類ラベルのみ表示）
    Document { name: String, label: String },
}

impl FilePreview {
    fn for_file(file: &PendingFile) -> Self {
        if file.is_image() {
            let encoded = general_purpose::STANDARD.encode(&file.data);
            FilePreview::Image {
                data_url: format!("data:{};base64,{encoded}", file.media_type),
            }
        } else {
            FilePreview::Document {
                name: file.name.clone(),
                label: document_label(&file.media_type).to_string(),
            }
        }
    }
}

fn document_label(media_type: &str) -> &'static str {
    match media_type {
        "application/pdf" => "PDF Document",
        _ => "Document",
    }
}

/// 1件の添付ファイルを保持する選択コンポーネント
///
/// 選択・削除の結果は戻り値として所有者に返す。サイズ超過は状態を変えずにエラーを返す。
#[derive(Debug, Clone)]
pub struct FileSelection {
    max_file_size: u64,
    selected: Option<PendingFile>,
    preview: Option<FilePreview>,
    is_dragging: bool,
    input_generation: u64,
}

impl FileSelection {
    /// # 引数
    /// * `max_file_size` - 受け付ける最大サイズ（バイト）
    pub fn new(max_file_size: u64) -> Self {
        Self {
            max_file_size,
            selected: None,
            preview: None,
            is_dragging: false,
            input_generation: 0,
        }
    }

    /// クリックで選んだファイルを受け付ける
    ///
    /// # 戻り値
    /// 新しい選択値。サイズ超過時は `AppError::Validation`（選択状態は変更しない）
    pub fn pick(&mut self, file: PendingFile) -> AppResult<Option<&PendingFile>> {
        self.accept(file)
    }

    /// ドロップされたファイルのうち先頭の1件を受け付ける
    pub fn drop_files(&mut self, files: Vec<PendingFile>) -> AppResult<Option<&PendingFile>> {
        self.is_dragging = false;

        match files.into_iter().next() {
            Some(file) => self.accept(file),
            None => Ok(self.selected.as_ref()),
        }
    }

    /// 選択を解除する（同じファイルを再選択できるよう入力をリセット）
    pub fn remove(&mut self) -> Option<&PendingFile> {
        self.clear();
        debug!("添付ファイルの選択を解除しました");
        None
    }

    /// 状態を初期化する
    pub fn clear(&mut self) {
        self.selected = None;
        self.preview = None;
        self.is_dragging = false;
        self.input_generation += 1;
    }

    pub fn drag_over(&mut self) {
        self.is_dragging = true;
    }

    pub fn drag_leave(&mut self) {
        self.is_dragging = false;
    }

    pub fn selected(&self) -> Option<&PendingFile> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&FilePreview> {
        self.preview.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// 入力要素のリセット用カウンタ（削除のたびに増える）
    pub fn input_generation(&self) -> u64 {
        self.input_generation
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// サイズ超過時の警告メッセージ
    pub fn size_limit_message(&self) -> String {
        format!(
            "File size must be less than {}MB",
            self.max_file_size / (1024 * 1024)
        )
    }

    fn accept(&mut self, file: PendingFile) -> AppResult<Option<&PendingFile>> {
        if file.size() > self.max_file_size {
            warn!(
                "ファイルサイズが上限を超えています: name={}, size={} bytes, max={} bytes",
                file.name,
                file.size(),
                self.max_file_size
            );
            return Err(AppError::validation(self.size_limit_message()));
        }

        debug!("添付ファイルを選択しました: {file:?}");
        self.preview = Some(FilePreview::for_file(&file));
        self.selected = Some(file);
        Ok(self.selected.as_ref())
    }
}
