use serde::{Deserialize, Serialize};

/// 既定のカテゴリ一覧
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "Food",
    "Travel",
    "Transportation",
    "Office Supplies",
    "Utilities",
    "Entertainment",
    "Healthcare",
    "Other",
];

/// 「全カテゴリ」を表すフィルター値
pub const ALL_CATEGORIES: &str = "all";

/// 許可されたカテゴリの有限集合
///
/// フィルターUIとフォームのバリデーションの両方に同じインスタンスを渡す
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: Vec<String>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().map(|c| c.to_string()))
    }
}

impl CategoryRegistry {
    /// カテゴリ一覧からレジストリを作成する（重複・空文字は除外、順序は維持）
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for category in categories {
            let category = category.into();
            let category = category.trim();
            if category.is_empty() || unique.iter().any(|c| c == category) {
                continue;
            }
            unique.push(category.to_string());
        }
        Self { categories: unique }
    }

    /// 設定値からレジストリを作成する（未設定の場合は既定値）
    pub fn from_config(categories: Option<&[String]>) -> Self {
        match categories {
            Some(list) if !list.is_empty() => Self::new(list.iter().cloned()),
            _ => Self::default(),
        }
    }

    /// カテゴリが登録されているか
    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// フィルターUI用の選択肢（先頭は「All Categories」）
    pub fn filter_options(&self) -> Vec<FilterOption> {
        std::iter::once(FilterOption {
            value: ALL_CATEGORIES.to_string(),
            label: "All Categories".to_string(),
        })
        .chain(self.iter().map(|c| FilterOption {
            value: c.to_string(),
            label: c.to_string(),
        }))
        .collect()
    }
}

/// フィルターUIの選択肢
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// 一覧のカテゴリフィルター
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    /// すべてのカテゴリ
    #[default]
    All,
    /// 指定カテゴリのみ
    Only(String),
}

impl CategoryFilter {
    /// UIの選択値から変換する（"all" は全カテゴリ）
    pub fn parse(value: &str) -> Self {
        if value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }

    /// カテゴリがフィルターに一致するか
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(selected) => selected == category,
        }
    }

    /// UIに返す選択値
    pub fn as_value(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(selected) => selected,
        }
    }
}
