//! 播放条目与加载请求

/// 未提供标题时使用的默认标题
pub const DEFAULT_TITLE: &str = "Video Audio";

/// 加载请求错误
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LoadError {
    #[error("Load request carries neither a playlist nor a single item")]
    MissingSource,
    #[error("Playlist arrays differ in length (ids={ids}, locators={locators}, titles={titles})")]
    InconsistentBatch {
        ids: usize,
        locators: usize,
        titles: usize,
    },
}

/// 一个视频的音频播放身份，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableItem {
    id: i64,
    title: String,
    locator: String,
}

impl PlayableItem {
    /// 空白标题会被替换为 [`DEFAULT_TITLE`]
    pub fn new(id: i64, title: impl Into<String>, locator: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        };

        Self {
            id,
            title,
            locator: locator.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

/// 单条目形式
#[derive(Debug, Clone, Default)]
pub struct SingleSource {
    pub id: Option<i64>,
    pub locator: String,
    pub title: Option<String>,
}

/// 批量形式：三个并行数组，下标一一对应
#[derive(Debug, Clone, Default)]
pub struct BatchSource {
    pub ids: Vec<i64>,
    pub locators: Vec<String>,
    pub titles: Vec<String>,
}

impl BatchSource {
    fn is_consistent(&self) -> bool {
        self.ids.len() == self.locators.len() && self.locators.len() == self.titles.len()
    }
}

/// `load` 命令的载荷
///
/// 两种形式可以同时出现；批量形式长度一致时优先。
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    pub single: Option<SingleSource>,
    pub batch: Option<BatchSource>,
}

/// 解析后的加载目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLoad {
    Single(PlayableItem),
    Playlist(Vec<PlayableItem>),
}

impl LoadRequest {
    pub fn single(locator: impl Into<String>, title: Option<String>) -> Self {
        Self {
            single: Some(SingleSource {
                id: None,
                locator: locator.into(),
                title,
            }),
            batch: None,
        }
    }

    pub fn batch(ids: Vec<i64>, locators: Vec<String>, titles: Vec<String>) -> Self {
        Self {
            single: None,
            batch: Some(BatchSource {
                ids,
                locators,
                titles,
            }),
        }
    }

    /// 解析为单条目或播放列表
    pub fn resolve(self) -> Result<ResolvedLoad, LoadError> {
        let mut inconsistent = None;

        if let Some(batch) = self.batch {
            if batch.is_consistent() {
                let items = batch
                    .ids
                    .into_iter()
                    .zip(batch.locators)
                    .zip(batch.titles)
                    .map(|((id, locator), title)| PlayableItem::new(id, title, locator))
                    .collect();
                return Ok(ResolvedLoad::Playlist(items));
            }
            inconsistent = Some(LoadError::InconsistentBatch {
                ids: batch.ids.len(),
                locators: batch.locators.len(),
                titles: batch.titles.len(),
            });
        }

        match self.single {
            Some(single) => Ok(ResolvedLoad::Single(PlayableItem::new(
                single.id.unwrap_or(0),
                single.title.unwrap_or_default(),
                single.locator,
            ))),
            None => Err(inconsistent.unwrap_or(LoadError::MissingSource)),
        }
    }
}
