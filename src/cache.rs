use crate::error::CatalogError;

/// State of one fetch key. Each new fetch replaces the entry wholesale.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CacheEntry<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(CatalogError),
}

impl<T> CacheEntry<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, CacheEntry::Loading)
    }

    /// True once the fetch has either succeeded or failed.
    pub fn is_settled(&self) -> bool {
        matches!(self, CacheEntry::Ready(_) | CacheEntry::Failed(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            CacheEntry::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CatalogError> {
        match self {
            CacheEntry::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn from_result(result: Result<T, CatalogError>) -> Self {
        match result {
            Ok(data) => CacheEntry::Ready(data),
            Err(err) => CacheEntry::Failed(err),
        }
    }
}

impl<T: Clone + Default> CacheEntry<T> {
    /// The ready value, or an empty one for every other state.
    pub fn data_or_default(&self) -> T {
        self.data().cloned().unwrap_or_default()
    }
}
