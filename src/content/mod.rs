//! Content module - post view models, pagination, reading time and navigation

mod navigation;
mod pagination;
mod post;
mod reading_time;

pub use navigation::{Navigation, NavigationResolver};
pub use pagination::{PaginationState, PostsPage};
pub use post::{
    validate_uid, Banner, ContentSection, NavData, NavPost, PostData, PostDetail, PostPreview,
    PreviewData,
};
pub use reading_time::{count_words, ReadingTime, DEFAULT_WORDS_PER_MINUTE};
