mod cache;
mod download;
mod likes;

pub use cache::CacheStore;
pub use download::DownloadCoordinator;
pub use download::Precacher;
pub use likes::LikesStore;
