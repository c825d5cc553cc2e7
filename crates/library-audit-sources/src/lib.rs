pub mod anilist;
pub mod error;
pub mod factory;
pub mod kitsu;
pub mod rate_limit;
pub mod status;
pub mod traits;

pub use anilist::AniListClient;
pub use error::SourceError;
pub use factory::{connect_services, ConnectedServices, ServiceEndpoints};
pub use kitsu::KitsuClient;
pub use rate_limit::RateLimited;
pub use traits::{CatalogSearcher, LibraryFetch, LibraryFetcher, PageProgress};
