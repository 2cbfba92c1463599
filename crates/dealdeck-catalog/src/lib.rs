pub mod cancel;
pub mod consent;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod geo;
pub mod normalize;
pub mod rest;
pub mod snapshot;
pub mod source;
pub mod storage;

pub use cancel::CancellationToken;
pub use consent::{ConsentFlags, ConsentStore, CONSENT_KEY};
pub use error::{CatalogError, StorageError};
pub use favorites::{FavoritesStore, FAVORITES_KEY};
pub use feed::{FeedState, OfferFeed};
pub use geo::{GeoContext, GeoProbe, HttpGeoProbe};
pub use normalize::{normalize_row, normalize_rows};
pub use rest::RestOfferSource;
pub use snapshot::{PreloadSnapshot, Snapshot};
pub use source::{ConfiguredSource, OfferSource, PgOfferSource, StaticOfferSource};
pub use storage::{ClientStorage, FileStorage, MemoryStorage};
