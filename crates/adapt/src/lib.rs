pub mod cache;
pub mod gateway;
pub mod postgrest;
pub mod store;

pub use cache::{CacheError, FileCache, LocalCache, MemoryCache, CACHE_KEY};
pub use gateway::{ConfigStore, LoadSource};
pub use postgrest::PostgrestStore;
pub use store::{ConfigRow, RemoteStore, RowId, StoreError};
