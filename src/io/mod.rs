//! Object store access.

mod store;

pub use store::{create_store_resolver, parse_key, BucketStore, LocalStores, S3Stores, StoreResolver};
