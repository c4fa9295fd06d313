//! Application entities and their repositories

mod access_token;
mod storage_file;

pub use access_token::{AccessToken, AccessTokenRepository, NewAccessToken};
pub use storage_file::{NewStorageFile, StorageFile, StorageFileRepository};
