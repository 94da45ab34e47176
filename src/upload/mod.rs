//! Uploading decoded documents to the blob store.

mod client;
mod controller;
#[cfg(test)]
pub(crate) mod mock_store;

pub use client::{encode, StorageClient, UploadError, DEFAULT_ENDPOINT};
pub use controller::{UploadController, UploadJob};
