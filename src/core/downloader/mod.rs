mod client;

pub use client::{DownloadEntry, Downloader};
pub(crate) use client::sha1_hex;
