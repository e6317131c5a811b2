//! Builders that turn validated intents into command lines.

pub mod torrent;
pub mod vpn;

pub use torrent::{TorrentAction, TorrentControl};
pub use vpn::{VpnControl, VpnVerb};
