//! Bundled audio assets
//!
//! Embeds the read-only audio shipped with the application using rust_embed.

use rust_embed::RustEmbed;
use std::borrow::Cow;

#[derive(RustEmbed)]
#[folder = "assets"]
pub struct Assets;

/// Look up a bundled asset by its logical name
pub fn bundled(name: &str) -> Option<Cow<'static, [u8]>> {
    if name.is_empty() {
        return None;
    }
    Assets::get(name).map(|f| f.data)
}

/// Names of every bundled asset
pub fn list() -> Vec<String> {
    Assets::iter().map(|p| p.into_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piano_is_bundled() {
        assert!(bundled("piano.wav").is_some());
        assert!(list().iter().any(|name| name == "piano.wav"));
    }

    #[test]
    fn test_unknown_asset() {
        assert!(bundled("").is_none());
        assert!(bundled("missing.wav").is_none());
    }
}
