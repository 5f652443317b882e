// Asset loading: sprite atlases and their textures

mod atlas;
mod loader;

pub use atlas::{AtlasData, SpriteAtlas, SpriteRect};
pub use loader::{AssetLoader, AssetType};

/// Asset loading errors
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Unknown sprite '{key}' in atlas '{atlas}'")]
    UnknownSprite { atlas: String, key: String },

    #[error("Invalid atlas metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to load asset: {0}")]
    LoadError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_error_display() {
        let err = AssetError::NotFound("sheet.png".to_string());
        assert_eq!(err.to_string(), "Asset not found: sheet.png");

        let err = AssetError::UnknownSprite {
            atlas: "units".to_string(),
            key: "ghost".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown sprite 'ghost' in atlas 'units'");
    }
}
