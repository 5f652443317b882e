// Sprite atlas: named sub-rectangles of a shared sheet texture

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::loader::{AssetLoader, AssetType};
use super::AssetError;
use crate::engine::renderer::{SpriteMaterial, Texture};

/// Pixel rectangle of a sprite within its atlas image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRect {
    /// Offset from the left edge of the sheet (pixels)
    pub x: u32,
    /// Offset from the top edge of the sheet (pixels)
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Atlas metadata as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasData {
    /// Name of the sheet image, resolved through the asset loader
    pub source: String,
    /// Sheet width in pixels
    pub width: u32,
    /// Sheet height in pixels
    pub height: u32,
    /// Sprite key → rectangle; keys are unique, order carries no meaning
    pub sprites: HashMap<String, SpriteRect>,
}

impl AtlasData {
    /// Parse atlas metadata from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, AssetError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A sprite sheet: immutable metadata plus lazily created GPU resources
///
/// The texture and material are absent until created, either at
/// construction via [`with_texture`] or later via [`ensure_texture`];
/// everything else on the atlas works without them.
///
/// [`with_texture`]: SpriteAtlas::with_texture
/// [`ensure_texture`]: SpriteAtlas::ensure_texture
pub struct SpriteAtlas {
    source: String,
    width: u32,
    height: u32,
    sprites: HashMap<String, SpriteRect>,
    texture: Option<Texture>,
    material: Option<SpriteMaterial>,
}

impl SpriteAtlas {
    /// Build an atlas from metadata, suppressing texture creation
    pub fn new(data: AtlasData) -> Self {
        Self {
            source: data.source,
            width: data.width,
            height: data.height,
            sprites: data.sprites,
            texture: None,
            material: None,
        }
    }

    /// Build an atlas and immediately create its texture and material
    pub fn with_texture(
        data: AtlasData,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        loader: &AssetLoader,
    ) -> anyhow::Result<Self> {
        let mut atlas = Self::new(data);
        atlas.ensure_texture(device, queue, loader)?;
        Ok(atlas)
    }

    /// Create the texture and material if they don't exist yet
    pub fn ensure_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        loader: &AssetLoader,
    ) -> anyhow::Result<()> {
        if self.texture.is_some() {
            return Ok(());
        }

        let bytes = loader.load_bytes(AssetType::Texture, &self.source)?;
        let texture = Texture::from_bytes(device, queue, &bytes, &self.source)?;
        let material = SpriteMaterial::new(device, &texture, Some(&self.source));

        info!(
            "loaded atlas sheet '{}' ({}x{}, {} sprites)",
            self.source,
            texture.width,
            texture.height,
            self.sprites.len()
        );

        self.texture = Some(texture);
        self.material = Some(material);
        Ok(())
    }

    /// The rectangle stored for a sprite key
    pub fn rect(&self, key: &str) -> Result<&SpriteRect, AssetError> {
        self.sprites
            .get(key)
            .ok_or_else(|| AssetError::UnknownSprite {
                atlas: self.source.clone(),
                key: key.to_string(),
            })
    }

    /// Width of a sprite, in source-image pixels
    pub fn sprite_width(&self, key: &str) -> Result<u32, AssetError> {
        self.rect(key).map(|r| r.width)
    }

    /// Height of a sprite, in source-image pixels
    pub fn sprite_height(&self, key: &str) -> Result<u32, AssetError> {
        self.rect(key).map(|r| r.height)
    }

    /// Normalized UV corners (min, max) of a sprite within the sheet
    pub fn uv(&self, key: &str) -> Result<(Vec2, Vec2), AssetError> {
        let rect = self.rect(key)?;
        let min = Vec2::new(
            rect.x as f32 / self.width as f32,
            rect.y as f32 / self.height as f32,
        );
        let max = Vec2::new(
            (rect.x + rect.width) as f32 / self.width as f32,
            (rect.y + rect.height) as f32 / self.height as f32,
        );
        Ok((min, max))
    }

    /// Whether the atlas knows a sprite key
    pub fn contains(&self, key: &str) -> bool {
        self.sprites.contains_key(key)
    }

    /// Number of sprites in the atlas
    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Name of the sheet image
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Sheet width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Sheet height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The sheet texture, once created
    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// The sheet material, once created
    pub fn material(&self) -> Option<&SpriteMaterial> {
        self.material.as_ref()
    }
}
