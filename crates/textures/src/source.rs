use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;

const ASSET_BASE: &str = "https://assets.codepen.io/3919397/";
const COLOR_QUERY: &str = "?width=512&height=512&format=auto";
const DEFAULT_COLORS: [&str; 4] = [
    "1625747283927.jpeg",
    "1625747722281.jpeg",
    "1625747309022.jpeg",
    "1625747790149.jpeg",
];
const DEFAULT_MASK: &str = "1625799454774.png";

/// Where a texture's encoded bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    Remote(Url),
    Local(PathBuf),
}

impl TextureSource {
    /// `http://` and `https://` inputs that parse as URLs are remote;
    /// everything else is a filesystem path.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            if let Ok(url) = Url::parse(trimmed) {
                return Self::Remote(url);
            }
        }
        Self::Local(PathBuf::from(trimmed))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path.as_path()),
            Self::Remote(_) => None,
        }
    }
}

impl fmt::Display for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Identifies one of the five textures of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Color(usize),
    Mask,
}

impl fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(index) => write!(f, "color #{index}"),
            Self::Mask => f.write_str("mask"),
        }
    }
}

/// The four cycled color textures and the sprite mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureCatalog {
    pub colors: [TextureSource; 4],
    pub mask: TextureSource,
}

impl TextureCatalog {
    pub fn from_inputs(colors: &[String; 4], mask: &str) -> Self {
        Self {
            colors: [
                TextureSource::from_input(&colors[0]),
                TextureSource::from_input(&colors[1]),
                TextureSource::from_input(&colors[2]),
                TextureSource::from_input(&colors[3]),
            ],
            mask: TextureSource::from_input(mask),
        }
    }

    /// Input strings of the hosted textures the effect ships with.
    pub fn default_inputs() -> ([String; 4], String) {
        let colors = DEFAULT_COLORS.map(|name| format!("{ASSET_BASE}{name}{COLOR_QUERY}"));
        (colors, format!("{ASSET_BASE}{DEFAULT_MASK}"))
    }

    /// Every slot with its source, colors first.
    pub fn slots(&self) -> impl Iterator<Item = (TextureSlot, &TextureSource)> {
        self.colors
            .iter()
            .enumerate()
            .map(|(index, source)| (TextureSlot::Color(index), source))
            .chain(std::iter::once((TextureSlot::Mask, &self.mask)))
    }
}

impl Default for TextureCatalog {
    fn default() -> Self {
        let (colors, mask) = Self::default_inputs();
        Self::from_inputs(&colors, &mask)
    }
}
