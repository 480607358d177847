//! Loading of the color and mask textures cycled by the point field.
//!
//! Sources may be local files or remote URLs. Remote images are cached on
//! disk so later runs, including offline ones, skip the network.

mod decode;
mod error;
mod fetch;
mod loader;
mod source;

pub use decode::{decode_texture, DecodedTexture};
pub use error::TextureError;
pub use fetch::{TextureFetcher, DEFAULT_FETCH_TIMEOUT};
pub use loader::{LoadEvent, TextureLoader};
pub use source::{TextureCatalog, TextureSlot, TextureSource};
