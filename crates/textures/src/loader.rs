use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::decode::{decode_texture, DecodedTexture};
use crate::error::TextureError;
use crate::fetch::TextureFetcher;
use crate::source::{TextureCatalog, TextureSlot};

/// Outcome of loading one slot.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded {
        slot: TextureSlot,
        texture: DecodedTexture,
    },
    Failed {
        slot: TextureSlot,
        error: TextureError,
    },
}

impl LoadEvent {
    pub fn slot(&self) -> TextureSlot {
        match self {
            Self::Loaded { slot, .. } | Self::Failed { slot, .. } => *slot,
        }
    }
}

/// Loads the catalog on a background thread.
///
/// Each slot produces exactly one [`LoadEvent`]. The render thread drains
/// them with [`TextureLoader::poll`] and never blocks on the network.
pub struct TextureLoader {
    events: Receiver<LoadEvent>,
    expected: usize,
    received: usize,
    join_handle: Option<JoinHandle<()>>,
}

impl TextureLoader {
    pub fn spawn(catalog: TextureCatalog, fetcher: TextureFetcher) -> Result<Self, TextureError> {
        let expected = catalog.slots().count();
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("pointfield-textures".into())
            .spawn(move || load_catalog(&catalog, &fetcher, &tx))
            .map_err(TextureError::Spawn)?;
        Ok(Self {
            events: rx,
            expected,
            received: 0,
            join_handle: Some(handle),
        })
    }

    /// Returns every event that has arrived since the last call.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.events.try_iter().collect();
        self.received += events.len();
        if self.is_finished() {
            if let Some(handle) = self.join_handle.take() {
                if handle.join().is_err() {
                    warn!("texture loader thread panicked");
                }
            }
        }
        events
    }

    /// True once every slot has reported.
    pub fn is_finished(&self) -> bool {
        self.received >= self.expected
    }

    pub fn pending(&self) -> usize {
        self.expected.saturating_sub(self.received)
    }
}

fn load_catalog(catalog: &TextureCatalog, fetcher: &TextureFetcher, tx: &Sender<LoadEvent>) {
    for (slot, source) in catalog.slots() {
        debug!(%slot, %source, "loading texture");
        let event = match fetcher.fetch(source).and_then(|bytes| decode_texture(&bytes)) {
            Ok(texture) => {
                info!(%slot, width = texture.width, height = texture.height, "texture ready");
                LoadEvent::Loaded { slot, texture }
            }
            Err(error) => {
                warn!(%slot, %source, %error, "texture unavailable; keeping placeholder");
                LoadEvent::Failed { slot, error }
            }
        };
        if tx.send(event).is_err() {
            debug!("texture receiver dropped; stopping loader");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::tests::two_row_png;
    use crate::source::TextureSource;
    use std::fs;
    use std::time::{Duration, Instant};

    fn drain(loader: &mut TextureLoader) -> Vec<LoadEvent> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        while !loader.is_finished() && Instant::now() < deadline {
            events.extend(loader.poll());
            thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn reports_every_slot_once() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.png");
        fs::write(&good, two_row_png()).unwrap();
        let missing = temp.path().join("missing.png");

        let catalog = TextureCatalog {
            colors: [
                TextureSource::Local(good.clone()),
                TextureSource::Local(missing),
                TextureSource::Local(good.clone()),
                TextureSource::Local(good.clone()),
            ],
            mask: TextureSource::Local(good),
        };
        let mut loader =
            TextureLoader::spawn(catalog, TextureFetcher::offline(temp.path().join("cache"))).unwrap();
        assert_eq!(loader.pending(), 5);

        let events = drain(&mut loader);
        assert!(loader.is_finished());
        assert_eq!(events.len(), 5);
        assert_eq!(events.iter().map(LoadEvent::slot).last(), Some(TextureSlot::Mask));

        let failed: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, LoadEvent::Failed { .. }))
            .map(LoadEvent::slot)
            .collect();
        assert_eq!(failed, vec![TextureSlot::Color(1)]);
        assert!(loader.poll().is_empty());
    }

    #[test]
    fn offline_remote_miss_fails_without_network() {
        let temp = tempfile::tempdir().unwrap();
        let mut loader = TextureLoader::spawn(
            TextureCatalog::default(),
            TextureFetcher::offline(temp.path()),
        )
        .unwrap();
        let events = drain(&mut loader);
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|event| matches!(
            event,
            LoadEvent::Failed {
                error: TextureError::Offline { .. },
                ..
            }
        )));
    }
}
