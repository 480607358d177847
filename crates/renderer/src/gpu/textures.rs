use animator::{TexturePair, CYCLE_LENGTH};
use textures::{DecodedTexture, LoadEvent, TextureSlot};
use wgpu::util::{DeviceExt, TextureDataOrder};

use super::context::SurfaceColorSpace;

const COLOR_SLOTS: usize = CYCLE_LENGTH as usize;

struct SlotTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    placeholder: bool,
}

impl SlotTexture {
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &DecodedTexture,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &image.pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            _texture: texture,
            view,
            sampler,
            placeholder: image.is_placeholder(),
        }
    }
}

/// GPU copies of the four color textures and the mask.
///
/// Every slot starts as a placeholder and is replaced when the loader
/// delivers it. One bind group is kept per cycle index, each binding
/// `current`, `next` and the mask.
pub(crate) struct TextureBank {
    layout: wgpu::BindGroupLayout,
    colors: [SlotTexture; COLOR_SLOTS],
    mask: SlotTexture,
    bind_groups: Vec<wgpu::BindGroup>,
    color_space: SurfaceColorSpace,
}

impl TextureBank {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, color_space: SurfaceColorSpace) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture cycle layout"),
            entries: &layout_entries(),
        });
        let placeholder = DecodedTexture::placeholder();
        let colors = std::array::from_fn(|index| {
            SlotTexture::upload(
                device,
                queue,
                &format!("color texture #{index}"),
                &placeholder,
                slot_format(TextureSlot::Color(index), color_space),
            )
        });
        let mask = SlotTexture::upload(
            device,
            queue,
            "mask texture",
            &placeholder,
            slot_format(TextureSlot::Mask, color_space),
        );
        let mut bank = Self {
            layout,
            colors,
            mask,
            bind_groups: Vec::with_capacity(COLOR_SLOTS),
            color_space,
        };
        bank.rebuild_bind_groups(device);
        bank
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Bind group holding `pair.current`, `pair.next` and the mask.
    pub fn bind_group(&self, pair: TexturePair) -> &wgpu::BindGroup {
        &self.bind_groups[pair.current % COLOR_SLOTS]
    }

    /// Number of slots still showing a placeholder.
    pub fn placeholders(&self) -> usize {
        self.colors
            .iter()
            .chain(std::iter::once(&self.mask))
            .filter(|slot| slot.placeholder)
            .count()
    }

    /// Uploads a finished load; failures keep the placeholder bound.
    pub fn apply(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, event: LoadEvent) {
        let (slot, texture) = match event {
            LoadEvent::Loaded { slot, texture } => (slot, texture),
            LoadEvent::Failed { slot, .. } => {
                tracing::debug!(%slot, "keeping placeholder for failed texture");
                return;
            }
        };
        let label = slot.to_string();
        let format = slot_format(slot, self.color_space);
        let uploaded = SlotTexture::upload(device, queue, &label, &texture, format);
        match slot {
            TextureSlot::Color(index) if index < COLOR_SLOTS => self.colors[index] = uploaded,
            TextureSlot::Color(index) => {
                tracing::warn!(index, "ignoring texture for unknown color slot");
                return;
            }
            TextureSlot::Mask => self.mask = uploaded,
        }
        tracing::debug!(%slot, width = texture.width, height = texture.height, "uploaded texture");
        self.rebuild_bind_groups(device);
    }

    fn rebuild_bind_groups(&mut self, device: &wgpu::Device) {
        self.bind_groups = (0..COLOR_SLOTS)
            .map(|cycle| {
                let (current, next) = cycle_slots(cycle);
                let current = &self.colors[current];
                let next = &self.colors[next];
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("texture cycle #{cycle}")),
                    layout: &self.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&current.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&current.sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(&next.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: wgpu::BindingResource::Sampler(&next.sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: wgpu::BindingResource::TextureView(&self.mask.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 5,
                            resource: wgpu::BindingResource::Sampler(&self.mask.sampler),
                        },
                    ],
                })
            })
            .collect();
    }
}

/// Color images follow the surface color space. The mask is coverage data
/// and is always sampled raw.
fn slot_format(slot: TextureSlot, color_space: SurfaceColorSpace) -> wgpu::TextureFormat {
    match slot {
        TextureSlot::Color(_) => color_space.texture_format(),
        TextureSlot::Mask => wgpu::TextureFormat::Rgba8Unorm,
    }
}

/// Color slots bound while the cycle sits at `cycle`.
fn cycle_slots(cycle: usize) -> (usize, usize) {
    let pair = TexturePair::for_cycle(cycle);
    (pair.current, pair.next)
}

fn layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(6);
    for texture in 0..3u32 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_cycle_binds_its_successor() {
        assert_eq!(cycle_slots(0), (0, 1));
        assert_eq!(cycle_slots(2), (2, 3));
        assert_eq!(cycle_slots(3), (3, 0));
    }

    #[test]
    fn mask_is_never_srgb_decoded() {
        for color_space in [SurfaceColorSpace::Gamma, SurfaceColorSpace::Linear] {
            assert_eq!(
                slot_format(TextureSlot::Mask, color_space),
                wgpu::TextureFormat::Rgba8Unorm
            );
        }
        assert_eq!(
            slot_format(TextureSlot::Color(2), SurfaceColorSpace::Linear),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(
            slot_format(TextureSlot::Color(0), SurfaceColorSpace::Gamma),
            wgpu::TextureFormat::Rgba8Unorm
        );
    }

    #[test]
    fn layout_alternates_textures_and_samplers() {
        let entries = layout_entries();
        assert_eq!(entries.len(), 6);
        for (index, entry) in entries.iter().enumerate() {
            assert_eq!(entry.binding, index as u32);
            let is_sampler = matches!(entry.ty, wgpu::BindingType::Sampler(_));
            assert_eq!(is_sampler, index % 2 == 1);
        }
    }
}
