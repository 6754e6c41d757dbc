//! Offscreen render targets: the HDR capture target and the blur ping-pong pair

use super::backend::{GraphicsBackend, TargetDesc};
use crate::context::RenderError;

/// HDR texture format used for every offscreen color attachment
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Depth format of the capture target
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Capture attachment holding the sharp shaded image
pub const SCENE_ATTACHMENT: usize = 0;

/// Capture attachment feeding the bloom blur
pub const BRIGHT_ATTACHMENT: usize = 1;

/// An offscreen destination whose attachments all share one size
pub struct RenderTarget<B: GraphicsBackend> {
    handle: B::Target,
    desc: TargetDesc,
}

impl<B: GraphicsBackend> RenderTarget<B> {
    pub fn new(backend: &mut B, desc: TargetDesc) -> Result<Self, RenderError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::allocation(
                &desc.label,
                format!("zero-sized target {}x{}", desc.width, desc.height),
            ));
        }
        if desc.color_attachments == 0 {
            return Err(RenderError::allocation(&desc.label, "no color attachments"));
        }

        let handle = backend.create_target(&desc)?;
        tracing::debug!(
            target_label = %desc.label,
            width = desc.width,
            height = desc.height,
            attachments = desc.color_attachments,
            depth = desc.depth,
            "allocated render target"
        );
        Ok(Self { handle, desc })
    }

    /// The scene capture target: two HDR color attachments plus depth
    pub fn capture(backend: &mut B, width: u32, height: u32) -> Result<Self, RenderError> {
        Self::new(
            backend,
            TargetDesc {
                label: "HDR Capture".into(),
                width,
                height,
                color_attachments: 2,
                depth: true,
            },
        )
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn color_attachment_count(&self) -> usize {
        self.desc.color_attachments
    }

    pub fn has_depth(&self) -> bool {
        self.desc.depth
    }

    pub fn desc(&self) -> &TargetDesc {
        &self.desc
    }

    pub fn handle(&self) -> &B::Target {
        &self.handle
    }

    /// Size the backend reports for one attachment
    pub fn attachment_size(&self, backend: &B, attachment: usize) -> Option<(u32, u32)> {
        backend.attachment_size(&self.handle, attachment)
    }
}

/// Two single-attachment, depth-less targets that take turns as blur
/// source and destination
pub struct PingPongPair<B: GraphicsBackend> {
    buffers: [RenderTarget<B>; 2],
}

impl<B: GraphicsBackend> PingPongPair<B> {
    pub fn new(backend: &mut B, width: u32, height: u32) -> Result<Self, RenderError> {
        let mut make = |index: usize| {
            RenderTarget::new(
                backend,
                TargetDesc {
                    label: format!("Blur Ping-Pong {}", index),
                    width,
                    height,
                    color_attachments: 1,
                    depth: false,
                },
            )
        };
        let first = make(0)?;
        let second = make(1)?;
        Ok(Self {
            buffers: [first, second],
        })
    }

    pub fn get(&self, index: usize) -> &RenderTarget<B> {
        &self.buffers[index & 1]
    }

    /// Destination for a blur step in the given direction
    pub fn write_target(&self, horizontal: bool) -> &RenderTarget<B> {
        self.get(horizontal as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderTarget<B>> {
        self.buffers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocess::testing::RecordingBackend;

    #[test]
    fn test_capture_layout() {
        let mut backend = RecordingBackend::new();
        let target = RenderTarget::capture(&mut backend, 800, 600).unwrap();
        assert_eq!(target.color_attachment_count(), 2);
        assert!(target.has_depth());
        assert_eq!(target.attachment_size(&backend, SCENE_ATTACHMENT), Some((800, 600)));
        assert_eq!(target.attachment_size(&backend, BRIGHT_ATTACHMENT), Some((800, 600)));
        assert_eq!(target.attachment_size(&backend, 2), None);
    }

    #[test]
    fn test_ping_pong_layout() {
        let mut backend = RecordingBackend::new();
        let pair = PingPongPair::new(&mut backend, 320, 200).unwrap();
        for target in pair.iter() {
            assert_eq!(target.color_attachment_count(), 1);
            assert!(!target.has_depth());
            assert_eq!(target.attachment_size(&backend, 0), Some((320, 200)));
        }
        assert_eq!(pair.write_target(true).desc().label, "Blur Ping-Pong 1");
        assert_eq!(pair.write_target(false).desc().label, "Blur Ping-Pong 0");
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut backend = RecordingBackend::new();
        let err = RenderTarget::capture(&mut backend, 0, 600).err().unwrap();
        assert!(matches!(err, RenderError::ResourceAllocation { .. }));
        assert_eq!(backend.live_targets(), 0);
    }

    #[test]
    fn test_backend_failure_propagates() {
        let mut backend = RecordingBackend::new();
        backend.fail_allocations = true;
        let err = PingPongPair::new(&mut backend, 64, 64).err().unwrap();
        assert!(matches!(err, RenderError::ResourceAllocation { .. }));
    }

    #[test]
    fn test_drop_releases_attachments() {
        let mut backend = RecordingBackend::new();
        {
            let _capture = RenderTarget::capture(&mut backend, 64, 64).unwrap();
            let _pair = PingPongPair::new(&mut backend, 64, 64).unwrap();
            assert_eq!(backend.live_targets(), 3);
        }
        assert_eq!(backend.live_targets(), 0);
    }
}
