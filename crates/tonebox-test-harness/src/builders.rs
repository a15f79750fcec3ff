use tonebox_core::pipeline::FrameBuffer;
use tonebox_core::spec::{CropRect, FilterSpec, OperationValue};

/// Builder for filter specs. Sections and operations keep the order they are
/// added in.
pub struct FilterSpecBuilder {
    spec: FilterSpec,
    section: String,
}

impl FilterSpecBuilder {
    pub fn new() -> Self {
        Self {
            spec: FilterSpec::new(),
            section: "tone".into(),
        }
    }

    /// Switch the section that following operations are added to.
    pub fn section(mut self, name: &str) -> Self {
        self.section = name.into();
        self
    }

    pub fn op(mut self, name: &str, value: impl Into<OperationValue>) -> Self {
        self.spec = self.spec.with_operation(&self.section, name, value);
        self
    }

    pub fn brightness(self, strength: i64) -> Self {
        self.op("brightness", strength)
    }

    pub fn contrast(self, strength: i64) -> Self {
        self.op("contrast", strength)
    }

    pub fn toggle(self, name: &str) -> Self {
        self.op(name, true)
    }

    pub fn crop(mut self, x: i64, y: i64, width: i64, height: i64) -> Self {
        self.spec = self.spec.with_crop(CropRect::new(x, y, width, height));
        self
    }

    pub fn build(self) -> FilterSpec {
        self.spec
    }
}

impl Default for FilterSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for RGBA test frames. Defaults to an opaque black 8x8 image.
pub struct FrameBufferBuilder {
    width: u32,
    height: u32,
    fill: [u8; 4],
    pixels: Vec<(u32, u32, [u8; 4])>,
}

impl FrameBufferBuilder {
    pub fn new() -> Self {
        Self {
            width: 8,
            height: 8,
            fill: [0, 0, 0, 255],
            pixels: Vec::new(),
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn fill(mut self, rgba: [u8; 4]) -> Self {
        self.fill = rgba;
        self
    }

    pub fn pixel(mut self, x: u32, y: u32, rgba: [u8; 4]) -> Self {
        self.pixels.push((x, y, rgba));
        self
    }

    pub fn build(self) -> FrameBuffer {
        let count = (self.width * self.height) as usize;
        let mut frame = FrameBuffer::from_rgba_vec(self.width, self.height, self.fill.repeat(count));
        for (x, y, rgba) in self.pixels {
            frame.pixel_mut(x, y).copy_from_slice(&rgba);
        }
        frame
    }
}

impl Default for FrameBufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}
