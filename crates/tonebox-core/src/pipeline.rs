use std::collections::HashMap;

use tracing::{trace, warn};

use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::operations::{Arity, Operation};
use crate::spec::{FilterSpec, OperationValue};
use crate::transforms;

// =============================================================================
// FrameBuffer
// =============================================================================

/// An owned RGBA pixel buffer. 4 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Create a new transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// Create from existing RGBA data. Panics if data length doesn't match dimensions.
    pub fn from_rgba_vec(width: u32, height: u32, data: Vec<u8>) -> Self {
        let expected = width as usize * height as usize * 4;
        assert_eq!(
            data.len(),
            expected,
            "RGBA data length {} doesn't match {}x{}x4={}",
            data.len(),
            width,
            height,
            expected
        );
        Self {
            width,
            height,
            data,
        }
    }

    /// Get pixel RGBA at (x, y). Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        &self.data[idx..idx + 4]
    }

    /// Get mutable pixel RGBA at (x, y). Panics if out of bounds.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        &mut self.data[idx..idx + 4]
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// =============================================================================
// PixelTransform trait and TransformContext
// =============================================================================

/// Context handed to every transform.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext {
    pub grain_seed: u64,
}

impl From<&EngineConfig> for TransformContext {
    fn from(config: &EngineConfig) -> Self {
        Self {
            grain_seed: config.grain_seed,
        }
    }
}

/// A pure pixel transform. Takes ownership of the input so per-pixel
/// transforms can work in place; returns a buffer of the same dimensions.
pub trait PixelTransform: Send + Sync {
    /// Toggle transforms are called with a strength of 0 and ignore it.
    fn process(&self, input: FrameBuffer, strength: f64, ctx: &TransformContext) -> FrameBuffer;

    /// Returns true if `strength` leaves every pixel unchanged. Used to skip work.
    fn is_identity(&self, strength: f64) -> bool {
        let _ = strength;
        false
    }
}

// =============================================================================
// Transform Registry
// =============================================================================

/// Maps each [`Operation`] to its implementation. Built once at startup.
pub struct TransformRegistry {
    transforms: HashMap<Operation, Box<dyn PixelTransform>>,
}

impl TransformRegistry {
    /// Create a registry with every built-in transform registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            transforms: HashMap::new(),
        };
        registry.register(Operation::Brightness, Box::new(transforms::Brightness));
        registry.register(Operation::Contrast, Box::new(transforms::Contrast));
        registry.register(Operation::Saturation, Box::new(transforms::Saturation));
        registry.register(Operation::Hue, Box::new(transforms::Hue));
        registry.register(Operation::Grayscale, Box::new(transforms::Grayscale));
        registry.register(Operation::Sepia, Box::new(transforms::Sepia));
        registry.register(Operation::Cool, Box::new(transforms::Cool));
        registry.register(Operation::Warm, Box::new(transforms::Warm));
        registry.register(Operation::Vignette, Box::new(transforms::Vignette));
        registry.register(Operation::Glow, Box::new(transforms::Glow));
        registry.register(Operation::Grain, Box::new(transforms::Grain));
        registry.register(Operation::Blur, Box::new(transforms::Blur));
        registry.register(Operation::Sharpen, Box::new(transforms::Sharpen));
        registry
    }

    pub fn get(&self, operation: Operation) -> Option<&dyn PixelTransform> {
        self.transforms.get(&operation).map(|t| t.as_ref())
    }

    pub fn register(&mut self, operation: Operation, transform: Box<dyn PixelTransform>) {
        self.transforms.insert(operation, transform);
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// An operation the pipeline passed over because it could not resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOperation {
    pub section: String,
    pub name: String,
}

/// Result of running a filter spec, with diagnostics for the caller.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub frame: FrameBuffer,
    /// Operations that ran, in application order.
    pub applied: Vec<Operation>,
    /// Unknown operation names that were skipped.
    pub skipped: Vec<SkippedOperation>,
    pub cropped: bool,
}

/// Render `spec` against `source`. The source buffer is never modified.
///
/// 1. Sections, and operations within a section, run in declaration order.
/// 2. `true` runs an operation in its plain form, a non-zero number runs it
///    at that strength, `false` and `0` skip it. `true` on a strength
///    operation means strength 0, which is an identity and never recorded.
/// 3. Unknown names are skipped with a warning, or rejected when
///    `config.reject_unknown_operations` is set.
/// 4. The crop rectangle, if all four fields are positive, is applied last.
pub fn run_filter_pipeline(
    source: &FrameBuffer,
    spec: &FilterSpec,
    registry: &TransformRegistry,
    config: &EngineConfig,
) -> Result<PipelineResult> {
    let ctx = TransformContext::from(config);
    let mut frame = source.clone();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for section in spec.sections() {
        for (name, value) in &section.operations {
            let Some(operation) = Operation::from_name(name) else {
                if config.reject_unknown_operations {
                    return Err(CoreError::UnknownOperation {
                        section: section.name.clone(),
                        name: name.clone(),
                    });
                }
                warn!(section = %section.name, operation = %name, "skipping unknown operation");
                skipped.push(SkippedOperation {
                    section: section.name.clone(),
                    name: name.clone(),
                });
                continue;
            };

            if !value.is_active() {
                continue;
            }
            let strength = match value {
                OperationValue::Toggle(_) => 0.0,
                OperationValue::Strength(_) if operation.arity() == Arity::Toggle => {
                    return Err(CoreError::InvalidSpec(format!(
                        "{} is a toggle and takes no strength",
                        operation.name()
                    )));
                }
                OperationValue::Strength(_) => value.as_f64().unwrap_or(0.0),
            };

            let Some(transform) = registry.get(operation) else {
                warn!(operation = operation.name(), "no transform registered");
                continue;
            };
            if transform.is_identity(strength) {
                trace!(operation = operation.name(), strength, "identity, skipped");
                continue;
            }
            trace!(operation = operation.name(), strength, "applying");
            frame = transform.process(frame, strength, &ctx);
            applied.push(operation);
        }
    }

    let mut cropped = false;
    if let Some(rect) = spec.crop()
        && rect.is_active()
    {
        frame = transforms::crop(&frame, rect)?;
        cropped = true;
    }

    Ok(PipelineResult {
        frame,
        applied,
        skipped,
        cropped,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::CropRect;

    fn sample_frame() -> FrameBuffer {
        let mut data = Vec::new();
        for i in 0..16u8 {
            data.extend_from_slice(&[i * 15, 255 - i * 10, 40 + i * 5, 255]);
        }
        FrameBuffer::from_rgba_vec(4, 4, data)
    }

    fn run(frame: &FrameBuffer, spec: &FilterSpec) -> Result<PipelineResult> {
        run_filter_pipeline(
            frame,
            spec,
            &TransformRegistry::with_builtins(),
            &EngineConfig::default(),
        )
    }

    // --- FrameBuffer tests ---

    #[test]
    fn test_framebuffer_new() {
        let fb = FrameBuffer::new(4, 3);
        assert_eq!(fb.width, 4);
        assert_eq!(fb.height, 3);
        assert_eq!(fb.data.len(), 4 * 3 * 4);
        assert!(fb.data.iter().all(|&b| b == 0));
        assert_eq!(fb.pixel_count(), 12);
    }

    #[test]
    fn test_framebuffer_pixel_access() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.pixel_mut(2, 1).copy_from_slice(&[255, 128, 64, 255]);
        assert_eq!(fb.pixel(2, 1), &[255, 128, 64, 255]);
    }

    #[test]
    #[should_panic(expected = "RGBA data length")]
    fn test_framebuffer_from_rgba_vec_wrong_size() {
        FrameBuffer::from_rgba_vec(2, 2, vec![0; 10]);
    }

    // --- Registry tests ---

    #[test]
    fn test_registry_builtins() {
        let registry = TransformRegistry::with_builtins();
        for op in Operation::all_builtin() {
            assert!(registry.get(*op).is_some(), "{op:?} not registered");
        }
    }

    // --- Pipeline tests ---

    #[test]
    fn test_pipeline_does_not_touch_source() {
        let frame = sample_frame();
        let before = frame.clone();
        let spec = FilterSpec::new().with_operation("style", "grayscale", true);
        let result = run(&frame, &spec).unwrap();
        assert_eq!(frame, before);
        assert_ne!(result.frame, before);
        assert_eq!(result.applied, vec![Operation::Grayscale]);
    }

    #[test]
    fn test_pipeline_zero_and_false_are_skipped() {
        let frame = sample_frame();
        let spec = FilterSpec::new()
            .with_operation("tone", "brightness", 0.0)
            .with_operation("tone", "blur", 0i64)
            .with_operation("style", "sepia", false);
        let result = run(&frame, &spec).unwrap();
        assert_eq!(result.frame, frame);
        assert!(result.applied.is_empty());
    }

    #[test]
    fn test_pipeline_unknown_operation_skipped_with_diagnostic() {
        let frame = sample_frame();
        let spec = FilterSpec::new().with_operation("style", "posterize", true);
        let result = run(&frame, &spec).unwrap();
        assert_eq!(result.frame, frame);
        assert_eq!(
            result.skipped,
            vec![SkippedOperation {
                section: "style".into(),
                name: "posterize".into(),
            }]
        );
    }

    #[test]
    fn test_pipeline_unknown_operation_rejected_when_strict() {
        let config = EngineConfig {
            reject_unknown_operations: true,
            ..EngineConfig::default()
        };
        let spec = FilterSpec::new().with_operation("style", "posterize", true);
        let err = run_filter_pipeline(
            &sample_frame(),
            &spec,
            &TransformRegistry::with_builtins(),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownOperation { .. }));
    }

    #[test]
    fn test_pipeline_toggle_with_strength_is_invalid() {
        let spec = FilterSpec::new().with_operation("style", "grayscale", 5.0);
        let err = run(&sample_frame(), &spec).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSpec(_)));
    }

    #[test]
    fn test_pipeline_strength_operation_toggled_on_runs_at_zero() {
        let frame = sample_frame();
        let spec = FilterSpec::new().with_operation("tone", "brightness", true);
        let result = run(&frame, &spec).unwrap();
        assert_eq!(result.frame, frame);
    }

    #[test]
    fn test_pipeline_crop_last() {
        let frame = sample_frame();
        let spec = FilterSpec::new()
            .with_crop(CropRect::new(1, 1, 2, 3))
            .with_operation("style", "grayscale", true);
        let result = run(&frame, &spec).unwrap();
        assert!(result.cropped);
        assert_eq!((result.frame.width, result.frame.height), (2, 3));
        let px = result.frame.pixel(0, 0);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_pipeline_inactive_crop_is_skipped() {
        let frame = sample_frame();
        let spec = FilterSpec::new().with_crop(CropRect::new(1, 1, 0, 2));
        let result = run(&frame, &spec).unwrap();
        assert!(!result.cropped);
        assert_eq!(result.frame, frame);
    }

    #[test]
    fn test_pipeline_crop_out_of_bounds() {
        let spec = FilterSpec::new().with_crop(CropRect::new(2, 2, 3, 1));
        let err = run(&sample_frame(), &spec).unwrap_err();
        assert!(matches!(err, CoreError::CropOutOfBounds { .. }));
    }

    #[test]
    fn test_pipeline_ordering_matters() {
        let frame = sample_frame();
        let a = FilterSpec::new()
            .with_operation("tone", "brightness", 50.0)
            .with_operation("tone", "contrast", 50.0);
        let b = FilterSpec::new()
            .with_operation("tone", "contrast", 50.0)
            .with_operation("tone", "brightness", 50.0);
        let ra = run(&frame, &a).unwrap();
        let rb = run(&frame, &b).unwrap();
        assert_eq!(ra.applied, vec![Operation::Brightness, Operation::Contrast]);
        assert_eq!(rb.applied, vec![Operation::Contrast, Operation::Brightness]);
        assert_ne!(ra.frame, rb.frame);
    }
}
