use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::history::{FilterHistory, Mode};
use crate::pipeline::{FrameBuffer, SkippedOperation, TransformRegistry, run_filter_pipeline};
use crate::spec::FilterSpec;

/// One imported image: the durable original, the latest rendered preview, and
/// the filter history that produced it.
#[derive(Debug, Clone)]
pub struct ImageDocument {
    pub name: String,
    pub original: FrameBuffer,
    pub preview: Option<FrameBuffer>,
    pub history: FilterHistory,
}

impl ImageDocument {
    pub fn new(name: impl Into<String>, original: FrameBuffer) -> Self {
        Self {
            name: name.into(),
            original,
            preview: None,
            history: FilterHistory::new(),
        }
    }
}

/// Outcome of [`Session::adjust`].
#[derive(Debug, Clone)]
pub struct Adjustment {
    /// The new preview.
    pub frame: FrameBuffer,
    /// Filters to report back. For `cached` and `preview` this is the spec
    /// that was rendered, for `undo`/`redo` the entry the cursor moved to
    /// (`None` at a boundary or with no history), and for `reset` always `None`.
    pub filters: Option<FilterSpec>,
    pub skipped: Vec<SkippedOperation>,
}

/// All open images, in import order, plus the engine they share.
pub struct Session {
    documents: Vec<ImageDocument>,
    registry: TransformRegistry,
    config: EngineConfig,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            documents: Vec::new(),
            registry: TransformRegistry::with_builtins(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Store `original` under `name`. Re-importing a name replaces the image
    /// and starts a fresh history, keeping the original import position.
    pub fn import(&mut self, name: impl Into<String>, original: FrameBuffer) -> &ImageDocument {
        let name = name.into();
        info!(name = %name, width = original.width, height = original.height, "image imported");
        let document = ImageDocument::new(name.clone(), original);
        let index = match self.documents.iter().position(|d| d.name == name) {
            Some(index) => {
                debug!(name = %name, "replacing existing document");
                self.documents[index] = document;
                index
            }
            None => {
                self.documents.push(document);
                self.documents.len() - 1
            }
        };
        &self.documents[index]
    }

    pub fn document(&self, name: &str) -> Result<&ImageDocument> {
        self.documents
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| CoreError::ImageNotFound(name.to_string()))
    }

    pub fn documents(&self) -> &[ImageDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Run one edit command against `name`'s history and re-render its preview.
    ///
    /// `final` is not a per-image command; use [`Session::previews`].
    pub fn adjust(
        &mut self,
        name: &str,
        mode: Mode,
        spec: Option<FilterSpec>,
    ) -> Result<Adjustment> {
        let registry = &self.registry;
        let config = &self.config;
        let document = self
            .documents
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| CoreError::ImageNotFound(name.to_string()))?;

        debug!(name, %mode, "adjusting");
        let (filters, rendered) = match mode {
            Mode::Cached | Mode::Preview => {
                document.history.push(spec.unwrap_or_default(), mode);
                let active = document.history.active_spec(mode)?.clone();
                let rendered = run_filter_pipeline(&document.original, &active, registry, config)?;
                (Some(active), rendered)
            }
            Mode::Undo | Mode::Redo => {
                let moved = match mode {
                    Mode::Undo => document.history.undo().cloned(),
                    _ => document.history.redo().cloned(),
                };
                // Nothing to step through yet: show the original.
                if document.history.is_empty() {
                    let frame = document.original.clone();
                    document.preview = Some(frame.clone());
                    return Ok(Adjustment {
                        frame,
                        filters: None,
                        skipped: Vec::new(),
                    });
                }
                let active = document.history.active_spec(mode)?;
                let rendered = run_filter_pipeline(&document.original, active, registry, config)?;
                (moved, rendered)
            }
            Mode::Reset => {
                document.history.reset();
                let frame = document.original.clone();
                document.preview = Some(frame.clone());
                return Ok(Adjustment {
                    frame,
                    filters: None,
                    skipped: Vec::new(),
                });
            }
            Mode::Final => {
                return Err(CoreError::InvalidMode(
                    "final applies to every image, not a single one".into(),
                ));
            }
        };

        document.preview = Some(rendered.frame.clone());
        Ok(Adjustment {
            frame: rendered.frame,
            filters,
            skipped: rendered.skipped,
        })
    }

    /// Every rendered preview, in import order. Images that were never
    /// adjusted are left out.
    pub fn previews(&self) -> impl Iterator<Item = (&str, &FrameBuffer)> + '_ {
        self.documents
            .iter()
            .filter_map(|d| d.preview.as_ref().map(|p| (d.name.as_str(), p)))
    }

    /// Render `spec` against `name`'s original without touching its history.
    pub fn apply(&self, name: &str, spec: &FilterSpec) -> Result<FrameBuffer> {
        let document = self.document(name)?;
        let rendered = run_filter_pipeline(&document.original, spec, &self.registry, &self.config)?;
        Ok(rendered.frame)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FrameBuffer {
        FrameBuffer::from_rgba_vec(2, 2, [100, 120, 140, 255].repeat(4))
    }

    fn bright(amount: i64) -> FilterSpec {
        FilterSpec::new().with_operation("tone", "brightness", amount)
    }

    #[test]
    fn test_import_replaces_and_keeps_order() {
        let mut session = Session::default();
        session.import("a.png", frame());
        session.import("b.png", frame());
        session.adjust("a.png", Mode::Preview, Some(bright(10))).unwrap();

        session.import("a.png", FrameBuffer::new(1, 1));
        let names: Vec<_> = session.documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.png"]);
        let doc = session.document("a.png").unwrap();
        assert!(doc.history.is_empty());
        assert!(doc.preview.is_none());
        assert_eq!(doc.original.width, 1);
    }

    #[test]
    fn test_unknown_name() {
        let mut session = Session::default();
        let err = session.adjust("missing", Mode::Undo, None).unwrap_err();
        assert!(matches!(err, CoreError::ImageNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_final_is_not_per_image() {
        let mut session = Session::default();
        session.import("a.png", frame());
        assert!(matches!(
            session.adjust("a.png", Mode::Final, None),
            Err(CoreError::InvalidMode(_))
        ));
    }

    #[test]
    fn test_undo_redo_without_history_show_original() {
        let mut session = Session::default();
        session.import("a.png", frame());
        for mode in [Mode::Undo, Mode::Redo] {
            let adjustment = session.adjust("a.png", mode, None).unwrap();
            assert_eq!(adjustment.frame, frame());
            assert!(adjustment.filters.is_none());
        }
        assert_eq!(session.document("a.png").unwrap().preview, Some(frame()));
    }

    #[test]
    fn test_reset_restores_original() {
        let mut session = Session::default();
        session.import("a.png", frame());
        session.adjust("a.png", Mode::Preview, Some(bright(40))).unwrap();
        let adjustment = session.adjust("a.png", Mode::Reset, None).unwrap();
        assert_eq!(adjustment.frame, frame());
        assert!(adjustment.filters.is_none());
        assert_eq!(session.document("a.png").unwrap().preview, Some(frame()));
    }
}
