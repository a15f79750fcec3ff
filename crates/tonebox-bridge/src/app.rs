use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tonebox_core::config::EngineConfig;
use tonebox_core::history::Mode;
use tonebox_core::session::Session;
use tonebox_core::spec::FilterSpec;
use tonebox_media::codec::{self, ImageFormat};
use tracing::{debug, error, info, warn};

use crate::message::{
    AdjustImage, Adjusted, Envelope, ExportedImage, Exported, Failure, ImportImage, Imported,
    Reply, Request, Response,
};

pub struct App {
    pub session: Session,
}

impl Default for App {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl App {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            session: Session::new(config),
        }
    }

    /// Handle one protocol line, returning the reply line if there is one.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let response = match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => match Request::from_envelope(envelope) {
                Ok(request) => self.update(request)?,
                Err(e) => {
                    warn!(error = %e, "malformed message data");
                    Response::Error(Failure::new(format!("malformed message data: {e}")))
                }
            },
            Err(e) => {
                warn!(error = %e, "invalid message");
                Response::Error(Failure::new(format!("invalid message: {e}")))
            }
        };
        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                None
            }
        }
    }

    pub fn update(&mut self, request: Request) -> Option<Response> {
        match request {
            Request::ImportImage(import) => Some(self.import(import)),
            Request::AdjustImage(adjust) => Some(self.adjust(adjust)),
            Request::Ping => Some(Response::Pong { ok: true }),
            Request::Unknown(event) => {
                debug!(event = %event, "unhandled event");
                None
            }
        }
    }

    fn import(&mut self, import: ImportImage) -> Response {
        let (Some(filename), Some(data_url)) = (import.filename, import.data_url) else {
            return Response::ImageImported(Reply::Failed(Failure::new(
                "importImage requires filename and dataUrl",
            )));
        };
        let result = codec::decode_data_url(&data_url)
            .map_err(anyhow::Error::from)
            .and_then(|frame| {
                let document = self.session.import(filename.clone(), frame);
                Ok(codec::encode_data_url(&document.original, ImageFormat::Png)?)
            });
        match result {
            Ok(data_url) => Response::ImageImported(Reply::Ok(Imported {
                status: true,
                filename,
                data_url,
            })),
            Err(e) => {
                warn!(filename = %filename, error = %e, "import failed");
                Response::ImageImported(Reply::Failed(Failure::new(e.to_string())))
            }
        }
    }

    fn adjust(&mut self, adjust: AdjustImage) -> Response {
        let mode = match adjust.function.as_deref().map(str::parse::<Mode>) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => return adjust_failed(e.into()),
            None => return adjust_failed(anyhow!("adjustImage requires function")),
        };
        if mode == Mode::Final {
            return match self.export() {
                Ok(exported) => Response::ImageExport(Reply::Ok(exported)),
                Err(e) => adjust_failed(e),
            };
        }
        match self.adjust_one(mode, adjust.filename, adjust.filters) {
            Ok(adjusted) => Response::ImageAdjusted(Reply::Ok(adjusted)),
            Err(e) => adjust_failed(e),
        }
    }

    fn adjust_one(
        &mut self,
        mode: Mode,
        filename: Option<String>,
        filters: Option<Value>,
    ) -> Result<Adjusted> {
        let filename = filename.context("adjustImage requires filename")?;
        let spec = match filters {
            None | Some(Value::Null) => None,
            Some(value) => Some(FilterSpec::from_value(value)?),
        };
        let adjustment = self.session.adjust(&filename, mode, spec)?;

        // Live edits favour speed; everything else stays lossless.
        let format = if mode == Mode::Cached {
            ImageFormat::Jpeg
        } else {
            ImageFormat::Png
        };
        let data_url = codec::encode_data_url(&adjustment.frame, format)?;
        let filters = match mode {
            Mode::Reset => None,
            _ => Some(adjustment.filters.map(|spec| spec.to_value())),
        };
        info!(filename = %filename, %mode, "image adjusted");
        Ok(Adjusted {
            status: true,
            filename,
            data_url,
            filters,
        })
    }

    fn export(&self) -> Result<Exported> {
        let data = self
            .session
            .previews()
            .map(|(name, frame)| -> Result<ExportedImage> {
                Ok(ExportedImage {
                    filename: name.to_string(),
                    url: codec::encode_data_url(frame, ImageFormat::Png)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        info!(count = data.len(), "exported previews");
        Ok(Exported { status: true, data })
    }
}

fn adjust_failed(e: anyhow::Error) -> Response {
    warn!(error = %e, "adjustImage failed");
    Response::ImageAdjusted(Reply::Failed(Failure::new(e.to_string())))
}

/// Serve the protocol until `input` is exhausted, flushing after every reply.
pub fn run<R: BufRead, W: Write>(app: &mut App, input: R, mut output: W) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if let Some(reply) = app.handle_line(&line) {
            writeln!(output, "{reply}")?;
            output.flush()?;
        }
    }
    Ok(())
}
