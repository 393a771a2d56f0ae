use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::capture::renderer::FrameRGBA;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{PinpointError, PinpointResult};
use crate::foundation::math::mul_div255_u16;

/// Smallest bitrate the sink will hand to the encoder.
pub const MIN_BITRATE: u64 = 100_000;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Destination MP4 file.
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// Straight-alpha color that translucent pixels are composited over.
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Overwriting options with a black background.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Streams frames as raw RGBA into the system `ffmpeg`, which writes H.264 (yuv420p) MP4.
///
/// Frame order and size are the caller's contract (see [`FrameSink`]); only the byte length of
/// each frame is checked here.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<Encoder>,
}

impl FfmpegSink {
    /// Sink that spawns `ffmpeg` on `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
        }
    }

    /// Output file path.
    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> PinpointResult<()> {
        check_config(&cfg)?;
        prepare_output(&self.opts)?;
        if !is_ffmpeg_on_path() {
            return Err(PinpointError::capture_setup(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut child = encoder_command(&self.opts.out_path, self.opts.overwrite, &cfg)
            .spawn()
            .map_err(|e| PinpointError::capture_setup(format!("failed to spawn ffmpeg: {e}")))?;
        let stdin = child.stdin.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut log = Vec::new();
                pipe.read_to_end(&mut log)?;
                Ok(log)
            })
        });
        let encoder = Encoder {
            child,
            stdin,
            stderr,
            opaque: vec![0; (cfg.width as usize) * (cfg.height as usize) * 4],
        };
        if encoder.stdin.is_none() {
            return Err(PinpointError::capture_setup("failed to open ffmpeg stdin"));
        }

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            bitrate = cfg.bitrate,
            out = %self.opts.out_path.display(),
            "ffmpeg started"
        );
        self.encoder = Some(encoder);
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRGBA) -> PinpointResult<()> {
        let bg = self.opts.bg_rgba;
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| PinpointError::evaluation("ffmpeg sink not started"))?;
        flatten_premul_over_bg_to_opaque_rgba8(&mut encoder.opaque, &frame.data, bg)?;
        let stdin = encoder
            .stdin
            .as_mut()
            .ok_or_else(|| PinpointError::evaluation("ffmpeg stdin is closed"))?;
        stdin
            .write_all(&encoder.opaque)
            .map_err(|e| PinpointError::evaluation(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn end(&mut self) -> PinpointResult<()> {
        let mut encoder = self
            .encoder
            .take()
            .ok_or_else(|| PinpointError::evaluation("ffmpeg sink not started"))?;
        encoder.finish()
    }
}

/// A running `ffmpeg` child with its stdin and a thread collecting stderr.
struct Encoder {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    opaque: Vec<u8>,
}

impl Encoder {
    /// Close stdin and wait for the encoder to flush the file.
    fn finish(&mut self) -> PinpointResult<()> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| PinpointError::evaluation(format!("failed to wait for ffmpeg: {e}")))?;
        let log = match self.stderr.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PinpointError::evaluation("ffmpeg stderr reader panicked"))?
                .map_err(|e| PinpointError::evaluation(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if status.success() {
            return Ok(());
        }
        Err(PinpointError::evaluation(format!(
            "ffmpeg exited with {status}: {}",
            String::from_utf8_lossy(&log).trim()
        )))
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        // Only a child that was never waited on is still running here.
        drop(self.stdin.take());
        if let Ok(None) = self.child.try_wait() {
            if let Err(e) = self.child.kill() {
                tracing::warn!(error = %e, "failed to kill abandoned ffmpeg");
            }
            let _ = self.child.wait();
        }
    }
}

fn check_config(cfg: &SinkConfig) -> PinpointResult<()> {
    let problem = if cfg.fps.num == 0 || cfg.fps.den == 0 {
        Some("fps must be non-zero".to_owned())
    } else if cfg.width == 0 || cfg.height == 0 {
        Some("width and height must be non-zero".to_owned())
    } else if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        Some(format!(
            "{}x{} is not encodable as yuv420p; width and height must be even",
            cfg.width, cfg.height
        ))
    } else if cfg.bitrate < MIN_BITRATE {
        Some(format!(
            "bitrate {} is below the supported minimum of {MIN_BITRATE} bit/s",
            cfg.bitrate
        ))
    } else {
        None
    };
    match problem {
        Some(msg) => Err(PinpointError::capture_setup(msg)),
        None => Ok(()),
    }
}

fn prepare_output(opts: &FfmpegSinkOpts) -> PinpointResult<()> {
    if let Some(parent) = opts.out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PinpointError::capture_setup(format!("cannot create '{}': {e}", parent.display()))
        })?;
    }
    if !opts.overwrite && opts.out_path.exists() {
        return Err(PinpointError::capture_setup(format!(
            "output file '{}' already exists",
            opts.out_path.display()
        )));
    }
    Ok(())
}

fn encoder_command(out: &Path, overwrite: bool, cfg: &SinkConfig) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .arg(if overwrite { "-y" } else { "-n" })
        .args(["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"])
        .args(["-s", &format!("{}x{}", cfg.width, cfg.height)])
        // Rational input rate, before `-i`.
        .args(["-r", &format!("{}/{}", cfg.fps.num, cfg.fps.den)])
        .args(["-i", "pipe:0", "-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .args(["-b:v", &cfg.bitrate.to_string(), "-movflags", "+faststart"])
        .arg(out);
    cmd
}

/// Composite premultiplied RGBA over an opaque background.
fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> PinpointResult<()> {
    if dst.len() != src_premul.len() {
        return Err(PinpointError::validation(format!(
            "frame has {} bytes, expected {}",
            src_premul.len(),
            dst.len()
        )));
    }

    let bg = bg_rgba.map(u16::from);
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let inv = 255 - u16::from(s[3]);
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
