//! Tesseract OCR engine implementation.
//!
//! Each image is written to a temporary file and handed to the Tesseract
//! CLI (`tesseract <file> stdout -l <lang>`). Formats Tesseract reads
//! natively go through untouched; other decodable formats are re-encoded
//! to PNG. A failed image produces a warning and no text, never an error:
//! one bad chart must not sink the rest of the deck.

use deckscan_core::{Error, Result};
use image::ImageFormat;
use std::io::{Read, Write};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// Default per-image OCR timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Image formats as sniffed from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SniffedFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Gif,
    WebP,
    Unknown,
}

impl SniffedFormat {
    /// Whether Tesseract reads this format without conversion.
    fn is_tesseract_native(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Tiff | Self::Bmp)
    }

    /// File extension for the temp file handed to Tesseract.
    fn extension(self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
            Self::Tiff => ".tif",
            Self::Bmp => ".bmp",
            Self::Gif => ".gif",
            Self::WebP => ".webp",
            Self::Unknown => ".bin",
        }
    }
}

/// OCR engine driving the Tesseract CLI.
#[derive(Debug, Clone)]
pub struct OcrEngine {
    tesseract_exe: String,
    language: String,
    timeout: Duration,
}

impl Default for OcrEngine {
    fn default() -> Self {
        Self {
            tesseract_exe: "tesseract".to_string(),
            language: "eng".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OcrEngine {
    /// Create an engine with default settings (`tesseract`, English, 30s).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Tesseract executable path.
    pub fn with_executable(mut self, exe: impl Into<String>) -> Self {
        self.tesseract_exe = exe.into();
        self
    }

    /// Set the recognition language (Tesseract language code, e.g. `eng`).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the per-image timeout in seconds. Zero disables the timeout.
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }

    /// Check that the Tesseract binary runs, returning its version line.
    pub fn probe(&self) -> Result<String> {
        let output = Command::new(&self.tesseract_exe)
            .arg("--version")
            .output()
            .map_err(|e| {
                Error::OcrError(format!(
                    "Could not run '{}': {}. Is Tesseract installed?",
                    self.tesseract_exe, e
                ))
            })?;

        if !output.status.success() {
            return Err(Error::OcrError(format!(
                "'{} --version' exited with {}",
                self.tesseract_exe, output.status
            )));
        }

        // Tesseract prints its version to stderr on some builds
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).to_string()
        };
        Ok(text.lines().next().unwrap_or("").trim().to_string())
    }

    /// Run OCR on one embedded image, returning its trimmed text.
    ///
    /// Returns `None` when the image yields no text or cannot be processed;
    /// failures are logged as warnings and never abort extraction.
    pub fn recognize(&self, bytes: &[u8], part_name: &str) -> Option<String> {
        let input = match self.prepare_input(bytes) {
            Ok(input) => input,
            Err(e) => {
                log::warn!("Could not process image '{}': {}", part_name, e);
                return None;
            }
        };

        match self.run_tesseract(input.path().as_os_str()) {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                log::warn!("OCR failed for image '{}': {}", part_name, e);
                None
            }
        }
    }

    /// Write image bytes to a temp file Tesseract can read.
    ///
    /// Native formats pass through byte-for-byte; anything else must decode
    /// with the `image` crate and is re-encoded as PNG.
    fn prepare_input(&self, bytes: &[u8]) -> Result<NamedTempFile> {
        let format = sniff_format(bytes);

        if format.is_tesseract_native() {
            let mut file = tempfile::Builder::new()
                .prefix("deckscan-ocr-")
                .suffix(format.extension())
                .tempfile()?;
            file.write_all(bytes)?;
            file.flush()?;
            return Ok(file);
        }

        // GIF, WebP, or unrecognized: attempt a decode and re-encode to PNG
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| Error::OcrError(format!("undecodable image ({:?}): {}", format, e)))?;

        let file = tempfile::Builder::new()
            .prefix("deckscan-ocr-")
            .suffix(".png")
            .tempfile()?;
        decoded
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|e| Error::OcrError(format!("PNG re-encode failed: {}", e)))?;
        Ok(file)
    }

    /// Invoke `tesseract <file> stdout -l <lang>` with a kill-on-timeout wait.
    fn run_tesseract(&self, input: &std::ffi::OsStr) -> Result<String> {
        let mut cmd = Command::new(&self.tesseract_exe);
        cmd.arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::OcrError(format!("spawning '{}': {}", self.tesseract_exe, e)))?;

        let output = if self.timeout.is_zero() {
            child
                .wait_with_output()
                .map_err(|e| Error::OcrError(format!("waiting for tesseract: {}", e)))?
        } else {
            wait_with_timeout(&mut child, self.timeout)?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::OcrError(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Sniff the image format from magic bytes.
fn sniff_format(bytes: &[u8]) -> SniffedFormat {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        SniffedFormat::Png
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        SniffedFormat::Jpeg
    } else if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00])
        || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        SniffedFormat::Tiff
    } else if bytes.starts_with(b"BM") {
        SniffedFormat::Bmp
    } else if bytes.starts_with(b"GIF8") {
        SniffedFormat::Gif
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        SniffedFormat::WebP
    } else {
        SniffedFormat::Unknown
    }
}

/// Wait for a child process, draining its pipes, killing it on timeout.
///
/// The pipes are drained on threads so a chatty child can't deadlock on a
/// full pipe buffer while we poll.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let join = |handle: std::thread::JoinHandle<std::io::Result<Vec<u8>>>| -> Result<Vec<u8>> {
        handle
            .join()
            .map_err(|_| Error::OcrError("pipe reader thread panicked".to_string()))?
            .map_err(Error::from)
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| Error::OcrError(format!("try_wait: {}", e)))?
        {
            let stdout = join(stdout_thread)?;
            let stderr = join(stderr_thread)?;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            let _ = join(stdout_thread);
            let _ = join(stderr_thread);
            return Err(Error::OcrError(format!(
                "tesseract exceeded timeout ({:?})",
                timeout
            )));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_png() {
        assert_eq!(
            sniff_format(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            SniffedFormat::Png
        );
    }

    #[test]
    fn test_sniff_jpeg() {
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0]), SniffedFormat::Jpeg);
    }

    #[test]
    fn test_sniff_tiff_both_byte_orders() {
        assert_eq!(
            sniff_format(&[0x49, 0x49, 0x2A, 0x00]),
            SniffedFormat::Tiff
        );
        assert_eq!(
            sniff_format(&[0x4D, 0x4D, 0x00, 0x2A]),
            SniffedFormat::Tiff
        );
    }

    #[test]
    fn test_sniff_gif_and_webp() {
        assert_eq!(sniff_format(b"GIF89a..."), SniffedFormat::Gif);
        assert_eq!(sniff_format(b"RIFF\x00\x00\x00\x00WEBPVP8 "), SniffedFormat::WebP);
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(sniff_format(b"\x01\x02\x03\x04"), SniffedFormat::Unknown);
        assert_eq!(sniff_format(b""), SniffedFormat::Unknown);
    }

    #[test]
    fn test_native_formats() {
        assert!(SniffedFormat::Png.is_tesseract_native());
        assert!(SniffedFormat::Jpeg.is_tesseract_native());
        assert!(SniffedFormat::Tiff.is_tesseract_native());
        assert!(SniffedFormat::Bmp.is_tesseract_native());
        assert!(!SniffedFormat::Gif.is_tesseract_native());
        assert!(!SniffedFormat::Unknown.is_tesseract_native());
    }

    #[test]
    fn test_prepare_input_native_passthrough() {
        let engine = OcrEngine::new();
        let bytes = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x42];
        let file = engine.prepare_input(&bytes).unwrap();

        assert!(file.path().to_string_lossy().ends_with(".png"));
        assert_eq!(std::fs::read(file.path()).unwrap(), bytes);
    }

    #[test]
    fn test_prepare_input_reencodes_decodable() {
        let engine = OcrEngine::new();

        // Encode a small image to BMP... which is native, so use the image
        // crate to produce a GIF that must go through the re-encode path.
        let img = image::DynamicImage::new_rgb8(4, 4);
        let mut gif_bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut gif_bytes), ImageFormat::Gif)
            .unwrap();

        let file = engine.prepare_input(&gif_bytes).unwrap();
        assert!(file.path().to_string_lossy().ends_with(".png"));
        // Output is a valid PNG
        assert_eq!(
            sniff_format(&std::fs::read(file.path()).unwrap()),
            SniffedFormat::Png
        );
    }

    #[test]
    fn test_recognize_undecodable_returns_none() {
        let engine = OcrEngine::new();
        // EMF-like garbage: unknown magic, undecodable
        assert_eq!(engine.recognize(b"\x01\x00\x00\x00junk", "ppt/media/image9.emf"), None);
    }

    #[test]
    fn test_builder_settings() {
        let engine = OcrEngine::new()
            .with_executable("/opt/tesseract/bin/tesseract")
            .with_language("deu")
            .with_timeout_seconds(5);

        assert_eq!(engine.tesseract_exe, "/opt/tesseract/bin/tesseract");
        assert_eq!(engine.language, "deu");
        assert_eq!(engine.timeout, Duration::from_secs(5));
    }
}
