use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{NodeError, Result};

/// Text recognized in one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
}

/// The OCR step run on each reassembled image.
///
/// Calls fail independently; a failure affects only that image.
pub trait Decoder: Send {
    fn decode(&mut self, image: &[u8]) -> Result<Decoded>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn decode(&mut self, image: &[u8]) -> Result<Decoded> {
        (**self).decode(image)
    }
}

/// Decoder that recognizes nothing. Records still carry the identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDecoder;

impl Decoder for NullDecoder {
    fn decode(&mut self, _image: &[u8]) -> Result<Decoded> {
        Ok(Decoded::default())
    }
}

/// Runs an external OCR program per image: image bytes on stdin, text on stdout.
///
/// e.g. `tesseract stdin stdout -l chi_sim+eng`.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: String,
    args: Vec<String>,
}

impl CommandDecoder {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line.
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| NodeError::Decode("empty decoder command".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Decoder for CommandDecoder {
    fn decode(&mut self, image: &[u8]) -> Result<Decoded> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| NodeError::Decode(format!("cannot start {}: {err}", self.program)))?;

        // stdin is fed from its own thread while stdout drains, so a decoder
        // that writes before it has read the whole image cannot stall on a full pipe.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            if let Some(mut stdin) = stdin {
                scope.spawn(move || {
                    // A decoder that exits without reading everything is judged by its status.
                    if let Err(err) = stdin.write_all(image) {
                        debug!(error = %err, "decoder closed stdin early");
                    }
                });
            }
            child.wait_with_output()
        })
        .map_err(|err| NodeError::Decode(format!("{} failed: {err}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NodeError::Decode(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(Decoded {
            text: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_decoder_returns_empty_text() {
        let decoded = NullDecoder.decode(b"image").unwrap();
        assert!(decoded.text.is_empty());
    }

    #[test]
    fn parse_splits_program_and_args() {
        let decoder = CommandDecoder::parse("tesseract stdin stdout -l eng").unwrap();
        assert_eq!(decoder.program(), "tesseract");
        assert_eq!(decoder.args, vec!["stdin", "stdout", "-l", "eng"]);
    }

    #[test]
    fn parse_rejects_empty_command() {
        assert!(matches!(
            CommandDecoder::parse("   "),
            Err(NodeError::Decode(_))
        ));
    }

    #[test]
    #[cfg(unix)]
    fn command_decoder_pipes_image_through() {
        let mut decoder = CommandDecoder::parse("cat").unwrap();
        let decoded = decoder.decode("13812345678 张三\n".as_bytes()).unwrap();
        assert_eq!(decoded.text, "13812345678 张三");
    }

    #[test]
    #[cfg(unix)]
    fn command_decoder_reports_failure() {
        let mut decoder = CommandDecoder::parse("false").unwrap();
        assert!(matches!(decoder.decode(b"x"), Err(NodeError::Decode(_))));
    }

    #[test]
    #[cfg(unix)]
    fn large_image_does_not_stall_on_full_pipes() {
        let image = vec![b'a'; 1 << 20];
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let mut decoder = CommandDecoder::parse("cat").unwrap();
            let _ = tx.send(decoder.decode(&image));
        });

        let decoded = rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("decoder should finish a 1 MiB image")
            .unwrap();
        assert_eq!(decoded.text.len(), 1 << 20);
        assert!(decoded.text.bytes().all(|b| b == b'a'));
    }

    #[test]
    fn missing_program_is_a_decode_error() {
        let mut decoder = CommandDecoder::parse("scanlink-no-such-ocr-binary").unwrap();
        assert!(matches!(decoder.decode(b"x"), Err(NodeError::Decode(_))));
    }
}
