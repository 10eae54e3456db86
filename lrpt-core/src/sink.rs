//! Sink (C8): writes locked, error-corrected transfer frames to the output
//! stream in strict input order.

use std::io::Write;

use crate::errors::IoError;

/// Writes `frame` to `output`, retrying on partial writes until complete.
pub fn write_frame<W: Write>(output: &mut W, frame: &[u8]) -> Result<(), IoError> {
    let mut written = 0;
    while written < frame.len() {
        let n = output
            .write(&frame[written..])
            .map_err(|source| IoError::WriteFrame { source })?;
        if n == 0 {
            return Err(IoError::WriteFrame {
                source: std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "sink wrote zero bytes",
                ),
            });
        }
        written += n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_full_frame() {
        let mut out = Vec::new();
        write_frame(&mut out, &[1, 2, 3, 4]).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    struct Flaky {
        buf: Vec<u8>,
        first_call: bool,
    }

    impl Write for Flaky {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            if self.first_call && data.len() > 1 {
                self.first_call = false;
                self.buf.extend_from_slice(&data[..1]);
                Ok(1)
            } else {
                self.buf.extend_from_slice(data);
                Ok(data.len())
            }
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn retries_partial_writes() {
        let mut flaky = Flaky {
            buf: Vec::new(),
            first_call: true,
        };
        write_frame(&mut flaky, &[9, 8, 7, 6]).unwrap();
        assert_eq!(flaky.buf, vec![9, 8, 7, 6]);
    }
}
