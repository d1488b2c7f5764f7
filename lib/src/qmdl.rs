//! Qualcomm Mobile Diagnostic Log (QMDL) files are just concatenated HDLC
//! encapsulated diag frames. QmdlReader splits a QMDL byte stream back into
//! those frames, leaving decapsulation to the caller.

use crate::hdlc::MESSAGE_TERMINATOR;

use futures::TryStream;
use log::error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

pub struct QmdlReader<T>
where
    T: AsyncRead,
{
    reader: BufReader<T>,
    bytes_read: usize,
    max_bytes: Option<usize>,
}

impl<T> QmdlReader<T>
where
    T: AsyncRead + Unpin,
{
    pub fn new(reader: T, max_bytes: Option<usize>) -> Self {
        QmdlReader {
            reader: BufReader::new(reader),
            bytes_read: 0,
            max_bytes,
        }
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn as_stream(&mut self) -> impl TryStream<Ok = Vec<u8>, Error = std::io::Error> + '_ {
        futures::stream::try_unfold(self, |reader| async {
            let maybe_frame = reader.get_next_frame().await?;
            match maybe_frame {
                Some(frame) => Ok(Some((frame, reader))),
                None => Ok(None),
            }
        })
    }

    /// Returns the next frame including its terminator. The last frame of a
    /// truncated file may lack one.
    pub async fn get_next_frame(&mut self) -> Result<Option<Vec<u8>>, std::io::Error> {
        if let Some(max_bytes) = self.max_bytes {
            if self.bytes_read >= max_bytes {
                if self.bytes_read > max_bytes {
                    error!(
                        "warning: {} bytes read, but max_bytes was {}",
                        self.bytes_read, max_bytes
                    );
                }
                return Ok(None);
            }
        }

        let mut buf = Vec::new();
        let bytes_read = self.reader.read_until(MESSAGE_TERMINATOR, &mut buf).await?;
        if bytes_read == 0 {
            return Ok(None);
        }
        self.bytes_read += bytes_read;
        Ok(Some(buf))
    }
}
