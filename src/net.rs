//! Wire format: one JSON object per connection, newline terminated.
//!
//! There is no length prefix. The reader keeps pulling bytes until the JSON
//! parser sees a complete object, so the object itself marks the frame end.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::CodecError;
use crate::types::Message;

/// Upper bound on one encoded message, newline included. Enforced on both
/// ends: [`encode`] refuses to produce a larger frame and [`read_message`]
/// stops reading past it.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

const READ_CHUNK: usize = 1024;

/// Serialize `message` to its wire form (JSON followed by `\n`).
///
/// Fails with [`CodecError::TooLarge`] when the frame would not fit in
/// [`MAX_MESSAGE_BYTES`], since no receiver would accept it.
pub fn encode(message: &Message) -> Result<Vec<u8>, CodecError> {
    let mut encoded = serde_json::to_vec(message).map_err(CodecError::Malformed)?;
    encoded.push(b'\n');
    if encoded.len() > MAX_MESSAGE_BYTES {
        return Err(CodecError::TooLarge {
            limit: MAX_MESSAGE_BYTES,
        });
    }
    Ok(encoded)
}

/// Decode the first message in `bytes`.
///
/// Returns [`CodecError::Truncated`] when the buffer holds only a prefix of
/// a message (or nothing but whitespace) and [`CodecError::Malformed`] when
/// it can never become one. Bytes after the first object are ignored.
pub fn decode(bytes: &[u8]) -> Result<Message, CodecError> {
    let mut stream = serde_json::Deserializer::from_slice(bytes).into_iter::<Message>();
    match stream.next() {
        Some(Ok(message)) => Ok(message),
        Some(Err(err)) if err.is_eof() => Err(CodecError::Truncated),
        Some(Err(err)) => Err(CodecError::Malformed(err)),
        None => Err(CodecError::Truncated),
    }
}

/// Read exactly one message from `reader`.
///
/// Stops reading as soon as a complete object has arrived, so a sender that
/// keeps its half open after writing does not stall the receiver.
pub async fn read_message<R>(reader: &mut R) -> Result<Message, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            // Whatever is buffered is all we will ever get.
            return decode(&buffer);
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.len() > MAX_MESSAGE_BYTES {
            return Err(CodecError::TooLarge {
                limit: MAX_MESSAGE_BYTES,
            });
        }
        match decode(&buffer) {
            Err(CodecError::Truncated) => continue,
            result => return result,
        }
    }
}

/// Write one encoded message and flush it.
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
{
    let encoded = encode(message)?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}
