use std::ops::Range;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::types::{PartPlan, PlannedPart, TransferRequest};
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Upper bound for the up-front buffer reservation; the declared size is
/// caller-supplied and not trusted for allocation.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes SHA-256 of `data` and returns it base64-encoded (standard
/// alphabet, padded).
///
/// This is the form S3-compatible checksum headers expect, so it keeps the
/// `=` padding that URL-safe encodings elsewhere strip.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Buffering
// ---------------------------------------------------------------------------

/// Drains `source` into memory and checks the result against `expected_size`.
///
/// Nothing is returned unless the source reached EOF with exactly the
/// expected number of bytes.
pub async fn read_to_buffer<R>(source: &mut R, expected_size: u64) -> Result<Bytes, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let capacity = expected_size.min(MAX_PREALLOCATION) as usize;
    let mut buf = Vec::with_capacity(capacity);
    source.read_to_end(&mut buf).await?;

    if buf.len() as u64 != expected_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "source yielded {} bytes, declared size is {expected_size}",
                buf.len()
            ),
        )
        .into());
    }

    Ok(Bytes::from(buf))
}

/// Materializes the request's byte source.
pub async fn prepare(request: &mut TransferRequest) -> Result<Bytes, TransferError> {
    let size = request.size;
    read_to_buffer(&mut request.source, size).await
}

// ---------------------------------------------------------------------------
// Part planning
// ---------------------------------------------------------------------------

/// Byte ranges of the parts for `total_size` bytes split at `chunk_size`.
///
/// Always yields `total_size / chunk_size + 1` ranges. The last range ends at
/// `total_size` and may be empty (empty input, or an exact multiple of the
/// chunk size).
pub fn part_ranges(total_size: u64, chunk_size: u64) -> impl Iterator<Item = Range<u64>> {
    let chunk_size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE as u64
    } else {
        chunk_size
    };
    let count = total_size / chunk_size + 1;
    (0..count).map(move |i| {
        let start = i * chunk_size;
        let end = (start + chunk_size).min(total_size);
        start..end
    })
}

/// Splits `content` into ordered parts, hashing each slice independently.
///
/// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (10 MiB) is used.
pub fn plan_parts(content: &[u8], chunk_size: usize) -> PartPlan {
    let total_size = content.len() as u64;
    let parts = part_ranges(total_size, chunk_size as u64)
        .enumerate()
        .map(|(i, range)| {
            let slice = &content[range.start as usize..range.end as usize];
            PlannedPart {
                number: i as u32 + 1,
                chunk_start: range.start,
                chunk_end: range.end,
                checksum: checksum_bytes(slice),
            }
        })
        .collect();
    PartPlan::new(parts, total_size)
}
