//! Source Chunker
//!
//! Reads a source file sequentially and yields fixed-size chunks, each
//! sent downstream as one binary WebSocket frame. Every chunk is filled
//! to the configured size unless EOF cuts the final one short.

use bytes::Bytes;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Yields successive chunks of up to `chunk_size` bytes from a reader
pub struct Chunker<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: AsyncRead + Unpin> Chunker<R> {
    /// Create a new chunker over a reader
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self { reader, chunk_size }
    }

    /// Read the next chunk.
    ///
    /// Returns `None` once the reader is exhausted. Short reads are
    /// retried until the chunk is full or EOF is hit, so only the final
    /// chunk can be smaller than `chunk_size`.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;

        while filled < self.chunk_size {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        Ok(Some(Bytes::from(buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn collect_chunks(data: Vec<u8>, chunk_size: usize) -> Vec<Bytes> {
        let mut chunker = Chunker::new(Cursor::new(data), chunk_size);
        let mut chunks = Vec::new();
        while let Some(chunk) = chunker.next_chunk().await.unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn test_empty_source_yields_no_chunks() {
        let chunks = collect_chunks(Vec::new(), 8092).await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_exact_multiple_fills_every_chunk() {
        let data = vec![0xAB; 8092];
        let chunks = collect_chunks(data, 8092).await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 8092);
    }

    #[tokio::test]
    async fn test_one_byte_over_produces_short_tail() {
        let data = vec![0xCD; 8093];
        let chunks = collect_chunks(data, 8092).await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 8092);
        assert_eq!(chunks[1].len(), 1);
    }

    #[tokio::test]
    async fn test_chunk_count_matches_ceiling_division() {
        let n = 20_000;
        let chunk_size = 8092;
        let data: Vec<u8> = (0..n).map(|i| (i % 251) as u8).collect();
        let chunks = collect_chunks(data, chunk_size).await;

        assert_eq!(chunks.len(), (n + chunk_size - 1) / chunk_size);
        let last = chunks.last().unwrap();
        assert_eq!(last.len(), n % chunk_size);
    }

    #[tokio::test]
    async fn test_concatenation_round_trips() {
        let data: Vec<u8> = (0..30_000).map(|i| (i % 251) as u8).collect();
        let chunks = collect_chunks(data.clone(), 8092).await;

        let mut rebuilt = Vec::new();
        for chunk in &chunks {
            rebuilt.extend_from_slice(chunk);
        }
        assert_eq!(rebuilt, data);
    }
}
