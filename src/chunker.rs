//! Troceado de documentos en ventanas de tokens con solape.
//!
//! Un token es una palabra separada por espacios en blanco. Los chunks unen
//! sus tokens con un único espacio, así que al quitar el solape y concatenar
//! se recupera el texto original salvo por la normalización de espacios.

use crate::config::ChunkConfig;
use crate::models::{Chunk, Document};

#[derive(Debug, Clone, Copy, Default)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Secuencia perezosa y ordenada de chunks de `document`.
    ///
    /// Un documento vacío no produce chunks; uno más corto que `chunk_size`
    /// produce exactamente uno, sin solape.
    pub fn chunks<'a>(&self, document: &'a Document) -> DocumentChunks<'a> {
        DocumentChunks {
            document,
            tokens: document.text.split_whitespace().collect(),
            config: self.config,
            start: 0,
            index: 0,
            done: false,
        }
    }
}

/// Iterador devuelto por [`Chunker::chunks`].
pub struct DocumentChunks<'a> {
    document: &'a Document,
    tokens: Vec<&'a str>,
    config: ChunkConfig,
    start: usize,
    index: usize,
    done: bool,
}

impl Iterator for DocumentChunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done || self.start >= self.tokens.len() {
            return None;
        }

        let end = (self.start + self.config.chunk_size()).min(self.tokens.len());
        let window = &self.tokens[self.start..end];
        let overlap_tokens = if self.index == 0 { 0 } else { self.config.chunk_overlap() };

        let chunk = Chunk {
            id: format!("{}#{}", self.document.metadata.source_filename, self.index),
            index: self.index,
            start_token: self.start,
            tokens: window.len(),
            overlap_tokens,
            text: window.join(" "),
            metadata: self.document.metadata.clone(),
        };

        if end == self.tokens.len() {
            self.done = true;
        } else {
            self.start += self.config.stride();
        }
        self.index += 1;

        Some(chunk)
    }
}
