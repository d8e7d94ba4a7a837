//! Modelos de dominio: documentos, chunks y resultados de recuperación.

use serde::{Deserialize, Serialize};

/// Metadatos de un documento fuente. Cada chunk recibe una copia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_filename: String,
    pub company: String,
}

/// Un fichero ya parseado. Inmutable tras su creación.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Trozo contiguo del texto de un documento, tal como se guarda en el índice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{source_filename}#{index}`; único dentro de un índice.
    pub id: String,
    /// Posición del chunk dentro de su documento.
    pub index: usize,
    /// Primer token del chunk dentro del documento.
    pub start_token: usize,
    /// Tokens de `text`.
    pub tokens: usize,
    /// Tokens compartidos con el chunk anterior del mismo documento.
    pub overlap_tokens: usize,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Chunk {
    pub fn company(&self) -> &str {
        &self.metadata.company
    }
}

/// Un chunk devuelto por una búsqueda filtrada por empresa.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// Similitud coseno con la consulta (mayor es mejor).
    pub score: f64,
    /// Posición dentro de los resultados de su empresa, empezando en 0.
    pub rank: usize,
}

impl RetrievedChunk {
    pub fn company(&self) -> &str {
        self.chunk.company()
    }

    /// Primeros `max_chars` caracteres del texto, para mostrar como fuente.
    pub fn preview(&self, max_chars: usize) -> &str {
        let text = &self.chunk.text;
        match text.char_indices().nth(max_chars) {
            Some((cut, _)) => &text[..cut],
            None => text,
        }
    }
}

/// Contexto etiquetado que se entrega al modelo junto a la pregunta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBlock(String);

impl ContextBlock {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resultado de una consulta: respuesta y fuentes usadas, en orden.
#[derive(Debug, Clone)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk {
                id: "pypl-10k.pdf#0".to_string(),
                index: 0,
                start_token: 0,
                tokens: 1,
                overlap_tokens: 0,
                text: text.to_string(),
                metadata: DocumentMetadata {
                    source_filename: "pypl-10k.pdf".to_string(),
                    company: "PayPal".to_string(),
                },
            },
            score: 1.0,
            rank: 0,
        }
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let chunk = retrieved("año fiscal");
        assert_eq!(chunk.preview(3), "año");
        assert_eq!(chunk.preview(500), "año fiscal");
    }
}
