//! Construcción del contexto y del prompt final para el modelo.

use crate::models::{ContextBlock, RetrievedChunk};

const ENTRY_SEPARATOR: &str = "\n\n---\n\n";

pub const SYSTEM_PROMPT: &str = "You are a management consultant with expertise in fintech payments. \
You provide clear, strategic, and actionable insights grounded strictly in the provided 10-K filings. \
You will receive information from multiple companies' 10-K filings. \
Base your answer **only on relevant information from these filings**. \
If the question pertains to a specific company, focus only on that company's filings. \
If the question requires comparing multiple companies, use information from each relevant filing. \
Clearly state if information is not available in the filings. \
In the 'See sources' section, only show excerpts that directly support your answer.";

/// Une los chunks recuperados en un único bloque etiquetado, en el orden
/// recibido. No reordena, no deduplica y no trunca: el tamaño ya viene
/// acotado por el cupo por empresa.
pub fn assemble(chunks: &[RetrievedChunk]) -> ContextBlock {
    let entries: Vec<String> = chunks
        .iter()
        .map(|rc| format!("[Company: {}]\n\n{}", rc.company(), rc.chunk.text))
        .collect();
    ContextBlock::new(entries.join(ENTRY_SEPARATOR))
}

/// Prompt completo: instrucciones + contexto + pregunta.
pub fn build_prompt(context: &ContextBlock, question: &str) -> String {
    format!(
        "{}\n\nContext:\n{}\n\nQuestion: {}",
        SYSTEM_PROMPT,
        context.as_str(),
        question
    )
}
