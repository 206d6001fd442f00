//! Sentence-window chunking.
//!
//! Text is split into sentences and packed into chunks of at most
//! `chunk_size` characters. Trailing sentences totalling no more than
//! `chunk_overlap` characters are repeated at the start of the next chunk.

use crate::config::ChunkingSettings;
use crate::error::{Result, SyllabusError};
use regex::Regex;

/// Splits text into overlapping sentence windows.
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    boundary: Regex,
    whitespace: Regex,
}

impl SentenceChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SyllabusError::Config("chunk_size must be positive".to_string()));
        }

        let boundary = Regex::new(r"[.!?]+\s+")
            .map_err(|e| SyllabusError::Ingest(format!("Invalid sentence pattern: {}", e)))?;
        let whitespace = Regex::new(r"\s+")
            .map_err(|e| SyllabusError::Ingest(format!("Invalid whitespace pattern: {}", e)))?;

        Ok(Self {
            chunk_size,
            chunk_overlap,
            boundary,
            whitespace,
        })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Split normalized text into sentences, keeping end punctuation.
    pub fn sentences(&self, text: &str) -> Vec<String> {
        let text = self.whitespace.replace_all(text.trim(), " ");
        let mut sentences = Vec::new();
        let mut start = 0;

        for m in self.boundary.find_iter(&text) {
            let end = m.start() + m.as_str().trim_end().len();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = m.end();
        }

        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }
        sentences
    }

    /// Chunk text into sentence windows.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let sentences = self.sentences(text);
        let mut chunks = Vec::new();
        let mut i = 0;

        while i < sentences.len() {
            let mut size = 0;
            let mut taken = 0;

            for sentence in &sentences[i..] {
                let separator = usize::from(taken > 0);
                let added = sentence.len() + separator;
                if taken > 0 && size + added > self.chunk_size {
                    break;
                }
                size += added;
                taken += 1;
            }

            chunks.push(sentences[i..i + taken].join(" "));

            if i + taken >= sentences.len() {
                break;
            }

            let overlap = self.overlap_sentences(&sentences[i..i + taken]);
            i = (i + taken - overlap).max(i + 1);
        }

        chunks
    }

    /// Number of trailing sentences that fit in the overlap budget.
    fn overlap_sentences(&self, window: &[String]) -> usize {
        let mut size = 0;
        let mut count = 0;

        for (k, sentence) in window.iter().enumerate().rev() {
            let added = sentence.len() + usize::from(k + 1 < window.len());
            if size + added > self.chunk_overlap {
                break;
            }
            size += added;
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_split_keeps_punctuation() {
        let chunker = SentenceChunker::new(800, 100).unwrap();
        let sentences = chunker.sentences("First one.  Second?\nThird!   trailing words");
        assert_eq!(sentences, vec!["First one.", "Second?", "Third!", "trailing words"]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = SentenceChunker::new(800, 100).unwrap();
        let chunks = chunker.chunk("One sentence. Another sentence.");
        assert_eq!(chunks, vec!["One sentence. Another sentence."]);
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let chunker = SentenceChunker::new(30, 12).unwrap();
        let chunks = chunker.chunk("Alpha beta one. Gamma two. Delta three. Epsilon four.");

        assert_eq!(
            chunks,
            vec![
                "Alpha beta one. Gamma two.",
                "Gamma two. Delta three.",
                "Delta three. Epsilon four.",
            ]
        );
        assert!(chunks.iter().all(|c| c.len() <= 30));
    }

    #[test]
    fn test_long_sentence_still_advances() {
        let chunker = SentenceChunker::new(10, 50).unwrap();
        let chunks = chunker.chunk("This sentence is far too long. Short.");
        assert_eq!(chunks, vec!["This sentence is far too long.", "Short."]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = SentenceChunker::new(800, 100).unwrap();
        assert!(chunker.chunk("   \n ").is_empty());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(SentenceChunker::new(0, 0).is_err());
    }
}
