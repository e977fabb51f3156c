//! Fixed-size character windows with overlap

/// Text chunker with configurable size and overlap
///
/// Sizes are measured in characters (Unicode scalar values), so a window
/// never splits a code point. Consecutive windows share exactly `overlap`
/// characters and the final window keeps whatever is left, however short.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Characters shared by consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    ///
    /// `chunk_size` is raised to at least 1 and `overlap` is clamped below
    /// `chunk_size` so every window advances.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Window size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into ordered, overlapping windows
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char start, plus the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;
        let step = self.chunk_size - self.overlap;

        let mut chunks = Vec::with_capacity(char_count / step + 1);
        let mut start = 0usize;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            chunks.push(text[boundaries[start]..boundaries[end]].to_string());
            if end == char_count {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Undo `chunk`: drop the overlapping prefix of every window after the first
    pub fn reassemble(&self, chunks: &[String]) -> String {
        let mut text = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                text.push_str(chunk);
            } else {
                text.extend(chunk.chars().skip(self.overlap));
            }
        }
        text
    }
}

/// Split `text` into windows of at most `size` characters overlapping by `overlap`
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    TextChunker::new(size, overlap).chunk(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(chunk_text("", 10, 2).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("Section 302: punishment for murder.", 1000, 200);
        assert_eq!(chunks, vec!["Section 302: punishment for murder.".to_string()]);
    }

    #[test]
    fn test_windows_overlap_and_keep_tail() {
        let chunks = chunk_text("abcdefghij", 4, 1);
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);

        let chunks = chunk_text("abcdefghijk", 4, 1);
        assert_eq!(chunks, vec!["abcd", "defg", "ghij", "jk"]);
    }

    #[test]
    fn test_multibyte_characters_not_split() {
        let text = "धारा ३०२ हत्या";
        let chunks = chunk_text(text, 5, 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 5);
        }
        assert_eq!(TextChunker::new(5, 2).reassemble(&chunks), text);
    }

    #[test]
    fn test_overlap_clamped() {
        let chunker = TextChunker::new(3, 10);
        assert_eq!(chunker.overlap(), 2);
        assert_eq!(chunker.chunk("abcde"), vec!["abc", "bcd", "cde"]);

        let chunker = TextChunker::new(0, 0);
        assert_eq!(chunker.chunk_size(), 1);
    }

    #[test]
    fn test_deterministic() {
        let text = "Section 299. Culpable homicide. Section 300. Murder.";
        assert_eq!(chunk_text(text, 16, 4), chunk_text(text, 16, 4));
    }

    proptest! {
        #[test]
        fn prop_reassembly_reconstructs_text(
            text in "\\PC{0,300}",
            size in 1usize..48,
            overlap in 0usize..48,
        ) {
            let chunker = TextChunker::new(size, overlap);
            let chunks = chunker.chunk(&text);
            prop_assert_eq!(chunker.reassemble(&chunks), text.clone());
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= chunker.chunk_size());
            }
        }
    }
}
