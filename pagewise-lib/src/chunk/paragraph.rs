use crate::chunk::{char_len, Chunk, ChunkSink, Chunker, Document};

/// Paragraph chunker - packs blank-line separated paragraphs
///
/// Good for: prose, reports, anything extracted with paragraph breaks intact
///
/// Paragraphs are joined with single spaces until the next one would push the
/// buffer past `max_size` characters. The closed buffer's last
/// `overlap_words` words are then repeated at the start of the next chunk.
/// A single paragraph longer than `max_size` is kept whole.
pub struct ParagraphChunker {
    pub max_size: usize,
    pub overlap_words: usize,
}

impl Chunker for ParagraphChunker {
    fn name(&self) -> &str {
        "paragraph"
    }

    fn chunk(&self, content: &str, doc: &Document) -> Vec<Chunk> {
        pack_paragraphs(content, doc, self.max_size, self.overlap_words)
    }
}

pub(crate) fn pack_paragraphs(
    content: &str,
    doc: &Document,
    max_size: usize,
    overlap_words: usize,
) -> Vec<Chunk> {
    let mut sink = ChunkSink::new(doc);
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for p in Paragraphs::from(content) {
        let p_len = char_len(p);

        if buffer_len + p_len <= max_size {
            if !buffer.is_empty() {
                buffer.push(' ');
                buffer_len += 1;
            }
            buffer.push_str(p);
            buffer_len += p_len;
            continue;
        }

        if buffer.is_empty() {
            // oversized paragraph, accepted as is
            buffer = p.to_owned();
        } else {
            let tail = trailing_words(&buffer, overlap_words);
            sink.push(&buffer);
            buffer = if tail.is_empty() {
                p.to_owned()
            } else {
                format!("{tail} {p}")
            };
        }
        buffer_len = char_len(&buffer);
    }

    // flush buffer chunk
    if !buffer.is_empty() {
        sink.push(&buffer);
    }

    sink.finish()
}

/// Last `n` whitespace-separated words of `s`, joined by single spaces.
fn trailing_words(s: &str, n: usize) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    words[words.len().saturating_sub(n)..].join(" ")
}

/// Iterator over trimmed, non-empty paragraphs separated by blank lines.
pub(crate) struct Paragraphs<'a> {
    s: &'a str,
}

impl<'a> Paragraphs<'a> {
    pub(crate) fn from(s: &'a str) -> Self {
        Self { s }
    }
}

impl<'a> Iterator for Paragraphs<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        // Find the start of the paragraph.
        loop {
            if self.s.is_empty() {
                return None;
            }
            let (line, rest) = split_first_line(self.s);
            if is_blank(line) {
                // Discard blank line.
                self.s = rest;
            } else {
                break;
            }
        }

        // Find the end of the paragraph.
        let mut end = 0;
        loop {
            let (line, rest) = split_first_line(&self.s[end..]);
            if is_blank(line) {
                // Blank line or end of input: end of paragraph.
                let result = self.s[..end].trim();
                self.s = rest;
                return Some(result);
            }
            end += line.len();
        }
    }
}

fn is_blank(line: &str) -> bool {
    line.chars().all(char::is_whitespace)
}

fn split_first_line(s: &str) -> (&str, &str) {
    let len = match s.find('\n') {
        Some(i) => i + 1,
        None => s.len(),
    };
    s.split_at(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new("doc", "doc.txt")
    }

    fn chunker(max_size: usize, overlap_words: usize) -> ParagraphChunker {
        ParagraphChunker { max_size, overlap_words }
    }

    #[test]
    fn test_single_paragraph() {
        let chunks = chunker(1000, 20).chunk("This is a single paragraph.", &doc());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "This is a single paragraph.");
        assert_eq!(chunks[0].id, "doc_0");
    }

    #[test]
    fn test_small_paragraphs_packed_together() {
        let content = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunker(1000, 20).chunk(content, &doc());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "First paragraph. Second paragraph. Third paragraph.");
    }

    #[test]
    fn test_split_carries_trailing_words() {
        let content = "Paragraph one.\n\nParagraph two is much longer than sixty characters to force a split eventually maybe.";
        let chunks = chunker(50, 20).chunk(content, &doc());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Paragraph one.");
        assert!(chunks[1].text.starts_with("Paragraph one. Paragraph two"));
    }

    #[test]
    fn test_overlap_limited_to_word_count() {
        let content = "alpha beta gamma delta\n\nepsilon zeta eta theta";
        let chunks = chunker(25, 2).chunk(content, &doc());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "gamma delta epsilon zeta eta theta");
    }

    #[test]
    fn test_zero_overlap_words() {
        let content = "alpha beta gamma delta\n\nepsilon zeta eta theta";
        let chunks = chunker(25, 0).chunk(content, &doc());

        assert_eq!(chunks[1].text, "epsilon zeta eta theta");
    }

    #[test]
    fn test_oversized_paragraph_kept_whole() {
        let long = "word ".repeat(40);
        let chunks = chunker(50, 5).chunk(&long, &doc());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, long.trim());
    }

    #[test]
    fn test_reconstructs_paragraphs_in_order() {
        let paras: Vec<String> = (0..12).map(|i| format!("Paragraph number {i} has a few words.")).collect();
        let content = paras.join("\n\n");
        let chunks = chunker(120, 0).chunk(&content, &doc());

        assert!(chunks.len() > 1);
        let rebuilt: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rebuilt.join(" "), paras.join(" "));
    }

    #[test]
    fn test_indexes_contiguous() {
        let content = (0..30).map(|i| format!("Sentence {i} of the text.")).collect::<Vec<_>>().join("\n\n");
        let chunks = chunker(80, 3).chunk(&content, &doc());

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.id, format!("doc_{i}"));
        }
    }

    #[test]
    fn test_empty_content() {
        assert!(chunker(1000, 20).chunk("", &doc()).is_empty());
    }

    #[test]
    fn test_whitespace_only() {
        assert!(chunker(1000, 20).chunk("\n\n\n   \n\n", &doc()).is_empty());
    }

    #[test]
    fn test_paragraphs_iterator() {
        let content = "Para one.\nstill one.\n\n  \t \nPara two.\n\n\n\nPara three.  ";
        let paras: Vec<_> = Paragraphs::from(content).collect();

        assert_eq!(paras, vec!["Para one.\nstill one.", "Para two.", "Para three."]);
    }

    #[test]
    fn test_budget_counts_chars_not_bytes() {
        // 10 chars, 20 bytes each
        let para = "éééééééééé";
        let content = format!("{para}\n\n{para}");
        let chunks = chunker(21, 0).chunk(&content, &doc());

        assert_eq!(chunks.len(), 1);
    }
}
