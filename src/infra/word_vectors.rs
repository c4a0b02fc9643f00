// ============================================================
// Layer 6 — Pretrained Word Vectors
// ============================================================
// Loads GloVe-style text embeddings:
//
//   the 0.418 0.24968 -0.41242 ...
//   cat 0.45281 -0.50108 -0.53714 ...
//
// one word per line followed by its components. Every line must
// have the same number of components as the first one.

use anyhow::{bail, Context, Result};
use std::{collections::HashMap, fs, path::Path};

#[derive(Debug, Clone)]
pub struct WordVectors {
    dim:     usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl WordVectors {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read word vectors '{}'", path.display()))?;
        let vectors = Self::parse(&text)?;
        tracing::info!("Loaded {} word vectors (dim={})", vectors.len(), vectors.dim);
        Ok(vectors)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut dim = 0usize;
        let mut vectors = HashMap::new();

        for (line_no, line) in text.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };

            let values = parts
                .map(str::parse::<f32>)
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Bad number on line {}", line_no + 1))?;

            if dim == 0 {
                dim = values.len();
            }
            if values.is_empty() || values.len() != dim {
                bail!("Line {} has {} components, expected {}", line_no + 1, values.len(), dim);
            }
            vectors.insert(word.to_string(), values);
        }

        Ok(Self { dim, vectors })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(Vec::as_slice)
    }

    /// Look up each word (lowercased); returns the words that were found
    /// and their vectors flattened row-major `[found, dim]`.
    pub fn lookup<'a>(&self, words: &[&'a str]) -> (Vec<&'a str>, Vec<f32>) {
        let mut found = Vec::new();
        let mut matrix = Vec::new();
        for &word in words {
            match self.get(&word.to_lowercase()) {
                Some(v) => {
                    found.push(word);
                    matrix.extend_from_slice(v);
                }
                None => tracing::warn!("No vector for '{}', skipping", word),
            }
        }
        (found, matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOVE: &str = "the 0.1 0.2 0.3\ncat 1.0 0.0 -1.0\n\nsat 0.5 0.5 0.5\n";

    #[test]
    fn test_parse_glove_lines() {
        let wv = WordVectors::parse(GLOVE).unwrap();
        assert_eq!(wv.dim(), 3);
        assert_eq!(wv.len(), 3);
        assert_eq!(wv.get("cat"), Some(&[1.0, 0.0, -1.0][..]));
    }

    #[test]
    fn test_ragged_lines_rejected() {
        assert!(WordVectors::parse("a 1 2 3\nb 1 2").is_err());
        assert!(WordVectors::parse("a 1 x").is_err());
    }

    #[test]
    fn test_lookup_skips_unknown_words() {
        let wv = WordVectors::parse(GLOVE).unwrap();
        let (found, matrix) = wv.lookup(&["The", "dog", "sat"]);
        assert_eq!(found, vec!["The", "sat"]);
        assert_eq!(matrix, vec![0.1, 0.2, 0.3, 0.5, 0.5, 0.5]);
    }
}
