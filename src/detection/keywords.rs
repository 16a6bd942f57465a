//! Keyword presence scanning
//!
//! Several detectors raise confidence when cue words appear ("which",
//! "warning", ...). This scanner runs every keyword's FSM in one pass:
//! - O(1) amortized per byte and keyword
//! - No allocation while scanning
//! - ASCII case-insensitive

/// A keyword with its precomputed fallback table
#[derive(Clone, Debug)]
struct Keyword {
    /// Lowercase keyword bytes
    bytes: Vec<u8>,
    /// For each prefix length, the longest proper prefix that is also a suffix
    fallback: Vec<usize>,
}

impl Keyword {
    fn new(keyword: &str) -> Self {
        let bytes = keyword.to_ascii_lowercase().into_bytes();
        let fallback = fallback_table(&bytes);
        Self { bytes, fallback }
    }

    /// Advance the match position by one byte
    fn advance(&self, mut position: usize, byte: u8) -> usize {
        let byte = byte.to_ascii_lowercase();
        loop {
            if self.bytes.get(position) == Some(&byte) {
                return position + 1;
            }
            if position == 0 {
                return 0;
            }
            position = self.fallback[position - 1];
        }
    }
}

fn fallback_table(bytes: &[u8]) -> Vec<usize> {
    let mut table = vec![0; bytes.len()];
    let mut k = 0;
    for i in 1..bytes.len() {
        while k > 0 && bytes[i] != bytes[k] {
            k = table[k - 1];
        }
        if bytes[i] == bytes[k] {
            k += 1;
        }
        table[i] = k;
    }
    table
}

/// Occurrence of a keyword
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordHit {
    /// Index of the keyword in the set
    pub index: usize,
    /// Byte offset just past the occurrence
    pub end: usize,
}

/// Case-insensitive multi-keyword scanner
#[derive(Clone, Debug)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
}

impl KeywordSet {
    /// Build a scanner from keywords. Empty keywords are ignored.
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .filter(|k| !k.is_empty())
                .map(|k| Keyword::new(k))
                .collect(),
        }
    }

    /// Every occurrence of every keyword, ordered by end offset
    pub fn scan(&self, text: &str) -> Vec<KeywordHit> {
        let mut positions = vec![0usize; self.keywords.len()];
        let mut hits = Vec::new();

        for (offset, &byte) in text.as_bytes().iter().enumerate() {
            for (index, (keyword, position)) in
                self.keywords.iter().zip(positions.iter_mut()).enumerate()
            {
                *position = keyword.advance(*position, byte);
                if *position == keyword.bytes.len() {
                    hits.push(KeywordHit {
                        index,
                        end: offset + 1,
                    });
                    *position = keyword.fallback[*position - 1];
                }
            }
        }

        hits
    }

    /// Whether any keyword occurs in `text`
    pub fn contains_any(&self, text: &str) -> bool {
        !self.scan(text).is_empty()
    }

    /// Number of distinct keywords that occur in `text`
    pub fn distinct_hits(&self, text: &str) -> usize {
        let mut seen = vec![false; self.keywords.len()];
        for hit in self.scan(text) {
            seen[hit.index] = true;
        }
        seen.into_iter().filter(|s| *s).count()
    }

    /// Number of keywords in the set
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Whether the set holds no keywords
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
