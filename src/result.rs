use std::{
    fs::OpenOptions,
    io::{self, BufWriter, Write},
    path::Path,
};

use serde::{Serialize, Serializer};

/// Outcome of one crawl.
///
/// Serializes as `{"wordCounts": {...}, "urlsVisited": n}` with the words in
/// rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    #[serde(serialize_with = "ranked_map")]
    word_counts: Vec<(String, u64)>,
    urls_visited: usize,
}

impl CrawlResult {
    pub fn new(word_counts: Vec<(String, u64)>, urls_visited: usize) -> Self {
        CrawlResult {
            word_counts,
            urls_visited,
        }
    }

    /// The most popular words, most popular first.
    pub fn word_counts(&self) -> &[(String, u64)] {
        &self.word_counts
    }

    /// Number of distinct URLs that were fetched (or attempted).
    pub fn urls_visited(&self) -> usize {
        self.urls_visited
    }

    pub fn write_json<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)
    }

    /// Appends the JSON form to `path`; an existing file is never truncated.
    pub fn write_json_to_path(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        self.write_json(&mut writer)?;
        writer.flush()
    }
}

// a JSON object keeps rank order as long as entries are written one by one
fn ranked_map<S: Serializer>(words: &[(String, u64)], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(words.iter().map(|(word, count)| (word, count)))
}
