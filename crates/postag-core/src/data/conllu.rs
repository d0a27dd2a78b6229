//! Reader for the CoNLL-U treebank format.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::Sentence;
use crate::error::{Result, TaggerError};

const NUM_COLUMNS: usize = 10;
const FORM: usize = 1;

/// Which CoNLL-U column provides the tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagColumn {
    /// Universal part-of-speech tag (column 4).
    #[default]
    Upos,
    /// Language-specific part-of-speech tag (column 5).
    Xpos,
}

impl TagColumn {
    fn index(self) -> usize {
        match self {
            TagColumn::Upos => 3,
            TagColumn::Xpos => 4,
        }
    }
}

impl std::str::FromStr for TagColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upos" => Ok(TagColumn::Upos),
            "xpos" => Ok(TagColumn::Xpos),
            other => Err(format!("unknown tag column {other:?} (expected upos or xpos)")),
        }
    }
}

/// Load all sentences of a CoNLL-U file.
pub fn read_conllu<P: AsRef<Path>>(path: P, column: TagColumn) -> Result<Vec<Sentence>> {
    let file = File::open(path)?;
    parse_conllu(BufReader::new(file), column)
}

/// Parse CoNLL-U from any buffered reader.
pub fn parse_conllu<R: BufRead>(reader: R, column: TagColumn) -> Result<Vec<Sentence>> {
    let mut sentences = Vec::new();
    let mut words = Vec::new();
    let mut tags = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() {
            if !words.is_empty() {
                sentences.push(Sentence::new(
                    std::mem::take(&mut words),
                    std::mem::take(&mut tags),
                ));
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < NUM_COLUMNS {
            return Err(TaggerError::Conllu {
                line: lineno + 1,
                reason: format!("expected {NUM_COLUMNS} columns, found {}", parts.len()),
            });
        }

        // Multiword-token ranges and empty nodes carry no tag of their own
        let id = parts[0];
        if id.contains('-') || id.contains('.') {
            continue;
        }

        words.push(parts[FORM].to_string());
        tags.push(parts[column.index()].to_string());
    }

    if !words.is_empty() {
        sentences.push(Sentence::new(words, tags));
    }

    Ok(sentences)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sent_id = 1
# text = Del gato.
1-2\tDel\t_\t_\t_\t_\t_\t_\t_\t_
1\tDe\tde\tADP\tsps00\t_\t3\tcase\t_\t_
2\tel\tel\tDET\tda0ms0\t_\t3\tdet\t_\t_
3\tgato\tgato\tNOUN\tncms000\t_\t0\troot\t_\t_
4\t.\t.\tPUNCT\tfp\t_\t3\tpunct\t_\t_

1\tLlueve\tllover\tVERB\tvmip3s0\t_\t0\troot\t_\t_
1.1\t_\t_\t_\t_\t_\t_\t_\t_\t_
";

    #[test]
    fn test_parse_sentences() {
        let sentences = parse_conllu(SAMPLE.as_bytes(), TagColumn::Upos).unwrap();

        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].words, vec!["De", "el", "gato", "."]);
        assert_eq!(sentences[0].tags, vec!["ADP", "DET", "NOUN", "PUNCT"]);
        assert_eq!(sentences[1].words, vec!["Llueve"]);
    }

    #[test]
    fn test_xpos_column() {
        let sentences = parse_conllu(SAMPLE.as_bytes(), TagColumn::Xpos).unwrap();
        assert_eq!(sentences[0].tags[2], "ncms000");
    }

    #[test]
    fn test_short_line_is_error() {
        let bad = "1\tgato\tNOUN\n";
        let err = parse_conllu(bad.as_bytes(), TagColumn::Upos).unwrap_err();
        assert!(matches!(err, TaggerError::Conllu { line: 1, .. }));
    }

    #[test]
    fn test_tag_column_from_str() {
        assert_eq!("UPOS".parse::<TagColumn>().unwrap(), TagColumn::Upos);
        assert_eq!("xpos".parse::<TagColumn>().unwrap(), TagColumn::Xpos);
        assert!("lemma".parse::<TagColumn>().is_err());
    }
}
