//! Lyric extraction.
//!
//! Syllables found under notes are grouped back into the words they came from.
//! A word is timed at its first syllable, and each syllable keeps its own offset
//! so a renderer can highlight a word syllable by syllable.
//!
//! Grouping follows the MusicXML `syllabic` markers, per part and per verse:
//! `begin` opens a word, `middle` continues it, `end` closes it and `single` is a
//! word on its own.

use crate::score::{LyricToken, Score, Syllabic};
use crate::timed::Timed;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One syllable of a lyric word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Syllable {
    pub text: String,
    pub syllabic: Syllabic,
}

/// A whole word: its syllables, each with its own timing.
pub type Lyric = Vec<Timed<Syllable>>;

/// Extract every lyric word of the score, ordered by the offset of the word.
pub fn extract_lyrics(score: &Score) -> Vec<Timed<Lyric>> {
    let mut words: Vec<Timed<Lyric>> = Vec::new();

    for part in &score.parts {
        let mut verses: BTreeMap<u32, Vec<&Timed<LyricToken>>> = BTreeMap::new();
        for token in &part.lyrics {
            verses.entry(token.value.verse).or_default().push(token);
        }

        for (verse, mut tokens) in verses {
            tokens.sort_by_key(|t| t.offset());
            let mut open: Option<Lyric> = None;
            for token in tokens {
                let syllable = Timed {
                    value: Syllable {
                        text: token.value.text.clone(),
                        syllabic: token.value.syllabic,
                    },
                    timing: token.timing,
                };
                match token.value.syllabic {
                    Syllabic::Single => {
                        close_word(&mut open, &mut words);
                        push_word(vec![syllable], &mut words);
                    }
                    Syllabic::Begin => {
                        close_word(&mut open, &mut words);
                        open = Some(vec![syllable]);
                    }
                    Syllabic::Middle | Syllabic::End => {
                        let word = open.get_or_insert_with(|| {
                            log::warn!(
                                "part '{}' verse {}: syllable '{}' at beat {} continues no word",
                                part.id,
                                verse,
                                token.value.text,
                                token.offset()
                            );
                            Vec::new()
                        });
                        word.push(syllable);
                        if token.value.syllabic == Syllabic::End {
                            close_word(&mut open, &mut words);
                        }
                    }
                }
            }
            close_word(&mut open, &mut words);
        }
    }

    words.sort_by_key(|w| w.offset());
    log::debug!("extracted {} lyric word(s)", words.len());
    words
}

fn close_word(open: &mut Option<Lyric>, words: &mut Vec<Timed<Lyric>>) {
    if let Some(word) = open.take() {
        push_word(word, words);
    }
}

fn push_word(word: Lyric, words: &mut Vec<Timed<Lyric>>) {
    if let Some(first) = word.first() {
        let timing = first.timing;
        words.push(Timed { value: word, timing });
    }
}

/// Full text of a word, syllables joined.
pub fn word_text(word: &Lyric) -> String {
    word.iter().map(|s| s.value.text.as_str()).collect()
}
