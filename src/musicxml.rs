//! # MusicXML Reader
//!
//! Reads a partwise MusicXML document into a [`Score`] with flattened offsets.
//!
//! ## Supported Elements
//! - `work-title` / `movement-title` - score title
//! - `part-list/score-part` - part names
//! - `part` / `measure` - parts and measure boundaries
//! - `attributes` - `divisions`, `key` (`fifths`, optional `mode`), `time`
//! - `note` - `pitch`, `rest`, `chord`, `grace` (skipped), `duration`, `lyric`
//! - `backup` / `forward` - voice cursor moves
//! - `harmony` - `root`, `kind` (with `text`), `offset`; kind `none` is a no-chord annotation
//! - `sound@tempo` - the first tempo found is the piece tempo
//!
//! Everything else is ignored.
//!
//! ## Offsets
//! Positions inside a measure are counted in divisions and turned into beats by
//! [`PartCursor::offset`], the only place where offsets are flattened. A measure
//! ends at the furthest position reached in it; an empty measure takes its
//! length from the time signature.

use crate::error::AnalysisError;
use crate::harmony::{ChordQuality, ChordSymbol};
use crate::keys::Key;
use crate::pitch::{Mode, Pitch, PitchName, Step};
use crate::score::{ChordAnnotation, KeyAnnotation, Part, Score, Syllabic};
use crate::timed::{parse_beat, Beat, Timed};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

type XmlReader<'a> = Reader<&'a [u8]>;

/// Parse a partwise MusicXML document.
pub fn parse_musicxml(xml: &str) -> Result<Score, AnalysisError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut score = Score::default();
    let mut part_names: HashMap<String, String> = HashMap::new();
    let mut measure_offsets: BTreeSet<Beat> = BTreeSet::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"work-title" | b"movement-title" => {
                    let title = read_text(&mut reader)?;
                    if score.title.is_none() && !title.is_empty() {
                        score.title = Some(title);
                    }
                }
                b"score-part" => {
                    let id = attribute(e, b"id").unwrap_or_default();
                    if let Some(name) = parse_score_part(&mut reader)? {
                        part_names.insert(id, name);
                    }
                }
                b"part" => {
                    let id = attribute(e, b"id")
                        .unwrap_or_else(|| format!("P{}", score.parts.len() + 1));
                    let mut part = Part::new(id);
                    let mut cursor = PartCursor::default();
                    parse_part(&mut reader, &mut part, &mut cursor, &mut score)?;
                    measure_offsets.extend(cursor.measure_starts.iter().copied());
                    score.length = score.length.max(cursor.measure_start);
                    score.parts.push(part);
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
    }

    for part in &mut score.parts {
        part.name = part_names.get(&part.id).cloned();
    }
    score.measure_offsets = measure_offsets.into_iter().collect();
    log::info!(
        "read {} part(s), {} measure(s), {} beat(s)",
        score.parts.len(),
        score.measure_offsets.len(),
        score.length
    );
    Ok(score)
}

/// Reading position inside one part.
#[derive(Debug)]
struct PartCursor {
    /// Divisions per quarter note.
    divisions: Beat,
    measure_start: Beat,
    /// Position inside the current measure, in divisions.
    position: Beat,
    /// Furthest position reached inside the current measure, in divisions.
    furthest: Beat,
    /// Onset of the last non-chord note, for `<chord/>` notes.
    last_onset: Option<Beat>,
    /// Length of a full measure in beats, from the time signature.
    measure_length: Beat,
    measure_starts: Vec<Beat>,
}

impl Default for PartCursor {
    fn default() -> Self {
        Self {
            divisions: Beat::from_integer(1),
            measure_start: Beat::from_integer(0),
            position: Beat::from_integer(0),
            furthest: Beat::from_integer(0),
            last_onset: None,
            measure_length: Beat::from_integer(4),
            measure_starts: Vec::new(),
        }
    }
}

impl PartCursor {
    /// Flattened beat offset of a position (in divisions) in the current measure.
    fn offset(&self, position: Beat) -> Beat {
        self.measure_start + position / self.divisions
    }

    fn advance(&mut self, divisions: Beat) {
        self.position += divisions;
        self.furthest = self.furthest.max(self.position);
    }

    fn back(&mut self, divisions: Beat) {
        self.position = (self.position - divisions).max(Beat::from_integer(0));
    }

    fn begin_measure(&mut self) {
        self.measure_starts.push(self.measure_start);
        self.position = Beat::from_integer(0);
        self.furthest = Beat::from_integer(0);
        self.last_onset = None;
    }

    fn end_measure(&mut self) {
        let length = if self.furthest > Beat::from_integer(0) {
            self.furthest / self.divisions
        } else {
            self.measure_length
        };
        self.measure_start += length;
    }
}

fn parse_score_part(reader: &mut XmlReader) -> Result<Option<String>, AnalysisError> {
    let mut name = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"part-name" => {
                name = Some(read_text(reader)?);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"score-part" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "score-part")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    Ok(name)
}

fn parse_part(
    reader: &mut XmlReader,
    part: &mut Part,
    cursor: &mut PartCursor,
    score: &mut Score,
) -> Result<(), AnalysisError> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"measure" => {
                cursor.begin_measure();
                parse_measure(reader, part, cursor, score)?;
                cursor.end_measure();
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"part" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "part")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    log::debug!(
        "part '{}': {} note event(s), {} annotation(s), {} lyric syllable(s)",
        part.id,
        part.notes.len(),
        part.annotations.len(),
        part.lyrics.len()
    );
    Ok(())
}

fn parse_measure(
    reader: &mut XmlReader,
    part: &mut Part,
    cursor: &mut PartCursor,
    score: &mut Score,
) -> Result<(), AnalysisError> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"attributes" => parse_attributes(reader, cursor, score)?,
                b"note" => {
                    let note = parse_note(reader)?;
                    apply_note(note, part, cursor);
                }
                b"backup" => {
                    let duration = parse_duration_block(reader, "backup")?;
                    cursor.back(duration);
                }
                b"forward" => {
                    let duration = parse_duration_block(reader, "forward")?;
                    cursor.advance(duration);
                }
                b"harmony" => {
                    let (shift, annotation) = parse_harmony(reader)?;
                    let position = (cursor.position + shift).max(Beat::from_integer(0));
                    part.annotations
                        .push(Timed::new(annotation, cursor.offset(position)));
                }
                b"sound" => read_tempo(e, score),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"sound" => read_tempo(e, score),
            Ok(Event::End(ref e)) if e.name().as_ref() == b"measure" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "measure")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    Ok(())
}

fn read_tempo(e: &BytesStart, score: &mut Score) {
    let tempo = attribute(e, b"tempo").and_then(|t| t.trim().parse::<f64>().ok());
    if let Some(tempo) = tempo.filter(|t| t.is_finite() && *t > 0.0) {
        if score.tempo.is_none() {
            log::debug!("tempo {} bpm", tempo);
            score.tempo = Some(tempo);
        }
    }
}

fn parse_attributes(
    reader: &mut XmlReader,
    cursor: &mut PartCursor,
    score: &mut Score,
) -> Result<(), AnalysisError> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"divisions" => {
                    let text = read_text(reader)?;
                    let divisions = number(reader, &text, "divisions")?;
                    if divisions <= Beat::from_integer(0) {
                        return Err(xml_error(reader, "divisions must be positive"));
                    }
                    cursor.divisions = divisions;
                }
                b"key" => {
                    let key = parse_key(reader)?;
                    score.push_key(cursor.offset(cursor.position), key);
                }
                b"time" => {
                    if let Some(length) = parse_time(reader)? {
                        cursor.measure_length = length;
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"attributes" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "attributes")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    Ok(())
}

fn parse_key(reader: &mut XmlReader) -> Result<KeyAnnotation, AnalysisError> {
    let mut fifths: i8 = 0;
    let mut mode: Option<String> = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fifths" => {
                    let text = read_text(reader)?;
                    fifths = text
                        .trim()
                        .parse()
                        .map_err(|_| xml_error(reader, format!("invalid fifths '{}'", text)))?;
                }
                b"mode" => mode = Some(read_text(reader)?),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"key" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "key")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }

    let mode = match mode.as_deref().map(str::trim) {
        Some("major") => Mode::Major,
        Some("minor") => Mode::Minor,
        _ => return Ok(KeyAnnotation::Signature { fifths }),
    };
    let key = Key::from_fifths(fifths, mode);
    Ok(KeyAnnotation::Key {
        tonic: key.tonic,
        mode: key.mode,
    })
}

/// Measure length in beats from `<beats>` and `<beat-type>`.
fn parse_time(reader: &mut XmlReader) -> Result<Option<Beat>, AnalysisError> {
    let mut beats: Option<i64> = None;
    let mut beat_type: Option<i64> = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                // Composite signatures like "3+2" are summed.
                b"beats" => {
                    let text = read_text(reader)?;
                    beats = text
                        .split('+')
                        .map(|b| b.trim().parse::<i64>().ok())
                        .sum::<Option<i64>>();
                }
                b"beat-type" => beat_type = read_text(reader)?.trim().parse().ok(),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"time" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "time")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    Ok(match (beats, beat_type) {
        (Some(beats), Some(beat_type)) if beats > 0 && beat_type > 0 => {
            Some(Beat::new(beats * 4, beat_type))
        }
        _ => None,
    })
}

/// Everything read from one `<note>` element.
#[derive(Debug, Default)]
struct NoteData {
    pitch: Option<Pitch>,
    chord: bool,
    grace: bool,
    duration: Beat,
    lyrics: Vec<LyricData>,
}

#[derive(Debug)]
struct LyricData {
    verse: u32,
    syllabic: Syllabic,
    text: String,
}

fn parse_note(reader: &mut XmlReader) -> Result<NoteData, AnalysisError> {
    let mut note = NoteData::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"pitch" => note.pitch = Some(parse_pitch(reader)?),
                b"duration" => {
                    let text = read_text(reader)?;
                    note.duration = number(reader, &text, "duration")?;
                }
                b"lyric" => {
                    let verse = attribute(e, b"number")
                        .and_then(|n| n.trim().parse().ok())
                        .unwrap_or(1);
                    note.lyrics.push(parse_lyric(reader, verse)?);
                }
                b"chord" => note.chord = true,
                b"grace" => note.grace = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"chord" => note.chord = true,
                b"grace" => note.grace = true,
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"note" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "note")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    Ok(note)
}

fn apply_note(note: NoteData, part: &mut Part, cursor: &mut PartCursor) {
    if note.grace {
        return;
    }

    let onset = if note.chord {
        cursor.last_onset.unwrap_or(cursor.position)
    } else {
        let onset = cursor.position;
        cursor.last_onset = Some(onset);
        cursor.advance(note.duration);
        onset
    };
    let offset = cursor.offset(onset);
    let duration = note.duration / cursor.divisions;

    if let Some(pitch) = note.pitch {
        match part.notes.last_mut() {
            Some(last) if note.chord && last.offset() == offset => {
                if !last.value.pitches.contains(&pitch) {
                    last.value.pitches.push(pitch);
                }
            }
            _ => {
                part.push_note(offset, duration, vec![pitch]);
            }
        }
    }
    for lyric in note.lyrics {
        part.push_lyric(offset, lyric.verse, lyric.syllabic, lyric.text);
    }
}

fn parse_pitch(reader: &mut XmlReader) -> Result<Pitch, AnalysisError> {
    let mut step: Option<Step> = None;
    let mut alter: i8 = 0;
    let mut octave: i8 = 4;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"step" => {
                    let text = read_text(reader)?;
                    step = text.trim().chars().next().and_then(Step::from_char);
                    if step.is_none() {
                        return Err(xml_error(reader, format!("invalid step '{}'", text)));
                    }
                }
                b"alter" => {
                    // Microtonal alterations are rounded to the nearest semitone.
                    let text = read_text(reader)?;
                    let semitones: f64 = text
                        .trim()
                        .parse()
                        .map_err(|_| xml_error(reader, format!("invalid alter '{}'", text)))?;
                    alter = semitones.round() as i8;
                }
                b"octave" => {
                    let text = read_text(reader)?;
                    octave = text
                        .trim()
                        .parse()
                        .map_err(|_| xml_error(reader, format!("invalid octave '{}'", text)))?;
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"pitch" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "pitch")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    let step = step.ok_or_else(|| xml_error(reader, "pitch without step"))?;
    Ok(Pitch::new(step, alter, octave))
}

fn parse_lyric(reader: &mut XmlReader, verse: u32) -> Result<LyricData, AnalysisError> {
    let mut syllabic = Syllabic::Single;
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"syllabic" => {
                    syllabic = Syllabic::parse(&read_text(reader)?).unwrap_or_default();
                }
                // Elided syllables carry several text elements.
                b"text" => text.push_str(&read_text(reader)?),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"lyric" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "lyric")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    Ok(LyricData {
        verse,
        syllabic,
        text,
    })
}

/// Read the `<duration>` of a `<backup>` or `<forward>` element.
fn parse_duration_block(reader: &mut XmlReader, element: &str) -> Result<Beat, AnalysisError> {
    let mut duration = Beat::from_integer(0);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"duration" => {
                let text = read_text(reader)?;
                duration = number(reader, &text, "duration")?;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == element.as_bytes() => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, element)),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    Ok(duration)
}

/// Read a `<harmony>` element: its position shift in divisions and its annotation.
fn parse_harmony(reader: &mut XmlReader) -> Result<(Beat, ChordAnnotation), AnalysisError> {
    let mut root_step: Option<Step> = None;
    let mut root_alter: i8 = 0;
    let mut kind = String::new();
    let mut kind_text: Option<String> = None;
    let mut shift = Beat::from_integer(0);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"root-step" => {
                    root_step = read_text(reader)?.trim().chars().next().and_then(Step::from_char);
                }
                b"root-alter" => {
                    let text = read_text(reader)?;
                    root_alter = text.trim().parse::<f64>().map(|a| a.round() as i8).unwrap_or(0);
                }
                b"kind" => {
                    kind_text = attribute(e, b"text");
                    kind = read_text(reader)?;
                }
                b"offset" => {
                    let text = read_text(reader)?;
                    shift = signed_number(reader, &text, "offset")?;
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"kind" => {
                kind_text = attribute(e, b"text");
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"harmony" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "harmony")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }

    let root = match (kind.trim(), root_step) {
        ("none", _) | (_, None) => {
            return Ok((shift, ChordAnnotation::NoChord(kind_text.unwrap_or_default())));
        }
        (_, Some(step)) => PitchName::new(step, root_alter),
    };
    let quality = ChordQuality::from_musicxml_kind(&kind);
    let mut symbol = ChordSymbol::new(root, quality);
    if let Some(text) = kind_text {
        symbol.text = format!("{}{}", root, text);
    }
    Ok((shift, ChordAnnotation::Chord(symbol)))
}

/// Concatenated text content up to the end of the current element.
fn read_text(reader: &mut XmlReader) -> Result<String, AnalysisError> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let unescaped = e.unescape().map_err(|e| xml_error(reader, e))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => return Err(unexpected_eof(reader, "text")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }
    Ok(text.trim().to_string())
}

fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

fn number(reader: &XmlReader, text: &str, what: &str) -> Result<Beat, AnalysisError> {
    parse_beat(text).ok_or_else(|| xml_error(reader, format!("invalid {} '{}'", what, text)))
}

fn signed_number(reader: &XmlReader, text: &str, what: &str) -> Result<Beat, AnalysisError> {
    match text.trim().strip_prefix('-') {
        Some(magnitude) => number(reader, magnitude, what).map(|n| -n),
        None => number(reader, text, what),
    }
}

fn xml_error(reader: &XmlReader, e: impl Display) -> AnalysisError {
    AnalysisError::MusicXml {
        message: format!("at position {}: {}", reader.buffer_position(), e),
    }
}

fn unexpected_eof(reader: &XmlReader, element: &str) -> AnalysisError {
    xml_error(reader, format!("document ends inside <{}>", element))
}
