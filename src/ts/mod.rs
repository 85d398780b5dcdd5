//! Reader for Qt Linguist `.ts` translation files.
//!
//! The format looks like this:
//!
//! ```xml
//! <TS version="2.1" language="ru_RU">
//! <context>
//!     <name>MainWindow</name>
//!     <message>
//!         <location filename="../src/mainwindow.ui" line="60"/>
//!         <source>&amp;Surface function</source>
//!         <translation>&amp;Поверхность</translation>
//!     </message>
//! </context>
//! </TS>
//! ```
//!
//! Text inside `<source>`, `<comment>` and `<translation>` is kept verbatim
//! (entities unescaped, whitespace untouched). Elements this reader does not
//! know are skipped together with their content.

use crate::errors::{CatalogError, CatalogResult};
use crate::models::{Context, Location, TranslationEntry, TranslationStatus, TsDocument};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Parse a `.ts` document held in memory.
pub fn parse_str(content: &str) -> CatalogResult<TsDocument> {
    parse_reader(content.as_bytes())
}

/// Read and parse a `.ts` file from disk.
pub fn read_file(path: &Path) -> CatalogResult<TsDocument> {
    let file = File::open(path)?;
    let doc = parse_reader(BufReader::new(file))?;
    debug!(
        "Parsed {}: {} context(s), {} message(s)",
        path.display(),
        doc.contexts.len(),
        doc.message_count()
    );
    Ok(doc)
}

pub fn parse_reader<R: BufRead>(input: R) -> CatalogResult<TsDocument> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut parser = TsParser::default();

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(reader.buffer_position() as u64, e))?;
        let position = reader.buffer_position() as u64;

        match event {
            Event::Start(ref e) => parser.open(e, false, position)?,
            Event::Empty(ref e) => {
                if !parser.is_skipping() {
                    parser.open(e, true, position)?;
                    parser.close(e.name().as_ref());
                }
            }
            Event::End(ref e) => parser.close(e.name().as_ref()),
            Event::Text(ref e) => {
                if parser.is_capturing() {
                    let text = e.unescape().map_err(|err| xml_error(position, err))?;
                    parser.push_text(&text);
                }
            }
            Event::CData(ref e) => {
                if parser.is_capturing() {
                    parser.push_text(&String::from_utf8_lossy(e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish()
}

fn xml_error(position: u64, err: impl std::fmt::Display) -> CatalogError {
    CatalogError::Xml {
        position,
        message: err.to_string(),
    }
}

/// Which piece of a message the current text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ContextName,
    Source,
    Comment,
    Translation,
    NumerusForm,
}

#[derive(Debug, Default)]
struct MessageBuilder {
    source: Option<String>,
    comment: Option<String>,
    locations: Vec<Location>,
    translation: String,
    plural_forms: Vec<String>,
    status: TranslationStatus,
    numerus: bool,
}

impl MessageBuilder {
    fn build(self) -> Option<TranslationEntry> {
        let source = self.source?;
        let translation = if self.numerus {
            self.plural_forms.first().cloned().unwrap_or_default()
        } else {
            self.translation
        };
        Some(TranslationEntry {
            source,
            comment: self.comment,
            locations: self.locations,
            translation,
            plural_forms: self.plural_forms,
            status: self.status,
        })
    }
}

#[derive(Debug, Default)]
struct TsParser {
    doc: Option<TsDocument>,
    context: Option<Context>,
    message: Option<MessageBuilder>,
    field: Option<Field>,
    text: String,
    /// Depth inside elements we do not understand
    skip_depth: usize,
    /// Last file/line seen in the current context, for relative `line="+N"` locations
    last_file: Option<String>,
    last_lines: HashMap<String, u32>,
}

impl TsParser {
    fn is_skipping(&self) -> bool {
        self.skip_depth > 0
    }

    fn is_capturing(&self) -> bool {
        !self.is_skipping() && self.field.is_some()
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn open(&mut self, e: &BytesStart, empty: bool, position: u64) -> CatalogResult<()> {
        let name = e.name();
        let name = name.as_ref();

        if self.doc.is_none() {
            if name != b"TS" {
                return Err(CatalogError::NotATsFile(
                    String::from_utf8_lossy(name).into_owned(),
                ));
            }
            self.doc = Some(TsDocument {
                version: attr(e, b"version", position)?,
                language: attr(e, b"language", position)?.filter(|v| !v.is_empty()),
                source_language: attr(e, b"sourcelanguage", position)?.filter(|v| !v.is_empty()),
                contexts: Vec::new(),
            });
            return Ok(());
        }

        if self.is_skipping() {
            self.skip_depth += 1;
            return Ok(());
        }

        match (name, self.field) {
            (b"byte", Some(_)) => {
                if let Some(ch) = attr(e, b"value", position)?.as_deref().and_then(parse_byte_value) {
                    self.text.push(ch);
                }
            }
            (b"numerusform", Some(Field::Translation)) => self.begin_field(Field::NumerusForm),
            (_, Some(_)) => self.skip(empty),
            (b"context", None) if self.context.is_none() => {
                self.context = Some(Context::default());
                self.last_file = None;
                self.last_lines.clear();
            }
            (b"name", None) if self.context.is_some() && self.message.is_none() => {
                self.begin_field(Field::ContextName)
            }
            (b"message", None) if self.context.is_some() && self.message.is_none() => {
                self.message = Some(MessageBuilder {
                    numerus: attr(e, b"numerus", position)?.as_deref() == Some("yes"),
                    ..Default::default()
                });
            }
            (b"location", None) if self.message.is_some() => {
                let location = self.location(
                    attr(e, b"filename", position)?,
                    attr(e, b"line", position)?,
                );
                if let Some(message) = self.message.as_mut() {
                    message.locations.push(location);
                }
            }
            (b"source", None) if self.message.is_some() => self.begin_field(Field::Source),
            (b"comment", None) if self.message.is_some() => self.begin_field(Field::Comment),
            (b"translation", None) if self.message.is_some() => {
                let status = TranslationStatus::from_type_attr(attr(e, b"type", position)?.as_deref());
                if let Some(message) = self.message.as_mut() {
                    message.status = status;
                }
                self.begin_field(Field::Translation);
            }
            _ => self.skip(empty),
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }

        if let Some(field) = self.field {
            let closes_field = matches!(
                (field, name),
                (Field::ContextName, b"name")
                    | (Field::Source, b"source")
                    | (Field::Comment, b"comment")
                    | (Field::Translation, b"translation")
                    | (Field::NumerusForm, b"numerusform")
            );
            if closes_field {
                self.end_field(field);
            }
            return;
        }

        match name {
            b"message" => {
                if let Some(builder) = self.message.take() {
                    match builder.build() {
                        Some(entry) => {
                            if let Some(context) = self.context.as_mut() {
                                context.entries.push(entry);
                            }
                        }
                        None => warn!("Skipping <message> without <source>"),
                    }
                }
            }
            b"context" => {
                if let (Some(context), Some(doc)) = (self.context.take(), self.doc.as_mut()) {
                    doc.contexts.push(context);
                }
            }
            _ => {}
        }
    }

    fn begin_field(&mut self, field: Field) {
        self.field = Some(field);
        self.text.clear();
    }

    fn end_field(&mut self, field: Field) {
        let text = std::mem::take(&mut self.text);
        self.field = match field {
            Field::NumerusForm => Some(Field::Translation),
            _ => None,
        };

        match field {
            Field::ContextName => {
                if let Some(context) = self.context.as_mut() {
                    context.name = text;
                }
            }
            Field::Source => {
                if let Some(message) = self.message.as_mut() {
                    message.source = Some(text);
                }
            }
            Field::Comment => {
                if let Some(message) = self.message.as_mut() {
                    message.comment = Some(text).filter(|c| !c.is_empty());
                }
            }
            Field::Translation => {
                if let Some(message) = self.message.as_mut() {
                    if !message.numerus {
                        message.translation = text;
                    }
                }
            }
            Field::NumerusForm => {
                if let Some(message) = self.message.as_mut() {
                    message.plural_forms.push(text);
                }
            }
        }
    }

    fn skip(&mut self, empty: bool) {
        if !empty {
            self.skip_depth += 1;
        }
    }

    /// Resolve a location, following the relative form Qt writes with
    /// `lupdate -locations relative` (missing filename, `line="+3"`).
    fn location(&mut self, filename: Option<String>, line: Option<String>) -> Location {
        let filename = filename
            .filter(|f| !f.is_empty())
            .or_else(|| self.last_file.clone())
            .unwrap_or_default();

        let line = line.as_deref().and_then(|raw| {
            let raw = raw.trim();
            if raw.starts_with('+') || raw.starts_with('-') {
                let delta: i64 = raw.parse().ok()?;
                let base = i64::from(self.last_lines.get(&filename).copied().unwrap_or(0));
                u32::try_from(base + delta).ok()
            } else {
                raw.parse().ok()
            }
        });

        if let Some(line) = line {
            self.last_lines.insert(filename.clone(), line);
        }
        self.last_file = Some(filename.clone());
        Location { filename, line }
    }

    fn finish(self) -> CatalogResult<TsDocument> {
        if self.context.is_some() || self.message.is_some() {
            return Err(CatalogError::InvalidInput(
                "unexpected end of document inside <context>".to_string(),
            ));
        }
        self.doc
            .ok_or_else(|| CatalogError::InvalidInput("document has no root element".to_string()))
    }
}

fn attr(e: &BytesStart, key: &[u8], position: u64) -> CatalogResult<Option<String>> {
    for attribute in e.attributes() {
        let attribute = attribute.map_err(|err| xml_error(position, err))?;
        if attribute.key.as_ref() == key {
            let value = attribute
                .unescape_value()
                .map_err(|err| xml_error(position, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `<byte value="x9"/>` encodes characters that are not allowed in XML text.
fn parse_byte_value(value: &str) -> Option<char> {
    let code = match value.strip_prefix('x').or_else(|| value.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse().ok()?,
    };
    char::from_u32(code)
}
