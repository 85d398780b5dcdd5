use super::Language;
use crate::errors::CatalogResult;
use crate::models::{Context, TranslationEntry, TsDocument};
use crate::ts;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Position of an entry inside the document: (context index, entry index).
type EntryRef = (usize, usize);

/// Read-only translation table built from a `.ts` document.
///
/// Every lookup is total: when there is no finished, non-empty translation
/// the key itself is returned.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    document: TsDocument,
    language: Language,
    /// context name -> source text -> entries (one per disambiguation comment)
    by_context: HashMap<String, HashMap<String, Vec<EntryRef>>>,
    /// source text -> first usable entry without a comment, in file order
    by_source: HashMap<String, EntryRef>,
}

/// One fuzzy search result.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub score: i64,
    pub context: &'a str,
    pub entry: &'a TranslationEntry,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> CatalogResult<Self> {
        info!("Loading translation catalog {}", path.display());
        let catalog = Self::from_document(ts::read_file(path)?);
        info!(
            "Catalog loaded: {} message(s), {} translated",
            catalog.len(),
            catalog.translated_len()
        );
        Ok(catalog)
    }

    pub fn parse(content: &str) -> CatalogResult<Self> {
        Ok(Self::from_document(ts::parse_str(content)?))
    }

    pub fn from_document(document: TsDocument) -> Self {
        let language = document
            .language
            .as_deref()
            .map(Language::from_code)
            .unwrap_or_default();

        let mut by_context: HashMap<String, HashMap<String, Vec<EntryRef>>> = HashMap::new();
        let mut by_source: HashMap<String, EntryRef> = HashMap::new();

        for (ctx_idx, context) in document.contexts.iter().enumerate() {
            let sources = by_context.entry(context.name.clone()).or_default();

            for (entry_idx, entry) in context.entries.iter().enumerate() {
                let refs = sources.entry(entry.source.clone()).or_default();
                let duplicate = refs.iter().any(|&r| {
                    Self::entry_at(&document, r).is_some_and(|other| other.comment == entry.comment)
                });
                if duplicate {
                    warn!(
                        "Duplicate message {:?} in context {:?}, keeping the first one",
                        entry.source, context.name
                    );
                    continue;
                }
                refs.push((ctx_idx, entry_idx));

                // a context-free lookup carries no disambiguation
                if entry.is_usable() && entry.comment.is_none() {
                    by_source
                        .entry(entry.source.clone())
                        .or_insert((ctx_idx, entry_idx));
                }
            }
        }

        Self {
            document,
            language,
            by_context,
            by_source,
        }
    }

    fn entry_at(document: &TsDocument, (ctx_idx, entry_idx): EntryRef) -> Option<&TranslationEntry> {
        document.contexts.get(ctx_idx)?.entries.get(entry_idx)
    }

    fn usable(&self, r: EntryRef) -> Option<&TranslationEntry> {
        Self::entry_at(&self.document, r).filter(|entry| entry.is_usable())
    }

    /// Translation for `key` from any context, or `key` itself.
    pub fn lookup<'a>(&'a self, key: &'a str) -> &'a str {
        self.by_source
            .get(key)
            .and_then(|&r| self.usable(r))
            .map(|entry| entry.translation.as_str())
            .unwrap_or(key)
    }

    pub fn t<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(self.lookup(key))
    }

    /// Translation for `key` within one context, or `key` itself.
    pub fn lookup_in<'a>(&'a self, context: &str, key: &'a str) -> &'a str {
        self.translate(context, key, None)
    }

    /// Lookup addressed the way Qt addresses messages: context, source and
    /// optional disambiguation. An entry without a comment is used when no
    /// translated entry matches the disambiguation.
    pub fn translate<'a>(&'a self, context: &str, key: &'a str, disambiguation: Option<&str>) -> &'a str {
        let Some(refs) = self.by_context.get(context).and_then(|sources| sources.get(key)) else {
            return key;
        };
        let disambiguation = disambiguation.filter(|d| !d.is_empty());

        let find = |comment: Option<&str>| {
            refs.iter()
                .filter_map(|&r| Self::entry_at(&self.document, r))
                .find(|entry| entry.comment.as_deref() == comment)
                .filter(|entry| entry.is_usable())
        };

        // an untranslated disambiguated entry still falls back to the plain one
        find(disambiguation)
            .or_else(|| disambiguation.and_then(|_| find(None)))
            .map(|entry| entry.translation.as_str())
            .unwrap_or(key)
    }

    /// Numerus lookup: picks the plural form for `n` and substitutes `%n`.
    pub fn lookup_plural(&self, key: &str, n: u64) -> String {
        let form = self
            .by_source
            .get(key)
            .and_then(|&r| self.usable(r))
            .and_then(|entry| {
                if entry.is_numerus() {
                    entry
                        .plural_forms
                        .get(self.language.plural_index(n))
                        .filter(|form| !form.is_empty())
                        .map(String::as_str)
                } else {
                    Some(entry.translation.as_str())
                }
            })
            .unwrap_or(key);
        form.replace("%n", &n.to_string())
    }

    /// Fuzzy search over source texts, best matches first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit<'_>> {
        let matcher = SkimMatcherV2::default();
        let mut hits: Vec<SearchHit<'_>> = self
            .contexts()
            .iter()
            .flat_map(|ctx| ctx.entries.iter().map(move |entry| (ctx, entry)))
            .filter_map(|(ctx, entry)| {
                matcher.fuzzy_match(&entry.source, query).map(|score| SearchHit {
                    score,
                    context: ctx.name.as_str(),
                    entry,
                })
            })
            .collect();
        // stable sort keeps file order between equal scores
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn locale(&self) -> Option<&str> {
        self.document.language.as_deref()
    }

    pub fn document(&self) -> &TsDocument {
        &self.document
    }

    pub fn contexts(&self) -> &[Context] {
        &self.document.contexts
    }

    pub fn entries(&self) -> impl Iterator<Item = &TranslationEntry> {
        self.document.entries().map(|(_, entry)| entry)
    }

    /// Number of messages, translated or not.
    pub fn len(&self) -> usize {
        self.document.message_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys that resolve to a translation.
    pub fn translated_len(&self) -> usize {
        self.by_source.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"<TS version="2.1" language="ru_RU">
<context>
    <name>MainWindow</name>
    <message>
        <source>Box</source>
        <translation>Параллелепипед</translation>
    </message>
    <message>
        <source>toolBar_2</source>
        <translation type="unfinished">Панель</translation>
    </message>
    <message>
        <source>Marching Cubes</source>
        <translation></translation>
    </message>
    <message>
        <source>Open</source>
        <comment>file</comment>
        <translation>Открыть файл</translation>
    </message>
    <message>
        <source>Open</source>
        <translation>Открыть</translation>
    </message>
    <message>
        <source>Box</source>
        <translation>Коробка</translation>
    </message>
    <message numerus="yes">
        <source>%n vertices</source>
        <translation>
            <numerusform>%n вершина</numerusform>
            <numerusform>%n вершины</numerusform>
            <numerusform>%n вершин</numerusform>
        </translation>
    </message>
</context>
<context>
    <name>HeightmapDialog</name>
    <message>
        <source>Marching Cubes</source>
        <translation>Марширующие кубы</translation>
    </message>
    <message>
        <source>Box</source>
        <translation>Ящик</translation>
    </message>
</context>
</TS>"#;

    fn catalog() -> Catalog {
        Catalog::parse(CATALOG).unwrap()
    }

    #[test]
    fn lookup_returns_finished_translation() {
        assert_eq!(catalog().lookup("Box"), "Параллелепипед");
    }

    #[test]
    fn lookup_falls_back_to_key() {
        let catalog = catalog();
        assert_eq!(catalog.lookup("toolBar_2"), "toolBar_2");
        assert_eq!(catalog.lookup("Unknown Key"), "Unknown Key");
        assert_eq!(catalog.t("Unknown Key"), "Unknown Key");
    }

    #[test]
    fn lookup_uses_first_context_with_a_translation() {
        // empty in MainWindow, translated in HeightmapDialog
        assert_eq!(catalog().lookup("Marching Cubes"), "Марширующие кубы");
    }

    #[test]
    fn lookup_in_respects_context() {
        let catalog = catalog();
        assert_eq!(catalog.lookup_in("HeightmapDialog", "Box"), "Ящик");
        assert_eq!(catalog.lookup_in("MainWindow", "Marching Cubes"), "Marching Cubes");
        assert_eq!(catalog.lookup_in("NoSuchWindow", "Box"), "Box");
    }

    #[test]
    fn duplicate_source_in_context_keeps_first() {
        assert_eq!(catalog().lookup_in("MainWindow", "Box"), "Параллелепипед");
    }

    #[test]
    fn translate_uses_disambiguation() {
        let catalog = catalog();
        assert_eq!(catalog.translate("MainWindow", "Open", Some("file")), "Открыть файл");
        assert_eq!(catalog.translate("MainWindow", "Open", None), "Открыть");
        assert_eq!(catalog.translate("MainWindow", "Open", Some("other")), "Открыть");
    }

    #[test]
    fn context_free_lookup_ignores_disambiguated_entries() {
        let catalog = catalog();
        assert_eq!(catalog.lookup("Open"), "Открыть");
        assert_eq!(catalog.lookup("Open"), catalog.lookup_in("MainWindow", "Open"));

        let only_commented = Catalog::parse(
            "<TS><context><name>C</name><message>\
             <source>Save</source><comment>menu</comment><translation>Сохранить</translation>\
             </message></context></TS>",
        )
        .unwrap();
        assert_eq!(only_commented.lookup("Save"), "Save");
        assert_eq!(only_commented.translate("C", "Save", Some("menu")), "Сохранить");
    }

    #[test]
    fn unfinished_disambiguated_entry_falls_back_to_plain_one() {
        let catalog = Catalog::parse(
            "<TS><context><name>C</name>\
             <message><source>Close</source><comment>tab</comment>\
             <translation type=\"unfinished\">Закрыть вкладку</translation></message>\
             <message><source>Close</source><translation>Закрыть</translation></message>\
             </context></TS>",
        )
        .unwrap();
        assert_eq!(catalog.translate("C", "Close", Some("tab")), "Закрыть");
    }

    #[test]
    fn plural_forms_follow_language_rules() {
        let catalog = catalog();
        assert_eq!(catalog.language(), Language::Russian);
        assert_eq!(catalog.lookup_plural("%n vertices", 1), "1 вершина");
        assert_eq!(catalog.lookup_plural("%n vertices", 3), "3 вершины");
        assert_eq!(catalog.lookup_plural("%n vertices", 11), "11 вершин");
        assert_eq!(catalog.lookup_plural("%n vertices", 21), "21 вершина");
        assert_eq!(catalog.lookup_plural("%n edges", 5), "5 edges");
    }

    #[test]
    fn search_ranks_matching_sources() {
        let catalog = catalog();
        let hits = catalog.search("march", 10);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|hit| hit.entry.source == "Marching Cubes"));
        assert!(catalog.search("zzzz", 10).is_empty());
        assert_eq!(catalog.search("o", 1).len(), 1);
    }

    #[test]
    fn empty_catalog_returns_keys() {
        let catalog = Catalog::empty();
        assert!(catalog.is_empty());
        assert_eq!(catalog.lookup("Box"), "Box");
        assert_eq!(catalog.lookup_plural("%n items", 2), "2 items");
    }

    #[test]
    fn catalog_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }
}
