//! Built-in module table and canonical book ordering. Pure data.

use super::{ContentType, Feature, License, ModuleDescriptor, SourceDescriptor};

/// Canonical top-level unit order for primary-text modules. Per-unit
/// acquisition iterates this list; progress is reported against its length.
pub const BOOKS: [&str; 66] = [
    "Genesis",
    "Exodus",
    "Leviticus",
    "Numbers",
    "Deuteronomy",
    "Joshua",
    "Judges",
    "Ruth",
    "1 Samuel",
    "2 Samuel",
    "1 Kings",
    "2 Kings",
    "1 Chronicles",
    "2 Chronicles",
    "Ezra",
    "Nehemiah",
    "Esther",
    "Job",
    "Psalms",
    "Proverbs",
    "Ecclesiastes",
    "Song of Solomon",
    "Isaiah",
    "Jeremiah",
    "Lamentations",
    "Ezekiel",
    "Daniel",
    "Hosea",
    "Joel",
    "Amos",
    "Obadiah",
    "Jonah",
    "Micah",
    "Nahum",
    "Habakkuk",
    "Zephaniah",
    "Haggai",
    "Zechariah",
    "Malachi",
    "Matthew",
    "Mark",
    "Luke",
    "John",
    "Acts",
    "Romans",
    "1 Corinthians",
    "2 Corinthians",
    "Galatians",
    "Ephesians",
    "Philippians",
    "Colossians",
    "1 Thessalonians",
    "2 Thessalonians",
    "1 Timothy",
    "2 Timothy",
    "Titus",
    "Philemon",
    "Hebrews",
    "James",
    "1 Peter",
    "2 Peter",
    "1 John",
    "2 John",
    "3 John",
    "Jude",
    "Revelation",
];

fn public_domain(text: &str) -> License {
    License {
        text: text.to_string(),
        public_domain: true,
    }
}

/// The built-in catalog. Order here is the order pickers display.
pub fn builtin_modules() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor {
            id: "kjv".into(),
            name: "King James Version".into(),
            content_type: ContentType::PrimaryText,
            source: SourceDescriptor::BundledStatic,
            format_tag: "json-bible".into(),
            features: vec![Feature::HasAnnotations, Feature::Searchable],
            license: public_domain("Public Domain (Crown copyright expired)"),
            default_install: true,
        },
        ModuleDescriptor {
            id: "web".into(),
            name: "World English Bible".into(),
            content_type: ContentType::PrimaryText,
            source: SourceDescriptor::RemoteFilePerUnit {
                base_url: "https://content.lectern.app/bibles/web".into(),
            },
            format_tag: "json-bible".into(),
            features: vec![Feature::Searchable],
            license: public_domain("Public Domain"),
            default_install: false,
        },
        ModuleDescriptor {
            id: "asv".into(),
            name: "American Standard Version".into(),
            content_type: ContentType::PrimaryText,
            source: SourceDescriptor::RemoteFilePerUnit {
                base_url: "https://content.lectern.app/bibles/asv".into(),
            },
            format_tag: "json-bible".into(),
            features: vec![Feature::Searchable],
            license: public_domain("Public Domain"),
            default_install: false,
        },
        ModuleDescriptor {
            id: "bbe".into(),
            name: "Bible in Basic English".into(),
            content_type: ContentType::PrimaryText,
            source: SourceDescriptor::RestEndpoint {
                base_url: "https://bible-api.com".into(),
            },
            format_tag: "json-bible".into(),
            features: vec![],
            license: public_domain("Public Domain"),
            default_install: false,
        },
        ModuleDescriptor {
            id: "strongs".into(),
            name: "Strong's Concordance".into(),
            content_type: ContentType::Dictionary,
            source: SourceDescriptor::BundledStatic,
            format_tag: "json-lexicon".into(),
            features: vec![Feature::HasMorphology, Feature::Searchable],
            license: public_domain("Public Domain"),
            default_install: true,
        },
        ModuleDescriptor {
            id: "tsk".into(),
            name: "Treasury of Scripture Knowledge".into(),
            content_type: ContentType::CrossReference,
            source: SourceDescriptor::RemoteFilePerUnit {
                base_url: "https://content.lectern.app/refs/tsk".into(),
            },
            format_tag: "json-xref".into(),
            features: vec![],
            license: public_domain("Public Domain"),
            default_install: false,
        },
        ModuleDescriptor {
            id: "mhc".into(),
            name: "Matthew Henry Concise Commentary".into(),
            content_type: ContentType::Commentary,
            source: SourceDescriptor::RemoteFilePerUnit {
                base_url: "https://content.lectern.app/commentaries/mhc".into(),
            },
            format_tag: "json-commentary".into(),
            features: vec![],
            license: public_domain("Public Domain"),
            default_install: false,
        },
        ModuleDescriptor {
            id: "nave".into(),
            name: "Nave's Topical Index".into(),
            content_type: ContentType::Topical,
            source: SourceDescriptor::BundledStatic,
            format_tag: "json-topical".into(),
            features: vec![Feature::Searchable],
            license: public_domain("Public Domain"),
            default_install: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let modules = builtin_modules();
        let mut ids: Vec<&str> = modules.iter().map(|m| m.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), modules.len());
    }

    #[test]
    fn canon_has_sixty_six_books() {
        assert_eq!(BOOKS.len(), 66);
        assert_eq!(BOOKS[0], "Genesis");
        assert_eq!(BOOKS[65], "Revelation");
    }

    #[test]
    fn pauline_epistles_run_unbroken() {
        let colossians = BOOKS.iter().position(|b| *b == "Colossians").unwrap();
        assert_eq!(BOOKS[colossians + 1], "1 Thessalonians");
        assert_eq!(BOOKS[colossians + 2], "2 Thessalonians");
        assert_eq!(BOOKS[colossians + 3], "1 Timothy");
    }
}
