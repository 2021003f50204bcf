//! Voice metadata and the process-wide voice catalog.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// A synthetic voice offered by the speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Full service name, passed to synthesis.
    pub name: String,
    /// Short name such as `en-US-AriaNeural`.
    pub short_name: String,
    /// Human readable name.
    pub friendly_name: String,
    /// Locale such as `en-US`.
    pub locale: String,
    /// `Female` or `Male`.
    pub gender: String,
}

impl Voice {
    /// Label shown to users: `"{friendly} ({gender}, {locale})"`.
    pub fn display_label(&self) -> String {
        format!("{} ({}, {})", self.friendly_name, self.gender, self.locale)
    }
}

/// Something that can list the voices of a speech service.
pub trait VoiceSource: Send + Sync {
    /// Fetch every available voice.
    fn list_voices(&self) -> Result<Vec<Voice>>;
}

impl<T: VoiceSource + ?Sized> VoiceSource for Arc<T> {
    fn list_voices(&self) -> Result<Vec<Voice>> {
        (**self).list_voices()
    }
}

/// Voice list fetched once and reused for the life of the process.
///
/// A failed fetch is not remembered; the next call tries again.
pub struct VoiceCatalog<S> {
    source: S,
    voices: OnceLock<Vec<Voice>>,
}

impl<S: VoiceSource> VoiceCatalog<S> {
    /// Create a catalog that fetches from `source` on first use.
    pub fn new(source: S) -> Self {
        Self {
            source,
            voices: OnceLock::new(),
        }
    }

    /// The underlying voice source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// All voices, in the order the service lists them.
    pub fn voices(&self) -> Result<&[Voice]> {
        if let Some(voices) = self.voices.get() {
            return Ok(voices);
        }

        let fetched = self.source.list_voices()?;
        log::info!("Loaded {} voices", fetched.len());

        // Another thread may have won the race; either list is fine
        Ok(self.voices.get_or_init(|| fetched))
    }

    /// Distinct locales, sorted.
    pub fn locales(&self) -> Result<Vec<String>> {
        let mut locales: Vec<String> = self.voices()?.iter().map(|v| v.locale.clone()).collect();
        locales.sort();
        locales.dedup();
        Ok(locales)
    }

    /// Voices for one locale, or every voice when `locale` is `None`.
    pub fn by_locale(&self, locale: Option<&str>) -> Result<Vec<&Voice>> {
        let voices = self.voices()?;
        Ok(match locale {
            None => voices.iter().collect(),
            Some(locale) => voices.iter().filter(|v| v.locale == locale).collect(),
        })
    }

    /// Look a voice up by full name, short name or display label.
    pub fn find(&self, name: &str) -> Result<Option<&Voice>> {
        Ok(self
            .voices()?
            .iter()
            .find(|v| v.name == name || v.short_name == name || v.display_label() == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn voice(short_name: &str, locale: &str, gender: &str) -> Voice {
        let (_, rest) = short_name.split_at(locale.len() + 1);
        Voice {
            name: format!("Microsoft Server Speech Text to Speech Voice ({}, {})", locale, rest),
            short_name: short_name.to_string(),
            friendly_name: format!("Microsoft {} Online (Natural)", rest.trim_end_matches("Neural")),
            locale: locale.to_string(),
            gender: gender.to_string(),
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl CountingSource {
        fn new(fail_first: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first,
            }
        }
    }

    impl VoiceSource for CountingSource {
        fn list_voices(&self) -> Result<Vec<Voice>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(Error::Http("service unavailable".to_string()));
            }
            Ok(vec![
                voice("es-MX-DaliaNeural", "es-MX", "Female"),
                voice("en-US-AriaNeural", "en-US", "Female"),
                voice("es-ES-AlvaroNeural", "es-ES", "Male"),
                voice("en-US-GuyNeural", "en-US", "Male"),
            ])
        }
    }

    #[test]
    fn test_display_label() {
        let v = voice("en-US-AriaNeural", "en-US", "Female");
        assert_eq!(v.display_label(), "Microsoft Aria Online (Natural) (Female, en-US)");
    }

    #[test]
    fn test_fetches_once() {
        let catalog = VoiceCatalog::new(CountingSource::new(false));
        assert_eq!(catalog.voices().unwrap().len(), 4);
        assert_eq!(catalog.locales().unwrap().len(), 3);
        assert!(catalog.find("en-US-GuyNeural").unwrap().is_some());
        assert_eq!(catalog.source().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_not_cached() {
        let catalog = VoiceCatalog::new(CountingSource::new(true));
        assert!(catalog.voices().is_err());
        assert_eq!(catalog.voices().unwrap().len(), 4);
        assert_eq!(catalog.source().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_locales_sorted_and_unique() {
        let catalog = VoiceCatalog::new(CountingSource::new(false));
        assert_eq!(catalog.locales().unwrap(), vec!["en-US", "es-ES", "es-MX"]);
    }

    #[test]
    fn test_by_locale() {
        let catalog = VoiceCatalog::new(CountingSource::new(false));
        assert_eq!(catalog.by_locale(None).unwrap().len(), 4);

        let us: Vec<&str> = catalog
            .by_locale(Some("en-US"))
            .unwrap()
            .into_iter()
            .map(|v| v.short_name.as_str())
            .collect();
        assert_eq!(us, vec!["en-US-AriaNeural", "en-US-GuyNeural"]);

        assert!(catalog.by_locale(Some("fr-FR")).unwrap().is_empty());
    }

    #[test]
    fn test_find_by_any_name() {
        let catalog = VoiceCatalog::new(CountingSource::new(false));
        let aria = voice("en-US-AriaNeural", "en-US", "Female");

        assert_eq!(catalog.find(&aria.name).unwrap(), Some(&aria));
        assert_eq!(catalog.find("en-US-AriaNeural").unwrap(), Some(&aria));
        assert_eq!(catalog.find(&aria.display_label()).unwrap(), Some(&aria));
        assert_eq!(catalog.find("xx-XX-NobodyNeural").unwrap(), None);
    }
}
