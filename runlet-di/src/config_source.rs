//! External key/value configuration. A [ConfigurationSource] turns an identifier into a
//! [ConfigurationStore], which then stays read-only for the rest of the run.
//!
//! The default source, [PropertiesFileSource], reads line-oriented `key=value` files:
//!
//! ```text
//! # comment
//! ! also a comment
//! demo.nameOfOwner = Ada
//! demo.maxRetryAttempts: 3
//! demo.motto = first line \
//!              second line
//! demo.city = Krak\u00f3w
//! ```

use crate::error::ConfigurationSourceError;
use fxhash::FxHashMap;
use java_properties::PropertiesError;
#[cfg(test)]
use mockall::automock;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{debug, error};

/// Read-only mapping from configuration key to raw value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigurationStore {
    entries: FxHashMap<String, String>,
}

impl ConfigurationStore {
    /// Snapshots the process environment.
    pub fn from_environment() -> Self {
        std::env::vars().collect()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigurationStore {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Source of configuration stores.
#[cfg_attr(test, automock)]
pub trait ConfigurationSource {
    /// Loads the configuration identified by `identifier`.
    fn load(&self, identifier: &str) -> Result<ConfigurationStore, ConfigurationSourceError>;
}

/// Loads configuration without ever failing: a blank identifier gives an empty store, and so does
/// a load error, which gets logged.
pub fn load_configuration<CS: ConfigurationSource + ?Sized>(
    source: &CS,
    identifier: &str,
) -> ConfigurationStore {
    if identifier.trim().is_empty() {
        debug!("Blank configuration identifier - using empty configuration.");
        return ConfigurationStore::default();
    }

    debug!(identifier, "Loading application properties...");

    match source.load(identifier) {
        Ok(store) => {
            debug!(entries = store.len(), "Done loading application properties.");
            store
        }
        Err(error) => {
            error!(%error, "Error loading application properties.");
            ConfigurationStore::default()
        }
    }
}

/// Reads `.properties` files from the filesystem; the identifier is a path. Files are decoded as
/// ISO-8859-1, other characters need `\uXXXX` escapes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PropertiesFileSource;

impl ConfigurationSource for PropertiesFileSource {
    fn load(&self, identifier: &str) -> Result<ConfigurationStore, ConfigurationSourceError> {
        let file = File::open(identifier).map_err(|error| ConfigurationSourceError::Io {
            identifier: identifier.to_string(),
            error,
        })?;

        parse_properties(BufReader::new(file)).map_err(|error| ConfigurationSourceError::Parse {
            identifier: identifier.to_string(),
            error,
        })
    }
}

/// Parses properties content. The last occurrence of a duplicated key wins.
pub fn parse_properties<R: BufRead>(input: R) -> Result<ConfigurationStore, PropertiesError> {
    java_properties::read(input).map(|entries| entries.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use crate::config_source::{
        load_configuration, parse_properties, ConfigurationSource, ConfigurationStore,
        MockConfigurationSource, PropertiesFileSource,
    };
    use crate::error::ConfigurationSourceError;
    use mockall::predicate::*;
    use std::io::Write;

    fn parse(content: &str) -> ConfigurationStore {
        parse_properties(content.as_bytes()).unwrap()
    }

    #[test]
    fn should_parse_key_value_lines() {
        let store = parse(
            "# comment\n! other comment\n\ndemo.nameOfOwner=Ada\ndemo.maxRetryAttempts : 3\n  demo.empty=\n",
        );

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("demo.nameOfOwner"), Some("Ada"));
        assert_eq!(store.get("demo.maxRetryAttempts"), Some("3"));
        assert_eq!(store.get("demo.empty"), Some(""));
        assert!(!store.contains_key("# comment"));
    }

    #[test]
    fn should_join_continuation_lines() {
        let store = parse("motto = first \\\n    second\nnext=1");
        assert_eq!(store.get("motto"), Some("first second"));
        assert_eq!(store.get("next"), Some("1"));
    }

    #[test]
    fn should_unescape_values() {
        let store = parse("unicode=\\u0041da\nname=Jos\\u00e9\n");
        assert_eq!(store.get("unicode"), Some("Ada"));
        assert_eq!(store.get("name"), Some("Jos\u{e9}"));
    }

    #[test]
    fn should_not_mangle_surrogate_pair_escape() {
        // either decoded as a pair or rejected, never stripped
        if let Ok(store) = parse_properties("emoji=\\uD83D\\uDE00\n".as_bytes()) {
            assert_eq!(store.get("emoji"), Some("\u{1F600}"));
        }
    }

    #[test]
    fn should_reject_malformed_unicode_escape() {
        assert!(parse_properties("broken=\\u00zz\n".as_bytes()).is_err());
    }

    #[test]
    fn should_keep_last_duplicate() {
        let store = parse("key=1\nkey=2\n");
        assert_eq!(store.get("key"), Some("2"));
    }

    #[test]
    fn should_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "demo.nameOfOwner=Ada").unwrap();

        let store = PropertiesFileSource
            .load(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(store.get("demo.nameOfOwner"), Some("Ada"));
    }

    #[test]
    fn should_decode_file_as_latin1() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"demo.nameOfOwner=Jos\xE9\n").unwrap();

        let store = PropertiesFileSource
            .load(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(store.get("demo.nameOfOwner"), Some("Jos\u{e9}"));
    }

    #[test]
    fn should_report_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "broken=\\u00zz").unwrap();

        assert!(matches!(
            PropertiesFileSource.load(file.path().to_str().unwrap()),
            Err(ConfigurationSourceError::Parse { .. })
        ));
    }

    #[test]
    fn should_fail_loading_missing_file() {
        assert!(matches!(
            PropertiesFileSource.load("/nonexistent/runlet/demo.properties"),
            Err(ConfigurationSourceError::Io { .. })
        ));
    }

    #[test]
    fn should_not_load_blank_identifier() {
        let mut source = MockConfigurationSource::new();
        source.expect_load().never();

        assert!(load_configuration(&source, "  ").is_empty());
    }

    #[test]
    fn should_fall_back_to_empty_store_on_error() {
        let mut source = MockConfigurationSource::new();
        source
            .expect_load()
            .with(eq("config/demo.properties"))
            .times(1)
            .returning(|identifier| {
                Err(ConfigurationSourceError::Io {
                    identifier: identifier.to_string(),
                    error: std::io::ErrorKind::NotFound.into(),
                })
            });

        assert!(load_configuration(&source, "config/demo.properties").is_empty());
    }

    #[test]
    fn should_return_loaded_store() {
        let mut source = MockConfigurationSource::new();
        source
            .expect_load()
            .times(1)
            .returning(|_| Ok([("key", "value")].into_iter().collect()));

        let store = load_configuration(&source, "file");
        assert_eq!(store.get("key"), Some("value"));
    }

    #[test]
    fn should_snapshot_environment() {
        let store = ConfigurationStore::from_environment();
        assert_eq!(store.len(), std::env::vars().count());
    }
}
