//! Configuration access port trait.

/// Read-only view over `[section] key = value` settings.
///
/// Lookups never fail: a missing or unparseable value yields `None` or the
/// caller's default, and `config_validation` reports bad values up front.
pub trait ConfigPort {
    /// Trimmed value; blank values read as absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Comma-separated names, e.g. `entities = Marval S.A.S., Amarilo S A S`.
    fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get_string(section, key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}
