use super::ordered::OrderedMap;

/// Ordered `prop -> value` mapping for CSS-like presentation properties.
/// Never interpreted semantically by the compiler.
pub type StyleMap = OrderedMap<String>;

/// Parses `prop: value; prop: value` text into an ordered style map.
///
/// Segments without a colon are skipped; keys and values are trimmed.
pub fn parse_style(text: &str) -> StyleMap {
    let mut map = StyleMap::new();
    for segment in text.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key, value.trim().to_string());
    }
    map
}
