//! Roster import from pasted text (CSV lines, whitespace-separated names, or both).

use std::collections::HashSet;

/// Split pasted text into player names.
///
/// Fields are comma separated and any whitespace inside a field also splits it,
/// so `"Ann, Bob\nCid Dee"` gives four names. Empty entries are dropped, as are
/// repeats that differ only in ASCII case; the first spelling seen is kept.
pub fn parse_roster(text: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping unreadable roster line: {}", e);
                continue;
            }
        };
        for name in record.iter().flat_map(str::split_whitespace) {
            if seen.insert(name.to_ascii_lowercase()) {
                names.push(name.to_string());
            }
        }
    }
    names
}
