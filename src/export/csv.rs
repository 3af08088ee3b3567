//! Critical-path CSV export.

use crate::models::PartRef;

/// Render the critical path as a two-column CSV: `order` (1-based) and the
/// node id, one row per node in path order. CRLF row endings, to match what
/// spreadsheet tooling already ingests.
pub fn critical_path_csv(path: &[PartRef]) -> String {
    let mut out = String::from("order,id\r\n");
    for (idx, sid) in path.iter().enumerate() {
        out.push_str(&format!("{},{}\r\n", idx + 1, sid));
    }
    out
}
