//! Terminal output utilities.

/// Quote a value and right-align it to `width` columns.
///
/// Values wider than `width` are returned quoted but unpadded.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());
    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}
