use std::fmt::Write;

/// Format a count with comma thousands separators, rounded to the nearest integer.
pub fn format_thousands(value: f64) -> String {
    let mut out = String::with_capacity(16);
    write_thousands(&mut out, value);
    out
}

pub fn write_thousands(buf: &mut String, value: f64) {
    buf.clear();
    if !value.is_finite() {
        let _ = write!(buf, "{value}");
        return;
    }
    let rounded = value.round();
    if rounded < 0.0 {
        buf.push('-');
    }
    let digits = format!("{:.0}", rounded.abs());
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            buf.push(',');
        }
        buf.push(ch);
    }
}
