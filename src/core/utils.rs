//! Utility functions for snakeutils.

/// Turn ordered key/value parameters into a single command line fragment.
///
/// Single letter keys get a single dash (`-t`), longer keys a double dash
/// (`--threads`). Every pair is emitted as `{flag}{sep}{value}{br}`.
pub fn params_to_cli<I, K, V>(params: I, sep: &str, br: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: std::fmt::Display,
{
    let mut line = String::new();
    for (key, value) in params {
        let key = key.as_ref();
        let flag = if key.chars().count() == 1 {
            format!("-{key}")
        } else {
            format!("--{key}")
        };
        line.push_str(&format!("{flag}{sep}{value}{br}"));
    }
    line
}

/// Helper function to print a metric in tables, with at most three decimals.
/// Missing values (NaN) are left blank.
pub fn format_metric(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }

    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let text = format!("{rounded:.3}");
        text.trim_end_matches('0').to_string()
    }
}
