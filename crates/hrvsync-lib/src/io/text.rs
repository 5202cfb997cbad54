use anyhow::{Context, Result};
use std::{
    io::{self, Read},
    path::Path,
};

/// Parse a plain-text numeric series.
///
/// Values may be separated by newlines, commas or whitespace. Blank lines and
/// lines starting with `#` are ignored.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        for token in trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let val: f64 = token
                .parse()
                .with_context(|| format!("line {} is not f64: {}", idx + 1, token))?;
            out.push(val);
        }
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a numeric series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text).with_context(|| format!("in {}", path.display()))
}

/// Read from `path`, or from stdin when no path is given.
pub fn read_f64_series_or_stdin(path: Option<&Path>) -> Result<Vec<f64>> {
    match path {
        Some(path) => read_f64_series(path),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            parse_f64_series(&buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_separators_and_comments() {
        let text = "# rr intervals (ms)\n812.5\n\n790, 805\n 799\t801 \n";
        let values = parse_f64_series(text).unwrap();
        assert_eq!(values, vec![812.5, 790.0, 805.0, 799.0, 801.0]);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_f64_series("800\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_f64_series("# nothing\n\n").is_err());
    }
}
