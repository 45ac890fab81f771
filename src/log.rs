use std::fmt::{self, Display, Formatter};

/// Human-readable narrative of the calculations performed, owned by the caller.
///
/// Calculations append lines to the log they are handed. Every line is also emitted as a
/// `tracing` event at `INFO` level with target `surveyor::result_log`, so a subscriber can
/// capture the narrative without holding on to the log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultLog {
    lines: Vec<String>,
}

impl ResultLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line (which may itself contain line breaks).
    pub fn write(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(target: "surveyor::result_log", "{line}");
        self.lines.push(line);
    }

    /// Appends a row of left-aligned cells, each padded to `width` characters.
    pub fn write_row<S: AsRef<str>>(&mut self, width: usize, cells: &[S]) {
        let row = cells
            .iter()
            .map(|cell| format!("{:<width$}", cell.as_ref()))
            .collect::<Vec<_>>()
            .join(" ");
        self.write(row.trim_end());
    }

    /// Appends an empty line.
    pub fn blank(&mut self) {
        self.write("");
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Removes and returns everything logged so far.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Display for ResultLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ResultLog;

    #[test]
    fn collects_lines_in_order() {
        let mut log = ResultLog::new();
        assert!(log.is_empty());
        log.write("Orientation - 5247");
        log.write_row(10, &["Point num", "Code", "Direction"]);
        log.write_row(10, &["5241", "-", "245-23-41"]);
        insta::assert_snapshot!(log.to_string(), @r"
        Orientation - 5247
        Point num  Code       Direction
        5241       -          245-23-41
        ");
    }

    #[test]
    fn take_drains_the_log() {
        let mut log = ResultLog::new();
        log.write("a");
        log.blank();
        assert_eq!(log.take(), vec!["a".to_owned(), String::new()]);
        assert!(log.is_empty());
        log.write("c");
        log.clear();
        assert_eq!(log.lines(), &[] as &[String]);
    }
}
