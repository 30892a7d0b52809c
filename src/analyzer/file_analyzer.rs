use crate::analyzer::TimeWindow;
use crate::classifier::{LineClassifier, NumericExtractor};
use crate::findings::{Analysis, Category, Finding};
use crate::resolver::modified_time;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Builds `Analysis` records for single files and date directories
///
/// Every non-blank line is trimmed and run through the classifier. Numeric
/// extraction and the time-window filter are optional and configured per
/// flow. Per-unit problems (missing, empty, unreadable) are recorded as
/// findings and never abort the sweep.
#[derive(Debug, Clone)]
pub struct FileAnalyzer {
    classifier: LineClassifier,
    extractor: Option<NumericExtractor>,
    time_window: Option<TimeWindow>,
}

impl FileAnalyzer {
    /// Create an analyzer that only classifies lines
    pub fn new(classifier: LineClassifier) -> Self {
        Self {
            classifier,
            extractor: None,
            time_window: None,
        }
    }

    /// Also extract duration and transferred volume
    pub fn with_extraction(mut self, extractor: NumericExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Only consider lines inside the given time window
    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn classifier(&self) -> &LineClassifier {
        &self.classifier
    }

    /// Analyze one file
    ///
    /// A missing file or a zero-byte file yields exactly one unit-level
    /// finding and no content scan. A read failure part-way through records a
    /// `read_error` finding and stops scanning this file.
    pub fn analyze_file(&self, source: &str, path: &Path) -> Analysis {
        let mut analysis = Analysis::new(source, path);
        let name = display_name(path);

        let metadata = match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                warn!("Not a regular file: {}", path.display());
                analysis.push(Finding::for_unit(
                    source,
                    Category::MissingFile,
                    format!("Missing file: {}", name),
                ));
                return analysis;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("File not found: {}", path.display());
                analysis.push(Finding::for_unit(
                    source,
                    Category::MissingFile,
                    format!("Missing file: {}", name),
                ));
                return analysis;
            }
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                analysis.push(Finding::for_unit(
                    source,
                    Category::ReadError,
                    format!("Failed to read file {}: {}", name, e),
                ));
                return analysis;
            }
        };

        analysis.set_metadata(metadata.len(), modified_time(path));

        if metadata.len() == 0 {
            debug!("Empty file: {}", path.display());
            analysis.push(Finding::for_unit(
                source,
                Category::EmptyFile,
                "Empty log file",
            ));
            return analysis;
        }

        match File::open(path) {
            Ok(file) => self.scan(source, &name, BufReader::new(file), &mut analysis),
            Err(e) => {
                warn!("Cannot open {}: {}", path.display(), e);
                analysis.push(Finding::for_unit(
                    source,
                    Category::ReadError,
                    format!("Failed to read file {}: {}", name, e),
                ));
            }
        }

        debug!(
            "Analyzed {}: {} line(s), {} finding(s)",
            path.display(),
            analysis.lines_scanned(),
            analysis.findings().len()
        );
        analysis
    }

    /// Analyze a `<root>/<date>` directory against a required file list
    ///
    /// A missing directory yields one analysis carrying a single
    /// `missing_directory` finding. Otherwise every required file is analyzed
    /// in list order as `<date>/<file>`.
    pub fn analyze_date_directory<S: AsRef<str>>(
        &self,
        root: &Path,
        date: &str,
        required_files: &[S],
    ) -> Vec<Analysis> {
        let directory = root.join(date);

        if !directory.is_dir() {
            warn!("Missing directory: {}", directory.display());
            let mut analysis = Analysis::new(date, &directory);
            analysis.push(Finding::for_unit(
                date,
                Category::MissingDirectory,
                format!("Missing directory: {}", directory.display()),
            ));
            return vec![analysis];
        }

        debug!("Checking directory: {}", directory.display());
        required_files
            .iter()
            .map(|file| {
                let file = file.as_ref();
                let source = format!("{}/{}", date, file);
                self.analyze_file(&source, &directory.join(file))
            })
            .collect()
    }

    fn scan<R: BufRead>(&self, source: &str, name: &str, mut reader: R, analysis: &mut Analysis) {
        let mut buffer = Vec::new();
        let mut line_number = 0;

        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {
                    line_number += 1;
                    let decoded = String::from_utf8_lossy(&buffer);
                    let line = decoded.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Some(window) = &self.time_window {
                        if !window.includes(line) {
                            continue;
                        }
                    }
                    self.classify_line(source, line_number, line, analysis);
                }
                Err(e) => {
                    warn!("Read failed in {} after line {}: {}", name, line_number, e);
                    analysis.push(Finding::for_unit(
                        source,
                        Category::ReadError,
                        format!("Failed to read file {}: {}", name, e),
                    ));
                    break;
                }
            }
        }
    }

    fn classify_line(&self, source: &str, line_number: usize, line: &str, analysis: &mut Analysis) {
        analysis.count_line();

        for matched in self.classifier.classify(line) {
            analysis.push(Finding::for_line(
                source,
                line_number,
                matched.category,
                line,
                matched.matched,
            ));
        }

        if let Some(extractor) = &self.extractor {
            if let Some(minutes) = extractor.duration_minutes(line) {
                analysis.record_duration(minutes);
            }
            if let Some(megabytes) = extractor.transferred_mb(line) {
                analysis.record_transferred(megabytes);
            }
        }
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
