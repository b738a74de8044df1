//! Identifier sources: a lazy, single pass stream of trimmed lines from a list file, or the
//! paths matched by a glob pattern.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use crate::error::{Error, Result};

/// Reads one identifier per line. Not restartable once exhausted.
pub struct LineSource {
    path: PathBuf,
    lines: io::Lines<Box<dyn BufRead>>,
    line_number: usize,
    skip_blank: bool,
}

impl LineSource {

    /// Opens `path`, or standard input when `path` is `-`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {

        let path = path.as_ref();

        if path == Path::new("-") {
            let stdin = io::stdin();
            return Ok(Self::from_reader(path, BufReader::new(stdin)));
        }

        let file = File::open(path).map_err(|e| Error::io(path, e))?;

        Ok(Self::from_reader(path, BufReader::new(file)))
    }

    /// Wraps an already open reader; `path` is only used in error messages.
    pub fn from_reader<P, R>(path: P, reader: R) -> Self
    where
        P: Into<PathBuf>,
        R: BufRead + 'static,
    {
        let reader: Box<dyn BufRead> = Box::new(reader);

        return Self {
            path: path.into(),
            lines: reader.lines(),
            line_number: 0,
            skip_blank: false,
        };
    }

    /// Drop lines that are empty after trimming.
    pub fn skip_blank(mut self, skip: bool) -> Self {
        self.skip_blank = skip;
        self
    }

    /// 1-based number of the last line read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl Iterator for LineSource {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::io(&self.path, e))),
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if self.skip_blank && trimmed.is_empty() {
                continue;
            }

            return Some(Ok(trimmed.to_string()));
        }
    }
}

/// Paths matching a glob pattern, in the order `glob` yields them.
pub fn glob_identifiers(pattern: &str) -> Result<impl Iterator<Item = Result<String>>> {

    let paths = glob::glob(pattern)
        .map_err(|e| Error::InvalidArgument(format!("bad glob pattern {:?}: {}", pattern, e)))?;

    Ok(paths.map(|entry| match entry {
        Ok(path) => Ok(path.to_string_lossy().into_owned()),
        Err(e) => {
            let path = e.path().to_path_buf();
            Err(Error::io(path, e.into_error()))
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn trims_every_line() {

        let data = "  a.fp\n\tb.fp  \r\n\nc.fp";
        let lines: Vec<String> = LineSource::from_reader("mem", Cursor::new(data))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(lines, vec!["a.fp", "b.fp", "", "c.fp"]);
    }

    #[test]
    fn skips_blank_when_asked() {

        let data = "a.fp\n   \n\nb.fp\n";
        let mut source = LineSource::from_reader("mem", Cursor::new(data)).skip_blank(true);

        assert_eq!(source.next().unwrap().unwrap(), "a.fp");
        assert_eq!(source.next().unwrap().unwrap(), "b.fp");
        assert_eq!(source.line_number(), 4);
        assert!(source.next().is_none());
    }

    #[test]
    fn missing_file_is_not_found() {

        let dir = tempfile::tempdir().unwrap();
        let res = LineSource::open(dir.path().join("missing.txt"));

        assert!(matches!(res, Err(Error::NotFound(_))));
    }

    #[test]
    fn reads_file_lazily() {

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ligands.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "one.fp").unwrap();
        writeln!(file, "two.fp").unwrap();

        let mut source = LineSource::open(&path).unwrap();
        assert_eq!(source.next().unwrap().unwrap(), "one.fp");
        assert_eq!(source.line_number(), 1);
        assert_eq!(source.next().unwrap().unwrap(), "two.fp");
        assert!(source.next().is_none());
    }

    #[test]
    fn glob_lists_matching_paths() {

        let dir = tempfile::tempdir().unwrap();
        for name in ["a.fp", "b.fp", "c.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let pattern = format!("{}/*.fp", dir.path().display());
        let found: Vec<String> = glob_identifiers(&pattern).unwrap().collect::<Result<_>>().unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.ends_with(".fp")));
    }

    #[test]
    fn bad_glob_is_invalid_argument() {
        assert!(matches!(glob_identifiers("[").err(), Some(Error::InvalidArgument(_))));
    }
}
