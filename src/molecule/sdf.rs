use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use super::{Atom, Bond, BondOrder, Molecule};
use crate::geometry::Point;

// three-digit count fields
const MAX_V2000_COUNT: usize = 999;

lazy_static::lazy_static! {
    static ref DATA_HEADER_RE: Regex = Regex::new(r"^>.*?<([^>]*)>").unwrap();
}

#[derive(Error, Debug)]
pub enum SdfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported input: {0}")]
    Unsupported(String),

    #[error("no molecules found")]
    Empty,
}

impl SdfError {
    fn parse(line: usize, message: impl Into<String>) -> Self {
        SdfError::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type MoleculeIter = Box<dyn Iterator<Item = Result<Molecule, SdfError>>>;

/// Lazy reader over the records of an MDL SD file (V2000 connection tables).
///
/// A record that fails to parse is reported once and the reader resumes at the next `$$$$`.
pub struct SdfReader<R> {
    reader: BufReader<R>,
    line_number: usize,
    at_separator: bool,
    finished: bool,
}

impl<R: Read> SdfReader<R> {
    pub fn new(reader: R) -> Self {
        SdfReader {
            reader: BufReader::new(reader),
            line_number: 0,
            at_separator: false,
            finished: false,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>, SdfError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        self.at_separator = line.starts_with("$$$$");

        Ok(Some(line))
    }

    fn expect_line(&mut self, what: &str) -> Result<String, SdfError> {
        self.read_line()?.ok_or_else(|| {
            SdfError::parse(
                self.line_number,
                format!("unexpected end of file, expected {what}"),
            )
        })
    }

    fn parse_record(&mut self) -> Result<Option<Molecule>, SdfError> {
        // name, program and comment lines, then the counts line
        let mut header = Vec::with_capacity(4);
        while header.len() < 4 {
            match self.read_line()? {
                Some(line) => header.push(line),
                None if is_blank(&header) => return Ok(None),
                None => {
                    return Err(SdfError::parse(
                        self.line_number,
                        "unexpected end of file in header block",
                    ))
                }
            }
        }

        // padding after the last record
        if is_blank(&header) {
            while let Some(line) = self.read_line()? {
                if !line.trim().is_empty() {
                    return Err(SdfError::parse(self.line_number, "blank header block"));
                }
            }
            return Ok(None);
        }

        let name = header[0].trim().to_string();
        let (n_atoms, n_bonds) = parse_counts_line(&header[3], self.line_number)?;

        let mut atoms = Vec::with_capacity(n_atoms);
        for i in 0..n_atoms {
            let line = self.expect_line(&format!("atom {}", i + 1))?;
            atoms.push(parse_atom_line(&line, self.line_number)?);
        }

        let mut bonds = Vec::with_capacity(n_bonds);
        for i in 0..n_bonds {
            let line = self.expect_line(&format!("bond {}", i + 1))?;
            bonds.push(parse_bond_line(&line, n_atoms, self.line_number)?);
        }

        let mut molecule = Molecule {
            name,
            atoms,
            bonds,
            ..Default::default()
        };

        // property block
        loop {
            match self.read_line()? {
                None => return Ok(Some(molecule)),
                Some(line) if line.starts_with("$$$$") => return Ok(Some(molecule)),
                Some(line) if line.starts_with("M  END") => break,
                Some(_) => {}
            }
        }

        // data items, up to the record separator
        let mut current: Option<(String, Vec<String>)> = None;
        while let Some(line) = self.read_line()? {
            if line.starts_with("$$$$") {
                break;
            }
            match current.take() {
                Some((key, mut values)) => {
                    if line.trim().is_empty() {
                        molecule.properties.insert(key, values.join("\n"));
                    } else {
                        values.push(line);
                        current = Some((key, values));
                    }
                }
                None => {
                    if let Some(caps) = DATA_HEADER_RE.captures(&line) {
                        current = Some((caps[1].trim().to_string(), Vec::new()));
                    }
                }
            }
        }
        if let Some((key, values)) = current {
            molecule.properties.insert(key, values.join("\n"));
        }

        Ok(Some(molecule))
    }

    fn skip_record(&mut self) {
        while !self.at_separator {
            match self.read_line() {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => {
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

impl<R: Read> Iterator for SdfReader<R> {
    type Item = Result<Molecule, SdfError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.at_separator = false;

        match self.parse_record() {
            Ok(Some(molecule)) => Some(Ok(molecule)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(SdfError::Io(e)) => {
                self.finished = true;
                Some(Err(SdfError::Io(e)))
            }
            Err(e) => {
                self.skip_record();
                Some(Err(e))
            }
        }
    }
}

/// Opens an SD file as a lazy sequence of molecules. Gzipped files need the `rdkit` feature.
pub fn open_sdf(path: impl AsRef<Path>) -> Result<MoleculeIter, SdfError> {
    let path = path.as_ref();
    if path.extension().map_or(false, |ext| ext == "gz") {
        return open_gz_sdf(path);
    }

    let file = File::open(path)?;
    Ok(Box::new(SdfReader::new(file)))
}

/// Parses a single mol block.
pub fn parse_mol_block(block: &str) -> Result<Molecule, SdfError> {
    SdfReader::new(block.as_bytes())
        .next()
        .unwrap_or(Err(SdfError::Empty))
}

#[cfg(feature = "rdkit")]
fn open_gz_sdf(path: &Path) -> Result<MoleculeIter, SdfError> {
    let path = path
        .to_str()
        .ok_or_else(|| SdfError::Unsupported(format!("non UTF-8 path {:?}", path)))?;

    let mol_iter = rdkit::MolBlockIter::from_gz_file(path, false, false, false)
        .map_err(|e| SdfError::Unsupported(format!("could not read gz file: {:?}", e)))?;

    Ok(Box::new(mol_iter.map(|mol| match mol {
        Ok(m) => parse_mol_block(&m.to_ro_mol().to_molblock()),
        Err(e) => Err(SdfError::parse(0, e)),
    })))
}

#[cfg(not(feature = "rdkit"))]
fn open_gz_sdf(path: &Path) -> Result<MoleculeIter, SdfError> {
    Err(SdfError::Unsupported(format!(
        "{} is gzipped; rebuild with the `rdkit` feature to read it",
        path.display()
    )))
}

fn is_blank(lines: &[String]) -> bool {
    lines.iter().all(|line| line.trim().is_empty())
}

fn field<T: FromStr>(line: &str, range: Range<usize>) -> Option<T> {
    line.get(range)?.trim().parse().ok()
}

fn parse_counts_line(line: &str, line_number: usize) -> Result<(usize, usize), SdfError> {
    // aaabbblllfffcccsssxxxrrrpppiiimmmvvvvvv
    let is_v3000 = line.get(33..39).map_or(false, |s| s.trim() == "V3000")
        || line.trim_end().ends_with("V3000");
    if is_v3000 {
        return Err(SdfError::Unsupported(format!(
            "V3000 connection table at line {line_number}"
        )));
    }

    let fixed = field(line, 0..3).zip(field(line, 3..6));
    let loose = || {
        let mut parts = line.split_whitespace();
        let atoms = parts.next()?.parse().ok()?;
        let bonds = parts.next()?.parse().ok()?;
        Some((atoms, bonds))
    };

    let (n_atoms, n_bonds) = fixed
        .or_else(loose)
        .ok_or_else(|| SdfError::parse(line_number, format!("invalid counts line {line:?}")))?;

    if n_atoms > MAX_V2000_COUNT || n_bonds > MAX_V2000_COUNT {
        return Err(SdfError::parse(
            line_number,
            format!("{n_atoms} atoms, {n_bonds} bonds exceed the V2000 limit of {MAX_V2000_COUNT}"),
        ));
    }

    Ok((n_atoms, n_bonds))
}

fn parse_atom_line(line: &str, line_number: usize) -> Result<Atom, SdfError> {
    // xxxxx.xxxxyyyyy.yyyyzzzzz.zzzz aaaddcccssshhhbbbvvvHHHrrriiimmmnnneee
    let fixed = || {
        let x = field(line, 0..10)?;
        let y = field(line, 10..20)?;
        let z = field(line, 20..30)?;
        let symbol = line.get(31..34)?.trim();
        (!symbol.is_empty()).then(|| Atom::new(symbol, Point::new(x, y, z)))
    };
    let loose = || {
        let mut parts = line.split_whitespace();
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        let symbol = parts.next()?;
        Some(Atom::new(symbol, Point::new(x, y, z)))
    };

    let atom = fixed()
        .or_else(loose)
        .ok_or_else(|| SdfError::parse(line_number, format!("invalid atom line {line:?}")))?;

    if atom.position.coords.iter().any(|v| !v.is_finite()) {
        return Err(SdfError::parse(
            line_number,
            format!("non-finite atom coordinates {line:?}"),
        ));
    }

    Ok(atom)
}

fn parse_bond_line(line: &str, n_atoms: usize, line_number: usize) -> Result<Bond, SdfError> {
    // 111222tttsssxxxrrrccc
    let fixed = || {
        let begin: usize = field(line, 0..3)?;
        let end: usize = field(line, 3..6)?;
        let order: u8 = field(line, 6..9).unwrap_or(1);
        Some((begin, end, order))
    };
    let loose = || {
        let mut parts = line.split_whitespace();
        let begin: usize = parts.next()?.parse().ok()?;
        let end: usize = parts.next()?.parse().ok()?;
        let order: u8 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
        Some((begin, end, order))
    };

    let (begin, end, order) = fixed()
        .or_else(loose)
        .ok_or_else(|| SdfError::parse(line_number, format!("invalid bond line {line:?}")))?;

    let in_range = |idx: usize| (1..=n_atoms).contains(&idx);
    if !in_range(begin) || !in_range(end) || begin == end {
        return Err(SdfError::parse(
            line_number,
            format!("bond {begin}-{end} does not join two of the {n_atoms} atoms"),
        ));
    }

    Ok(Bond {
        begin: begin - 1,
        end: end - 1,
        order: BondOrder::from_mdl(order),
    })
}
