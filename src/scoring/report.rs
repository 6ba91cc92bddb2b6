use std::io::Write;
use std::str::FromStr;

use super::PoseScore;
use crate::matching::MatchMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `POSE<TAB>RMSD_*` header, then one line per pose with two decimals (`NA` on failure).
    Tsv,
    /// One JSON object per line.
    Json,
}

impl FromStr for OutputFormat {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            other => Err(eyre::eyre!("unknown output format {:?}", other)),
        }
    }
}

pub fn write_header<W: Write>(
    out: &mut W,
    format: OutputFormat,
    mode: MatchMode,
) -> eyre::Result<()> {
    if format == OutputFormat::Tsv {
        writeln!(out, "POSE\t{}", mode.column_name())?;
    }
    Ok(())
}

pub fn write_score<W: Write>(
    out: &mut W,
    format: OutputFormat,
    score: &PoseScore,
) -> eyre::Result<()> {
    match format {
        OutputFormat::Tsv => match score.rmsd() {
            Some(rmsd) => writeln!(out, "{}\t{:.2}", score.pose, rmsd)?,
            None => writeln!(out, "{}\tNA", score.pose)?,
        },
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, score)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
