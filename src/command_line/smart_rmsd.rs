use std::io::Write;

use crate::command_line::prelude::*;
use crate::molecule::open_sdf;

pub const NAME: &str = "smart-rmsd";

pub fn command() -> Command {
    Command::new(NAME)
        .about("Symmetry-corrected RMSD between a reference ligand and docked poses")
        .arg(
            Arg::new("reference")
                .required(true)
                .num_args(1)
                .help("SD file holding the reference pose (first record is used)"),
        )
        .arg(
            Arg::new("poses")
                .required(true)
                .num_args(1)
                .help("SD file holding the poses to score"),
        )
        .arg(
            Arg::new("mode")
                .required(false)
                .num_args(1)
                .help("`fit` superposes each pose onto the reference before scoring"),
        )
        .arg(
            Arg::new("format")
                .required(false)
                .long("format")
                .short('f')
                .num_args(1)
                .value_parser(["tsv", "json"])
                .default_value("tsv"),
        )
        .arg(
            Arg::new("threads")
                .required(false)
                .long("threads")
                .short('t')
                .num_args(1),
        )
        .arg(
            Arg::new("max-automorphisms")
                .required(false)
                .long("max-automorphisms")
                .num_args(1),
        )
        .arg(
            Arg::new("keep-hydrogens")
                .long("keep-hydrogens")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("match-bond-orders")
                .long("match-bond-orders")
                .action(ArgAction::SetTrue),
        )
}

pub fn action(matches: &ArgMatches) -> eyre::Result<()> {
    let reference_path = matches
        .get_one::<String>("reference")
        .ok_or(eyre::eyre!("Failed to extract reference path"))?;
    let poses_path = matches
        .get_one::<String>("poses")
        .ok_or(eyre::eyre!("Failed to extract poses path"))?;

    let mode = match matches.get_one::<String>("mode").map(String::as_str) {
        Some("fit") => MatchMode::Fit,
        _ => MatchMode::NoFit,
    };
    let format = match matches.get_one::<String>("format") {
        Some(format) => format.parse::<OutputFormat>()?,
        None => OutputFormat::Tsv,
    };
    let max_automorphisms = match matches.get_one::<String>("max-automorphisms") {
        Some(limit) => Some(limit.parse::<usize>()?),
        None => None,
    };

    if let Some(threads) = matches.get_one::<String>("threads") {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads.parse::<usize>()?)
            .build_global()?;
    }

    let config = ScoringConfig {
        mode,
        strip_hydrogens: !matches.get_flag("keep-hydrogens"),
        max_automorphisms,
        match_bond_orders: matches.get_flag("match-bond-orders"),
        ..Default::default()
    };

    log::info!(
        "scoring reference={}, poses={}, mode={:?}",
        reference_path,
        poses_path,
        mode
    );

    let reference = open_sdf(reference_path)?
        .next()
        .ok_or(eyre::eyre!("No molecule found in {}", reference_path))??;
    let reference = ReferenceModel::new(&reference, &config);
    if reference.atom_count() == 0 {
        log::warn!("reference in {} has no atoms to compare", reference_path);
    }
    log::info!(
        "reference: {} atoms, {} automorphisms",
        reference.atom_count(),
        reference.automorphisms().len()
    );

    let poses = open_sdf(poses_path)?;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    write_header(&mut out, format, mode)?;

    let counter = score_poses(&reference, poses, &config, |score| {
        write_score(&mut out, format, score)
    })?;
    out.flush()?;

    log::info!("{} poses processed", counter);

    Ok(())
}
