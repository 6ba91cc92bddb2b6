pub mod smart_rmsd;

pub mod prelude {
    pub use clap::{Arg, ArgAction, ArgMatches, Command};

    pub use crate::matching::MatchMode;
    pub use crate::scoring::*;
}
