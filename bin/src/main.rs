/*!
This binary computes the answer sets of HEX programs, i.e. answer set programs with external
atoms. The program is split into evaluation units by a heuristic and the answer sets are built
online out of the models of the units.

Programs are read as JSON, see the documentation of the `hex_eval` library for the format.
Each answer set is printed on its own line, either as `{a,b}` or as a JSON array of atoms.

# Usage
```plain
Usage: hex-eval [OPTIONS] <INPUT>

Arguments:
  <INPUT>  Input filename

Options:
      --rust_log <RUST_LOG>          Sets the verbosity to 'warn', 'info', 'debug' or 'trace' if -v and -q are not use [env: RUST_LOG=]
  -v...                              Sets log verbosity (multiple times means more verbose)
  -q                                 Sets log verbosity to only errors
      --heu <HEU>                    Choose the heuristic which creates the evaluation units [default: Greedy] [possible values: Trivial, Monolithic, Easy, Greedy]
  -n, --models <MODELS>              Stop after the given number of answer sets
      --constant-space               Free the models of the units as soon as they are superseded
      --no-redundancy-elimination    Build a new input model for every combination of predecessor models
      --max-guess <MAX_GUESS>        Maximal number of guessed atoms per unit [default: 20]
      --max-ground <MAX_GROUND>      Maximal number of ground rules per unit [default: 100000]
      --dot-depgraph <DOT_DEPGRAPH>  Write the dependency graph in the dot language to the given file
      --dot-compgraph <DOT_COMPGRAPH>
                                     Write the component graph in the dot language to the given file
      --dot-evalgraph <DOT_EVALGRAPH>
                                     Write the evaluation graph in the dot language to the given file
      --json                         Print each answer set as a JSON array of atoms
      --stats                        Print the statistics of the model builder after the answer sets
  -h, --help                         Print help
  -V, --version                      Print version
```
 */

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences
)]

use std::{
    path::{Path, PathBuf},
    rc::Rc,
    str::FromStr,
};

use clap::{builder::PossibleValuesParser, ArgAction, Parser};
use crossbeam_channel::{unbounded, Sender};
use hex_eval::{
    builder::{ModelBuilderConfig, OnlineModelBuilder, Statistics},
    compgraph::ComponentGraph,
    datatypes::{Program, Registry},
    depgraph::DependencyGraph,
    error::Error,
    evalgraph::{builder::EvalGraphBuilder, heuristics::Heuristic},
    naive::{NaiveBackend, DEFAULT_MAX_GROUND_RULES, DEFAULT_MAX_GUESS_ATOMS},
};
use strum::VariantNames;

#[derive(Parser, Debug, Clone)]
#[command(name = "hex-eval", author, version, about)]
struct App {
    /// Input filename
    input: PathBuf,
    /// Sets the verbosity to 'warn', 'info', 'debug' or 'trace' if -v and -q are not use
    #[arg(long = "rust_log", env = "RUST_LOG")]
    rust_log: Option<String>,
    /// Sets log verbosity (multiple times means more verbose)
    #[arg(short, action = ArgAction::Count, group = "verbosity")]
    verbose: u8,
    /// Sets log verbosity to only errors
    #[arg(short, group = "verbosity")]
    quiet: bool,
    /// Choose the heuristic which creates the evaluation units
    #[arg(
        long,
        default_value = "Greedy",
        value_parser = PossibleValuesParser::new(
            Heuristic::VARIANTS
                .iter()
                .filter(|&v| v != &"Manual" && v != &"Custom")
                .copied()
        )
    )]
    heu: String,
    /// Stop after the given number of answer sets
    #[arg(short = 'n', long = "models")]
    models: Option<usize>,
    /// Free the models of the units as soon as they are superseded
    #[arg(long)]
    constant_space: bool,
    /// Build a new input model for every combination of predecessor models
    #[arg(long)]
    no_redundancy_elimination: bool,
    /// Maximal number of guessed atoms per unit
    #[arg(long, default_value_t = DEFAULT_MAX_GUESS_ATOMS)]
    max_guess: usize,
    /// Maximal number of ground rules per unit
    #[arg(long, default_value_t = DEFAULT_MAX_GROUND_RULES)]
    max_ground: usize,
    /// Write the dependency graph in the dot language to the given file
    #[arg(long)]
    dot_depgraph: Option<PathBuf>,
    /// Write the component graph in the dot language to the given file
    #[arg(long)]
    dot_compgraph: Option<PathBuf>,
    /// Write the evaluation graph in the dot language to the given file
    #[arg(long)]
    dot_evalgraph: Option<PathBuf>,
    /// Print each answer set as a JSON array of atoms
    #[arg(long)]
    json: bool,
    /// Print the statistics of the model builder after the answer sets
    #[arg(long)]
    stats: bool,
}

impl App {
    fn run(&self) {
        let filter_level = match self.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            3 => log::LevelFilter::Trace,
            _ => {
                if self.quiet {
                    log::LevelFilter::Error
                } else if let Some(rust_log) = self.rust_log.clone() {
                    match rust_log.as_str() {
                        "error" => log::LevelFilter::Error,
                        "info" => log::LevelFilter::Info,
                        "debug" => log::LevelFilter::Debug,
                        "trace" => log::LevelFilter::Trace,
                        _ => log::LevelFilter::Warn,
                    }
                } else {
                    log::LevelFilter::Warn
                }
            }
        };
        env_logger::builder().filter_level(filter_level).init();
        log::info!("Version: {}", clap::crate_version!());

        let input = match std::fs::read_to_string(&self.input) {
            Ok(input) => input,
            Err(e) => {
                log::error!("Cannot read <{}>: {}", self.input.to_string_lossy(), e);
                std::process::exit(1);
            }
        };

        let (sender, receiver) = unbounded();
        let app = self.clone();
        let solving = std::thread::spawn(move || app.solve(&input, sender));
        for atoms in receiver.iter() {
            if self.json {
                match serde_json::to_string(&atoms) {
                    Ok(line) => println!("{}", line),
                    Err(e) => log::error!("Cannot serialise answer set: {}", e),
                }
            } else {
                println!("{{{}}}", atoms.join(","));
            }
        }

        match solving.join() {
            Ok(Ok((count, stats))) => {
                log::info!("{} answer sets", count);
                if self.stats {
                    println!("{}", stats);
                }
            }
            Ok(Err(e)) => {
                log::error!("Evaluation failed: {}", e);
                std::process::exit(1);
            }
            Err(_) => {
                log::error!("Evaluation thread panicked");
                std::process::exit(2);
            }
        }
    }

    /// Runs the whole evaluation and sends the atoms of each answer set through the channel.
    fn solve(&self, input: &str, sender: Sender<Vec<String>>) -> Result<(usize, Statistics), Error> {
        let mut registry = Registry::with_builtin_sources();
        let rules = Program::from_json(input)?.store(&mut registry)?;
        log::info!("[Done] parsing");

        let (depgraph, auxiliary) = DependencyGraph::new(&mut registry, &rules)?;
        log::debug!("{} auxiliary input rules", auxiliary.len());
        if let Some(path) = &self.dot_depgraph {
            write_dot(path, &depgraph.to_dot(&registry));
        }
        let compgraph = ComponentGraph::new(&depgraph, &registry)?;
        if let Some(path) = &self.dot_compgraph {
            write_dot(path, &compgraph.to_dot(&registry));
        }

        let registry = Rc::new(registry);
        let backend = NaiveBackend::new(registry.clone())
            .with_max_guess_atoms(self.max_guess)
            .with_max_ground_rules(self.max_ground);
        let mut builder = EvalGraphBuilder::new(compgraph, Rc::new(backend));
        let heuristic = Heuristic::from_str(&self.heu)
            .map_err(|e| Error::General(format!("unknown heuristic {}: {}", self.heu, e)))?;
        heuristic.build(&mut builder)?;
        let final_unit = builder.finalize()?;
        if let Some(path) = &self.dot_evalgraph {
            write_dot(path, &builder.eval_graph().to_dot());
        }

        let config = ModelBuilderConfig {
            redundancy_elimination: !self.no_redundancy_elimination,
            constant_space: self.constant_space,
        };
        let mut models = OnlineModelBuilder::new(builder.into_eval_graph(), config);
        let count = models.answer_sets_channel(final_unit, &registry, sender, self.models)?;
        Ok((count, models.statistics()))
    }
}

fn write_dot(path: &Path, dot: &str) {
    if path.exists() {
        log::error!(
            "Cannot write dot file <{}>, as it already exists",
            path.to_string_lossy()
        );
    } else if let Err(reason) = std::fs::write(path, dot) {
        log::error!("couldn't write {}: {}", path.to_string_lossy(), reason);
    } else {
        log::info!("[Done] writing {}", path.to_string_lossy());
    }
}

fn main() {
    let app = App::parse();
    app.run();
}
