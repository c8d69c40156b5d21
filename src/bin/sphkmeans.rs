//! CLI entry point for the `sphkmeans` command-line tool.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use sphkmeans::cluster::{evaluate, LabelMap, PointStore, Seed, SphericalKmeans, MIN_POINTS};
use sphkmeans::io::{read_labels_path, read_points_path, write_assignments_path};
use sphkmeans::sink::{LogSink, WriterSink};

#[derive(Parser)]
#[command(
    name = "sphkmeans",
    about = "Cluster sparse documents with spherical (cosine) k-means"
)]
struct Cli {
    /// Point file: `id,"index,...","value,..."` per line
    input: PathBuf,

    /// Number of clusters (values below 2 are raised to 2)
    #[arg(short = 'k', long = "clusters")]
    clusters: usize,

    /// Where to write `id,cluster` lines for the best trial
    #[arg(short, long)]
    output: PathBuf,

    /// Ground-truth file (`id,label` per line); enables evaluation
    #[arg(short, long)]
    classes: Option<PathBuf>,

    /// Number of trials with seeds 1, 3, 5, ...; 0 uses a random seed
    #[arg(short, long, default_value = "1")]
    trials: usize,

    /// Run a single trial with this seed instead
    #[arg(long, conflicts_with = "trials")]
    seed: Option<u64>,

    /// Stop once an iteration changes at most this many points/centroids
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    threshold: i64,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Program stopped.");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> sphkmeans::Result<()> {
    let labels: Option<LabelMap> = cli
        .classes
        .as_ref()
        .map(|path| read_labels_path(path))
        .transpose()?;

    let mut store = PointStore::new();
    let summary = read_points_path(&cli.input, &mut store)?;
    if summary.skipped() > 0 {
        eprintln!(
            "Ignored {} invalid record(s): {} without attributes, {} with unmatched values, {} repeated, {} malformed.",
            summary.skipped(),
            summary.empty,
            summary.mismatched,
            summary.duplicate,
            summary.malformed
        );
    }
    if summary.added < MIN_POINTS {
        return Err(sphkmeans::Error::InvalidParameter {
            name: "input",
            message: "fewer than 2 data objects were added; unable to cluster",
        });
    }

    let k = cli.clusters.max(2);
    let seeds = match (cli.seed, cli.trials) {
        (Some(s), _) => vec![Seed::Fixed(s)],
        (None, 0) => vec![Seed::FromEntropy],
        (None, n) => Seed::odd_sequence(n),
    };

    let model = SphericalKmeans::new(k).with_threshold(cli.threshold);
    let data = store.prepare();

    let mut run_log = WriterSink::new(io::stderr());
    let mut report_log = WriterSink::new(io::stdout());
    let n_trials = seeds.len();

    let best = model.best_of_with(&data, &seeds, &mut run_log, |i, result| {
        report_log.append_line("Parameters:");
        report_log.append_line(&format!("  # of Clusters: {k}"));
        report_log.append_line(&format!("  # of Trials: {}/{n_trials}", i + 1));
        report_log.append_line(&format!("  Random Seed: {}", seeds[i]));
        report_log.append_line(&format!("  Data File: {}", cli.input.display()));
        report_log.append_line(&format!(
            "  Class File: {}",
            cli.classes
                .as_ref()
                .map_or_else(|| "undefined".to_string(), |p| p.display().to_string())
        ));
        report_log.append_line(&format!("  Output File: {}", cli.output.display()));
        report_log.append_line("");

        if let Some(labels) = &labels {
            evaluate(result, labels).emit(&mut report_log);
            report_log.append_line("");
        }
    })?;

    log::info!(
        "best trial: seed {:?}, objective {:.6}",
        best.seed(),
        best.objective()
    );
    write_assignments_path(&cli.output, best.point_clusters())?;
    Ok(())
}
