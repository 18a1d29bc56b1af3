use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tile_check_core::{
    ClusteringAlgorithm, ComparisonMode, LoadOptions, Preprocessing, RunOptions, SimilarityMetric,
};

const HELP_TEXT: &str = concat!(
    "tile-check (token-based similarity of source-code submissions)\n",
    "\n",
    "Usage:\n",
    "  tile-check [options] [root]\n",
    "\n",
    "Each direct child of <root> (default: current directory) is one submission.\n",
    "\n",
    "Options:\n",
    "  -l, --language <name>           Token frontend (default: c-style)\n",
    "  --min-tokens <n>                Minimum tile length (default: frontend value)\n",
    "  --similarity-threshold <f>      Drop comparisons below 0..1 (default: 0)\n",
    "  --shown-comparisons <n|all>     Keep the n most similar comparisons (default: all)\n",
    "  --base-code <path>              Template submission subtracted from every comparison\n",
    "  --subdirectory <name>           Only read files below this directory of each submission\n",
    "  --suffixes <a,b,...>            File suffixes to read (default: frontend suffixes)\n",
    "  --exclude-file <path>           File names to skip, one per line\n",
    "  --no-gitignore                  Do not respect .gitignore rules\n",
    "  --comparison-mode <name>        normal | ordered (default: normal)\n",
    "  --threads <n>                   Worker threads (default: one per core)\n",
    "  --timeout-secs <n>              Abort the run after n seconds\n",
    "  --verbosity <quiet|long>        Log level warn / debug (default: info)\n",
    "  --json                          Output JSON\n",
    "\n",
    "Clustering:\n",
    "  --cluster-skip                  Do not cluster submissions\n",
    "  --cluster-alg <name>            spectral | agglomerative (default: spectral)\n",
    "  --cluster-metric <name>         avg | min | max | intersection (default: avg)\n",
    "  --cluster-spectral-bandwidth <f>\n",
    "  --cluster-spectral-noise <f>\n",
    "  --cluster-spectral-min-runs <n>\n",
    "  --cluster-spectral-max-runs <n>\n",
    "  --cluster-spectral-kmeans-iterations <n>\n",
    "  --cluster-agg-threshold <f>     Merge while linkage similarity is above f (default: 0.2)\n",
    "  --cluster-agg-linkage <name>    average | min | max (default: average)\n",
    "  --cluster-pp-none               No preprocessing\n",
    "  --cluster-pp-cdf                Empirical CDF ranks (default)\n",
    "  --cluster-pp-percentile <f>     Keep values at or above the f-th percentile\n",
    "  --cluster-pp-threshold <f>      Zero values below f\n",
    "  -h, --help                      Show help\n",
    "\n",
    "Examples:\n",
    "  tile-check submissions/\n",
    "  tile-check --base-code template --cluster-alg agglomerative submissions/\n",
    "\n"
);

pub(crate) fn print_help() {
    print!("{HELP_TEXT}");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Long,
}

impl Verbosity {
    pub(crate) fn default_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Long => "debug",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedArgs {
    pub(crate) json: bool,
    pub(crate) verbosity: Verbosity,
    pub(crate) language: String,
    pub(crate) root: PathBuf,
    pub(crate) base_code: Option<PathBuf>,
    /// `None` takes the frontend's minimum.
    pub(crate) min_tokens: Option<usize>,
    /// `None` takes the frontend's ordering preference.
    pub(crate) comparison_mode: Option<ComparisonMode>,
    pub(crate) options: RunOptions,
    pub(crate) load: LoadOptions,
    /// Logged once the subscriber is installed.
    pub(crate) warnings: Vec<String>,
}

fn parse_usize(name: &str, raw: &str) -> Result<usize, String> {
    raw.parse::<usize>()
        .map_err(|_| format!("{name} must be a non-negative integer"))
}

fn parse_f64(name: &str, raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("{name} must be a number"))
}

fn value<'a>(argv: &'a [String], i: &mut usize, name: &str) -> Result<&'a str, String> {
    *i += 1;
    argv.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{name} requires a value"))
}

pub(crate) fn parse_args(argv: &[String]) -> Result<Option<ParsedArgs>, String> {
    let mut json = false;
    let mut verbosity = Verbosity::Normal;
    let mut language = "c-style".to_string();
    let mut root: Option<PathBuf> = None;
    let mut base_code: Option<PathBuf> = None;
    let mut min_tokens: Option<usize> = None;
    let mut comparison_mode: Option<ComparisonMode> = None;
    let mut options = RunOptions::default();
    let mut load = LoadOptions::default();
    let mut warnings = Vec::new();

    let mut i = 0;
    while i < argv.len() {
        let arg = argv[i].as_str();
        match arg {
            "-h" | "--help" => return Ok(None),
            "--" => {
                if let Some(rest) = argv.get(i + 1) {
                    root = Some(PathBuf::from(rest));
                }
                break;
            }
            "--json" => json = true,
            "-l" | "--language" => language = value(argv, &mut i, arg)?.to_string(),
            "--min-tokens" => min_tokens = Some(parse_usize(arg, value(argv, &mut i, arg)?)?),
            "--similarity-threshold" => {
                options.similarity_threshold = parse_f64(arg, value(argv, &mut i, arg)?)?;
            }
            "--shown-comparisons" => {
                let raw = value(argv, &mut i, arg)?;
                options.maximum_comparisons = match raw {
                    "all" | "-1" => None,
                    _ => Some(parse_usize(arg, raw)?),
                };
            }
            "--base-code" => base_code = Some(PathBuf::from(value(argv, &mut i, arg)?)),
            "--subdirectory" => load.subdirectory = Some(value(argv, &mut i, arg)?.to_string()),
            "--suffixes" => {
                load.suffixes = value(argv, &mut i, arg)?
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "--exclude-file" => {
                load.exclude_file = Some(PathBuf::from(value(argv, &mut i, arg)?));
            }
            "--no-gitignore" => load.respect_gitignore = false,
            "--comparison-mode" => {
                let raw = value(argv, &mut i, arg)?;
                comparison_mode = Some(raw.parse().unwrap_or_else(|_| {
                    warnings.push(format!(
                        "unknown comparison mode {raw:?}, falling back to {}",
                        ComparisonMode::Normal
                    ));
                    ComparisonMode::Normal
                }));
            }
            "--threads" => {
                options.worker_threads = Some(parse_usize(arg, value(argv, &mut i, arg)?)?);
            }
            "--timeout-secs" => {
                let secs = parse_usize(arg, value(argv, &mut i, arg)?)?;
                options.timeout = Some(Duration::from_secs(secs as u64));
            }
            "--verbosity" => {
                verbosity = match value(argv, &mut i, arg)? {
                    "quiet" => Verbosity::Quiet,
                    "long" => Verbosity::Long,
                    "normal" => Verbosity::Normal,
                    other => return Err(format!("--verbosity must be quiet or long (got {other})")),
                };
            }
            "--cluster-skip" => options.clustering.enabled = false,
            "--cluster-alg" => {
                options.clustering.algorithm = value(argv, &mut i, arg)?
                    .parse::<ClusteringAlgorithm>()
                    .map_err(|e| e.to_string())?;
            }
            "--cluster-metric" => {
                options.clustering.similarity_metric = value(argv, &mut i, arg)?
                    .parse::<SimilarityMetric>()
                    .map_err(|e| e.to_string())?;
            }
            "--cluster-spectral-bandwidth" => {
                options.clustering.spectral.kernel_bandwidth =
                    parse_f64(arg, value(argv, &mut i, arg)?)?;
            }
            "--cluster-spectral-noise" => {
                options.clustering.spectral.noise_variance =
                    parse_f64(arg, value(argv, &mut i, arg)?)?;
            }
            "--cluster-spectral-min-runs" => {
                options.clustering.spectral.min_runs = parse_usize(arg, value(argv, &mut i, arg)?)?;
            }
            "--cluster-spectral-max-runs" => {
                options.clustering.spectral.max_runs = parse_usize(arg, value(argv, &mut i, arg)?)?;
            }
            "--cluster-spectral-kmeans-iterations" => {
                options.clustering.spectral.kmeans_iterations =
                    parse_usize(arg, value(argv, &mut i, arg)?)?;
            }
            "--cluster-agg-threshold" => {
                options.clustering.agglomerative.threshold =
                    parse_f64(arg, value(argv, &mut i, arg)?)?;
            }
            "--cluster-agg-linkage" => {
                options.clustering.agglomerative.linkage = value(argv, &mut i, arg)?
                    .parse()
                    .map_err(|e: tile_check_core::ConfigError| e.to_string())?;
            }
            "--cluster-pp-none" => options.clustering.preprocessing = Preprocessing::None,
            "--cluster-pp-cdf" => options.clustering.preprocessing = Preprocessing::Cdf,
            "--cluster-pp-percentile" => {
                options.clustering.preprocessing =
                    Preprocessing::Percentile(parse_f64(arg, value(argv, &mut i, arg)?)?);
            }
            "--cluster-pp-threshold" => {
                options.clustering.preprocessing =
                    Preprocessing::Threshold(parse_f64(arg, value(argv, &mut i, arg)?)?);
            }
            _ if arg.starts_with('-') => return Err(format!("unknown option: {arg}")),
            _ => {
                if root.is_some() {
                    return Err("expected a single root directory".to_string());
                }
                root = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    let root = match root {
        Some(root) => root,
        None => env::current_dir().map_err(|e| format!("failed to get cwd: {e}"))?,
    };

    Ok(Some(ParsedArgs {
        json,
        verbosity,
        language,
        root,
        base_code,
        min_tokens,
        comparison_mode,
        options,
        load,
        warnings,
    }))
}
