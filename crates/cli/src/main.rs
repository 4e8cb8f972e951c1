use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::format::FmtSpan;
use walkdir::WalkDir;

use infractl_core::EnvConfig;
use infractl_pipeline::{ui, DeployOptions, InfraOptions};
use infractl_policy::{evaluate_manifests, evaluate_plan, PlanDoc, Report, RuleConfig, Verdict};
use infractl_tfcompat as tfc;

#[derive(Parser, Debug)]
#[command(author, version, about = "infractl — provision, validate, and deploy an AWS cloud-native stack")]
struct Cli {
    /// Environment config (YAML or .yml.age)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Working directory for rendered terraform
    #[arg(short, long, default_value = "out", global = true)]
    out: PathBuf,

    /// Runner
    #[arg(long, value_enum, default_value_t = Runner::Auto, global = true)]
    runner: Runner,

    /// Skip interactive confirmation gates
    #[arg(long, default_value_t = false, global = true)]
    auto_approve: bool,

    /// AGE identities (optional, for .age files)
    #[arg(long = "age-identity", global = true)]
    age_ids: Vec<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum Runner {
    Auto,
    Terraform,
    Tofu,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Write main.tf.json and stop
    Render,
    /// Render and initialize backend and providers
    Init,
    /// Render, plan, and evaluate policy over the plan
    Plan,
    /// Plan, then apply behind the policy and confirmation gates
    Apply,
    /// Tear the environment down (confirmed unless --auto-approve)
    Destroy,
    /// Evaluate policy over an existing plan JSON document
    Check {
        /// Output of `terraform show -json tfplan`
        #[arg(long)]
        plan: PathBuf,
    },
    /// Evaluate policy over Kubernetes manifest files or directories
    Lint {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Build, scan, push, and roll out application services
    Deploy {
        /// Image tag for every service built in this run
        #[arg(long)]
        tag: String,
        /// Deploy only these services (repeatable; default all configured)
        #[arg(long = "service")]
        services: Vec<String>,
        /// Skip the image vulnerability scan
        #[arg(long, default_value_t = false)]
        skip_scan: bool,
        /// Directory holding one docker build context per service
        #[arg(long, default_value = ".")]
        context_root: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt().json().with_span_events(FmtSpan::CLOSE).init();
    if let Err(err) = run() {
        ui::error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.cmd {
        Cmd::Render => {
            let cfg = load_config(&cli)?;
            infractl_pipeline::render(&cfg, &cli.out)?;
        }
        Cmd::Init => {
            let cfg = load_config(&cli)?;
            infractl_pipeline::init(&cfg, &infra_options(&cli))?;
        }
        Cmd::Plan => {
            let cfg = load_config(&cli)?;
            let outcome = infractl_pipeline::plan(&cfg, &infra_options(&cli))?;
            if outcome.report.verdict() == Verdict::Deny {
                anyhow::bail!("plan is blocked by policy");
            }
        }
        Cmd::Apply => {
            let cfg = load_config(&cli)?;
            infractl_pipeline::apply(&cfg, &infra_options(&cli))?;
        }
        Cmd::Destroy => {
            let cfg = load_config(&cli)?;
            infractl_pipeline::destroy(&cfg, &infra_options(&cli))?;
        }
        Cmd::Check { plan } => {
            let mut bytes =
                std::fs::read(plan).with_context(|| format!("read {}", plan.display()))?;
            let doc = PlanDoc::from_slice(&mut bytes)
                .with_context(|| format!("parse {}", plan.display()))?;
            let report = evaluate_plan(&doc, &rule_config(&cli)?);
            ui::print_report(&report);
            if report.verdict() == Verdict::Deny {
                anyhow::bail!("plan is blocked by policy");
            }
        }
        Cmd::Lint { paths } => {
            let rule_cfg = rule_config(&cli)?;
            let mut report = Report::default();
            for path in collect_manifest_paths(paths)? {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?;
                let docs = infractl_k8s::parse_docs(&text)
                    .with_context(|| format!("parse {}", path.display()))?;
                report = report.merged(evaluate_manifests(&docs, &rule_cfg));
            }
            ui::print_report(&report);
            if report.verdict() == Verdict::Deny {
                anyhow::bail!("manifests are blocked by policy");
            }
        }
        Cmd::Deploy { tag, services, skip_scan, context_root } => {
            let cfg = load_config(&cli)?;
            let opts = DeployOptions {
                tag: tag.clone(),
                services: services.clone(),
                context_root: context_root.clone(),
                skip_scan: *skip_scan,
                auto_approve: cli.auto_approve,
            };
            infractl_pipeline::deploy(&cfg, &opts)?;
        }
    }
    Ok(())
}

fn infra_options(cli: &Cli) -> InfraOptions {
    InfraOptions {
        workdir: cli.out.clone(),
        runner: match cli.runner {
            Runner::Terraform => Some(tfc::Runner::Terraform),
            Runner::Tofu => Some(tfc::Runner::Tofu),
            Runner::Auto => None,
        },
        auto_approve: cli.auto_approve,
    }
}

fn load_config(cli: &Cli) -> Result<EnvConfig> {
    let path = cli.file.as_ref().context("--file is required for this command")?;
    read_config(path, &cli.age_ids)
}

/// `.age` configs are decrypted in memory; plaintext never touches disk.
fn read_config(path: &Path, age_ids: &[PathBuf]) -> Result<EnvConfig> {
    let cfg = if path.extension().and_then(|s| s.to_str()) == Some("age") {
        let mut ids = Vec::new();
        for p in age_ids {
            ids.extend(infractl_crypto::load_identities(p)?);
        }
        let f = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
        let dec = infractl_crypto::decrypt_age_bytes(std::io::BufReader::new(f), &ids)?;
        EnvConfig::from_slice(dec.expose_secret())
    } else {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        EnvConfig::from_slice(&bytes)
    };
    cfg.with_context(|| format!("invalid environment config {}", path.display()))
}

/// Rule parameters come from the env config when one is given; `check` and
/// `lint` fall back to the defaults otherwise.
fn rule_config(cli: &Cli) -> Result<RuleConfig> {
    match &cli.file {
        Some(path) => {
            let cfg = read_config(path, &cli.age_ids)?;
            Ok(RuleConfig::from_overrides(&cfg.policy, Some(cfg.environment.as_str())))
        }
        None => Ok(RuleConfig::default()),
    }
}

/// Files pass through; directories are walked recursively (helm charts nest
/// manifests under `templates/`), contributing yaml/json files in sorted
/// order.
fn collect_manifest_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = Vec::new();
            for entry in WalkDir::new(path).follow_links(false) {
                let entry =
                    entry.with_context(|| format!("walk directory {}", path.display()))?;
                let is_manifest = matches!(
                    entry.path().extension().and_then(|s| s.to_str()),
                    Some("yml" | "yaml" | "json")
                );
                if entry.file_type().is_file() && is_manifest {
                    entries.push(entry.into_path());
                }
            }
            entries.sort();
            out.extend(entries);
        } else {
            out.push(path.clone());
        }
    }
    Ok(out)
}
