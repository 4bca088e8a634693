use anyhow::{Context, Result};
use docprep::{Config, FlattenedMapping, LinkPolicy, LinkResolver};
use serde::Serialize;
use std::io::Write as _;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Link target paired with its published form.
#[derive(Debug, Serialize)]
struct ResolvedLink {
    link: String,
    resolved: String,
}

/// Machine readable result of a run, consumed by the site build step.
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    #[serde(flatten)]
    policy: &'a LinkPolicy,
    files: &'a FlattenedMapping,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    links: Vec<ResolvedLink>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate().context("Invalid configuration")?;

    let policy = config.link_policy();
    debug!(
        file_base = policy.bases().file_base(),
        dir_base = policy.bases().dir_base(),
        hosted_files = policy.hosted_files(),
        "computed link bases"
    );

    let flattener = config.flattener();
    let mapping = flattener.flatten().context("Failed to flatten documentation tree")?;

    if config.copy {
        let copied = mapping.copy_into(flattener.output_dir())?;
        info!(count = copied, output = %flattener.output_dir().display(), "copied sources");
    }

    let links = resolve_links(&config, &policy)?;

    let manifest = Manifest {
        policy: &policy,
        files: &mapping,
        links,
    };

    let output = if config.json {
        serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?
    } else {
        render_text(&manifest)
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output).context("Failed to write output")?;
    stdout.flush().context("Failed to write output")?;

    Ok(())
}

/// Resolves every `--resolve` link as written in the `--from` file.
fn resolve_links(config: &Config, policy: &LinkPolicy) -> Result<Vec<ResolvedLink>> {
    let Some(from) = &config.from else {
        return Ok(Vec::new());
    };

    let resolver = LinkResolver::new(policy, from);
    config
        .resolve
        .iter()
        .map(|link| {
            let resolved = resolver
                .resolve(link)
                .with_context(|| format!("Cannot resolve {} from {}", link, from.display()))?;
            Ok(ResolvedLink {
                link: link.clone(),
                resolved,
            })
        })
        .collect()
}

/// Formats manifest as aligned plain text.
fn render_text(manifest: &Manifest<'_>) -> String {
    let bases = manifest.policy.bases();
    let hosted = if manifest.policy.hosted_files() { "yes" } else { "no" };

    let mut out = format!(
        "file base:      {}\ndirectory base: {}\nhosted files:   {}\n",
        bases.file_base(),
        bases.dir_base(),
        hosted
    );

    for entry in manifest.files {
        out.push_str(&format!(
            "\n{} -> {}",
            entry.original_path().display(),
            entry.flat_name()
        ));
    }

    for link in &manifest.links {
        out.push_str(&format!("\n{} => {}", link.link, link.resolved));
    }

    out.trim_end().to_string()
}
