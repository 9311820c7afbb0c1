//! `tracegraph` command line
//!
//! Thin driver over [`trace_session::Session`]. Results are printed as
//! JSON on stdout; logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use trace_graph::LayeredLayout;
use trace_model::wire::CodeReferenceUpdate;
use trace_model::ArtifactId;
use trace_session::{Proposal, Session, TraceConfig};
use tracing_subscriber::EnvFilter;

fn parent_arg() -> Arg {
    Arg::new("parent")
        .long("parent")
        .value_name("ID")
        .help("Expand this container first")
}

fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).required(true).help(help)
}

fn cli() -> Command {
    Command::new("tracegraph")
        .version(trace_session::VERSION)
        .about("Requirement, block and generated-code traceability graph")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .value_name("URL")
                .help("Collaborator service root, overrides config and environment"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("view")
                .about("Compose and lay out the current view")
                .arg(parent_arg()),
        )
        .subcommand(
            Command::new("impact")
                .about("Downstream impact set of an artifact")
                .arg(id_arg("id", "Artifact to select"))
                .arg(parent_arg()),
        )
        .subcommand(
            Command::new("versions")
                .about("Version timeline of an artifact")
                .arg(id_arg("id", "Artifact id")),
        )
        .subcommand(
            Command::new("diff")
                .about("Diff a version snapshot against a baseline")
                .arg(id_arg("version", "Version id"))
                .arg(
                    Arg::new("baseline")
                        .long("baseline")
                        .value_name("VERSION")
                        .help("Baseline version id; empty diff when absent"),
                ),
        )
        .subcommand(
            Command::new("diff-latest")
                .about("Diff the latest version of an artifact against its predecessor")
                .arg(id_arg("id", "Artifact id")),
        )
        .subcommand(
            Command::new("connect")
                .about("Create a traceability connection")
                .arg(id_arg("source", "Source artifact"))
                .arg(id_arg("target", "Target artifact"))
                .arg(parent_arg()),
        )
        .subcommand(
            Command::new("code-ref")
                .about("Update a generated-code reference of a block")
                .arg(
                    Arg::new("block-sid")
                        .long("block-sid")
                        .required(true)
                        .help("Block identifier"),
                )
                .arg(
                    Arg::new("block-path")
                        .long("block-path")
                        .required(true)
                        .help("Block path inside the model"),
                )
                .arg(
                    Arg::new("file")
                        .long("file")
                        .required(true)
                        .help("Generated source file"),
                )
                .arg(
                    Arg::new("index")
                        .long("index")
                        .default_value("0")
                        .value_parser(value_parser!(usize))
                        .help("Index of the reference to update"),
                )
                .arg(
                    Arg::new("line")
                        .long("line")
                        .value_parser(value_parser!(u64))
                        .help("New line number"),
                )
                .arg(Arg::new("code").long("code").help("New code excerpt"))
                .arg(parent_arg()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<TraceConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => TraceConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => TraceConfig::default(),
    }
    .with_env_overrides();

    Ok(match matches.get_one::<String>("base-url") {
        Some(url) => config.with_base_url(url.clone()),
        None => config,
    })
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("missing argument <{name}>"))
}

fn print(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load collaborator data and expand `--parent` when given
async fn prepare(session: &Session, args: &ArgMatches) -> Result<()> {
    session.load().await.context("loading collaborator data")?;
    if let Some(parent) = args.get_one::<String>("parent") {
        session
            .expand(parent.as_str())
            .await
            .with_context(|| format!("expanding container {parent}"))?;
    }
    Ok(())
}

async fn view(session: &Session, args: &ArgMatches) -> Result<()> {
    prepare(session, args).await?;
    let view = session.view()?;
    let layout = view.positioned(&LayeredLayout::default());
    print(&json!({ "view": &*view, "layout": layout }))
}

async fn impact(session: &Session, args: &ArgMatches) -> Result<()> {
    prepare(session, args).await?;
    let id = required(args, "id")?;
    let state = session.select(id.as_str())?;
    print(&json!({ "selected": id, "impact": state.highlighted() }))
}

async fn versions(session: &Session, args: &ArgMatches) -> Result<()> {
    let id = ArtifactId::new(required(args, "id")?.as_str());
    let timeline = session.versions(&id).await?;
    print(&json!({ "artifact_id": id, "versions": timeline.versions() }))
}

async fn diff(session: &Session, args: &ArgMatches) -> Result<()> {
    let version = required(args, "version")?;
    let baseline = args.get_one::<String>("baseline").map(String::as_str);
    print(&session.diff(version, baseline).await?)
}

async fn diff_latest(session: &Session, args: &ArgMatches) -> Result<()> {
    let id = ArtifactId::new(required(args, "id")?.as_str());
    print(&session.diff_latest(&id).await?)
}

async fn connect(session: &Session, args: &ArgMatches) -> Result<()> {
    prepare(session, args).await?;
    let source = required(args, "source")?;
    let target = required(args, "target")?;

    match session.connect(source.as_str(), target.as_str()).await? {
        Proposal::Accepted => print(&json!({ "outcome": "accepted", "source": source, "target": target })),
        Proposal::Redirected(container) => print(&json!({
            "outcome": "redirected",
            "container": container,
            "hint": format!("re-run with --parent {container} and a target inside it"),
        })),
        Proposal::Rejected(reason) if reason.is_silent() => {
            print(&json!({ "outcome": "unchanged", "reason": reason.to_string() }))
        }
        Proposal::Rejected(reason) => bail!("{reason}"),
    }
}

async fn code_ref(session: &Session, args: &ArgMatches) -> Result<()> {
    prepare(session, args).await?;
    let update = CodeReferenceUpdate {
        block_sid: ArtifactId::new(required(args, "block-sid")?.as_str()),
        block_path: required(args, "block-path")?.clone(),
        file_path: required(args, "file")?.clone(),
        ref_index: args.get_one::<usize>("index").copied().unwrap_or_default(),
        line: args.get_one::<u64>("line").copied(),
        code: args.get_one::<String>("code").cloned(),
    };

    let response = session.update_code_reference(&update).await?;
    if !response.success {
        bail!(
            "code reference update refused: {}",
            response.message.as_deref().unwrap_or("no reason given")
        );
    }
    print(&response)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let config = load_config(&matches)?;
    tracing::debug!(base_url = %config.service.base_url, "Starting tracegraph");
    let session = Session::over_http(config)?;

    match matches.subcommand() {
        Some(("view", args)) => view(&session, args).await,
        Some(("impact", args)) => impact(&session, args).await,
        Some(("versions", args)) => versions(&session, args).await,
        Some(("diff", args)) => diff(&session, args).await,
        Some(("diff-latest", args)) => diff_latest(&session, args).await,
        Some(("connect", args)) => connect(&session, args).await,
        Some(("code-ref", args)) => code_ref(&session, args).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let matches = cli()
            .try_get_matches_from([
                "tracegraph",
                "connect",
                "R1",
                "P1",
                "--base-url",
                "http://backend:8080/api",
                "--log-json",
            ])
            .unwrap();
        assert!(matches.get_flag("log-json"));

        let config = load_config(&matches).unwrap();
        assert_eq!(config.service.base_url, "http://backend:8080/api");

        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "connect");
        assert_eq!(required(args, "target").unwrap(), "P1");
    }

    #[test]
    fn code_ref_requires_block_arguments() {
        let err = cli()
            .try_get_matches_from(["tracegraph", "code-ref", "--file", "model.c"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
