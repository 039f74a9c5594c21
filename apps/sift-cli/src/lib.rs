use std::{fs, path::PathBuf, sync::Arc};

use clap::{
	Parser,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre::{self, WrapErr};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use sift_providers::HttpClient;
use sift_service::{ClusterRequest, ClusterResponse, ContentItem, Providers, SiftService};
use sift_storage::{db::Db, queries};

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab", styles = styles())]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON file holding either an array of `{url, title, content}` items or a full cluster
	/// request.
	#[arg(long, short = 'i', value_name = "FILE")]
	pub input: PathBuf,
	#[arg(long)]
	pub epsilon: Option<f32>,
	#[arg(long)]
	pub min_points: Option<usize>,
	/// Drop the noise group from the output.
	#[arg(long)]
	pub exclude_noise: bool,
	/// Ignore any cached result for this input and replace it.
	#[arg(long)]
	pub refresh: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputFile {
	Items(Vec<ContentItem>),
	Request(ClusterRequest),
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;

	init_tracing(&config)?;

	let req = read_request(&args)?;
	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let purged = queries::purge_expired_cluster_results(&db.pool, OffsetDateTime::now_utc()).await?;

	if purged > 0 {
		tracing::info!(purged, "Purged expired cluster results.");
	}

	let providers = Providers::http(HttpClient::new()?);
	let service = SiftService::new(config, Arc::new(db), providers);
	let mut response = service.cluster(req).await?;

	if args.exclude_noise {
		drop_noise(&mut response);
	}

	println!("{}", serde_json::to_string_pretty(&response)?);

	Ok(())
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

fn read_request(args: &Args) -> color_eyre::Result<ClusterRequest> {
	let raw = fs::read_to_string(&args.input)
		.wrap_err_with(|| format!("Failed to read input {}.", args.input.display()))?;

	parse_request(&raw, args)
}

fn parse_request(raw: &str, args: &Args) -> color_eyre::Result<ClusterRequest> {
	let input: InputFile = serde_json::from_str(raw)
		.map_err(|err| eyre::eyre!("Input is neither an item array nor a cluster request: {err}."))?;
	let mut req = match input {
		InputFile::Items(items) => ClusterRequest::from_items(items),
		InputFile::Request(req) => req,
	};

	if args.epsilon.is_some() {
		req.epsilon = args.epsilon;
	}
	if args.min_points.is_some() {
		req.min_points = args.min_points;
	}
	if args.refresh {
		req.refresh = true;
	}

	Ok(req)
}

fn drop_noise(response: &mut ClusterResponse) {
	response.summaries.retain(|summary| !summary.is_noise());
}

fn init_tracing(config: &sift_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	// Results go to stdout, so logs stay on stderr.
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
