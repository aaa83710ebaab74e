use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use funding_recsys::encoder::image::read_image_embeddings;
use funding_recsys::{
    ArtifactPaths, CatalogBuilder, CatalogSnapshot, EngineConfig, FactorScorer, FundingRecord,
    InteractionRecord, ItemId, UserId,
};

#[derive(Parser, Debug)]
#[command(
    name = "funding-recsys",
    about = "Train, index and query the funding catalog recommender"
)]
struct Cli {
    /// JSON engine config; missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// trace | debug | info | warn | error
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the factor model on `[{"user", "item"}]` rows and write factors + codec
    Train {
        #[arg(long)]
        interactions: PathBuf,
        /// directory receiving factors.cbor and codec.cbor
        #[arg(long, default_value = "artifacts")]
        out: PathBuf,
    },
    /// Build the catalog snapshot (text model, text/image indexes, funding data)
    BuildCatalog {
        /// `[{"item", "description"}]`
        #[arg(long)]
        descriptions: Option<PathBuf>,
        /// image embedding export, `[{"image_url", "embedding"}]`
        #[arg(long)]
        images: Option<PathBuf>,
        /// `[{"item", "base_amount", "paid_amount", "goal_amount"}]`
        #[arg(long)]
        funding: Option<PathBuf>,
        #[arg(long, default_value = "artifacts/catalog.cbor")]
        out: PathBuf,
    },
    /// Top-k items for one user
    Recommend {
        #[arg(long, default_value = "artifacts")]
        artifacts: PathBuf,
        #[arg(long)]
        user: String,
        #[arg(long)]
        k: Option<usize>,
    },
    /// Text search over item descriptions
    SearchText {
        #[arg(long, default_value = "artifacts/catalog.cbor")]
        catalog: PathBuf,
        #[arg(long)]
        query: String,
        #[arg(long)]
        k: Option<usize>,
    },
    /// Order items by funding-success rate
    RankFunding {
        #[arg(long, default_value = "artifacts/catalog.cbor")]
        catalog: PathBuf,
        /// item ids to rank
        #[arg(required = true)]
        items: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
struct DescriptionRow {
    item: ItemId,
    description: String,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout は結果専用、ログは stderr へ
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber")?;

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("invalid config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Train { interactions, out } => {
            let records: Vec<InteractionRecord> = read_json(&interactions)?;
            info!(records = records.len(), "training");
            let model = funding_recsys::train(&records, &config.trainer, &ArtifactPaths::in_dir(&out))
                .context("training failed")?;
            for (epoch, loss) in model.loss_history.iter().enumerate() {
                println!("epoch {}\tloss {:.6}", epoch + 1, loss);
            }
            println!("run {}", model.run_id);
        }
        Command::BuildCatalog {
            descriptions,
            images,
            funding,
            out,
        } => {
            let mut builder = CatalogBuilder::new();
            if let Some(path) = descriptions {
                let rows: Vec<DescriptionRow> = read_json(&path)?;
                builder.descriptions(rows.into_iter().map(|r| (r.item, r.description)));
            }
            if let Some(path) = images {
                builder.image_vectors(
                    read_image_embeddings(&path)
                        .with_context(|| format!("failed to import {}", path.display()))?,
                );
            }
            if let Some(path) = funding {
                let records: Vec<FundingRecord> = read_json(&path)?;
                builder.funding(records);
            }
            let snapshot = builder.build().context("catalog build failed")?;
            snapshot.save(&out)?;
        }
        Command::Recommend { artifacts, user, k } => {
            let scorer = FactorScorer::load(&ArtifactPaths::in_dir(&artifacts))?;
            let hits = scorer.recommend(&UserId::from(user), k.unwrap_or(config.default_top_k))?;
            print!("{}", hits);
        }
        Command::SearchText { catalog, query, k } => {
            let snapshot = CatalogSnapshot::load(&catalog)?;
            let hits = snapshot.search_text(&query, k.unwrap_or(config.default_top_k))?;
            print!("{}", hits);
        }
        Command::RankFunding { catalog, items } => {
            let snapshot = CatalogSnapshot::load(&catalog)?;
            let items: Vec<ItemId> = items.into_iter().map(ItemId::from).collect();
            for (rank, (item, rate)) in snapshot.funding.rank_by_success_rate(&items)?.iter().enumerate() {
                let percent = snapshot
                    .funding
                    .get(item)
                    .and_then(|r| r.funding_percent())
                    .map_or_else(|| "-".to_string(), |p| format!("{}%", p));
                println!("{:>3}. {}\t{:.6}\t{}", rank + 1, item, rate, percent);
            }
        }
    }
    Ok(())
}
