//! seedkit - load and clear database fixtures in reference order
//!
//! ```text
//! seedkit --database app.db reset fixtures/shop.json
//! seedkit --database app.db delete customers
//! seedkit --database app.db plan fixtures/shop.json
//! seedkit --database app.db dump customers orders --output snapshot.json
//! ```

mod config;
mod logging;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use config::SeedkitConfig;
use seedkit_core::CancellationToken;
use seedkit_dependencies::InsertOrder;
use seedkit_services::{FixtureDocument, Seeder};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "seedkit",
    version,
    about = "Load and clear database fixtures in foreign key order"
)]
struct Cli {
    /// Database locator: `sqlite://<path>`, a file path or `:memory:`
    #[arg(long, short = 'd', env = "SEEDKIT_DATABASE", global = true)]
    database: Option<String>,

    /// Config file (default: <config dir>/seedkit/seedkit.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Clear the fixture tables and everything referencing them, then insert the fixture
    Reset {
        fixture: PathBuf,
        #[arg(long, value_enum)]
        insert_order: Option<OrderArg>,
        /// Insert without deleting first
        #[arg(long)]
        no_delete: bool,
    },
    /// Clear tables and everything referencing them
    Delete {
        #[arg(required = true)]
        tables: Vec<String>,
    },
    /// Print the delete and insert batches `reset` would run
    Plan {
        fixture: PathBuf,
        #[arg(long, value_enum)]
        insert_order: Option<OrderArg>,
    },
    /// Write table rows as a fixture document (all tables when none are named)
    Dump {
        tables: Vec<String>,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    ParentsFirst,
    LevelAscending,
}

impl From<OrderArg> for InsertOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::ParentsFirst => InsertOrder::ParentsFirst,
            OrderArg::LevelAscending => InsertOrder::LevelAscending,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SeedkitConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling pending work");
            trigger.cancel();
        }
    });

    let mut stdout = std::io::stdout().lock();
    run(cli, config, cancel, &mut stdout).await
}

/// Execute one command, writing command output to `out`
async fn run(
    cli: Cli,
    config: SeedkitConfig,
    cancel: CancellationToken,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let locator = cli
        .database
        .ok_or_else(|| anyhow!("no database given (use --database or SEEDKIT_DATABASE)"))?;
    let backend = seedkit_drivers::open(&locator)
        .with_context(|| format!("failed to open database {}", locator))?;
    let schema = backend
        .schema
        .fetch_schema()
        .await
        .context("failed to read database schema")?;

    let mut options = config.seeder;
    match &cli.command {
        Command::Reset {
            insert_order,
            no_delete,
            ..
        } => {
            if let Some(order) = insert_order {
                options.insert_order = (*order).into();
            }
            if *no_delete {
                options.delete_before_insert = false;
            }
        }
        Command::Plan {
            insert_order: Some(order),
            ..
        } => options.insert_order = (*order).into(),
        _ => {}
    }

    let seeder = Seeder::new(backend.deleter.clone(), backend.inserter.clone())
        .with_options(options)
        .with_cancellation(cancel);

    match cli.command {
        Command::Reset { fixture, .. } => {
            let document = load_fixture(&fixture)?;
            let report = seeder
                .reset(&schema, &document)
                .await
                .context("reset failed")?;
            writeln!(
                out,
                "deleted {} table(s) in {} batch(es), inserted {} row(s) into {} table(s)",
                report.deleted.tables,
                report.deleted.batches,
                report.inserted.rows,
                report.inserted.tables
            )?;
        }
        Command::Delete { tables } => {
            let summary = seeder
                .delete(&schema, tables.as_slice())
                .await
                .context("delete failed")?;
            writeln!(
                out,
                "deleted {} table(s) in {} batch(es)",
                summary.tables, summary.batches
            )?;
        }
        Command::Plan { fixture, .. } => {
            let document = load_fixture(&fixture)?;
            let plan = seeder.plan(&schema, &document).context("planning failed")?;
            writeln!(out, "{}", serde_json::to_string_pretty(&plan)?)?;
        }
        Command::Dump { tables, output } => {
            let document = seeder
                .dump(&schema, backend.dumper.as_ref(), tables.as_slice())
                .await
                .context("dump failed")?;
            let json = document.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), tables = document.len(), "wrote dump");
                }
                None => writeln!(out, "{}", json)?,
            }
        }
    }

    Ok(())
}

fn load_fixture(path: &std::path::Path) -> anyhow::Result<FixtureDocument> {
    FixtureDocument::from_path(path)
        .with_context(|| format!("failed to load fixture {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use seedkit_drivers::sqlite::SqliteBackend;

    const SCHEMA: &str = "
        CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE books (
            id INTEGER PRIMARY KEY,
            author_id INTEGER NOT NULL REFERENCES authors(id),
            price NUMERIC
        );
    ";

    const FIXTURE: &str = r#"[
        {"name": "books", "rows": [{"id": 10, "author_id": 1, "price": 12.5}]},
        {"name": "authors", "rows": [{"id": 1, "name": "Le Guin"}]}
    ]"#;

    struct Workspace {
        dir: tempfile::TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let backend = SqliteBackend::open(dir.path().join("lib.db").to_str().unwrap()).unwrap();
            backend.execute_batch(SCHEMA).unwrap();
            std::fs::write(dir.path().join("fixture.json"), FIXTURE).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> String {
            self.dir.path().join(name).to_string_lossy().into_owned()
        }

        async fn run(&self, args: &[&str]) -> anyhow::Result<String> {
            let db = self.path("lib.db");
            let mut argv = vec!["seedkit", "--database", db.as_str()];
            argv.extend_from_slice(args);
            let cli = Cli::try_parse_from(argv)?;

            let mut out = Vec::new();
            run(cli, SeedkitConfig::default(), CancellationToken::new(), &mut out).await?;
            Ok(String::from_utf8(out)?)
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reset_flags() {
        let cli = Cli::try_parse_from([
            "seedkit",
            "reset",
            "shop.json",
            "--insert-order",
            "level-ascending",
            "--no-delete",
            "-d",
            "shop.db",
        ])
        .unwrap();

        assert_eq!(cli.database.as_deref(), Some("shop.db"));
        match cli.command {
            Command::Reset {
                fixture,
                insert_order,
                no_delete,
            } => {
                assert_eq!(fixture, PathBuf::from("shop.json"));
                assert_eq!(insert_order, Some(OrderArg::LevelAscending));
                assert!(no_delete);
            }
            other => panic!("expected reset, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_requires_tables() {
        assert!(Cli::try_parse_from(["seedkit", "delete"]).is_err());
    }

    #[tokio::test]
    async fn test_reset_then_dump() {
        let ws = Workspace::new();
        let fixture = ws.path("fixture.json");

        let out = ws.run(&["reset", fixture.as_str()]).await.unwrap();
        assert_eq!(
            out.trim(),
            "deleted 2 table(s) in 2 batch(es), inserted 2 row(s) into 2 table(s)"
        );

        let dumped = ws.run(&["dump"]).await.unwrap();
        let document = FixtureDocument::from_json(&dumped).unwrap();
        assert_eq!(document.table_names(), vec!["authors", "books"]);
        assert_eq!(document.tables[1].rows[0]["author_id"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_dump_to_file() {
        let ws = Workspace::new();
        let fixture = ws.path("fixture.json");
        let output = ws.path("out.json");
        ws.run(&["reset", fixture.as_str()]).await.unwrap();

        let printed = ws
            .run(&["dump", "authors", "--output", output.as_str()])
            .await
            .unwrap();
        assert!(printed.is_empty());

        let document = FixtureDocument::from_path(&output).unwrap();
        assert_eq!(document.table_names(), vec!["authors"]);
    }

    #[tokio::test]
    async fn test_plan_prints_batches() {
        let ws = Workspace::new();
        let fixture = ws.path("fixture.json");

        let out = ws.run(&["plan", fixture.as_str()]).await.unwrap();
        let plan: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(plan["delete"][0]["tables"], serde_json::json!(["books"]));
        assert_eq!(plan["insert"][0]["tables"], serde_json::json!(["authors"]));
    }

    #[tokio::test]
    async fn test_unknown_table_is_reported() {
        let ws = Workspace::new();
        let err = ws.run(&["delete", "publishers"]).await.unwrap_err();
        assert!(format!("{:#}", err).contains("publishers"), "{:#}", err);
    }
}
