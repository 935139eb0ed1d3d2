use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wordtrace::cli::{AnnotateArgs, Cli, Command, IngestArgs, SearchArgs};
use wordtrace::config::Settings;
use wordtrace::ocr::{self, PopplerRasterizer, TesseractOcr};
use wordtrace::repository::pool::{create_pool, SqlitePool};
use wordtrace::repository::{
    migrations, DieselDocumentRepository, DieselSearchRepository, DieselSessionRepository,
};
use wordtrace::services::{
    AnnotateConfig, AnnotationService, IngestConfig, IngestService, SearchService,
};

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("WORDTRACE_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::resolve(cli.data_dir.clone())?;
    settings.ensure_directories()?;

    let pool = create_pool(&settings.database_path())?;
    migrations::run_migrations(pool.clone()).await?;

    match cli.command {
        Command::Ingest(args) => ingest(pool, &settings, args).await?,
        Command::Search(args) => search(pool, args).await?,
        Command::Annotate(args) => annotate(pool, &settings, args).await?,
        Command::Status => status(pool).await?,
        Command::Tools => tools(),
    }

    Ok(())
}

async fn ingest(pool: SqlitePool, settings: &Settings, args: IngestArgs) -> anyhow::Result<()> {
    let sessions = DieselSessionRepository::new(pool.clone());
    let session = sessions.start(args.fresh).await?;
    if args.fresh {
        println!("Started fresh session {}", session.id);
    } else {
        println!("Continuing session {}", session.id);
    }

    let lang = args.lang.as_deref().unwrap_or(&settings.tesseract_lang);
    let service = IngestService::new(
        DieselDocumentRepository::new(pool),
        Arc::new(PopplerRasterizer::new()),
        Arc::new(TesseractOcr::new().with_language(lang)),
        IngestConfig {
            dpi: args.dpi.unwrap_or(settings.ingest_dpi),
            batch_size: args.batch_size.unwrap_or(settings.batch_size),
        },
    );

    let outcomes = service.ingest_paths(&args.paths, session.id).await?;
    for outcome in &outcomes {
        println!(
            "{}: document {} ({} pages, {} words indexed, {} skipped)",
            outcome.path.display(),
            outcome.document_id,
            outcome.page_count,
            outcome.words_indexed,
            outcome.words_skipped
        );
    }
    println!("Ingested {} document(s)", outcomes.len());

    Ok(())
}

async fn search(pool: SqlitePool, args: SearchArgs) -> anyhow::Result<()> {
    let service = SearchService::new(DieselSearchRepository::new(pool));
    let term = args.term.trim();
    let hits = service.search(term, args.max_distance).await?;

    if hits.is_empty() {
        println!("No close match for '{term}' (max distance {})", args.max_distance);
        return Ok(());
    }

    for hit in &hits {
        println!(
            "{} p.{} '{}' at ({}, {})-({}, {})  [document {}, session {}]",
            hit.document_path,
            hit.page_number,
            hit.word,
            hit.bbox.x_min,
            hit.bbox.y_min,
            hit.bbox.x_max,
            hit.bbox.y_max,
            hit.document_id,
            hit.session_id
        );
    }
    println!("{} match(es)", hits.len());

    Ok(())
}

async fn annotate(pool: SqlitePool, settings: &Settings, args: AnnotateArgs) -> anyhow::Result<()> {
    let service = AnnotationService::new(
        DieselSearchRepository::new(pool),
        Arc::new(PopplerRasterizer::new()),
        AnnotateConfig {
            dpi: args.dpi.unwrap_or(settings.render_dpi),
        },
    );

    let output_root = args.output_dir.unwrap_or_else(|| settings.annotated_dir.clone());
    let written = service.annotate_all(&output_root).await?;
    println!("Wrote {} annotated page(s) under {}", written.len(), output_root.display());

    Ok(())
}

async fn status(pool: SqlitePool) -> anyhow::Result<()> {
    let sessions = DieselSessionRepository::new(pool.clone());
    let documents = DieselDocumentRepository::new(pool.clone());
    let search = DieselSearchRepository::new(pool);

    match sessions.latest().await? {
        Some(session) if session.is_open() => {
            println!("Open session: {} (started {})", session.id, session.start_time)
        }
        Some(session) => println!("Latest session: {} (closed)", session.id),
        None => println!("No sessions recorded"),
    }
    println!("Sessions:       {}", sessions.count().await?);
    println!("Documents:      {}", documents.count().await?);
    println!("Indexed words:  {}", documents.word_count().await?);
    println!("Search results: {}", search.count().await?);

    Ok(())
}

fn tools() {
    for (tool, available) in ocr::check_tools() {
        let status = if available { "ok" } else { "MISSING" };
        println!("{tool:<12} {status}");
    }
}
