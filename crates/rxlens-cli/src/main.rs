mod render;

use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rxlens_contracts::events::{ScanEvent, ScanJournal};
use rxlens_contracts::labels::Labels;
use rxlens_contracts::{
    HistoryItem, HistoryStore, Language, Preferences, PreferencesStore, PrescriptionInfo,
};
use rxlens_engine::{
    validate_for_upload, AnalysisError, AnalysisSequencer, EngineConfig, ImageBlob,
    PrescriptionAnalyzer, Transport,
};
use sha2::{Digest, Sha256};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::render::{render_history_line, render_prescription};

#[derive(Debug, Parser)]
#[command(
    name = "rxlens",
    version,
    about = "Scan prescription photos into structured, bilingual summaries"
)]
struct Cli {
    /// Directory holding preferences, history and image copies.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a prescription image and add it to the history.
    Scan(ScanArgs),
    /// Re-run the newest scan in another language.
    Reanalyze(ReanalyzeArgs),
    #[command(subcommand)]
    History(HistoryCommand),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Parser)]
struct ScanArgs {
    image: PathBuf,
    /// `english` or `hindi`; anything else means English. Saved as the preference.
    #[arg(long)]
    language: Option<Language>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct ReanalyzeArgs {
    /// Defaults to switching away from the saved language.
    #[arg(long)]
    language: Option<Language>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum HistoryCommand {
    List,
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    Clear,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Show,
    SetApiKey { key: String },
    SetLanguage { language: Language },
}

/// Everything the CLI persists, owned here and passed to the pipeline
/// explicitly.
struct AppState {
    root: PathBuf,
    preferences: PreferencesStore,
    history: HistoryStore,
    journal: ScanJournal,
}

impl AppState {
    fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create state dir {}", root.display()))?;
        Ok(Self {
            preferences: PreferencesStore::new(root.join("preferences.json")),
            history: HistoryStore::new(root.join("history.json")),
            journal: ScanJournal::new(root.join("events.jsonl"), session_id()),
            root,
        })
    }

    fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    /// Keeps a content-addressed copy of the scanned image so history entries
    /// outlive the original file.
    fn store_image_copy(&self, blob: &ImageBlob) -> Result<PathBuf> {
        let mut bytes = Vec::new();
        blob.open()
            .and_then(|mut reader| reader.read_to_end(&mut bytes))
            .context("failed reading image for history copy")?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hasher.finalize();
        let name = format!("{}.{}", hex::encode(&digest[..8]), blob.extension());
        let dir = self.images_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(name);
        if !path.exists() {
            fs::write(&path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(path)
    }

    fn record(&self, event: ScanEvent) {
        if let Err(err) = self.journal.record(&event) {
            tracing::warn!(error = %err, "failed to append scan journal entry");
        }
    }

    fn set_language(&self, language: Option<Language>) -> Result<Preferences> {
        match language {
            Some(language) => self.preferences.update(|prefs| prefs.language = language),
            None => Ok(self.preferences.load()),
        }
    }
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("rxlens error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RXLENS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let state = AppState::open(resolve_state_dir(cli.state_dir))?;
    match cli.command {
        Command::Scan(args) => {
            let analyzer = PrescriptionAnalyzer::with_http(EngineConfig::from_env())?;
            let output = run_scan(&state, &analyzer, &args)?;
            println!("{output}");
            Ok(0)
        }
        Command::Reanalyze(args) => {
            let analyzer = PrescriptionAnalyzer::with_http(EngineConfig::from_env())?;
            let sequencer = AnalysisSequencer::new();
            match run_reanalyze(&state, &analyzer, &sequencer, &args)? {
                Some(output) => {
                    println!("{output}");
                    Ok(0)
                }
                None => Ok(2),
            }
        }
        Command::History(command) => {
            println!("{}", run_history(&state, command)?);
            Ok(0)
        }
        Command::Config(command) => {
            println!("{}", run_config(&state, command)?);
            Ok(0)
        }
    }
}

fn run_scan<T: Transport>(
    state: &AppState,
    analyzer: &PrescriptionAnalyzer<T>,
    args: &ScanArgs,
) -> Result<String> {
    let prefs = state.set_language(args.language)?;
    let language = prefs.language;
    let labels = Labels::for_language(language);
    let Some(credential) = resolve_credential(args.api_key.as_deref(), &prefs) else {
        bail!("{} (rxlens config set-api-key <KEY>)", labels.api_key_missing);
    };

    let blob = ImageBlob::from_path(&args.image)
        .with_context(|| format!("failed to open {}", args.image.display()))?;
    validate_for_upload(&blob)?;
    // The model and the history copy both see these bytes.
    let blob = blob
        .load()
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    validate_for_upload(&blob)?;

    state.record(ScanEvent::ScanStarted {
        language,
        image_mime: blob.mime_type().to_string(),
        image_bytes: blob.size(),
    });
    let info = analyze_or_record(state, analyzer, &blob, &credential, language)?;

    let image_copy = state.store_image_copy(&blob)?;
    let item = HistoryItem::new(image_copy.to_string_lossy().to_string(), info);
    state.history.prepend(item.clone())?;
    state.record(ScanEvent::ScanCompleted {
        language,
        degraded: item.prescription_info.is_degraded(),
        history_id: Some(item.id.clone()),
    });

    format_result(&item.prescription_info, labels, args.json)
}

/// Returns `None` when a newer request superseded this one and the result was
/// dropped.
fn run_reanalyze<T: Transport>(
    state: &AppState,
    analyzer: &PrescriptionAnalyzer<T>,
    sequencer: &AnalysisSequencer,
    args: &ReanalyzeArgs,
) -> Result<Option<String>> {
    let Some(latest) = state.history.latest() else {
        bail!("{}", Labels::for_language(state.preferences.load().language).history_empty);
    };
    let language = args
        .language
        .unwrap_or_else(|| state.preferences.load().language.toggled());
    let prefs = state.set_language(Some(language))?;
    let labels = Labels::for_language(language);
    let Some(credential) = resolve_credential(args.api_key.as_deref(), &prefs) else {
        bail!("{} (rxlens config set-api-key <KEY>)", labels.api_key_missing);
    };

    let blob = ImageBlob::from_path(&latest.image)
        .with_context(|| format!("stored image {} is missing", latest.image))?;
    let ticket = sequencer.begin();
    state.record(ScanEvent::ScanStarted {
        language,
        image_mime: blob.mime_type().to_string(),
        image_bytes: blob.size(),
    });
    let result = analyzer.analyze(&blob, &credential, language, Some(&ticket.token));
    if !sequencer.is_latest(&ticket) || matches!(result, Err(AnalysisError::Cancelled)) {
        state.record(ScanEvent::ScanDiscarded { seq: ticket.seq });
        return Ok(None);
    }
    let info = record_outcome(state, result)?;

    // Other scans may have landed meanwhile; update the item that was read.
    let Some(updated) = state.history.replace(&latest.id, info)? else {
        bail!("history entry {} was removed during re-analysis", latest.id);
    };
    state.record(ScanEvent::ScanCompleted {
        language,
        degraded: updated.prescription_info.is_degraded(),
        history_id: Some(updated.id.clone()),
    });
    format_result(&updated.prescription_info, labels, args.json).map(Some)
}

fn analyze_or_record<T: Transport>(
    state: &AppState,
    analyzer: &PrescriptionAnalyzer<T>,
    blob: &ImageBlob,
    credential: &str,
    language: Language,
) -> Result<PrescriptionInfo> {
    record_outcome(state, analyzer.analyze(blob, credential, language, None))
}

fn record_outcome(
    state: &AppState,
    result: std::result::Result<PrescriptionInfo, AnalysisError>,
) -> Result<PrescriptionInfo> {
    result.map_err(|err| {
        state.record(ScanEvent::ScanFailed {
            kind: err.kind().to_string(),
            message: err.to_string(),
        });
        anyhow::Error::new(err).context("Failed to analyze prescription. Please try again.")
    })
}

fn run_history(state: &AppState, command: HistoryCommand) -> Result<String> {
    let labels = Labels::for_language(state.preferences.load().language);
    match command {
        HistoryCommand::List => {
            let items = state.history.list();
            if items.is_empty() {
                return Ok(labels.history_empty.to_string());
            }
            let mut lines = vec![labels.history.to_string()];
            lines.extend(items.iter().map(render_history_line));
            Ok(lines.join("\n"))
        }
        HistoryCommand::Show { id, json } => {
            let Some(item) = state.history.get(&id) else {
                bail!("no history entry with id {id}");
            };
            format_result(&item.prescription_info, labels, json)
        }
        HistoryCommand::Clear => {
            let removed = state.history.clear()?;
            let images_dir = state.images_dir();
            for item in &removed {
                let path = Path::new(&item.image);
                if path.starts_with(&images_dir) && path.exists() {
                    if let Err(err) = fs::remove_file(path) {
                        tracing::warn!(path = %path.display(), error = %err, "failed to remove image copy");
                    }
                }
            }
            state.record(ScanEvent::HistoryCleared {
                removed: removed.len(),
            });
            Ok(labels.history_cleared.to_string())
        }
    }
}

fn run_config(state: &AppState, command: ConfigCommand) -> Result<String> {
    match command {
        ConfigCommand::Show => {
            let prefs = state.preferences.load();
            Ok(format!(
                "state_dir: {}\napi_key: {}\nlanguage: {}",
                state.root.display(),
                prefs.api_key().map(mask_secret).unwrap_or_else(|| "(not set)".to_string()),
                prefs.language
            ))
        }
        ConfigCommand::SetApiKey { key } => {
            let key = key.trim().to_string();
            if key.is_empty() {
                bail!("API key must not be empty");
            }
            let prefs = state.preferences.update(|prefs| prefs.api_key = Some(key))?;
            Ok(Labels::for_language(prefs.language).api_key_saved.to_string())
        }
        ConfigCommand::SetLanguage { language } => {
            let prefs = state.set_language(Some(language))?;
            Ok(format!(
                "Language set to {}",
                Labels::for_language(prefs.language).language_name
            ))
        }
    }
}

fn format_result(info: &PrescriptionInfo, labels: &Labels, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(info)?);
    }
    Ok(render_prescription(info, labels))
}

/// Flag first, then the saved key, then `OPENAI_API_KEY`.
fn resolve_credential(flag: Option<&str>, prefs: &Preferences) -> Option<String> {
    flag.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| prefs.api_key().map(str::to_string))
        .or_else(|| non_empty_env("OPENAI_API_KEY"))
}

fn resolve_state_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| non_empty_env("RXLENS_HOME").map(PathBuf::from))
        .or_else(|| non_empty_env("HOME").map(|home| PathBuf::from(home).join(".rxlens")))
        .unwrap_or_else(|| PathBuf::from(".rxlens"))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

fn session_id() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().format("%Y%m%dT%H%M%S"),
        std::process::id()
    )
}
