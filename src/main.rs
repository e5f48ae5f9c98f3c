use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use docx_strip::{Document, Error, Orientation, OverrideSpec, SectionProperties};

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(o: OrientationArg) -> Self {
        match o {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[derive(Parser)]
#[command(name = "docx-strip")]
#[command(version)]
#[command(about = "Strip DOCX body content, keeping page geometry and styles", long_about = None)]
struct Cli {
    /// Input DOCX file (omit when using --schema)
    #[arg(value_name = "FILE", required_unless_present = "schema")]
    input: Option<PathBuf>,

    /// Output DOCX file
    #[arg(short, long, value_name = "FILE", required_unless_present = "dry_run")]
    output: Option<PathBuf>,

    /// JSON file with page geometry overrides (nested or flat form)
    #[arg(long, value_name = "FILE")]
    overrides: Option<PathBuf>,

    /// Schema JSON carrying `source_docx_base64` and `global_defaults`
    #[arg(long, value_name = "FILE", conflicts_with = "input")]
    schema: Option<PathBuf>,

    /// Page width in twips
    #[arg(long)]
    page_width: Option<u32>,

    /// Page height in twips
    #[arg(long)]
    page_height: Option<u32>,

    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Left margin in twips
    #[arg(long)]
    margin_left: Option<i32>,

    /// Right margin in twips
    #[arg(long)]
    margin_right: Option<i32>,

    /// Top margin in twips
    #[arg(long, allow_negative_numbers = true)]
    margin_top: Option<i32>,

    /// Bottom margin in twips
    #[arg(long, allow_negative_numbers = true)]
    margin_bottom: Option<i32>,

    /// Print the resulting geometry and styles as JSON instead of writing
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn flag_overrides(&self) -> Result<OverrideSpec, Error> {
        // Route flags through the JSON validator so they obey the same rules
        // as override files.
        let spec = OverrideSpec {
            page_width: self.page_width,
            page_height: self.page_height,
            orientation: self.orientation.map(Orientation::from),
            margin_left: self.margin_left,
            margin_right: self.margin_right,
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
        };
        let value = serde_json::to_value(&spec).map_err(|e| Error::InvalidOverride {
            field: "<flags>".into(),
            reason: e.to_string(),
        })?;
        OverrideSpec::from_json(&value)
    }

    fn file_overrides(&self) -> Result<OverrideSpec, Error> {
        match &self.overrides {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| Error::InvalidOverride {
                    field: "<file>".into(),
                    reason: format!("{}: {e}", path.display()),
                })?;
                OverrideSpec::from_json_str(&json)
            }
            None => Ok(OverrideSpec::default()),
        }
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    section: Option<&'a SectionProperties>,
    fallback_section: bool,
    paragraphs: usize,
    tables: usize,
    styles: Vec<&'a str>,
}

fn run(cli: &Cli) -> Result<(), Error> {
    let spec = cli.flag_overrides()?.merge_over(cli.file_overrides()?);

    let doc: Document = match (&cli.schema, &cli.input) {
        (Some(schema_path), _) => {
            let text = std::fs::read_to_string(schema_path)?;
            let schema: serde_json::Value =
                serde_json::from_str(&text).map_err(|e| Error::Schema(e.to_string()))?;
            docx_strip::schema::strip_schema(&schema, Some(&spec))?
        }
        (None, Some(input)) => docx_strip::strip(input, Some(&spec))?,
        (None, None) => return Err(Error::InvalidDocx("no input given".into())),
    };

    for diagnostic in doc.diagnostics() {
        log::warn!("{diagnostic:?}");
    }

    if cli.dry_run {
        let summary = Summary {
            section: doc.section_properties(),
            fallback_section: doc.used_fallback_section(),
            paragraphs: doc.paragraph_count(),
            tables: doc.table_count(),
            styles: doc.styles().ids(),
        };
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        println!("{json}");
        return Ok(());
    }

    if let Some(output) = &cli.output {
        doc.save(output)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error ({} stage): {e}", e.stage());
            ExitCode::FAILURE
        }
    }
}
