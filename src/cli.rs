use crate::config::{DesignerConfig, load_config};
use crate::graph::normalize;
use crate::interaction::{InteractionState, Selection};
use crate::layout::{FileStorage, LayoutStore};
use crate::model::{DefinitionDetail, ProcessType, RecordId};
use crate::render::{render_svg, write_output_svg};
use crate::scene::Scene;
use crate::scene_dump::write_scene_dump;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "wfcanvas",
    version,
    about = "Render and lay out ITSM workflow definitions"
)]
pub struct Cli {
    /// Config file (JSON5, camelCase keys)
    #[arg(short = 'c', long = "configFile", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding cached layouts
    #[arg(long = "layoutDir", global = true)]
    pub layout_dir: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long = "server", global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a definition with its cached layout
    Render(RenderArgs),
    /// Move a state to a fixed position in the cached layout
    Place(PlaceArgs),
    /// List definitions known to the backend
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Definition detail JSON file, or '-' for stdin. Fetched from the backend when omitted.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Definition id; also selects the cached layout
    #[arg(long = "id")]
    pub id: Option<String>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Highlight this state as selected
    #[arg(long = "select")]
    pub select: Option<String>,

    /// Also write the scene as JSON
    #[arg(long = "dumpScene")]
    pub dump_scene: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

#[derive(Args, Debug)]
pub struct PlaceArgs {
    #[arg(long = "id")]
    pub id: String,

    #[arg(long = "state")]
    pub state_key: String,

    #[arg(short = 'x', allow_negative_numbers = true)]
    pub x: f32,

    #[arg(short = 'y', allow_negative_numbers = true)]
    pub y: f32,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// INCIDENT, REQUEST, CHANGE or APPROVAL
    #[arg(short = 't', long = "processType", value_parser = parse_process_type)]
    pub process_type: Option<ProcessType>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Render(args) => render(args, config),
        Command::Place(args) => place(args, config),
        Command::List(args) => list(args, config),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    // Logs go to stderr so SVG on stdout stays clean.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_config(cli: &Cli) -> Result<DesignerConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = &cli.layout_dir {
        config.storage.layout_dir = dir.clone();
    }
    if let Some(server) = &cli.server {
        config.backend.base_url = server.clone();
    }
    Ok(config)
}

fn layout_store(config: &DesignerConfig) -> LayoutStore<FileStorage> {
    LayoutStore::new(
        FileStorage::new(&config.storage.layout_dir),
        &config.storage.key_namespace,
        config.grid.clone(),
    )
}

fn render(args: RenderArgs, mut config: DesignerConfig) -> Result<()> {
    if let Some(width) = args.width {
        config.canvas.viewport_width = width;
    }
    if let Some(height) = args.height {
        config.canvas.viewport_height = height;
    }

    let (id, detail) = match args.input.as_deref() {
        Some(path) => read_detail(path, args.id.as_deref())?,
        None => {
            let id = args
                .id
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Either --input or --id is required"))?;
            let id = RecordId::new(id);
            let detail = fetch_detail(&config, &id)?;
            (id, detail)
        }
    };

    let graph = normalize(detail);
    let mut store = layout_store(&config);
    let positions = store.seed_defaults(id.as_str(), &graph.state_keys()).clone();
    let selection = match args.select {
        Some(key) if graph.contains(&key) => Selection::Node(key),
        Some(key) => return Err(anyhow::anyhow!("State '{key}' is not in definition {id}")),
        None => Selection::None,
    };
    let scene = Scene::build(
        &graph,
        Some(&positions),
        &InteractionState::Idle,
        &selection,
        &config,
    );

    if let Some(path) = args.dump_scene.as_deref() {
        write_scene_dump(path, &scene)?;
    }

    let svg = render_svg(&scene, &config.theme);
    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref()),
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &scene)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, scene: &Scene) -> Result<()> {
    crate::render::write_output_png(svg, output, scene.width, scene.height)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _scene: &Scene) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

fn place(args: PlaceArgs, config: DesignerConfig) -> Result<()> {
    let mut store = layout_store(&config);
    store.set_position(&args.id, &args.state_key, args.x, args.y)?;
    tracing::info!(
        definition_id = %args.id,
        state_key = %args.state_key,
        x = args.x,
        y = args.y,
        "position stored"
    );
    Ok(())
}

#[cfg(feature = "http")]
fn list(args: ListArgs, config: DesignerConfig) -> Result<()> {
    use crate::backend::{HttpBackend, WorkflowBackend};

    let backend = HttpBackend::new(&config.backend)?;
    let definitions = backend.list_definitions(args.process_type)?;
    for definition in definitions {
        println!(
            "{}\t{}\tv{}\t{}\t{}{}",
            definition.id,
            definition.key,
            definition.version,
            definition.process_type.as_str(),
            definition.name,
            if definition.active { "\t(active)" } else { "" }
        );
    }
    Ok(())
}

#[cfg(not(feature = "http"))]
fn list(_args: ListArgs, _config: DesignerConfig) -> Result<()> {
    Err(anyhow::anyhow!("Listing definitions requires the 'http' feature"))
}

#[cfg(feature = "http")]
fn fetch_detail(config: &DesignerConfig, id: &RecordId) -> Result<DefinitionDetail> {
    use crate::backend::{HttpBackend, WorkflowBackend};

    let backend = HttpBackend::new(&config.backend)?;
    Ok(backend.get_definition(id)?)
}

#[cfg(not(feature = "http"))]
fn fetch_detail(_config: &DesignerConfig, _id: &RecordId) -> Result<DefinitionDetail> {
    Err(anyhow::anyhow!("Fetching definitions requires the 'http' feature"))
}

/// Reads a definition detail and works out which id its layout is cached
/// under: the explicit `--id`, else the embedded definition, else the file stem.
fn read_detail(path: &Path, id: Option<&str>) -> Result<(RecordId, DefinitionDetail)> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    let detail: DefinitionDetail = serde_json::from_str(&content)?;
    let id = match id {
        Some(id) => RecordId::new(id),
        None => detail
            .definition
            .as_ref()
            .map(|definition| definition.id.clone())
            .or_else(|| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .filter(|stem| *stem != "-")
                    .map(RecordId::new)
            })
            .ok_or_else(|| anyhow::anyhow!("Cannot tell the definition id; pass --id"))?,
    };
    Ok((id, detail))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn parse_process_type(token: &str) -> std::result::Result<ProcessType, String> {
    ProcessType::from_token(token).ok_or_else(|| format!("unknown process type '{token}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_subcommand() {
        let cli = Cli::try_parse_from([
            "wfcanvas",
            "--layoutDir",
            "/tmp/layouts",
            "render",
            "-i",
            "incident.json",
            "-e",
            "png",
            "-o",
            "out.png",
        ])
        .unwrap();
        assert_eq!(cli.layout_dir, Some(PathBuf::from("/tmp/layouts")));
        match cli.command {
            Command::Render(args) => {
                assert_eq!(args.input, Some(PathBuf::from("incident.json")));
                assert!(matches!(args.output_format, OutputFormat::Png));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn list_accepts_process_type_tokens() {
        let cli = Cli::try_parse_from(["wfcanvas", "list", "-t", "change"]).unwrap();
        match cli.command {
            Command::List(args) => assert_eq!(args.process_type, Some(ProcessType::Change)),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["wfcanvas", "list", "-t", "bogus"]).is_err());
    }

    #[test]
    fn detail_id_falls_back_to_embedded_definition_then_stem() {
        let dir = tempfile::tempdir().unwrap();
        let with_def = dir.path().join("a.json");
        std::fs::write(
            &with_def,
            r#"{"definition":{"id":7,"key":"INC","name":"Incident","processType":"INCIDENT","version":1,"active":true},"states":[],"transitions":[]}"#,
        )
        .unwrap();
        let (id, _) = read_detail(&with_def, None).unwrap();
        assert_eq!(id.as_str(), "7");

        let bare = dir.path().join("change-flow.json");
        std::fs::write(&bare, r#"{"states":null}"#).unwrap();
        let (id, detail) = read_detail(&bare, None).unwrap();
        assert_eq!(id.as_str(), "change-flow");
        assert!(detail.states.is_empty());

        let (id, _) = read_detail(&bare, Some("99")).unwrap();
        assert_eq!(id.as_str(), "99");
    }
}
