use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use formats::{MapManifest, MapPackage, parse_entity_types};
use foundation::math::{Vec2, ViewTransform};
use runtime::CountingHost;
use settings::ViewerSettings;
use tools::icons::{IconHref, data_uri, load_icon};
use tools::svg::{SvgImages, frame_to_svg};
use tracing_subscriber::EnvFilter;
use viewer::MapViewer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless entity map renderer and query tool")]
struct Args {
    /// Settings file (default: $ENTMAP_SETTINGS, then ./config/entmap.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a map package to SVG
    Render {
        map: PathBuf,
        out: PathBuf,

        /// entity-types.json with overlay rules
        #[arg(long)]
        types: Option<PathBuf>,

        /// Directory icon paths are resolved against (default: the types file's directory)
        #[arg(long)]
        icons: Option<PathBuf>,

        #[arg(long, default_value_t = 1024.0)]
        width: f64,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Print the properties of the entity under a screen point
    Pick {
        map: PathBuf,
        x: f64,
        y: f64,

        #[arg(long, default_value_t = 1024.0)]
        width: f64,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// List distinct values of the tracked property keys
    Values {
        map: PathBuf,

        /// Only this key
        #[arg(long)]
        key: Option<String>,

        /// Case-insensitive substring filter
        #[arg(long)]
        search: Option<String>,
    },

    /// List the maps in a manifest
    Maps { manifest: PathBuf },
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct ViewArgs {
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset_x: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset_y: f64,
}

impl ViewArgs {
    fn transform(self) -> ViewTransform {
        ViewTransform::new(self.zoom, self.offset_x, self.offset_y)
    }
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => ViewerSettings::from_file(path),
        None => ViewerSettings::discover(),
    }
    .map_err(|e| e.to_string())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .map_err(|e| format!("logging level {:?}: {e}", settings.logging.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Render {
            map,
            out,
            types,
            icons,
            width,
            view,
        } => cmd_render(settings, &map, &out, types.as_deref(), icons, width, view),
        Command::Pick {
            map,
            x,
            y,
            width,
            view,
        } => cmd_pick(settings, &map, Vec2::new(x, y), width, view),
        Command::Values { map, key, search } => {
            cmd_values(settings, &map, key.as_deref(), search.as_deref())
        }
        Command::Maps { manifest } => cmd_maps(&manifest),
    }
}

fn read_package(path: &Path) -> Result<MapPackage, String> {
    let payload = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("map")
        .to_string();
    MapPackage::from_json_str(&payload, &name).map_err(|e| format!("parse {path:?}: {e}"))
}

fn open_viewer(
    settings: ViewerSettings,
    package: &MapPackage,
    width: f64,
    view: ViewArgs,
) -> Result<MapViewer<CountingHost, IconHref>, String> {
    let mut viewer = MapViewer::new(settings, CountingHost::default());
    viewer.load_map(package);
    viewer
        .resize_canvases(width)
        .ok_or_else(|| "background image has zero width".to_string())?;
    let transform = view.transform();
    if !transform.is_valid() {
        return Err(format!("invalid view: zoom {} must be positive", view.zoom));
    }
    viewer.set_view_transform(transform);
    Ok(viewer)
}

struct PackageImages<'a> {
    background: String,
    icons: &'a [Option<(IconHref, Option<IconHref>)>],
}

impl SvgImages for PackageImages<'_> {
    fn background_href(&self) -> Option<&str> {
        Some(&self.background)
    }

    fn icon_href(&self, slot: usize, tinted: bool) -> Option<&str> {
        let (base, tint) = self.icons.get(slot)?.as_ref()?;
        if tinted { tint.as_deref() } else { Some(base) }
    }
}

fn cmd_render(
    settings: ViewerSettings,
    map: &Path,
    out: &Path,
    types: Option<&Path>,
    icons_dir: Option<PathBuf>,
    width: f64,
    view: ViewArgs,
) -> Result<(), String> {
    let package = read_package(map)?;
    let mut viewer = open_viewer(settings, &package, width, view)?;

    let mut loaded: Vec<Option<(IconHref, Option<IconHref>)>> = Vec::new();
    if let Some(types_path) = types {
        let payload =
            fs::read_to_string(types_path).map_err(|e| format!("read {types_path:?}: {e}"))?;
        let records =
            parse_entity_types(&payload).map_err(|e| format!("parse {types_path:?}: {e}"))?;
        let root = icons_dir
            .or_else(|| types_path.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        loaded.resize(records.len(), None);
        for request in viewer.load_entity_types(&records) {
            match load_icon(&root, &request) {
                Ok((base, tinted)) => {
                    loaded[request.ticket.index() as usize] = Some((base.clone(), tinted.clone()));
                    viewer.complete_icon(request.ticket, base, tinted);
                }
                Err(e) => {
                    tracing::warn!(icon = %request.source, error = %e, "icon unavailable");
                    viewer.fail_icon(request.ticket);
                }
            }
        }
    }

    let frame = viewer
        .on_frame()
        .ok_or_else(|| "nothing to paint (degenerate map bounds?)".to_string())?;
    let images = PackageImages {
        background: data_uri(&package.background.bytes),
        icons: &loaded,
    };
    let svg = frame_to_svg(&frame, viewer.canvas(), &images);
    fs::write(out, &svg).map_err(|e| format!("write {out:?}: {e}"))?;

    eprintln!(
        "wrote {} ({} commands, blake3={})",
        out.display(),
        frame.commands.len(),
        blake3::hash(svg.as_bytes()).to_hex()
    );
    Ok(())
}

fn cmd_pick(
    settings: ViewerSettings,
    map: &Path,
    screen: Vec2,
    width: f64,
    view: ViewArgs,
) -> Result<(), String> {
    let package = read_package(map)?;
    let viewer = open_viewer(settings, &package, width, view)?;
    match viewer.hover(screen) {
        Some(tip) => {
            println!(
                "dataset {} entity {}",
                tip.entity.dataset, tip.entity.index
            );
            for line in &tip.lines {
                println!("{}: {}", line.key, line.text);
            }
        }
        None => println!("no entity"),
    }
    Ok(())
}

fn cmd_values(
    settings: ViewerSettings,
    map: &Path,
    key: Option<&str>,
    search: Option<&str>,
) -> Result<(), String> {
    let package = read_package(map)?;
    let mut viewer: MapViewer<CountingHost> = MapViewer::new(settings, CountingHost::default());
    viewer.load_map(&package);

    let available = viewer.available_values();
    let keys: Vec<&str> = match key {
        Some(k) if available.keys().any(|known| known == k) => vec![k],
        Some(k) => return Err(format!("{k:?} is not a tracked property key")),
        None => available.keys().collect(),
    };
    for k in keys {
        let values = match search {
            Some(needle) => viewer.search_values(k, needle),
            None => available.values(k).iter().map(String::as_str).collect(),
        };
        println!("{k} ({})", values.len());
        for v in values {
            println!("  {v}");
        }
    }
    Ok(())
}

fn cmd_maps(manifest_path: &Path) -> Result<(), String> {
    let payload =
        fs::read_to_string(manifest_path).map_err(|e| format!("read {manifest_path:?}: {e}"))?;
    let manifest =
        MapManifest::from_json_str(&payload).map_err(|e| format!("parse {manifest_path:?}: {e}"))?;
    let dir = manifest_path.parent().unwrap_or(Path::new("."));
    for entry in &manifest.maps {
        let path = manifest.resolve(entry, dir);
        let status = if path.exists() { "" } else { " (missing)" };
        println!("{}\t{}{status}", entry.name, path.display());
    }
    Ok(())
}
