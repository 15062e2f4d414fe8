use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use climate_viz::ingest::open_source;
use climate_viz::parse::parse_records;
use climate_viz::stats::{self, Summary};
use climate_viz::view::ChartFrame;
use climate_viz::{LoadStatus, MarkKind, PointerEvent, ViewConfig, ViewController, ViewHost};

#[derive(Parser, Debug)]
#[command(
    name = "climate-viz",
    version,
    about = "Render yearly climate data as line, bar and dual-axis charts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one view's pipeline and write the chart (and optionally print stats).
    Render(RenderArgs),
    /// List the available views.
    Views(ViewsArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// CSV file path or http(s) URL.
    #[arg(short, long)]
    data: String,
    /// View number (1-based) or name, e.g. `precipitation`.
    #[arg(long, default_value = "1")]
    view: String,
    /// Series to plot on views with selectors (e.g. "Minimum Temp").
    #[arg(long)]
    metric: Option<String>,
    /// Write the chart here (.svg or .png).
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Outer width of the chart (default: the view's own size).
    #[arg(long)]
    width: Option<u32>,
    /// Outer height of the chart (default: the view's own size).
    #[arg(long)]
    height: Option<u32>,
    /// Hide a series by legend label. Repeatable.
    #[arg(long)]
    hide: Vec<String>,
    /// Zoom factor, clamped to the view's zoom extent.
    #[arg(long)]
    zoom: Option<f64>,
    /// Pan by DX,DY pixels after zooming.
    #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
    pan: Option<(f64, f64)>,
    /// Show the tooltip for the pointer at X,Y (chart pixels).
    #[arg(long, value_parser = parse_pair)]
    hover: Option<(f64, f64)>,
    /// Print summary statistics of the parsed records.
    #[arg(long, default_value_t = false)]
    stats: bool,
    /// Print statistics as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Load view definitions from a JSON file instead of the built-in set.
    #[arg(long)]
    views: Option<PathBuf>,
    /// Seconds to wait for the data to load.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Args, Debug)]
struct ViewsArgs {
    /// Print the full view definitions as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Load view definitions from a JSON file instead of the built-in set.
    #[arg(long)]
    views: Option<PathBuf>,
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let a = a.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let b = b.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((a, b))
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn slug(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn load_views(path: Option<&PathBuf>) -> Result<Vec<ViewConfig>> {
    let Some(path) = path else {
        return Ok(ViewConfig::builtin());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading views from {}", path.display()))?;
    let views: Vec<ViewConfig> = serde_json::from_str(&text)
        .with_context(|| format!("parsing views from {}", path.display()))?;
    for v in &views {
        v.validate()?;
    }
    if views.is_empty() {
        bail!("{} defines no views", path.display());
    }
    Ok(views)
}

/// 1-based number, exact slug, or a unique slug prefix/substring.
fn find_view(views: &[ViewConfig], wanted: &str) -> Result<usize> {
    if let Ok(n) = wanted.parse::<usize>() {
        return n
            .checked_sub(1)
            .filter(|i| *i < views.len())
            .ok_or_else(|| anyhow!("view {n} out of range 1..={}", views.len()));
    }
    let wanted = slug(wanted);
    let slugs: Vec<String> = views.iter().map(|v| slug(&v.title)).collect();
    if let Some(i) = slugs.iter().position(|s| *s == wanted) {
        return Ok(i);
    }
    let hits: Vec<usize> = (0..slugs.len()).filter(|i| slugs[*i].contains(&wanted)).collect();
    match hits.as_slice() {
        [i] => Ok(*i),
        [] => Err(anyhow!("no view named '{wanted}'")),
        _ => Err(anyhow!("'{wanted}' matches several views")),
    }
}

fn mark_name(mark: &MarkKind) -> &'static str {
    match mark {
        MarkKind::Line { points: true } => "line+points",
        MarkKind::Line { points: false } => "line",
        MarkKind::Bar => "bar",
        MarkKind::DualBar => "dual-bar",
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Views(args) => cmd_views(args),
    }
}

fn cmd_views(args: ViewsArgs) -> Result<()> {
    let views = load_views(args.views.as_ref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }
    for (i, v) in views.iter().enumerate() {
        let (w, h) = v.frame.outer_size();
        println!(
            "{}. {} [{}] {}x{}  ({})",
            i + 1,
            v.title,
            mark_name(&v.mark),
            w,
            h,
            slug(&v.title)
        );
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let mut views = load_views(args.views.as_ref())?;
    if args.width.is_some() || args.height.is_some() {
        for v in &mut views {
            let (w, h) = v.frame.outer_size();
            let (w, h) = (args.width.unwrap_or(w), args.height.unwrap_or(h));
            let m = v.frame.margin;
            if w <= m.left + m.right || h <= m.top + m.bottom {
                bail!(
                    "{w}x{h} leaves no plot area for '{}' (margins need more than {}x{})",
                    v.title,
                    m.left + m.right,
                    m.top + m.bottom
                );
            }
            v.frame = ChartFrame::fit(w, h, m);
        }
    }
    let index = find_view(&views, &args.view)?;

    let mut controller = ViewController::new(views);
    controller.jump(index);
    let mut host = ViewHost::new(open_source(&args.data), controller);
    host.mount();
    if !host.wait(Duration::from_secs(args.timeout)) {
        bail!("timed out loading {}", host.source().describe());
    }
    let view = host
        .view_mut()
        .ok_or_else(|| anyhow!("no view mounted"))?;
    if let LoadStatus::Failed(reason) = view.status() {
        bail!("could not load data: {reason}");
    }

    if let Some(metric) = args.metric.as_deref() {
        let known = view
            .config()
            .selectors
            .iter()
            .map(|s| s.label.as_str())
            .chain(view.config().series.iter().map(|s| s.label.as_str()))
            .any(|l| l.eq_ignore_ascii_case(metric));
        if !known {
            bail!("'{}' has no series '{metric}'", view.config().title);
        }
        view.select_metric(metric);
    }
    for label in &args.hide {
        if !view.toggle_legend(label) {
            log::warn!("no legend entry '{label}' in '{}'", view.config().title);
        }
    }
    if let Some(k) = args.zoom
        && !view.zoom_to(k)
    {
        log::warn!("'{}' does not zoom", view.config().title);
    }
    if let Some((dx, dy)) = args.pan {
        view.handle(PointerEvent::Drag { dx, dy });
    }
    if let Some((x, y)) = args.hover {
        view.handle(PointerEvent::Move { x, y });
    }

    if let Some(path) = args.out.as_ref() {
        view.render_to_file(path)?;
        eprintln!(
            "Wrote '{}' ({} groups) to {}",
            view.config().title,
            view.state().data.len(),
            path.display()
        );
    }

    if args.stats || args.json {
        let config = view.config();
        let records = parse_records(view.rows(), &config.parse);
        let metrics: Vec<_> = config.series.iter().map(|s| s.metric.clone()).collect();
        let summaries = stats::summarize(&records, &metrics);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        } else {
            print_summaries(&summaries);
        }
    }
    Ok(())
}

fn print_summaries(summaries: &[Summary]) {
    for s in summaries {
        println!(
            "{}  count={} missing={}  min={} max={} mean={} median={}",
            s.metric,
            s.count,
            s.missing,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }
}
