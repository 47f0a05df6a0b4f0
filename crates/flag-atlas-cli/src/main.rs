use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use clap::{ArgAction, Args, Parser, Subcommand};
use flag_atlas_core::{
    AtlasConfig, FlagId, FlagImage, FlagLayout, LayoutStats, ResampleFilter, ScaleMode,
    build_atlas, choose_columns, evaluate_columns, plan_layout, to_json,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use handlebars::Handlebars;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "flag-atlas",
    about = "Pack flag images into one fixed-size texture atlas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose a directory of flags into an atlas PNG plus metadata
    Build(BuildArgs),
    /// Metadata only: ids come from file names, no image is decoded
    Layout(BuildArgs),
    /// Print the wasted-space estimate of every column count for N cells
    Columns(ColumnsArgs),
}

/// Atlas size and unit ratios, shared by every command.
#[derive(Args, Debug, Clone)]
struct AtlasArgs {
    /// Atlas width in pixels
    #[arg(long, default_value_t = 1024, help_heading = "Atlas")]
    width: u32,
    /// Atlas height in pixels
    #[arg(long, default_value_t = 1024, help_heading = "Atlas")]
    height: u32,
    /// Flag aspect in units, as X:Y
    #[arg(long, default_value = "12:8", help_heading = "Atlas")]
    flag_ratio: String,
    /// Padding around each flag in units, as X:Y
    #[arg(long, default_value = "3:2", help_heading = "Atlas")]
    padding_ratio: String,
    /// Border decoration thickness in units
    #[arg(long, default_value_t = 4, help_heading = "Atlas")]
    border_ratio: u32,
}

#[derive(Parser, Debug, Clone)]
struct BuildArgs {
    // Input/Output
    /// Directory containing one image per flag, named by its 8-digit hex id
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/.json)
    #[arg(short, long, default_value = "flags", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (overrides command-line atlas options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    #[command(flatten)]
    atlas: AtlasArgs,

    // Rendering
    /// Unit scale: uniform (one scale, grid anchored top-left) | stretch (fill the atlas)
    #[arg(long, default_value = "uniform", help_heading = "Rendering")]
    scale_mode: String,
    /// Resampling filter: nearest|triangle|catmull_rom|gaussian|lanczos3
    #[arg(long, default_value = "catmull_rom", help_heading = "Rendering")]
    filter: String,
    /// Draw red outlines around each flag (debug)
    #[arg(long, default_value_t = false, help_heading = "Rendering")]
    outlines: bool,

    // Export
    /// Metadata format: json | c-header | rust | template
    #[arg(long, default_value = "json", value_parser = ["json", "c-header", "rust", "template"], help_heading = "Export")]
    metadata: String,
    /// Handlebars template used with --metadata template
    #[arg(long, help_heading = "Export")]
    template: Option<PathBuf>,
    /// Write layout statistics as JSON to this path
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct ColumnsArgs {
    /// Number of grid cells (flags plus the border cell)
    #[arg(long)]
    cells: usize,
    #[command(flatten)]
    atlas: AtlasArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Build(args) => run_build(args, cli.progress && !cli.quiet, false),
        Commands::Layout(args) => run_build(args, false, true),
        Commands::Columns(args) => run_columns(args),
    }
}

fn run_build(cli: &BuildArgs, show_progress: bool, layout_only: bool) -> anyhow::Result<()> {
    let cfg = resolve_config(cli)?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    info!(count = paths.len(), "found flag images");
    let started = Instant::now();

    let (layout, rgba): (FlagLayout, Option<RgbaImage>) = if layout_only {
        let ids = paths
            .iter()
            .map(|p| flag_id_of(p))
            .collect::<anyhow::Result<Vec<_>>>()?;
        (plan_layout(ids, &cfg)?, None)
    } else {
        let inputs = load_images_with_progress(&paths, show_progress)?;
        info!(count = inputs.len(), "loaded flag images");
        let out = build_atlas(inputs, cfg.clone())?;
        (out.layout, Some(out.rgba))
    };

    let stats = layout.stats();
    info!(
        cells = stats.n_cells,
        columns = stats.n_columns,
        rows = stats.n_rows,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        elapsed = %fmt_dur(started.elapsed()),
        "layout ready"
    );

    // Rendered before anything touches the disk so a bad template fails the run cleanly.
    let png_name = format!("{}.png", cli.name);
    let (meta_path, meta_text) = render_metadata(cli, &layout, &png_name)?;

    if cli.dry_run {
        info!(summary = %stats.summary(), "dry run, nothing written");
        return Ok(());
    }

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;

    let mut staged = Staged::default();
    let png_path = rgba.as_ref().map(|_| cli.out_dir.join(&png_name));
    if let (Some(rgba), Some(png_path)) = (&rgba, &png_path) {
        staged.write(png_path, |tmp| {
            Ok(rgba.save_with_format(tmp, ImageFormat::Png)?)
        })?;
    }
    staged.write(&meta_path, |tmp| Ok(fs::write(tmp, &meta_text)?))?;
    if let Some(stats_path) = &cli.export_stats {
        let text = stats_json(&stats)?;
        staged.write(stats_path, |tmp| Ok(fs::write(tmp, &text)?))?;
    }
    staged.commit()?;

    if let Some(png_path) = png_path {
        info!(?png_path, "atlas written");
    }
    info!(?meta_path, format = %cli.metadata, "metadata written");
    if let Some(stats_path) = &cli.export_stats {
        info!(?stats_path, "stats written");
    }
    Ok(())
}

/// Output files written beside their destinations and renamed into place
/// together, so a failed run leaves none of them behind.
#[derive(Default)]
struct Staged {
    files: Vec<(PathBuf, PathBuf)>,
}

impl Staged {
    fn part_path(dest: &Path) -> PathBuf {
        let mut s = dest.as_os_str().to_owned();
        s.push(".part");
        PathBuf::from(s)
    }

    fn write(
        &mut self,
        dest: &Path,
        write: impl FnOnce(&Path) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        let part = Self::part_path(dest);
        self.files.push((part.clone(), dest.to_path_buf()));
        write(&part).with_context(|| format!("write {}", dest.display()))
    }

    fn commit(mut self) -> anyhow::Result<()> {
        let mut placed: Vec<PathBuf> = Vec::new();
        while !self.files.is_empty() {
            let (part, dest) = self.files.remove(0);
            if let Err(e) = fs::rename(&part, &dest) {
                let _ = fs::remove_file(&part);
                for p in &placed {
                    let _ = fs::remove_file(p);
                }
                return Err(e).with_context(|| format!("move {} into place", dest.display()));
            }
            placed.push(dest);
        }
        Ok(())
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        for (part, _) in &self.files {
            let _ = fs::remove_file(part);
        }
    }
}

fn run_columns(args: &ColumnsArgs) -> anyhow::Result<()> {
    let cfg = args.atlas.to_config()?;
    cfg.validate_for(args.cells)?;
    let candidates = evaluate_columns(&cfg, args.cells);
    let best = choose_columns(&cfg, args.cells);
    let atlas_area = cfg.width as f64 * cfg.height as f64;

    println!(
        "{:>7} {:>5} {:>11} {:>11} {:>9} {:>14} {:>7}",
        "columns", "rows", "width_units", "height_units", "unit_px", "wasted_px2", "waste"
    );
    for est in &candidates {
        let mark = if est.grid.n_columns == best.grid.n_columns {
            "  <- chosen"
        } else {
            ""
        };
        println!(
            "{:>7} {:>5} {:>11} {:>12} {:>9.3} {:>14.0} {:>6.2}%{}",
            est.grid.n_columns,
            est.grid.n_rows,
            est.grid.width_units,
            est.grid.height_units,
            est.unit_size,
            est.wasted,
            est.wasted / atlas_area * 100.0,
            mark
        );
    }
    Ok(())
}

impl AtlasArgs {
    fn to_config(&self) -> anyhow::Result<AtlasConfig> {
        let (fx, fy) = parse_pair(&self.flag_ratio).context("--flag-ratio")?;
        let (px, py) = parse_pair(&self.padding_ratio).context("--padding-ratio")?;
        Ok(AtlasConfig::builder()
            .with_dimensions(self.width, self.height)
            .flag_ratio(fx, fy)
            .padding_ratio(px, py)
            .border_ratio(self.border_ratio)
            .build())
    }
}

fn resolve_config(cli: &BuildArgs) -> anyhow::Result<AtlasConfig> {
    let mut cfg = cli.atlas.to_config()?;
    cfg.scale_mode = parse_scale_mode(&cli.scale_mode)?;
    cfg.filter = parse_filter(&cli.filter)?;
    cfg.texture_outlines = cli.outlines;

    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.apply(cfg)?;
    }

    cfg.validate()?;
    Ok(cfg)
}

fn parse_pair(s: &str) -> anyhow::Result<(u32, u32)> {
    let (a, b) = s
        .split_once([':', 'x'])
        .ok_or_else(|| anyhow!("expected X:Y, got {s:?}"))?;
    Ok((a.trim().parse()?, b.trim().parse()?))
}

fn parse_scale_mode(s: &str) -> anyhow::Result<ScaleMode> {
    s.parse()
        .map_err(|_| anyhow!("unknown scale mode: {s} (expected uniform|stretch)"))
}

fn parse_filter(s: &str) -> anyhow::Result<ResampleFilter> {
    s.parse().map_err(|_| {
        anyhow!("unknown filter: {s} (expected nearest|triangle|catmull_rom|gaussian|lanczos3)")
    })
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}µs", d.as_micros())
    }
}

fn build_glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("glob {pat:?}"))?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(path: &Path, include: &[String], exclude: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_glob_set(include)?;
    let exc_set = build_glob_set(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("scan {}", path.display()))?;
        let p = entry.path();
        if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
            list.push(p.to_path_buf());
        }
    }
    debug!(count = list.len(), dir = %path.display(), "scanned input");
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg")
    )
}

/// Flag id from a file stem such as `0a1b2c3d.png`.
fn flag_id_of(p: &Path) -> anyhow::Result<FlagId> {
    let stem = p
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("file name is not UTF-8: {}", p.display()))?;
    stem.parse::<FlagId>()
        .with_context(|| format!("flag file {} is not named by an 8-digit hex id", p.display()))
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn load_images_with_progress(paths: &[PathBuf], progress: bool) -> anyhow::Result<Vec<FlagImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        // One unreadable flag leaves a hole the runtime cannot detect, so it aborts the run.
        let id = flag_id_of(p)?;
        let image = load_image(p).with_context(|| format!("load {}", p.display()))?;
        list.push(FlagImage { id, image });
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn render_metadata(
    cli: &BuildArgs,
    layout: &FlagLayout,
    image_name: &str,
) -> anyhow::Result<(PathBuf, String)> {
    match cli.metadata.as_str() {
        "json" => {
            let text = serde_json::to_string_pretty(&to_json(layout))?;
            Ok((cli.out_dir.join(format!("{}.json", cli.name)), text))
        }
        "c-header" => {
            let ctx = build_template_context(layout, image_name);
            let text = render_template(include_str!("templates/c_header.hbs"), &ctx)?;
            Ok((cli.out_dir.join(format!("{}.h", cli.name)), text))
        }
        "rust" => {
            let ctx = build_template_context(layout, image_name);
            let text = render_template(include_str!("templates/rust.hbs"), &ctx)?;
            Ok((cli.out_dir.join(format!("{}.rs", cli.name)), text))
        }
        "template" => {
            let path = cli
                .template
                .as_ref()
                .context("--metadata template needs --template <file>")?;
            let tpl = fs::read_to_string(path)
                .with_context(|| format!("read template {}", path.display()))?;
            let ctx = build_template_context(layout, image_name);
            let text = render_template(&tpl, &ctx)
                .with_context(|| format!("render template {}", path.display()))?;
            // `layout.lua.hbs` renders to `<name>.lua`
            let ext = Path::new(path.file_stem().unwrap_or_default())
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("txt");
            Ok((cli.out_dir.join(format!("{}.{}", cli.name, ext)), text))
        }
        other => anyhow::bail!("unknown metadata format: {}", other),
    }
}

fn render_template(tpl: &str, ctx: &TemplateContext) -> anyhow::Result<String> {
    let mut reg = Handlebars::new();
    reg.set_strict_mode(true);
    reg.register_escape_fn(handlebars::no_escape);
    reg.register_template_string("tpl", tpl)?;
    Ok(reg.render("tpl", ctx)?)
}

fn stats_json(stats: &LayoutStats) -> anyhow::Result<String> {
    let value = serde_json::json!({
        "cells": stats.n_cells,
        "columns": stats.n_columns,
        "rows": stats.n_rows,
        "atlas_area": stats.atlas_area,
        "covered_area": stats.covered_area,
        "estimated_waste": stats.estimated_waste,
        "occupancy": stats.occupancy,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Serialize)]
struct TemplateFlag {
    index: usize,
    /// Lowercase hex, as in file names.
    id: String,
    /// C/Rust literal, e.g. `0x0a1b2c3d`.
    hex: String,
    uv: [f32; 4],
}

/// Content rectangle of one cell in atlas pixels; the border cell comes last.
#[derive(Serialize)]
struct TemplateCell {
    index: usize,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    border: bool,
}

#[derive(Serialize)]
struct TemplateContext {
    app: &'static str,
    version: &'static str,
    image: String,
    atlas_width: u32,
    atlas_height: u32,
    scale_mode: ScaleMode,
    stretch: bool,
    flag_x: u32,
    flag_y: u32,
    padding_x: u32,
    padding_y: u32,
    border: u32,
    width_units: u32,
    height_units: u32,
    n_columns: u32,
    n_rows: u32,
    n_cells: usize,
    unit_x: f64,
    unit_y: f64,
    border_index: usize,
    border_uv: [f32; 4],
    flag_count: usize,
    flags: Vec<TemplateFlag>,
    cells: Vec<TemplateCell>,
}

fn build_template_context(layout: &FlagLayout, image_name: &str) -> TemplateContext {
    let flags = layout
        .flags
        .iter()
        .enumerate()
        .map(|(index, id)| TemplateFlag {
            index,
            id: id.to_string(),
            hex: format!("0x{id}"),
            uv: layout.uv(index).unwrap_or_default(),
        })
        .collect();
    let cells = layout
        .placements()
        .iter()
        .map(|p| TemplateCell {
            index: p.index,
            x: p.content.x,
            y: p.content.y,
            w: p.content.w,
            h: p.content.h,
            border: p.index == layout.border_index(),
        })
        .collect();
    let r = &layout.ratios;
    let grid = layout.grid();
    TemplateContext {
        app: "flag-atlas",
        version: env!("CARGO_PKG_VERSION"),
        image: image_name.to_string(),
        atlas_width: layout.atlas_width,
        atlas_height: layout.atlas_height,
        scale_mode: layout.scale_mode,
        stretch: layout.scale_mode == ScaleMode::Stretch,
        flag_x: r.flag_x,
        flag_y: r.flag_y,
        padding_x: r.padding_x,
        padding_y: r.padding_y,
        border: r.border,
        width_units: grid.width_units,
        height_units: grid.height_units,
        n_columns: grid.n_columns,
        n_rows: grid.n_rows,
        n_cells: grid.n_cells,
        unit_x: layout.unit_scale.x,
        unit_y: layout.unit_scale.y,
        border_index: layout.border_index(),
        border_uv: layout.uv(layout.border_index()).unwrap_or_default(),
        flag_count: layout.flags.len(),
        flags,
        cells,
    }
}

/// Field-by-field overrides read from `--config`.
#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    width: Option<u32>,
    height: Option<u32>,
    flag_ratio_x: Option<u32>,
    flag_ratio_y: Option<u32>,
    padding_ratio_x: Option<u32>,
    padding_ratio_y: Option<u32>,
    border_ratio: Option<u32>,
    scale_mode: Option<String>,
    filter: Option<String>,
    texture_outlines: Option<bool>,
}

impl YamlConfig {
    fn apply(self, mut cfg: AtlasConfig) -> anyhow::Result<AtlasConfig> {
        if let Some(v) = self.width {
            cfg.width = v;
        }
        if let Some(v) = self.height {
            cfg.height = v;
        }
        if let Some(v) = self.flag_ratio_x {
            cfg.ratios.flag_x = v;
        }
        if let Some(v) = self.flag_ratio_y {
            cfg.ratios.flag_y = v;
        }
        if let Some(v) = self.padding_ratio_x {
            cfg.ratios.padding_x = v;
        }
        if let Some(v) = self.padding_ratio_y {
            cfg.ratios.padding_y = v;
        }
        if let Some(v) = self.border_ratio {
            cfg.ratios.border = v;
        }
        if let Some(s) = self.scale_mode {
            cfg.scale_mode = parse_scale_mode(&s)?;
        }
        if let Some(s) = self.filter {
            cfg.filter = parse_filter(&s)?;
        }
        if let Some(v) = self.texture_outlines {
            cfg.texture_outlines = v;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(mode: ScaleMode) -> FlagLayout {
        let cfg = AtlasConfig::builder()
            .with_dimensions(1024, 1024)
            .scale_mode(mode)
            .build();
        plan_layout((1..=4).map(FlagId).collect(), &cfg).expect("plan")
    }

    fn render(tpl: &str, layout: &FlagLayout) -> String {
        render_template(tpl, &build_template_context(layout, "flags.png")).expect("render")
    }

    /// Value following `prefix` on the first line that starts with it.
    fn value_after<'a>(text: &'a str, prefix: &str) -> &'a str {
        text.lines()
            .find_map(|l| l.strip_prefix(prefix))
            .unwrap_or_else(|| panic!("no line starting with {prefix:?}"))
            .trim_end_matches(';')
    }

    /// `[x, y, w, h]` rows of the cell table, recognised by their trailing comment.
    fn cell_rows(text: &str, marker: &str) -> Vec<[u32; 4]> {
        text.lines()
            .filter_map(|l| l.find(marker).map(|at| &l[..at]))
            .map(|data| {
                let n: Vec<u32> = data
                    .split(|c: char| !c.is_ascii_digit())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse().expect("number"))
                    .collect();
                assert_eq!(n.len(), 4, "row {data:?}");
                [n[0], n[1], n[2], n[3]]
            })
            .collect()
    }

    fn assert_rows_match_uv(layout: &FlagLayout, rows: &[[u32; 4]], w: f32, h: f32) {
        assert_eq!(rows.len(), layout.n_cells());
        for (i, &[x, y, rw, rh]) in rows.iter().enumerate() {
            let uv = [x as f32 / w, y as f32 / h, (x + rw) as f32 / w, (y + rh) as f32 / h];
            assert_eq!(Some(uv), layout.uv(i), "cell {i}");
        }
    }

    #[test]
    fn c_header_alone_reproduces_cell_uvs() {
        for mode in [ScaleMode::Uniform, ScaleMode::Stretch] {
            let layout = layout(mode);
            let text = render(include_str!("templates/c_header.hbs"), &layout);
            let w: f32 = value_after(&text, "#define FLAG_TEXTURE_WIDTH ").parse().expect("width");
            let h: f32 = value_after(&text, "#define FLAG_TEXTURE_HEIGHT ").parse().expect("height");
            assert_rows_match_uv(&layout, &cell_rows(&text, "/* cell "), w, h);

            let stretch = if mode == ScaleMode::Stretch { "1" } else { "0" };
            assert_eq!(value_after(&text, "#define FLAG_TEXTURE_STRETCH "), stretch);
            let unit_x: f64 = value_after(&text, "#define FLAG_TEXTURE_UNIT_SIZE_X ")
                .parse()
                .expect("unit x");
            assert_eq!(unit_x, layout.unit_scale.x);
        }
    }

    #[test]
    fn rust_constants_alone_reproduce_cell_uvs() {
        for mode in [ScaleMode::Uniform, ScaleMode::Stretch] {
            let layout = layout(mode);
            let text = render(include_str!("templates/rust.hbs"), &layout);
            let w: f32 = value_after(&text, "pub const FLAG_TEXTURE_WIDTH: u32 = ")
                .parse()
                .expect("width");
            let h: f32 = value_after(&text, "pub const FLAG_TEXTURE_HEIGHT: u32 = ")
                .parse()
                .expect("height");
            assert_rows_match_uv(&layout, &cell_rows(&text, "// cell "), w, h);
            let unit_y: f64 = value_after(&text, "pub const FLAG_TEXTURE_UNIT_SIZE_Y: f64 = ")
                .parse()
                .expect("unit y");
            assert_eq!(unit_y, layout.unit_scale.y);
        }
    }

    #[test]
    fn scale_modes_render_different_headers() {
        let tpl = include_str!("templates/c_header.hbs");
        let uniform = layout(ScaleMode::Uniform);
        let stretch = layout(ScaleMode::Stretch);
        assert_eq!(uniform.grid, stretch.grid);
        assert_ne!(render(tpl, &uniform), render(tpl, &stretch));
    }

    #[test]
    fn staged_files_appear_only_on_commit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let png = dir.path().join("flags.png");
        let meta = dir.path().join("flags.json");

        let mut staged = Staged::default();
        staged
            .write(&png, |tmp| Ok(fs::write(tmp, b"png")?))
            .expect("stage png");
        staged
            .write(&meta, |tmp| Ok(fs::write(tmp, b"{}")?))
            .expect("stage json");
        assert!(!png.exists() && !meta.exists());

        staged.commit().expect("commit");
        assert_eq!(fs::read(&png).expect("read png"), b"png");
        assert_eq!(fs::read(&meta).expect("read json"), b"{}");
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 2);
    }

    #[test]
    fn failed_metadata_write_leaves_no_atlas() {
        let dir = tempfile::tempdir().expect("tempdir");
        let png = dir.path().join("flags.png");
        let meta = dir.path().join("missing").join("flags.json");

        let result = (|| -> anyhow::Result<()> {
            let mut staged = Staged::default();
            staged.write(&png, |tmp| Ok(fs::write(tmp, b"png")?))?;
            staged.write(&meta, |tmp| Ok(fs::write(tmp, b"{}")?))?;
            staged.commit()
        })();

        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 0);
    }
}
