//! Command-line front end for omrsheet: scanning, sheet rendering and exam analysis.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use omrsheet::scoring::{compute_exam_summary, compute_item_statistics};
use omrsheet::{
    AnswerKey, AnswerKeyRecord, Attempt, AttemptRecord, Choice, CornerSet, ExamSummary,
    ItemStatistic, PencilMark, ScanConfig, ScanResult, Scanner, SheetLayout, SheetSpec,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "omrsheet")]
#[command(about = "Read filled bubbles from photographed answer sheets and analyze exam results")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a captured sheet and write the per-item readings (JSON).
    Scan(CliScanArgs),

    /// Render a printable sheet, optionally pre-marked (PNG).
    Render(CliRenderArgs),

    /// Compute item statistics and an exam summary from stored attempts.
    Analyze(CliAnalyzeArgs),

    /// Print the sheet layout geometry.
    LayoutInfo {
        /// Layout JSON (`omrsheet.layout.v1`); built-in layout when omitted.
        #[arg(long)]
        layout: Option<PathBuf>,
    },

    /// Print the canvas position of one bubble.
    BubblePosition {
        /// 1-based item number.
        #[arg(long)]
        item: u32,

        /// Choice letter (A, B, ...).
        #[arg(long)]
        choice: char,

        #[arg(long)]
        layout: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct CliScanArgs {
    /// Path to the captured image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write the scan result (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Number of items on the sheet. Taken from --key when omitted.
    #[arg(long)]
    items: Option<u32>,

    /// Choices per item. Taken from --key when omitted.
    #[arg(long)]
    choices: Option<u8>,

    /// Layout JSON (`omrsheet.layout.v1`).
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Partial scan config overlay (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Answer key record (JSON); the scanned responses are graded against it.
    #[arg(long)]
    key: Option<PathBuf>,

    /// Manual corner marker centers in pixels: tl_x,tl_y,tr_x,tr_y,bl_x,bl_y,br_x,br_y.
    /// Skips automatic corner detection.
    #[arg(long, value_delimiter = ',')]
    corners: Option<Vec<f64>>,

    /// Override the fill threshold of the layout.
    #[arg(long)]
    fill_threshold: Option<f32>,
}

#[derive(Debug, Clone, Args)]
struct CliRenderArgs {
    /// Path to write the rendered sheet (PNG).
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value = "20")]
    items: u32,

    #[arg(long, default_value = "4")]
    choices: u8,

    #[arg(long)]
    layout: Option<PathBuf>,

    /// Pencil marks as ITEM:LETTER pairs, e.g. `1:A,2:C`.
    #[arg(long, value_delimiter = ',')]
    marks: Vec<String>,

    /// Gray level of the pencil marks (0 = black).
    #[arg(long, default_value = "40")]
    mark_intensity: u8,
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    /// Answer key record (JSON).
    #[arg(long)]
    key: PathBuf,

    /// Array of attempt records (JSON).
    #[arg(long)]
    attempts: PathBuf,

    /// Path to write statistics and summary (JSON).
    #[arg(long)]
    out: PathBuf,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(&args),
        Commands::Render(args) => run_render(&args),
        Commands::Analyze(args) => run_analyze(&args),
        Commands::LayoutInfo { layout } => run_layout_info(layout.as_deref()),
        Commands::BubblePosition {
            item,
            choice,
            layout,
        } => run_bubble_position(item, choice, layout.as_deref()),
    }
}

fn load_layout(path: Option<&Path>) -> CliResult<SheetLayout> {
    match path {
        Some(path) => {
            tracing::info!("Loading layout: {}", path.display());
            Ok(SheetLayout::from_json_file(path)?)
        }
        None => Ok(SheetLayout::default()),
    }
}

fn load_answer_key(path: &Path) -> CliResult<AnswerKey> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| -> CliError { format!("Failed to read key {}: {}", path.display(), e).into() })?;
    let record: AnswerKeyRecord = serde_json::from_str(&data)?;
    Ok(AnswerKey::try_from(record)?)
}

fn parse_choice(letter: char) -> CliResult<Choice> {
    Choice::from_letter(letter).ok_or_else(|| format!("invalid choice letter '{letter}'").into())
}

// ── layout-info ───────────────────────────────────────────────────────

fn run_layout_info(layout_path: Option<&Path>) -> CliResult<()> {
    let layout = load_layout(layout_path)?;
    let [w, h] = layout.canvas_size();

    println!("omrsheet layout");
    println!("  name:             {}", layout.name);
    println!("  canvas:           {}x{} px", w, h);
    println!("  capacity:         {} items", layout.capacity());
    println!(
        "  grid:             {} columns x {} rows",
        layout.columns, layout.rows_per_column
    );
    println!("  max choices:      {}", layout.max_choices);
    println!("  bubble radius:    {:.1}", layout.bubble_radius);
    println!("  fill threshold:   {:.2}", layout.fill_threshold);
    for (position, center) in omrsheet::CornerPosition::ALL
        .iter()
        .zip(layout.corner_marker_centers().to_array())
    {
        println!(
            "  marker {:<12} ({:.1}, {:.1})",
            format!("{position}:"),
            center[0],
            center[1]
        );
    }

    Ok(())
}

// ── bubble-position ───────────────────────────────────────────────────

fn run_bubble_position(item: u32, letter: char, layout_path: Option<&Path>) -> CliResult<()> {
    let layout = load_layout(layout_path)?;
    let choice = parse_choice(letter)?;
    let center = layout
        .bubble_center(item, choice)
        .ok_or_else(|| -> CliError { format!("item {item} choice {choice} is not on this layout").into() })?;

    println!("item {} choice {}: ({:.1}, {:.1})", item, choice, center[0], center[1]);
    Ok(())
}

// ── render ────────────────────────────────────────────────────────────

fn parse_mark(raw: &str, intensity: u8) -> CliResult<PencilMark> {
    let (item, letter) = raw
        .split_once(':')
        .ok_or_else(|| -> CliError { format!("mark '{raw}' is not ITEM:LETTER").into() })?;
    let item: u32 = item
        .trim()
        .parse()
        .map_err(|e| -> CliError { format!("mark '{raw}': {e}").into() })?;
    let mut chars = letter.trim().chars();
    let choice = match (chars.next(), chars.next()) {
        (Some(c), None) => parse_choice(c)?,
        _ => return Err(format!("mark '{raw}' is not ITEM:LETTER").into()),
    };
    Ok(PencilMark::new(item, choice).with_intensity(intensity))
}

fn run_render(args: &CliRenderArgs) -> CliResult<()> {
    let layout = load_layout(args.layout.as_deref())?;
    let sheet = SheetSpec::new(args.items, args.choices);
    sheet.validate(&layout)?;

    let marks = args
        .marks
        .iter()
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_mark(raw, args.mark_intensity))
        .collect::<CliResult<Vec<_>>>()?;

    let img = omrsheet::render_sheet(&layout, &sheet, &marks);
    img.save(&args.out)?;
    tracing::info!(
        "Rendered {} items x {} choices ({} marks) to {}",
        sheet.total_items,
        sheet.num_choices,
        marks.len(),
        args.out.display()
    );

    Ok(())
}

// ── scan ──────────────────────────────────────────────────────────────

#[derive(serde::Serialize)]
struct ScanReport<'a> {
    #[serde(flatten)]
    scan: &'a ScanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    grade: Option<Attempt>,
}

fn corners_from_args(values: &[f64]) -> CliResult<CornerSet> {
    if values.len() != 8 || values.iter().any(|v| !v.is_finite()) {
        return Err("--corners expects 8 finite numbers".into());
    }
    Ok(CornerSet::from_array([
        [values[0], values[1]],
        [values[2], values[3]],
        [values[4], values[5]],
        [values[6], values[7]],
    ]))
}

fn run_scan(args: &CliScanArgs) -> CliResult<()> {
    let layout = load_layout(args.layout.as_deref())?;
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };
    if args.fill_threshold.is_some() {
        config.bubbles.fill_threshold = args.fill_threshold;
    }

    let key = args.key.as_deref().map(load_answer_key).transpose()?;
    let sheet = match (&key, args.items, args.choices) {
        (_, Some(items), Some(choices)) => SheetSpec::new(items, choices),
        (Some(key), items, choices) => SheetSpec::new(
            items.unwrap_or(key.total_items()),
            choices.unwrap_or(key.num_choices()),
        ),
        (None, _, _) => return Err("provide --items and --choices, or --key".into()),
    };

    tracing::info!("Loading image: {}", args.image.display());
    let img = omrsheet::load_image(&args.image)?;
    tracing::info!("Image size: {}x{}", img.width(), img.height());

    let scanner = Scanner::with_config(layout, config)?;
    let scanned = match &args.corners {
        Some(values) => scanner.scan_with_corners(&img, &sheet, &corners_from_args(values)?),
        None => scanner.scan(&img, &sheet),
    };
    let result = scanned.map_err(|e| -> CliError { format!("{e} ({})", e.remediation_hint()).into() })?;

    let ambiguous = result.ambiguous_items();
    tracing::info!(
        "Read {} items: {} answered, {} ambiguous (orientation {:?}, quality {:.3})",
        result.items.len(),
        result.responses().len(),
        ambiguous.len(),
        result.orientation,
        result.quality,
    );
    if !ambiguous.is_empty() {
        tracing::warn!("Ambiguous items need manual review: {:?}", ambiguous);
    }

    let grade = key.as_ref().map(|key| Attempt::grade(result.responses(), key));
    if let Some(grade) = &grade {
        tracing::info!("Score: {}/{}", grade.score, grade.total_items);
    }

    let json = serde_json::to_string_pretty(&ScanReport {
        scan: &result,
        grade,
    })?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());

    Ok(())
}

// ── analyze ───────────────────────────────────────────────────────────

#[derive(serde::Serialize)]
struct AnalysisReport {
    summary: ExamSummary,
    items: Vec<ItemStatistic>,
}

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    let key = load_answer_key(&args.key)?;
    let data = std::fs::read_to_string(&args.attempts).map_err(|e| -> CliError {
        format!("Failed to read attempts {}: {}", args.attempts.display(), e).into()
    })?;
    let records: Vec<AttemptRecord> = serde_json::from_str(&data)?;
    let attempts = records
        .into_iter()
        .map(|record| record.into_attempt(&key))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(
        "Analyzing {} attempts over {} items",
        attempts.len(),
        key.total_items()
    );

    let items = compute_item_statistics(&attempts, &key);
    let summary = compute_exam_summary(&attempts, &items, key.total_items());
    tracing::info!(
        "Mean {:.2}, pass rate {:.1}%",
        summary.mean_score,
        summary.pass_rate * 100.0
    );

    let json = serde_json::to_string_pretty(&AnalysisReport { summary, items })?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Analysis written to {}", args.out.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_marks() {
        let mark = parse_mark("12:c", 30).unwrap();
        assert_eq!(mark.item, 12);
        assert_eq!(mark.choice, Choice::from_letter('C').unwrap());
        assert_eq!(mark.intensity, 30);
        assert!(parse_mark("12", 30).is_err());
        assert!(parse_mark("x:A", 30).is_err());
        assert!(parse_mark("3:AB", 30).is_err());
    }

    #[test]
    fn corners_need_eight_values() {
        assert!(corners_from_args(&[1.0; 7]).is_err());
        let set = corners_from_args(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        assert_eq!(set.bottom_right, [7.0, 8.0]);
    }

    fn scan_args(dir: &Path, image: PathBuf) -> CliScanArgs {
        CliScanArgs {
            image,
            out: dir.join("scan.json"),
            items: None,
            choices: None,
            layout: None,
            config: None,
            key: None,
            corners: None,
            fill_threshold: None,
        }
    }

    #[test]
    fn rendered_sheet_scans_and_grades() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("sheet.png");
        run_render(&CliRenderArgs {
            out: png.clone(),
            items: 2,
            choices: 4,
            layout: None,
            marks: vec!["1:A".into(), "2:B".into()],
            mark_intensity: 40,
        })
        .unwrap();

        let key = dir.path().join("key.json");
        std::fs::write(
            &key,
            r#"{"total_questions": 2, "num_choices": 4, "answers": {"1": "A", "2": "B"}}"#,
        )
        .unwrap();
        let mut args = scan_args(dir.path(), png);
        args.key = Some(key);
        run_scan(&args).unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&args.out).unwrap()).unwrap();
        assert_eq!(report["grade"]["score"], 2);
    }

    #[test]
    fn scan_rejects_inconsistent_config() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("sheet.png");
        run_render(&CliRenderArgs {
            out: png.clone(),
            items: 5,
            choices: 4,
            layout: None,
            marks: vec![],
            mark_intensity: 40,
        })
        .unwrap();
        let config = dir.path().join("scan_config.json");
        std::fs::write(
            &config,
            r#"{"bubbles": {"threshold_min": 200.0, "threshold_max": 100.0}}"#,
        )
        .unwrap();

        let mut args = scan_args(dir.path(), png.clone());
        args.items = Some(5);
        args.choices = Some(4);
        args.config = Some(config);
        let err = run_scan(&args).unwrap_err();
        assert!(err.to_string().contains("threshold_min"));
        assert!(!args.out.exists());

        let mut args = scan_args(dir.path(), png);
        args.items = Some(5);
        args.choices = Some(4);
        args.fill_threshold = Some(1.5);
        assert!(run_scan(&args).is_err());
    }

    #[test]
    fn analyze_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("key.json");
        let attempts = dir.path().join("attempts.json");
        let out = dir.path().join("report.json");
        std::fs::write(
            &key,
            r#"{"total_questions": 2, "num_choices": 4, "answers": {"1": "A", "2": "B"}}"#,
        )
        .unwrap();
        std::fs::write(
            &attempts,
            r#"[{"answers": {"1": "A", "2": "B"}}, {"answers": {"1": "C"}}]"#,
        )
        .unwrap();

        run_analyze(&CliAnalyzeArgs {
            key,
            attempts,
            out: out.clone(),
        })
        .unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(report["summary"]["total_attempts"], 2);
        assert_eq!(report["items"].as_array().map(Vec::len), Some(2));
    }
}
