//! Compas2D 演示程序
//!
//! 无窗口：读取可选的内核配置和事件脚本（JSON），逐个送入编辑器，
//! 最后打印帧统计和构造树。
//!
//! ```text
//! compas2d [--verbose] [--config kernel.json] [--script events.json] [--size 800x600]
//! ```

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use compas_core::config::KernelConfig;
use compas_core::construct::ConstructionMethod;
use compas_core::view::Viewport;
use compas_ui::{Editor, InputEvent, MouseButton, Response, SessionOutcome};

#[derive(Debug, Default)]
struct Options {
    verbose: bool,
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    size: Option<(u32, u32)>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => options.verbose = true,
            "--config" => {
                options.config = Some(args.next().context("--config needs a path")?.into())
            }
            "--script" => {
                options.script = Some(args.next().context("--script needs a path")?.into())
            }
            "--size" => {
                let text = args.next().context("--size needs WIDTHxHEIGHT")?;
                let (w, h) = text
                    .split_once('x')
                    .with_context(|| format!("invalid size '{}'", text))?;
                options.size = Some((w.trim().parse()?, h.trim().parse()?));
            }
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(options)
}

fn load_config(path: Option<&PathBuf>) -> Result<KernelConfig> {
    let Some(path) = path else {
        return Ok(KernelConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn load_script(path: Option<&PathBuf>, viewport: Viewport) -> Result<Vec<InputEvent>> {
    let Some(path) = path else {
        return Ok(demo_script(viewport));
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid script {}", path.display()))
}

/// 内置演示：几种构造方式各画一个
fn demo_script(viewport: Viewport) -> Vec<InputEvent> {
    let c = viewport.center();
    let click = |x: f64, y: f64| InputEvent::PointerDown {
        x: c.x + x,
        y: c.y - y,
        button: MouseButton::Left,
    };
    let text = |s: &str| InputEvent::Text(s.to_string());

    vec![
        text("LINE"),
        text("-200,-100"),
        text("@400,0"),
        InputEvent::BeginConstruction(ConstructionMethod::CircleThreePoints),
        click(-40.0, 0.0),
        click(0.0, 40.0),
        click(40.0, 0.0),
        text("POLYINSC"),
        InputEvent::Value(6.0),
        click(120.0, 60.0),
        click(150.0, 60.0),
        text("RECCENTER"),
        text("-120,60"),
        text("80,40"),
        text("ROUNDPOLY"),
        text("-180,-40"),
        text("-120,20"),
        text("-60,-40"),
        text("8"),
        InputEvent::Finish,
        InputEvent::ShowLabel {
            target: compas_core::entity::ObjectId(2),
            show: true,
        },
        InputEvent::Wheel { notches: 2 },
        InputEvent::RotateView { degrees: 15.0 },
    ]
}

fn main() -> Result<()> {
    let options = parse_args()?;

    // 初始化日志
    let level = if options.verbose { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(level).finish(),
    )?;

    info!("Starting Compas2D...");

    let config = load_config(options.config.as_ref())?;
    let (width, height) = options.size.unwrap_or((800, 600));
    let viewport = Viewport::new(width, height);
    let events = load_script(options.script.as_ref(), viewport)?;

    let mut editor = Editor::new(config, viewport);
    for event in events {
        match editor.handle(event) {
            Response::Session(SessionOutcome::Created { id, warnings }) => {
                info!("created {}", id);
                for warning in warnings {
                    warn!("{}: {:?}", id, warning);
                }
            }
            Response::Session(SessionOutcome::Failed(err)) => warn!("{}", err),
            Response::Rejected(message) => warn!("{}", message),
            _ => {}
        }
    }

    let frame = editor.frame();
    let pixels: usize = frame.primitives.iter().map(|p| p.pixel_count()).sum();
    info!(
        "frame {}x{}: {} primitives, {} pixels, {} labels",
        width,
        height,
        frame.primitives.len(),
        pixels,
        frame.labels.len()
    );
    for label in &frame.labels {
        info!(
            "label {} at ({:.1}, {:.1}): {}",
            label.object, label.position.x, label.position.y, label.text
        );
    }

    for row in editor.document().construction_tree() {
        println!(
            "{:>3}  {:<6} {:<22} {:<12} {}",
            row.index,
            row.id.to_string(),
            row.name,
            row.line_type,
            row.summary
        );
    }
    println!("{}", editor.prompt());

    Ok(())
}
