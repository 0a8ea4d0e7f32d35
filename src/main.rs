use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use math_board::board::{BoardSession, HttpEvaluationService, LogTypesetter};
use math_board::logging;
use math_board::settings::Settings;
use math_board::sketch::Sketch;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sketch_path = args
        .next()
        .context("usage: math_board <sketch.json> [settings.json]")?;
    let settings_path = args.next().unwrap_or_else(|| "settings.json".to_string());

    let settings = Settings::load(&settings_path)
        .with_context(|| format!("load settings {settings_path}"))?
        .with_env_overrides();
    logging::init(settings.debug_logging, settings.log_file.clone());

    let sketch = Sketch::load(&sketch_path)?;
    let service = HttpEvaluationService::new(&settings.api_url, settings.request_timeout())?;
    tracing::info!(endpoint = service.endpoint(), "using evaluation service");

    let mut session = BoardSession::new(
        Arc::new(service),
        Box::new(LogTypesetter),
        settings.session_config(),
    );
    session.mount(
        settings.viewport_width,
        settings.viewport_height,
        settings.top_offset,
    );

    let strokes = sketch.replay(&mut session)?;
    tracing::info!(strokes, "replayed sketch");

    session.submit()?;
    loop {
        session.tick(Instant::now())?;
        if session.is_settled() {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    for entry in session.overlay().entries() {
        let position = entry.position();
        println!("{} @ ({:.1}, {:.1})", entry.markup(), position.x, position.y);
    }
    for (name, value) in session.bindings().snapshot() {
        println!("{name} = {value}");
    }
    Ok(())
}
