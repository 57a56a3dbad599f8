//! Scores stdin lines with the configured sentiment backend, one JSON
//! object per line on stdout.

use std::io::{BufRead, Write};

use anyhow::Result;
use serde_json::json;

use imessage_wrapped_rust::config::AppConfig;
use imessage_wrapped_rust::logging::{init_logging, LogFormat};
use imessage_wrapped_rust::sentiment::SentimentEngine;
use imessage_wrapped_rust::validation::InputValidator;

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    let _guard = init_logging(Some(&config.get_log_level()), None, LogFormat::Text)?;

    let settings = config.sentiment.to_settings().from_process_env();
    settings.validate()?;
    let engine = SentimentEngine::resolve(&settings);
    let analyzer = engine.analyzer();

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string(engine.report())?)?;

    for line in std::io::stdin().lock().lines() {
        let text = InputValidator::sanitize_text(&line?);
        if text.is_empty() {
            continue;
        }

        let result = match analyzer.as_embedding() {
            Some(embedder) => {
                let (result, embedding) = embedder.analyze_with_embedding(Some(&text));
                let axes = embedding.map(|e| embedder.project_embedding(&e));
                json!({"text": text, "score": result.score, "label": result.label, "axes": axes})
            }
            None => {
                let result = analyzer.analyze(Some(&text));
                json!({"text": text, "score": result.score, "label": result.label})
            }
        };
        writeln!(stdout, "{result}")?;
    }

    stdout.flush()?;
    Ok(())
}
