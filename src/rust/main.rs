use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use astroassist::{Classifier, ClassifierBuilder, EngineConfig, ModelManager};
use clap::Parser;
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing intent_classifier.onnx and label_maps.json
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// JSON engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Classify a single command and exit
    #[arg(short, long)]
    text: Option<String>,
}

fn build_classifier(args: &Args) -> Result<Classifier> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.model_dir {
        config.model_dir = Some(dir.clone());
    }
    let dir = config
        .model_dir
        .clone()
        .unwrap_or_else(ModelManager::get_default_models_dir);
    if !ModelManager::new(&dir).is_model_available() {
        warn!("Model artifacts missing from {}; startup will fail", dir.display());
    }
    config.model_dir = Some(dir);

    ClassifierBuilder::from_config(&config)
        .build()
        .context("failed to initialise the intent classifier")
}

/// Renders the console reply for one line of input. Blank lines are
/// classified like any other text.
fn respond(classifier: &Classifier, line: &str) -> String {
    match classifier.classify(line) {
        Ok(result) => format!("Intent: {}", result.resolved_label),
        Err(e) => format!("Error processing command: {}", e),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start_time = Instant::now();
    info!("Loading intent classifier...");
    let classifier = build_classifier(&args)?;
    info!("Classifier ready (took {:.2?})", start_time.elapsed());

    if let Some(text) = &args.text {
        println!("Intent: {}", classifier.classify_label(text)?);
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Enter: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        println!("{}", respond(&classifier, &line));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use astroassist::{BoundInputs, ClassifierError, InferenceBackend, LabelMap, ModelInputSpec};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct CountingModel {
        inputs: Vec<ModelInputSpec>,
        calls: Arc<AtomicUsize>,
    }

    impl InferenceBackend for CountingModel {
        fn declared_inputs(&self) -> &[ModelInputSpec] {
            &self.inputs
        }

        fn run(&self, _inputs: &BoundInputs) -> Result<Vec<f32>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.1, 0.9])
        }
    }

    #[test]
    fn test_blank_lines_are_classified() {
        let calls = Arc::new(AtomicUsize::new(0));
        let classifier = Classifier::builder()
            .with_labels(LabelMap::from_pairs([("check_oxygen", 0), ("status_report", 1)]).unwrap())
            .with_backend(CountingModel {
                inputs: vec![ModelInputSpec::new("input_ids")],
                calls: Arc::clone(&calls),
            })
            .build()
            .unwrap();

        assert_eq!(respond(&classifier, ""), "Intent: status_report");
        assert_eq!(respond(&classifier, "   "), "Intent: status_report");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(respond(&classifier, "smoke in the galley"), "Intent: emergency");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
