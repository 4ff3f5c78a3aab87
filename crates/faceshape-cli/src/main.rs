use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use faceshape_core::{
    ClassificationPolicy, DetectionResult, FacePrediction, LandmarkSet, ShapeConfig, ShapeSession,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "faceshape", about = "Face-shape classification from face-mesh landmarks")]
struct Cli {
    /// Talk to a daemon on the system bus instead of the session bus
    #[arg(long, global = true)]
    system_bus: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single landmark set
    Classify {
        /// JSON file: keypoint array, face object, or detection result ("-" for stdin)
        file: PathBuf,
        #[command(flatten)]
        shape: ShapeArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run a JSON-lines stream of detection results through a local session
    Replay {
        /// One detection result per line ("-" for stdin)
        file: PathBuf,
        #[command(flatten)]
        shape: ShapeArgs,
        /// Print one JSON outcome per frame
        #[arg(long)]
        json: bool,
    },
    /// Send a JSON-lines stream of detection results to the daemon
    Submit {
        /// One detection result per line ("-" for stdin)
        file: PathBuf,
    },
    /// Show the daemon's current displayed label
    Current,
    /// Clear the daemon's label history
    Reset,
    /// Show daemon status
    Status,
}

#[derive(Args)]
struct ShapeArgs {
    /// Classification policy: "refined" or "legacy"
    #[arg(short, long)]
    policy: Option<ClassificationPolicy>,
    /// TOML file with policy, history size and thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Frames covered by the majority vote
    #[arg(long)]
    history_size: Option<usize>,
}

impl ShapeArgs {
    fn load(&self) -> Result<ShapeConfig> {
        let mut config = match &self.config {
            Some(path) => ShapeConfig::load(path)?,
            None => ShapeConfig::default(),
        };
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(size) = self.history_size {
            config.history_size = size;
        }
        Ok(config)
    }
}

#[zbus::proxy(
    interface = "org.freedesktop.FaceShape1",
    default_service = "org.freedesktop.FaceShape1",
    default_path = "/org/freedesktop/FaceShape1"
)]
trait FaceShape {
    fn submit_frame(&self, detection_json: &str) -> zbus::Result<String>;
    fn current_label(&self) -> zbus::Result<String>;
    fn reset(&self) -> zbus::Result<bool>;
    fn status(&self) -> zbus::Result<String>;
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { file, shape, json } => {
            let config = shape.load()?;
            let text = read_input(&file)?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let landmarks = parse_landmarks(value)?;

            let classifier = config.classifier();
            let metrics = classifier.measure(&landmarks)?;
            let label = classifier.decide(&metrics);

            if json {
                let out = serde_json::json!({
                    "label": label,
                    "policy": config.policy,
                    "metrics": metrics,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Face Shape: {label}");
                println!("  policy:          {}", config.policy);
                println!("  face height:     {:.1}", metrics.face_height);
                println!("  face width:      {:.1}", metrics.face_width);
                println!("  forehead width:  {:.1}", metrics.forehead_width);
                if let Some(cheek) = metrics.cheekbone_width {
                    println!("  cheekbone width: {cheek:.1}");
                }
                println!("  jaw width:       {:.1}", metrics.jaw_width);
                println!("  height/width:    {:.3}", metrics.ratio);
            }
        }
        Commands::Replay { file, shape, json } => {
            let config = shape.load()?;
            let mut session = ShapeSession::from_config(&config);
            tracing::info!(policy = %config.policy, history_size = config.history_size, "replaying");

            for (frame, line) in read_lines(&file)? {
                let detection: DetectionResult = serde_json::from_str(&line)
                    .with_context(|| format!("line {frame}: invalid detection result"))?;
                let outcome = session.process(&detection);
                if json {
                    let mut value = serde_json::to_value(outcome)?;
                    value["frame"] = frame.into();
                    println!("{value}");
                } else {
                    match outcome.displayed() {
                        Some(displayed) => println!("frame {frame}: Face Shape: {displayed}"),
                        None => println!("frame {frame}: Face Shape: No face detected"),
                    }
                }
            }
        }
        Commands::Submit { file } => {
            let proxy = connect(cli.system_bus).await?;
            for (frame, line) in read_lines(&file)? {
                let outcome = proxy.submit_frame(&line).await?;
                println!("frame {frame}: {outcome}");
            }
        }
        Commands::Current => {
            let proxy = connect(cli.system_bus).await?;
            let label = proxy.current_label().await?;
            if label.is_empty() {
                println!("Face Shape: No face detected");
            } else {
                println!("Face Shape: {label}");
            }
        }
        Commands::Reset => {
            let proxy = connect(cli.system_bus).await?;
            proxy.reset().await?;
            println!("History cleared");
        }
        Commands::Status => {
            let proxy = connect(cli.system_bus).await?;
            let status = proxy.status().await?;
            let value: serde_json::Value = serde_json::from_str(&status)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

async fn connect(system_bus: bool) -> Result<FaceShapeProxy<'static>> {
    let connection = if system_bus {
        zbus::Connection::system().await?
    } else {
        zbus::Connection::session().await?
    };
    FaceShapeProxy::new(&connection)
        .await
        .context("faceshaped is not reachable on D-Bus")
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Non-blank lines with their 1-based frame numbers.
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let text = read_input(path)?;
    Ok(text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect())
}

/// Accept a bare keypoint array, a single face object, or a full detection result.
fn parse_landmarks(value: serde_json::Value) -> Result<LandmarkSet> {
    let landmarks = if value.is_array() {
        Some(serde_json::from_value::<LandmarkSet>(value)?)
    } else if value.get("faces").is_some() {
        serde_json::from_value::<DetectionResult>(value)?
            .faces
            .into_iter()
            .next()
            .and_then(|f| f.keypoints)
    } else if value.get("keypoints").is_some() {
        serde_json::from_value::<FacePrediction>(value)?.keypoints
    } else {
        bail!("expected a keypoint array, a face with \"keypoints\", or a result with \"faces\"");
    };

    landmarks.context("no face detected in input")
}
