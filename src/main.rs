//! Gameball headless runner
//!
//! Loads a scene, runs it for a number of frames and prints JSON to stdout.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use clap::Parser;

    use gameball::{SceneConfig, Session, Settings};

    /// Run a Gameball scene headless and print the result as JSON
    #[derive(Parser, Debug)]
    #[command(name = "gameball")]
    #[command(about = "Run a Gameball scene headless and print the result as JSON")]
    struct Args {
        /// Scene JSON file
        scene: PathBuf,

        /// Frames to run (clamped by settings; default from settings)
        frames: Option<u32>,

        /// Settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Override the settings RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print every frame's draw commands as JSON lines instead of a summary
        #[arg(long)]
        commands: bool,

        /// Pretty-print the summary
        #[arg(long)]
        pretty: bool,
    }

    pub fn run() -> gameball::Result<()> {
        let args = Args::parse();

        let mut settings = match &args.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(seed) = args.seed {
            settings.seed = seed;
        }

        let json = std::fs::read_to_string(&args.scene)?;
        let scene = SceneConfig::from_json(&json)?;
        log::info!(
            "Loaded {} ({} objects, {} events, {} keyframes)",
            args.scene.display(),
            scene.objects.len(),
            scene.events.len(),
            scene.keyframes.len()
        );

        let mut session = Session::from_scene(scene, settings);
        if args.commands {
            let frames = session.settings().run_frames(args.frames);
            for _ in 0..frames {
                let output = session.step();
                println!("{}", serde_json::to_string(&output)?);
            }
            return Ok(());
        }

        let summary = session.run_frames(args.frames);
        let out = if args.pretty {
            serde_json::to_string_pretty(&summary)?
        } else {
            serde_json::to_string(&summary)?
        };
        println!("{out}");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(e) = cli::run() {
        log::error!("{e}");
        eprintln!("gameball: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Embedders drive `Session` directly; there is no wasm entry point
}
