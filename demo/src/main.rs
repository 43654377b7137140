//! Command-line demo: generate a dungeon, print it, optionally render
//! it to PNG or dump the artifact as JSON.

mod render;

use clap::Parser;
use dungen::{generate, share_code, AlgorithmKind, Config, SeedInput};

#[derive(Parser)]
#[command(name = "dungen-demo", about = "Generate and render dungeons")]
struct Cli {
    #[arg(long, default_value_t = 80)]
    width: usize,

    #[arg(long, default_value_t = 60)]
    height: usize,

    /// Algorithm: bsp, cellular or hybrid.
    #[arg(long, default_value = "bsp")]
    algorithm: String,

    /// Numeric or text seed.
    #[arg(long, default_value = "12345")]
    seed: String,

    /// Write a PNG rendering to this path.
    #[arg(long)]
    png: Option<String>,

    /// Write the artifact JSON to this path.
    #[arg(long)]
    json: Option<String>,

    /// Place doors on every qualifying corridor.
    #[arg(long)]
    doors: bool,

    /// Theme cavern walls with water veins.
    #[arg(long)]
    decor: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let algorithm = match cli.algorithm.as_str() {
        "bsp" => AlgorithmKind::Bsp,
        "cellular" => AlgorithmKind::Cellular,
        "hybrid" => AlgorithmKind::Hybrid,
        other => return Err(format!("unknown algorithm `{other}`").into()),
    };
    let seed = match cli.seed.parse::<u32>() {
        Ok(n) => SeedInput::Number(n),
        Err(_) => SeedInput::Text(cli.seed.clone()),
    };

    let mut config = Config {
        width: cli.width,
        height: cli.height,
        algorithm,
        seed,
        ..Config::default()
    };
    if cli.doors {
        config.doors.door_ratio = 1.0;
    }
    if cli.decor {
        config.decor.enabled = true;
    }

    let artifact = generate(&config)?;
    println!("{artifact}");
    println!(
        "\n{} rooms, {} connections, {} spawns",
        artifact.rooms.len(),
        artifact.connections.len(),
        artifact.spawns.len()
    );
    println!("checksum: {}", artifact.checksum);
    println!("share code: {}", share_code(&artifact)?);

    if let Some(path) = cli.png {
        render::write_png(&artifact, &path)?;
        println!("wrote {path}");
    }
    if let Some(path) = cli.json {
        std::fs::write(&path, serde_json::to_string_pretty(&artifact)?)?;
        println!("wrote {path}");
    }
    Ok(())
}
