//! PNG rendering for generated artifacts

use dungen::{CellType, DungeonArtifact, SpawnKind};
use image::{Rgb, RgbImage};

const SCALE: u32 = 6;

fn cell_color(cell: CellType) -> Rgb<u8> {
    match cell {
        CellType::Floor => Rgb([210, 200, 180]),
        CellType::Wall => Rgb([40, 36, 48]),
        CellType::Door => Rgb([150, 95, 40]),
        CellType::Water => Rgb([60, 110, 190]),
        CellType::Lava => Rgb([200, 70, 30]),
    }
}

/// Render the artifact terrain (plus spawn markers) to a PNG file.
pub fn write_png(
    artifact: &DungeonArtifact,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut img = RgbImage::new(
        artifact.width as u32 * SCALE,
        artifact.height as u32 * SCALE,
    );

    for y in 0..artifact.height as u32 {
        for x in 0..artifact.width as u32 {
            let color = cell_color(artifact.cell(x as i32, y as i32));
            for dy in 0..SCALE {
                for dx in 0..SCALE {
                    img.put_pixel(x * SCALE + dx, y * SCALE + dy, color);
                }
            }
        }
    }

    for spawn in &artifact.spawns {
        let color = match spawn.kind {
            SpawnKind::Entrance => Rgb([60, 200, 90]),
            SpawnKind::Exit => Rgb([220, 60, 160]),
            _ => Rgb([240, 220, 70]),
        };
        let (sx, sy) = (spawn.position.x as u32 * SCALE, spawn.position.y as u32 * SCALE);
        for dy in 1..SCALE - 1 {
            for dx in 1..SCALE - 1 {
                img.put_pixel(sx + dx, sy + dy, color);
            }
        }
    }

    img.save(path)?;
    Ok(())
}
