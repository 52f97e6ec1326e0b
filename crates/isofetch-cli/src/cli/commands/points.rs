//! `isofetch points` – inspect a station CSV without fetching anything.

use anyhow::Result;
use isofetch_core::stations;
use isofetch_core::Category;
use std::path::Path;

pub fn run_points(path: &Path) -> Result<()> {
    let points = stations::load_points(path)?;
    println!(
        "{:<5} {:<32} {:<9} {:>11} {:>11} {:<8}",
        "#", "NAME", "CATEGORY", "LONGITUDE", "LATITUDE", "COLOR"
    );
    for (i, p) in points.iter().enumerate() {
        let flag = if p.validate().is_err() { " (invalid)" } else { "" };
        println!(
            "{:<5} {:<32} {:<9} {:>11.6} {:>11.6} {:<8}{}",
            i + 1,
            p.display_name(i),
            p.category,
            p.longitude,
            p.latitude,
            p.display_color(),
            flag
        );
    }
    let count = |c: Category| points.iter().filter(|p| p.category == c).count();
    println!(
        "{} station(s): {} metro, {} tram, {} monorail",
        points.len(),
        count(Category::Metro),
        count(Category::Tram),
        count(Category::Monorail)
    );
    Ok(())
}
