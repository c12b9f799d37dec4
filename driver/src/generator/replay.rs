use anyhow::Context;
use spotcore::DetectionResult;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Reads JSON-lines detection records. Blank lines are skipped.
pub fn load_results<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<DetectionResult>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading replay file {}", path_ref.display()))?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            DetectionResult::from_json(line)
                .with_context(|| format!("{}:{}", path_ref.display(), number + 1))
        })
        .collect()
}

/// Writes detections as JSON lines so a run can be replayed later.
pub fn save_results<P: AsRef<Path>>(path: P, results: &[DetectionResult]) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref)
        .with_context(|| format!("creating replay file {}", path_ref.display()))?;
    let mut writer = BufWriter::new(file);
    for result in results {
        serde_json::to_writer(&mut writer, result).context("encoding detection record")?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
