use std::path::PathBuf;
use std::time::Instant;

use noisescope::render::Frame;
use noisescope::scheduler::Surface;
use noisescope::session::{Command, Session};
use noisescope::transport::FileBlob;

/// Writes every presented frame as a numbered PNG.
struct PngSequence {
    dir: PathBuf,
    width: usize,
    height: usize,
    written: usize,
}

impl Surface for PngSequence {
    type Error = image::ImageError;

    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn present(&mut self, frame: &Frame) -> Result<(), Self::Error> {
        let path = self.dir.join(format!("frame_{:04}.png", self.written));
        image::save_buffer(
            &path,
            &frame.rgba,
            frame.width as u32,
            frame.height as u32,
            image::ColorType::Rgba8,
        )?;
        log::debug!("saved {} (t={:.3})", path.display(), frame.time);
        self.written += 1;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let width: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(512);
    let height: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(512);
    let frames: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(120);
    let out_dir: PathBuf = args
        .get(4)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));
    // Remaining args: an optional snapshot path and `key=value` overrides.
    let (overrides, paths): (Vec<&String>, Vec<&String>) =
        args.iter().skip(5).partition(|a| a.contains('='));
    let state_in = paths.first().map(|p| FileBlob::new(p.as_str()));

    std::fs::create_dir_all(&out_dir)?;

    let surface = PngSequence {
        dir: out_dir.clone(),
        width,
        height,
        written: 0,
    };
    let mut session = Session::new(surface, Instant::now());

    if let Some(mut blob) = state_in {
        session.import_from(&mut blob)?;
        log::info!("loaded parameters from {}", blob.path().display());
    }

    for arg in overrides {
        if let Some((field, value)) = arg.split_once('=') {
            session.submit(Command::set(field, value));
        }
    }
    if let Some(e) = session.process_commands().into_iter().next() {
        return Err(e.into());
    }

    log::info!("rendering {} frames of {}x{} into {}", frames, width, height, out_dir.display());

    for _ in 0..frames {
        let report = session.frame(Instant::now())?;
        for e in &report.rejected {
            log::warn!("{}", e);
        }
    }

    let mut state_out = FileBlob::new(out_dir.join("state.json"));
    session.export_to(&mut state_out)?;

    match session.scheduler().last_fps() {
        Some(fps) => log::info!("done, {} frames written, last {} FPS", session.surface().written, fps),
        None => log::info!("done, {} frames written in under a second", session.surface().written),
    }
    Ok(())
}
