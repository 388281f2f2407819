use std::collections::VecDeque;
use std::time::Instant;

use crate::config::Params;
use crate::error::{Error, Result};
use crate::scheduler::{FrameScheduler, Surface};
use crate::store::ParamStore;
use crate::transport::TextBlob;

/// A parameter change queued by the host UI.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// One control moved: field key plus its raw value.
    Set { field: String, value: String },
    /// Every field at once from raw strings.
    Replace(Vec<(String, String)>),
    /// A text snapshot.
    Import(String),
    Reset,
}

impl Command {
    pub fn set(field: impl Into<String>, value: impl Into<String>) -> Self {
        Command::Set {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Outcome of one [`Session::frame`].
#[derive(Debug, Default)]
pub struct FrameReport {
    pub fps: Option<u32>,
    pub rejected: Vec<Error>,
}

/// The live parameter set, the frame loop and the surface in one
/// single-threaded owner. Commands are applied between frames, never during.
pub struct Session<S: Surface> {
    store: ParamStore,
    scheduler: FrameScheduler,
    surface: S,
    queue: VecDeque<Command>,
}

impl<S: Surface> Session<S> {
    pub fn new(surface: S, start: Instant) -> Self {
        Self::from_store(surface, ParamStore::default(), start)
    }

    /// Start from `params` instead of the defaults. Fails on a non-finite float.
    pub fn with_params(surface: S, params: Params, start: Instant) -> Result<Self> {
        Ok(Self::from_store(surface, ParamStore::new(params)?, start))
    }

    fn from_store(surface: S, store: ParamStore, start: Instant) -> Self {
        log::info!("session started with {:?}", store.snapshot());
        Self {
            store,
            scheduler: FrameScheduler::new(start),
            surface,
            queue: VecDeque::new(),
        }
    }

    pub fn submit(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply every queued command in order. Each one either lands whole or is
    /// rejected; rejections are logged and returned.
    pub fn process_commands(&mut self) -> Vec<Error> {
        let mut rejected = Vec::new();
        while let Some(command) = self.queue.pop_front() {
            if let Err(e) = self.execute(command) {
                log::warn!("command rejected: {}", e);
                rejected.push(e);
            }
        }
        rejected
    }

    fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Set { field, value } => self.store.apply_named(&field, &value)?,
            Command::Replace(pairs) => self.store.replace_raw(&pairs)?,
            Command::Import(text) => self.store.import(&text)?,
            Command::Reset => self.store.replace(Params::default())?,
        }
        Ok(())
    }

    /// Drain the queue, then render one frame.
    pub fn frame(&mut self, now: Instant) -> Result<FrameReport, S::Error> {
        let rejected = self.process_commands();
        let params = self.store.snapshot();
        let fps = self.scheduler.tick(now, &params, &mut self.surface)?;
        Ok(FrameReport { fps, rejected })
    }

    pub fn export_to<B: TextBlob>(&self, blob: &mut B) -> Result<()> {
        blob.write_text(&self.store.export()?)?;
        log::info!("snapshot exported");
        Ok(())
    }

    /// Read a snapshot and apply it immediately. Nothing changes on failure.
    pub fn import_from<B: TextBlob>(&mut self, blob: &mut B) -> Result<()> {
        let text = blob.read_text()?;
        self.store.import(&text)?;
        log::info!("snapshot imported");
        Ok(())
    }

    pub fn params(&self) -> Params {
        self.store.snapshot()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::render::Frame;
    use crate::transport::MemoryBlob;

    #[derive(Default)]
    struct Seen(Vec<Frame>);

    impl Surface for Seen {
        type Error = std::convert::Infallible;

        fn size(&self) -> (usize, usize) {
            (4, 2)
        }

        fn present(&mut self, frame: &Frame) -> Result<(), Self::Error> {
            self.0.push(frame.clone());
            Ok(())
        }
    }

    #[test]
    fn commands_apply_before_the_frame() {
        let start = Instant::now();
        let mut session = Session::new(Seen::default(), start);
        session.submit(Command::set("octaves", "2"));
        session.submit(Command::set("colorToggle", "true"));
        let report = session.frame(start + Duration::from_millis(16)).unwrap();

        assert!(report.rejected.is_empty());
        assert_eq!(session.pending(), 0);
        assert_eq!(session.params().octaves, 2);
        // tinted: blue is the complement of red
        let px = &session.surface().0[0].rgba[0..4];
        assert!((px[0] as i32 + px[2] as i32 - 255).abs() <= 1);
        assert!(px[1] <= px[0]);
    }

    #[test]
    fn rejected_commands_are_reported_and_skipped() {
        let start = Instant::now();
        let mut session = Session::new(Seen::default(), start);
        session.submit(Command::set("scale", "huge"));
        session.submit(Command::set("speed", "3"));
        session.submit(Command::Import("{}".into()));

        let rejected = session.process_commands();
        assert_eq!(rejected.len(), 2);
        assert!(matches!(rejected[0], Error::Parse(_)));
        assert!(matches!(rejected[1], Error::Decode(_)));
        assert_eq!(session.params().speed, 3.0);
        assert_eq!(session.params().scale, Params::default().scale);
    }

    #[test]
    fn torn_replace_never_reaches_a_frame() {
        let start = Instant::now();
        let mut session = Session::new(Seen::default(), start);
        let before = session.params();
        session.submit(Command::Replace(vec![
            ("scale".into(), "3".into()),
            ("octaves".into(), "1".into()),
        ]));
        let report = session.frame(start).unwrap();
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(session.params(), before);
    }

    #[test]
    fn export_then_import_through_a_blob() {
        let start = Instant::now();
        let mut a = Session::new(Seen::default(), start);
        a.submit(Command::set("mod1Fine", "0.5"));
        a.submit(Command::set("lacunarity", "2.5"));
        a.process_commands();

        let mut clipboard = MemoryBlob::new();
        a.export_to(&mut clipboard).unwrap();

        let mut b = Session::new(Seen::default(), start);
        b.import_from(&mut clipboard).unwrap();
        assert_eq!(b.params(), a.params());
    }

    #[test]
    fn empty_clipboard_is_an_error() {
        let start = Instant::now();
        let mut session = Session::new(Seen::default(), start);
        let before = session.params();
        let err = session.import_from(&mut MemoryBlob::new()).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(session.params(), before);
    }

    #[test]
    fn pasted_snapshot_replaces_the_set() {
        let start = Instant::now();
        let mut donor = Session::new(Seen::default(), start);
        donor.submit(Command::set("modMult", "2"));
        donor.submit(Command::set("octaves", "6"));
        donor.process_commands();
        let mut clipboard = MemoryBlob::new();
        donor.export_to(&mut clipboard).unwrap();
        let text = clipboard.read_text().unwrap();

        let mut session = Session::new(Seen::default(), start);
        session.import_from(&mut MemoryBlob::with_text(text)).unwrap();
        assert_eq!(session.params(), donor.params());

        let err = session
            .import_from(&mut MemoryBlob::with_text(r#"{"scale": 2}"#))
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(session.params(), donor.params());
    }

    #[test]
    fn reset_restores_defaults() {
        let start = Instant::now();
        let custom = Params {
            contrast: 3.0,
            ..Params::default()
        };
        let mut session = Session::with_params(Seen::default(), custom, start).unwrap();
        session.submit(Command::Reset);
        session.process_commands();
        assert_eq!(session.params(), Params::default());
    }

    #[test]
    fn non_finite_start_is_refused() {
        let params = Params {
            persistence: f32::NAN,
            ..Params::default()
        };
        let err = Session::with_params(Seen::default(), params, Instant::now()).err();
        assert!(matches!(err, Some(Error::Parse(_))));
    }
}
