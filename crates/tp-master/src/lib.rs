//! Headless host for the twinplane synthesizer.
//!
//! Wires a control plane to a synthesis plane, either offline in one
//! thread ([`Session`]) or live with the engine on its own audio thread
//! ([`Controller`]). Both the CLI and tests drive the synth through here.

mod link;
mod midi_file;
mod script;
mod session;
mod wav;

use log::{debug, info, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;
use tp_audio::{AudioError, AudioOutput, CpalOutput};
use tp_control::ControlPlane;
use tp_engine::Engine;

pub use tp_ir::{Envelope, GlobalState, Instrument, WideSample, SAMPLE_RATE};

pub use link::{
    packet_link, DrainReport, LinkReceiver, LinkSender, LINK_CAPACITY, STALL_LIMIT,
};
pub use midi_file::script_from_midi;
pub use script::{parse_script, total_samples, ScriptError, ScriptStep};
pub use session::Session;
pub use wav::{samples_to_wav, write_wav};

/// How often the audio thread publishes its sample clock.
const CLOCK_INTERVAL: u64 = 64;

/// Errors surfaced to the host.
#[derive(Debug)]
pub enum MasterError {
    Io(std::io::Error),
    Script(ScriptError),
    Midi(midly::Error),
    Audio(AudioError),
}

impl std::fmt::Display for MasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MasterError::Io(e) => write!(f, "I/O error: {}", e),
            MasterError::Script(e) => write!(f, "Script error: {}", e),
            MasterError::Midi(e) => write!(f, "MIDI file error: {}", e),
            MasterError::Audio(e) => write!(f, "Audio error: {}", e),
        }
    }
}

impl std::error::Error for MasterError {}

impl From<std::io::Error> for MasterError {
    fn from(e: std::io::Error) -> Self {
        MasterError::Io(e)
    }
}

impl From<ScriptError> for MasterError {
    fn from(e: ScriptError) -> Self {
        MasterError::Script(e)
    }
}

impl From<midly::Error> for MasterError {
    fn from(e: midly::Error) -> Self {
        MasterError::Midi(e)
    }
}

impl From<AudioError> for MasterError {
    fn from(e: AudioError) -> Self {
        MasterError::Audio(e)
    }
}

/// Load an event script, or convert a standard MIDI file (`.mid`/`.midi`).
pub fn load_steps(path: &Path) -> Result<Vec<ScriptStep>, MasterError> {
    let is_midi = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"));
    if is_midi {
        let data = std::fs::read(path)?;
        Ok(script_from_midi(&data)?)
    } else {
        let text = std::fs::read_to_string(path)?;
        Ok(parse_script(&text)?)
    }
}

/// Live host: the control plane runs on the caller's thread and the engine
/// renders on a dedicated audio thread, fed through a packet link.
pub struct Controller {
    global: GlobalState,
    instrument: Instrument,
    control: Option<ControlPlane<LinkSender>>,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    clock: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(global: GlobalState, instrument: Instrument) -> Self {
        Self {
            global,
            instrument,
            control: None,
            playback: None,
        }
    }

    /// Current global state (the control plane's copy while playing).
    pub fn global(&self) -> &GlobalState {
        match &self.control {
            Some(control) => control.global(),
            None => &self.global,
        }
    }

    // --- Control events ---

    /// Feed one raw MIDI message to the control plane.
    pub fn midi_event(&mut self, data: &[u8]) {
        match self.control.as_mut() {
            Some(control) => control.handle_midi_event(data),
            None => debug!("not playing, ignoring MIDI {:02X?}", data),
        }
    }

    pub fn set_master_volume(&mut self, volume: u8) {
        self.global.master_volume = volume;
        if let Some(control) = self.control.as_mut() {
            control.set_master_volume(volume);
        }
    }

    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.global.envelope = envelope;
        if let Some(control) = self.control.as_mut() {
            control.set_envelope(envelope);
        }
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
        if let Some(control) = self.control.as_mut() {
            control.set_instrument(instrument);
        }
    }

    // --- Real-time playback ---

    /// Open the audio device and start rendering.
    ///
    /// Returns once the stream is running, or with the device error.
    pub fn play(&mut self) -> Result<(), MasterError> {
        self.stop();

        let (sender, receiver) = packet_link(LINK_CAPACITY);
        let stop_signal = Arc::new(AtomicBool::new(false));
        let clock = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let (started_tx, started_rx) = mpsc::channel();

        let stop = stop_signal.clone();
        let tick = clock.clone();
        let done = finished.clone();
        let thread = std::thread::spawn(move || {
            audio_thread(receiver, stop, tick, done, started_tx);
        });

        let started = started_rx
            .recv()
            .unwrap_or(Err(AudioError::Playback("audio thread exited".to_string())));
        if let Err(e) = started {
            let _ = thread.join();
            return Err(e.into());
        }

        let mut control = ControlPlane::with_state(self.global, sender);
        control.set_instrument(self.instrument);
        control.push_global_state();
        self.control = Some(control);
        self.playback = Some(PlaybackHandle {
            stop_signal,
            clock,
            finished,
            thread: Some(thread),
        });
        info!("playback started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(control) = self.control.take() {
            self.global = *control.global();
        }
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
            info!("playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    /// Samples rendered by the audio thread, published every few samples.
    pub fn samples_rendered(&self) -> u64 {
        self.playback
            .as_ref()
            .map_or(0, |p| p.clock.load(Ordering::Relaxed))
    }

    /// Perform a script in real time, pacing steps by the audio clock.
    pub fn play_script(&mut self, steps: &[ScriptStep]) {
        let mut target = self.samples_rendered();
        for step in steps {
            match step {
                ScriptStep::Midi(bytes) => self.midi_event(bytes),
                ScriptStep::Samples(count) => {
                    target += *count as u64;
                    while self.is_playing() && self.samples_rendered() < target {
                        std::thread::sleep(Duration::from_millis(1));
                    }
                }
                ScriptStep::Instrument(instrument) => self.set_instrument(*instrument),
                ScriptStep::Volume(volume) => self.set_master_volume(*volume),
                ScriptStep::Envelope(envelope) => self.set_envelope(*envelope),
            }
            if !self.is_playing() {
                warn!("audio thread finished early, abandoning script");
                return;
            }
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(GlobalState::default(), Instrument::default())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "alloc_check")]
fn no_alloc<T>(f: impl FnOnce() -> T) -> T {
    assert_no_alloc::assert_no_alloc(f)
}

#[cfg(not(feature = "alloc_check"))]
fn no_alloc<T>(f: impl FnOnce() -> T) -> T {
    f()
}

fn audio_thread(
    mut link: LinkReceiver,
    stop_signal: Arc<AtomicBool>,
    clock: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    started: mpsc::Sender<Result<(), AudioError>>,
) {
    let opened = CpalOutput::new().and_then(|(mut output, consumer)| {
        output.build_stream(consumer)?;
        output.start()?;
        Ok(output)
    });
    let mut output = match opened {
        Ok(output) => output,
        Err(e) => {
            finished.store(true, Ordering::Relaxed);
            let _ = started.send(Err(e));
            return;
        }
    };
    let _ = started.send(Ok(()));
    if output.sample_rate() != SAMPLE_RATE {
        warn!(
            "device runs at {} Hz, expected {}",
            output.sample_rate(),
            SAMPLE_RATE
        );
    }

    let mut engine = Engine::new();
    let mut rendered: u64 = 0;

    'render: while !stop_signal.load(Ordering::Relaxed) {
        let (sample, report) = no_alloc(|| {
            let report = link.drain_into(&mut engine);
            (engine.render_sample(), report)
        });
        if let Some(e) = report.last_error {
            debug!("discarded {} packet(s), last: {}", report.discarded, e);
        }

        // Keep applying packets while the device is backed up so the link
        // never fills behind a stalled stream.
        while output.write(&[sample]) == 0 {
            if stop_signal.load(Ordering::Relaxed) {
                break 'render;
            }
            let report = no_alloc(|| link.drain_into(&mut engine));
            if let Some(e) = report.last_error {
                debug!("discarded {} packet(s), last: {}", report.discarded, e);
            }
            std::hint::spin_loop();
        }

        rendered += 1;
        if rendered % CLOCK_INTERVAL == 0 {
            clock.store(rendered, Ordering::Relaxed);
        }
    }

    let _ = output.stop();
    finished.store(true, Ordering::Relaxed);
}
