//! Audio playback for the tone slots
//! Samples are decoded once; every trigger restarts its slot from the top.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use rodio::source::Buffered;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::config::ToneConfig;
use crate::tones::{Symbol, TonePlayer};

type Sample = Buffered<Decoder<BufReader<File>>>;

struct Slot {
    sample: Sample,
    sink: Option<Sink>,
}

/// Tone bank - one decoded sample and one live sink per slot.
/// Missing device or undecodable files leave the affected slots silent.
pub struct ToneBank {
    _stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    slots: [Option<Slot>; 3],
}

impl ToneBank {
    pub fn open(config: &ToneConfig) -> Self {
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok((stream, handle)) => (Some(stream), Some(handle)),
            Err(e) => {
                log::warn!("No audio output, tones will be silent: {}", e);
                (None, None)
            }
        };

        let slots = std::array::from_fn(|i| {
            let path = &config.slots[i].sample;
            match load_sample(Path::new(path)) {
                Ok(sample) => {
                    log::debug!("Loaded tone {} from {}", i, path);
                    Some(Slot { sample, sink: None })
                }
                Err(e) => {
                    log::warn!("Tone {} unavailable: {:#}", i, e);
                    None
                }
            }
        });

        Self {
            _stream: stream,
            stream_handle,
            slots,
        }
    }
}

fn load_sample(path: &Path) -> anyhow::Result<Sample> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(source.buffered())
}

impl TonePlayer for ToneBank {
    fn play(&mut self, symbol: Symbol, volume: f32) -> anyhow::Result<()> {
        let handle = self
            .stream_handle
            .as_ref()
            .context("no audio output device")?;
        let slot = self.slots[symbol.index()]
            .as_mut()
            .with_context(|| format!("tone {} has no sample", symbol.index()))?;

        let sink = Sink::try_new(handle)?;
        sink.set_volume(volume.clamp(0.0, 1.0));
        sink.append(slot.sample.clone());

        if let Some(previous) = slot.sink.replace(sink) {
            previous.stop();
        }
        Ok(())
    }
}
