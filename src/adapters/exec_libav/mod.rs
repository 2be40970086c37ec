//! FFmpeg media adapter using libav bindings
//!
//! Decoding and encoding run on dedicated worker threads that own all libav
//! state; the async side talks to them over channels.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

use async_trait::async_trait;
use ffmpeg_next as ffmpeg;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{AudioTrack, Frame, JobOutput, MediaSource, VideoMetadata};
use crate::ports::{EncoderFactory, EncoderSettings, FrameSink, FrameSource, MediaOpener};

/// Decode forward instead of seeking when the target is this close ahead
const FORWARD_DECODE_WINDOW: f64 = 1.0;
/// Presentation timestamps within this distance count as the same instant
const PTS_EPSILON: f64 = 1e-4;
/// Encoder time base denominator (milliseconds)
const ENCODER_TIME_BASE: i32 = 1000;

type Reply<T> = oneshot::Sender<Result<T, DomainError>>;

fn decode_err(context: &'static str) -> impl Fn(ffmpeg::Error) -> DomainError {
    move |e| DomainError::Decode(format!("{}: {}", context, e))
}

fn encode_err(context: &'static str) -> impl Fn(ffmpeg::Error) -> DomainError {
    move |e| DomainError::Encode(format!("{}: {}", context, e))
}

/// Send a command built around a reply channel and wait for the answer
async fn call<C, T>(
    commands: Option<&mpsc::Sender<C>>,
    make: impl FnOnce(Reply<T>) -> C,
    closed: fn(String) -> DomainError,
) -> Result<T, DomainError> {
    let commands = commands.ok_or_else(|| closed("session already closed".to_string()))?;
    let (reply, response) = oneshot::channel();
    commands
        .send(make(reply))
        .map_err(|_| closed("worker thread exited".to_string()))?;
    response
        .await
        .map_err(|_| closed("worker thread dropped the request".to_string()))?
}

async fn join_worker(worker: Option<JoinHandle<()>>) {
    if let Some(handle) = worker {
        if let Ok(Err(_)) = tokio::task::spawn_blocking(move || handle.join()).await {
            warn!("Media worker thread panicked");
        }
    }
}

/// Container and encoder candidates for a negotiated mime type
fn codec_candidates(mime: &str) -> Option<(&'static str, &'static [&'static str])> {
    let normalized: String = mime.chars().filter(|c| !c.is_whitespace()).collect();
    match normalized.to_lowercase().as_str() {
        "video/webm;codecs=vp9" => Some(("webm", &["libvpx-vp9"])),
        "video/webm;codecs=vp8" => Some(("webm", &["libvpx"])),
        "video/webm" => Some(("webm", &["libvpx-vp9", "libvpx"])),
        "video/mp4" => Some(("mp4", &["libx264", "mpeg4"])),
        _ => None,
    }
}

fn resolve_encoder(mime: &str) -> Option<(&'static str, &'static str)> {
    let (container, names) = codec_candidates(mime)?;
    names
        .iter()
        .find(|name| ffmpeg::codec::encoder::find_by_name(name).is_some())
        .map(|name| (container, *name))
}

/// FFmpeg-backed source opener and encoder factory
pub struct LibavMediaBackend;

impl LibavMediaBackend {
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg::init().map_err(|e| {
            DomainError::UnsupportedCapability(format!("FFmpeg initialization failed: {}", e))
        })?;
        Ok(Self)
    }
}

#[async_trait]
impl MediaOpener for LibavMediaBackend {
    async fn open(
        &self,
        source: &MediaSource,
        file_name: &str,
    ) -> Result<Box<dyn FrameSource>, DomainError> {
        let (path, temp) = match source {
            MediaSource::File(path) => (path.clone(), None),
            MediaSource::Memory(bytes) => {
                let suffix = Path::new(file_name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| format!(".{}", ext))
                    .unwrap_or_default();
                let mut file = tempfile::Builder::new()
                    .prefix("unmark-src-")
                    .suffix(&suffix)
                    .tempfile()
                    .map_err(|e| DomainError::Decode(format!("Cannot stage source: {}", e)))?;
                std::io::Write::write_all(&mut file, bytes)
                    .map_err(|e| DomainError::Decode(format!("Cannot stage source: {}", e)))?;
                let temp = file.into_temp_path();
                (temp.to_path_buf(), Some(temp))
            }
        };

        let source = LibavFrameSource::open(path, temp).await?;
        Ok(Box::new(source))
    }
}

#[async_trait]
impl EncoderFactory for LibavMediaBackend {
    fn supports(&self, mime: &str) -> bool {
        resolve_encoder(mime).is_some()
    }

    async fn open(&self, settings: EncoderSettings) -> Result<Box<dyn FrameSink>, DomainError> {
        let (container, encoder_name) = resolve_encoder(&settings.mime).ok_or_else(|| {
            DomainError::UnsupportedCapability(format!("No encoder for {}", settings.mime))
        })?;
        let session = LibavEncoderSession::start(settings, container, encoder_name)?;
        Ok(Box::new(session))
    }
}

enum SourceCommand {
    Seek(f64, Reply<()>),
    Read(Reply<Frame>),
}

/// Seekable source decoded on a worker thread
pub struct LibavFrameSource {
    metadata: VideoMetadata,
    audio: Option<AudioTrack>,
    commands: Option<mpsc::Sender<SourceCommand>>,
    worker: Option<JoinHandle<()>>,
    _temp: Option<tempfile::TempPath>,
}

impl LibavFrameSource {
    async fn open(path: PathBuf, temp: Option<tempfile::TempPath>) -> Result<Self, DomainError> {
        let (commands, inbox) = mpsc::channel();
        let (ready, opened) = oneshot::channel();

        let worker = std::thread::Builder::new()
            .name("unmark-decode".to_string())
            .spawn(move || {
                let mut decoder = match SourceWorker::open(&path) {
                    Ok(decoder) => decoder,
                    Err(e) => {
                        let _ = ready.send(Err(e));
                        return;
                    }
                };
                let _ = ready.send(Ok((decoder.metadata.clone(), decoder.audio.clone())));
                decoder.serve(inbox);
            })
            .map_err(|e| DomainError::Decode(format!("Cannot start decoder thread: {}", e)))?;

        let (metadata, audio) = opened
            .await
            .map_err(|_| DomainError::Decode("Decoder thread exited during open".to_string()))??;

        Ok(Self {
            metadata,
            audio,
            commands: Some(commands),
            worker: Some(worker),
            _temp: temp,
        })
    }
}

#[async_trait]
impl FrameSource for LibavFrameSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn audio_track(&self) -> Option<AudioTrack> {
        self.audio.clone()
    }

    async fn seek(&mut self, timestamp: f64) -> Result<(), DomainError> {
        call(
            self.commands.as_ref(),
            |reply| SourceCommand::Seek(timestamp, reply),
            DomainError::Decode,
        )
        .await
    }

    async fn read_frame(&mut self) -> Result<Frame, DomainError> {
        call(self.commands.as_ref(), SourceCommand::Read, DomainError::Decode).await
    }

    async fn close(&mut self) {
        self.commands.take();
        join_worker(self.worker.take()).await;
    }
}

struct SourceWorker {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    seconds_per_tick: f64,
    metadata: VideoMetadata,
    audio: Option<AudioTrack>,
    target: f64,
    current: Option<(f64, Frame)>,
    lookahead: Option<(f64, Frame)>,
    eof: bool,
}

impl SourceWorker {
    fn open(path: &Path) -> Result<Self, DomainError> {
        let input = ffmpeg::format::input(&path).map_err(decode_err("Failed to open input"))?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| DomainError::Decode("No video stream found".to_string()))?;
        let stream_index = stream.index();
        let seconds_per_tick = f64::from(stream.time_base());
        let frame_rate = stream.avg_frame_rate();

        let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(decode_err("Failed to create decoder context"))?
            .decoder()
            .video()
            .map_err(decode_err("Failed to create video decoder"))?;

        let duration = if input.duration() > 0 {
            input.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE)
        } else {
            stream.duration().max(0) as f64 * seconds_per_tick
        };

        let mut metadata = VideoMetadata::new(duration, decoder.width(), decoder.height())?;
        if frame_rate.numerator() > 0 && frame_rate.denominator() > 0 {
            metadata = metadata.with_declared_frame_rate(f64::from(frame_rate));
        }

        let audio = input.streams().best(ffmpeg::media::Type::Audio).map(|audio| AudioTrack {
            stream_index: audio.index(),
            codec: Some(format!("{:?}", audio.parameters().id()).to_lowercase()),
            origin: Some(path.to_path_buf()),
        });

        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::Pixel::RGBA,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(decode_err("Failed to create scaler"))?;

        debug!(
            "Opened {} ({}x{}, {:.3}s, audio: {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.duration,
            audio.is_some()
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            seconds_per_tick,
            metadata,
            audio,
            target: 0.0,
            current: None,
            lookahead: None,
            eof: false,
        })
    }

    fn serve(&mut self, inbox: mpsc::Receiver<SourceCommand>) {
        while let Ok(command) = inbox.recv() {
            match command {
                SourceCommand::Seek(timestamp, reply) => {
                    let _ = reply.send(self.seek(timestamp));
                }
                SourceCommand::Read(reply) => {
                    let _ = reply.send(self.read());
                }
            }
        }
    }

    fn seek(&mut self, timestamp: f64) -> Result<(), DomainError> {
        self.target = timestamp;
        let decoded_up_to = self
            .current
            .as_ref()
            .or(self.lookahead.as_ref())
            .map(|(pts, _)| *pts);
        if let Some(position) = decoded_up_to {
            if timestamp >= position - PTS_EPSILON && timestamp - position < FORWARD_DECODE_WINDOW {
                return Ok(());
            }
        }

        let ts = (timestamp * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
        self.input
            .seek(ts, ..ts)
            .map_err(decode_err("Seek failed"))?;
        self.decoder.flush();
        self.current = None;
        self.lookahead = None;
        self.eof = false;
        Ok(())
    }

    /// Last frame presented at or before the target
    fn read(&mut self) -> Result<Frame, DomainError> {
        loop {
            if let Some((pts, _)) = &self.lookahead {
                if *pts <= self.target + PTS_EPSILON {
                    self.current = self.lookahead.take();
                    continue;
                }
                break;
            }
            match self.decode_next()? {
                Some(decoded) => self.lookahead = Some(decoded),
                None => break,
            }
        }

        self.current
            .as_ref()
            .or(self.lookahead.as_ref())
            .map(|(_, frame)| frame.clone())
            .ok_or_else(|| {
                DomainError::Decode(format!("No frame decodable at {:.3}s", self.target))
            })
    }

    fn decode_next(&mut self) -> Result<Option<(f64, Frame)>, DomainError> {
        loop {
            let mut decoded = ffmpeg::frame::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.timestamp().or(decoded.pts()).unwrap_or(0) as f64
                    * self.seconds_per_tick;
                let frame = self.to_rgba(&decoded)?;
                return Ok(Some((pts, frame)));
            }
            if self.eof {
                return Ok(None);
            }

            let mut fed = false;
            for (stream, packet) in self.input.packets() {
                if stream.index() == self.stream_index {
                    self.decoder
                        .send_packet(&packet)
                        .map_err(decode_err("Failed to decode packet"))?;
                    fed = true;
                    break;
                }
            }
            if !fed {
                let _ = self.decoder.send_eof();
                self.eof = true;
            }
        }
    }

    fn to_rgba(&mut self, decoded: &ffmpeg::frame::Video) -> Result<Frame, DomainError> {
        let mut rgba = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgba)
            .map_err(decode_err("Failed to convert frame"))?;

        let (width, height) = (rgba.width(), rgba.height());
        let row_bytes = width as usize * 4;
        let stride = rgba.stride(0);
        let data = rgba.data(0);
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }

        Frame::from_raw(width, height, pixels)
            .ok_or_else(|| DomainError::Decode("Decoded frame has unexpected size".to_string()))
    }
}

enum EncoderCommand {
    AttachAudio(AudioTrack, Reply<()>),
    Push(Frame, f64, Reply<()>),
    Finish(Reply<Vec<u8>>),
}

/// Encoder session running on a worker thread, writing to a temp file
pub struct LibavEncoderSession {
    mime: String,
    commands: Option<mpsc::Sender<EncoderCommand>>,
    worker: Option<JoinHandle<()>>,
    output: Option<tempfile::TempPath>,
}

impl LibavEncoderSession {
    fn start(
        settings: EncoderSettings,
        container: &'static str,
        encoder_name: &'static str,
    ) -> Result<Self, DomainError> {
        let output = tempfile::Builder::new()
            .prefix("unmark-out-")
            .suffix(&format!(".{}", container))
            .tempfile()
            .map_err(|e| DomainError::Encode(format!("Cannot create output file: {}", e)))?
            .into_temp_path();

        let (commands, inbox) = mpsc::channel();
        let mime = settings.mime.clone();
        let path = output.to_path_buf();
        let handle = std::thread::Builder::new()
            .name("unmark-encode".to_string())
            .spawn(move || {
                // libav state is created and dropped on this thread only
                let mut worker = EncoderWorker {
                    path,
                    container,
                    encoder_name,
                    settings,
                    audio: None,
                    active: None,
                    last_pts: None,
                };
                worker.serve(inbox)
            })
            .map_err(|e| DomainError::Encode(format!("Cannot start encoder thread: {}", e)))?;

        debug!("Started {} encoder ({}) for {}", encoder_name, container, mime);
        Ok(Self {
            mime,
            commands: Some(commands),
            worker: Some(handle),
            output: Some(output),
        })
    }
}

#[async_trait]
impl FrameSink for LibavEncoderSession {
    fn mime(&self) -> &str {
        &self.mime
    }

    async fn attach_audio(&mut self, track: AudioTrack) -> Result<(), DomainError> {
        call(
            self.commands.as_ref(),
            |reply| EncoderCommand::AttachAudio(track, reply),
            DomainError::Encode,
        )
        .await
    }

    async fn push_frame(&mut self, frame: Frame, timestamp: f64) -> Result<(), DomainError> {
        call(
            self.commands.as_ref(),
            |reply| EncoderCommand::Push(frame, timestamp, reply),
            DomainError::Encode,
        )
        .await
    }

    async fn finish(&mut self) -> Result<JobOutput, DomainError> {
        let bytes = call(self.commands.as_ref(), EncoderCommand::Finish, DomainError::Encode).await;
        self.commands.take();
        join_worker(self.worker.take()).await;
        self.output.take();
        Ok(JobOutput::new(self.mime.clone(), bytes?))
    }

    async fn abort(&mut self) {
        self.commands.take();
        join_worker(self.worker.take()).await;
        self.output.take();
    }
}

struct AudioPassthrough {
    input: ffmpeg::format::context::Input,
    input_index: usize,
    output_index: usize,
}

struct ActiveEncoder {
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    video_index: usize,
    stream_time_base: ffmpeg::Rational,
    audio: Option<AudioPassthrough>,
}

struct EncoderWorker {
    path: PathBuf,
    container: &'static str,
    encoder_name: &'static str,
    settings: EncoderSettings,
    audio: Option<AudioTrack>,
    active: Option<ActiveEncoder>,
    last_pts: Option<i64>,
}

impl EncoderWorker {
    fn serve(&mut self, inbox: mpsc::Receiver<EncoderCommand>) {
        while let Ok(command) = inbox.recv() {
            match command {
                EncoderCommand::AttachAudio(track, reply) => {
                    let _ = reply.send(self.attach_audio(track));
                }
                EncoderCommand::Push(frame, timestamp, reply) => {
                    let _ = reply.send(self.push(&frame, timestamp));
                }
                EncoderCommand::Finish(reply) => {
                    let _ = reply.send(self.finish());
                    return;
                }
            }
        }
    }

    fn attach_audio(&mut self, track: AudioTrack) -> Result<(), DomainError> {
        if self.active.is_some() {
            return Err(DomainError::Encode(
                "Audio must be attached before the first frame".to_string(),
            ));
        }
        self.audio = Some(track);
        Ok(())
    }

    fn audio_compatible(&self, id: ffmpeg::codec::Id) -> bool {
        use ffmpeg::codec::Id;
        match self.container {
            "webm" => matches!(id, Id::OPUS | Id::VORBIS),
            _ => matches!(id, Id::AAC | Id::MP3 | Id::OPUS | Id::AC3 | Id::EAC3 | Id::ALAC | Id::FLAC),
        }
    }

    fn activate(&mut self) -> Result<&mut ActiveEncoder, DomainError> {
        if self.active.is_none() {
            let active = self.build()?;
            self.active = Some(active);
        }
        self.active
            .as_mut()
            .ok_or_else(|| DomainError::Encode("Encoder not initialized".to_string()))
    }

    fn build(&self) -> Result<ActiveEncoder, DomainError> {
        let codec = ffmpeg::codec::encoder::find_by_name(self.encoder_name).ok_or_else(|| {
            DomainError::UnsupportedCapability(format!("Encoder {} not found", self.encoder_name))
        })?;
        let mut output = ffmpeg::format::output_as(&self.path, self.container)
            .map_err(encode_err("Failed to create output"))?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);
        let time_base = ffmpeg::Rational::new(1, ENCODER_TIME_BASE);
        let (width, height) = (self.settings.width, self.settings.height);

        let video_index = {
            let mut stream = output
                .add_stream(codec)
                .map_err(encode_err("Failed to add video stream"))?;
            stream.set_time_base(time_base);
            stream.index()
        };

        let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(encode_err("Failed to create video encoder"))?;
        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(ffmpeg::format::Pixel::YUV420P);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(ffmpeg::Rational::new(
            (self.settings.frame_rate * f64::from(ENCODER_TIME_BASE)).round() as i32,
            ENCODER_TIME_BASE,
        )));
        if global_header {
            encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
        }
        let encoder = encoder
            .open_as(codec)
            .map_err(encode_err("Failed to open video encoder"))?;

        // Stream parameters come from the opened context
        let copied = unsafe {
            ffmpeg::ffi::avcodec_parameters_from_context(
                (**(*output.as_mut_ptr()).streams.add(video_index)).codecpar,
                encoder.as_ptr() as *mut ffmpeg::ffi::AVCodecContext,
            )
        };
        if copied < 0 {
            return Err(DomainError::Encode(format!(
                "Failed to copy encoder parameters: {}",
                ffmpeg::Error::from(copied)
            )));
        }

        let audio = match &self.audio {
            Some(track) => self.add_audio(&mut output, track)?,
            None => None,
        };

        output
            .write_header()
            .map_err(encode_err("Failed to write header"))?;
        let stream_time_base = output
            .stream(video_index)
            .map(|stream| stream.time_base())
            .unwrap_or(time_base);

        let scaler = ffmpeg::software::scaling::Context::get(
            ffmpeg::format::Pixel::RGBA,
            width,
            height,
            ffmpeg::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(encode_err("Failed to create scaler"))?;

        Ok(ActiveEncoder {
            output,
            encoder,
            scaler,
            video_index,
            stream_time_base,
            audio,
        })
    }

    fn add_audio(
        &self,
        output: &mut ffmpeg::format::context::Output,
        track: &AudioTrack,
    ) -> Result<Option<AudioPassthrough>, DomainError> {
        let Some(origin) = &track.origin else {
            warn!("Audio track has no readable origin, output will be silent");
            return Ok(None);
        };
        let input = ffmpeg::format::input(origin).map_err(encode_err("Failed to reopen audio"))?;
        let parameters = input
            .stream(track.stream_index)
            .map(|stream| stream.parameters())
            .ok_or_else(|| DomainError::Encode("Audio stream vanished".to_string()))?;

        if !self.audio_compatible(parameters.id()) {
            warn!(
                "Audio codec {:?} cannot be stored in {}, output will be silent",
                parameters.id(),
                self.container
            );
            return Ok(None);
        }

        let mut stream = output
            .add_stream(ffmpeg::codec::encoder::find(ffmpeg::codec::Id::None))
            .map_err(encode_err("Failed to add audio stream"))?;
        stream.set_parameters(parameters);
        unsafe {
            (*stream.parameters().as_mut_ptr()).codec_tag = 0;
        }
        Ok(Some(AudioPassthrough {
            input,
            input_index: track.stream_index,
            output_index: stream.index(),
        }))
    }

    fn push(&mut self, frame: &Frame, timestamp: f64) -> Result<(), DomainError> {
        let (width, height) = (self.settings.width, self.settings.height);
        if frame.dimensions() != (width, height) {
            return Err(DomainError::Encode(format!(
                "Frame is {}x{}, session expects {}x{}",
                frame.width(),
                frame.height(),
                width,
                height
            )));
        }

        let mut pts = (timestamp * f64::from(ENCODER_TIME_BASE)).round() as i64;
        if let Some(last) = self.last_pts {
            pts = pts.max(last + 1);
        }
        self.last_pts = Some(pts);

        let active = self.activate()?;
        let mut rgba = ffmpeg::frame::Video::new(ffmpeg::format::Pixel::RGBA, width, height);
        let row_bytes = width as usize * 4;
        let stride = rgba.stride(0);
        let data = rgba.data_mut(0);
        for (row, pixels) in frame.as_raw().chunks_exact(row_bytes).enumerate() {
            let start = row * stride;
            data[start..start + row_bytes].copy_from_slice(pixels);
        }

        let mut yuv = ffmpeg::frame::Video::empty();
        active
            .scaler
            .run(&rgba, &mut yuv)
            .map_err(encode_err("Failed to convert frame"))?;
        yuv.set_pts(Some(pts));
        active
            .encoder
            .send_frame(&yuv)
            .map_err(encode_err("Failed to encode frame"))?;
        active.drain()
    }

    fn finish(&mut self) -> Result<Vec<u8>, DomainError> {
        let active = self.activate()?;
        active
            .encoder
            .send_eof()
            .map_err(encode_err("Failed to flush encoder"))?;
        active.drain()?;
        active.copy_audio()?;
        active
            .output
            .write_trailer()
            .map_err(encode_err("Failed to write trailer"))?;
        self.active = None;

        std::fs::read(&self.path)
            .map_err(|e| DomainError::Encode(format!("Cannot read encoded output: {}", e)))
    }
}

impl ActiveEncoder {
    fn drain(&mut self) -> Result<(), DomainError> {
        let mut packet = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.video_index);
            packet.rescale_ts(
                ffmpeg::Rational::new(1, ENCODER_TIME_BASE),
                self.stream_time_base,
            );
            packet
                .write_interleaved(&mut self.output)
                .map_err(encode_err("Failed to write packet"))?;
        }
        Ok(())
    }

    fn copy_audio(&mut self) -> Result<(), DomainError> {
        let Some(audio) = self.audio.as_mut() else {
            return Ok(());
        };
        let output_time_base = self
            .output
            .stream(audio.output_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| DomainError::Encode("Audio output stream missing".to_string()))?;

        for (stream, mut packet) in audio.input.packets() {
            if stream.index() != audio.input_index {
                continue;
            }
            packet.rescale_ts(stream.time_base(), output_time_base);
            packet.set_position(-1);
            packet.set_stream(audio.output_index);
            packet
                .write_interleaved(&mut self.output)
                .map_err(encode_err("Failed to write audio packet"))?;
        }
        Ok(())
    }
}
