use std::path::Path;

use ffmpeg_next::format::Pixel;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

type FrameResult = Result<Frame, Box<dyn std::error::Error>>;

/// Container durations are reported in microseconds.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Decodes the best video stream of a container via ffmpeg-next.
///
/// Every decoded picture is converted to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            video_stream_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("no video stream found")?;

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let mut total_frames = stream.frames().max(0) as usize;
        if total_frames == 0 && ictx.duration() > 0 && fps > 0.0 {
            let seconds = ictx.duration() as f64 / AV_TIME_BASE;
            total_frames = (seconds * fps).round() as usize;
        }

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {}: {}x{} @ {:.3} fps, ~{} frames, codec {}",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.codec
        );

        self.video_stream_index = stream.index();
        self.input_ctx = Some(ictx);
        Ok(metadata)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = FrameResult> + '_> {
        let video_stream_index = self.video_stream_index;
        let Some(ictx) = self.input_ctx.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };
        match FrameDecoder::new(ictx, video_stream_index) {
            Ok(decoder) => Box::new(decoder),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input_ctx = None;
    }
}

/// Lazy decode loop: pulls packets until the decoder yields a picture, then
/// flushes the decoder once the demuxer runs dry.
struct FrameDecoder<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    next_index: usize,
    eof_sent: bool,
    done: bool,
}

impl<'a> FrameDecoder<'a> {
    fn new(
        ictx: &'a mut ffmpeg_next::format::context::Input,
        video_stream_index: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let parameters = ictx
            .stream(video_stream_index)
            .ok_or("video stream disappeared")?
            .parameters();
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(parameters)?
            .decoder()
            .video()?;
        let (width, height) = (decoder.width(), decoder.height());
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index,
            next_index: 0,
            eof_sent: false,
            done: false,
        })
    }

    fn receive(&mut self) -> Option<FrameResult> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        self.decoder.receive_frame(&mut decoded).ok()?;

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb) {
            return Some(Err(Box::new(e)));
        }
        let frame = Frame::new(
            packed_rgb(&rgb, self.width, self.height),
            self.width,
            self.height,
            3,
            self.next_index,
        );
        self.next_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FrameDecoder<'_> {
    type Item = FrameResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(result) = self.receive() {
                return Some(result);
            }
            if self.eof_sent {
                self.done = true;
                return None;
            }

            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.video_stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.eof_sent = true;
                }
            }
        }
    }
}

/// Copies an RGB24 picture into a tightly packed buffer, dropping any row
/// padding ffmpeg added.
fn packed_rgb(
    rgb: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let row_bytes = width as usize * 3;
    let stride = rgb.stride(0);
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in rgb.data(0).chunks(stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    pixels
}
